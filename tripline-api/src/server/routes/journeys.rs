use crate::server::{
    Result, ServerError, ServerRouter,
    auth::{AuthenticatedUser, RequestRepositories},
    json::Json,
    query::Query,
    view::JourneyView,
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use tripline_common::model::journey::Journey;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_feed)
        .typed_get(get_journey)
}

#[derive(TypedPath)]
#[typed_path("/api/feed")]
struct FeedPath;

#[derive(Clone, PartialEq, Debug, Serialize)]
struct FeedResponse {
    items: Vec<JourneyView>,
    global_like_count: usize,
}

/// Journeys by the user and everyone they follow, latest start date first.
async fn get_feed(
    _: FeedPath,
    user: AuthenticatedUser,
    RequestRepositories(repositories): RequestRepositories,
) -> Result<Json<FeedResponse>> {
    let me = user.user();
    let visible_authors = me.visible_authors();

    let mut journeys: Vec<&Journey> = repositories
        .journeys
        .iter()
        .filter(|journey| visible_authors.contains(&journey.author))
        .collect();
    journeys.sort_by(|a, b| b.start_date.cmp(&a.start_date));

    let likes = repositories.likes.view().await;
    let items = journeys
        .into_iter()
        .map(|journey| {
            JourneyView::new(journey, &likes, me.id.as_str()).with_author_name(&repositories.users)
        })
        .collect();

    Ok(Json(FeedResponse {
        items,
        global_like_count: likes.global_like_count(),
    }))
}

#[derive(TypedPath)]
#[typed_path("/api/journey")]
struct JourneyPath;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct JourneyQuery {
    id: Option<String>,
}

async fn get_journey(
    _: JourneyPath,
    user: AuthenticatedUser,
    RequestRepositories(repositories): RequestRepositories,
    Query(query): Query<JourneyQuery>,
) -> Result<Json<JourneyView>> {
    let id = query.id.unwrap_or_default();
    let journey = repositories
        .journeys
        .get(&id)
        .ok_or_else(|| ServerError::JourneyNotFound(id.clone()))?;

    let likes = repositories.likes.view().await;
    let view = JourneyView::new(journey, &likes, user.user_id().as_str())
        .with_author_name(&repositories.users);

    Ok(Json(view))
}
