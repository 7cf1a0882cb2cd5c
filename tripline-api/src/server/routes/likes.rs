use crate::server::{
    Result, ServerError, ServerRouter,
    auth::{AuthenticatedUser, RequestRepositories},
    json::Json,
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use tripline_common::model::{
    Id,
    journey::JourneyMarker,
    like::LikeAction,
};
use tripline_store::LikeSummary;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_post(post_like)
}

#[derive(TypedPath)]
#[typed_path("/api/like")]
struct LikePath;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(default)]
struct LikeRequest {
    post_id: Option<String>,
    action: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct LikeResponse {
    post_id: Id<JourneyMarker>,
    #[serde(flatten)]
    summary: LikeSummary,
}

/// Likes or unlikes a journey. Repeating either action changes nothing.
async fn post_like(
    _: LikePath,
    user: AuthenticatedUser,
    RequestRepositories(repositories): RequestRepositories,
    Json(request): Json<LikeRequest>,
) -> Result<Json<LikeResponse>> {
    let post_id = request.post_id.unwrap_or_default();
    let journey = repositories
        .journeys
        .get(&post_id)
        .ok_or_else(|| ServerError::PostNotFound(post_id.clone()))?;
    let action: LikeAction = request.action.unwrap_or_default().parse()?;

    let summary = repositories
        .likes
        .apply(journey.id.clone(), user.user_id().clone(), action)
        .await?;

    Ok(Json(LikeResponse {
        post_id: journey.id.clone(),
        summary,
    }))
}
