use crate::server::{
    Result, ServerRouter,
    auth::{AuthenticatedUser, RequestRepositories},
    json::Json,
    view::JourneyView,
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Serialize;
use std::collections::BTreeMap;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(get_account)
}

#[derive(TypedPath)]
#[typed_path("/api/account")]
struct AccountPath;

#[derive(Clone, PartialEq, Debug, Serialize)]
struct AccountResponse {
    username: String,
    name: String,
    folders: BTreeMap<String, Vec<JourneyView>>,
    global_like_count: usize,
}

/// The user's own journeys grouped by folder. A journey filed in several folders is listed
/// under each of them.
async fn get_account(
    _: AccountPath,
    user: AuthenticatedUser,
    RequestRepositories(repositories): RequestRepositories,
) -> Result<Json<AccountResponse>> {
    let me = user.user();
    let likes = repositories.likes.view().await;

    let mut folders: BTreeMap<String, Vec<JourneyView>> = BTreeMap::new();
    for journey in repositories.journeys.by_author(me.id.as_str()) {
        let view = JourneyView::new(journey, &likes, me.id.as_str());
        for label in journey.folder_labels() {
            folders.entry(label.to_owned()).or_default().push(view.clone());
        }
    }

    Ok(Json(AccountResponse {
        username: me.id.to_string(),
        name: me.name.clone(),
        folders,
        global_like_count: likes.global_like_count(),
    }))
}
