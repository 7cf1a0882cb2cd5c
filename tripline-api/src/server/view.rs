use serde::Serialize;
use tripline_common::{derived, model::journey::Journey};
use tripline_store::{LikesView, Users};

/// A journey with the fields the client displays alongside it.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct JourneyView {
    #[serde(flatten)]
    pub journey: Journey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub total_waypoints: usize,
    pub date_range: String,
    pub like_count: usize,
    pub liked_by_me: bool,
}

impl JourneyView {
    #[must_use]
    pub fn new(journey: &Journey, likes: &LikesView<'_>, viewer: &str) -> Self {
        let post_id = journey.id.as_str();

        Self {
            journey: journey.clone(),
            author_name: None,
            total_waypoints: derived::total_waypoints(journey),
            date_range: derived::date_range(journey),
            like_count: likes.like_count(post_id),
            liked_by_me: likes.liked_by(post_id, viewer),
        }
    }

    #[must_use]
    pub fn with_author_name(mut self, users: &Users) -> Self {
        self.author_name = Some(users.display_name(self.journey.author.as_str()).to_owned());
        self
    }
}
