use crate::{
    model::{Id, user::UserMarker},
    util::Timestamp,
};
use serde::Serialize;
use serde_json::Value;

/// Folder label used for journeys that are not filed anywhere.
pub const UNCATEGORIZED_FOLDER: &str = "Uncategorized";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct JourneyMarker;

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Journey {
    pub id: Id<JourneyMarker>,
    pub author: Id<UserMarker>,
    pub title: String,
    pub cover_img: String,
    /// Sortable date string, usually ISO 8601. Never parsed.
    pub start_date: String,
    pub end_date: String,
    pub summary: String,
    pub highlight_comment: String,
    pub folders: Vec<String>,
    /// Day-by-day itinerary, kept as the client wrote it.
    pub days: Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Journey {
    /// The folders this journey is listed under. Never empty.
    pub fn folder_labels(&self) -> impl Iterator<Item = &str> {
        let fallback = self.folders.is_empty().then_some(UNCATEGORIZED_FOLDER);
        self.folders.iter().map(String::as_str).chain(fallback)
    }
}
