use crate::{
    model::{Id, auth::StoredSecret},
    util::Timestamp,
};
use std::collections::HashSet;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct User {
    pub id: Id<UserMarker>,
    pub name: String,
    pub secret: StoredSecret,
    pub follows: Vec<Id<UserMarker>>,
    pub created_at: Timestamp,
}

impl User {
    /// Authors whose journeys show up in this user's feed: themselves plus everyone they follow.
    #[must_use]
    pub fn visible_authors(&self) -> HashSet<&Id<UserMarker>> {
        std::iter::once(&self.id).chain(&self.follows).collect()
    }
}
