use crate::{
    model::{Id, journey::JourneyMarker, user::UserMarker},
    util::Timestamp,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// One user's like of one journey. At most one exists per `(post_id, user_id)` pair.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Like {
    pub post_id: Id<JourneyMarker>,
    pub user_id: Id<UserMarker>,
    pub created_at: Timestamp,
}

impl Like {
    #[must_use]
    pub fn new(post_id: Id<JourneyMarker>, user_id: Id<UserMarker>) -> Self {
        Self {
            post_id,
            user_id,
            created_at: Timestamp::now(),
        }
    }

    #[must_use]
    pub fn is_by(&self, post_id: &str, user_id: &str) -> bool {
        self.post_id.as_str() == post_id && self.user_id.as_str() == user_id
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Like,
    Unlike,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Error)]
#[error("Unknown like action: {0:?}")]
pub struct InvalidLikeActionError(String);

impl FromStr for LikeAction {
    type Err = InvalidLikeActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "unlike" => Ok(Self::Unlike),
            other => Err(InvalidLikeActionError(other.to_owned())),
        }
    }
}

impl Display for LikeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Like => "like",
            Self::Unlike => "unlike",
        })
    }
}
