//! Rows as they appear in the CSV files, and their conversions into domain types.

use crate::store::RecordKind;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tripline_common::{
    model::{
        Id, ModelValidationError,
        auth::StoredSecret,
        journey::Journey,
        like::Like,
        user::{User, UserMarker},
    },
    util::{Timestamp, decode_embedded_or_default},
};

/// A row type stored in its own named collection.
pub trait Record: Serialize + DeserializeOwned {
    const KIND: RecordKind;
    /// Column names, in the order fields are written.
    const HEADER: &'static [&'static str];
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub password_hash: String,
    pub follows: String,
    pub created_at: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct JourneyRecord {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub cover_img: String,
    pub start_date: String,
    pub end_date: String,
    pub summary: String,
    pub highlight_comment: String,
    pub folders: String,
    pub days: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LikeRecord {
    pub post_id: String,
    pub user_id: String,
    pub created_at: String,
}

impl Record for UserRecord {
    const KIND: RecordKind = RecordKind::Users;
    const HEADER: &'static [&'static str] =
        &["id", "name", "password_hash", "follows", "created_at"];
}

impl Record for JourneyRecord {
    const KIND: RecordKind = RecordKind::Journeys;
    const HEADER: &'static [&'static str] = &[
        "id",
        "author_id",
        "title",
        "cover_img",
        "start_date",
        "end_date",
        "summary",
        "highlight_comment",
        "folders",
        "days",
        "created_at",
        "updated_at",
    ];
}

impl Record for LikeRecord {
    const KIND: RecordKind = RecordKind::Likes;
    const HEADER: &'static [&'static str] = &["post_id", "user_id", "created_at"];
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let id = Id::<UserMarker>::new(value.id)?;
        let name = if value.name.is_empty() {
            id.as_str().to_owned()
        } else {
            value.name
        };

        Ok(Self {
            id,
            name,
            secret: StoredSecret::new(value.password_hash),
            follows: decode_embedded_or_default::<Vec<Value>>(&value.follows)
                .into_iter()
                .filter_map(|follow| Id::new(follow.as_str()?).ok())
                .collect(),
            created_at: Timestamp::parse_or_now(&value.created_at),
        })
    }
}

impl TryFrom<JourneyRecord> for Journey {
    type Error = ModelValidationError;

    fn try_from(value: JourneyRecord) -> Result<Self, Self::Error> {
        let days = match decode_embedded_or_default::<Value>(&value.days) {
            Value::Null => Value::Array(Vec::new()),
            days => days,
        };

        Ok(Self {
            id: Id::new(value.id)?,
            author: Id::new(value.author_id)?,
            title: value.title,
            cover_img: value.cover_img,
            start_date: value.start_date,
            end_date: value.end_date,
            summary: value.summary,
            highlight_comment: value.highlight_comment,
            folders: decode_embedded_or_default(&value.folders),
            days,
            created_at: Timestamp::parse_or_now(&value.created_at),
            updated_at: Timestamp::parse_or_now(&value.updated_at),
        })
    }
}

impl TryFrom<LikeRecord> for Like {
    type Error = ModelValidationError;

    fn try_from(value: LikeRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            post_id: Id::new(value.post_id)?,
            user_id: Id::new(value.user_id)?,
            created_at: Timestamp::parse_or_now(&value.created_at),
        })
    }
}

impl From<&Like> for LikeRecord {
    fn from(value: &Like) -> Self {
        Self {
            post_id: value.post_id.to_string(),
            user_id: value.user_id.to_string(),
            created_at: value.created_at.millis().to_string(),
        }
    }
}
