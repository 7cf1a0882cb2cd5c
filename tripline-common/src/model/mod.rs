pub mod auth;
pub mod journey;
pub mod like;
pub mod user;

use derive_where::derive_where;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, Unexpected},
};
use std::{
    borrow::Borrow,
    fmt::{Display, Formatter},
    marker::PhantomData,
};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Id(#[from] InvalidIdError),
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Ids must not be empty")]
pub struct InvalidIdError;

/// A string identifier tagged with the kind of entity it names.
///
/// User ids double as login names, so they are never generated here; they come from storage or
/// from the client.
#[derive_where(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct Id<Marker>(String, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidIdError> {
        let id = id.into();
        if id.is_empty() {
            Err(InvalidIdError)
        } else {
            Ok(Self(id, PhantomData))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> Borrow<str> for Id<Marker> {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<Marker> TryFrom<String> for Id<Marker> {
    type Error = InvalidIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de, Marker> Deserialize<'de> for Id<Marker> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Id::new(inner).map_err(|_| de::Error::invalid_value(Unexpected::Str(""), &"non-empty Id"))
    }
}
