use serde::{Serialize, de::DeserializeOwned};
use time::UtcDateTime;

/// Milliseconds since the unix epoch, the unit every stored timestamp uses.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub fn now() -> Self {
        let millis = UtcDateTime::now().unix_timestamp_nanos() / 1_000_000;
        Self(i64::try_from(millis).unwrap_or(i64::MAX))
    }

    /// Parses a stored timestamp, falling back to the current time when the field is blank or
    /// not a number.
    #[must_use]
    pub fn parse_or_now(field: &str) -> Self {
        let field = field.trim();
        field
            .parse::<i64>()
            .ok()
            .or_else(|| {
                #[allow(clippy::cast_possible_truncation)]
                field
                    .parse::<f64>()
                    .ok()
                    .filter(|millis| millis.is_finite())
                    .map(|millis| millis as i64)
            })
            .map_or_else(Self::now, Self)
    }

    #[must_use]
    pub fn millis(self) -> i64 {
        self.0
    }
}

/// Decodes a JSON document embedded in a text field, yielding `T::default()` for blank fields
/// and for anything that does not decode into `T`.
#[must_use]
pub fn decode_embedded_or_default<T>(field: &str) -> T
where
    T: DeserializeOwned + Default,
{
    if field.trim().is_empty() {
        return T::default();
    }

    serde_json::from_str(field).unwrap_or_default()
}
