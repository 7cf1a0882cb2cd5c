use std::fmt::{Debug, Formatter};

/// The secret a user logs in with, exactly as it sits in storage.
///
/// Despite the `password_hash` column name this is not a hash: logins compare the submitted
/// password against it byte for byte.
#[derive(Clone, Eq, PartialEq, Default, Hash)]
pub struct StoredSecret(String);

impl StoredSecret {
    #[must_use]
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }

    #[must_use]
    pub fn as_stored(&self) -> &str {
        &self.0
    }
}

impl Debug for StoredSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StoredSecret").field(&"[redacted]").finish()
    }
}
