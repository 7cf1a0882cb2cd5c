//! Cookie sessions. The cookie holds nothing but the user id: it is not signed and does not
//! expire server-side, so any request naming a known user is treated as that user.

use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use headers::Cookie;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::sync::Arc;
use time::Duration;
use tripline_common::model::{
    Id,
    user::{User, UserMarker},
};
use tripline_store::{Repositories, RepositorySource};

pub const SESSION_COOKIE: &str = "tripline_user";
pub const SESSION_MAX_AGE: Duration = Duration::DAY;

/// Bytes `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[must_use]
pub fn session_cookie(user_id: &Id<UserMarker>) -> String {
    let value = utf8_percent_encode(user_id.as_str(), URI_COMPONENT);
    let max_age = SESSION_MAX_AGE.whole_seconds();
    format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

#[must_use]
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// The repositories serving the current request.
///
/// Loaded on first use and cached in the request extensions, so every extractor and the handler
/// see the same instance even when repositories are built per request.
#[derive(Clone, Debug)]
pub struct RequestRepositories(pub Arc<Repositories>);

impl<S> FromRequestParts<S> for RequestRepositories
where
    Arc<RepositorySource>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(repositories) = parts.extensions.get::<Self>() {
            return Ok(repositories.clone());
        }

        let repositories = Self(
            Arc::<RepositorySource>::from_ref(state)
                .repositories()
                .await?,
        );
        parts.extensions.insert(repositories.clone());

        Ok(repositories)
    }
}

/// The user id the request's session cookie claims, if any.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct SessionClaim(Option<String>);

impl SessionClaim {
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for SessionClaim
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(TypedHeader(cookies)) = TypedHeader::<Cookie>::from_request_parts(parts, state).await
        else {
            return Ok(Self(None));
        };

        let user_id = cookies
            .get(SESSION_COOKIE)
            .and_then(|value| percent_decode_str(value).decode_utf8().ok())
            .filter(|value| !value.is_empty())
            .map(|value| value.into_owned());

        Ok(Self(user_id))
    }
}

/// A request whose session cookie names a user that exists.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct AuthenticatedUser {
    user: User,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn user_id(&self) -> &Id<UserMarker> {
        &self.user.id
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<RepositorySource>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claim = SessionClaim::from_request_parts(parts, state).await?;
        let user_id = claim.user_id().ok_or(ServerError::Unauthenticated)?;

        let RequestRepositories(repositories) =
            RequestRepositories::from_request_parts(parts, state).await?;
        let user = repositories
            .users
            .get(user_id)
            .ok_or_else(|| ServerError::UnknownUser(user_id.to_owned()))?;

        Ok(Self { user: user.clone() })
    }
}
