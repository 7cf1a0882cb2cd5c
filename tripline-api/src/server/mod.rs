use axum::{
    Router,
    extract::{
        FromRef, FromRequestParts, Request, State,
        rejection::{BytesRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use json::Json;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};
use tripline_common::model::like::InvalidLikeActionError;
use tripline_store::{RepositorySource, StoreError, likes::LikeQueueClosedError};

mod auth;
mod json;
mod query;
mod routes;
mod shell;
#[cfg(test)]
mod tests;
mod view;

pub use shell::Shell;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub repositories: Arc<RepositorySource>,
    pub shell: Arc<Shell>,
}

impl ServerState {
    #[must_use]
    pub fn new(repositories: RepositorySource, shell: Shell) -> Self {
        Self {
            repositories: Arc::new(repositories),
            shell: Arc::new(shell),
        }
    }
}

/// The complete application: API routes, the app shell and the catch-all for everything else.
pub fn app(state: ServerState) -> Router {
    routes::routes()
        .fallback(fallback)
        .method_not_allowed_fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Unmatched API paths still require a session, so unauthenticated callers learn nothing about
/// which endpoints exist. Other paths get the app shell if they are app routes.
pub async fn fallback(State(state): State<ServerState>, request: Request) -> Response {
    let (mut parts, _) = request.into_parts();

    if parts.uri.path().starts_with("/api/") {
        return match auth::AuthenticatedUser::from_request_parts(&mut parts, &state).await {
            Ok(_) => ServerError::UnknownEndpoint(parts.uri).into_response(),
            Err(err) => err.into_response(),
        };
    }

    if shell::is_app_route(parts.uri.path()) {
        return state.shell.response().await;
    }

    (StatusCode::NOT_FOUND, "Not found").into_response()
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("No such endpoint: {0}")]
    UnknownEndpoint(Uri),
    #[error("Request body could not be read: {0}")]
    BodyRejection(#[from] BytesRejection),
    #[error("Request body is not valid JSON: {0}")]
    MalformedBody(serde_json::Error),
    #[error("Query rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(serde_json::Error),
    #[error("No session cookie was provided")]
    Unauthenticated,
    #[error("Session names unknown user {0:?}")]
    UnknownUser(String),
    #[error("Login failed for {0:?}")]
    InvalidCredentials(String),
    #[error("Journey {0:?} was not found")]
    JourneyNotFound(String),
    #[error("Post {0:?} was not found")]
    PostNotFound(String),
    #[error(transparent)]
    InvalidAction(#[from] InvalidLikeActionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    LikeQueue(#[from] LikeQueueClosedError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownEndpoint(_)
            | ServerError::JourneyNotFound(_)
            | ServerError::PostNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Unauthenticated
            | ServerError::UnknownUser(_)
            | ServerError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            ServerError::BodyRejection(_)
            | ServerError::MalformedBody(_)
            | ServerError::QueryRejection(_)
            | ServerError::InvalidAction(_) => StatusCode::BAD_REQUEST,
            ServerError::JsonResponse(_) | ServerError::Store(_) | ServerError::LikeQueue(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message sent to the client, which never includes request details.
    pub fn public_message(&self) -> &'static str {
        match self {
            ServerError::UnknownEndpoint(_) => "No such endpoint",
            ServerError::BodyRejection(_)
            | ServerError::MalformedBody(_)
            | ServerError::QueryRejection(_) => "Bad request",
            ServerError::Unauthenticated => "Not authenticated",
            ServerError::UnknownUser(_) => "Unknown user",
            ServerError::InvalidCredentials(_) => "Invalid credentials",
            ServerError::JourneyNotFound(_) => "Not found",
            ServerError::PostNotFound(_) => "Post not found",
            ServerError::InvalidAction(_) => "Invalid action",
            ServerError::JsonResponse(_) | ServerError::Store(_) | ServerError::LikeQueue(_) => {
                "Internal server error"
            }
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, %status, "Replying with error");
        } else {
            debug!(error = %self, %status, "Replying with error");
        }

        let error_response = ErrorResponse {
            error: self.public_message(),
        };
        (status, Json(error_response)).into_response()
    }
}
