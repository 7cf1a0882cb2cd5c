use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use headers::ContentType;
use std::path::PathBuf;
use tracing::warn;

const APP_ROUTES: [&str; 4] = ["/", "/login", "/feed", "/account"];
const JOURNEY_ROUTE_PREFIX: &str = "/journey/";

/// Paths the client-side app renders itself.
#[must_use]
pub fn is_app_route(path: &str) -> bool {
    APP_ROUTES.contains(&path) || path.starts_with(JOURNEY_ROUTE_PREFIX)
}

/// The static HTML page hosting the client-side app.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Shell {
    index_path: PathBuf,
}

impl Shell {
    #[must_use]
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
        }
    }

    /// Read from disk on every request so the page can be swapped without a restart.
    pub async fn response(&self) -> Response {
        match tokio::fs::read(&self.index_path).await {
            Ok(html) => (TypedHeader(ContentType::html()), html).into_response(),
            Err(err) => {
                warn!(path = %self.index_path.display(), error = %err, "App shell unavailable");
                (StatusCode::NOT_FOUND, "index.html not found").into_response()
            }
        }
    }
}
