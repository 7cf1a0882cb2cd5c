use crate::server::{
    Result, ServerError, ServerRouter,
    auth::{RequestRepositories, SessionClaim, clear_session_cookie, session_cookie},
    json::Json,
};
use axum::{
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(login)
        .typed_post(logout)
        .typed_get(whoami)
}

#[derive(TypedPath)]
#[typed_path("/api/login")]
struct LoginPath;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(default)]
struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct LoginResponse {
    ok: bool,
    name: String,
}

async fn login(
    _: LoginPath,
    RequestRepositories(repositories): RequestRepositories,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let username = request.username.unwrap_or_default();
    let user = repositories
        .users
        .get(&username)
        .filter(|user| {
            request
                .password
                .as_deref()
                .is_some_and(|password| user.secret.matches(password))
        })
        .ok_or_else(|| ServerError::InvalidCredentials(username.clone()))?;

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&user.id))]),
        Json(LoginResponse {
            ok: true,
            name: user.name.clone(),
        }),
    ))
}

#[derive(TypedPath)]
#[typed_path("/api/logout")]
struct LogoutPath;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct LogoutResponse {
    ok: bool,
}

async fn logout(_: LogoutPath) -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
        Json(LogoutResponse { ok: true }),
    )
}

#[derive(TypedPath)]
#[typed_path("/api/whoami")]
struct WhoamiPath;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct Whoami {
    username: String,
    name: String,
}

/// Reports the session's user, or `null` when there is no session or it names nobody known.
async fn whoami(
    _: WhoamiPath,
    claim: SessionClaim,
    RequestRepositories(repositories): RequestRepositories,
) -> Json<Option<Whoami>> {
    let whoami = claim
        .user_id()
        .and_then(|user_id| repositories.users.get(user_id))
        .map(|user| Whoami {
            username: user.id.to_string(),
            name: user.name.clone(),
        });

    Json(whoami)
}
