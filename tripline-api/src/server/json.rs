use crate::server::ServerError;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use headers::ContentType;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// JSON body extractor and response.
///
/// Bodies are accepted regardless of `Content-Type`. An empty body or a bare `null` reads as `{}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(request, state).await?;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).map_err(ServerError::MalformedBody)?
        };
        let value = match value {
            Value::Null => Value::Object(Map::new()),
            value => value,
        };

        serde_json::from_value(value)
            .map(Json)
            .map_err(ServerError::MalformedBody)
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(json) => (TypedHeader(ContentType::json()), json).into_response(),
            Err(err) => ServerError::JsonResponse(err).into_response(),
        }
    }
}
