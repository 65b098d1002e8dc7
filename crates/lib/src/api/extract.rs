//! Extractors whose rejections keep the `{"error": ...}` body shape.
//!
//! axum's own `Json` and `Path` reject with plain text. These wrap them and
//! rewrite the rejection, keeping axum's status code and message.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

fn rejection(status: StatusCode, message: String) -> Response {
    tracing::debug!(status = status.as_u16(), %message, "Rejected request");
    (status, axum::Json(json!({ "error": message }))).into_response()
}

/// JSON request body or response.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(err) => Err(json_rejection(err)),
        }
    }
}

fn json_rejection(err: JsonRejection) -> Response {
    rejection(err.status(), err.body_text())
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Path parameters.
#[derive(Debug)]
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(err) => Err(path_rejection(err)),
        }
    }
}

fn path_rejection(err: PathRejection) -> Response {
    rejection(err.status(), err.body_text())
}
