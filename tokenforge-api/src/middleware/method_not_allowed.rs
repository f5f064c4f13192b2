/// JSON bodies for 405 responses
///
/// The router answers unsupported methods on known paths with an empty 405.
/// This middleware swaps in the standard `{"error": ...}` body and keeps the
/// `Allow` header.

use crate::error::ApiError;
use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub async fn json_method_not_allowed(req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut replaced = ApiError::MethodNotAllowed.into_response();
    if let Some(allow) = allow {
        replaced.headers_mut().insert(header::ALLOW, allow);
    }

    replaced
}
