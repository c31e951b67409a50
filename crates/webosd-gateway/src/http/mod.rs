pub mod footer;
pub mod health;
pub mod settings;
pub mod stream;
pub mod ui;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};

/// Form posts bounce back to the page that submitted them. Without a
/// `Referer` there is nowhere to go, so answer 202.
pub(crate) fn back_to_referer(headers: &HeaderMap) -> Response {
    match headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        Some(referer) => Redirect::to(referer).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
