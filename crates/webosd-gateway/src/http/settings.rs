//! Display settings: the current CSS block and the form that edits it.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Form,
};
use tracing::{info, warn};
use webosd_eventsource::{format_event, ErrorEvent};

use crate::app::AppState;

/// GET /osd/settings.css
pub async fn css_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let css = state.settings.lock().await.to_css();
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        css,
    )
}

/// POST /osd/settings
///
/// Applies the form and publishes the new block as a `settings` event so
/// open OSD pages restyle live. Fields that fail to parse are reported to
/// clients as an `error` event.
pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let (css, rejected) = {
        let mut settings = state.settings.lock().await;
        let rejected = settings.apply(&form);
        (settings.to_css(), rejected)
    };

    if !rejected.is_empty() {
        let message = format!("ignored invalid settings: {}", rejected.join(", "));
        warn!(fields = ?rejected, "settings form had invalid fields");
        state.events.publish(ErrorEvent::new(&message));
    }

    // no trailing newline, or the record would end in an empty data line
    if state.events.publish(format_event("settings", css.trim_end())) {
        info!("display settings updated");
    } else {
        warn!("settings event dropped, publish queue full");
    }

    super::back_to_referer(&headers)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use webosd_eventsource::encode;

    use super::*;
    use crate::app::{build_router, test_support};

    #[tokio::test]
    async fn css_reflects_current_settings() {
        let state = test_support::state();
        let resp = build_router(state)
            .oneshot(Request::get("/osd/settings.css").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
        let css = test_support::body_text(resp.into_body()).await;
        assert!(css.starts_with(":root {\n"));
        assert!(css.contains("--volt-color: #008000;\n"));
    }

    #[tokio::test]
    async fn update_publishes_settings_event() {
        let state = test_support::state();
        let mut sub = state.events.subscribe().await.unwrap();

        let mut req = test_support::form_post("/osd/settings", "voltColor=%23ff0000&fontSize=48");
        req.headers_mut()
            .insert(header::REFERER, "/osd/settings".parse().unwrap());
        let resp = build_router(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let event = sub.recv().await.unwrap();
        let text = String::from_utf8(encode(event.as_ref()).unwrap()).unwrap();
        assert!(text.starts_with("event: settings\ndata: :root {\ndata: --background-color"));
        assert!(text.contains("data: --volt-color: #ff0000;\n"));
        assert!(text.contains("data: --font-size: 48px;\n"));
        assert!(text.ends_with("data: }\n\n"));

        assert_eq!(state.settings.lock().await.font_size, 48);
    }

    #[tokio::test]
    async fn invalid_fields_raise_error_event() {
        let state = test_support::state();
        let mut sub = state.events.subscribe().await.unwrap();

        let resp = build_router(state.clone())
            .oneshot(test_support::form_post("/osd/settings", "ampColor=yellow"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let error = sub.recv().await.unwrap();
        assert_eq!(
            encode(error.as_ref()).unwrap(),
            b"event: error\ndata: ignored invalid settings: ampColor\n\n"
        );
        let settings = sub.recv().await.unwrap();
        assert!(String::from_utf8(encode(settings.as_ref()).unwrap())
            .unwrap()
            .starts_with("event: settings\n"));
    }
}
