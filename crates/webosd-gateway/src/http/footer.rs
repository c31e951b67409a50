//! `POST /footer` — push a message to the footer line of every OSD page.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use webosd_eventsource::RawEvent;

use crate::app::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FooterForm {
    pub command: String,
    pub text: String,
    pub duration: String,
}

/// Payload of the `footer` event. `duration` is in seconds, 0 when the
/// form left it empty or unparseable.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Footer {
    pub command: String,
    pub text: String,
    pub duration: u32,
}

impl From<FooterForm> for Footer {
    fn from(form: FooterForm) -> Self {
        Self {
            duration: form.duration.trim().parse().unwrap_or(0),
            command: form.command,
            text: form.text,
        }
    }
}

/// POST /footer
pub async fn footer_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<FooterForm>,
) -> Response {
    let footer = Footer::from(form);
    let event = match RawEvent::json("footer", &footer) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "footer encoding failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response();
        }
    };

    if !state.events.publish(event) {
        warn!("footer dropped, publish queue full");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "event queue full"})),
        )
            .into_response();
    }
    debug!(command = %footer.command, duration = footer.duration, "footer published");

    super::back_to_referer(&headers)
}
