use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use webosd_core::config::OsdConfig;
use webosd_eventsource::EventSource;

use crate::display::Settings;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: OsdConfig,
    pub events: EventSource,
    /// Current display settings; the settings form mutates them and every
    /// change is published as a `settings` event.
    pub settings: Mutex<Settings>,
    /// Name of the driver feeding the ticker, reported by /health.
    pub driver: String,
    /// Fires once on shutdown; open event streams end when it does.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: OsdConfig,
        events: EventSource,
        settings: Settings,
        driver: impl Into<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            events,
            settings: Mutex::new(settings),
            driver: driver.into(),
            shutdown,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(crate::http::ui::index_handler))
        .route("/osd", get(crate::http::ui::osd_handler))
        .route("/es", get(crate::http::stream::stream_handler))
        .route(
            "/osd/settings.css",
            get(crate::http::settings::css_handler),
        )
        .route(
            "/osd/settings",
            post(crate::http::settings::update_handler),
        )
        .route("/footer", post(crate::http::footer::footer_handler))
        .route("/health", get(crate::http::health::health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
