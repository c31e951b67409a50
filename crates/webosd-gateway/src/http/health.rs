use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health — liveness probe, returns server metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "build": crate::GIT_SHA,
        "driver": state.driver,
        "events": state.events.status(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::app::{build_router, test_support};

    #[tokio::test]
    async fn reports_coordinator_status() {
        let state = test_support::state();
        let _sub = state.events.subscribe().await.unwrap();

        let resp = build_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value =
            serde_json::from_str(&test_support::body_text(resp.into_body()).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["driver"], "fake");
        assert_eq!(body["events"]["state"], "running");
        assert_eq!(body["events"]["subscribers"], 1);
    }
}
