use axum::response::Html;

static INDEX_HTML: &str = include_str!("../../static/index.html");
static OSD_HTML: &str = include_str!("../../static/osd.html");

/// Serve the control page (settings and footer forms) at `GET /`.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Serve the live display page at `GET /osd`. It styles itself from
/// `/osd/settings.css` and listens on `/es`.
pub async fn osd_handler() -> Html<&'static str> {
    Html(OSD_HTML)
}
