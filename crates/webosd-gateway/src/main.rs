use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use webosd_core::config::OsdConfig;
use webosd_eventsource::{EventSource, Ticker};

mod app;
mod display;
mod http;
mod shutdown;

/// Current version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Short git commit hash embedded at compile time by build.rs.
pub const GIT_SHA: &str = env!("WEBOSD_GIT_SHA");

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (build ",
    env!("WEBOSD_GIT_SHA"),
    ")"
);

/// Live power-supply readings rendered as a browser on-screen display.
///
/// Flags override the config file, which overrides built-in defaults.
#[derive(Debug, Parser)]
#[command(name = "webosd", author, version = LONG_VERSION)]
struct Cli {
    /// Path to the TOML config file [default: $WEBOSD_CONFIG or ~/.webosd/webosd.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Web server address, host:port
    #[arg(long)]
    addr: Option<String>,

    /// PSU driver name (fake, sin)
    #[arg(long)]
    psu: Option<String>,

    /// Background color, #rrggbb or #rrggbbaa
    #[arg(long)]
    background_color: Option<String>,

    /// Volt reading color, #rrggbb
    #[arg(long)]
    volt_color: Option<String>,

    /// Amp reading color, #rrggbb
    #[arg(long)]
    amp_color: Option<String>,

    /// Font family
    #[arg(long)]
    font: Option<String>,

    /// Font size in px
    #[arg(long)]
    font_size: Option<u64>,

    /// Font weight, clamped to 100..=900
    #[arg(long)]
    font_weight: Option<u64>,

    /// Line height in percent
    #[arg(long)]
    line_height: Option<u64>,
}

impl Cli {
    /// Path to load config from: --config > WEBOSD_CONFIG > default.
    fn config_path(&self) -> Option<String> {
        self.config
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| std::env::var("WEBOSD_CONFIG").ok())
    }

    /// Layer the flags that were given on top of the loaded config.
    fn apply(self, config: &mut OsdConfig) -> webosd_core::Result<()> {
        if let Some(addr) = self.addr {
            config.server.set_addr(&addr)?;
        }
        if let Some(psu) = self.psu {
            config.device.driver = psu;
        }
        let display = &mut config.display;
        if let Some(c) = self.background_color {
            display.background_color = c;
        }
        if let Some(c) = self.volt_color {
            display.volt_color = c;
        }
        if let Some(c) = self.amp_color {
            display.amp_color = c;
        }
        if let Some(font) = self.font {
            display.font = font;
        }
        if let Some(size) = self.font_size {
            display.font_size = size;
        }
        if let Some(weight) = self.font_weight {
            display.font_weight = weight;
        }
        if let Some(height) = self.line_height {
            display.line_height = height;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "webosd_gateway=info,webosd_eventsource=info,tower_http=debug".into()
            }),
        )
        .init();

    // load config: --config > WEBOSD_CONFIG env > ~/.webosd/webosd.toml
    let config_path = cli.config_path();
    let mut config = OsdConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!(error_code = e.code(), "Config load failed ({}), using defaults", e);
        OsdConfig::default()
    });
    cli.apply(&mut config)?;

    let settings = display::Settings::from_config(&config.display)
        .context("invalid display color")?;
    let addr = config.server.socket_addr()?;
    let device = webosd_device::open(&config.device.driver)?;

    // Root token: signals cancel it; the coordinator, the ticker and every
    // open stream watch it.
    let shutdown = CancellationToken::new();
    let events = EventSource::new(config.events, shutdown.clone());

    let period = Duration::from_millis(config.device.poll_interval_ms);
    let ticker = Ticker::new(device, events.clone(), period);
    let ticker_task = tokio::spawn(ticker.run(shutdown.clone()));

    let grace = Duration::from_millis(config.server.shutdown_grace_ms);
    let driver = config.device.driver.clone();
    let state = Arc::new(app::AppState::new(
        config,
        events.clone(),
        settings,
        driver,
        shutdown.clone(),
    ));
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(version = VERSION, build = GIT_SHA, "webosd listening on {}", addr);
    info!("Index        http://{}/", addr);
    info!("OSD          http://{}/osd", addr);
    info!("Event stream http://{}/es", addr);

    let server_shutdown = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
    });

    tokio::select! {
        res = &mut server => {
            // the server only returns on its own when it failed
            shutdown.cancel();
            res.context("server task panicked")?.context("server failed")?;
            return Ok(());
        }
        signal = crate::shutdown::wait_for_shutdown_signal() => {
            let signal = signal.context("installing signal handlers")?;
            info!(signal, "shutting down");
        }
    }

    shutdown.cancel();
    match tokio::time::timeout(grace, &mut server).await {
        Ok(Ok(Ok(()))) => info!("server stopped"),
        Ok(Ok(Err(e))) => warn!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => warn!(error = %e, "server task failed"),
        Err(_) => {
            warn!(
                grace_ms = grace.as_millis() as u64,
                "grace period expired, dropping open connections"
            );
            server.abort();
        }
    }

    let stats = ticker_task.await.context("ticker task panicked")?;
    info!(
        ticks = stats.ticks,
        published = stats.published,
        dropped = stats.dropped,
        failed = stats.failed,
        "ticker finished"
    );
    events.stopped().await;
    Ok(())
}
