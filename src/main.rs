//! cftrack - dashboard host for a Codeforces student-tracking backend.
//!
//! Serves the local HTTP surface in [`cftrack::api`] on `CFTRACK_PORT` and
//! proxies every operation to the backend at `CFTRACK_BACKEND_URL`.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cftrack::AppState;
use cftrack::api;
use cftrack::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("cftrack=info".parse()?))
        .init();

    let config = Config::from_env()?;

    info!(
        port = config.port,
        backend_url = %config.backend_url,
        page_size = config.page_size,
        "Starting cftrack"
    );

    let state = AppState::new(&config)?;

    // The first page is loaded eagerly; a backend that is down only delays it.
    match state.list.load().await {
        Ok(cursor) => info!(total = cursor.total, "Initial student list loaded"),
        Err(e) => warn!(error = %e, "Initial student list unavailable"),
    }

    let app = api::router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "cftrack is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
