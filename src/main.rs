use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::EnvFilter;

use jobtrail::config;
use jobtrail::routes;
use jobtrail::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Default to debug logs for our crate in debug builds; RUST_LOG
    // overrides either way.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("jobtrail=debug,tower_http=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting jobtrail ...");

    config::init_config()?;
    let cfg = config::get()?;

    let state = AppState::new()?;
    let app = routes::router(state, &cfg)?;

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
