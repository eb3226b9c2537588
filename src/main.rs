use screening_backend::{
    build_store,
    config::{get_config, init_config},
    routes,
    store::{schema, Workbook},
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    init_config()?;
    let config = Arc::new(get_config().clone());

    let store = build_store(&config).await?;
    info!(backend = store.backend_tag(), "Row store ready");

    let created = schema::bootstrap(&Workbook::new(store.clone())).await?;
    if !created.is_empty() {
        info!(sheets = ?created, "Created missing sheets");
    }

    let app_state = AppState::with_providers(config.clone(), store)?;
    let app = routes::router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
