use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use catalog::AssetStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = env::var("ASSETS_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/assets.json"));
    let addr: SocketAddr = env::var("ASSETS_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:4000".to_string())
        .parse()
        .context("invalid ASSETS_ADDR")?;

    let store = AssetStore::load(&path)
        .with_context(|| format!("loading dataset {}", path.display()))?;
    for (kind, count) in store.count_by_kind() {
        info!(%kind, count, "dataset kind");
    }

    let app = server::build_router(Arc::new(store));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("asset server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
