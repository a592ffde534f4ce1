use std::sync::Arc;

use rebac_api::{config::Config, routes::create_router, AppState, Store};
use rebac_authorizer::Authorizer;
use rebac_graph::build_model;
use rebac_rbac::rbac_schema;
use rebac_store::{memory::InMemoryBackend, ChunkedStore, RawBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting ReBAC authorization webhook");
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Version");

    let config = Config::from_env();
    tracing::info!(
        store_backend = %config.store_backend_addr,
        store_name = %config.store_name,
        "Loaded configuration"
    );

    let schema = rbac_schema();
    let model = build_model(&schema);

    let backend = InMemoryBackend::new();
    backend.write_model(&model).await?;
    let store: Store = ChunkedStore::new(backend, schema);

    let authorizer = Authorizer::new(store);
    let state = Arc::new(AppState { authorizer });

    let router = create_router(state);

    tracing::info!(addr = %config.webhook_bind_addr, "Listening");
    let listener = tokio::net::TcpListener::bind(config.webhook_bind_addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
