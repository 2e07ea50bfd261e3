use tracing::info;

use pilketua_election::config::ElectionConfig;
use pilketua_election::router::build_router;
use pilketua_election::state::AppState;
use pilketua_store::memory::MemoryStore;
use pilketua_store::{DocumentStore, StoreError};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = ElectionConfig::from_env();

    let store = MemoryStore::new();
    match store.sign_in_anonymously().await {
        Ok(identity) => info!(uid = %identity.uid, "signed in anonymously"),
        Err(StoreError::ConfigMissing) => {
            tracing::error!(
                "anonymous sign-in is not enabled on the backend; \
                 enable it before starting the service"
            );
            std::process::exit(1);
        }
        Err(err) => {
            tracing::error!(error = %err, "could not reach the store");
            std::process::exit(1);
        }
    }

    let state = AppState::new(store, &config);
    let router = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("election service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
