use anyhow::Result;
use std::sync::Arc;

use dialogue_tender_backend::services::{MemoryTenderStore, PgTenderStore, TenderStore};
use dialogue_tender_backend::{app, auth, config, db, logging, policy};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = config::Settings::from_env()?;

    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting dialogue tender backend"
    );

    // Refuse to start with incomplete role tables
    policy::check_all()?;

    let store: Arc<dyn TenderStore> = match &settings.database_url {
        Some(url) => Arc::new(PgTenderStore::new(db::create_pool(&settings, url).await?)),
        None => {
            tracing::warn!("DATABASE_URL not set, tenders are kept in memory");
            Arc::new(MemoryTenderStore::new())
        }
    };

    let verifier = auth::TokenVerifier::from_settings(&settings)?;
    if let Err(e) = verifier.warm().await {
        tracing::warn!(error = %e, "Failed to warm JWKS cache - will fetch on first request");
    }

    let state = app::AppState::new(store, settings.clone(), verifier);
    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
