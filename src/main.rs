use tracing_subscriber::EnvFilter;

use village_compare::api;
use village_compare::config::Config;
use village_compare::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "LLM provider: {} ({}), retrieval: {:?} x{}",
        config.llm.provider,
        config.llm.base_url,
        config.retrieval.mode,
        config.retrieval.budget
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config)?;
    tracing::info!(
        "{} villages, {} knowledge entries",
        state.profiles.names().len(),
        state.knowledge.len()
    );

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {bind_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
