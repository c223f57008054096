use api_rest::router;
use rda_core::{AnalysisService, core_config_from_env};
use rda_gemini::{GeminiAnalyzer, GeminiConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the RDA application
///
/// Resolves configuration once, opens the persisted history and serves the REST API (with
/// Swagger UI at `/swagger-ui`) until interrupted.
///
/// # Environment Variables
/// - `RDA_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `RDA_DATA_DIR`: Directory for the persisted history (default: "rda_data")
/// - `RDA_HISTORY_CAPACITY`: Number of analyses kept (default: 50)
/// - `RDA_MAX_PROTOCOL_LENGTH`: Longest accepted conversation in characters (default: 15000)
/// - `RDA_DETAIL_LEVEL`: `compact`, `standard` or `deep` (default: "standard")
/// - `RDA_TOXICITY_THRESHOLD`: Score from which a record is reported as toxic (default: 70)
/// - `GEMINI_API_KEY`: API key for the analyzer
/// - `GEMINI_BASE_URL`, `GEMINI_TIMEOUT_SECS`: analyzer connection overrides
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or the server itself fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rda=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("RDA_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let env = |name: &str| std::env::var(name).ok();
    let cfg = core_config_from_env(env)?;
    let gemini = GeminiConfig::from_env(env)?;
    if gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; analyses will fail until it is configured");
    }

    let service = Arc::new(AnalysisService::open(
        &cfg,
        Arc::new(GeminiAnalyzer::new(gemini)?),
    )?);
    tracing::info!(
        records = service.history().len(),
        capacity = service.history().capacity(),
        "history ready"
    );

    tracing::info!("++ Starting RDA REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    tracing::info!("-- RDA REST stopped");
    Ok(())
}
