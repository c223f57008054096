//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own, with OpenAPI/Swagger UI.
//!
//! ## Intended use
//! Development and debugging. The workspace's main `rda-run` binary serves the same router.

use api_rest::router;
use rda_core::{core_config_from_env, AnalysisService};
use rda_gemini::{GeminiAnalyzer, GeminiConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the RDA REST API server
///
/// # Environment Variables
/// - `RDA_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `RDA_DATA_DIR`, `RDA_HISTORY_CAPACITY`, `RDA_MAX_PROTOCOL_LENGTH`, `RDA_DETAIL_LEVEL`,
///   `RDA_TOXICITY_THRESHOLD`: core configuration
/// - `GEMINI_API_KEY`, `GEMINI_BASE_URL`, `GEMINI_TIMEOUT_SECS`: analyzer connection
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - any configuration value is invalid,
/// - the data directory cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("rda_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("RDA_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

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

    tracing::info!("-- Starting RDA REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(service)).await?;

    Ok(())
}
