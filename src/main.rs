//! Mortis - Mortuary Operations Service
//!
//! Serves the operations API: storage-unit registry with the
//! assign/release/maintenance lifecycle, deceased record keeping, funeral
//! scheduling, and the operator notification feed.

use clap::Parser;
use mortis::http::{router, AppState};

// =============================================================================
// TigerStyle Constants
// =============================================================================

/// Default HTTP bind address
pub const HTTP_BIND_ADDRESS_DEFAULT: &str = "127.0.0.1:8000";

/// Application name
pub const APP_NAME: &str = "mortis";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// CLI
// =============================================================================

/// Mortis - Mortuary Operations Service
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
#[command(about = "Mortuary operations service: storage, records, scheduling")]
#[command(version)]
struct Cli {
    /// HTTP API bind address
    #[arg(short, long, default_value = HTTP_BIND_ADDRESS_DEFAULT)]
    bind: String,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .init();

    tracing::info!("Mortis v{}", APP_VERSION);

    let state = AppState::new();
    let app = router(state);

    tracing::info!("Starting HTTP server on {}", cli.bind);
    let addr: std::net::SocketAddr = cli.bind.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
