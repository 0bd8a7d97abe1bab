//! ORGKIT Server — Application entry point.

use orgkit_core::rules::TypeRuleTable;
use orgkit_db::{DbConfig, DbManager, run_migrations};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("orgkit=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting ORGKIT server...");

    // Building the table validates the compiled rules; abort early if the
    // shipped data is inconsistent.
    let _ = TypeRuleTable::global();

    let config = DbConfig::from_env();
    let manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }

    // TODO: Mount the REST API once the transport layer lands; the engine
    // services are constructed per-request from the repositories.

    tracing::info!("ORGKIT server stopped.");
}
