//! Store bridge demonstration
//!
//! Runs a catalog search and lookup through the façade and prints the
//! results. Engine failures are printed rather than panicking, so the demo
//! also shows how an unlinked build reports itself.
//!
//! Run with:
//! ```bash
//! # Unlinked build: every operation reports the backend unavailable
//! cargo run -p core-service --example store_demo -- "notes" US
//!
//! # Against the engine library
//! cargo run -p core-service --features linked --example store_demo -- "notes" US json
//! ```

use anyhow::Context;
use core_runtime::artifact::{candidate_roots, ArtifactSource};
use core_runtime::config::{process_environment, StoreConfig};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_service::StoreService;
use std::env;
use std::path::Path;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let term = args.get(1).cloned().unwrap_or_else(|| "notes".to_string());
    let country = args.get(2).cloned().unwrap_or_else(|| "US".to_string());
    let format = match args.get(3).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };

    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug),
    )
    .context("initializing logging")?;

    let cwd = env::current_dir().context("reading working directory")?;
    let manifest_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap_or(&cwd)
        .to_path_buf();
    match ArtifactSource::resolve(&process_environment(), &candidate_roots(&cwd, &manifest_root)) {
        Ok(source) => info!(?source, "Engine artifact"),
        Err(err) => warn!(error = %err, "Engine artifact could not be resolved"),
    }

    let config = StoreConfig::from_env().context("loading store configuration")?;
    info!(device = %config.device_identifier, "Store configuration loaded");
    let service = StoreService::from_config(&config);

    match service.search_default(&term, &country).await {
        Ok(results) => {
            for app in &results {
                println!("{:>12}  {:<40} {}", app.id, app.bundle_id, app.version);
            }

            if let Some(first) = results.first() {
                let app = service.lookup(&first.bundle_id, &country).await?;
                println!("\n{} by {} ({})", app.name, app.seller_name, app.primary_genre_name);
            }
        }
        Err(err) => println!("search failed: {}", err),
    }

    Ok(())
}
