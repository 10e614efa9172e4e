//! Headless host bridge binary for stdin/stdout JSON communication.
//!
//! Reads `CommandEnvelope` messages as newline-delimited JSON from stdin and
//! writes one `ResponseEnvelope` per line to stdout. All tracing output goes
//! to stderr so that stdout remains a clean protocol channel.

use folio::bridge::run_stdio_bridge;
use folio::config::FolioConfig;
use folio::folio_dirs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("folio=info,folio_match=info")
            }),
        )
        .init();

    let config_path = folio_dirs::config_file();
    let config = FolioConfig::load_or_default(&config_path)
        .map_err(|e| anyhow::anyhow!("cannot load {}: {e}", config_path.display()))?;

    tracing::info!("folio-host starting");

    run_stdio_bridge(&config.matching).await.map_err(|e| {
        tracing::error!(error = %e, "folio-host exited with error");
        anyhow::anyhow!("folio-host failed: {e}")
    })?;

    tracing::info!("folio-host shut down cleanly");
    Ok(())
}
