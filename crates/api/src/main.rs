//! ROM Engine - Main Entry Point

use api::{init_logging, run_server, Settings};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_logging(&settings.logging)?;

    info!("=== ROM Engine v{} ===", env!("CARGO_PKG_VERSION"));
    let prometheus = PrometheusBuilder::new().install_recorder()?;

    run_server(settings, Some(prometheus)).await
}
