use anyhow::{Context, Result};
use tracing::info;

use wxresolve_basin_runner::{BatchRunner, RunnerConfig};
use wxresolve_core::logging;

fn main() -> Result<()> {
    logging::init_json();

    let config = RunnerConfig::from_env().context("reading runner configuration")?;
    info!(
        namespace = %config.namespace,
        after = %config.after_date,
        before = %config.before_date,
        lowmem = config.lowmem,
        "Basin runner started"
    );

    let summary = BatchRunner::new(&config)?
        .run()
        .with_context(|| format!("resolving namespace {}", config.namespace))?;

    println!("AVG TEMP: {} Celsius", summary.average);
    Ok(())
}
