use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use wxresolve_core::{logging, PipelineConfig};
use wxresolve_decision::{LoadMode, Resolver};

#[derive(Debug, Parser)]
#[command(
    name = "wxresolve",
    about = "Resolve a market decision from attested weather station telemetry",
    version
)]
struct Cli {
    /// Parquet telemetry file to resolve.
    #[arg(short = 'f', long, value_name = "PATH")]
    file: PathBuf,

    /// Read, narrow and filter one row group at a time.
    #[arg(long)]
    lowmem: bool,

    /// Reserved for a radius filter; currently unused.
    #[arg(long, visible_alias = "lat", allow_negative_numbers = true, value_name = "DEG")]
    latitude: Option<f64>,

    /// Reserved for a radius filter; currently unused.
    #[arg(long, visible_alias = "lon", allow_negative_numbers = true, value_name = "DEG")]
    longitude: Option<f64>,

    /// Jurisdiction boundary (GeoJSON or cached coordinate list).
    #[arg(long, value_name = "PATH")]
    boundary: Option<PathBuf>,

    /// H3 resolution used to tile the jurisdiction.
    #[arg(long, value_name = "N")]
    resolution: Option<u8>,

    /// TOML pipeline configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit structured JSON logs on stderr.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(boundary) = &self.boundary {
            config.boundary.path = boundary.clone();
        }
        if let Some(resolution) = self.resolution {
            config.boundary.resolution = resolution;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }
    debug!(latitude = ?cli.latitude, longitude = ?cli.longitude, "Radius arguments ignored");

    let config = cli.pipeline_config()?;
    let resolver = Resolver::from_config(&config).with_context(|| {
        format!("loading boundary from {}", config.boundary.path.display())
    })?;
    let resolution = resolver
        .decide(&cli.file, LoadMode::from_lowmem(cli.lowmem))
        .with_context(|| format!("resolving {}", cli.file.display()))?;

    println!("{}", resolution.decision.value);
    Ok(())
}
