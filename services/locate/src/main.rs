//! Pixel locator.
//!
//! Reads the georeferencing of a raster from its ENVI header (or a JSON
//! metadata file) and reports the pixel/line under one or more geographic
//! points.

mod config;
mod output;
mod points;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::{LocateConfig, OutputFormat};
use georef_common::{CrsCode, Point2D};
use map_info::RawMetadata;
use pixel_resolver::PixelResolver;

#[derive(Parser, Debug)]
#[command(name = "pixel-locate")]
#[command(about = "Find the raster pixel under a geographic point")]
struct Args {
    /// ENVI header (.hdr) or JSON metadata file of the raster
    #[arg(long)]
    header: PathBuf,

    /// Query longitude (or x in the source CRS)
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// Query latitude (or y in the source CRS)
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// File with one `lon,lat` pair per line
    #[arg(long, conflicts_with_all = ["lon", "lat"])]
    points: Option<PathBuf>,

    /// CRS of the query coordinates (default: EPSG:4326)
    #[arg(long)]
    source_crs: Option<String>,

    /// Override the raster's native CRS
    #[arg(long)]
    native_crs: Option<String>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file path
    #[arg(short, long, env = "GEOPIXEL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// Command-line flags take precedence over every other source.
    fn apply(&self, config: &mut LocateConfig) {
        if let Some(v) = &self.source_crs {
            config.source_crs = v.clone();
        }
        if let Some(v) = &self.native_crs {
            config.native_crs = Some(v.clone());
        }
        if let Some(v) = self.format {
            config.format = v;
        }
        if let Some(v) = &self.log_level {
            config.log_level = v.clone();
        }
        if self.log_json {
            config.log_json = true;
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = LocateConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    init_tracing(&config)?;

    let source_crs: CrsCode = config
        .source_crs
        .parse()
        .with_context(|| format!("Invalid source CRS '{}'", config.source_crs))?;
    let native_crs = config
        .native_crs
        .as_deref()
        .map(str::parse::<CrsCode>)
        .transpose()
        .context("Invalid native CRS override")?;

    let metadata = RawMetadata::from_path(&args.header)
        .with_context(|| format!("Failed to load {}", args.header.display()))?;
    let resolver = PixelResolver::from_metadata(&metadata, native_crs)
        .with_context(|| format!("Failed to georeference {}", args.header.display()))?;

    let queries = match (&args.points, args.lon, args.lat) {
        (Some(path), _, _) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read points file {}", path.display()))?;
            points::parse_points(&text, source_crs)?
        }
        (None, Some(lon), Some(lat)) => vec![Point2D::new(lon, lat, source_crs)],
        _ => bail!("Either --lon/--lat or --points is required"),
    };

    info!(
        points = queries.len(),
        source_crs = %source_crs,
        native_crs = %resolver.native_crs(),
        "Resolving"
    );

    let results = resolver.resolve_batch(&queries);
    print!("{}", output::render(config.format, &queries, &results)?);

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        bail!("{} of {} points could not be resolved", failed, queries.len());
    }

    Ok(())
}

/// Install the global subscriber. Logs go to stderr so stdout carries only results.
fn init_tracing(config: &LocateConfig) -> Result<()> {
    let level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    Ok(())
}
