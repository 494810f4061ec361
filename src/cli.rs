use crate::error::{HomeGrownError, Result};
use crate::models::Polygon;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "homegrown",
    version,
    about = "Crop suitability for urban land parcels"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override SQLite cache directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank crops for a parcel
    Recommend(RecommendArgs),
    /// List the crop catalog
    Crops,
    /// Annual climate statistics for a point
    Climate(ClimateArgs),
    /// Re-run interactive setup
    Init,
    /// Validate config and test connections
    Check,
}

#[derive(Args)]
pub struct RecommendArgs {
    /// JSON or YAML file with `coordinates` and optional `sunshine_factors`
    #[arg(long, conflicts_with = "coords", required_unless_present = "coords")]
    pub polygon: Option<PathBuf>,

    /// Inline polygon as "lat,lon;lat,lon;..."
    #[arg(long)]
    pub coords: Option<String>,

    /// Climate year (defaults to analysis.year)
    #[arg(long)]
    pub year: Option<i32>,

    /// Minimum overall score to include a crop
    #[arg(long)]
    pub min_score: Option<f64>,

    /// Maximum number of recommendations
    #[arg(long)]
    pub limit: Option<usize>,

    /// Override the parcel's sunshine factor (0-1)
    #[arg(long)]
    pub sunshine_factor: Option<f64>,

    /// Skip Landsat surface temperature refinement
    #[arg(long)]
    pub no_imagery: bool,

    /// Attach a narrative summary
    #[arg(long)]
    pub summary: bool,
}

#[derive(Args)]
pub struct ClimateArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    #[arg(long)]
    pub year: Option<i32>,

    /// Also report monthly means over this many years ending at `year`
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=30))]
    pub years: u32,
}

impl RecommendArgs {
    pub fn polygon(&self) -> Result<Polygon> {
        match (&self.polygon, &self.coords) {
            (Some(path), _) => load_polygon(path),
            (None, Some(coords)) => Polygon::parse_coords(coords),
            (None, None) => Err(HomeGrownError::InvalidPolygon(
                "either --polygon or --coords is required".into(),
            )),
        }
    }
}

/// Read a polygon file. `.json` is parsed as JSON, anything else as YAML.
pub fn load_polygon(path: &Path) -> Result<Polygon> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        HomeGrownError::InvalidPolygon(format!("cannot read {}: {}", path.display(), e))
    })?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    parse_polygon(&content, is_json)
}

fn parse_polygon(content: &str, is_json: bool) -> Result<Polygon> {
    let polygon = if is_json {
        serde_json::from_str(content)
            .map_err(|e| HomeGrownError::InvalidPolygon(format!("bad polygon JSON: {}", e)))?
    } else {
        serde_yaml::from_str(content)
            .map_err(|e| HomeGrownError::InvalidPolygon(format!("bad polygon YAML: {}", e)))?
    };
    Ok(polygon)
}
