mod cli;
mod config;
mod datasources;
mod db;
mod error;
mod logic;
mod models;

use chrono::{Duration, Utc};
use clap::Parser;
use cli::{ClimateArgs, Cli, Commands, RecommendArgs};
use config::Config;
use datasources::{
    CachedClimateProvider, ClimateProvider, MistralSummarizer, NasaPowerClient, PlanetaryClient,
};
use db::Database;
use error::Result;
use logic::{AnalysisService, AnalysisSettings, RecommendRequest};
use models::{ClimateAnalysis, CropCatalog, MonthlyTemperature};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct ClimateReport {
    latitude: f64,
    longitude: f64,
    year: i32,
    days: usize,
    analysis: ClimateAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    monthly: Option<MonthlyClimate>,
}

#[derive(Serialize)]
struct MonthlyClimate {
    years: Vec<i32>,
    months: Vec<MonthlyTemperature>,
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(if e.is_input_error() { 2 } else { 1 });
    }
}

/// RUST_LOG wins; otherwise -v raises this crate's level. Logs go to stderr
/// so stdout stays pure JSON.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("warn,homegrown={}", level))),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Init => {
            Config::setup_interactive(cli.config.as_ref())?;
            Ok(())
        }
        Commands::Check => check(cli).await,
        Commands::Crops => {
            let config = load_config(cli)?;
            let catalog = CropCatalog::load(config.crops_path.as_deref())?;
            print_json(&catalog.crops())
        }
        Commands::Recommend(args) => {
            let config = load_config(cli)?;
            let service = build_service(&config, cli.data_dir.as_ref())?;
            recommend(&service, &config, args).await
        }
        Commands::Climate(args) => {
            let config = load_config(cli)?;
            let service = build_service(&config, cli.data_dir.as_ref())?;
            climate(&service, &config, args).await
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    Config::load(cli.config.as_ref()).inspect_err(|_| {
        eprintln!("Run `homegrown init` or copy config/config.yaml.example to config/config.yaml");
    })
}

fn build_service(config: &Config, data_dir: Option<&PathBuf>) -> Result<AnalysisService> {
    let catalog = Arc::new(CropCatalog::load(config.crops_path.as_deref())?);
    tracing::debug!(crops = catalog.len(), "Loaded crop catalog");
    if catalog.is_empty() {
        tracing::warn!("Crop catalog is empty, reports will have no recommendations");
    }

    let nasa: Arc<dyn ClimateProvider> = Arc::new(NasaPowerClient::new(config.nasa_power.clone())?);
    let climate: Arc<dyn ClimateProvider> = match config
        .cache
        .enabled
        .then(|| open_cache(data_dir, config.cache.ttl_hours))
        .flatten()
    {
        Some(db) => Arc::new(CachedClimateProvider::new(nasa, db, config.cache.ttl_hours)),
        None => nasa,
    };

    let settings = AnalysisSettings {
        max_area_m2: config.analysis.max_area_m2,
        default_sunshine_factor: config.analysis.default_sunshine_factor,
    };
    let mut service = AnalysisService::new(climate, catalog, settings);

    if config.planetary.enabled {
        service = service.with_surface_provider(Arc::new(PlanetaryClient::new(
            config.planetary.clone(),
        )?));
    }
    if config.mistral.is_usable() {
        service = service.with_summarizer(Arc::new(MistralSummarizer::new(config.mistral.clone())?));
    }

    Ok(service)
}

/// Open the cache and drop expired rows. A cache that cannot be opened is
/// skipped rather than failing the run.
fn open_cache(data_dir: Option<&PathBuf>, ttl_hours: i64) -> Option<Database> {
    let db = match Database::open(data_dir) {
        Ok(db) => db,
        Err(e) => {
            tracing::warn!("Climate cache unavailable, continuing without it: {}", e);
            return None;
        }
    };
    tracing::debug!(path = %db.path().display(), "Opened climate cache");

    match db.purge_climate_cache(Utc::now() - Duration::hours(ttl_hours)) {
        Ok(0) => {}
        Ok(removed) => tracing::debug!(removed, "Purged expired climate cache entries"),
        Err(e) => tracing::warn!("Failed to purge climate cache: {}", e),
    }

    Some(db)
}

async fn recommend(service: &AnalysisService, config: &Config, args: &RecommendArgs) -> Result<()> {
    let request = RecommendRequest {
        polygon: args.polygon()?,
        year: args.year.unwrap_or(config.analysis.year),
        min_score: args.min_score.unwrap_or(config.analysis.min_score),
        limit: args.limit.unwrap_or(config.analysis.limit),
        sunshine_factor: args.sunshine_factor,
        use_imagery: !args.no_imagery,
        summarize: args.summary,
    };

    let report = service.recommend(&request).await?;
    print_json(&report)
}

async fn climate(service: &AnalysisService, config: &Config, args: &ClimateArgs) -> Result<()> {
    let year = args.year.unwrap_or(config.analysis.year);
    let (series, analysis) = service.climate(args.lat, args.lon, year).await?;

    let monthly = if args.years > 1 {
        let years: Vec<i32> = ((year - args.years as i32 + 1)..=year).collect();
        let months = service.monthly_climate(args.lat, args.lon, &years).await?;
        Some(MonthlyClimate { years, months })
    } else {
        None
    };

    print_json(&ClimateReport {
        latitude: args.lat,
        longitude: args.lon,
        year,
        days: series.len(),
        analysis,
        monthly,
    })
}

async fn check(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    println!("Config: OK");

    let catalog = CropCatalog::load(config.crops_path.as_deref())?;
    println!("Crop catalog: {} crops", catalog.len());

    if config.cache.enabled {
        match Database::open(cli.data_dir.as_ref()) {
            Ok(db) => println!(
                "Climate cache: {} ({} entries)",
                db.path().display(),
                db.count_cached_climate()?
            ),
            Err(e) => println!("Climate cache: FAILED ({})", e),
        }
    } else {
        println!("Climate cache: disabled");
    }

    let nasa = NasaPowerClient::new(config.nasa_power.clone())?;
    print_status("NASA POWER", nasa.test_connection().await);

    if config.planetary.enabled {
        let planetary = PlanetaryClient::new(config.planetary.clone())?;
        print_status("Planetary Computer", planetary.test_connection().await);
    } else {
        println!("Planetary Computer: disabled");
    }

    println!(
        "Mistral: {}",
        if config.mistral.is_usable() {
            "configured"
        } else {
            "not configured"
        }
    );

    Ok(())
}

fn print_status(name: &str, result: Result<bool>) {
    match result {
        Ok(true) => println!("{}: OK", name),
        Ok(false) => println!("{}: OFFLINE", name),
        Err(e) => println!("{}: OFFLINE ({})", name, e),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
