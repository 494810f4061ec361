use crate::error::{HomeGrownError, Result};
use dialoguer::{Confirm, Input, Password};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ten years. Much larger values overflow `chrono::Duration`.
const MAX_CACHE_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub nasa_power: NasaPowerConfig,
    #[serde(default)]
    pub planetary: PlanetaryConfig,
    #[serde(default)]
    pub mistral: MistralConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Replaces the crop catalog compiled into the binary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crops_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub year: i32,
    pub min_score: f64,
    pub limit: usize,
    pub max_area_m2: f64,
    pub default_sunshine_factor: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            year: 2023,
            min_score: 50.0,
            limit: 10,
            max_area_m2: 1_000_000.0,
            default_sunshine_factor: crate::models::DEFAULT_SUNSHINE_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NasaPowerConfig {
    pub base_url: String,
    pub community: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for NasaPowerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://power.larc.nasa.gov/api/temporal/daily/point".into(),
            community: "AG".into(),
            timeout_secs: 60,
            user_agent: format!("homegrown/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlanetaryConfig {
    pub enabled: bool,
    pub stac_url: String,
    pub data_api_url: String,
    pub collection: String,
    pub band: String,
    pub max_cloud_cover: u8,
    pub timeout_secs: u64,
    /// Scene statistics requests in flight at once
    pub max_concurrent_requests: usize,
}

impl Default for PlanetaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stac_url: "https://planetarycomputer.microsoft.com/api/stac/v1".into(),
            data_api_url: "https://planetarycomputer.microsoft.com/api/data/v1".into(),
            collection: "landsat-c2-l2".into(),
            band: "lwir11".into(),
            max_cloud_cover: 10,
            timeout_secs: 120,
            max_concurrent_requests: 4,
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MistralConfig {
    pub enabled: bool,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for MistralConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            base_url: "https://api.mistral.ai/v1".into(),
            model: "mistral-large-latest".into(),
            temperature: 0.7,
            max_tokens: 400,
        }
    }
}

impl MistralConfig {
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }
}

impl std::fmt::Debug for MistralConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistralConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_hours: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: 24,
        }
    }
}

impl Config {
    /// Load the config file, falling back to defaults when none exists.
    pub fn load(config_override: Option<&PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => {
                if !p.exists() {
                    return Err(HomeGrownError::Config(format!(
                        "Config file not found at {:?}",
                        p
                    )));
                }
                p.clone()
            }
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| HomeGrownError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content);

        // An empty file deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| HomeGrownError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let a = &self.analysis;
        if !(0.0..=1.0).contains(&a.default_sunshine_factor) {
            return Err(HomeGrownError::Config(format!(
                "analysis.default_sunshine_factor must be within [0, 1], got {}",
                a.default_sunshine_factor
            )));
        }
        if a.max_area_m2 <= 0.0 {
            return Err(HomeGrownError::Config(
                "analysis.max_area_m2 must be positive".into(),
            ));
        }
        if !(0.0..=100.0).contains(&a.min_score) {
            return Err(HomeGrownError::Config(format!(
                "analysis.min_score must be within [0, 100], got {}",
                a.min_score
            )));
        }
        if !(0..=MAX_CACHE_TTL_HOURS).contains(&self.cache.ttl_hours) {
            return Err(HomeGrownError::Config(format!(
                "cache.ttl_hours must be within [0, {}], got {}",
                MAX_CACHE_TTL_HOURS, self.cache.ttl_hours
            )));
        }
        if !(1..=32).contains(&self.planetary.max_concurrent_requests) {
            return Err(HomeGrownError::Config(format!(
                "planetary.max_concurrent_requests must be within [1, 32], got {}",
                self.planetary.max_concurrent_requests
            )));
        }
        Ok(())
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        Self::default_config_path()
    }

    /// Default path for writing new config files (~/.config/homegrown/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| HomeGrownError::Config("Cannot determine config directory".into()))?
            .join("homegrown");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the resulting Config and the path it was written to.
    pub fn setup_interactive(target: Option<&PathBuf>) -> Result<(Self, PathBuf)> {
        let input_err = |e: dialoguer::Error| HomeGrownError::Config(format!("Input error: {}", e));

        println!();
        println!("Let's set up HomeGrown!");
        println!();

        let defaults = Config::default();

        println!("Analysis defaults");
        let year: i32 = Input::new()
            .with_prompt("  Climate year")
            .default(defaults.analysis.year)
            .interact_text()
            .map_err(input_err)?;

        let min_score: f64 = Input::new()
            .with_prompt("  Minimum suitability score")
            .default(defaults.analysis.min_score)
            .interact_text()
            .map_err(input_err)?;

        let default_sunshine_factor: f64 = Input::new()
            .with_prompt("  Sunshine factor when none is given (0-1)")
            .default(defaults.analysis.default_sunshine_factor)
            .validate_with(|v: &f64| {
                if (0.0..=1.0).contains(v) {
                    Ok(())
                } else {
                    Err("must be between 0 and 1")
                }
            })
            .interact_text()
            .map_err(input_err)?;

        println!();

        println!("Landsat surface temperature (Microsoft Planetary Computer)");
        let planetary_enabled = Confirm::new()
            .with_prompt("  Refine temperatures with Landsat imagery?")
            .default(true)
            .interact()
            .map_err(input_err)?;

        println!();

        println!("Mistral summaries (leave API key blank to skip)");
        let api_key: String = Password::new()
            .with_prompt("  API key")
            .allow_empty_password(true)
            .interact()
            .map_err(input_err)?;

        println!();

        let config = Config {
            analysis: AnalysisConfig {
                year,
                min_score,
                default_sunshine_factor,
                ..defaults.analysis
            },
            planetary: PlanetaryConfig {
                enabled: planetary_enabled,
                ..defaults.planetary
            },
            mistral: MistralConfig {
                enabled: !api_key.is_empty(),
                api_key,
                ..defaults.mistral
            },
            ..defaults
        };
        config.validate()?;

        let config_path = match target {
            Some(p) => p.clone(),
            None => Self::default_config_path()?,
        };
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| HomeGrownError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# HomeGrown Configuration\n# Generated by `homegrown init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("HOMEGROWN_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| HomeGrownError::Config("Cannot determine data directory".into()))?
            .join("homegrown");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn db_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("homegrown.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.analysis.year, 2023);
        assert_eq!(config.analysis.min_score, 50.0);
        assert_eq!(config.analysis.limit, 10);
        assert_eq!(config.analysis.max_area_m2, 1_000_000.0);
        assert_eq!(config.nasa_power.community, "AG");
        assert_eq!(config.planetary.collection, "landsat-c2-l2");
        assert_eq!(config.planetary.band, "lwir11");
        assert!(!config.mistral.is_usable());
        assert_eq!(config.cache.ttl_hours, 24);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let yaml = "analysis:\n  year: 2021\nplanetary:\n  enabled: false\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.analysis.year, 2021);
        assert_eq!(config.analysis.limit, 10);
        assert!(!config.planetary.enabled);
        assert_eq!(config.planetary.max_cloud_cover, 10);
    }

    #[test]
    fn env_vars_are_substituted() {
        std::env::set_var("HOMEGROWN_TEST_MISTRAL_KEY", "sk-test");
        let yaml = "mistral:\n  enabled: true\n  api_key: ${HOMEGROWN_TEST_MISTRAL_KEY}\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.mistral.api_key, "sk-test");
        assert!(config.mistral.is_usable());
    }

    #[test]
    fn api_key_is_redacted_in_debug() {
        let config = MistralConfig {
            api_key: "super-secret".into(),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn out_of_range_sunshine_factor_rejected() {
        let yaml = "analysis:\n  default_sunshine_factor: 1.5\n";
        assert!(matches!(
            Config::from_yaml(yaml),
            Err(HomeGrownError::Config(_))
        ));
    }

    #[test]
    fn cache_ttl_is_bounded() {
        assert!(Config::from_yaml("cache:\n  ttl_hours: 87600\n").is_ok());
        for ttl in ["-1", "87601", "9223372036854775807"] {
            let yaml = format!("cache:\n  ttl_hours: {}\n", ttl);
            assert!(matches!(
                Config::from_yaml(&yaml),
                Err(HomeGrownError::Config(_))
            ));
        }
    }

    #[test]
    fn zero_concurrency_rejected() {
        let yaml = "planetary:\n  max_concurrent_requests: 0\n";
        assert!(matches!(
            Config::from_yaml(yaml),
            Err(HomeGrownError::Config(_))
        ));
    }

    #[test]
    fn example_config_parses() {
        let config = Config::from_yaml(include_str!("../config/config.yaml.example")).unwrap();
        assert_eq!(config.analysis.default_sunshine_factor, 0.7);
        assert!(config.planetary.enabled);
        assert_eq!(config.planetary.max_concurrent_requests, 4);
        assert!(!config.mistral.enabled);
        assert!(config.crops_path.is_none());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let missing = PathBuf::from("/nonexistent/homegrown/config.yaml");
        assert!(Config::load(Some(&missing)).is_err());
    }
}
