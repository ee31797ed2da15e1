//! Configuration management for `va`
//!
//! Handles loading configuration from an optional TOML file and `VA__`
//! environment variables, and validates every setting before use.

use crate::VaError;
use crate::forecast::icons::CODE_PLACEHOLDER;
use crate::forecast::{Aggregator, IconSet, MergeStrategy};
use crate::models::City;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted when no OWM key is configured
pub const OWM_KEY_ENV: &str = "OWM_API_KEY";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaConfig {
    /// Provider HTTP settings
    pub sources: SourcesConfig,
    /// Response cache settings
    pub cache: CacheConfig,
    /// Aggregation settings
    pub forecast: ForecastConfig,
    /// Icon URL templates
    pub icons: IconSet,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Provider HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// OpenWeatherMap API key; OWM is skipped without one
    pub owm_api_key: Option<String>,
    /// User agent sent to every provider (met.no requires one)
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Persistent,
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Lifetime of a cached provider response in seconds
    pub ttl_seconds: u64,
    /// Capacity of the memory backend
    pub max_entries: usize,
    /// Directory of the persistent backend
    pub location: Option<PathBuf>,
}

/// Aggregation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub hourly_limit: usize,
    pub daily_limit: usize,
    pub merge: MergeStrategy,
    /// IANA zone whose hours and days the views are cut by
    pub timezone: String,
    pub default_city: String,
    pub sun_days: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_user_agent() -> String {
    format!("va/{}", crate::VERSION)
}

fn default_timeout() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_cache_max_entries() -> usize {
    256
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_city() -> String {
    "Odense".to_string()
}

fn default_sun_days() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            owm_api_key: None,
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            ttl_seconds: default_cache_ttl(),
            max_entries: default_cache_max_entries(),
            location: None,
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            hourly_limit: crate::forecast::HOURLY_LIMIT,
            daily_limit: crate::forecast::DAILY_LIMIT,
            merge: MergeStrategy::default(),
            timezone: default_timezone(),
            default_city: default_city(),
            sun_days: default_sun_days(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Configured directory, or `va/` under the platform cache directory
    #[must_use]
    pub fn resolved_location(&self) -> PathBuf {
        self.location.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("va")
        })
    }
}

impl ForecastConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| VaError::config(format!("Invalid timezone '{}': {e}", self.timezone)).into())
    }
}

impl VaConfig {
    /// Load configuration from the default file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // VA__SECTION__KEY overrides
        builder = builder.add_source(
            Environment::with_prefix("VA")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| format!("Failed to build configuration from {}", config_file.display()))?;

        let mut config: VaConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        if config.sources.owm_api_key.is_none() {
            config.sources.owm_api_key = std::env::var(OWM_KEY_ENV).ok();
        }

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("va").join("config.toml"))
    }

    /// Replace blank or zero values with their defaults
    pub fn apply_defaults(&mut self) {
        if self
            .sources
            .owm_api_key
            .as_ref()
            .is_some_and(|key| key.trim().is_empty())
        {
            self.sources.owm_api_key = None;
        }
        if self.sources.user_agent.trim().is_empty() {
            self.sources.user_agent = default_user_agent();
        }
        if self.sources.timeout_seconds == 0 {
            self.sources.timeout_seconds = default_timeout();
        }
        if self.cache.ttl_seconds == 0 {
            self.cache.ttl_seconds = default_cache_ttl();
        }
        if self.cache.max_entries == 0 {
            self.cache.max_entries = default_cache_max_entries();
        }
        if self.forecast.timezone.trim().is_empty() {
            self.forecast.timezone = default_timezone();
        }
        if self.forecast.default_city.trim().is_empty() {
            self.forecast.default_city = default_city();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.sources.timeout_seconds > 300 {
            return Err(VaError::config("Source timeout cannot exceed 300 seconds").into());
        }

        if self.sources.max_retries > 10 {
            return Err(VaError::config("Source max retries cannot exceed 10").into());
        }

        if self.cache.ttl_seconds > 7 * 24 * 3600 {
            return Err(VaError::config("Cache TTL cannot exceed 604800 seconds (1 week)").into());
        }

        if !(1..=168).contains(&self.forecast.hourly_limit) {
            return Err(VaError::config("Hourly limit must be between 1 and 168").into());
        }

        if !(1..=16).contains(&self.forecast.daily_limit) {
            return Err(VaError::config("Daily limit must be between 1 and 16").into());
        }

        if self.forecast.sun_days > 31 {
            return Err(VaError::config("Sun days cannot exceed 31").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(VaError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(VaError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        self.forecast.timezone()?;
        City::find(&self.forecast.default_city)
            .map_err(|e| VaError::config(format!("Invalid default city: {e}")))?;

        for (name, template) in [("dmi", &self.icons.dmi), ("yr", &self.icons.yr)] {
            if !template.contains(CODE_PLACEHOLDER) {
                return Err(VaError::config(format!(
                    "Icon template for {name} must contain {CODE_PLACEHOLDER}"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Aggregator configured with this file's limits, zone, merge and icons
    pub fn aggregator(&self) -> Result<Aggregator> {
        Ok(Aggregator::new()
            .with_icons(self.icons.clone())
            .with_timezone(self.forecast.timezone()?)
            .with_strategy(self.forecast.merge)
            .with_limits(self.forecast.hourly_limit, self.forecast.daily_limit))
    }
}
