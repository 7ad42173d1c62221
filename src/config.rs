//! Configuration management for the `TripCraft` library
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TripCraftError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `TripCraft` library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripCraftConfig {
    /// Text-generation API configuration
    pub gemini: GeminiConfig,
    /// Place-search API configuration
    pub kakao: KakaoConfig,
    /// Route-timing API configuration
    pub tmap: TmapConfig,
}

/// Text-generation API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Gemini API key
    pub api_key: Option<String>,
    /// Model identifier
    #[serde(default = "default_gemini_model")]
    pub model: String,
    /// Base URL for the generation API
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    /// Connect timeout in seconds
    #[serde(default = "default_gemini_connect_timeout")]
    pub connect_timeout_seconds: u32,
    /// Read timeout in seconds; generation latency dominates, so this is the
    /// long one
    #[serde(default = "default_gemini_read_timeout")]
    pub read_timeout_seconds: u32,
}

/// Place-search API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KakaoConfig {
    /// Kakao REST API key
    pub api_key: Option<String>,
    /// Base URL for the place-search API
    #[serde(default = "default_kakao_base_url")]
    pub base_url: String,
    /// Connect timeout in seconds
    #[serde(default = "default_lookup_connect_timeout")]
    pub connect_timeout_seconds: u32,
    /// Read timeout in seconds
    #[serde(default = "default_lookup_read_timeout")]
    pub read_timeout_seconds: u32,
}

/// Route-timing API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmapConfig {
    /// Tmap application key
    pub app_key: Option<String>,
    /// Base URL for the routing API
    #[serde(default = "default_tmap_base_url")]
    pub base_url: String,
    /// Connect timeout in seconds
    #[serde(default = "default_lookup_connect_timeout")]
    pub connect_timeout_seconds: u32,
    /// Read timeout in seconds
    #[serde(default = "default_lookup_read_timeout")]
    pub read_timeout_seconds: u32,
}

// Default value functions
fn default_gemini_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_connect_timeout() -> u32 {
    10
}

fn default_gemini_read_timeout() -> u32 {
    60
}

fn default_kakao_base_url() -> String {
    "https://dapi.kakao.com".to_string()
}

fn default_tmap_base_url() -> String {
    "https://apis.openapi.sk.com/tmap".to_string()
}

fn default_lookup_connect_timeout() -> u32 {
    5
}

fn default_lookup_read_timeout() -> u32 {
    10
}

impl Default for TripCraftConfig {
    fn default() -> Self {
        Self {
            gemini: GeminiConfig {
                api_key: None,
                model: default_gemini_model(),
                base_url: default_gemini_base_url(),
                connect_timeout_seconds: default_gemini_connect_timeout(),
                read_timeout_seconds: default_gemini_read_timeout(),
            },
            kakao: KakaoConfig {
                api_key: None,
                base_url: default_kakao_base_url(),
                connect_timeout_seconds: default_lookup_connect_timeout(),
                read_timeout_seconds: default_lookup_read_timeout(),
            },
            tmap: TmapConfig {
                app_key: None,
                base_url: default_tmap_base_url(),
                connect_timeout_seconds: default_lookup_connect_timeout(),
                read_timeout_seconds: default_lookup_read_timeout(),
            },
        }
    }
}

impl TripCraftConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
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

        // Add environment variable overrides with TRIPCRAFT_ prefix
        builder = builder.add_source(
            Environment::with_prefix("TRIPCRAFT")
                .separator("_")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TripCraftConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripcraft").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.gemini.model.is_empty() {
            self.gemini.model = default_gemini_model();
        }
        if self.gemini.base_url.is_empty() {
            self.gemini.base_url = default_gemini_base_url();
        }
        if self.gemini.connect_timeout_seconds == 0 {
            self.gemini.connect_timeout_seconds = default_gemini_connect_timeout();
        }
        if self.gemini.read_timeout_seconds == 0 {
            self.gemini.read_timeout_seconds = default_gemini_read_timeout();
        }
        if self.kakao.base_url.is_empty() {
            self.kakao.base_url = default_kakao_base_url();
        }
        if self.kakao.connect_timeout_seconds == 0 {
            self.kakao.connect_timeout_seconds = default_lookup_connect_timeout();
        }
        if self.kakao.read_timeout_seconds == 0 {
            self.kakao.read_timeout_seconds = default_lookup_read_timeout();
        }
        if self.tmap.base_url.is_empty() {
            self.tmap.base_url = default_tmap_base_url();
        }
        if self.tmap.connect_timeout_seconds == 0 {
            self.tmap.connect_timeout_seconds = default_lookup_connect_timeout();
        }
        if self.tmap.read_timeout_seconds == 0 {
            self.tmap.read_timeout_seconds = default_lookup_read_timeout();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        for (label, key) in [
            ("Gemini API key", &self.gemini.api_key),
            ("Kakao API key", &self.kakao.api_key),
            ("Tmap app key", &self.tmap.app_key),
        ] {
            if let Some(key) = key {
                if key.is_empty() {
                    return Err(TripCraftError::config(format!(
                        "{label} cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }

                if key.len() < 8 {
                    return Err(TripCraftError::config(format!(
                        "{label} appears to be invalid (too short). Please check your key."
                    ))
                    .into());
                }

                if key.len() > 200 {
                    return Err(TripCraftError::config(format!(
                        "{label} appears to be invalid (too long). Please check your key."
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.gemini.read_timeout_seconds > 300 {
            return Err(
                TripCraftError::config("Generation read timeout cannot exceed 300 seconds").into(),
            );
        }

        for (label, config_connect) in [
            ("Generation", self.gemini.connect_timeout_seconds),
            ("Place search", self.kakao.connect_timeout_seconds),
            ("Routing", self.tmap.connect_timeout_seconds),
        ] {
            if config_connect > 60 {
                return Err(TripCraftError::config(format!(
                    "{label} connect timeout cannot exceed 60 seconds"
                ))
                .into());
            }
        }

        for (label, read) in [
            ("Place search", self.kakao.read_timeout_seconds),
            ("Routing", self.tmap.read_timeout_seconds),
        ] {
            if read > 60 {
                return Err(TripCraftError::config(format!(
                    "{label} read timeout cannot exceed 60 seconds"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        for (label, url) in [
            ("Generation", &self.gemini.base_url),
            ("Place search", &self.kakao.base_url),
            ("Routing", &self.tmap.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TripCraftError::config(format!(
                    "{label} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
