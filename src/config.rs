//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The API token is referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`. Every scan knob has a
//! default matching the marketplace scan policy, so a minimal config
//! only needs the `[catalog]` section.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::str::FromStr;

use crate::engine::scanner::ScanConfig;
use crate::types::{Condition, FlipscanError};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Catalog service boundary settings.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Name of the env var holding the full `Authorization` header value.
    pub auth_token_env: String,
    #[serde(default = "default_game_id")]
    pub game_id: u64,
    /// Category for single-card listings (sealed product and accessories
    /// live in other categories).
    #[serde(default = "default_category_id")]
    pub category_id: u64,
    /// Set codes skipped entirely (collector / oversized sets).
    #[serde(default = "default_excluded_codes")]
    pub excluded_expansion_codes: Vec<String>,
}

/// Deal-scan policy knobs.
#[derive(Debug, Deserialize, Clone)]
pub struct ScanSettings {
    /// Candidate price must stay below next-competitor price × this.
    #[serde(default = "default_max_quotient")]
    pub max_quotient: Decimal,
    /// Lower price sanity bound in minor units (excludes placeholder
    /// listings), exclusive.
    #[serde(default = "default_min_cents")]
    pub min_cents: u64,
    /// Upper price sanity bound in minor units, exclusive.
    #[serde(default = "default_max_cents")]
    pub max_cents: u64,
    /// How many of the cheapest listings per card may seed a deal.
    #[serde(default = "default_max_cards")]
    pub max_cards: usize,
    /// Marketplace condition label of the worst acceptable condition.
    #[serde(default = "default_min_condition")]
    pub min_condition: String,
}

/// Batch fan-out settings.
#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    /// Expansions scanned concurrently per window.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

fn default_game_id() -> u64 {
    1
}

fn default_category_id() -> u64 {
    1
}

fn default_excluded_codes() -> Vec<String> {
    vec!["cei".to_string(), "ced".to_string()]
}

fn default_max_quotient() -> Decimal {
    dec!(0.6)
}

fn default_min_cents() -> u64 {
    50
}

fn default_max_cents() -> u64 {
    10_000
}

fn default_max_cards() -> usize {
    1
}

fn default_min_condition() -> String {
    "Slightly Played".to_string()
}

fn default_window_size() -> usize {
    50
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_quotient: default_max_quotient(),
            min_cents: default_min_cents(),
            max_cents: default_max_cents(),
            max_cards: default_max_cards(),
            min_condition: default_min_condition(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

impl ScanSettings {
    /// Convert into the scanner's config, parsing the condition label.
    /// A bad label surfaces at startup rather than mid-scan.
    pub fn scan_config(&self) -> Result<ScanConfig, FlipscanError> {
        Ok(ScanConfig {
            max_quotient: self.max_quotient,
            min_cents: self.min_cents,
            max_cents: self.max_cents,
            max_cards: self.max_cards,
            min_condition: Condition::from_str(&self.min_condition)?,
        })
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading the API token referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
