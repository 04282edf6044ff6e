use serde::Deserialize;
use std::path::Path;

use crate::simulation::blacklist::BLACKLIST_SPACE;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub compliance: ComplianceConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub producer: ProducerConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

// ============================================================
// Simulation Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    #[serde(default = "default_initial_transactions")]
    pub initial_transactions: u64,
    /// Width of the trailing window transaction timestamps fall into.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default = "default_blacklist_size")]
    pub blacklist_size: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_transactions: 500,
            window_days: 30,
            blacklist_size: 10,
        }
    }
}

fn default_initial_transactions() -> u64 {
    500
}

fn default_window_days() -> u32 {
    30
}

fn default_blacklist_size() -> usize {
    10
}

// ============================================================
// Compliance Config
// ============================================================

/// How the query path picks the blacklist it classifies against.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlacklistMode {
    /// Draw a fresh blacklist on every query.
    #[default]
    PerQuery,
    /// Reuse the blacklist drawn at simulation start.
    Session,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ComplianceConfig {
    #[serde(default = "default_amount_threshold")]
    pub amount_threshold: f64,
    #[serde(default)]
    pub blacklist_mode: BlacklistMode,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            amount_threshold: 5.0,
            blacklist_mode: BlacklistMode::PerQuery,
        }
    }
}

fn default_amount_threshold() -> f64 {
    5.0
}

// ============================================================
// Anomaly Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct AnomalyConfig {
    /// Expected share of outliers in every scored batch.
    #[serde(default = "default_contamination")]
    pub contamination: f64,
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            contamination: 0.05,
            n_trees: 100,
            max_samples: 256,
            seed: 42,
        }
    }
}

fn default_contamination() -> f64 {
    0.05
}

fn default_n_trees() -> usize {
    100
}

fn default_max_samples() -> usize {
    256
}

fn default_seed() -> u64 {
    42
}

// ============================================================
// Producer Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ProducerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_delay_ms: 500,
            max_delay_ms: 1500,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    1500
}

// ============================================================
// API Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_api_host")]
    pub host: String,
    /// Maximum number of rows returned in the transaction table.
    #[serde(default = "default_table_limit")]
    pub table_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8050,
            host: "0.0.0.0".to_string(),
            table_limit: 500,
        }
    }
}

fn default_api_port() -> u16 {
    8050
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_table_limit() -> usize {
    500
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise run on built-in defaults.
    pub fn load_or_default(path: &str) -> eyre::Result<Self> {
        if Path::new(path).exists() {
            return Self::load(path);
        }
        tracing::warn!(path, "Config file not found, using defaults");
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        if self.simulation.window_days == 0 {
            return Err(eyre::eyre!("simulation.window_days must be at least 1"));
        }
        if self.simulation.blacklist_size > BLACKLIST_SPACE.len() {
            return Err(eyre::eyre!(
                "simulation.blacklist_size {} exceeds the {} available account ids",
                self.simulation.blacklist_size,
                BLACKLIST_SPACE.len()
            ));
        }
        let threshold = self.compliance.amount_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(eyre::eyre!(
                "compliance.amount_threshold must be a non-negative number, got {}",
                threshold
            ));
        }
        let contamination = self.anomaly.contamination;
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(eyre::eyre!(
                "anomaly.contamination must be in (0, 0.5], got {}",
                contamination
            ));
        }
        if self.anomaly.n_trees == 0 || self.anomaly.max_samples == 0 {
            return Err(eyre::eyre!(
                "anomaly.n_trees and anomaly.max_samples must be at least 1"
            ));
        }
        if self.producer.min_delay_ms > self.producer.max_delay_ms {
            return Err(eyre::eyre!(
                "producer.min_delay_ms ({}) is greater than producer.max_delay_ms ({})",
                self.producer.min_delay_ms,
                self.producer.max_delay_ms
            ));
        }
        Ok(())
    }
}
