//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Automatic approval configuration.
    #[serde(default)]
    pub automation: AutomationConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply pending migrations when the daemon starts.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    /// Creates a database configuration with default pool settings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            run_migrations: true,
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Account number of the system funding account.
    #[serde(default = "default_funding_account_number")]
    pub funding_account_number: String,
    /// Account number of the system payout account.
    #[serde(default = "default_payout_account_number")]
    pub payout_account_number: String,
    /// Currency code of the system accounts.
    #[serde(default = "default_system_currency")]
    pub system_currency: String,
    /// Entry types that admin or system initiators may post against frozen accounts.
    #[serde(default = "default_frozen_bypass_entry_types")]
    pub frozen_bypass_entry_types: Vec<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            funding_account_number: default_funding_account_number(),
            payout_account_number: default_payout_account_number(),
            system_currency: default_system_currency(),
            frozen_bypass_entry_types: default_frozen_bypass_entry_types(),
        }
    }
}

fn default_funding_account_number() -> String {
    "SYS-0001".to_string()
}

fn default_payout_account_number() -> String {
    "SYS-0002".to_string()
}

fn default_system_currency() -> String {
    "GHS".to_string()
}

fn default_frozen_bypass_entry_types() -> Vec<String> {
    vec![
        "TRANSFER".to_string(),
        "ADJUSTMENT".to_string(),
        "REVERSAL".to_string(),
    ]
}

/// Automatic approval configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AutomationConfig {
    /// Schedule plain deposits for automatic approval.
    #[serde(default = "default_true")]
    pub auto_approve_deposits: bool,
    /// Delay before a deposit is approved automatically, in seconds.
    #[serde(default = "default_review_delay_secs")]
    pub review_delay_secs: u64,
    /// Interval of the pending deposit sweep, in seconds. Zero disables the sweep.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            auto_approve_deposits: true,
            review_delay_secs: default_review_delay_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_review_delay_secs() -> u64 {
    5
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "snel=info".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `SNEL__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("SNEL")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("ledger.frozen_bypass_entry_types"),
            )
            .build()?;

        config.try_deserialize()
    }
}
