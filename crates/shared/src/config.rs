//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Procurement defaults applied to new documents.
    #[serde(default)]
    pub procurement: ProcurementConfig,
    /// Free-text length ceilings enforced by validation.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied when a purchase order leaves them unset.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcurementConfig {
    /// Currency for new purchase orders.
    #[serde(default)]
    pub default_currency: Currency,
    /// Tax rate in percent (0-100) for new purchase orders.
    #[serde(default = "default_tax_rate")]
    pub default_tax_rate: Decimal,
}

fn default_tax_rate() -> Decimal {
    Decimal::new(60, 1) // 6.0 percent
}

impl Default for ProcurementConfig {
    fn default() -> Self {
        Self {
            default_currency: Currency::default(),
            default_tax_rate: default_tax_rate(),
        }
    }
}

/// Maximum lengths (in characters) for free-text document fields.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LimitsConfig {
    /// Document numbers (PO / GRN).
    #[serde(default = "default_max_number_length")]
    pub max_number_length: usize,
    /// Notes on headers and items.
    #[serde(default = "default_max_notes_length")]
    pub max_notes_length: usize,
    /// Payment / delivery terms.
    #[serde(default = "default_max_terms_length")]
    pub max_terms_length: usize,
    /// External references (supplier quote, delivery order number).
    #[serde(default = "default_max_reference_length")]
    pub max_reference_length: usize,
    /// Delivery metadata (address, shipping method, carrier, vehicle).
    #[serde(default = "default_max_delivery_field_length")]
    pub max_delivery_field_length: usize,
}

fn default_max_number_length() -> usize {
    50
}

fn default_max_notes_length() -> usize {
    2000
}

fn default_max_terms_length() -> usize {
    2000
}

fn default_max_reference_length() -> usize {
    100
}

fn default_max_delivery_field_length() -> usize {
    255
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_number_length: default_max_number_length(),
            max_notes_length: default_max_notes_length(),
            max_terms_length: default_max_terms_length(),
            max_reference_length: default_max_reference_length(),
            max_delivery_field_length: default_max_delivery_field_length(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "stockyard=debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from config files and the environment.
    ///
    /// Sources, later ones overriding earlier ones:
    /// `config/default`, `config/{RUN_MODE}`, then `STOCKYARD__*` variables
    /// (e.g. `STOCKYARD__PROCUREMENT__DEFAULT_TAX_RATE=8`).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("STOCKYARD").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
