//! Error types for pulse-forecast

use thiserror::Error;

use crate::types::Pillar;

/// Error type for forecasting operations
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected before any computation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Too few distinct observed years to fit a trend for an indicator
    #[error("Insufficient data for {indicator}: {distinct_years} distinct observed year(s), need at least 2")]
    InsufficientData {
        indicator: Pillar,
        distinct_years: usize,
    },

    /// An input record violates a data invariant
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// JSON serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Delimited export could not be written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML configuration could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for forecasting operations
pub type Result<T> = std::result::Result<T, Error>;
