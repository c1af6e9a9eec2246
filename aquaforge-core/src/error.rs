use aquaforge_schemas::reading::Parameter;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AquaforgeError {
    #[error("Range for '{parameter}' is inconsistent: expected min {min} <= target {target} <= max {max}")]
    InvalidRange {
        parameter: Parameter,
        min: f64,
        target: f64,
        max: f64,
    },

    #[error("Uniform range for '{parameter}' is invalid: [{low}, {high}]")]
    InvalidUniformRange {
        parameter: Parameter,
        low: f64,
        high: f64,
    },

    #[error("Noise level must be a finite, non-negative number (got {0})")]
    InvalidNoiseLevel(f64),

    #[error("History capacity must be at least 1")]
    InvalidCapacity,

    #[error("At least one baseline value must be provided for the simulation")]
    NoBaselinesProvided,

    #[error("Batch profile needs at least one filter state to choose from")]
    NoFilterStates,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("CSV file '{path}' is missing required column '{column}'")]
    MissingColumn { path: String, column: String },

    #[error("Invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
