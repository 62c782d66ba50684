//! Domain error types.
//!
//! Data-availability failures (`NotFound`, `InsufficientHistory`,
//! `MissingPriceData`, `ComputationSkipped`) are recorded per item by the
//! batch operations and never abort them.

/// Top-level error type for forecastlab.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("unknown instrument {ticker}")]
    NotFound { ticker: String },

    #[error("insufficient history for {ticker}: have {points} points, need {minimum}")]
    InsufficientHistory {
        ticker: String,
        points: usize,
        minimum: usize,
    },

    #[error("missing price data for {ticker} on {date}: {reason}")]
    MissingPriceData {
        ticker: String,
        date: chrono::NaiveDate,
        reason: String,
    },

    #[error("skipped {ticker}: {reason}")]
    ComputationSkipped { ticker: String, reason: String },

    #[error("invalid prediction: {reason}")]
    InvalidPrediction { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("import error in {file} line {line}: {reason}")]
    Import {
        file: String,
        line: usize,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ForecastError {
    /// True for failures that resolve themselves as more data arrives.
    pub fn is_data_availability(&self) -> bool {
        matches!(
            self,
            ForecastError::NotFound { .. }
                | ForecastError::InsufficientHistory { .. }
                | ForecastError::MissingPriceData { .. }
                | ForecastError::ComputationSkipped { .. }
        )
    }
}

impl From<&ForecastError> for std::process::ExitCode {
    fn from(err: &ForecastError) -> Self {
        let code: u8 = match err {
            ForecastError::Io(_) => 1,
            ForecastError::ConfigParse { .. }
            | ForecastError::ConfigMissing { .. }
            | ForecastError::ConfigInvalid { .. } => 2,
            ForecastError::Database { .. } | ForecastError::DatabaseQuery { .. } => 3,
            ForecastError::InvalidPrediction { .. } | ForecastError::Import { .. } => 4,
            ForecastError::NotFound { .. }
            | ForecastError::InsufficientHistory { .. }
            | ForecastError::MissingPriceData { .. }
            | ForecastError::ComputationSkipped { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
