use thiserror::Error;

/// Errors raised by the telemetry pipeline and its parsers.
#[derive(Error, Debug)]
pub enum MachineViewError {
    /// The backend payload is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend payload is valid JSON but not in the expected shape
    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    /// A timestamp string could not be parsed
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// A metric name is empty, reserved or contains control characters
    #[error("Invalid metric name '{name}': {reason}")]
    InvalidMetricName { name: String, reason: String },

    /// Weekday indices go from 0 (Sunday) to 6 (Saturday)
    #[error("Invalid weekday index {0}, expected 0 (Sunday) to 6 (Saturday)")]
    InvalidWeekday(u8),

    /// Labels and values of a series must be index-aligned
    #[error("Series '{name}' has {labels} labels but {values} values")]
    SeriesLengthMismatch {
        name: String,
        labels: usize,
        values: usize,
    },

    /// A color string is not in the `#rrggbb` form
    #[error("Invalid hex color '{0}'")]
    InvalidColor(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Calendar arithmetic went out of the supported date range
    #[error("Date out of range: {0}")]
    DateOutOfRange(String),
}

impl MachineViewError {
    pub fn invalid_payload(message: &str) -> Self {
        MachineViewError::InvalidPayload {
            message: message.to_string(),
        }
    }

    pub fn invalid_timestamp(value: &str, reason: impl ToString) -> Self {
        MachineViewError::InvalidTimestamp {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_metric_name(name: &str, reason: &str) -> Self {
        MachineViewError::InvalidMetricName {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<time::error::ComponentRange> for MachineViewError {
    fn from(err: time::error::ComponentRange) -> Self {
        MachineViewError::DateOutOfRange(err.to_string())
    }
}

pub type Result<T, E = MachineViewError> = std::result::Result<T, E>;
