use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaseTrackerError {
    #[error("Data source unavailable during {operation}: {details}")]
    DataSourceUnavailable { operation: String, details: String },

    #[error("Validation failed for '{field}': {details}")]
    ValidationError { field: String, details: String },

    #[error("No record found where {field} = '{value}'")]
    RecordNotFound { field: String, value: String },

    #[error("Invalid birth date: {0}")]
    InvalidBirthDate(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "gsheets")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Coarse grouping used by the UI to pick how an error is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Blocking: the remote sheet could not be read or written.
    DataSourceUnavailable,
    /// Inline: the submitted form was rejected before any write.
    Validation,
    /// Inline: the selected record is no longer in the sheet.
    NotFound,
    Internal,
}

impl CaseTrackerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DataSourceUnavailable { .. } => ErrorCategory::DataSourceUnavailable,
            Self::ValidationError { .. } | Self::InvalidBirthDate(_) => ErrorCategory::Validation,
            Self::RecordNotFound { .. } => ErrorCategory::NotFound,
            _ => ErrorCategory::Internal,
        }
    }

    pub fn is_data_source_unavailable(&self) -> bool {
        self.category() == ErrorCategory::DataSourceUnavailable
    }

    pub(crate) fn unavailable(operation: &str, details: impl ToString) -> Self {
        Self::DataSourceUnavailable {
            operation: operation.to_string(),
            details: details.to_string(),
        }
    }

    pub(crate) fn validation(field: &str, details: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.to_string(),
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CaseTrackerError>;
