use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("SSH error: {0}")]
    SshError(#[from] ssh2::Error),

    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Archive transfer failed for {key}: {message}")]
    ArchiveError { key: String, message: String },

    #[error("SFTP operation failed: {message}")]
    SftpError { message: String },

    #[error("Transform failed: {message}")]
    TransformError { message: String },

    #[error("Source contract violated: {message}")]
    ContractViolation { message: String },
}

impl EtlError {
    pub fn archive(key: impl ToString, message: impl ToString) -> Self {
        EtlError::ArchiveError {
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    /// True for errors raised while resolving configuration, before any I/O.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EtlError::ConfigError { .. }
                | EtlError::InvalidConfigValueError { .. }
                | EtlError::MissingConfigError { .. }
                | EtlError::ConfigValidationError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
