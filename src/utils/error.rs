use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Requested size {requested} is incompatible with roster of {roster_len} students")]
    SizeExceedsRoster { requested: usize, roster_len: usize },

    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Invariant,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// 對外回應的錯誤格式 (4xx / 5xx 對應)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub message: String,
}

impl EngineError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } | Self::SizeExceedsRoster { .. } => ErrorCategory::Input,
            Self::InvariantViolation { .. } => ErrorCategory::Invariant,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::TomlError(_) => ErrorCategory::Configuration,
            Self::InternalError { .. }
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::CsvError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Invariant => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 引擎計算是確定性的，重試只會得到相同結果
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::IoError(_))
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput { .. } => 400,
            Self::SizeExceedsRoster { .. } | Self::InvariantViolation { .. } => 422,
            _ => 500,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::SizeExceedsRoster { .. } => "size_exceeds_roster",
            Self::InvariantViolation { .. } => "invariant_violation",
            _ => "internal_error",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            status: self.status_code(),
            error: self.kind().to_string(),
            message: self.user_friendly_message(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidInput { message } => format!("Invalid request: {}", message),
            Self::SizeExceedsRoster {
                requested,
                roster_len,
            } => format!(
                "Requested size {} does not fit a roster of {} students",
                requested, roster_len
            ),
            Self::InvariantViolation { message } => {
                format!("The change was rejected: {}", message)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            Self::MissingConfigError { field } => {
                format!("Configuration field '{}' is required", field)
            }
            // 5xx 保留底層訊息以便診斷
            other => format!("Unexpected error: {}", other),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "Check the roster and the requested size or count",
            Self::SizeExceedsRoster { .. } => {
                "Use a smaller group size or review count, or add students to the roster"
            }
            Self::InvariantViolation { .. } => {
                "Pick a different student or slot; the current assignment is unchanged"
            }
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::TomlError(_) => "Check the configuration file and command line flags",
            Self::CsvError(_) => "Make sure the roster file has 'id,name' columns",
            Self::IoError(_) => "Check file paths and permissions",
            Self::SerializationError(_) | Self::InternalError { .. } => {
                "Report this error together with the roster and seed used"
            }
        }
    }
}
