use thiserror::Error;

#[derive(Error, Debug)]
pub enum CensusError {
    #[error("Failed to list services in cluster '{cluster}': {message}")]
    ServiceEnumerationError { cluster: String, message: String },

    #[error("{operation} failed: {message}")]
    ApiError { operation: String, message: String },

    #[error("{operation} timed out after {seconds}s")]
    TimeoutError { operation: String, seconds: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Remote,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Absorbed by a stage; the census carries on with partial data.
    Degradable,
    /// Aborts the run before any report is printed.
    Fatal,
}

impl CensusError {
    pub fn api(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::ApiError {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::ServiceEnumerationError { .. } | Self::ApiError { .. } | Self::TimeoutError { .. } => {
                ErrorCategory::Remote
            }
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Output,
        }
    }

    /// Per-item API failures and deadlines are skipped by the stage that saw
    /// them. Everything else ends the run.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ApiError { .. } | Self::TimeoutError { .. } => ErrorSeverity::Degradable,
            _ => ErrorSeverity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Remote => 2,
            ErrorCategory::Output => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ServiceEnumerationError { cluster, .. } => {
                format!("Could not enumerate services of cluster '{}'", cluster)
            }
            Self::MissingConfigError { field } => format!("--{} is required", field.replace('_', "-")),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid --{}: {}", field.replace('_', "-"), reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the command-line flags and AWS region/credentials",
            ErrorCategory::Remote => {
                "Verify the cluster name, region and that the credentials allow ecs:List*/ecs:Describe*"
            }
            ErrorCategory::Output => "Check that stdout is writable",
        }
    }
}

pub type Result<T> = std::result::Result<T, CensusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_item_errors_are_degradable() {
        assert!(!CensusError::api("ListTasks", "throttled").is_fatal());
        let timeout = CensusError::TimeoutError {
            operation: "DescribeTasks".to_string(),
            seconds: 30,
        };
        assert_eq!(timeout.severity(), ErrorSeverity::Degradable);
    }

    #[test]
    fn test_enumeration_and_config_errors_are_fatal() {
        let enumeration = CensusError::ServiceEnumerationError {
            cluster: "prod".to_string(),
            message: "AccessDenied".to_string(),
        };
        assert!(enumeration.is_fatal());
        assert_eq!(enumeration.exit_code(), 2);

        let missing = CensusError::MissingConfigError {
            field: "cluster".to_string(),
        };
        assert!(missing.is_fatal());
        assert_eq!(missing.exit_code(), 1);
        assert_eq!(missing.user_friendly_message(), "--cluster is required");
    }
}
