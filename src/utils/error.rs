use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Schema mismatch between sources: company A columns [{company_a}] vs company B columns [{company_b}]")]
    SchemaMismatchError { company_a: String, company_b: String },
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    DataSource,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) | EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                ErrorCategory::DataSource
            }
            EtlError::ProcessingError { .. } | EtlError::SchemaMismatchError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Critical,
            ErrorCategory::DataSource | ErrorCategory::Processing => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::CsvError(_) => {
                "Check that the CSV file has a header row and consistent column counts".to_string()
            }
            EtlError::IoError(_) => {
                "Check that the input files exist and the output directory is writable".to_string()
            }
            EtlError::SerializationError(_) => {
                "Check that the JSON feed contains an array of objects or one object per line"
                    .to_string()
            }
            EtlError::ConfigValidationError { field, .. }
            | EtlError::InvalidConfigValueError { field, .. }
            | EtlError::MissingConfigError { field } => {
                format!("Fix the '{}' setting and run again", field)
            }
            EtlError::ProcessingError { .. } => {
                "Inspect the offending record in the source feed".to_string()
            }
            EtlError::SchemaMismatchError { .. } => {
                "Align the field mappings so both sources produce the same columns".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::CsvError(_) => "Company B's CSV feed could not be parsed".to_string(),
            EtlError::IoError(e) => format!("A file could not be read or written: {}", e),
            EtlError::SerializationError(_) => {
                "Company A's JSON feed could not be parsed".to_string()
            }
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                format!("The pipeline configuration is invalid: {}", self)
            }
            EtlError::ProcessingError { message } => {
                format!("A record could not be processed: {}", message)
            }
            EtlError::SchemaMismatchError { .. } => {
                "The two sources no longer share the same output schema".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_critical() {
        let err = EtlError::MissingConfigError {
            field: "load.output_path".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_schema_mismatch_message_names_both_sources() {
        let err = EtlError::SchemaMismatchError {
            company_a: "amount, company".to_string(),
            company_b: "company".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("amount, company"));
        assert!(message.contains("Schema mismatch"));
        assert_eq!(err.severity(), ErrorSeverity::High);
    }
}
