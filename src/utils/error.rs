use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Missing required data file(s): {}", files.join(", "))]
    MissingDataFile { files: Vec<String> },

    #[error("{file} line {line}: {message}")]
    DataFormatError {
        file: String,
        line: usize,
        message: String,
    },

    #[error("{file}: {message}")]
    DataSchemaError { file: String, message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported box size {0}; expected 2 to 6")]
    UnsupportedBoxSize(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Configuration,
    Request,
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PlannerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PlannerError::IoError(_) => ErrorCategory::Io,
            PlannerError::CsvError(_)
            | PlannerError::SerializationError(_)
            | PlannerError::MissingDataFile { .. }
            | PlannerError::DataFormatError { .. }
            | PlannerError::DataSchemaError { .. } => ErrorCategory::Data,
            PlannerError::ConfigValidationError { .. }
            | PlannerError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            PlannerError::UnsupportedBoxSize(_) => ErrorCategory::Request,
            PlannerError::ZipError(_) => ErrorCategory::Export,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PlannerError::UnsupportedBoxSize(_) => ErrorSeverity::Medium,
            PlannerError::ConfigValidationError { .. }
            | PlannerError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            PlannerError::CsvError(_)
            | PlannerError::SerializationError(_)
            | PlannerError::DataFormatError { .. }
            | PlannerError::DataSchemaError { .. }
            | PlannerError::ZipError(_) => ErrorSeverity::High,
            PlannerError::IoError(_) | PlannerError::MissingDataFile { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PlannerError::IoError(_) => "Check that the path exists and is readable/writable",
            PlannerError::MissingDataFile { .. } => {
                "Point --data-dir at a folder containing class_ratings.csv, synergies_and_defaults.csv and rulesets.json"
            }
            PlannerError::CsvError(_) | PlannerError::DataFormatError { .. } => {
                "Fix the reported row in the CSV file and re-run"
            }
            PlannerError::SerializationError(_) | PlannerError::DataSchemaError { .. } => {
                "Check the JSON/CSV structure against the expected columns and fields"
            }
            PlannerError::ConfigValidationError { .. }
            | PlannerError::InvalidConfigValueError { .. } => {
                "Review planner.toml and command-line overrides"
            }
            PlannerError::UnsupportedBoxSize(_) => "Choose a box size between 2 and 6",
            PlannerError::ZipError(_) => "Check free disk space and the export output path",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("File access failed: {}", self),
            ErrorCategory::Data => format!("Planner data is invalid: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Request => format!("Invalid request: {}", self),
            ErrorCategory::Export => format!("Export failed: {}", self),
        }
    }

    pub(crate) fn data_format(file: &str, line: usize, message: impl Into<String>) -> Self {
        PlannerError::DataFormatError {
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn data_schema(file: &str, message: impl Into<String>) -> Self {
        PlannerError::DataSchemaError {
            file: file.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
