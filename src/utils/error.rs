use std::fmt;
use thiserror::Error;

/// 建置流程中的步驟，用於標記失敗發生在哪一步
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Workdir,
    InstallDependencies,
    MaterializeSource,
    DeclarePort,
    WriteImage,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStep::Workdir => "workdir",
            BuildStep::InstallDependencies => "install-dependencies",
            BuildStep::MaterializeSource => "materialize-source",
            BuildStep::DeclarePort => "declare-port",
            BuildStep::WriteImage => "write-image",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Token error: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Manifest error at line {line}: {message}")]
    ManifestError { line: usize, message: String },

    #[error("Failed to install '{package}': {message}")]
    InstallError { package: String, message: String },

    #[error("Failed to copy '{path}': {message}")]
    MaterializeError { path: String, message: String },

    #[error("Build failed during {step}: {source}")]
    BuildFailed {
        step: BuildStep,
        #[source]
        source: Box<JournalError>,
    },

    #[error("Launch failed: {message}")]
    LaunchError { message: String },

    #[error("Entry point not found: {path}")]
    EntryPointMissing { path: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{message}")]
    AuthError { message: String },

    #[error("{message}")]
    ConflictError { message: String },
}

pub type Result<T> = std::result::Result<T, JournalError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Build,
    Runtime,
    Request,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl JournalError {
    /// 將建置步驟附加到錯誤上，已標記過的錯誤不會重複包裝
    pub fn at_step(self, step: BuildStep) -> Self {
        match self {
            JournalError::BuildFailed { .. } => self,
            other => JournalError::BuildFailed {
                step,
                source: Box::new(other),
            },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            JournalError::ConfigError { .. }
            | JournalError::ConfigValidationError { .. }
            | JournalError::InvalidConfigValueError { .. }
            | JournalError::MissingConfigError { .. } => ErrorCategory::Configuration,
            JournalError::ManifestError { .. }
            | JournalError::InstallError { .. }
            | JournalError::MaterializeError { .. }
            | JournalError::BuildFailed { .. } => ErrorCategory::Build,
            JournalError::LaunchError { .. }
            | JournalError::EntryPointMissing { .. }
            | JournalError::IoError(_)
            | JournalError::DatabaseError(_)
            | JournalError::SerializationError(_) => ErrorCategory::Runtime,
            JournalError::ValidationError { .. }
            | JournalError::AuthError { .. }
            | JournalError::ConflictError { .. }
            | JournalError::TokenError(_) => ErrorCategory::Request,
            JournalError::ApiError(_) => ErrorCategory::External,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Request => ErrorSeverity::Low,
            ErrorCategory::External => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Build => ErrorSeverity::High,
            ErrorCategory::Runtime => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            JournalError::ManifestError { .. } => {
                "Check the dependency manifest: one specifier per line, e.g. `name==1.2.3`".to_string()
            }
            JournalError::InstallError { package, .. } => {
                format!("Make sure '{}' exists in the configured installer source", package)
            }
            JournalError::MaterializeError { .. } => {
                "Check that the source tree is readable and the image directory is writable".to_string()
            }
            JournalError::BuildFailed { source, .. } => source.recovery_suggestion(),
            JournalError::EntryPointMissing { .. } => {
                "Add the entry module to the application tree or fix APP_MODULE".to_string()
            }
            JournalError::LaunchError { .. } => {
                "Run `bootstrap build` first and check that the launch command exists".to_string()
            }
            JournalError::ConfigError { .. }
            | JournalError::ConfigValidationError { .. }
            | JournalError::InvalidConfigValueError { .. }
            | JournalError::MissingConfigError { .. } => {
                "Review the configuration file and the environment variables it references".to_string()
            }
            JournalError::DatabaseError(_) => "Check the database URL and that the database is reachable".to_string(),
            JournalError::ApiError(_) => "Check network connectivity and the advisor endpoint".to_string(),
            JournalError::IoError(_) => "Check file permissions and paths".to_string(),
            _ => "No automatic recovery is available".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            JournalError::BuildFailed { step, source } => {
                format!("Image build aborted at step '{}': {}", step, source)
            }
            JournalError::EntryPointMissing { path } => {
                format!("The application entry point '{}' does not exist", path)
            }
            other => other.to_string(),
        }
    }

    /// 依嚴重程度決定程序的退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}
