use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JellysubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Media server responded with {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Subtitle format error: {0}")]
    Format(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, JellysubError>;

/// Coarse classification used when logging a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Format,
    Backend,
    Config,
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Format => "format",
            ErrorKind::Backend => "backend",
            ErrorKind::Config => "config",
            ErrorKind::Unexpected => "unexpected",
        };
        f.write_str(name)
    }
}

impl JellysubError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JellysubError::Http(_) | JellysubError::Network(_) | JellysubError::Server { .. } => {
                ErrorKind::Network
            }
            JellysubError::Format(_) | JellysubError::UnsupportedFormat(_) => ErrorKind::Format,
            JellysubError::Translation(_) => ErrorKind::Backend,
            JellysubError::Config(_) | JellysubError::Toml(_) => ErrorKind::Config,
            JellysubError::Io(_) | JellysubError::Json(_) => ErrorKind::Unexpected,
        }
    }
}

/// Pipeline stage a job was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    FetchSubtitle,
    Extract,
    Translate,
    Reinject,
    Upload,
    Save,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::FetchSubtitle => "fetch",
            JobStage::Extract => "extract",
            JobStage::Translate => "translate",
            JobStage::Reinject => "reinject",
            JobStage::Upload => "upload",
            JobStage::Save => "save",
        };
        f.write_str(name)
    }
}

/// Tagged failure of a single translation job.
#[derive(Error, Debug)]
#[error("{stage} stage failed ({kind}): {message}")]
pub struct JobFailure {
    pub stage: JobStage,
    pub kind: ErrorKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(stage: JobStage, error: JellysubError) -> Self {
        Self {
            stage,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
