use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid parameter '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("{0}")]
    Timeout(String),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact server is not listening")]
    ServerUnavailable,

    #[error("Page driver error: {0}")]
    Driver(#[source] anyhow::Error),

    /// A handler failed; the message is the cause's message.
    #[error("{source}")]
    Execution {
        tool: String,
        #[source]
        source: Box<ToolError>,
    },
}

impl ToolError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The innermost error, looking through `Execution` wrappers.
    pub fn cause(&self) -> &ToolError {
        match self {
            Self::Execution { source, .. } => source.cause(),
            other => other,
        }
    }
}
