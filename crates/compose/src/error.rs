use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Invalid project: {0}")]
    InvalidProject(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComposeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ComposeError::Cancelled)
    }
}

impl From<serde_json::Error> for ComposeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ComposeError>;
