use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModRegError {
    #[error("module not found: {0}")]
    NotFound(String),

    #[error("module already exists: {0}")]
    AlreadyExists(String),

    #[error("failed to list modules: {0}")]
    ListFailed(String),

    #[error("failed to upload module: {0}")]
    UploadFailed(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("operation timed out: {0}")]
    Timeout(String),
}

impl ModRegError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModRegError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, ModRegError::AlreadyExists(_))
    }
}

pub type Result<T> = std::result::Result<T, ModRegError>;
