use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Rejection of a caller-supplied subject identifier.
///
/// This is the only condition under which opening a presence session
/// fails synchronously.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubjectIdError {
    #[error("subject id is empty")]
    Empty,

    #[error("invalid subject id '{0}': expected 17-20 digits")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LanyardError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Subject(#[from] SubjectIdError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(String),
}
