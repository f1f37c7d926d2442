use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunAfterError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cron error: {0}")]
    Cron(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<std::io::Error> for RunAfterError {
    fn from(err: std::io::Error) -> Self {
        RunAfterError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for RunAfterError {
    fn from(err: serde_json::Error) -> Self {
        RunAfterError::Storage(err.to_string())
    }
}
