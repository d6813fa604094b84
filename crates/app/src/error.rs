use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{}", .0.user_message())]
    Sync(#[from] client::SyncError),
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid input: {0}")]
    Input(String),
}
