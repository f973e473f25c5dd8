use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("entrada cerrada")]
    InputClosed,

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
