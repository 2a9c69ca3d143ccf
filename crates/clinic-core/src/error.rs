use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid window: lower bound {lower} is after upper bound {upper}")]
    InvalidWindow {
        lower: NaiveDateTime,
        upper: NaiveDateTime,
    },
}
