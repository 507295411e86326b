#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("corrupt schedule data: {0}")]
    Corrupt(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl AppError {
    /// True when the underlying failure is a uniqueness violation, i.e. a
    /// write tried to claim an already-confirmed slot.
    pub fn is_conflict(&self) -> bool {
        match self {
            AppError::Storage(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}
