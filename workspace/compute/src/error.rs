use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A referenced row does not exist
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// Semester identifier that is not a positive number
    #[error("Invalid semester '{0}'")]
    InvalidSemester(String),

    /// Input that violates a business rule
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation not allowed in the current state of the record
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl ComputeError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        ComputeError::NotFound { entity, id }
    }
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
