use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FusionError {
    #[error("Engine has not been initialized")]
    NotInitialized,
    #[error("Session is already started")]
    AlreadyStarted,
    #[error("Session is not started")]
    NotStarted,
    /// Zero-length vector passed to a normalization. Absorbed internally.
    #[error("Cannot normalize a zero-length vector")]
    DegenerateVector,
    #[error("Accelerometer sensitivity must be positive, got {0}")]
    InvalidSensitivity(i32),
    #[error("Form factor {id} out of range (device has {count})")]
    InvalidFormFactor { id: i32, count: u32 },
}

pub type Result<T> = std::result::Result<T, FusionError>;
