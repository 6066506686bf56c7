//! Convenience result type alias for ExtCore.

use crate::error::AppError;

/// A specialized `Result` type for ExtCore operations.
pub type AppResult<T> = Result<T, AppError>;
