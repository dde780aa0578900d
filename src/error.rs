// src/error.rs
use thiserror::Error;

/// Construction-time failures.
///
/// Runtime control input never reaches this type: malformed parameters
/// are clamped or ignored, invariant-threatening requests silently keep
/// the previous state, and a full history evicts rather than fails.
#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("invalid screen dimensions: {lines}x{columns} (both must be nonzero)")]
    InvalidDimensions { lines: usize, columns: usize },
}

pub type ScreenResult<T> = Result<T, ScreenError>;
