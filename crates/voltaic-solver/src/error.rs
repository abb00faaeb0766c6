//! Error types for voltaic-solver.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("matrix is singular or ill-conditioned")]
    Singular,

    #[error("invalid matrix dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("analysis failed at t = {time:.6e} s: {source}")]
    StepFailed {
        time: f64,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Core(#[from] voltaic_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
