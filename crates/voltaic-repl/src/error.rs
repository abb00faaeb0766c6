//! Error type for the command shell.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error(transparent)]
    Core(#[from] voltaic::CoreError),

    #[error(transparent)]
    Solver(#[from] voltaic::SolverError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
