//! Error types for voltaic-core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("'{name}' ({kind}) already exists, choose a unique name")]
    DuplicateName { name: String, kind: String },

    #[error("element '{0}' not found in the circuit")]
    ElementNotFound(String),

    #[error("node '{0}' not found in the circuit")]
    NodeNotFound(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("time step must be positive for transient analysis")]
    BadTimeStep,
}

impl Error {
    /// Shorthand for the duplicate-name case.
    pub fn duplicate(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Error::DuplicateName {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
