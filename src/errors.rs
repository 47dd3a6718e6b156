// /src/errors.rs
//! Error type shared by the reconciler, the replay helpers and the Python boundary
#[cfg(feature = "python")]
use pyo3::{exceptions::PyValueError, PyErr};
use std::fmt;
use thiserror::Error;

/// Which input sequence an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReconcilerError {
    #[error("Duplicate key {key} in {side} sequence at position {position}")]
    DuplicateKey {
        side: Side,
        key: String,
        position: usize,
    },

    #[error("{action} at position {position} is out of range for a list of length {len}")]
    IndexOutOfRange {
        action: String,
        position: usize,
        len: usize,
    },

    #[error("Invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("Key extraction failed: {details}")]
    KeyError { details: String },

    #[error("Type conversion error: expected {expected}, got {actual}")]
    TypeConversionError { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Python call failed: {0}")]
    PythonError(String),
}

#[cfg(feature = "python")]
impl From<ReconcilerError> for PyErr {
    fn from(err: ReconcilerError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<PyErr> for ReconcilerError {
    fn from(err: PyErr) -> Self {
        ReconcilerError::PythonError(err.to_string())
    }
}
