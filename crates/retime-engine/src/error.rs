//! Error types for retime-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetimeError {
    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid pretty value in field '{field}': expected a string, found {found}")]
    InvalidPrettyValue { field: String, found: String },

    #[error("Record {index} is not an object: found {found}")]
    NotARecord { index: usize, found: String },

    #[error("Unsupported JSON structure: {0}")]
    UnsupportedStructure(String),
}

pub type Result<T> = std::result::Result<T, RetimeError>;
