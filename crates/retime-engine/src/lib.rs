//! # retime-engine
//!
//! Rebuilds the unix timestamps of route stops from their human-readable
//! scheduled arrival time.
//!
//! Each stop record carries a "pretty" wall-clock arrival (e.g.
//! `"4/4/2026 23:58:00"`, read in `America/New_York`) and three unix fields.
//! The engine makes the pretty value the source of truth for the arrival and
//! shifts the approach and departure timestamps with it, keeping their
//! original second offsets.
//!
//! ## Modules
//!
//! - [`pretty`] — pretty datetime string → absolute instant
//! - [`record`] — rewrite the unix fields of one record
//! - [`document`] — find the records of a schedule document and convert them
//! - [`paths`] — resolve user file names against a default directory
//! - [`error`] — Error types

pub mod document;
pub mod error;
pub mod paths;
pub mod pretty;
pub mod record;

pub use document::{
    convert_document, ConversionSummary, ConvertOptions, ConvertedDocument, DocumentShape,
    DEFAULT_PRETTY_FIELD,
};
pub use error::RetimeError;
pub use paths::{resolve_path, DEFAULT_DATA_DIR};
pub use pretty::{parse_pretty_datetime, pretty_to_unix, SCHEDULE_TZ};
pub use record::{
    convert_record, Record, RecordOutcome, TimestampTriple, UNIX_ARRIVAL,
    UNIX_ARRIVAL_ARRIVAL, UNIX_ARRIVAL_DEPARTURE, UNIX_FIELDS,
};
