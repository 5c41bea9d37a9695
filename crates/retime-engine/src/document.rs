//! Locating and converting the records of a schedule document.
//!
//! A schedule document takes one of three shapes:
//!
//! - a top-level array of records;
//! - an object with a `stops` (or, failing that, `route`) key holding an
//!   array of records, other keys left alone;
//! - a single record object.
//!
//! Exactly one shape is selected and only its records are rewritten.

use std::fmt;

use serde_json::Value;

use crate::error::{Result, RetimeError};
use crate::record::{convert_record, describe_value, RecordOutcome};

/// Default name of the pretty arrival field.
pub const DEFAULT_PRETTY_FIELD: &str = "Pretty Arrival EDT 2026";

/// Keys searched, in order, for a list of records inside an object.
pub const RECORD_LIST_KEYS: [&str; 2] = ["stops", "route"];

/// Options for [`convert_document`].
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Name of the field holding the pretty arrival datetime.
    pub pretty_field: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            pretty_field: DEFAULT_PRETTY_FIELD.to_string(),
        }
    }
}

/// Which part of the document held the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    List,
    Stops,
    Route,
    Single,
}

impl fmt::Display for DocumentShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentShape::List => write!(f, "top-level list"),
            DocumentShape::Stops => write!(f, "'stops' list"),
            DocumentShape::Route => write!(f, "'route' list"),
            DocumentShape::Single => write!(f, "single record"),
        }
    }
}

/// Tally of record outcomes for one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub preserved: usize,
    pub collapsed: usize,
    pub skipped: usize,
}

impl ConversionSummary {
    fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::OffsetsPreserved => self.preserved += 1,
            RecordOutcome::Collapsed => self.collapsed += 1,
            RecordOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.preserved + self.collapsed + self.skipped
    }
}

/// Result of [`convert_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertedDocument {
    pub shape: DocumentShape,
    pub summary: ConversionSummary,
}

/// Convert every record of `doc` in place.
///
/// Records are converted in document order; the first failure aborts the
/// whole conversion and is returned.
///
/// # Errors
///
/// - [`RetimeError::UnsupportedStructure`] if `doc` is neither an array nor
///   an object.
/// - [`RetimeError::NotARecord`] if an element of the selected list is not
///   an object.
/// - Any error of [`convert_record`].
///
/// # Examples
///
/// ```
/// use retime_engine::document::{convert_document, ConvertOptions, DocumentShape};
/// use serde_json::json;
///
/// let mut doc = json!({
///     "name": "Wolverine",
///     "stops": [{ "Pretty Arrival EDT 2026": "4/5/2026 0:00:00" }],
/// });
/// let converted = convert_document(&mut doc, &ConvertOptions::default()).unwrap();
/// assert_eq!(converted.shape, DocumentShape::Stops);
/// assert_eq!(doc["stops"][0]["Unix Arrival"], json!(1_775_361_600));
/// assert_eq!(doc["name"], json!("Wolverine"));
/// ```
pub fn convert_document(doc: &mut Value, options: &ConvertOptions) -> Result<ConvertedDocument> {
    let pretty_field = options.pretty_field.as_str();

    let (shape, summary) = match doc {
        Value::Array(items) => (DocumentShape::List, convert_list(items, pretty_field)?),
        Value::Object(map) => {
            let list_key = RECORD_LIST_KEYS
                .into_iter()
                .find(|key| matches!(map.get(*key), Some(Value::Array(_))));

            match list_key {
                Some(key) => {
                    let shape = if key == "stops" {
                        DocumentShape::Stops
                    } else {
                        DocumentShape::Route
                    };
                    let items = map
                        .get_mut(key)
                        .and_then(Value::as_array_mut)
                        .map(Vec::as_mut_slice)
                        .unwrap_or_default();
                    (shape, convert_list(items, pretty_field)?)
                }
                None => {
                    let mut summary = ConversionSummary::default();
                    summary.record(convert_record(map, pretty_field)?);
                    (DocumentShape::Single, summary)
                }
            }
        }
        other => {
            return Err(RetimeError::UnsupportedStructure(format!(
                "expected a list or an object, found {}",
                describe_value(other)
            )));
        }
    };

    Ok(ConvertedDocument { shape, summary })
}

fn convert_list(items: &mut [Value], pretty_field: &str) -> Result<ConversionSummary> {
    let mut summary = ConversionSummary::default();
    for (index, item) in items.iter_mut().enumerate() {
        let record = match item {
            Value::Object(record) => record,
            other => {
                return Err(RetimeError::NotARecord {
                    index,
                    found: describe_value(other),
                });
            }
        };
        summary.record(convert_record(record, pretty_field)?);
    }
    Ok(summary)
}
