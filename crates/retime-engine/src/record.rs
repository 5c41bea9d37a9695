//! Rewriting of a single stop record.
//!
//! A record is a JSON object that carries a pretty arrival time and up to
//! three unix timestamps:
//!
//! | field                    | meaning                         |
//! |--------------------------|---------------------------------|
//! | `Unix Arrival Arrival`   | approach time (AA)              |
//! | `Unix Arrival`           | scheduled arrival (A)           |
//! | `Unix Arrival Departure` | departure from the stop (AD)    |
//!
//! [`convert_record`] makes the pretty time the source of truth for `A` and
//! shifts `AA` and `AD` along with it, keeping their second offsets from `A`.
//! When the old offsets cannot be read, all three fields collapse to the new
//! arrival.

use serde_json::{Map, Value};

use crate::error::{Result, RetimeError};
use crate::pretty::pretty_to_unix;

pub const UNIX_ARRIVAL_ARRIVAL: &str = "Unix Arrival Arrival";
pub const UNIX_ARRIVAL: &str = "Unix Arrival";
pub const UNIX_ARRIVAL_DEPARTURE: &str = "Unix Arrival Departure";

/// The three unix fields, in AA, A, AD order.
pub const UNIX_FIELDS: [&str; 3] = [UNIX_ARRIVAL_ARRIVAL, UNIX_ARRIVAL, UNIX_ARRIVAL_DEPARTURE];

/// A JSON object standing for one stop.
pub type Record = Map<String, Value>;

// ── timestamps and offsets ──────────────────────────────────────────────────

/// The three unix timestamps of a record, all present and numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampTriple {
    pub arrival_arrival: i64,
    pub arrival: i64,
    pub arrival_departure: i64,
}

/// Second differences around the arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offsets {
    /// `A - AA`
    pub before: i64,
    /// `AD - A`
    pub after: i64,
}

/// Why the old offsets of a record cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffsetsUnavailable {
    /// The field is absent or `null`.
    Missing(&'static str),
    /// The field holds a value that does not coerce to an integer.
    NotNumeric { field: &'static str, found: String },
    /// The offsets, or the shifted timestamps, do not fit in an `i64`.
    Overflow,
}

impl TimestampTriple {
    /// Read and coerce the three unix fields of `record`.
    ///
    /// Fails on the first field (in AA, A, AD order) that is missing or does
    /// not coerce; see [`coerce_timestamp`] for what counts as numeric.
    pub fn from_record(record: &Record) -> std::result::Result<Self, OffsetsUnavailable> {
        let read = |field: &'static str| match record.get(field) {
            None | Some(Value::Null) => Err(OffsetsUnavailable::Missing(field)),
            Some(value) => coerce_timestamp(value).ok_or_else(|| OffsetsUnavailable::NotNumeric {
                field,
                found: describe_value(value),
            }),
        };

        Ok(Self {
            arrival_arrival: read(UNIX_ARRIVAL_ARRIVAL)?,
            arrival: read(UNIX_ARRIVAL)?,
            arrival_departure: read(UNIX_ARRIVAL_DEPARTURE)?,
        })
    }

    /// All three fields set to the same instant.
    pub fn collapsed(at: i64) -> Self {
        Self {
            arrival_arrival: at,
            arrival: at,
            arrival_departure: at,
        }
    }

    pub fn offsets(&self) -> std::result::Result<Offsets, OffsetsUnavailable> {
        let before = self
            .arrival
            .checked_sub(self.arrival_arrival)
            .ok_or(OffsetsUnavailable::Overflow)?;
        let after = self
            .arrival_departure
            .checked_sub(self.arrival)
            .ok_or(OffsetsUnavailable::Overflow)?;
        Ok(Offsets { before, after })
    }

    /// Move the arrival to `new_arrival`, keeping this triple's offsets.
    pub fn shifted_to(&self, new_arrival: i64) -> std::result::Result<Self, OffsetsUnavailable> {
        let offsets = self.offsets()?;
        Ok(Self {
            arrival_arrival: new_arrival
                .checked_sub(offsets.before)
                .ok_or(OffsetsUnavailable::Overflow)?,
            arrival: new_arrival,
            arrival_departure: new_arrival
                .checked_add(offsets.after)
                .ok_or(OffsetsUnavailable::Overflow)?,
        })
    }

    fn write_to(&self, record: &mut Record) {
        record.insert(UNIX_ARRIVAL_ARRIVAL.to_string(), self.arrival_arrival.into());
        record.insert(UNIX_ARRIVAL.to_string(), self.arrival.into());
        record.insert(UNIX_ARRIVAL_DEPARTURE.to_string(), self.arrival_departure.into());
    }
}

/// Coerce a JSON value to an integer timestamp.
///
/// Accepts integers that fit in `i64`, finite floats (truncated toward
/// zero), booleans (`1`/`0`) and strings holding an optionally signed
/// base-10 integer, surrounding whitespace allowed.
pub fn coerce_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            let f = n.as_f64()?.trunc();
            // i64::MAX is not representable as f64; the exclusive bound is 2^63.
            (f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
        }
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// ── convert_record ──────────────────────────────────────────────────────────

/// What [`convert_record`] did to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// No pretty value; the record is untouched.
    Skipped,
    /// The arrival moved and AA/AD kept their offsets.
    OffsetsPreserved,
    /// Offsets were unavailable; AA, A and AD all equal the new arrival.
    Collapsed,
}

/// Recompute the unix fields of `record` from its pretty field.
///
/// 1. If `pretty_field` is absent or falsy (`null`, `false`, `0`, `""`, `[]`,
///    `{}`) the record is left as is.
/// 2. The pretty string is parsed into the new arrival.
/// 3. If AA, A and AD all coerce to integers, A becomes the new arrival and
///    AA/AD are shifted by the same amount.
/// 4. Otherwise all three are set to the new arrival.
///
/// # Errors
///
/// Returns [`RetimeError::InvalidDatetime`] when the pretty string is
/// malformed, or [`RetimeError::InvalidPrettyValue`] when the pretty field is
/// truthy but not a string. The record is unchanged on error.
pub fn convert_record(record: &mut Record, pretty_field: &str) -> Result<RecordOutcome> {
    let pretty = match record.get(pretty_field) {
        None => return Ok(RecordOutcome::Skipped),
        Some(value) if is_falsy(value) => return Ok(RecordOutcome::Skipped),
        Some(Value::String(s)) => s.as_str(),
        Some(other) => {
            return Err(RetimeError::InvalidPrettyValue {
                field: pretty_field.to_string(),
                found: describe_value(other),
            });
        }
    };

    let new_arrival = pretty_to_unix(pretty)?;

    let (triple, outcome) = match TimestampTriple::from_record(record)
        .and_then(|old| old.shifted_to(new_arrival))
    {
        Ok(shifted) => (shifted, RecordOutcome::OffsetsPreserved),
        Err(_) => (TimestampTriple::collapsed(new_arrival), RecordOutcome::Collapsed),
    };

    triple.write_to(record);
    Ok(outcome)
}

/// JSON truthiness: `null`, `false`, zero, and empty strings/arrays/objects.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Short human description of a JSON value for error messages.
pub(crate) fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(a) => format!("array of {} elements", a.len()),
        Value::Object(o) => format!("object with {} keys", o.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const PRETTY: &str = "Pretty Arrival EDT 2026";

    // 4/4/2026 23:58:00 EDT
    const E: i64 = 1_775_361_480;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn triple_of(r: &Record) -> (i64, i64, i64) {
        let t = TimestampTriple::from_record(r).unwrap();
        (t.arrival_arrival, t.arrival, t.arrival_departure)
    }

    // ── offset preservation ─────────────────────────────────────────────

    #[test]
    fn test_convert_preserves_offsets() {
        let mut r = record(json!({
            PRETTY: "4/4/2026 23:58:00",
            "Unix Arrival Arrival": 1000,
            "Unix Arrival": 1010,
            "Unix Arrival Departure": 1030,
        }));
        let outcome = convert_record(&mut r, PRETTY).unwrap();
        assert_eq!(outcome, RecordOutcome::OffsetsPreserved);
        assert_eq!(triple_of(&r), (E - 10, E, E + 20));
    }

    #[test]
    fn test_convert_negative_offsets_are_kept() {
        let mut r = record(json!({
            PRETTY: "4/4/2026 23:58:00",
            "Unix Arrival Arrival": 2000,
            "Unix Arrival": 1000,
            "Unix Arrival Departure": 900,
        }));
        convert_record(&mut r, PRETTY).unwrap();
        assert_eq!(triple_of(&r), (E + 1000, E, E - 100));
    }

    #[test]
    fn test_convert_coerces_numeric_strings() {
        let mut r = record(json!({
            PRETTY: "4/4/2026 23:58:00",
            "Unix Arrival Arrival": "1000",
            "Unix Arrival": " 1010 ",
            "Unix Arrival Departure": 1030.9,
        }));
        let outcome = convert_record(&mut r, PRETTY).unwrap();
        assert_eq!(outcome, RecordOutcome::OffsetsPreserved);
        assert_eq!(triple_of(&r), (E - 10, E, E + 20));
        // rewritten as integers
        assert_eq!(r[UNIX_ARRIVAL_ARRIVAL], json!(E - 10));
    }

    #[test]
    fn test_convert_keeps_other_fields_and_order() {
        let mut r = record(json!({
            "Stop": "Kalamazoo",
            PRETTY: "4/4/2026 23:58:00",
            "Unix Arrival Arrival": 1000,
            "Unix Arrival": 1010,
            "Unix Arrival Departure": 1030,
            "Note": "café",
        }));
        convert_record(&mut r, PRETTY).unwrap();
        let keys: Vec<&str> = r.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "Stop",
                PRETTY,
                UNIX_ARRIVAL_ARRIVAL,
                UNIX_ARRIVAL,
                UNIX_ARRIVAL_DEPARTURE,
                "Note"
            ]
        );
        assert_eq!(r["Note"], json!("café"));
    }

    // ── fallback ────────────────────────────────────────────────────────

    #[test]
    fn test_convert_without_unix_fields_collapses() {
        let mut r = record(json!({ PRETTY: "4/5/2026 0:00:00" }));
        let outcome = convert_record(&mut r, PRETTY).unwrap();
        assert_eq!(outcome, RecordOutcome::Collapsed);
        let e = 1_775_361_600;
        assert_eq!(triple_of(&r), (e, e, e));
    }

    #[test]
    fn test_convert_partial_unix_fields_collapse() {
        let mut r = record(json!({
            PRETTY: "4/4/2026 23:58:00",
            "Unix Arrival Arrival": 1000,
            "Unix Arrival": 1010,
        }));
        assert_eq!(convert_record(&mut r, PRETTY).unwrap(), RecordOutcome::Collapsed);
        assert_eq!(triple_of(&r), (E, E, E));
    }

    #[test]
    fn test_convert_null_unix_field_collapses() {
        let mut r = record(json!({
            PRETTY: "4/4/2026 23:58:00",
            "Unix Arrival Arrival": 1000,
            "Unix Arrival": null,
            "Unix Arrival Departure": 1030,
        }));
        assert_eq!(convert_record(&mut r, PRETTY).unwrap(), RecordOutcome::Collapsed);
        assert_eq!(triple_of(&r), (E, E, E));
    }

    #[test]
    fn test_convert_non_numeric_unix_field_collapses() {
        let mut r = record(json!({
            PRETTY: "4/4/2026 23:58:00",
            "Unix Arrival Arrival": 1000,
            "Unix Arrival": "soon",
            "Unix Arrival Departure": [1030],
        }));
        assert_eq!(convert_record(&mut r, PRETTY).unwrap(), RecordOutcome::Collapsed);
        assert_eq!(triple_of(&r), (E, E, E));
    }

    #[test]
    fn test_convert_overflowing_offsets_collapse() {
        let mut r = record(json!({
            PRETTY: "4/4/2026 23:58:00",
            "Unix Arrival Arrival": i64::MIN,
            "Unix Arrival": i64::MAX,
            "Unix Arrival Departure": i64::MAX,
        }));
        assert_eq!(convert_record(&mut r, PRETTY).unwrap(), RecordOutcome::Collapsed);
        assert_eq!(triple_of(&r), (E, E, E));
    }

    // ── skipped records ─────────────────────────────────────────────────

    #[test]
    fn test_convert_missing_pretty_field_is_untouched() {
        let original = record(json!({
            "Unix Arrival Arrival": 1000,
            "Unix Arrival": "x",
        }));
        let mut r = original.clone();
        assert_eq!(convert_record(&mut r, PRETTY).unwrap(), RecordOutcome::Skipped);
        assert_eq!(r, original);
    }

    #[test]
    fn test_convert_falsy_pretty_values_are_untouched() {
        for falsy in [json!(""), json!(null), json!(false), json!(0), json!([]), json!({})] {
            let original = record(json!({ PRETTY: falsy, "Unix Arrival": 5 }));
            let mut r = original.clone();
            assert_eq!(convert_record(&mut r, PRETTY).unwrap(), RecordOutcome::Skipped);
            assert_eq!(r, original);
        }
    }

    #[test]
    fn test_convert_custom_pretty_field() {
        let mut r = record(json!({ "When": "4/4/2026 23:58:00" }));
        assert_eq!(convert_record(&mut r, "When").unwrap(), RecordOutcome::Collapsed);
        assert_eq!(r[UNIX_ARRIVAL], json!(E));
    }

    // ── errors ──────────────────────────────────────────────────────────

    #[test]
    fn test_convert_malformed_pretty_is_error() {
        let original = record(json!({ PRETTY: "2026-04-04 23:58", "Unix Arrival": 1 }));
        let mut r = original.clone();
        let err = convert_record(&mut r, PRETTY).unwrap_err();
        assert!(matches!(err, RetimeError::InvalidDatetime(_)), "got: {err}");
        assert_eq!(r, original);
    }

    #[test]
    fn test_convert_non_string_pretty_is_error() {
        let mut r = record(json!({ PRETTY: 1_775_361_480 }));
        let err = convert_record(&mut r, PRETTY).unwrap_err().to_string();
        assert!(err.contains("expected a string"), "got: {err}");
        assert!(err.contains(PRETTY), "got: {err}");
    }

    // ── coercion ────────────────────────────────────────────────────────

    #[test]
    fn test_coerce_timestamp() {
        assert_eq!(coerce_timestamp(&json!(42)), Some(42));
        assert_eq!(coerce_timestamp(&json!(-42)), Some(-42));
        assert_eq!(coerce_timestamp(&json!(-1.9)), Some(-1));
        assert_eq!(coerce_timestamp(&json!(true)), Some(1));
        assert_eq!(coerce_timestamp(&json!("+17")), Some(17));
        assert_eq!(coerce_timestamp(&json!("1.5")), None);
        assert_eq!(coerce_timestamp(&json!("")), None);
        assert_eq!(coerce_timestamp(&json!(u64::MAX)), None);
        assert_eq!(coerce_timestamp(&json!(null)), None);
        assert_eq!(coerce_timestamp(&json!({"a": 1})), None);
    }

    #[test]
    fn test_from_record_names_first_bad_field() {
        let r = record(json!({ "Unix Arrival Arrival": 1, "Unix Arrival Departure": 3 }));
        assert_eq!(
            TimestampTriple::from_record(&r),
            Err(OffsetsUnavailable::Missing(UNIX_ARRIVAL))
        );

        let r = record(json!({
            "Unix Arrival Arrival": "early",
            "Unix Arrival": 2,
            "Unix Arrival Departure": 3,
        }));
        assert_eq!(
            TimestampTriple::from_record(&r),
            Err(OffsetsUnavailable::NotNumeric {
                field: UNIX_ARRIVAL_ARRIVAL,
                found: "string \"early\"".to_string(),
            })
        );
    }

    // ── properties ──────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn prop_offsets_survive_conversion(
            aa in -1_000_000_000i64..4_000_000_000,
            before in -100_000i64..100_000,
            after in -100_000i64..100_000,
        ) {
            let a = aa + before;
            let ad = a + after;
            let mut r = record(json!({
                PRETTY: "4/4/2026 23:58:00",
                "Unix Arrival Arrival": aa,
                "Unix Arrival": a,
                "Unix Arrival Departure": ad,
            }));
            convert_record(&mut r, PRETTY).unwrap();
            let (new_aa, new_a, new_ad) = triple_of(&r);
            prop_assert_eq!(new_a, E);
            prop_assert_eq!(new_a - new_aa, before);
            prop_assert_eq!(new_ad - new_a, after);
        }

        #[test]
        fn prop_conversion_is_idempotent(
            aa in proptest::option::of(-1_000_000i64..1_000_000),
            a in proptest::option::of(-1_000_000i64..1_000_000),
            ad in proptest::option::of(-1_000_000i64..1_000_000),
        ) {
            let mut r = record(json!({ PRETTY: "4/4/2026 23:58:00" }));
            for (field, value) in UNIX_FIELDS.iter().zip([aa, a, ad]) {
                if let Some(v) = value {
                    r.insert(field.to_string(), v.into());
                }
            }
            convert_record(&mut r, PRETTY).unwrap();
            let once = r.clone();
            convert_record(&mut r, PRETTY).unwrap();
            prop_assert_eq!(&r, &once);
            convert_record(&mut r, PRETTY).unwrap();
            prop_assert_eq!(&r, &once);
        }
    }
}
