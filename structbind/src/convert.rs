//! Conversion rules, one per [`FieldKind`](crate::types::FieldKind).
//!
//! Derived `assign_field` implementations call these with the field's concrete type, so every
//! rule is fully typed by the time it runs.

use std::fmt::Display;
use std::num::{ParseFloatError, ParseIntError};
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;

use crate::errors::ConversionError;

/// Capability of building a value straight from raw text bytes.
///
/// Fields marked `#[bind(text)]` are decoded through this trait instead of the generic kind rules.
/// The error's `Display` output is reported unchanged.
pub trait FromText: Sized {
    type Err: Display;

    fn from_text(text: &[u8]) -> Result<Self, Self::Err>;
}

pub fn string(raw: &str) -> Result<String, ConversionError> {
    Ok(raw.to_owned())
}

/// Base-10 with optional sign; values that do not fit `T` are range errors.
pub fn signed<T>(raw: &str) -> Result<T, ConversionError>
where
    T: FromStr<Err = ParseIntError>,
{
    Ok(raw.parse::<T>()?)
}

/// Base-10 digits only; any sign prefix is rejected.
pub fn unsigned<T>(raw: &str) -> Result<T, ConversionError>
where
    T: FromStr<Err = ParseIntError>,
{
    if raw.starts_with(['-', '+']) {
        return Err(ConversionError::UnsignedSign);
    }
    Ok(raw.parse::<T>()?)
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Floating point widths the engine can decode into.
pub trait Float: FromStr<Err = ParseFloatError> + sealed::Sealed + Copy {
    const BITS: u32;

    fn is_infinite(self) -> bool;
}

impl Float for f32 {
    const BITS: u32 = 32;

    fn is_infinite(self) -> bool {
        f32::is_infinite(self)
    }
}

impl Float for f64 {
    const BITS: u32 = 64;

    fn is_infinite(self) -> bool {
        f64::is_infinite(self)
    }
}

/// Decimal or exponential notation. A finite literal that rounds to infinity at the target width
/// is a range error rather than a silent infinity.
pub fn float<T: Float>(raw: &str) -> Result<T, ConversionError> {
    let value = raw.parse::<T>()?;
    if value.is_infinite() && !names_infinity(raw) {
        return Err(ConversionError::FloatRange { bits: T::BITS });
    }
    Ok(value)
}

fn names_infinity(raw: &str) -> bool {
    let unsigned = raw.trim_start_matches(['+', '-']);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

/// Accepts exactly `true`, `false`, `1` and `0`.
pub fn boolean(raw: &str) -> Result<bool, ConversionError> {
    match raw {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConversionError::Bool),
    }
}

/// RFC 3339 timestamp, converted into the field's time zone type.
pub fn time<T>(raw: &str) -> Result<T, ConversionError>
where
    T: From<DateTime<FixedOffset>>,
{
    DateTime::parse_from_rfc3339(raw)
        .map(T::from)
        .map_err(|source| ConversionError::Time {
            raw: raw.to_owned(),
            source,
        })
}

pub fn text<T: FromText>(raw: &str) -> Result<T, ConversionError> {
    T::from_text(raw.as_bytes()).map_err(|err| ConversionError::Text {
        message: err.to_string(),
    })
}

/// Deserializes the raw value as a JSON document into the field's exact type.
/// Unknown object keys are ignored unless `T` itself denies them.
pub fn json<T: DeserializeOwned>(raw: &str) -> Result<T, ConversionError> {
    Ok(serde_json::from_str(raw)?)
}

pub fn unsupported<T>(type_name: &'static str) -> Result<T, ConversionError> {
    Err(ConversionError::UnsupportedType { type_name })
}
