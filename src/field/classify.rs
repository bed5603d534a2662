//! Value kind classification.
//!
//! [`classify`] maps a [`WeaviateField`] onto exactly one [`ValueKind`]. It is
//! total: values that fit no specific kind come back as [`ValueKind::Unknown`]
//! and are written through the generic property bucket.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::WeaviateField;

/// The semantic kind of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Text,
    TextArray,
    Int,
    IntArray,
    Float,
    FloatArray,
    Boolean,
    BooleanArray,
    Date,
    DateArray,
    GeoCoordinate,
    PhoneNumber,
    Object,
    ObjectArray,
    EmptyList,
    Unknown,
}

impl ValueKind {
    /// Whether the kind is a sequence (including the empty list).
    pub fn is_array(self) -> bool {
        matches!(
            self,
            ValueKind::TextArray
                | ValueKind::IntArray
                | ValueKind::FloatArray
                | ValueKind::BooleanArray
                | ValueKind::DateArray
                | ValueKind::ObjectArray
                | ValueKind::EmptyList
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Text => "text",
            ValueKind::TextArray => "text[]",
            ValueKind::Int => "int",
            ValueKind::IntArray => "int[]",
            ValueKind::Float => "number",
            ValueKind::FloatArray => "number[]",
            ValueKind::Boolean => "boolean",
            ValueKind::BooleanArray => "boolean[]",
            ValueKind::Date => "date",
            ValueKind::DateArray => "date[]",
            ValueKind::GeoCoordinate => "geoCoordinates",
            ValueKind::PhoneNumber => "phoneNumber",
            ValueKind::Object => "object",
            ValueKind::ObjectArray => "object[]",
            ValueKind::EmptyList => "empty list",
            ValueKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return `value` as an `i64` when it has no fractional component.
pub fn as_integral(value: f64) -> Option<i64> {
    // 2^63 is exactly representable; anything at or beyond it overflows i64.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if value.is_finite() && value.fract() == 0.0 && value >= -LIMIT && value < LIMIT {
        Some(value as i64)
    } else {
        None
    }
}

/// Classify a field value.
///
/// Numbers are integers when they have no fractional component, so `1.0`
/// is [`ValueKind::Int`] and `1.5` is [`ValueKind::Float`]. Empty sequences of
/// any element type are [`ValueKind::EmptyList`].
pub fn classify(value: &WeaviateField) -> ValueKind {
    match value {
        WeaviateField::Text(_) => ValueKind::Text,
        WeaviateField::Int(_) => ValueKind::Int,
        WeaviateField::Number(n) => {
            if as_integral(*n).is_some() {
                ValueKind::Int
            } else {
                ValueKind::Float
            }
        }
        WeaviateField::Boolean(_) => ValueKind::Boolean,
        WeaviateField::Date(_) => ValueKind::Date,
        WeaviateField::GeoCoordinate(_) => ValueKind::GeoCoordinate,
        WeaviateField::PhoneNumber(_) => ValueKind::PhoneNumber,
        WeaviateField::Object(_) => ValueKind::Object,
        WeaviateField::EmptyList => ValueKind::EmptyList,
        WeaviateField::TextArray(v) => non_empty(v.is_empty(), ValueKind::TextArray),
        WeaviateField::IntArray(v) => non_empty(v.is_empty(), ValueKind::IntArray),
        WeaviateField::BooleanArray(v) => non_empty(v.is_empty(), ValueKind::BooleanArray),
        WeaviateField::DateArray(v) => non_empty(v.is_empty(), ValueKind::DateArray),
        WeaviateField::ObjectArray(v) => non_empty(v.is_empty(), ValueKind::ObjectArray),
        WeaviateField::NumberArray(v) => {
            if v.is_empty() {
                ValueKind::EmptyList
            } else if v.iter().all(|n| as_integral(*n).is_some()) {
                ValueKind::IntArray
            } else {
                ValueKind::FloatArray
            }
        }
        WeaviateField::Untyped(_) => ValueKind::Unknown,
    }
}

/// Classify untyped JSON by first converting it with [`WeaviateField::from_json`].
pub fn classify_json(value: &Value) -> ValueKind {
    classify(&WeaviateField::from_json(value.clone()))
}

fn non_empty(is_empty: bool, kind: ValueKind) -> ValueKind {
    if is_empty { ValueKind::EmptyList } else { kind }
}
