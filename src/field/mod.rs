//! Property values written to and filtered against a collection.
//!
//! [`WeaviateField`] is the typed representation used at the API boundary.
//! Untyped input (JSON imports, CLI arguments) enters through
//! [`WeaviateField::from_json`], which is the only place where a value's kind
//! is inferred from its shape.
//!
//! ```
//! use weft::field::{WeaviateField, classify, ValueKind};
//!
//! let price = WeaviateField::from(1.0);
//! assert_eq!(classify(&price), ValueKind::Int);
//!
//! let ratio = WeaviateField::from(1.5);
//! assert_eq!(classify(&ratio), ValueKind::Float);
//! ```

pub mod classify;

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WeftError};

pub use self::classify::{ValueKind, as_integral, classify, classify_json};

/// Keys the server may return for a phone number property.
const PHONE_NUMBER_KEYS: &[&str] = &[
    "input",
    "defaultCountry",
    "internationalFormatted",
    "countryCode",
    "national",
    "nationalFormatted",
    "valid",
];

/// A nested object: property name to value.
pub type ObjectValue = BTreeMap<String, WeaviateField>;

/// A geographic coordinate property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Create a coordinate, rejecting out-of-range latitude or longitude.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(WeftError::invalid_input(format!(
                "invalid latitude: {latitude} (must be between -90 and 90)"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(WeftError::invalid_input(format!(
                "invalid longitude: {longitude} (must be between -180 and 180)"
            )));
        }

        Ok(GeoCoordinate {
            latitude,
            longitude,
        })
    }
}

/// A phone number property; the server parses and normalizes `input`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    /// The raw number as entered.
    pub input: String,
    /// ISO 3166-1 alpha-2 country used when `input` has no country prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_country: Option<String>,
}

impl PhoneNumber {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            default_country: None,
        }
    }

    pub fn with_default_country(mut self, country: impl Into<String>) -> Self {
        self.default_country = Some(country.into());
        self
    }
}

/// A property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeaviateField {
    Text(String),
    TextArray(Vec<String>),
    Int(i64),
    IntArray(Vec<i64>),
    /// Floating point number; integral values still classify as [`ValueKind::Int`].
    Number(f64),
    NumberArray(Vec<f64>),
    Boolean(bool),
    BooleanArray(Vec<bool>),
    Date(DateTime<Utc>),
    DateArray(Vec<DateTime<Utc>>),
    GeoCoordinate(GeoCoordinate),
    PhoneNumber(PhoneNumber),
    Object(ObjectValue),
    ObjectArray(Vec<ObjectValue>),
    /// An empty sequence whose element type is unknown.
    EmptyList,
    /// A value whose shape could not be classified.
    Untyped(Value),
}

impl WeaviateField {
    /// Convert untyped JSON into a field, inferring the kind from its shape.
    ///
    /// Strings always become text, even when they look like dates. Objects are
    /// checked for the geo-coordinate and phone-number shapes before falling
    /// back to a nested object.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(s) => WeaviateField::Text(s),
            Value::Bool(b) => WeaviateField::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => WeaviateField::Int(i),
                None => match n.as_f64() {
                    Some(f) => WeaviateField::Number(f),
                    None => WeaviateField::Untyped(Value::Number(n)),
                },
            },
            Value::Object(map) => {
                if let Some(geo) = geo_from_json(&map) {
                    return WeaviateField::GeoCoordinate(geo);
                }
                if let Some(phone) = phone_from_json(&map) {
                    return WeaviateField::PhoneNumber(phone);
                }
                WeaviateField::Object(object_from_json(map))
            }
            Value::Array(items) => array_from_json(items),
            Value::Null => WeaviateField::Untyped(Value::Null),
        }
    }

    /// Render the value as JSON the way the server would return it.
    pub fn to_json(&self) -> Value {
        match self {
            WeaviateField::Text(s) => Value::from(s.as_str()),
            WeaviateField::TextArray(v) => Value::from(v.clone()),
            WeaviateField::Int(i) => Value::from(*i),
            WeaviateField::IntArray(v) => Value::from(v.clone()),
            WeaviateField::Number(n) => Value::from(*n),
            WeaviateField::NumberArray(v) => Value::from(v.clone()),
            WeaviateField::Boolean(b) => Value::from(*b),
            WeaviateField::BooleanArray(v) => Value::from(v.clone()),
            WeaviateField::Date(d) => Value::from(format_date(d)),
            WeaviateField::DateArray(v) => Value::from(v.iter().map(format_date).collect::<Vec<_>>()),
            WeaviateField::GeoCoordinate(g) => serde_json::json!({
                "latitude": g.latitude,
                "longitude": g.longitude,
            }),
            WeaviateField::PhoneNumber(p) => {
                let mut map = serde_json::Map::new();
                map.insert("input".to_string(), Value::from(p.input.as_str()));
                if let Some(country) = &p.default_country {
                    map.insert("defaultCountry".to_string(), Value::from(country.as_str()));
                }
                Value::Object(map)
            }
            WeaviateField::Object(o) => object_to_json(o),
            WeaviateField::ObjectArray(v) => Value::Array(v.iter().map(object_to_json).collect()),
            WeaviateField::EmptyList => Value::Array(Vec::new()),
            WeaviateField::Untyped(v) => v.clone(),
        }
    }
}

/// Format a date as ISO-8601 with millisecond precision and a `Z` suffix.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn object_to_json(object: &ObjectValue) -> Value {
    Value::Object(
        object
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

fn object_from_json(map: serde_json::Map<String, Value>) -> ObjectValue {
    map.into_iter()
        .map(|(k, v)| (k, WeaviateField::from_json(v)))
        .collect()
}

fn geo_from_json(map: &serde_json::Map<String, Value>) -> Option<GeoCoordinate> {
    if map.len() != 2 {
        return None;
    }
    let latitude = map.get("latitude")?.as_f64()?;
    let longitude = map.get("longitude")?.as_f64()?;
    GeoCoordinate::new(latitude, longitude).ok()
}

fn phone_from_json(map: &serde_json::Map<String, Value>) -> Option<PhoneNumber> {
    let input = map.get("input")?.as_str()?;
    if !map.keys().all(|k| PHONE_NUMBER_KEYS.contains(&k.as_str())) {
        return None;
    }
    let default_country = match map.get("defaultCountry") {
        Some(Value::String(country)) => Some(country.clone()),
        Some(_) => return None,
        None => None,
    };
    Some(PhoneNumber {
        input: input.to_string(),
        default_country,
    })
}

fn array_from_json(items: Vec<Value>) -> WeaviateField {
    if items.is_empty() {
        return WeaviateField::EmptyList;
    }

    if items.iter().all(Value::is_string) {
        let values = items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect();
        return WeaviateField::TextArray(values);
    }

    if items.iter().all(Value::is_boolean) {
        return WeaviateField::BooleanArray(items.iter().filter_map(Value::as_bool).collect());
    }

    if items.iter().all(Value::is_number) {
        if items.iter().all(|v| v.as_i64().is_some()) {
            return WeaviateField::IntArray(items.iter().filter_map(Value::as_i64).collect());
        }
        if items.iter().all(|v| v.as_f64().is_some()) {
            return WeaviateField::NumberArray(items.iter().filter_map(Value::as_f64).collect());
        }
    }

    if items.iter().all(Value::is_object) {
        let objects = items
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(object_from_json(map)),
                _ => None,
            })
            .collect();
        return WeaviateField::ObjectArray(objects);
    }

    WeaviateField::Untyped(Value::Array(items))
}

impl From<&str> for WeaviateField {
    fn from(value: &str) -> Self {
        WeaviateField::Text(value.to_string())
    }
}

impl From<String> for WeaviateField {
    fn from(value: String) -> Self {
        WeaviateField::Text(value)
    }
}

impl From<i64> for WeaviateField {
    fn from(value: i64) -> Self {
        WeaviateField::Int(value)
    }
}

impl From<i32> for WeaviateField {
    fn from(value: i32) -> Self {
        WeaviateField::Int(value as i64)
    }
}

impl From<f64> for WeaviateField {
    fn from(value: f64) -> Self {
        WeaviateField::Number(value)
    }
}

impl From<bool> for WeaviateField {
    fn from(value: bool) -> Self {
        WeaviateField::Boolean(value)
    }
}

impl From<DateTime<Utc>> for WeaviateField {
    fn from(value: DateTime<Utc>) -> Self {
        WeaviateField::Date(value)
    }
}

impl From<GeoCoordinate> for WeaviateField {
    fn from(value: GeoCoordinate) -> Self {
        WeaviateField::GeoCoordinate(value)
    }
}

impl From<PhoneNumber> for WeaviateField {
    fn from(value: PhoneNumber) -> Self {
        WeaviateField::PhoneNumber(value)
    }
}

impl From<ObjectValue> for WeaviateField {
    fn from(value: ObjectValue) -> Self {
        WeaviateField::Object(value)
    }
}

impl From<Vec<&str>> for WeaviateField {
    fn from(value: Vec<&str>) -> Self {
        WeaviateField::TextArray(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for WeaviateField {
    fn from(value: Vec<String>) -> Self {
        WeaviateField::TextArray(value)
    }
}

impl From<Vec<i64>> for WeaviateField {
    fn from(value: Vec<i64>) -> Self {
        WeaviateField::IntArray(value)
    }
}

impl From<Vec<f64>> for WeaviateField {
    fn from(value: Vec<f64>) -> Self {
        WeaviateField::NumberArray(value)
    }
}

impl From<Vec<bool>> for WeaviateField {
    fn from(value: Vec<bool>) -> Self {
        WeaviateField::BooleanArray(value)
    }
}

impl From<Vec<DateTime<Utc>>> for WeaviateField {
    fn from(value: Vec<DateTime<Utc>>) -> Self {
        WeaviateField::DateArray(value)
    }
}

impl From<Vec<ObjectValue>> for WeaviateField {
    fn from(value: Vec<ObjectValue>) -> Self {
        WeaviateField::ObjectArray(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_geo_coordinate_validation() {
        assert!(GeoCoordinate::new(52.37, 4.89).is_ok());
        assert!(GeoCoordinate::new(91.0, 0.0).unwrap_err().is_invalid_input());
        assert!(GeoCoordinate::new(0.0, -180.5).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(WeaviateField::from_json(json!("a")), WeaviateField::Text("a".into()));
        assert_eq!(WeaviateField::from_json(json!(3)), WeaviateField::Int(3));
        assert_eq!(WeaviateField::from_json(json!(2.5)), WeaviateField::Number(2.5));
        assert_eq!(WeaviateField::from_json(json!(true)), WeaviateField::Boolean(true));
    }

    #[test]
    fn test_date_shaped_string_stays_text() {
        let field = WeaviateField::from_json(json!("2024-01-01T00:00:00Z"));
        assert_eq!(field, WeaviateField::Text("2024-01-01T00:00:00Z".into()));
    }

    #[test]
    fn test_structured_objects_detected_before_nested_object() {
        let geo = WeaviateField::from_json(json!({"latitude": 52.3, "longitude": 4.9}));
        assert!(matches!(geo, WeaviateField::GeoCoordinate(_)));

        let phone = WeaviateField::from_json(json!({"input": "020 1234567", "defaultCountry": "nl"}));
        assert_eq!(
            phone,
            WeaviateField::PhoneNumber(PhoneNumber::new("020 1234567").with_default_country("nl"))
        );

        let nested = WeaviateField::from_json(json!({"latitude": 1.0, "longitude": 2.0, "city": "x"}));
        assert!(matches!(nested, WeaviateField::Object(_)));
    }

    #[test]
    fn test_out_of_range_geo_shape_is_object() {
        let field = WeaviateField::from_json(json!({"latitude": 500, "longitude": 900}));
        assert!(matches!(field, WeaviateField::Object(_)));
        assert_eq!(classify(&field), ValueKind::Object);
    }

    #[test]
    fn test_arrays_from_json() {
        assert_eq!(WeaviateField::from_json(json!([])), WeaviateField::EmptyList);
        assert_eq!(WeaviateField::from_json(json!([1, 2])), WeaviateField::IntArray(vec![1, 2]));
        assert_eq!(
            WeaviateField::from_json(json!([1, 2.5])),
            WeaviateField::NumberArray(vec![1.0, 2.5])
        );
        assert!(matches!(
            WeaviateField::from_json(json!([1, "a"])),
            WeaviateField::Untyped(_)
        ));
    }

    #[test]
    fn test_to_json_dates() {
        let date = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(WeaviateField::Date(date).to_json(), json!("2024-03-01T12:00:00.000Z"));
    }
}
