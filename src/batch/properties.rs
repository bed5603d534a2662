//! Flattening of object properties into per-type buckets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::batch::reference::{
    MultiTargetRefProps, ReferenceInput, SingleTargetRefProps, resolve_references,
};
use crate::field::{
    GeoCoordinate, ObjectValue, PhoneNumber, ValueKind, WeaviateField, as_integral, classify,
    format_date,
};
use crate::wire::f64s_to_bytes;

/// A dynamically typed scalar or structure, shaped like a protobuf `Value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<StructValue>),
    Struct(BTreeMap<String, StructValue>),
}

impl From<&GeoCoordinate> for StructValue {
    fn from(geo: &GeoCoordinate) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("latitude".to_string(), StructValue::Number(geo.latitude));
        fields.insert("longitude".to_string(), StructValue::Number(geo.longitude));
        StructValue::Struct(fields)
    }
}

impl From<&PhoneNumber> for StructValue {
    fn from(phone: &PhoneNumber) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("input".to_string(), StructValue::Text(phone.input.clone()));
        if let Some(country) = &phone.default_country {
            fields.insert("defaultCountry".to_string(), StructValue::Text(country.clone()));
        }
        StructValue::Struct(fields)
    }
}

impl From<&Value> for StructValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => StructValue::Null,
            Value::Bool(b) => StructValue::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(StructValue::Null, StructValue::Number),
            Value::String(s) => StructValue::Text(s.clone()),
            Value::Array(items) => StructValue::List(items.iter().map(StructValue::from).collect()),
            Value::Object(map) => StructValue::Struct(
                map.iter()
                    .map(|(k, v)| (k.clone(), StructValue::from(v)))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextArrayProperties {
    pub prop_name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntArrayProperties {
    pub prop_name: String,
    pub values: Vec<i64>,
}

/// Float array packed as little-endian float64.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberArrayProperties {
    pub prop_name: String,
    pub values_bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanArrayProperties {
    pub prop_name: String,
    pub values: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectProperties {
    pub prop_name: String,
    pub value: NestedProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectArrayProperties {
    pub prop_name: String,
    pub values: Vec<NestedProperties>,
}

/// Buckets of a nested object. Nested objects carry no references.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NestedProperties {
    pub non_ref_properties: BTreeMap<String, StructValue>,
    pub text_array_properties: Vec<TextArrayProperties>,
    pub int_array_properties: Vec<IntArrayProperties>,
    pub number_array_properties: Vec<NumberArrayProperties>,
    pub boolean_array_properties: Vec<BooleanArrayProperties>,
    pub object_properties: Vec<ObjectProperties>,
    pub object_array_properties: Vec<ObjectArrayProperties>,
    pub empty_list_props: Vec<String>,
}

/// Property buckets of one batch object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BinaryBatchProperties {
    pub non_ref_properties: BTreeMap<String, StructValue>,
    pub text_array_properties: Vec<TextArrayProperties>,
    pub int_array_properties: Vec<IntArrayProperties>,
    pub number_array_properties: Vec<NumberArrayProperties>,
    pub boolean_array_properties: Vec<BooleanArrayProperties>,
    pub object_properties: Vec<ObjectProperties>,
    pub object_array_properties: Vec<ObjectArrayProperties>,
    pub empty_list_props: Vec<String>,
    pub single_target_ref_props: Vec<SingleTargetRefProps>,
    pub multi_target_ref_props: Vec<MultiTargetRefProps>,
}

impl BinaryBatchProperties {
    /// Total number of property entries across every bucket.
    pub fn len(&self) -> usize {
        self.non_ref_properties.len()
            + self.text_array_properties.len()
            + self.int_array_properties.len()
            + self.number_array_properties.len()
            + self.boolean_array_properties.len()
            + self.object_properties.len()
            + self.object_array_properties.len()
            + self.empty_list_props.len()
            + self.single_target_ref_props.len()
            + self.multi_target_ref_props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Largest magnitude a float64 holds without rounding.
const MAX_EXACT_INT: u64 = 1 << 53;

/// Flatten properties and references into their buckets.
///
/// Never fails: values that cannot be classified go to the generic
/// non-reference bucket as converted JSON.
///
/// Scalar integers travel as float64 `StructValue::Number`, so magnitudes
/// above 2^53 are rounded to the nearest representable double. Integer
/// arrays keep full `i64` precision.
pub fn encode_properties(
    properties: &BTreeMap<String, WeaviateField>,
    references: &BTreeMap<String, ReferenceInput>,
) -> BinaryBatchProperties {
    let nested = encode_nested(properties);
    let refs = resolve_references(references);
    BinaryBatchProperties {
        non_ref_properties: nested.non_ref_properties,
        text_array_properties: nested.text_array_properties,
        int_array_properties: nested.int_array_properties,
        number_array_properties: nested.number_array_properties,
        boolean_array_properties: nested.boolean_array_properties,
        object_properties: nested.object_properties,
        object_array_properties: nested.object_array_properties,
        empty_list_props: nested.empty_list_props,
        single_target_ref_props: refs.single_target,
        multi_target_ref_props: refs.multi_target,
    }
}

fn encode_nested(properties: &ObjectValue) -> NestedProperties {
    let mut buckets = NestedProperties::default();
    for (name, value) in properties {
        place(&mut buckets, name, value);
    }
    buckets
}

fn place(buckets: &mut NestedProperties, name: &str, value: &WeaviateField) {
    let kind = classify(value);
    if kind == ValueKind::EmptyList {
        buckets.empty_list_props.push(name.to_string());
        return;
    }

    let prop_name = name.to_string();
    match value {
        WeaviateField::Text(s) => {
            buckets.non_ref_properties.insert(prop_name, StructValue::Text(s.clone()));
        }
        WeaviateField::Int(i) => {
            if i.unsigned_abs() > MAX_EXACT_INT {
                tracing::warn!(
                    property = %prop_name,
                    value = *i,
                    "integer exceeds 2^53 and loses precision in the number bucket"
                );
            }
            buckets.non_ref_properties.insert(prop_name, StructValue::Number(*i as f64));
        }
        WeaviateField::Number(n) => {
            buckets.non_ref_properties.insert(prop_name, StructValue::Number(*n));
        }
        WeaviateField::Boolean(b) => {
            buckets.non_ref_properties.insert(prop_name, StructValue::Bool(*b));
        }
        WeaviateField::Date(d) => {
            buckets.non_ref_properties.insert(prop_name, StructValue::Text(format_date(d)));
        }
        WeaviateField::GeoCoordinate(geo) => {
            buckets.non_ref_properties.insert(prop_name, StructValue::from(geo));
        }
        WeaviateField::PhoneNumber(phone) => {
            buckets.non_ref_properties.insert(prop_name, StructValue::from(phone));
        }
        WeaviateField::TextArray(values) => buckets.text_array_properties.push(TextArrayProperties {
            prop_name,
            values: values.clone(),
        }),
        WeaviateField::DateArray(values) => buckets.text_array_properties.push(TextArrayProperties {
            prop_name,
            values: values.iter().map(format_date).collect(),
        }),
        WeaviateField::IntArray(values) => buckets.int_array_properties.push(IntArrayProperties {
            prop_name,
            values: values.clone(),
        }),
        WeaviateField::NumberArray(values) if kind == ValueKind::IntArray => {
            buckets.int_array_properties.push(IntArrayProperties {
                prop_name,
                values: values.iter().filter_map(|v| as_integral(*v)).collect(),
            })
        }
        WeaviateField::NumberArray(values) => {
            buckets.number_array_properties.push(NumberArrayProperties {
                prop_name,
                values_bytes: f64s_to_bytes(values),
            })
        }
        WeaviateField::BooleanArray(values) => {
            buckets.boolean_array_properties.push(BooleanArrayProperties {
                prop_name,
                values: values.clone(),
            })
        }
        WeaviateField::Object(object) => buckets.object_properties.push(ObjectProperties {
            prop_name,
            value: encode_nested(object),
        }),
        WeaviateField::ObjectArray(objects) => {
            buckets.object_array_properties.push(ObjectArrayProperties {
                prop_name,
                values: objects.iter().map(encode_nested).collect(),
            })
        }
        WeaviateField::EmptyList => buckets.empty_list_props.push(prop_name),
        WeaviateField::Untyped(raw) => {
            tracing::warn!(
                property = name,
                "unclassified property value written to the generic bucket"
            );
            buckets.non_ref_properties.insert(prop_name, StructValue::from(raw));
        }
    }
}
