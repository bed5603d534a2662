//! Serializer for the textual protocol's `where` filter.
//!
//! References are flattened into a path of strings, so the textual protocol
//! needs the target collection of every hop spelled out. It has no way to
//! express a reference-count comparison.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WeftError};
use crate::filter::value::{FilterLiteral, FilterOperator, FilterTarget, FilterValue};

/// Path segment addressing the object UUID.
pub const ID_PATH: &str = "_id";
/// Path segment addressing the creation timestamp.
pub const CREATION_TIME_PATH: &str = "_creationTimeUnix";
/// Path segment addressing the last-update timestamp.
pub const UPDATE_TIME_PATH: &str = "_lastUpdateTimeUnix";

/// A `where` filter in the textual protocol's JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextualFilter {
    pub operator: FilterOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operands: Option<Vec<TextualFilter>>,
    #[serde(flatten)]
    pub value: Option<TextualValue>,
}

/// The single typed value of a leaf; serialized as its `value<Type>` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextualValue {
    ValueText(String),
    ValueTextArray(Vec<String>),
    ValueInt(i64),
    ValueIntArray(Vec<i64>),
    ValueNumber(f64),
    ValueNumberArray(Vec<f64>),
    ValueBoolean(bool),
    ValueBooleanArray(Vec<bool>),
    ValueDate(String),
    ValueDateArray(Vec<String>),
    ValueGeoRange(TextualGeoRange),
}

impl TextualValue {
    /// The JSON key this value is written under.
    pub fn key(&self) -> &'static str {
        match self {
            TextualValue::ValueText(_) => "valueText",
            TextualValue::ValueTextArray(_) => "valueTextArray",
            TextualValue::ValueInt(_) => "valueInt",
            TextualValue::ValueIntArray(_) => "valueIntArray",
            TextualValue::ValueNumber(_) => "valueNumber",
            TextualValue::ValueNumberArray(_) => "valueNumberArray",
            TextualValue::ValueBoolean(_) => "valueBoolean",
            TextualValue::ValueBooleanArray(_) => "valueBooleanArray",
            TextualValue::ValueDate(_) => "valueDate",
            TextualValue::ValueDateArray(_) => "valueDateArray",
            TextualValue::ValueGeoRange(_) => "valueGeoRange",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextualGeoRange {
    pub geo_coordinates: TextualGeoCoordinates,
    pub distance: TextualDistance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextualGeoCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextualDistance {
    pub max: f64,
}

/// Serialize a filter for the textual protocol.
pub fn to_textual(filter: &FilterValue) -> Result<TextualFilter> {
    if filter.operator() == FilterOperator::Unknown {
        return Err(WeftError::serialization(
            "unknown filter operator cannot be written to the textual protocol",
        ));
    }

    if let Some(children) = filter.checked_children()? {
        let operands = children.iter().map(to_textual).collect::<Result<Vec<_>>>()?;
        return Ok(TextualFilter {
            operator: filter.operator(),
            path: None,
            operands: Some(operands),
            value: None,
        });
    }

    match filter {
        FilterValue::Leaf {
            operator,
            target,
            value,
        } => Ok(TextualFilter {
            operator: *operator,
            path: Some(target_path(target)?),
            operands: None,
            value: Some(textual_value(value.literal()?)),
        }),
        FilterValue::Combination { .. } => Err(WeftError::internal(
            "combination filter passed the leaf shape check",
        )),
    }
}

/// Flatten a target into the ordered path the textual protocol expects.
pub fn target_path(target: &FilterTarget) -> Result<Vec<String>> {
    let mut path = Vec::new();
    push_target(target, &mut path)?;
    Ok(path)
}

fn push_target(target: &FilterTarget, path: &mut Vec<String>) -> Result<()> {
    match target {
        FilterTarget::Property(name) => path.push(name.clone()),
        FilterTarget::Id => path.push(ID_PATH.to_string()),
        FilterTarget::CreationTime => path.push(CREATION_TIME_PATH.to_string()),
        FilterTarget::UpdateTime => path.push(UPDATE_TIME_PATH.to_string()),
        FilterTarget::Count(on) => {
            return Err(WeftError::serialization(format!(
                "reference-count filter on {on:?} cannot be expressed in the textual protocol"
            )));
        }
        FilterTarget::SingleTargetRef { on, .. } => {
            return Err(WeftError::serialization(format!(
                "cannot use a single-target reference filter on {on:?} in the textual protocol; \
                 use by_ref_multi_target and name the target collection"
            )));
        }
        FilterTarget::MultiTargetRef {
            on,
            target_collection,
            target,
        } => {
            path.push(on.clone());
            path.push(target_collection.clone());
            push_target(target, path)?;
        }
    }
    Ok(())
}

fn textual_value(literal: FilterLiteral) -> TextualValue {
    match literal {
        FilterLiteral::Text(v) => TextualValue::ValueText(v),
        FilterLiteral::TextArray(v) => TextualValue::ValueTextArray(v),
        FilterLiteral::Int(v) => TextualValue::ValueInt(v),
        FilterLiteral::IntArray(v) => TextualValue::ValueIntArray(v),
        FilterLiteral::Number(v) => TextualValue::ValueNumber(v),
        FilterLiteral::NumberArray(v) => TextualValue::ValueNumberArray(v),
        FilterLiteral::Boolean(v) => TextualValue::ValueBoolean(v),
        FilterLiteral::BooleanArray(v) => TextualValue::ValueBooleanArray(v),
        FilterLiteral::Date(v) => TextualValue::ValueDate(v),
        FilterLiteral::DateArray(v) => TextualValue::ValueDateArray(v),
        FilterLiteral::GeoRange(range) => TextualValue::ValueGeoRange(TextualGeoRange {
            geo_coordinates: TextualGeoCoordinates {
                latitude: range.latitude,
                longitude: range.longitude,
            },
            distance: TextualDistance {
                max: range.distance,
            },
        }),
    }
}

impl TextualFilter {
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Render the filter as a GraphQL `where` argument body.
    ///
    /// Keys are bare identifiers and the operator is an enum literal, e.g.
    /// `{operator: Equal, path: ["name"], valueText: "Ferris"}`.
    pub fn to_graphql(&self) -> Result<String> {
        let mut out = String::new();
        self.write_graphql(&mut out)?;
        Ok(out)
    }

    fn write_graphql(&self, out: &mut String) -> Result<()> {
        out.push_str("{operator: ");
        out.push_str(self.operator.as_str());
        if let Some(path) = &self.path {
            out.push_str(", path: ");
            render_graphql(&serde_json::to_value(path)?, out)?;
        }
        if let Some(operands) = &self.operands {
            out.push_str(", operands: [");
            for (i, operand) in operands.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                operand.write_graphql(out)?;
            }
            out.push(']');
        }
        if let Some(value) = &self.value {
            out.push_str(", ");
            out.push_str(value.key());
            out.push_str(": ");
            if let Value::Object(map) = serde_json::to_value(value)? {
                for item in map.values() {
                    render_graphql(item, out)?;
                }
            }
        }
        out.push('}');
        Ok(())
    }
}

fn render_graphql(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                render_graphql(item, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_graphql(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}
