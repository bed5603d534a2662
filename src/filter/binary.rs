//! Serializer for the binary protocol's filter message.
//!
//! Unlike the textual form, references stay nested as tagged unions and a
//! single-target reference needs no collection name.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WeftError};
use crate::filter::textual::{CREATION_TIME_PATH, ID_PATH, UPDATE_TIME_PATH};
use crate::filter::value::{FilterLiteral, FilterOperator, FilterTarget, FilterValue};

/// Operator enumeration of the binary protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum BinaryFilterOperator {
    Unspecified = 0,
    Equal = 1,
    NotEqual = 2,
    GreaterThan = 3,
    GreaterThanEqual = 4,
    LessThan = 5,
    LessThanEqual = 6,
    And = 7,
    Or = 8,
    WithinGeoRange = 9,
    Like = 10,
    IsNull = 11,
    ContainsAny = 12,
    ContainsAll = 13,
}

impl BinaryFilterOperator {
    /// The numeric tag sent on the wire.
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<FilterOperator> for BinaryFilterOperator {
    fn from(operator: FilterOperator) -> Self {
        match operator {
            FilterOperator::Equal => BinaryFilterOperator::Equal,
            FilterOperator::NotEqual => BinaryFilterOperator::NotEqual,
            FilterOperator::GreaterThan => BinaryFilterOperator::GreaterThan,
            FilterOperator::GreaterThanEqual => BinaryFilterOperator::GreaterThanEqual,
            FilterOperator::LessThan => BinaryFilterOperator::LessThan,
            FilterOperator::LessThanEqual => BinaryFilterOperator::LessThanEqual,
            FilterOperator::Like => BinaryFilterOperator::Like,
            FilterOperator::WithinGeoRange => BinaryFilterOperator::WithinGeoRange,
            FilterOperator::IsNull => BinaryFilterOperator::IsNull,
            FilterOperator::ContainsAny => BinaryFilterOperator::ContainsAny,
            FilterOperator::ContainsAll => BinaryFilterOperator::ContainsAll,
            FilterOperator::And => BinaryFilterOperator::And,
            FilterOperator::Or => BinaryFilterOperator::Or,
            FilterOperator::Unknown => BinaryFilterOperator::Unspecified,
        }
    }
}

/// Target union of the binary filter message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BinaryFilterTarget {
    Property(String),
    SingleTarget {
        on: String,
        target: Box<BinaryFilterTarget>,
    },
    MultiTarget {
        on: String,
        target_collection: String,
        target: Box<BinaryFilterTarget>,
    },
    Count {
        on: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinatesFilter {
    pub latitude: f64,
    pub longitude: f64,
    pub distance: f64,
}

/// Test-value union of the binary filter message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BinaryFilterValue {
    ValueText(String),
    ValueInt(i64),
    ValueBoolean(bool),
    ValueNumber(f64),
    ValueTextArray(Vec<String>),
    ValueIntArray(Vec<i64>),
    ValueBooleanArray(Vec<bool>),
    ValueNumberArray(Vec<f64>),
    ValueGeo(GeoCoordinatesFilter),
}

/// A filter in the binary protocol's message shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryFilter {
    pub operator: BinaryFilterOperator,
    pub filters: Vec<BinaryFilter>,
    pub target: Option<BinaryFilterTarget>,
    pub test_value: Option<BinaryFilterValue>,
}

/// Serialize a filter for the binary protocol.
pub fn to_binary(filter: &FilterValue) -> Result<BinaryFilter> {
    let operator = BinaryFilterOperator::from(filter.operator());
    if operator == BinaryFilterOperator::Unspecified {
        tracing::warn!(
            operator = %filter.operator(),
            "unknown filter operator sent as unspecified"
        );
    }

    if let Some(children) = filter.checked_children()? {
        return Ok(BinaryFilter {
            operator,
            filters: children.iter().map(to_binary).collect::<Result<Vec<_>>>()?,
            target: None,
            test_value: None,
        });
    }

    match filter {
        FilterValue::Leaf { target, value, .. } => Ok(BinaryFilter {
            operator,
            filters: Vec::new(),
            target: Some(binary_target(target)),
            test_value: Some(binary_value(value.literal()?)),
        }),
        FilterValue::Combination { .. } => Err(WeftError::internal(
            "combination filter passed the leaf shape check",
        )),
    }
}

/// Map a filter target onto the binary union, keeping references nested.
pub fn binary_target(target: &FilterTarget) -> BinaryFilterTarget {
    match target {
        FilterTarget::Property(name) => BinaryFilterTarget::Property(name.clone()),
        FilterTarget::Id => BinaryFilterTarget::Property(ID_PATH.to_string()),
        FilterTarget::CreationTime => BinaryFilterTarget::Property(CREATION_TIME_PATH.to_string()),
        FilterTarget::UpdateTime => BinaryFilterTarget::Property(UPDATE_TIME_PATH.to_string()),
        FilterTarget::Count(on) => BinaryFilterTarget::Count { on: on.clone() },
        FilterTarget::SingleTargetRef { on, target } => BinaryFilterTarget::SingleTarget {
            on: on.clone(),
            target: Box::new(binary_target(target)),
        },
        FilterTarget::MultiTargetRef {
            on,
            target_collection,
            target,
        } => BinaryFilterTarget::MultiTarget {
            on: on.clone(),
            target_collection: target_collection.clone(),
            target: Box::new(binary_target(target)),
        },
    }
}

fn binary_value(literal: FilterLiteral) -> BinaryFilterValue {
    match literal {
        FilterLiteral::Text(v) | FilterLiteral::Date(v) => BinaryFilterValue::ValueText(v),
        FilterLiteral::TextArray(v) | FilterLiteral::DateArray(v) => {
            BinaryFilterValue::ValueTextArray(v)
        }
        FilterLiteral::Int(v) => BinaryFilterValue::ValueInt(v),
        FilterLiteral::IntArray(v) => BinaryFilterValue::ValueIntArray(v),
        FilterLiteral::Number(v) => BinaryFilterValue::ValueNumber(v),
        FilterLiteral::NumberArray(v) => BinaryFilterValue::ValueNumberArray(v),
        FilterLiteral::Boolean(v) => BinaryFilterValue::ValueBoolean(v),
        FilterLiteral::BooleanArray(v) => BinaryFilterValue::ValueBooleanArray(v),
        FilterLiteral::GeoRange(range) => BinaryFilterValue::ValueGeo(GeoCoordinatesFilter {
            latitude: range.latitude,
            longitude: range.longitude,
            distance: range.distance,
        }),
    }
}
