//! Filter expression tree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WeftError};
use crate::field::{ValueKind, WeaviateField, as_integral, classify, format_date};

/// Comparison and combination operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    Like,
    WithinGeoRange,
    IsNull,
    ContainsAny,
    ContainsAll,
    And,
    Or,
    /// An operator name this version does not recognize.
    #[serde(other)]
    Unknown,
}

impl FilterOperator {
    /// The operator name used by both protocols.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Equal => "Equal",
            FilterOperator::NotEqual => "NotEqual",
            FilterOperator::GreaterThan => "GreaterThan",
            FilterOperator::GreaterThanEqual => "GreaterThanEqual",
            FilterOperator::LessThan => "LessThan",
            FilterOperator::LessThanEqual => "LessThanEqual",
            FilterOperator::Like => "Like",
            FilterOperator::WithinGeoRange => "WithinGeoRange",
            FilterOperator::IsNull => "IsNull",
            FilterOperator::ContainsAny => "ContainsAny",
            FilterOperator::ContainsAll => "ContainsAll",
            FilterOperator::And => "And",
            FilterOperator::Or => "Or",
            FilterOperator::Unknown => "Unknown",
        }
    }

    pub fn is_combination(self) -> bool {
        matches!(self, FilterOperator::And | FilterOperator::Or)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a leaf filter compares against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterTarget {
    /// A property of the object itself.
    Property(String),
    /// The number of objects a reference property points to.
    Count(String),
    /// The object's UUID.
    Id,
    CreationTime,
    UpdateTime,
    /// Follow a reference whose target collection the server resolves.
    SingleTargetRef {
        on: String,
        target: Box<FilterTarget>,
    },
    /// Follow a reference into an explicitly named collection.
    MultiTargetRef {
        on: String,
        target_collection: String,
        target: Box<FilterTarget>,
    },
}

impl FilterTarget {
    pub fn property(name: impl Into<String>) -> Self {
        FilterTarget::Property(name.into())
    }

    pub fn single_target_ref(on: impl Into<String>, target: FilterTarget) -> Self {
        FilterTarget::SingleTargetRef {
            on: on.into(),
            target: Box::new(target),
        }
    }

    pub fn multi_target_ref(
        on: impl Into<String>,
        target_collection: impl Into<String>,
        target: FilterTarget,
    ) -> Self {
        FilterTarget::MultiTargetRef {
            on: on.into(),
            target_collection: target_collection.into(),
            target: Box::new(target),
        }
    }

    /// The innermost target reached by following references.
    pub fn leaf(&self) -> &FilterTarget {
        match self {
            FilterTarget::SingleTargetRef { target, .. }
            | FilterTarget::MultiTargetRef { target, .. } => target.leaf(),
            other => other,
        }
    }
}

/// A geo-range filter value: everything within `distance` metres of a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoRange {
    pub latitude: f64,
    pub longitude: f64,
    /// Maximum distance in metres.
    pub distance: f64,
}

impl GeoRange {
    pub fn new(latitude: f64, longitude: f64, distance: f64) -> Result<Self> {
        let range = GeoRange {
            latitude,
            longitude,
            distance,
        };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(WeftError::invalid_input(format!(
                "withinGeoRange latitude {} must be between -90 and 90",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(WeftError::invalid_input(format!(
                "withinGeoRange longitude {} must be between -180 and 180",
                self.longitude
            )));
        }
        if !self.distance.is_finite() || self.distance < 0.0 {
            return Err(WeftError::invalid_input(format!(
                "withinGeoRange distance {} must be a non-negative number",
                self.distance
            )));
        }
        Ok(())
    }
}

/// The right-hand side of a leaf filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterOperand {
    Field(WeaviateField),
    GeoRange(GeoRange),
}

/// One node of a filter expression.
///
/// A leaf compares a target against a value; a combination joins one or more
/// child filters with `And` or `Or`. Children keep the order they were given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    Leaf {
        operator: FilterOperator,
        target: FilterTarget,
        value: FilterOperand,
    },
    Combination {
        operator: FilterOperator,
        filters: Vec<FilterValue>,
    },
}

impl FilterValue {
    pub fn operator(&self) -> FilterOperator {
        match self {
            FilterValue::Leaf { operator, .. } | FilterValue::Combination { operator, .. } => {
                *operator
            }
        }
    }

    pub fn target(&self) -> Option<&FilterTarget> {
        match self {
            FilterValue::Leaf { target, .. } => Some(target),
            FilterValue::Combination { .. } => None,
        }
    }

    pub fn value(&self) -> Option<&FilterOperand> {
        match self {
            FilterValue::Leaf { value, .. } => Some(value),
            FilterValue::Combination { .. } => None,
        }
    }

    pub fn filters(&self) -> &[FilterValue] {
        match self {
            FilterValue::Leaf { .. } => &[],
            FilterValue::Combination { filters, .. } => filters,
        }
    }

    /// Number of leaf comparisons in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            FilterValue::Leaf { .. } => 1,
            FilterValue::Combination { filters, .. } => {
                filters.iter().map(FilterValue::leaf_count).sum()
            }
        }
    }
}

/// A leaf value normalized to one of the wire value types.
///
/// Dates are already rendered as ISO-8601 text; both protocols carry them as strings.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FilterLiteral {
    Text(String),
    TextArray(Vec<String>),
    Int(i64),
    IntArray(Vec<i64>),
    Number(f64),
    NumberArray(Vec<f64>),
    Boolean(bool),
    BooleanArray(Vec<bool>),
    Date(String),
    DateArray(Vec<String>),
    GeoRange(GeoRange),
}

/// Reject NaN and infinite numbers, which the textual protocol cannot carry.
pub(crate) fn check_finite(field: &WeaviateField) -> Result<()> {
    let finite = match field {
        WeaviateField::Number(n) => n.is_finite(),
        WeaviateField::NumberArray(values) => values.iter().all(|n| n.is_finite()),
        _ => true,
    };
    if finite {
        Ok(())
    } else {
        Err(WeftError::invalid_input(
            "filter numbers must be finite, got NaN or infinity",
        ))
    }
}

impl FilterOperand {
    pub(crate) fn literal(&self) -> Result<FilterLiteral> {
        let field = match self {
            FilterOperand::GeoRange(range) => {
                range.validate()?;
                return Ok(FilterLiteral::GeoRange(*range));
            }
            FilterOperand::Field(field) => field,
        };
        check_finite(field)?;

        let literal = match (classify(field), field) {
            (ValueKind::Text, WeaviateField::Text(s)) => FilterLiteral::Text(s.clone()),
            (ValueKind::TextArray, WeaviateField::TextArray(v)) => FilterLiteral::TextArray(v.clone()),
            (ValueKind::Int, WeaviateField::Int(i)) => FilterLiteral::Int(*i),
            (ValueKind::Int, WeaviateField::Number(n)) => match as_integral(*n) {
                Some(i) => FilterLiteral::Int(i),
                None => FilterLiteral::Number(*n),
            },
            (ValueKind::IntArray, WeaviateField::IntArray(v)) => FilterLiteral::IntArray(v.clone()),
            (ValueKind::IntArray, WeaviateField::NumberArray(v)) => {
                FilterLiteral::IntArray(v.iter().filter_map(|n| as_integral(*n)).collect())
            }
            (ValueKind::Float, WeaviateField::Number(n)) => FilterLiteral::Number(*n),
            (ValueKind::FloatArray, WeaviateField::NumberArray(v)) => {
                FilterLiteral::NumberArray(v.clone())
            }
            (ValueKind::Boolean, WeaviateField::Boolean(b)) => FilterLiteral::Boolean(*b),
            (ValueKind::BooleanArray, WeaviateField::BooleanArray(v)) => {
                FilterLiteral::BooleanArray(v.clone())
            }
            (ValueKind::Date, WeaviateField::Date(d)) => FilterLiteral::Date(format_date(d)),
            (ValueKind::DateArray, WeaviateField::DateArray(v)) => {
                FilterLiteral::DateArray(v.iter().map(format_date).collect())
            }
            (kind, _) => {
                return Err(WeftError::invalid_input(format!(
                    "invalid filter value type: {kind}"
                )));
            }
        };
        Ok(literal)
    }
}

impl FilterValue {
    /// Check the leaf/combination shape, returning the child filters of a combination.
    pub(crate) fn checked_children(&self) -> Result<Option<&[FilterValue]>> {
        match self {
            FilterValue::Leaf { operator, .. } if operator.is_combination() => Err(
                WeftError::invalid_input(format!("{operator} filter must have operands, not a value")),
            ),
            FilterValue::Leaf { .. } => Ok(None),
            FilterValue::Combination { operator, filters } => {
                if !operator.is_combination() && *operator != FilterOperator::Unknown {
                    return Err(WeftError::invalid_input(format!(
                        "{operator} filter must have a target and value, not operands"
                    )));
                }
                if filters.is_empty() {
                    return Err(WeftError::invalid_input(format!(
                        "{operator} filter requires at least one operand"
                    )));
                }
                Ok(Some(filters))
            }
        }
    }
}
