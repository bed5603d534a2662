//! User-facing filter combinators.
//!
//! ```
//! use weft::filter::{Filter, Filters};
//!
//! # fn main() -> weft::error::Result<()> {
//! let filter = Filters::and([
//!     Filter::by_property("title").like("*rust*")?,
//!     Filter::by_ref_multi_target("writtenBy", "Author")
//!         .by_property("name")
//!         .equal("Ferris")?,
//! ])?;
//! assert_eq!(filter.leaf_count(), 2);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};

use crate::error::{Result, WeftError};
use crate::field::{ValueKind, WeaviateField, classify};
use crate::filter::value::{
    FilterOperand, FilterOperator, FilterTarget, FilterValue, GeoRange, check_finite,
};

/// Entry points for building leaf filters.
pub struct Filter;

impl Filter {
    /// Filter on a property of the object.
    pub fn by_property(name: impl Into<String>) -> FilterBuilder {
        FilterBuilder {
            target: FilterTarget::Property(name.into()),
        }
    }

    /// Filter on the object's UUID.
    pub fn by_id() -> FilterById {
        FilterById {
            target: FilterTarget::Id,
        }
    }

    /// Filter on the creation timestamp.
    pub fn by_creation_time() -> FilterByTime {
        FilterByTime {
            target: FilterTarget::CreationTime,
        }
    }

    /// Filter on the last-update timestamp.
    pub fn by_update_time() -> FilterByTime {
        FilterByTime {
            target: FilterTarget::UpdateTime,
        }
    }

    /// Filter on the number of objects a reference property points to.
    pub fn by_ref_count(link_on: impl Into<String>) -> FilterByCount {
        FilterByCount {
            target: FilterTarget::Count(link_on.into()),
        }
    }

    /// Follow a reference; the server resolves the target collection.
    pub fn by_ref(link_on: impl Into<String>) -> FilterByRef {
        FilterByRef { links: Vec::new() }.by_ref(link_on)
    }

    /// Follow a reference into a named collection.
    pub fn by_ref_multi_target(
        link_on: impl Into<String>,
        target_collection: impl Into<String>,
    ) -> FilterByRef {
        FilterByRef { links: Vec::new() }.by_ref_multi_target(link_on, target_collection)
    }
}

/// Combinators joining filters with `And` / `Or`.
pub struct Filters;

impl Filters {
    /// All of `filters` must match.
    pub fn and(filters: impl IntoIterator<Item = FilterValue>) -> Result<FilterValue> {
        combine(FilterOperator::And, filters)
    }

    /// At least one of `filters` must match.
    pub fn or(filters: impl IntoIterator<Item = FilterValue>) -> Result<FilterValue> {
        combine(FilterOperator::Or, filters)
    }

    pub fn all_of(filters: impl IntoIterator<Item = FilterValue>) -> Result<FilterValue> {
        Self::and(filters)
    }

    pub fn any_of(filters: impl IntoIterator<Item = FilterValue>) -> Result<FilterValue> {
        Self::or(filters)
    }
}

fn combine(
    operator: FilterOperator,
    filters: impl IntoIterator<Item = FilterValue>,
) -> Result<FilterValue> {
    let filters: Vec<FilterValue> = filters.into_iter().collect();
    if filters.is_empty() {
        return Err(WeftError::invalid_input(format!(
            "{operator} filter requires at least one operand"
        )));
    }
    Ok(FilterValue::Combination { operator, filters })
}

fn leaf(operator: FilterOperator, target: &FilterTarget, value: WeaviateField) -> FilterValue {
    FilterValue::Leaf {
        operator,
        target: target.clone(),
        value: FilterOperand::Field(value),
    }
}

fn comparable(operator: FilterOperator, value: &WeaviateField) -> Result<()> {
    check_finite(value)?;
    match classify(value) {
        ValueKind::Text
        | ValueKind::TextArray
        | ValueKind::Int
        | ValueKind::IntArray
        | ValueKind::Float
        | ValueKind::FloatArray
        | ValueKind::Boolean
        | ValueKind::BooleanArray
        | ValueKind::Date
        | ValueKind::DateArray => Ok(()),
        kind => Err(WeftError::invalid_input(format!(
            "{operator} cannot compare against a {kind} value"
        ))),
    }
}

fn sequence(operator: FilterOperator, value: &WeaviateField) -> Result<()> {
    check_finite(value)?;
    match classify(value) {
        ValueKind::TextArray
        | ValueKind::IntArray
        | ValueKind::FloatArray
        | ValueKind::BooleanArray
        | ValueKind::DateArray => Ok(()),
        ValueKind::EmptyList => Err(WeftError::invalid_input(format!(
            "{operator} requires at least one value"
        ))),
        kind => Err(WeftError::invalid_input(format!(
            "{operator} requires a sequence of values, got {kind}"
        ))),
    }
}

/// Builds leaf filters against a property.
#[derive(Debug, Clone)]
pub struct FilterBuilder {
    target: FilterTarget,
}

impl FilterBuilder {
    pub fn target(&self) -> &FilterTarget {
        &self.target
    }

    fn compare(&self, operator: FilterOperator, value: WeaviateField) -> Result<FilterValue> {
        comparable(operator, &value)?;
        Ok(leaf(operator, &self.target, value))
    }

    pub fn equal(&self, value: impl Into<WeaviateField>) -> Result<FilterValue> {
        self.compare(FilterOperator::Equal, value.into())
    }

    pub fn not_equal(&self, value: impl Into<WeaviateField>) -> Result<FilterValue> {
        self.compare(FilterOperator::NotEqual, value.into())
    }

    pub fn less_than(&self, value: impl Into<WeaviateField>) -> Result<FilterValue> {
        self.compare(FilterOperator::LessThan, value.into())
    }

    pub fn less_or_equal(&self, value: impl Into<WeaviateField>) -> Result<FilterValue> {
        self.compare(FilterOperator::LessThanEqual, value.into())
    }

    pub fn greater_than(&self, value: impl Into<WeaviateField>) -> Result<FilterValue> {
        self.compare(FilterOperator::GreaterThan, value.into())
    }

    pub fn greater_or_equal(&self, value: impl Into<WeaviateField>) -> Result<FilterValue> {
        self.compare(FilterOperator::GreaterThanEqual, value.into())
    }

    /// Wildcard text match (`?` one character, `*` any run of characters).
    pub fn like(&self, value: impl Into<WeaviateField>) -> Result<FilterValue> {
        let value = value.into();
        match classify(&value) {
            ValueKind::Text => Ok(leaf(FilterOperator::Like, &self.target, value)),
            kind => Err(WeftError::invalid_input(format!(
                "Like only accepts text values, got {kind}"
            ))),
        }
    }

    pub fn is_null(&self, is_null: bool) -> FilterValue {
        leaf(FilterOperator::IsNull, &self.target, WeaviateField::Boolean(is_null))
    }

    pub fn contains_any(&self, values: impl Into<WeaviateField>) -> Result<FilterValue> {
        let values = values.into();
        sequence(FilterOperator::ContainsAny, &values)?;
        Ok(leaf(FilterOperator::ContainsAny, &self.target, values))
    }

    pub fn contains_all(&self, values: impl Into<WeaviateField>) -> Result<FilterValue> {
        let values = values.into();
        sequence(FilterOperator::ContainsAll, &values)?;
        Ok(leaf(FilterOperator::ContainsAll, &self.target, values))
    }

    pub fn within_geo_range(&self, range: GeoRange) -> Result<FilterValue> {
        range.validate()?;
        Ok(FilterValue::Leaf {
            operator: FilterOperator::WithinGeoRange,
            target: self.target.clone(),
            value: FilterOperand::GeoRange(range),
        })
    }
}

/// Builds leaf filters against the object UUID.
#[derive(Debug, Clone)]
pub struct FilterById {
    target: FilterTarget,
}

fn parse_uuid(id: &str) -> Result<String> {
    uuid::Uuid::parse_str(id)
        .map(|_| id.to_string())
        .map_err(|e| WeftError::invalid_input(format!("{id:?} is not a valid UUID: {e}")))
}

impl FilterById {
    pub fn equal(&self, id: &str) -> Result<FilterValue> {
        Ok(leaf(FilterOperator::Equal, &self.target, WeaviateField::Text(parse_uuid(id)?)))
    }

    pub fn not_equal(&self, id: &str) -> Result<FilterValue> {
        Ok(leaf(FilterOperator::NotEqual, &self.target, WeaviateField::Text(parse_uuid(id)?)))
    }

    pub fn contains_any<I, S>(&self, ids: I) -> Result<FilterValue>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = ids
            .into_iter()
            .map(|id| parse_uuid(id.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        if ids.is_empty() {
            return Err(WeftError::invalid_input("ContainsAny requires at least one id"));
        }
        Ok(leaf(FilterOperator::ContainsAny, &self.target, WeaviateField::TextArray(ids)))
    }
}

/// Builds leaf filters against a creation or update timestamp.
#[derive(Debug, Clone)]
pub struct FilterByTime {
    target: FilterTarget,
}

impl FilterByTime {
    pub fn equal(&self, at: DateTime<Utc>) -> FilterValue {
        leaf(FilterOperator::Equal, &self.target, WeaviateField::Date(at))
    }

    pub fn not_equal(&self, at: DateTime<Utc>) -> FilterValue {
        leaf(FilterOperator::NotEqual, &self.target, WeaviateField::Date(at))
    }

    pub fn less_than(&self, at: DateTime<Utc>) -> FilterValue {
        leaf(FilterOperator::LessThan, &self.target, WeaviateField::Date(at))
    }

    pub fn less_or_equal(&self, at: DateTime<Utc>) -> FilterValue {
        leaf(FilterOperator::LessThanEqual, &self.target, WeaviateField::Date(at))
    }

    pub fn greater_than(&self, at: DateTime<Utc>) -> FilterValue {
        leaf(FilterOperator::GreaterThan, &self.target, WeaviateField::Date(at))
    }

    pub fn greater_or_equal(&self, at: DateTime<Utc>) -> FilterValue {
        leaf(FilterOperator::GreaterThanEqual, &self.target, WeaviateField::Date(at))
    }

    pub fn contains_any(&self, at: Vec<DateTime<Utc>>) -> Result<FilterValue> {
        let values = WeaviateField::DateArray(at);
        sequence(FilterOperator::ContainsAny, &values)?;
        Ok(leaf(FilterOperator::ContainsAny, &self.target, values))
    }
}

/// Builds leaf filters against a reference count.
#[derive(Debug, Clone)]
pub struct FilterByCount {
    target: FilterTarget,
}

impl FilterByCount {
    pub fn equal(&self, count: i64) -> FilterValue {
        leaf(FilterOperator::Equal, &self.target, WeaviateField::Int(count))
    }

    pub fn not_equal(&self, count: i64) -> FilterValue {
        leaf(FilterOperator::NotEqual, &self.target, WeaviateField::Int(count))
    }

    pub fn less_than(&self, count: i64) -> FilterValue {
        leaf(FilterOperator::LessThan, &self.target, WeaviateField::Int(count))
    }

    pub fn less_or_equal(&self, count: i64) -> FilterValue {
        leaf(FilterOperator::LessThanEqual, &self.target, WeaviateField::Int(count))
    }

    pub fn greater_than(&self, count: i64) -> FilterValue {
        leaf(FilterOperator::GreaterThan, &self.target, WeaviateField::Int(count))
    }

    pub fn greater_or_equal(&self, count: i64) -> FilterValue {
        leaf(FilterOperator::GreaterThanEqual, &self.target, WeaviateField::Int(count))
    }
}

#[derive(Debug, Clone)]
enum RefLink {
    Single(String),
    Multi { on: String, target_collection: String },
}

/// A chain of references to follow before the terminal comparison.
#[derive(Debug, Clone)]
pub struct FilterByRef {
    links: Vec<RefLink>,
}

impl FilterByRef {
    pub fn by_ref(mut self, link_on: impl Into<String>) -> Self {
        self.links.push(RefLink::Single(link_on.into()));
        self
    }

    pub fn by_ref_multi_target(
        mut self,
        link_on: impl Into<String>,
        target_collection: impl Into<String>,
    ) -> Self {
        self.links.push(RefLink::Multi {
            on: link_on.into(),
            target_collection: target_collection.into(),
        });
        self
    }

    /// Nest `innermost` inside every link, outermost link first.
    fn wrap(&self, innermost: FilterTarget) -> FilterTarget {
        self.links.iter().rev().fold(innermost, |target, link| match link {
            RefLink::Single(on) => FilterTarget::single_target_ref(on.clone(), target),
            RefLink::Multi {
                on,
                target_collection,
            } => FilterTarget::multi_target_ref(on.clone(), target_collection.clone(), target),
        })
    }

    pub fn by_property(&self, name: impl Into<String>) -> FilterBuilder {
        FilterBuilder {
            target: self.wrap(FilterTarget::Property(name.into())),
        }
    }

    pub fn by_id(&self) -> FilterById {
        FilterById {
            target: self.wrap(FilterTarget::Id),
        }
    }

    pub fn by_creation_time(&self) -> FilterByTime {
        FilterByTime {
            target: self.wrap(FilterTarget::CreationTime),
        }
    }

    pub fn by_update_time(&self) -> FilterByTime {
        FilterByTime {
            target: self.wrap(FilterTarget::UpdateTime),
        }
    }

    pub fn by_ref_count(&self, link_on: impl Into<String>) -> FilterByCount {
        FilterByCount {
            target: self.wrap(FilterTarget::Count(link_on.into())),
        }
    }
}
