//! Filter expressions and their textual and binary serializers.

pub mod binary;
pub mod builder;
pub mod textual;
pub mod value;

pub use self::binary::{
    BinaryFilter, BinaryFilterOperator, BinaryFilterTarget, BinaryFilterValue,
    GeoCoordinatesFilter, to_binary,
};
pub use self::builder::{Filter, FilterBuilder, FilterById, FilterByCount, FilterByRef, FilterByTime, Filters};
pub use self::textual::{TextualFilter, TextualValue, to_textual};
pub use self::value::{FilterOperand, FilterOperator, FilterTarget, FilterValue, GeoRange};
