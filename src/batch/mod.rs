//! Batch object encoding for bulk writes.

pub mod encoder;
pub mod object;
pub mod properties;
pub mod reference;

pub use self::encoder::{
    BatchEncoder, BatchEncoderConfig, EncodedBatch, EncodedObject, IdGenerator, UuidV4Generator,
};
pub use self::object::{
    BatchCorrelation, BatchObject, BinaryBatchObject, ObjectVectors, encode_object,
};
pub use self::properties::{
    BinaryBatchProperties, BooleanArrayProperties, IntArrayProperties, NestedProperties,
    NumberArrayProperties, ObjectArrayProperties, ObjectProperties, StructValue,
    TextArrayProperties, encode_properties,
};
pub use self::reference::{
    MultiTargetRefProps, ReferenceInput, ReferenceManager, SingleTargetRefProps,
};
