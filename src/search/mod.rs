//! Search request serialization for the binary protocol.

pub mod message;
pub mod options;
pub mod serializer;
pub mod targets;
pub mod vector;

pub use self::message::{
    Bm25Operator, Bm25Search, FusionType, HybridSearch, MediaKind, MetadataRequest,
    NearMediaSearch, NearObjectSearch, NearTextMove, NearTextSearch, NearVectorSearch,
    PropertiesRequest, RefPropertiesRequest, Rerank, SearchQuery, SearchRequest,
};
pub use self::options::{
    Bm25Options, HybridOptions, HybridVector, Move, NearMediaOptions, NearObjectOptions,
    NearTextOptions, NearVectorOptions, SearchEnvelope,
};
pub use self::serializer::SearchSerializer;
pub use self::targets::{
    BinaryCombinationMethod, CombinationMethod, ResolvedTargets, TargetVectorSpec, TargetWeight,
    Targets, WeightForTarget, resolve_targets,
};
pub use self::vector::{NamedVector, VectorForTarget, VectorInput};
