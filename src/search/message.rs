//! Binary protocol search messages.
//!
//! Every field is always serialized so the messages survive bincode framing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::filter::BinaryFilter;
use crate::search::targets::Targets;
use crate::search::vector::VectorForTarget;

/// A complete search request: envelope plus exactly one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub collection: String,
    pub tenant: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub autocut: Option<u32>,
    pub after: Option<String>,
    pub filters: Option<BinaryFilter>,
    pub properties: Option<PropertiesRequest>,
    pub metadata: Option<MetadataRequest>,
    pub rerank: Option<Rerank>,
    pub query: SearchQuery,
}

/// The query section of a [`SearchRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SearchQuery {
    Fetch,
    NearText(NearTextSearch),
    NearVector(NearVectorSearch),
    NearObject(NearObjectSearch),
    NearMedia(NearMediaSearch),
    Bm25(Bm25Search),
    Hybrid(HybridSearch),
}

impl SearchQuery {
    pub fn name(&self) -> &'static str {
        match self {
            SearchQuery::Fetch => "fetch_objects",
            SearchQuery::NearText(_) => "near_text",
            SearchQuery::NearVector(_) => "near_vector",
            SearchQuery::NearObject(_) => "near_object",
            SearchQuery::NearMedia(_) => "near_media",
            SearchQuery::Bm25(_) => "bm25",
            SearchQuery::Hybrid(_) => "hybrid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NearTextMove {
    pub force: f32,
    pub concepts: Vec<String>,
    pub uuids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NearTextSearch {
    pub query: Vec<String>,
    pub certainty: Option<f64>,
    pub distance: Option<f64>,
    pub move_to: Option<NearTextMove>,
    pub move_away: Option<NearTextMove>,
    pub target_vectors: Vec<String>,
    pub targets: Option<Targets>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NearVectorSearch {
    pub vector_bytes: Option<Vec<u8>>,
    pub certainty: Option<f64>,
    pub distance: Option<f64>,
    pub target_vectors: Vec<String>,
    pub targets: Option<Targets>,
    /// One packed vector per target, for servers without per-target records.
    pub vector_per_target: BTreeMap<String, Vec<u8>>,
    pub vector_for_targets: Vec<VectorForTarget>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NearObjectSearch {
    pub id: String,
    pub certainty: Option<f64>,
    pub distance: Option<f64>,
    pub target_vectors: Vec<String>,
    pub targets: Option<Targets>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    Depth,
    Thermal,
    Imu,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Depth => "depth",
            MediaKind::Thermal => "thermal",
            MediaKind::Imu => "imu",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearMediaSearch {
    pub kind: MediaKind,
    /// Base64-encoded media payload.
    pub media: String,
    pub certainty: Option<f64>,
    pub distance: Option<f64>,
    pub target_vectors: Vec<String>,
    pub targets: Option<Targets>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bm25Operator {
    And,
    Or { minimum_match: u32 },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bm25Search {
    pub query: String,
    pub properties: Vec<String>,
    pub search_operator: Option<Bm25Operator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FusionType {
    #[default]
    Unspecified,
    Ranked,
    RelativeScore,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HybridSearch {
    pub query: String,
    pub properties: Vec<String>,
    pub alpha: Option<f32>,
    pub fusion_type: FusionType,
    pub vector_bytes: Option<Vec<u8>>,
    pub vector_distance: Option<f32>,
    pub target_vectors: Vec<String>,
    pub targets: Option<Targets>,
    /// Nested searches never carry their own targets.
    pub near_text: Option<NearTextSearch>,
    pub near_vector: Option<NearVectorSearch>,
}

/// Which properties of the matched objects to return.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertiesRequest {
    pub non_ref_properties: Vec<String>,
    pub ref_properties: Vec<RefPropertiesRequest>,
    pub return_all_nonref_properties: bool,
}

impl PropertiesRequest {
    pub fn all() -> Self {
        Self {
            return_all_nonref_properties: true,
            ..Default::default()
        }
    }

    pub fn with_properties<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            non_ref_properties: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_reference(mut self, reference: RefPropertiesRequest) -> Self {
        self.ref_properties.push(reference);
        self
    }
}

/// Properties to return through a reference, possibly nesting further.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefPropertiesRequest {
    pub reference_property: String,
    pub target_collection: Option<String>,
    pub properties: Box<PropertiesRequest>,
    pub metadata: Option<MetadataRequest>,
}

impl RefPropertiesRequest {
    pub fn new(reference_property: impl Into<String>, properties: PropertiesRequest) -> Self {
        Self {
            reference_property: reference_property.into(),
            target_collection: None,
            properties: Box::new(properties),
            metadata: None,
        }
    }

    pub fn with_target_collection(mut self, collection: impl Into<String>) -> Self {
        self.target_collection = Some(collection.into());
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataRequest) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataRequest {
    pub uuid: bool,
    pub vector: bool,
    pub creation_time_unix: bool,
    pub last_update_time_unix: bool,
    pub distance: bool,
    pub certainty: bool,
    pub score: bool,
    pub explain_score: bool,
    pub is_consistent: bool,
    /// Named vectors to return.
    pub vectors: Vec<String>,
}

impl MetadataRequest {
    pub fn all() -> Self {
        Self {
            uuid: true,
            vector: true,
            creation_time_unix: true,
            last_update_time_unix: true,
            distance: true,
            certainty: true,
            score: true,
            explain_score: true,
            is_consistent: true,
            vectors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rerank {
    pub property: String,
    pub query: Option<String>,
}
