//! User-facing search options.

use serde::{Deserialize, Serialize};

use crate::filter::FilterValue;
use crate::search::message::{
    Bm25Operator, FusionType, MediaKind, MetadataRequest, PropertiesRequest, Rerank,
};
use crate::search::targets::TargetVectorSpec;
use crate::search::vector::VectorInput;

/// Options shared by every search kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchEnvelope {
    pub collection: String,
    pub tenant: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub autocut: Option<u32>,
    /// Cursor for id-ordered pagination.
    pub after: Option<String>,
    pub filters: Option<FilterValue>,
    pub return_properties: Option<PropertiesRequest>,
    pub return_metadata: Option<MetadataRequest>,
    pub rerank: Option<Rerank>,
}

impl SearchEnvelope {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_autocut(mut self, autocut: u32) -> Self {
        self.autocut = Some(autocut);
        self
    }

    pub fn with_after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }

    pub fn with_filters(mut self, filters: FilterValue) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_properties(mut self, properties: PropertiesRequest) -> Self {
        self.return_properties = Some(properties);
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataRequest) -> Self {
        self.return_metadata = Some(metadata);
        self
    }

    pub fn with_rerank(mut self, property: impl Into<String>, query: Option<String>) -> Self {
        self.rerank = Some(Rerank {
            property: property.into(),
            query,
        });
        self
    }
}

/// Concept shift applied to a near-text query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Move {
    pub force: f32,
    pub concepts: Vec<String>,
    /// Object ids whose vectors pull or push the query.
    pub objects: Vec<String>,
}

impl Move {
    pub fn new(force: f32) -> Self {
        Self {
            force,
            ..Default::default()
        }
    }

    pub fn concepts<I, S>(mut self, concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.concepts.extend(concepts.into_iter().map(Into::into));
        self
    }

    pub fn objects<I, S>(mut self, objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objects.extend(objects.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NearTextOptions {
    pub query: Vec<String>,
    pub certainty: Option<f64>,
    pub distance: Option<f64>,
    pub move_to: Option<Move>,
    pub move_away: Option<Move>,
    pub target_vector: Option<TargetVectorSpec>,
}

impl NearTextOptions {
    pub fn new<I, S>(query: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            query: query.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearVectorOptions {
    pub vector: VectorInput,
    pub certainty: Option<f64>,
    pub distance: Option<f64>,
    pub target_vector: Option<TargetVectorSpec>,
}

impl NearVectorOptions {
    pub fn new(vector: impl Into<VectorInput>) -> Self {
        Self {
            vector: vector.into(),
            certainty: None,
            distance: None,
            target_vector: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NearObjectOptions {
    pub id: String,
    pub certainty: Option<f64>,
    pub distance: Option<f64>,
    pub target_vector: Option<TargetVectorSpec>,
}

impl NearObjectOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearMediaOptions {
    pub kind: MediaKind,
    /// Base64-encoded payload.
    pub media: String,
    pub certainty: Option<f64>,
    pub distance: Option<f64>,
    pub target_vector: Option<TargetVectorSpec>,
}

impl NearMediaOptions {
    pub fn new(kind: MediaKind, media: impl Into<String>) -> Self {
        Self {
            kind,
            media: media.into(),
            certainty: None,
            distance: None,
            target_vector: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bm25Options {
    pub query: String,
    pub properties: Vec<String>,
    pub operator: Option<Bm25Operator>,
}

impl Bm25Options {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

/// Vector side of a hybrid search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HybridVector {
    Raw(VectorInput),
    NearText(NearTextOptions),
    NearVector(NearVectorOptions),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HybridOptions {
    pub query: String,
    /// Balance between keyword (0.0) and vector (1.0) scores.
    pub alpha: Option<f32>,
    pub vector: Option<HybridVector>,
    pub properties: Vec<String>,
    pub fusion_type: FusionType,
    pub max_vector_distance: Option<f32>,
    pub target_vector: Option<TargetVectorSpec>,
}

impl HybridOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}
