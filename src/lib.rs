//! # Weft
//!
//! Client-side serialization for a vector database's two wire protocols.
//!
//! ## Features
//!
//! - Typed filter expressions with textual (JSON/GraphQL) and binary serializers
//! - Search request serialization with version-aware target vector handling
//! - Cooperative, order-preserving batch object encoding on tokio
//!
//! ```
//! use weft::prelude::*;
//!
//! let filter = Filter::by_property("title").like("rust*").unwrap();
//! let textual = to_textual(&filter).unwrap();
//! assert_eq!(textual.path, Some(vec!["title".to_string()]));
//! ```

pub mod batch;
pub mod capabilities;
pub mod cli;
pub mod error;
pub mod field;
pub mod filter;
pub mod search;
pub mod wire;

pub mod prelude {
    pub use crate::batch::{
        BatchEncoder, BatchEncoderConfig, BatchObject, EncodedBatch, ReferenceInput,
        ReferenceManager, encode_properties,
    };
    pub use crate::capabilities::Capabilities;
    pub use crate::error::{Result, WeftError};
    pub use crate::field::{ValueKind, WeaviateField, classify};
    pub use crate::filter::{Filter, FilterValue, Filters, to_binary, to_textual};
    pub use crate::search::{
        HybridOptions, NearTextOptions, NearVectorOptions, SearchEnvelope, SearchSerializer,
        TargetVectorSpec, VectorInput,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
