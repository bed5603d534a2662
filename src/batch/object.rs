//! Batch objects and their binary form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::batch::properties::{BinaryBatchProperties, encode_properties};
use crate::batch::reference::ReferenceInput;
use crate::field::WeaviateField;
use crate::search::vector::VectorForTarget;
use crate::wire::f32s_to_bytes;

/// Vectors attached to an object on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectVectors {
    Single(Vec<f32>),
    Named(BTreeMap<String, Vec<f32>>),
}

/// One pending write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchObject {
    /// Generated at encode time when absent.
    pub id: Option<String>,
    pub properties: BTreeMap<String, WeaviateField>,
    pub references: BTreeMap<String, ReferenceInput>,
    pub vectors: Option<ObjectVectors>,
}

impl BatchObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<WeaviateField>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_reference(
        mut self,
        name: impl Into<String>,
        reference: impl Into<ReferenceInput>,
    ) -> Self {
        self.references.insert(name.into(), reference.into());
        self
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vectors = Some(ObjectVectors::Single(vector));
        self
    }

    pub fn with_named_vector(mut self, name: impl Into<String>, vector: Vec<f32>) -> Self {
        match &mut self.vectors {
            Some(ObjectVectors::Named(named)) => {
                named.insert(name.into(), vector);
            }
            _ => {
                let mut named = BTreeMap::new();
                named.insert(name.into(), vector);
                self.vectors = Some(ObjectVectors::Named(named));
            }
        }
        self
    }
}

/// The binary batch object message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryBatchObject {
    pub collection: String,
    pub uuid: String,
    pub properties: BinaryBatchProperties,
    pub vector_bytes: Option<Vec<u8>>,
    pub vectors: Vec<VectorForTarget>,
    pub tenant: Option<String>,
}

/// Links an encoded object back to its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCorrelation {
    pub index: usize,
    pub uuid: String,
    pub object: BatchObject,
}

/// Encode one object under an already assigned `uuid`.
pub fn encode_object(
    object: &BatchObject,
    collection: &str,
    tenant: Option<&str>,
    uuid: &str,
) -> BinaryBatchObject {
    let (vector_bytes, vectors) = match &object.vectors {
        None => (None, Vec::new()),
        Some(ObjectVectors::Single(vector)) => (Some(f32s_to_bytes(vector)), Vec::new()),
        Some(ObjectVectors::Named(named)) => (
            None,
            named
                .iter()
                .map(|(name, vector)| VectorForTarget {
                    name: name.clone(),
                    vector_bytes: f32s_to_bytes(vector),
                })
                .collect(),
        ),
    };

    BinaryBatchObject {
        collection: collection.to_string(),
        uuid: uuid.to_string(),
        properties: encode_properties(&object.properties, &object.references),
        vector_bytes,
        vectors,
        tenant: tenant.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::bytes_to_f32s;

    #[test]
    fn test_encode_object_with_single_vector() {
        let object = BatchObject::new()
            .with_property("title", "Dune")
            .with_vector(vec![0.25, 0.5]);
        let encoded = encode_object(&object, "Book", Some("tenantA"), "id-1");
        assert_eq!(encoded.collection, "Book");
        assert_eq!(encoded.uuid, "id-1");
        assert_eq!(encoded.tenant.as_deref(), Some("tenantA"));
        assert_eq!(
            bytes_to_f32s(encoded.vector_bytes.as_deref().unwrap()).unwrap(),
            vec![0.25, 0.5]
        );
        assert!(encoded.vectors.is_empty());
        assert_eq!(encoded.properties.len(), 1);
    }

    #[test]
    fn test_encode_object_with_named_vectors() {
        let object = BatchObject::new()
            .with_named_vector("title", vec![1.0])
            .with_named_vector("body", vec![2.0, 3.0]);
        let encoded = encode_object(&object, "Book", None, "id-2");
        assert!(encoded.vector_bytes.is_none());
        let names: Vec<&str> = encoded.vectors.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["body", "title"]);
        assert_eq!(encoded.vectors[0].vector_bytes.len(), 8);
    }
}
