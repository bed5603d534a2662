//! Query vector inputs and their encoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capabilities::{Capabilities, VECTORS_FOR_TARGETS_MIN_VERSION};
use crate::error::{Result, WeftError};
use crate::search::targets::{ResolvedTargets, TargetVectorSpec, resolve_targets};
use crate::wire::f32s_to_bytes;

/// Vectors supplied for one named target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamedVector {
    One(Vec<f32>),
    Many(Vec<Vec<f32>>),
}

impl NamedVector {
    fn vectors(&self) -> Vec<&[f32]> {
        match self {
            NamedVector::One(v) => vec![v.as_slice()],
            NamedVector::Many(vs) => vs.iter().map(Vec::as_slice).collect(),
        }
    }
}

impl From<Vec<f32>> for NamedVector {
    fn from(vector: Vec<f32>) -> Self {
        NamedVector::One(vector)
    }
}

impl From<Vec<Vec<f32>>> for NamedVector {
    fn from(vectors: Vec<Vec<f32>>) -> Self {
        NamedVector::Many(vectors)
    }
}

/// A raw query vector, or vectors keyed by target name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VectorInput {
    Single(Vec<f32>),
    Named(BTreeMap<String, NamedVector>),
}

impl VectorInput {
    pub fn named<I, S, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<NamedVector>,
    {
        VectorInput::Named(
            entries
                .into_iter()
                .map(|(name, vector)| (name.into(), vector.into()))
                .collect(),
        )
    }
}

impl From<Vec<f32>> for VectorInput {
    fn from(vector: Vec<f32>) -> Self {
        VectorInput::Single(vector)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorForTarget {
    pub name: String,
    pub vector_bytes: Vec<u8>,
}

/// Encoded vector fields shared by near-vector and hybrid searches.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct EncodedVectors {
    pub vector_bytes: Option<Vec<u8>>,
    pub vector_per_target: BTreeMap<String, Vec<u8>>,
    pub vector_for_targets: Vec<VectorForTarget>,
    pub resolved: ResolvedTargets,
}

/// Pack `input` and resolve the targets it runs against.
///
/// Named vectors without an explicit target specification search all of
/// their names. `argument` names the user-facing option in error messages.
pub(crate) fn encode_vectors(
    argument: &str,
    input: &VectorInput,
    target: Option<&TargetVectorSpec>,
    capabilities: &Capabilities,
) -> Result<EncodedVectors> {
    match input {
        VectorInput::Single(vector) => {
            if vector.is_empty() {
                return Err(WeftError::invalid_input(format!("{argument} cannot be empty")));
            }
            Ok(EncodedVectors {
                vector_bytes: Some(f32s_to_bytes(vector)),
                resolved: resolve_targets(target, capabilities)?,
                ..Default::default()
            })
        }
        VectorInput::Named(named) => encode_named(argument, named, target, capabilities),
    }
}

fn encode_named(
    argument: &str,
    named: &BTreeMap<String, NamedVector>,
    target: Option<&TargetVectorSpec>,
    capabilities: &Capabilities,
) -> Result<EncodedVectors> {
    if named.is_empty() {
        return Err(WeftError::invalid_input(format!("{argument} cannot be empty")));
    }

    let mut encoded = EncodedVectors::default();
    let mut derived_names = Vec::new();

    for (name, vectors) in named {
        let vectors = vectors.vectors();
        if vectors.is_empty() || vectors.iter().any(|v| v.is_empty()) {
            return Err(WeftError::invalid_input(format!(
                "{argument} for target {name:?} cannot be empty"
            )));
        }

        if capabilities.supports_vectors_for_targets {
            for vector in vectors {
                derived_names.push(name.clone());
                encoded.vector_for_targets.push(VectorForTarget {
                    name: name.clone(),
                    vector_bytes: f32s_to_bytes(vector),
                });
            }
        } else {
            if vectors.len() > 1 {
                return Err(WeftError::unsupported(format!(
                    "multiple vectors for target {name:?} require server version \
                     {VECTORS_FOR_TARGETS_MIN_VERSION} or newer"
                )));
            }
            derived_names.push(name.clone());
            encoded
                .vector_per_target
                .insert(name.clone(), f32s_to_bytes(vectors[0]));
        }
    }

    encoded.resolved = match target {
        Some(spec) => resolve_targets(Some(spec), capabilities)?,
        None => resolve_targets(Some(&TargetVectorSpec::Multi(derived_names)), capabilities)?,
    };
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::bytes_to_f32s;

    #[test]
    fn test_single_vector_packs_and_decodes() {
        let input = VectorInput::from(vec![0.5f32, -1.0, 2.0]);
        let encoded = encode_vectors("vector", &input, None, &Capabilities::default()).unwrap();
        let bytes = encoded.vector_bytes.unwrap();
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_f32s(&bytes).unwrap(), vec![0.5, -1.0, 2.0]);
        assert!(encoded.resolved.is_empty());
    }

    #[test]
    fn test_named_vectors_current_server() {
        let input = VectorInput::named([
            ("body", NamedVector::Many(vec![vec![1.0], vec![2.0]])),
            ("title", NamedVector::One(vec![3.0])),
        ]);
        let encoded = encode_vectors("vector", &input, None, &Capabilities::default()).unwrap();

        let names: Vec<&str> = encoded
            .vector_for_targets
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["body", "body", "title"]);
        assert!(encoded.vector_per_target.is_empty());
        assert_eq!(
            encoded.resolved.targets.unwrap().target_vectors,
            vec!["body", "body", "title"]
        );
    }

    #[test]
    fn test_named_vectors_legacy_server() {
        let input = VectorInput::named([("title", vec![1.0f32, 2.0])]);
        let encoded = encode_vectors("vector", &input, None, &Capabilities::legacy()).unwrap();
        assert_eq!(
            bytes_to_f32s(&encoded.vector_per_target["title"]).unwrap(),
            vec![1.0, 2.0]
        );
        assert_eq!(encoded.resolved.target_vectors, vec!["title"]);

        let many = VectorInput::named([("title", vec![vec![1.0f32], vec![2.0]])]);
        let err = encode_vectors("vector", &many, None, &Capabilities::legacy()).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_empty_inputs_name_the_argument() {
        let err = encode_vectors("vector", &VectorInput::Single(vec![]), None, &Capabilities::default())
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("vector"));

        let err = encode_vectors(
            "near_vector",
            &VectorInput::Named(BTreeMap::new()),
            None,
            &Capabilities::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("near_vector"));
    }

    #[test]
    fn test_explicit_target_wins_over_names() {
        let input = VectorInput::named([("a", vec![1.0f32]), ("b", vec![2.0])]);
        let spec = TargetVectorSpec::sum(["a", "b"]);
        let encoded = encode_vectors("vector", &input, Some(&spec), &Capabilities::default()).unwrap();
        let targets = encoded.resolved.targets.unwrap();
        assert!(targets.combination.is_some());
    }
}
