//! Cross-reference inputs of a batch object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A managed set of references, optionally into one named collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferenceManager {
    /// Present when the reference property points at several collections.
    pub target_collection: Option<String>,
    pub uuids: Vec<String>,
}

impl ReferenceManager {
    pub fn to<I, S>(uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target_collection: None,
            uuids: uuids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn to_multi_target<I, S>(uuids: I, target_collection: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target_collection: Some(target_collection.into()),
            uuids: uuids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_multi_target(&self) -> bool {
        self.target_collection.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceInput {
    Id(String),
    Ids(Vec<String>),
    Managed(ReferenceManager),
    Mixed(Vec<ReferenceInput>),
}

impl From<&str> for ReferenceInput {
    fn from(id: &str) -> Self {
        ReferenceInput::Id(id.to_string())
    }
}

impl From<String> for ReferenceInput {
    fn from(id: String) -> Self {
        ReferenceInput::Id(id)
    }
}

impl From<Vec<String>> for ReferenceInput {
    fn from(ids: Vec<String>) -> Self {
        ReferenceInput::Ids(ids)
    }
}

impl From<ReferenceManager> for ReferenceInput {
    fn from(manager: ReferenceManager) -> Self {
        ReferenceInput::Managed(manager)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleTargetRefProps {
    pub prop_name: String,
    pub uuids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiTargetRefProps {
    pub prop_name: String,
    pub target_collection: String,
    pub uuids: Vec<String>,
}

/// Reference buckets after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ResolvedReferences {
    pub single_target: Vec<SingleTargetRefProps>,
    pub multi_target: Vec<MultiTargetRefProps>,
}

/// Resolve every reference property into single and multi-target buckets.
///
/// Bare ids merge into one entry per property; managed references with a
/// collection merge per (property, collection). Entries appear in order of
/// first occurrence.
pub(crate) fn resolve_references(
    references: &BTreeMap<String, ReferenceInput>,
) -> ResolvedReferences {
    let mut resolved = ResolvedReferences::default();
    for (property, input) in references {
        let mut single: Vec<String> = Vec::new();
        let mut multi: Vec<(String, Vec<String>)> = Vec::new();
        collect(input, &mut single, &mut multi);

        if !single.is_empty() {
            resolved.single_target.push(SingleTargetRefProps {
                prop_name: property.clone(),
                uuids: single,
            });
        }
        for (collection, uuids) in multi {
            resolved.multi_target.push(MultiTargetRefProps {
                prop_name: property.clone(),
                target_collection: collection,
                uuids,
            });
        }
    }
    resolved
}

fn collect(input: &ReferenceInput, single: &mut Vec<String>, multi: &mut Vec<(String, Vec<String>)>) {
    match input {
        ReferenceInput::Id(id) => single.push(id.clone()),
        ReferenceInput::Ids(ids) => single.extend(ids.iter().cloned()),
        ReferenceInput::Managed(manager) => match &manager.target_collection {
            None => single.extend(manager.uuids.iter().cloned()),
            Some(collection) => {
                match multi.iter_mut().find(|(c, _)| c == collection) {
                    Some((_, uuids)) => uuids.extend(manager.uuids.iter().cloned()),
                    None => multi.push((collection.clone(), manager.uuids.clone())),
                }
            }
        },
        ReferenceInput::Mixed(items) => {
            for item in items {
                collect(item, single, multi);
            }
        }
    }
}
