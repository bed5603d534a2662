//! Target vector resolution.
//!
//! A collection can hold several named vectors. A search names the ones to
//! use, and optionally how their scores are joined. Older servers only
//! understand a flat list of names; newer ones take a structured [`Targets`]
//! message.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capabilities::{Capabilities, WEIGHTS_FOR_TARGETS_MIN_VERSION};
use crate::error::{Result, WeftError};

/// Algorithm used to merge scores across target vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombinationMethod {
    Sum,
    Average,
    Minimum,
    RelativeScore,
    ManualWeights,
}

/// Weight of one target: a single number, or several for repeated runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetWeight {
    Single(f32),
    Multi(Vec<f32>),
}

impl From<f32> for TargetWeight {
    fn from(weight: f32) -> Self {
        TargetWeight::Single(weight)
    }
}

impl From<Vec<f32>> for TargetWeight {
    fn from(weights: Vec<f32>) -> Self {
        TargetWeight::Multi(weights)
    }
}

/// Which named vectors a search runs against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetVectorSpec {
    Single(String),
    Multi(Vec<String>),
    WeightedJoin {
        names: Vec<String>,
        weights: BTreeMap<String, TargetWeight>,
        combination: CombinationMethod,
    },
}

impl TargetVectorSpec {
    pub fn single(name: impl Into<String>) -> Self {
        TargetVectorSpec::Single(name.into())
    }

    pub fn multi<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TargetVectorSpec::Multi(names.into_iter().map(Into::into).collect())
    }

    fn join<I, S>(names: I, combination: CombinationMethod) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TargetVectorSpec::WeightedJoin {
            names: names.into_iter().map(Into::into).collect(),
            weights: BTreeMap::new(),
            combination,
        }
    }

    fn weighted<I, S, W>(weights: I, combination: CombinationMethod) -> Self
    where
        I: IntoIterator<Item = (S, W)>,
        S: Into<String>,
        W: Into<TargetWeight>,
    {
        let mut names = Vec::new();
        let mut map = BTreeMap::new();
        for (name, weight) in weights {
            let name = name.into();
            names.push(name.clone());
            map.insert(name, weight.into());
        }
        TargetVectorSpec::WeightedJoin {
            names,
            weights: map,
            combination,
        }
    }

    pub fn sum<I: IntoIterator<Item = S>, S: Into<String>>(names: I) -> Self {
        Self::join(names, CombinationMethod::Sum)
    }

    pub fn average<I: IntoIterator<Item = S>, S: Into<String>>(names: I) -> Self {
        Self::join(names, CombinationMethod::Average)
    }

    pub fn minimum<I: IntoIterator<Item = S>, S: Into<String>>(names: I) -> Self {
        Self::join(names, CombinationMethod::Minimum)
    }

    pub fn relative_score<I, S, W>(weights: I) -> Self
    where
        I: IntoIterator<Item = (S, W)>,
        S: Into<String>,
        W: Into<TargetWeight>,
    {
        Self::weighted(weights, CombinationMethod::RelativeScore)
    }

    pub fn manual_weights<I, S, W>(weights: I) -> Self
    where
        I: IntoIterator<Item = (S, W)>,
        S: Into<String>,
        W: Into<TargetWeight>,
    {
        Self::weighted(weights, CombinationMethod::ManualWeights)
    }
}

/// Combination enumeration of the binary protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum BinaryCombinationMethod {
    Unspecified = 0,
    Sum = 1,
    Min = 2,
    Average = 3,
    RelativeScore = 4,
    Manual = 5,
}

impl From<CombinationMethod> for BinaryCombinationMethod {
    fn from(method: CombinationMethod) -> Self {
        match method {
            CombinationMethod::Sum => BinaryCombinationMethod::Sum,
            CombinationMethod::Average => BinaryCombinationMethod::Average,
            CombinationMethod::Minimum => BinaryCombinationMethod::Min,
            CombinationMethod::RelativeScore => BinaryCombinationMethod::RelativeScore,
            CombinationMethod::ManualWeights => BinaryCombinationMethod::Manual,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightForTarget {
    pub target: String,
    pub weight: f32,
}

/// Structured target message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Targets {
    pub target_vectors: Vec<String>,
    pub combination: Option<BinaryCombinationMethod>,
    /// One weight per target.
    pub weights: BTreeMap<String, f32>,
    /// Parallel (target, weight) pairs; a target may repeat.
    pub weights_for_targets: Vec<WeightForTarget>,
}

/// Output of [`resolve_targets`]: at most one of the two forms is populated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolvedTargets {
    pub targets: Option<Targets>,
    pub target_vectors: Vec<String>,
}

impl ResolvedTargets {
    pub fn is_empty(&self) -> bool {
        self.targets.is_none() && self.target_vectors.is_empty()
    }
}

/// Decide how a target specification is written for the negotiated server.
pub fn resolve_targets(
    spec: Option<&TargetVectorSpec>,
    capabilities: &Capabilities,
) -> Result<ResolvedTargets> {
    let Some(spec) = spec else {
        return Ok(ResolvedTargets::default());
    };

    match spec {
        TargetVectorSpec::Single(name) => Ok(names_only(vec![name.clone()], capabilities)),
        TargetVectorSpec::Multi(names) => {
            if names.is_empty() {
                return Err(WeftError::invalid_input("target_vector list cannot be empty"));
            }
            Ok(names_only(names.clone(), capabilities))
        }
        TargetVectorSpec::WeightedJoin {
            names,
            weights,
            combination,
        } => Ok(ResolvedTargets {
            targets: Some(weighted_targets(names, weights, *combination, capabilities)?),
            target_vectors: Vec::new(),
        }),
    }
}

fn names_only(names: Vec<String>, capabilities: &Capabilities) -> ResolvedTargets {
    if capabilities.supports_targets {
        ResolvedTargets {
            targets: Some(Targets {
                target_vectors: names,
                ..Default::default()
            }),
            target_vectors: Vec::new(),
        }
    } else {
        ResolvedTargets {
            targets: None,
            target_vectors: names,
        }
    }
}

fn weighted_targets(
    names: &[String],
    weights: &BTreeMap<String, TargetWeight>,
    combination: CombinationMethod,
    capabilities: &Capabilities,
) -> Result<Targets> {
    if names.is_empty() {
        return Err(WeftError::invalid_input("target_vector list cannot be empty"));
    }
    if let Some(unknown) = weights.keys().find(|k| !names.contains(k)) {
        return Err(WeftError::invalid_input(format!(
            "weight given for {unknown:?}, which is not one of the target vectors"
        )));
    }

    let multi_valued = weights
        .values()
        .any(|w| matches!(w, TargetWeight::Multi(_)));

    let mut targets = Targets {
        combination: Some(combination.into()),
        ..Default::default()
    };

    if !multi_valued {
        targets.target_vectors = names.to_vec();
        for (name, weight) in weights {
            if let TargetWeight::Single(w) = weight {
                targets.weights.insert(name.clone(), *w);
            }
        }
        return Ok(targets);
    }

    if !capabilities.supports_weights_for_targets {
        return Err(WeftError::unsupported(format!(
            "multiple weights per target are not supported by this server; \
             upgrade to at least {WEIGHTS_FOR_TARGETS_MIN_VERSION}"
        )));
    }

    for name in names {
        match weights.get(name) {
            Some(TargetWeight::Single(w)) => {
                targets.target_vectors.push(name.clone());
                targets.weights_for_targets.push(WeightForTarget {
                    target: name.clone(),
                    weight: *w,
                });
            }
            Some(TargetWeight::Multi(ws)) => {
                if ws.is_empty() {
                    return Err(WeftError::invalid_input(format!(
                        "weights for target {name:?} cannot be empty"
                    )));
                }
                for w in ws {
                    targets.target_vectors.push(name.clone());
                    targets.weights_for_targets.push(WeightForTarget {
                        target: name.clone(),
                        weight: *w,
                    });
                }
            }
            None => targets.target_vectors.push(name.clone()),
        }
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(targets: bool, weights: bool) -> Capabilities {
        Capabilities {
            supports_targets: targets,
            supports_vectors_for_targets: false,
            supports_weights_for_targets: weights,
        }
    }

    #[test]
    fn test_no_spec_emits_nothing() {
        let resolved = resolve_targets(None, &Capabilities::default()).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_names_follow_targets_capability() {
        let spec = TargetVectorSpec::multi(["title", "body"]);

        let resolved = resolve_targets(Some(&spec), &caps(true, false)).unwrap();
        assert!(resolved.target_vectors.is_empty());
        let targets = resolved.targets.unwrap();
        assert_eq!(targets.target_vectors, vec!["title", "body"]);
        assert_eq!(targets.combination, None);

        let resolved = resolve_targets(Some(&spec), &caps(false, false)).unwrap();
        assert!(resolved.targets.is_none());
        assert_eq!(resolved.target_vectors, vec!["title", "body"]);

        let single = TargetVectorSpec::single("title");
        let resolved = resolve_targets(Some(&single), &caps(false, false)).unwrap();
        assert_eq!(resolved.target_vectors, vec!["title"]);
    }

    #[test]
    fn test_multi_weights_require_capability() {
        let spec = TargetVectorSpec::manual_weights([("a", vec![1.0f32, 2.0])]);

        let err = resolve_targets(Some(&spec), &caps(true, false)).unwrap_err();
        assert!(err.is_unsupported());
        assert!(err.to_string().contains("1.27.0"));

        let targets = resolve_targets(Some(&spec), &caps(true, true))
            .unwrap()
            .targets
            .unwrap();
        assert_eq!(
            targets.weights_for_targets,
            vec![
                WeightForTarget {
                    target: "a".into(),
                    weight: 1.0
                },
                WeightForTarget {
                    target: "a".into(),
                    weight: 2.0
                },
            ]
        );
        assert_eq!(targets.target_vectors, vec!["a", "a"]);
        assert_eq!(targets.combination, Some(BinaryCombinationMethod::Manual));
        assert!(targets.weights.is_empty());
    }

    #[test]
    fn test_single_weights_use_mapping() {
        let spec = TargetVectorSpec::relative_score([("a", 0.25f32), ("b", 0.75)]);
        let targets = resolve_targets(Some(&spec), &caps(true, false))
            .unwrap()
            .targets
            .unwrap();
        assert_eq!(targets.target_vectors, vec!["a", "b"]);
        assert_eq!(targets.weights.get("b"), Some(&0.75));
        assert!(targets.weights_for_targets.is_empty());
        assert_eq!(targets.combination, Some(BinaryCombinationMethod::RelativeScore));
    }

    #[test]
    fn test_combination_without_weights() {
        let spec = TargetVectorSpec::minimum(["a", "b"]);
        let targets = resolve_targets(Some(&spec), &caps(false, false))
            .unwrap()
            .targets
            .unwrap();
        assert_eq!(targets.combination, Some(BinaryCombinationMethod::Min));
        assert!(targets.weights.is_empty());
    }

    #[test]
    fn test_invalid_specs() {
        let empty = TargetVectorSpec::Multi(vec![]);
        assert!(resolve_targets(Some(&empty), &caps(true, true)).unwrap_err().is_invalid_input());

        let mut weights = BTreeMap::new();
        weights.insert("c".to_string(), TargetWeight::Single(1.0));
        let stray = TargetVectorSpec::WeightedJoin {
            names: vec!["a".into()],
            weights,
            combination: CombinationMethod::ManualWeights,
        };
        assert!(resolve_targets(Some(&stray), &caps(true, true)).unwrap_err().is_invalid_input());
    }
}
