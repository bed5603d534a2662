//! Turns search options into binary protocol requests.
//!
//! Every entry point consults the negotiated [`Capabilities`]; the serializer
//! itself holds no other state.

use crate::capabilities::Capabilities;
use crate::error::{Result, WeftError};
use crate::filter::to_binary;
use crate::search::message::{
    Bm25Search, HybridSearch, NearMediaSearch, NearObjectSearch, NearTextMove, NearTextSearch,
    NearVectorSearch, SearchQuery, SearchRequest,
};
use crate::search::options::{
    Bm25Options, HybridOptions, HybridVector, Move, NearMediaOptions, NearObjectOptions,
    NearTextOptions, NearVectorOptions, SearchEnvelope,
};
use crate::search::targets::{ResolvedTargets, TargetVectorSpec, Targets, resolve_targets};
use crate::search::vector::{VectorInput, encode_vectors};

/// Serializer for search requests.
#[derive(Debug, Clone, Copy)]
pub struct SearchSerializer<'a> {
    capabilities: &'a Capabilities,
}

impl<'a> SearchSerializer<'a> {
    pub fn new(capabilities: &'a Capabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.capabilities
    }

    pub fn fetch_objects(&self, envelope: SearchEnvelope) -> Result<SearchRequest> {
        self.request(envelope, SearchQuery::Fetch)
    }

    pub fn near_text(
        &self,
        envelope: SearchEnvelope,
        options: &NearTextOptions,
    ) -> Result<SearchRequest> {
        let query = SearchQuery::NearText(self.near_text_search(options)?);
        self.request(envelope, query)
    }

    pub fn near_vector(
        &self,
        envelope: SearchEnvelope,
        options: &NearVectorOptions,
    ) -> Result<SearchRequest> {
        let query = SearchQuery::NearVector(self.near_vector_search(options)?);
        self.request(envelope, query)
    }

    pub fn near_object(
        &self,
        envelope: SearchEnvelope,
        options: &NearObjectOptions,
    ) -> Result<SearchRequest> {
        let query = SearchQuery::NearObject(self.near_object_search(options)?);
        self.request(envelope, query)
    }

    pub fn near_media(
        &self,
        envelope: SearchEnvelope,
        options: &NearMediaOptions,
    ) -> Result<SearchRequest> {
        let query = SearchQuery::NearMedia(self.near_media_search(options)?);
        self.request(envelope, query)
    }

    pub fn bm25(&self, envelope: SearchEnvelope, options: &Bm25Options) -> Result<SearchRequest> {
        let query = SearchQuery::Bm25(Bm25Search {
            query: options.query.clone(),
            properties: options.properties.clone(),
            search_operator: options.operator,
        });
        self.request(envelope, query)
    }

    pub fn hybrid(&self, envelope: SearchEnvelope, options: &HybridOptions) -> Result<SearchRequest> {
        let query = SearchQuery::Hybrid(self.hybrid_search(options)?);
        self.request(envelope, query)
    }

    pub fn near_text_search(&self, options: &NearTextOptions) -> Result<NearTextSearch> {
        self.near_text_with_targets(options, options.target_vector.as_ref())
    }

    pub fn near_vector_search(&self, options: &NearVectorOptions) -> Result<NearVectorSearch> {
        self.near_vector_with_targets(options, options.target_vector.as_ref())
    }

    pub fn near_object_search(&self, options: &NearObjectOptions) -> Result<NearObjectSearch> {
        check_threshold(options.certainty, options.distance)?;
        if options.id.is_empty() {
            return Err(WeftError::invalid_input("near_object id cannot be empty"));
        }
        let resolved = self.targets(options.target_vector.as_ref())?;
        Ok(NearObjectSearch {
            id: options.id.clone(),
            certainty: options.certainty,
            distance: options.distance,
            target_vectors: resolved.target_vectors,
            targets: resolved.targets,
        })
    }

    pub fn near_media_search(&self, options: &NearMediaOptions) -> Result<NearMediaSearch> {
        check_threshold(options.certainty, options.distance)?;
        if options.media.is_empty() {
            return Err(WeftError::invalid_input(format!(
                "near_{} media cannot be empty",
                options.kind.as_str()
            )));
        }
        let resolved = self.targets(options.target_vector.as_ref())?;
        Ok(NearMediaSearch {
            kind: options.kind,
            media: options.media.clone(),
            certainty: options.certainty,
            distance: options.distance,
            target_vectors: resolved.target_vectors,
            targets: resolved.targets,
        })
    }

    /// Build a hybrid query. Targets are resolved once and written on the
    /// hybrid message, never on its nested sub-search.
    pub fn hybrid_search(&self, options: &HybridOptions) -> Result<HybridSearch> {
        let mut hybrid = HybridSearch {
            query: options.query.clone(),
            properties: options.properties.clone(),
            alpha: options.alpha,
            fusion_type: options.fusion_type,
            vector_distance: options.max_vector_distance,
            ..Default::default()
        };

        let hybrid_target = options.target_vector.as_ref();
        let resolved = match &options.vector {
            None => self.targets(hybrid_target)?,
            Some(HybridVector::Raw(input)) => {
                let encoded = encode_vectors("vector", input, hybrid_target, self.capabilities)?;
                if let VectorInput::Named(_) = input {
                    hybrid.near_vector = Some(NearVectorSearch {
                        vector_per_target: encoded.vector_per_target,
                        vector_for_targets: encoded.vector_for_targets,
                        ..Default::default()
                    });
                } else {
                    hybrid.vector_bytes = encoded.vector_bytes;
                }
                encoded.resolved
            }
            Some(HybridVector::NearText(sub)) => {
                let target = merged_target(hybrid_target, sub.target_vector.as_ref())?;
                let mut near_text = self.near_text_with_targets(sub, target)?;
                let resolved = lift_targets(&mut near_text.targets, &mut near_text.target_vectors);
                hybrid.near_text = Some(near_text);
                resolved
            }
            Some(HybridVector::NearVector(sub)) => {
                let target = merged_target(hybrid_target, sub.target_vector.as_ref())?;
                let mut near_vector = self.near_vector_with_targets(sub, target)?;
                let resolved =
                    lift_targets(&mut near_vector.targets, &mut near_vector.target_vectors);
                hybrid.near_vector = Some(near_vector);
                resolved
            }
        };

        hybrid.targets = resolved.targets;
        hybrid.target_vectors = resolved.target_vectors;
        Ok(hybrid)
    }

    fn near_text_with_targets(
        &self,
        options: &NearTextOptions,
        target: Option<&TargetVectorSpec>,
    ) -> Result<NearTextSearch> {
        check_threshold(options.certainty, options.distance)?;
        if options.query.is_empty() {
            return Err(WeftError::invalid_input("near_text query cannot be empty"));
        }
        let resolved = self.targets(target)?;
        Ok(NearTextSearch {
            query: options.query.clone(),
            certainty: options.certainty,
            distance: options.distance,
            move_to: options.move_to.as_ref().map(text_move),
            move_away: options.move_away.as_ref().map(text_move),
            target_vectors: resolved.target_vectors,
            targets: resolved.targets,
        })
    }

    fn near_vector_with_targets(
        &self,
        options: &NearVectorOptions,
        target: Option<&TargetVectorSpec>,
    ) -> Result<NearVectorSearch> {
        check_threshold(options.certainty, options.distance)?;
        let encoded = encode_vectors("near_vector", &options.vector, target, self.capabilities)?;
        Ok(NearVectorSearch {
            vector_bytes: encoded.vector_bytes,
            certainty: options.certainty,
            distance: options.distance,
            target_vectors: encoded.resolved.target_vectors,
            targets: encoded.resolved.targets,
            vector_per_target: encoded.vector_per_target,
            vector_for_targets: encoded.vector_for_targets,
        })
    }

    fn targets(&self, target: Option<&TargetVectorSpec>) -> Result<ResolvedTargets> {
        resolve_targets(target, self.capabilities)
    }

    fn request(&self, envelope: SearchEnvelope, query: SearchQuery) -> Result<SearchRequest> {
        if envelope.collection.is_empty() {
            return Err(WeftError::invalid_input("collection name cannot be empty"));
        }
        let filters = envelope.filters.as_ref().map(to_binary).transpose()?;
        tracing::debug!(
            collection = %envelope.collection,
            query = query.name(),
            filtered = filters.is_some(),
            "serialized search request"
        );
        Ok(SearchRequest {
            collection: envelope.collection,
            tenant: envelope.tenant,
            limit: envelope.limit,
            offset: envelope.offset,
            autocut: envelope.autocut,
            after: envelope.after,
            filters,
            properties: envelope.return_properties,
            metadata: envelope.return_metadata,
            rerank: envelope.rerank,
            query,
        })
    }
}

fn check_threshold(certainty: Option<f64>, distance: Option<f64>) -> Result<()> {
    if certainty.is_some() && distance.is_some() {
        return Err(WeftError::invalid_input(
            "certainty and distance cannot be set at the same time",
        ));
    }
    Ok(())
}

fn text_move(shift: &Move) -> NearTextMove {
    NearTextMove {
        force: shift.force,
        concepts: shift.concepts.clone(),
        uuids: shift.objects.clone(),
    }
}

/// The hybrid-level target wins; a sub-search may only repeat it.
fn merged_target<'t>(
    hybrid: Option<&'t TargetVectorSpec>,
    sub: Option<&'t TargetVectorSpec>,
) -> Result<Option<&'t TargetVectorSpec>> {
    match (hybrid, sub) {
        (Some(outer), Some(inner)) if outer != inner => Err(WeftError::invalid_input(
            "target_vector differs between hybrid and its vector sub-search",
        )),
        (Some(outer), _) => Ok(Some(outer)),
        (None, inner) => Ok(inner),
    }
}

fn lift_targets(
    targets: &mut Option<Targets>,
    target_vectors: &mut Vec<String>,
) -> ResolvedTargets {
    ResolvedTargets {
        targets: targets.take(),
        target_vectors: std::mem::take(target_vectors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{BinaryFilterOperator, Filter};
    use crate::search::message::{
        FusionType, MediaKind, MetadataRequest, PropertiesRequest, RefPropertiesRequest,
    };
    use crate::search::targets::BinaryCombinationMethod;
    use crate::search::vector::NamedVector;
    use crate::wire::bytes_to_f32s;

    fn envelope() -> SearchEnvelope {
        SearchEnvelope::new("Article").with_limit(5)
    }

    #[test]
    fn test_envelope_carries_filters_and_returns() {
        let caps = Capabilities::default();
        let serializer = SearchSerializer::new(&caps);
        let properties = PropertiesRequest::with_properties(["title"]).with_reference(
            RefPropertiesRequest::new(
                "writtenBy",
                PropertiesRequest::with_properties(["name"]).with_reference(
                    RefPropertiesRequest::new("livesIn", PropertiesRequest::all()),
                ),
            )
            .with_target_collection("Author"),
        );
        let request = serializer
            .fetch_objects(
                envelope()
                    .with_tenant("tenantA")
                    .with_after("00000000-0000-0000-0000-000000000000")
                    .with_filters(Filter::by_property("year").greater_than(2000i64).unwrap())
                    .with_properties(properties)
                    .with_metadata(MetadataRequest {
                        uuid: true,
                        ..Default::default()
                    })
                    .with_rerank("title", Some("rust".into())),
            )
            .unwrap();

        assert_eq!(request.query, SearchQuery::Fetch);
        assert_eq!(request.tenant.as_deref(), Some("tenantA"));
        assert_eq!(request.limit, Some(5));
        assert_eq!(request.filters.unwrap().operator, BinaryFilterOperator::GreaterThan);
        let properties = request.properties.unwrap();
        assert_eq!(
            properties.ref_properties[0].properties.ref_properties[0].reference_property,
            "livesIn"
        );
        assert!(request.metadata.unwrap().uuid);
        assert_eq!(request.rerank.unwrap().query.as_deref(), Some("rust"));
    }

    #[test]
    fn test_certainty_and_distance_are_exclusive() {
        let caps = Capabilities::default();
        let serializer = SearchSerializer::new(&caps);
        let mut options = NearTextOptions::new(["rust"]);
        options.certainty = Some(0.7);
        options.distance = Some(0.3);
        let err = serializer.near_text(envelope(), &options).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_near_text_moves() {
        let caps = Capabilities::default();
        let serializer = SearchSerializer::new(&caps);
        let mut options = NearTextOptions::new(["memory safety"]);
        options.move_to = Some(Move::new(0.5).concepts(["ownership"]));
        options.move_away = Some(Move::new(0.25).objects(["id-1"]));
        let search = serializer.near_text_search(&options).unwrap();
        assert_eq!(search.move_to.unwrap().concepts, vec!["ownership"]);
        let away = search.move_away.unwrap();
        assert_eq!(away.uuids, vec!["id-1"]);
        assert_eq!(away.force, 0.25);
    }

    #[test]
    fn test_near_vector_bytes() {
        let caps = Capabilities::default();
        let serializer = SearchSerializer::new(&caps);
        let request = serializer
            .near_vector(envelope(), &NearVectorOptions::new(vec![0.1f32, 0.2, 0.3]))
            .unwrap();
        let SearchQuery::NearVector(search) = request.query else {
            panic!("expected near_vector");
        };
        assert_eq!(
            bytes_to_f32s(&search.vector_bytes.unwrap()).unwrap(),
            vec![0.1, 0.2, 0.3]
        );
    }

    #[test]
    fn test_near_media_and_object() {
        let caps = Capabilities::legacy();
        let serializer = SearchSerializer::new(&caps);
        let mut media = NearMediaOptions::new(MediaKind::Audio, "UklGRg==");
        media.target_vector = Some(TargetVectorSpec::single("sound"));
        let search = serializer.near_media_search(&media).unwrap();
        assert_eq!(search.target_vectors, vec!["sound"]);
        assert!(search.targets.is_none());

        let empty = NearMediaOptions::new(MediaKind::Image, "");
        let err = serializer.near_media_search(&empty).unwrap_err();
        assert!(err.to_string().contains("near_image"));

        let object = serializer
            .near_object_search(&NearObjectOptions::new("abc"))
            .unwrap();
        assert_eq!(object.id, "abc");
    }

    #[test]
    fn test_hybrid_lifts_near_text_targets() {
        let caps = Capabilities::default();
        let serializer = SearchSerializer::new(&caps);
        let mut sub = NearTextOptions::new(["concurrency"]);
        sub.target_vector = Some(TargetVectorSpec::average(["title", "body"]));
        let mut options = HybridOptions::new("async");
        options.alpha = Some(0.5);
        options.fusion_type = FusionType::RelativeScore;
        options.vector = Some(HybridVector::NearText(sub));

        let hybrid = serializer.hybrid_search(&options).unwrap();
        let nested = hybrid.near_text.unwrap();
        assert!(nested.targets.is_none() && nested.target_vectors.is_empty());
        let targets = hybrid.targets.unwrap();
        assert_eq!(targets.target_vectors, vec!["title", "body"]);
        assert_eq!(targets.combination, Some(BinaryCombinationMethod::Average));
        assert_eq!(hybrid.fusion_type, FusionType::RelativeScore);
    }

    #[test]
    fn test_hybrid_near_vector_uses_hybrid_target() {
        let caps = Capabilities::default();
        let serializer = SearchSerializer::new(&caps);
        let mut options = HybridOptions::new("");
        options.target_vector = Some(TargetVectorSpec::single("title"));
        options.vector = Some(HybridVector::NearVector(NearVectorOptions::new(vec![1.0f32])));
        options.max_vector_distance = Some(0.4);

        let hybrid = serializer.hybrid_search(&options).unwrap();
        assert_eq!(hybrid.targets.unwrap().target_vectors, vec!["title"]);
        let nested = hybrid.near_vector.unwrap();
        assert!(nested.targets.is_none());
        assert!(nested.vector_bytes.is_some());
        assert_eq!(hybrid.vector_distance, Some(0.4));
    }

    #[test]
    fn test_hybrid_conflicting_targets() {
        let caps = Capabilities::default();
        let serializer = SearchSerializer::new(&caps);
        let mut sub = NearVectorOptions::new(vec![1.0f32]);
        sub.target_vector = Some(TargetVectorSpec::single("body"));
        let mut options = HybridOptions::new("q");
        options.target_vector = Some(TargetVectorSpec::single("title"));
        options.vector = Some(HybridVector::NearVector(sub));
        assert!(serializer.hybrid_search(&options).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_hybrid_raw_vectors() {
        let caps = Capabilities::legacy();
        let serializer = SearchSerializer::new(&caps);

        let mut options = HybridOptions::new("q");
        options.vector = Some(HybridVector::Raw(VectorInput::Single(vec![1.0, 2.0])));
        let hybrid = serializer.hybrid_search(&options).unwrap();
        assert_eq!(hybrid.vector_bytes.unwrap().len(), 8);
        assert!(hybrid.near_vector.is_none());

        options.vector = Some(HybridVector::Raw(VectorInput::named([(
            "title",
            NamedVector::One(vec![1.0]),
        )])));
        let hybrid = serializer.hybrid_search(&options).unwrap();
        assert_eq!(hybrid.target_vectors, vec!["title"]);
        assert!(hybrid.near_vector.unwrap().vector_per_target.contains_key("title"));

        options.vector = Some(HybridVector::Raw(VectorInput::Single(vec![])));
        assert!(serializer.hybrid_search(&options).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_empty_collection_rejected() {
        let caps = Capabilities::default();
        let serializer = SearchSerializer::new(&caps);
        let err = serializer
            .bm25(SearchEnvelope::default(), &Bm25Options::new("q"))
            .unwrap_err();
        assert!(err.is_invalid_input());
    }
}
