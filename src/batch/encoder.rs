//! Cooperative batch encoder.
//!
//! A producer task encodes objects in input order and hands each one over a
//! bounded channel, yielding to the scheduler every `yield_every` objects so a
//! large batch does not starve other tasks. The channel closing marks the end
//! of the batch.

use std::fmt;
use std::sync::Arc;

use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::batch::object::{BatchCorrelation, BatchObject, BinaryBatchObject, encode_object};
use crate::error::{Result, WeftError};

/// Source of identifiers for objects that do not bring their own.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random version 4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// Configuration for the batch encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchEncoderConfig {
    /// Collection every object is written to.
    pub collection: String,
    pub tenant: Option<String>,
    /// Objects encoded between cooperative yields.
    pub yield_every: usize,
    /// Encoded objects buffered ahead of the consumer.
    pub channel_capacity: usize,
}

impl Default for BatchEncoderConfig {
    fn default() -> Self {
        Self {
            collection: String::new(),
            tenant: None,
            yield_every: 1,
            channel_capacity: 256,
        }
    }
}

impl BatchEncoderConfig {
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

    pub fn with_yield_every(mut self, yield_every: usize) -> Self {
        self.yield_every = yield_every;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.collection.is_empty() {
            return Err(WeftError::invalid_input("collection name cannot be empty"));
        }
        if self.yield_every == 0 {
            return Err(WeftError::invalid_input("yield_every must be at least 1"));
        }
        if self.channel_capacity == 0 {
            return Err(WeftError::invalid_input("channel_capacity must be at least 1"));
        }
        Ok(())
    }
}

/// One object after encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedObject {
    pub mapped: BinaryBatchObject,
    pub correlation: BatchCorrelation,
}

/// A fully encoded batch. Both sequences follow input order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncodedBatch {
    pub mapped: Vec<BinaryBatchObject>,
    pub correlation: Vec<BatchCorrelation>,
}

impl EncodedBatch {
    pub fn len(&self) -> usize {
        self.mapped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapped.is_empty()
    }
}

/// Encodes batches of objects without monopolizing the runtime.
#[derive(Clone)]
pub struct BatchEncoder {
    config: BatchEncoderConfig,
    id_generator: Arc<dyn IdGenerator>,
}

impl fmt::Debug for BatchEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchEncoder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BatchEncoder {
    pub fn new(config: BatchEncoderConfig, id_generator: Arc<dyn IdGenerator>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            id_generator,
        })
    }

    /// An encoder that generates random UUIDs.
    pub fn with_config(config: BatchEncoderConfig) -> Result<Self> {
        Self::new(config, Arc::new(UuidV4Generator))
    }

    pub fn config(&self) -> &BatchEncoderConfig {
        &self.config
    }

    /// Encode every object, returning once the last one is done.
    ///
    /// Must run inside a tokio runtime.
    pub async fn encode_batch(&self, objects: Vec<BatchObject>) -> Result<EncodedBatch> {
        let total = objects.len();
        tracing::debug!(
            collection = %self.config.collection,
            objects = total,
            "encoding batch"
        );

        let (sender, mut receiver) = mpsc::channel(self.config.channel_capacity);
        let producer = tokio::spawn(produce(
            objects,
            self.config.clone(),
            Arc::clone(&self.id_generator),
            sender,
        ));

        let mut batch = EncodedBatch {
            mapped: Vec::with_capacity(total),
            correlation: Vec::with_capacity(total),
        };
        while let Some(encoded) = receiver.recv().await {
            batch.mapped.push(encoded.mapped);
            batch.correlation.push(encoded.correlation);
        }

        producer
            .await
            .map_err(|e| WeftError::internal(format!("batch encoder task failed: {e}")))?;

        if batch.len() != total {
            return Err(WeftError::internal(format!(
                "batch encoder produced {} of {total} objects",
                batch.len()
            )));
        }

        tracing::debug!(
            collection = %self.config.collection,
            objects = total,
            "batch encoded"
        );
        Ok(batch)
    }

    /// Encode objects as a stream, in input order.
    ///
    /// The producer starts immediately; dropping the stream stops it at its
    /// next send. Must be called inside a tokio runtime.
    pub fn encode_stream(&self, objects: Vec<BatchObject>) -> impl Stream<Item = EncodedObject> {
        let (sender, receiver) = mpsc::channel(self.config.channel_capacity);
        tokio::spawn(produce(
            objects,
            self.config.clone(),
            Arc::clone(&self.id_generator),
            sender,
        ));

        stream::unfold(receiver, |mut receiver| async move {
            let encoded = receiver.recv().await?;
            Some((encoded, receiver))
        })
    }
}

async fn produce(
    objects: Vec<BatchObject>,
    config: BatchEncoderConfig,
    id_generator: Arc<dyn IdGenerator>,
    sender: mpsc::Sender<EncodedObject>,
) {
    let tenant = config.tenant.as_deref();
    for (index, object) in objects.into_iter().enumerate() {
        let uuid = match &object.id {
            Some(id) => id.clone(),
            None => id_generator.generate(),
        };
        let mapped = encode_object(&object, &config.collection, tenant, &uuid);
        tracing::trace!(index, uuid = %uuid, "encoded batch object");

        let encoded = EncodedObject {
            mapped,
            correlation: BatchCorrelation {
                index,
                uuid,
                object,
            },
        };
        if sender.send(encoded).await.is_err() {
            tracing::debug!(index, "batch consumer went away, stopping");
            return;
        }

        if (index + 1) % config.yield_every == 0 {
            tracing::trace!(index, "yielding to the scheduler");
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::WeaviateField;
    use futures::StreamExt;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn objects(n: usize) -> Vec<BatchObject> {
        (0..n)
            .map(|i| BatchObject::new().with_property("position", i as i64))
            .collect()
    }

    #[tokio::test]
    async fn test_order_and_correlation_preserved() {
        let encoder = BatchEncoder::with_config(BatchEncoderConfig::new("Article")).unwrap();
        let batch = encoder.encode_batch(objects(1000)).await.unwrap();

        assert_eq!(batch.mapped.len(), 1000);
        assert_eq!(batch.correlation.len(), 1000);
        for (i, (mapped, correlation)) in batch.mapped.iter().zip(&batch.correlation).enumerate() {
            assert_eq!(correlation.index, i);
            assert_eq!(correlation.uuid, mapped.uuid);
            assert_eq!(
                correlation.object.properties["position"],
                WeaviateField::Int(i as i64)
            );
        }

        let unique: HashSet<&str> = batch.mapped.iter().map(|m| m.uuid.as_str()).collect();
        assert_eq!(unique.len(), 1000);
        assert!(uuid::Uuid::parse_str(&batch.mapped[0].uuid).is_ok());
    }

    #[tokio::test]
    async fn test_explicit_ids_and_custom_generator() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        let generator = move || format!("generated-{}", seen.fetch_add(1, Ordering::SeqCst));
        let config = BatchEncoderConfig::new("Article")
            .with_tenant("tenantA")
            .with_yield_every(2);
        let encoder = BatchEncoder::new(config, Arc::new(generator)).unwrap();

        let input = vec![
            BatchObject::new(),
            BatchObject::new().with_id("fixed"),
            BatchObject::new(),
        ];
        let batch = encoder.encode_batch(input).await.unwrap();
        let uuids: Vec<&str> = batch.mapped.iter().map(|m| m.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["generated-0", "fixed", "generated-1"]);
        assert!(batch.mapped.iter().all(|m| m.tenant.as_deref() == Some("tenantA")));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let encoder = BatchEncoder::with_config(BatchEncoderConfig::new("Article")).unwrap();
        let batch = encoder.encode_batch(Vec::new()).await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_stream_matches_batch_order() {
        let encoder = BatchEncoder::with_config(BatchEncoderConfig::new("Article")).unwrap();
        let indices: Vec<usize> = encoder
            .encode_stream(objects(50))
            .map(|encoded| encoded.correlation.index)
            .collect()
            .await;
        assert_eq!(indices, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_invalid_config() {
        assert!(BatchEncoder::with_config(BatchEncoderConfig::default()).is_err());
        let config = BatchEncoderConfig::new("Article").with_yield_every(0);
        assert!(BatchEncoder::with_config(config).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config: BatchEncoderConfig =
            serde_json::from_str(r#"{"collection": "Article"}"#).unwrap();
        assert_eq!(config.yield_every, 1);
        assert_eq!(config.channel_capacity, 256);
        assert!(config.tenant.is_none());
    }
}
