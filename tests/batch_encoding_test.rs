use std::collections::HashSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use futures::StreamExt;

use weft::batch::{
    BatchEncoder, BatchEncoderConfig, BatchObject, BinaryBatchObject, ReferenceInput,
    ReferenceManager, StructValue,
};
use weft::field::{ObjectValue, WeaviateField};
use weft::wire;

fn articles(count: usize) -> Vec<BatchObject> {
    (0..count)
        .map(|i| {
            BatchObject::new()
                .with_property("title", format!("article {i}"))
                .with_property("position", i as i64)
        })
        .collect()
}

#[tokio::test]
async fn test_batch_order_preservation() -> Result<(), Box<dyn std::error::Error>> {
    let encoder = BatchEncoder::with_config(BatchEncoderConfig::new("Article"))?;
    let batch = encoder.encode_batch(articles(1000)).await?;

    assert_eq!(batch.mapped.len(), 1000);
    assert_eq!(batch.correlation.len(), 1000);
    for i in 0..1000 {
        assert_eq!(batch.correlation[i].index, i);
        assert_eq!(batch.correlation[i].uuid, batch.mapped[i].uuid);
        assert_eq!(
            batch.mapped[i].properties.non_ref_properties["position"],
            StructValue::Number(i as f64)
        );
    }

    let distinct: HashSet<&str> = batch.mapped.iter().map(|m| m.uuid.as_str()).collect();
    assert_eq!(distinct.len(), 1000);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_batch_on_multi_thread_runtime() -> Result<(), Box<dyn std::error::Error>> {
    let config = BatchEncoderConfig::new("Article").with_yield_every(16);
    let encoder = BatchEncoder::with_config(config)?;

    let (first, second) = tokio::join!(
        encoder.encode_batch(articles(300)),
        encoder.encode_batch(articles(200))
    );
    let (first, second) = (first?, second?);
    assert_eq!(first.len(), 300);
    assert_eq!(second.len(), 200);
    assert!(
        first
            .correlation
            .iter()
            .enumerate()
            .all(|(i, c)| c.index == i)
    );
    Ok(())
}

#[test]
fn test_batch_with_block_on() {
    let generator = || "00000000-0000-4000-8000-000000000000".to_string();
    let encoder =
        BatchEncoder::new(BatchEncoderConfig::new("Article"), Arc::new(generator)).unwrap();

    let batch = tokio_test::block_on(encoder.encode_batch(articles(3))).unwrap();
    assert!(
        batch
            .mapped
            .iter()
            .all(|m| m.uuid == "00000000-0000-4000-8000-000000000000")
    );
}

#[tokio::test]
async fn test_stream_can_be_abandoned() {
    let encoder = BatchEncoder::with_config(BatchEncoderConfig::new("Article")).unwrap();
    let first: Vec<_> = encoder.encode_stream(articles(500)).take(5).collect().await;
    assert_eq!(first.len(), 5);
    assert_eq!(first[4].correlation.index, 4);
}

#[tokio::test]
async fn test_full_object_encoding() -> Result<(), Box<dyn std::error::Error>> {
    let mut address = ObjectValue::new();
    address.insert("city".to_string(), WeaviateField::from("Lisbon"));

    let published = Utc.with_ymd_and_hms(2023, 11, 5, 9, 15, 0).unwrap();
    let object = BatchObject::new()
        .with_id("3fa85f64-5717-4562-b3fc-2c963f66afa6")
        .with_property("title", "Release notes")
        .with_property("published", published)
        .with_property("ratios", vec![0.25, 0.75])
        .with_property("address", address)
        .with_reference("author", ReferenceInput::from("a1"))
        .with_reference(
            "mentions",
            ReferenceInput::Mixed(vec![
                ReferenceManager::to_multi_target(["p1"], "Person").into(),
                ReferenceInput::from("x1"),
            ]),
        )
        .with_named_vector("title", vec![0.1, 0.2]);

    let config = BatchEncoderConfig::new("Article").with_tenant("tenantA");
    let encoder = BatchEncoder::with_config(config)?;
    let batch = encoder.encode_batch(vec![object.clone()]).await?;

    let mapped = &batch.mapped[0];
    assert_eq!(mapped.uuid, "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    assert_eq!(mapped.tenant.as_deref(), Some("tenantA"));
    assert_eq!(
        mapped.properties.non_ref_properties["published"],
        StructValue::Text("2023-11-05T09:15:00.000Z".to_string())
    );
    assert_eq!(
        wire::bytes_to_f64s(&mapped.properties.number_array_properties[0].values_bytes)?,
        vec![0.25, 0.75]
    );
    assert_eq!(mapped.properties.object_properties[0].prop_name, "address");

    let single: Vec<(&str, &[String])> = mapped
        .properties
        .single_target_ref_props
        .iter()
        .map(|r| (r.prop_name.as_str(), r.uuids.as_slice()))
        .collect();
    assert_eq!(single.len(), 2);
    assert_eq!(single[0].0, "author");
    assert_eq!(single[1].1, ["x1".to_string()]);
    assert_eq!(mapped.properties.multi_target_ref_props[0].target_collection, "Person");

    assert_eq!(mapped.vectors[0].name, "title");
    assert_eq!(batch.correlation[0].object, object);

    let frame = wire::encode(mapped)?;
    let decoded: BinaryBatchObject = wire::decode(&frame)?;
    assert_eq!(&decoded, mapped);
    Ok(())
}
