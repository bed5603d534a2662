//! Criterion benchmarks for weft.
//!
//! Covers the two hot paths of a client:
//! - Filter serialization for both protocols
//! - Batch object encoding

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use weft::batch::{
    BatchEncoder, BatchEncoderConfig, BatchObject, ReferenceInput, encode_properties,
};
use weft::capabilities::Capabilities;
use weft::field::{GeoCoordinate, ObjectValue, WeaviateField};
use weft::filter::{Filter, FilterValue, Filters, to_binary, to_textual};
use weft::search::{
    HybridOptions, HybridVector, NearTextOptions, SearchEnvelope, SearchSerializer,
    TargetVectorSpec,
};

/// Generate a wide filter tree for benchmarking.
fn generate_filter(width: usize) -> FilterValue {
    let leaves: Vec<FilterValue> = (0..width)
        .map(|i| match i % 4 {
            0 => Filter::by_property(format!("field_{i}")).equal(i as i64).unwrap(),
            1 => Filter::by_property(format!("field_{i}")).like("term*").unwrap(),
            2 => Filter::by_ref("author")
                .by_property("name")
                .contains_any(vec!["a", "b", "c"])
                .unwrap(),
            _ => Filter::by_ref_multi_target("cites", "Paper")
                .by_property("year")
                .greater_than(2000i64)
                .unwrap(),
        })
        .collect();
    let half = width / 2;
    let mut rest = leaves;
    let right = rest.split_off(half);
    Filters::or([Filters::and(rest).unwrap(), Filters::and(right).unwrap()]).unwrap()
}

/// Generate batch objects with a realistic property mix.
fn generate_objects(count: usize) -> Vec<BatchObject> {
    (0..count)
        .map(|i| {
            let mut address = ObjectValue::new();
            address.insert("city".to_string(), WeaviateField::from("Berlin"));
            address.insert("zip".to_string(), WeaviateField::from(10115i64));

            BatchObject::new()
                .with_property("title", format!("document {i}"))
                .with_property("rank", i as i64)
                .with_property("score", i as f64 + 0.5)
                .with_property("tags", vec!["search", "engine", "vector"])
                .with_property("ratios", vec![0.1, 0.2, 0.3, 0.4])
                .with_property("location", GeoCoordinate::new(52.52, 13.40).unwrap())
                .with_property("address", address)
                .with_reference(
                    "author",
                    ReferenceInput::from("6f0a4e3c-0000-4000-8000-000000000000"),
                )
                .with_vector(vec![0.25; 128])
        })
        .collect()
}

/// Benchmark filter serialization.
fn bench_filter_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_serialization");
    let filter = generate_filter(64);

    group.throughput(Throughput::Elements(64));
    group.bench_function("textual_json", |b| {
        b.iter(|| {
            let textual = to_textual(black_box(&filter)).unwrap();
            black_box(textual.to_json().unwrap());
        });
    });

    group.bench_function("textual_graphql", |b| {
        b.iter(|| {
            let textual = to_textual(black_box(&filter)).unwrap();
            black_box(textual.to_graphql().unwrap());
        });
    });

    group.bench_function("binary", |b| {
        b.iter(|| black_box(to_binary(black_box(&filter)).unwrap()));
    });

    group.finish();
}

/// Benchmark search request construction.
fn bench_search_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_serialization");
    let capabilities = Capabilities::default();
    let serializer = SearchSerializer::new(&capabilities);
    let filter = generate_filter(16);

    let mut near_text = NearTextOptions::new(["vector database"]);
    near_text.target_vector = Some(TargetVectorSpec::manual_weights([
        ("title", vec![0.5f32, 0.25]),
        ("body", vec![0.25]),
    ]));
    let mut hybrid = HybridOptions::new("rust");
    hybrid.vector = Some(HybridVector::NearText(near_text));

    group.bench_function("hybrid_with_filters", |b| {
        b.iter(|| {
            let envelope = SearchEnvelope::new("Article")
                .with_limit(10)
                .with_filters(filter.clone());
            black_box(serializer.hybrid(envelope, black_box(&hybrid)).unwrap());
        });
    });

    group.finish();
}

/// Benchmark batch encoding.
fn bench_batch_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_encoding");
    group.sample_size(20);

    let objects = generate_objects(1000);
    let runtime = tokio::runtime::Runtime::new().unwrap();

    group.throughput(Throughput::Elements(1));
    group.bench_function("encode_properties_single", |b| {
        let object = &objects[0];
        b.iter(|| black_box(encode_properties(&object.properties, &object.references)));
    });

    for yield_every in [1usize, 64] {
        let config = BatchEncoderConfig::new("Article").with_yield_every(yield_every);
        let encoder = BatchEncoder::with_config(config).unwrap();

        group.throughput(Throughput::Elements(objects.len() as u64));
        group.bench_function(format!("encode_batch_1000_yield_{yield_every}"), |b| {
            b.iter(|| {
                let batch = runtime.block_on(encoder.encode_batch(objects.clone())).unwrap();
                black_box(batch);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_filter_serialization,
    bench_search_serialization,
    bench_batch_encoding
);
criterion_main!(benches);
