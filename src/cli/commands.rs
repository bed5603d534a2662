//! Command implementations for the weft CLI.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, bail};

use crate::batch::{BatchEncoder, BatchEncoderConfig, BatchObject, ObjectVectors};
use crate::capabilities::Capabilities;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::Result;
use crate::field::{WeaviateField, classify_json};
use crate::filter::{FilterValue, to_binary, to_textual};
use crate::wire;

/// Execute a CLI command.
pub async fn execute_command(args: WeftArgs) -> anyhow::Result<()> {
    match &args.command {
        Command::Filter(filter_args) => serialize_filter(filter_args, &args),
        Command::Capabilities(caps_args) => show_capabilities(caps_args, &args),
        Command::Classify(classify_args) => classify_value(classify_args, &args),
        Command::Batch(batch_args) => encode_batch(batch_args, &args).await,
    }
}

fn serialize_filter(args: &FilterArgs, cli_args: &WeftArgs) -> anyhow::Result<()> {
    let raw = read_input(&args.input)
        .with_context(|| format!("failed to read filter from {}", args.input))?;
    let filter: FilterValue =
        serde_json::from_str(&raw).context("input is not a valid filter expression")?;

    let output = render_filter(&filter, args.target)?;
    output_result("Serialized filter", &output, cli_args)?;
    Ok(())
}

/// Serialize `filter` for the requested protocol.
pub fn render_filter(filter: &FilterValue, target: FilterTarget) -> Result<FilterOutput> {
    match target {
        FilterTarget::Textual => Ok(FilterOutput {
            target: "textual".to_string(),
            payload: to_textual(filter)?.to_json()?,
            frame_hex: None,
            frame_bytes: None,
        }),
        FilterTarget::Graphql => Ok(FilterOutput {
            target: "graphql".to_string(),
            payload: serde_json::Value::String(to_textual(filter)?.to_graphql()?),
            frame_hex: None,
            frame_bytes: None,
        }),
        FilterTarget::Binary => {
            let message = to_binary(filter)?;
            let frame = wire::encode(&message)?;
            Ok(FilterOutput {
                target: "binary".to_string(),
                payload: serde_json::to_value(&message)?,
                frame_hex: Some(to_hex(&frame)),
                frame_bytes: Some(frame.len()),
            })
        }
    }
}

fn show_capabilities(args: &CapabilitiesArgs, cli_args: &WeftArgs) -> anyhow::Result<()> {
    let capabilities = Capabilities::from_server_version(&args.server_version)
        .with_context(|| format!("cannot negotiate capabilities for {}", args.server_version))?;
    output_result(
        "Negotiated capabilities",
        &CapabilitiesOutput {
            server_version: args.server_version.clone(),
            capabilities,
        },
        cli_args,
    )?;
    Ok(())
}

fn classify_value(args: &ClassifyArgs, cli_args: &WeftArgs) -> anyhow::Result<()> {
    let value: serde_json::Value =
        serde_json::from_str(&args.value).context("argument is not valid JSON")?;
    let kind = classify_json(&value);
    output_result(
        "Value kind",
        &ClassifyOutput {
            value,
            kind: kind.to_string(),
        },
        cli_args,
    )?;
    Ok(())
}

async fn encode_batch(args: &BatchArgs, cli_args: &WeftArgs) -> anyhow::Result<()> {
    let objects = load_objects(&args.input)?;

    let mut config = BatchEncoderConfig::new(&args.collection).with_yield_every(args.yield_every);
    if let Some(tenant) = &args.tenant {
        config = config.with_tenant(tenant);
    }
    let encoder = BatchEncoder::with_config(config)?;

    let start_time = Instant::now();
    let batch = encoder.encode_batch(objects).await?;
    let mut frame_bytes = 0u64;
    for object in &batch.mapped {
        frame_bytes += wire::encode(object)?.len() as u64;
    }

    output_result(
        "Batch encoded",
        &BatchSummary {
            collection: args.collection.clone(),
            objects: batch.len(),
            frame_bytes,
            duration_ms: start_time.elapsed().as_millis() as u64,
            uuids: batch.correlation.iter().map(|c| c.uuid.clone()).collect(),
        },
        cli_args,
    )?;
    Ok(())
}

/// Read JSON Lines objects. An `id` key becomes the object id, a `vector`
/// array its vector; every other key is a property.
fn load_objects(path: &Path) -> anyhow::Result<Vec<BatchObject>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut objects = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(&line)
            .with_context(|| format!("line {} is not valid JSON", line_num + 1))?;
        let serde_json::Value::Object(map) = value else {
            bail!("line {} is not a JSON object", line_num + 1);
        };

        let mut object = BatchObject::new();
        for (key, value) in map {
            match (key.as_str(), value) {
                ("id", serde_json::Value::String(id)) => object.id = Some(id),
                ("vector", serde_json::Value::Array(items)) => {
                    let vector = items
                        .iter()
                        .map(|v| v.as_f64().map(|f| f as f32))
                        .collect::<Option<Vec<f32>>>()
                        .with_context(|| format!("line {}: vector must be numeric", line_num + 1))?;
                    object.vectors = Some(ObjectVectors::Single(vector));
                }
                (_, value) => {
                    object.properties.insert(key, WeaviateField::from_json(value));
                }
            }
        }
        objects.push(object);
    }
    Ok(objects)
}

fn read_input(input: &str) -> std::io::Result<String> {
    let mut raw = String::new();
    if input == "-" {
        std::io::stdin().read_to_string(&mut raw)?;
    } else {
        File::open(input)?.read_to_string(&mut raw)?;
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, Filters};
    use std::io::Write;
    use tempfile::TempDir;

    fn sample_filter() -> FilterValue {
        Filters::and([
            Filter::by_property("title").like("rust*").unwrap(),
            Filter::by_property("year").greater_than(2015i64).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_render_textual() {
        let output = render_filter(&sample_filter(), FilterTarget::Textual).unwrap();
        assert_eq!(output.payload["operator"], "And");
        assert_eq!(output.payload["operands"][1]["valueInt"], 2015);
        assert!(output.frame_hex.is_none());
    }

    #[test]
    fn test_render_graphql() {
        let output = render_filter(&sample_filter(), FilterTarget::Graphql).unwrap();
        let text = output.payload.as_str().unwrap();
        assert!(text.starts_with("{operator: And"));
    }

    #[test]
    fn test_render_binary_frame() {
        let output = render_filter(&sample_filter(), FilterTarget::Binary).unwrap();
        let bytes = output.frame_bytes.unwrap();
        assert_eq!(output.frame_hex.unwrap().len(), bytes * 2);
    }

    #[test]
    fn test_load_objects() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("objects.jsonl");
        {
            let mut file = File::create(&path).unwrap();
            writeln!(file, r#"{{"id": "a", "title": "Dune", "vector": [0.5, 1]}}"#).unwrap();
            writeln!(file).unwrap();
            writeln!(file, r#"{{"tags": ["x", "y"]}}"#).unwrap();
        }
        let objects = load_objects(&path).unwrap();

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].id.as_deref(), Some("a"));
        assert_eq!(objects[0].properties["title"], WeaviateField::Text("Dune".into()));
        assert!(objects[0].vectors.is_some());
        assert_eq!(
            objects[1].properties["tags"],
            WeaviateField::TextArray(vec!["x".into(), "y".into()])
        );
    }
}
