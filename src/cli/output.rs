//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::capabilities::Capabilities;
use crate::cli::args::{OutputFormat, WeftArgs};
use crate::error::Result;

/// Result structure for filter serialization.
#[derive(Debug, Serialize, Deserialize)]
pub struct FilterOutput {
    pub target: String,
    /// Rendered payload: JSON for textual, GraphQL argument text, or a JSON view
    /// of the binary message.
    pub payload: serde_json::Value,
    /// Hex of the framed binary message.
    pub frame_hex: Option<String>,
    pub frame_bytes: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CapabilitiesOutput {
    pub server_version: String,
    pub capabilities: Capabilities,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyOutput {
    pub value: serde_json::Value,
    pub kind: String,
}

/// Result structure for batch encoding.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchSummary {
    pub collection: String,
    pub objects: usize,
    pub frame_bytes: u64,
    pub duration_ms: u64,
    pub uuids: Vec<String>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &WeftArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

fn output_human<T: Serialize>(message: &str, result: &T, args: &WeftArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    match &value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                if key == "frame_bytes" {
                    if let Some(n) = val.as_u64() {
                        println!("{key}: {}", format_bytes(n));
                        continue;
                    }
                }
                println!("{key}: {}", format_value(val));
            }
        }
        _ => println!("{}", format_value(&value)),
    }
    Ok(())
}

fn output_json<T: Serialize>(result: &T, args: &WeftArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => value.to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}

/// Lowercase hex of a byte buffer.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Format bytes into human-readable format.
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    let unit = UNITS[unit_index];
    if unit_index == 0 {
        format!("{bytes} {unit}")
    } else {
        format!("{size:.1} {unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&serde_json::json!("test")), "test");
        assert_eq!(format_value(&serde_json::json!(42)), "42");
        assert_eq!(format_value(&serde_json::json!([1, "a"])), "[1, a]");
        assert_eq!(format_value(&serde_json::json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(format_value(&serde_json::Value::Null), "null");
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0x00, 0x0f, 0xff]), "000fff");
        assert_eq!(to_hex(&[]), "");
    }
}
