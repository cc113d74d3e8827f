//! Common utility functions shared across CLI commands.

use std::io::Read;

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;
use tracing::{debug, warn};

/// Read a challenge document from a file path, or stdin when `path` is `-`.
pub fn read_input(path: &str) -> Result<String> {
    let text = if path == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read input from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {path}"))?
    };

    debug!(source = path, bytes = text.len(), "Read input");
    Ok(text)
}

/// Render JSON for stdout.
pub fn render_json(value: &Value, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.context("Failed to serialize output")
}

/// First bytes of an id as hex, for log lines and summaries.
pub fn short_hex(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(8)])
}

pub fn warn_mock_authenticator(quiet: bool) {
    warn!("Using MOCK authenticator (signatures will not verify!)");
    if !quiet {
        eprintln!(
            "{}",
            "Using MOCK authenticator (signatures will not verify!)".yellow()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hex() {
        assert_eq!(short_hex(&[0xde, 0xad]), "dead");
        assert_eq!(short_hex(&[0xab; 16]), "abababababababab");
        assert_eq!(short_hex(&[]), "");
    }

    #[test]
    fn test_render_json() {
        let value = serde_json::json!({ "id": "AQID" });
        assert_eq!(render_json(&value, false).unwrap(), r#"{"id":"AQID"}"#);
        assert!(render_json(&value, true).unwrap().contains('\n'));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_input("definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read input file"));
    }
}
