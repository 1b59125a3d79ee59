use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use tokio::fs;

pub struct DocumentReader;

impl DocumentReader {
    /// Read a protocol document. Only plain-text formats are accepted;
    /// anything else must be converted before ingestion.
    pub async fn load(path: &Path) -> Result<String> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "txt" | "md" => {
                let content = fs::read_to_string(path)
                    .await
                    .context(format!("Failed to read protocol: {:?}", path))?;
                Ok(content)
            }
            _ => anyhow::bail!("Unsupported protocol format: {}", extension),
        }
    }
}

/// Normalize extraction artifacts common in converted protocol documents:
/// collapsed horizontal whitespace, capped blank runs, and words hyphenated
/// across a line break stitched back together.
pub fn clean_text(raw: &str) -> String {
    let spaces = Regex::new(r"[ \t]+").unwrap();
    let blank_runs = Regex::new(r"\n{3,}").unwrap();
    let hyphen_breaks = Regex::new(r"(\w+)-\n(\w+)").unwrap();

    let text = spaces.replace_all(raw, " ");
    let text = blank_runs.replace_all(&text, "\n\n");
    hyphen_breaks.replace_all(&text, "${1}${2}").to_string()
}
