pub mod entities;
pub mod llm;
pub mod prompt;
pub mod response;
pub mod variants;

pub use entities::{TrialEntities, UNKNOWN, clean_term};
pub use llm::{LlamaServerGenerator, OllamaGenerator, TextGenerator};
pub use response::{JsonScanError, scan_json_object};
pub use variants::{QueryPair, build_variants, dedup_preserving};

use anyhow::Result;
use ingest::Chunk;
use std::sync::Arc;
use tracing::{info, warn};

/// Chunks worth showing the extractor mention at least one of these.
pub const EXTRACTION_KEYWORDS: &[&str] = &[
    "indication",
    "disease",
    "condition",
    "intervention",
    "investigational product",
    "drug",
    "therapy",
    "biologic",
    "device",
];

const MAX_CONTEXT_CHUNKS: usize = 20;
const EXCERPT_CHARS: usize = 3000;

pub struct EntityExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl EntityExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Pull condition, intervention and aliases out of the protocol.
    /// Malformed model output degrades to all-Unknown entities; only a
    /// failed generation request surfaces as an error.
    pub async fn extract(&self, chunks: &[Chunk]) -> Result<TrialEntities> {
        let contexts = grounding_excerpts(chunks);
        let prompt = prompt::build_entity_prompt(&contexts);
        let raw = self.generator.generate(&prompt).await?;

        let entities = match scan_json_object(&raw) {
            Ok(value) => TrialEntities::from_value(&value),
            Err(err) => {
                warn!(error = %err, "unusable extraction output, defaulting to Unknown");
                TrialEntities::default()
            }
        };
        info!(
            condition = %entities.condition,
            intervention = %entities.intervention,
            aliases = entities.aliases.len(),
            "trial entities extracted"
        );
        Ok(entities)
    }
}

/// Keyword-filtered chunk excerpts, at most `MAX_CONTEXT_CHUNKS` of them,
/// each capped at `EXCERPT_CHARS` characters.
fn grounding_excerpts(chunks: &[Chunk]) -> Vec<String> {
    chunks
        .iter()
        .filter(|chunk| {
            let lower = chunk.text.to_lowercase();
            EXTRACTION_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .take(MAX_CONTEXT_CHUNKS)
        .map(|chunk| excerpt(&chunk.text, EXCERPT_CHARS).to_string())
        .collect()
}

fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Canned(&'static str);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Offline;

    #[async_trait]
    impl TextGenerator for Offline {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            anyhow::bail!("backend unreachable")
        }
    }

    fn chunks() -> Vec<Chunk> {
        vec![
            Chunk::new(0, "The condition under study is type 2 diabetes mellitus.".into()),
            Chunk::new(1, "Visit schedule and logistics.".into()),
        ]
    }

    #[tokio::test]
    async fn parses_entities_from_noisy_output() {
        let raw = "Here is the JSON you asked for:\n{\"condition\": \"Type 2 Diabetes Mellitus (T2DM)\", \"intervention\": \"GLP-1 Agonist\", \"aliases\": [\"T2DM\"]}\nHope this helps.";
        let extractor = EntityExtractor::new(Arc::new(Canned(raw)));
        let entities = extractor.extract(&chunks()).await.unwrap();
        assert_eq!(entities.condition, "Type 2 Diabetes Mellitus (T2DM)");
        assert_eq!(entities.condition_clean, "Type 2 Diabetes Mellitus");
        assert_eq!(entities.intervention, "GLP-1 Agonist");
        assert_eq!(entities.aliases, vec!["T2DM".to_string()]);
    }

    #[tokio::test]
    async fn malformed_output_degrades_to_unknown() {
        let extractor = EntityExtractor::new(Arc::new(Canned("I could not find anything.")));
        let entities = extractor.extract(&chunks()).await.unwrap();
        assert!(entities.is_unknown());
        assert!(entities.aliases.is_empty());
    }

    #[tokio::test]
    async fn generation_failure_is_an_error() {
        let extractor = EntityExtractor::new(Arc::new(Offline));
        assert!(extractor.extract(&chunks()).await.is_err());
    }

    #[test]
    fn excerpts_filter_by_keyword() {
        let contexts = grounding_excerpts(&chunks());
        assert_eq!(contexts.len(), 1);
        assert!(contexts[0].contains("type 2 diabetes"));
    }

    #[test]
    fn excerpts_are_char_capped() {
        let long = Chunk::new(0, format!("indication {}", "x".repeat(5000)));
        let contexts = grounding_excerpts(&[long]);
        assert_eq!(contexts[0].chars().count(), EXCERPT_CHARS);
    }
}
