//! Runtime configuration loaded from a YAML file.

use anyhow::{Context, Result, bail};
use evidence::StrategyPreference;
use extract::{LlamaServerGenerator, OllamaGenerator, TextGenerator};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Embedding service used to build the protocol vector index.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Directory the vector index artifacts are written to.
    #[serde(default = "default_index_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

/// Text-generation backend. Exactly one of the nested blocks is used,
/// selected by `backend`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub llama_server: LlamaServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    #[serde(default = "default_generation_model")]
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlamaServerConfig {
    #[serde(default = "default_llama_server_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: i32,
}

/// External evidence tool. The template must carry `{condition}` and
/// `{intervention}` placeholders.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_command_template")]
    pub command_template: String,

    /// How many variant pairs to render into commands (floored at 5).
    #[serde(default = "default_variants")]
    pub variants: usize,

    #[serde(default = "default_prefer")]
    pub prefer: StrategyPreference,

    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_base_url")]
    pub base_url: String,

    /// Records requested per variant query (the registry caps this at 100).
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    #[serde(default = "default_registry_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_pairs")]
    pub max_pairs: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Protocol excerpts injected into each section prompt.
    #[serde(default = "default_max_context_chunks")]
    pub max_context_chunks: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_evidence_file")]
    pub evidence_file: PathBuf,

    #[serde(default = "default_matches_file")]
    pub matches_file: PathBuf,

    #[serde(default = "default_report_markdown")]
    pub report_markdown: PathBuf,

    #[serde(default = "default_report_text")]
    pub report_text: PathBuf,

    #[serde(default = "default_summary_file")]
    pub summary_file: PathBuf,
}

impl Config {
    /// Load config from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Startup-time validation. Violations here are configuration errors
    /// and abort the run before any work happens.
    pub fn validate(&self) -> Result<()> {
        let template = &self.tool.command_template;
        if !template.contains("{condition}") || !template.contains("{intervention}") {
            bail!(
                "tool.command_template must contain {{condition}} and {{intervention}} placeholders"
            );
        }
        if self.index.chunk_size == 0 {
            bail!("index.chunk_size must be greater than zero");
        }
        match self.generation.backend.as_str() {
            "ollama" | "llama_server" => Ok(()),
            other => bail!("Unsupported generation backend: {}", other),
        }
    }

    /// Instantiate the configured generation backend.
    pub fn build_generator(&self) -> Result<Arc<dyn TextGenerator>> {
        match self.generation.backend.as_str() {
            "ollama" => {
                let ollama = &self.generation.ollama;
                Ok(Arc::new(OllamaGenerator::new(
                    ollama.base_url.clone(),
                    ollama.model.clone(),
                )))
            }
            "llama_server" => {
                let server = &self.generation.llama_server;
                Ok(Arc::new(LlamaServerGenerator::new(
                    server.base_url.clone(),
                    server.temperature,
                    server.top_p,
                    server.max_tokens,
                )))
            }
            other => bail!("Unsupported generation backend: {}", other),
        }
    }

    pub fn chunker_config(&self) -> ingest::ChunkerConfig {
        ingest::ChunkerConfig {
            target_size: self.index.chunk_size,
            overlap: self.index.chunk_overlap,
        }
    }

    pub fn tool_runner_config(&self) -> evidence::ToolRunnerConfig {
        evidence::ToolRunnerConfig {
            command_template: self.tool.command_template.clone(),
            prefer: self.tool.prefer,
            command_timeout: Duration::from_secs(self.tool.command_timeout_secs),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            ollama: OllamaConfig::default(),
            llama_server: LlamaServerConfig::default(),
        }
    }
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_embedding_model(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_generation_model(),
        }
    }
}

impl Default for LlamaServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_llama_server_url(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            command_template: default_command_template(),
            variants: default_variants(),
            prefer: default_prefer(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_registry_base_url(),
            max_records: default_max_records(),
            timeout_secs: default_registry_timeout_secs(),
            max_pairs: default_max_pairs(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_context_chunks: default_max_context_chunks(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            evidence_file: default_evidence_file(),
            matches_file: default_matches_file(),
            report_markdown: default_report_markdown(),
            report_text: default_report_text(),
            summary_file: default_summary_file(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_batch_size() -> usize {
    16
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("data/index")
}

fn default_chunk_size() -> usize {
    2500
}

fn default_chunk_overlap() -> usize {
    300
}

fn default_backend() -> String {
    "ollama".to_string()
}

fn default_generation_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_llama_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_tokens() -> i32 {
    1536
}

fn default_command_template() -> String {
    "biomcp trial search --condition \"{condition}\" --intervention \"{intervention}\" --json"
        .to_string()
}

fn default_variants() -> usize {
    6
}

fn default_prefer() -> StrategyPreference {
    StrategyPreference::Cli
}

fn default_command_timeout_secs() -> u64 {
    600
}

fn default_registry_base_url() -> String {
    registry::DEFAULT_BASE_URL.to_string()
}

fn default_max_records() -> usize {
    100
}

fn default_registry_timeout_secs() -> u64 {
    30
}

fn default_max_pairs() -> usize {
    6
}

fn default_max_context_chunks() -> usize {
    20
}

fn default_evidence_file() -> PathBuf {
    PathBuf::from("data/evidence.txt")
}

fn default_matches_file() -> PathBuf {
    PathBuf::from("data/registry_matches.jsonl")
}

fn default_report_markdown() -> PathBuf {
    PathBuf::from("output/report.md")
}

fn default_report_text() -> PathBuf {
    PathBuf::from("output/report.txt")
}

fn default_summary_file() -> PathBuf {
    PathBuf::from("data/run_summary.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete_and_valid() {
        let config = Config::default();
        config.validate().unwrap();

        assert_eq!(config.generation.backend, "ollama");
        assert_eq!(config.index.chunk_size, 2500);
        assert_eq!(config.index.chunk_overlap, 300);
        assert_eq!(config.tool.variants, 6);
        assert_eq!(config.registry.max_records, 100);
        assert_eq!(config.analysis.max_context_chunks, 20);
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_the_rest() {
        let yaml = r#"
generation:
  backend: llama_server
  llama_server:
    base_url: http://gpu-box:8080
tool:
  prefer: programmatic
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.generation.backend, "llama_server");
        assert_eq!(config.generation.llama_server.base_url, "http://gpu-box:8080");
        assert_eq!(config.generation.llama_server.temperature, 0.2);
        assert_eq!(config.tool.prefer, StrategyPreference::Programmatic);
        assert_eq!(config.embeddings.model, "nomic-embed-text");
    }

    #[test]
    fn template_without_placeholders_is_rejected() {
        let mut config = Config::default();
        config.tool.command_template = "biomcp trial search".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("command_template"));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut config = Config::default();
        config.generation.backend = "gpt-webui".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unsupported generation backend"));
    }

    #[test]
    fn build_generator_honors_backend_choice() {
        let mut config = Config::default();
        assert!(config.build_generator().is_ok());

        config.generation.backend = "llama_server".to_string();
        assert!(config.build_generator().is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Path::new("does-not-exist.yaml")).unwrap();
        assert_eq!(config.generation.backend, "ollama");
    }
}
