//! Protocol analysis pipeline: chunk a protocol document, extract trial
//! entities, gather external evidence and registry precedents, then write
//! a grounded narrative report.

mod config;
mod search;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use config::Config;
use evidence::ToolRunner;
use extract::EntityExtractor;
use index::{OllamaEmbedder, Retriever};
use registry::RegistryClient;
use report::Analyzer;
use search::RegistrySearch;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "protocol-analyzer")]
#[command(about = "Grounded operational analysis of clinical trial protocols")]
struct Cli {
    /// Protocol document (.txt or .md)
    #[arg(long)]
    protocol: PathBuf,

    /// YAML configuration file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[derive(Serialize)]
struct RunSummary {
    protocol: String,
    chunks: usize,
    condition: String,
    intervention: String,
    variant_pairs: usize,
    evidence_provenance: String,
    registry_records: usize,
    sections: usize,
    report_markdown: String,
    report_text: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Step 1: Load and validate configuration
    let config = Config::load(&cli.config)?;
    config.validate()?;

    // Step 2: Read, clean and chunk the protocol
    let chunks = ingest::ingest_document(&cli.protocol, config.chunker_config()).await?;
    ensure!(!chunks.is_empty(), "Protocol produced no usable chunks");
    info!(chunks = chunks.len(), "protocol chunked");

    // Step 3: Embed chunks and persist the vector index
    let embedder = Arc::new(OllamaEmbedder::new(
        config.embeddings.base_url.clone(),
        config.embeddings.model.clone(),
        config.embeddings.batch_size,
    ));
    Retriever::build(chunks.clone(), &config.index.dir, embedder)
        .await
        .context("Failed to build the protocol vector index")?;

    // Step 4: Extract condition and intervention entities
    let generator = config.build_generator()?;
    let extractor = EntityExtractor::new(generator.clone());
    let entities = extractor.extract(&chunks).await?;
    info!(
        condition = %entities.condition,
        intervention = %entities.intervention,
        "entities extracted"
    );

    // Step 5: Collect external evidence for the variant pairs
    let (pairs, canonical) = extract::build_variants(&entities);
    let commands =
        evidence::render_commands(&config.tool.command_template, &pairs, config.tool.variants);
    info!(commands = commands.len(), canonical = %canonical, "rendered tool commands");

    let client = Arc::new(RegistryClient::new(
        config.registry.base_url.clone(),
        Duration::from_secs(config.registry.timeout_secs),
    )?);
    let runner = ToolRunner::new(
        config.tool_runner_config(),
        Some(Arc::new(RegistrySearch::new(
            client.clone(),
            config.registry.max_records,
        ))),
    );
    let condition = pick(&entities.condition_clean, &entities.condition);
    let intervention = pick(&entities.intervention_clean, &entities.intervention);
    let blob = runner.collect(&commands, condition, intervention).await;
    write_artifact(&config.output.evidence_file, &blob.text).await?;
    info!(
        provenance = %blob.provenance,
        file = %config.output.evidence_file.display(),
        "evidence collected"
    );

    // Step 6: Sweep the registry for precedent trials
    let payloads = client
        .query_variants(&entities, config.registry.max_records, config.registry.max_pairs)
        .await;
    let records = registry::dedupe(payloads.iter().flat_map(registry::simplify).collect());
    let mut jsonl = String::new();
    for record in &records {
        jsonl.push_str(&serde_json::to_string(record)?);
        jsonl.push('\n');
    }
    write_artifact(&config.output.matches_file, &jsonl).await?;
    info!(records = records.len(), "registry precedents deduplicated");

    // Step 7: Generate the narrative report and its paginated rendering
    let analyzer = Analyzer::new(generator.clone());
    let markdown = analyzer
        .analyze(&chunks, &blob, &records, config.analysis.max_context_chunks)
        .await?;
    write_artifact(&config.output.report_markdown, &markdown).await?;
    let text = report::paginate(&markdown, report::PAGE_WIDTH, report::PAGE_LINES);
    write_artifact(&config.output.report_text, &text).await?;

    // Step 8: Persist the run summary
    let summary = RunSummary {
        protocol: cli.protocol.display().to_string(),
        chunks: chunks.len(),
        condition: entities.condition.clone(),
        intervention: entities.intervention.clone(),
        variant_pairs: pairs.len(),
        evidence_provenance: blob.provenance.to_string(),
        registry_records: records.len(),
        sections: report::SECTIONS.len(),
        report_markdown: config.output.report_markdown.display().to_string(),
        report_text: config.output.report_text.display().to_string(),
    };
    write_artifact(
        &config.output.summary_file,
        &serde_json::to_string_pretty(&summary)?,
    )
    .await?;

    println!("{}", "=".repeat(80));
    println!("Analysis complete.");
    println!("  Markdown report:  {}", config.output.report_markdown.display());
    println!("  Text report:      {}", config.output.report_text.display());
    println!(
        "  Evidence feed:    {} ({})",
        config.output.evidence_file.display(),
        blob.provenance
    );
    println!(
        "  Registry matches: {} ({} records)",
        config.output.matches_file.display(),
        records.len()
    );
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Cleaned term when present, raw extraction otherwise.
fn pick<'a>(clean: &'a str, raw: &'a str) -> &'a str {
    if clean.trim().is_empty() { raw } else { clean }
}

async fn write_artifact(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
