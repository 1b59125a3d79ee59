use evidence::{EvidenceBlob, Provenance};
use extract::UNKNOWN;
use ingest::Chunk;
use registry::StudyRecord;

/// Chunks mentioning any of these terms are preferred when budgeting
/// protocol excerpts for a section prompt.
const CONTEXT_KEYWORDS: &[&str] = &[
    "inclusion",
    "exclusion",
    "eligibility",
    "endpoint",
    "visit",
    "schedule",
    "site selection",
    "feasibility",
    "recruit",
    "enrollment",
    "budget",
    "cost",
    "monitoring",
    "sdv",
    "decentralized",
    "randomization",
    "statistics",
    "power",
    "sample size",
    "drug supply",
    "safety",
    "dsmb",
    "pharmacovigilance",
    "logistics",
    "labs",
    "epro",
    "ecoa",
    "iwrs",
    "edc",
    "diversity",
    "regulatory",
];

/// Per-excerpt character budget for protocol chunks.
pub const CHUNK_EXCERPT_CHARS: usize = 3000;
/// Character budget for the external evidence blob.
pub const EVIDENCE_EXCERPT_CHARS: usize = 7000;
/// Maximum registry precedent lines rendered into a prompt.
pub const MAX_PRECEDENT_LINES: usize = 30;

/// Everything injected into one section prompt. Assembled fresh for each
/// section and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct GroundedContext {
    /// Protocol excerpts keyed by chunk ordinal, so citations stay stable
    /// as `[Prot:ordinal]` regardless of selection order.
    pub excerpts: Vec<(usize, String)>,
    pub evidence: String,
    pub provenance: Provenance,
    pub precedents: Vec<String>,
}

impl GroundedContext {
    /// Selects up to `max_chunks` protocol excerpts (keyword hits first,
    /// every chunk as fallback), caps the evidence blob, and renders the
    /// precedent listing.
    pub fn assemble(
        chunks: &[Chunk],
        evidence: &EvidenceBlob,
        records: &[StudyRecord],
        max_chunks: usize,
    ) -> Self {
        let mut preferred: Vec<&Chunk> = chunks
            .iter()
            .filter(|chunk| {
                let lower = chunk.text.to_lowercase();
                CONTEXT_KEYWORDS.iter().any(|kw| lower.contains(kw))
            })
            .collect();
        if preferred.is_empty() {
            preferred = chunks.iter().collect();
        }

        let excerpts = preferred
            .into_iter()
            .take(max_chunks)
            .map(|chunk| (chunk.id, head_chars(&chunk.text, CHUNK_EXCERPT_CHARS).to_string()))
            .collect();

        let precedents = records
            .iter()
            .take(MAX_PRECEDENT_LINES)
            .map(precedent_line)
            .collect();

        Self {
            excerpts,
            evidence: head_chars(&evidence.text, EVIDENCE_EXCERPT_CHARS).to_string(),
            provenance: evidence.provenance,
            precedents,
        }
    }
}

/// One-line precedent summary. Missing fields render as "Unknown" so the
/// model never has to guess what a blank means.
fn precedent_line(record: &StudyRecord) -> String {
    let id = record.nct_id.as_deref().unwrap_or(UNKNOWN);
    let title = record.brief_title.as_deref().unwrap_or(UNKNOWN);
    let status = record.overall_status.as_deref().unwrap_or(UNKNOWN);
    let phase = if record.phases.is_empty() {
        UNKNOWN.to_string()
    } else {
        record.phases.join(", ")
    };
    format!("[CTGov {id}] {title} | status={status} | phase={phase}")
}

/// First `n` characters of `s`, respecting char boundaries.
fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
