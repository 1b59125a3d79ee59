//! Programmatic evidence strategy backed by the trial registry.

use anyhow::{Result, ensure};
use async_trait::async_trait;
use evidence::TrialSearch;
use extract::UNKNOWN;
use registry::{RegistryClient, StudyRecord, simplify};
use std::sync::Arc;

/// Fallback evidence source used when the primary CLI tool is missing or
/// fails: query the registry directly and render the matches as text.
pub struct RegistrySearch {
    client: Arc<RegistryClient>,
    limit: usize,
}

impl RegistrySearch {
    pub fn new(client: Arc<RegistryClient>, limit: usize) -> Self {
        Self { client, limit }
    }
}

#[async_trait]
impl TrialSearch for RegistrySearch {
    async fn search_trials(&self, condition: &str, intervention: &str) -> Result<String> {
        let payload = self.client.query(condition, intervention, self.limit).await?;
        let records = simplify(&payload);
        ensure!(!records.is_empty(), "registry returned no matching trials");

        Ok(format!(
            "PROGRAMMATIC TRIAL SEARCH: condition={condition} intervention={intervention}\n{}",
            render_records(&records)
        ))
    }
}

fn render_records(records: &[StudyRecord]) -> String {
    records
        .iter()
        .map(|record| {
            let phases = if record.phases.is_empty() {
                UNKNOWN.to_string()
            } else {
                record.phases.join(", ")
            };
            format!(
                "{} | {} | status={} | phases={}",
                record.nct_id.as_deref().unwrap_or(UNKNOWN),
                record.brief_title.as_deref().unwrap_or(UNKNOWN),
                record.overall_status.as_deref().unwrap_or(UNKNOWN),
                phases,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
