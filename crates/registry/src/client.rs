use anyhow::{Context, Result};
use extract::{TrialEntities, build_variants};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://clinicaltrials.gov/api/v2/studies";

const MAX_PAGE_SIZE: usize = 100;
const RETRY_ATTEMPTS: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

pub struct RegistryClient {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl RegistryClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build registry HTTP client")?;
        Ok(Self {
            base_url,
            client,
            retry: RetryPolicy::new(RETRY_ATTEMPTS, RETRY_DELAY),
        })
    }

    /// One registry query with the fixed retry policy applied. `limit` is
    /// clamped to the registry's page-size ceiling.
    pub async fn query(&self, condition: &str, intervention: &str, limit: usize) -> Result<Value> {
        self.retry
            .run("registry query", || {
                self.query_once(condition, intervention, limit)
            })
            .await
    }

    async fn query_once(&self, condition: &str, intervention: &str, limit: usize) -> Result<Value> {
        let page_size = limit.min(MAX_PAGE_SIZE).to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("format", "json"),
                ("query.cond", condition),
                ("query.intr", intervention),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .context("Failed to send registry request")?;

        if !response.status().is_success() {
            anyhow::bail!("Registry request failed: {}", response.status());
        }
        response
            .json()
            .await
            .context("Failed to parse registry response")
    }

    /// Query the registry for the leading variant pairs. A pair that fails
    /// all its attempts is logged and skipped; partial coverage beats an
    /// aborted run.
    pub async fn query_variants(
        &self,
        entities: &TrialEntities,
        limit: usize,
        max_pairs: usize,
    ) -> Vec<Value> {
        let (pairs, _) = build_variants(entities);
        let mut payloads = Vec::new();
        for pair in pairs.iter().take(max_pairs) {
            match self.query(&pair.condition, &pair.intervention, limit).await {
                Ok(payload) => payloads.push(payload),
                Err(err) => warn!(
                    condition = %pair.condition,
                    intervention = %pair.intervention,
                    error = %err,
                    "variant query failed, skipping pair"
                ),
            }
        }
        info!(
            pairs_tried = pairs.len().min(max_pairs),
            payloads = payloads.len(),
            "registry variant sweep finished"
        );
        payloads
    }
}
