use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use crate::{EvidenceBlob, Provenance};

/// Black-box programmatic lookup: search precedent trials for one
/// condition/intervention pair and return a printable result.
#[async_trait]
pub trait TrialSearch: Send + Sync {
    async fn search_trials(&self, condition: &str, intervention: &str) -> Result<String>;
}

/// Which real strategy to try first. The synthetic fallback always runs
/// last and is not configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyPreference {
    Cli,
    Programmatic,
}

pub struct ToolRunnerConfig {
    pub command_template: String,
    pub prefer: StrategyPreference,
    pub command_timeout: Duration,
}

/// Runs the external evidence tool, degrading strategy by strategy. The
/// runner itself never fails: when every real strategy is unavailable or
/// errors out, it produces clearly-labelled synthetic evidence.
pub struct ToolRunner {
    config: ToolRunnerConfig,
    programmatic: Option<Arc<dyn TrialSearch>>,
}

enum Strategy {
    Cli,
    Programmatic,
}

impl ToolRunner {
    pub fn new(config: ToolRunnerConfig, programmatic: Option<Arc<dyn TrialSearch>>) -> Self {
        Self {
            config,
            programmatic,
        }
    }

    /// Whether the template's executable resolves on PATH.
    pub fn cli_available(&self) -> bool {
        match self.config.command_template.split_whitespace().next() {
            Some(executable) => which::which(executable).is_ok(),
            None => false,
        }
    }

    /// Execute the strategies in preference order and return the first
    /// successful blob. `condition` and `intervention` are the cleaned
    /// terms handed to the programmatic client.
    pub async fn collect(
        &self,
        commands: &[String],
        condition: &str,
        intervention: &str,
    ) -> EvidenceBlob {
        let order = match self.config.prefer {
            StrategyPreference::Cli => [Strategy::Cli, Strategy::Programmatic],
            StrategyPreference::Programmatic => [Strategy::Programmatic, Strategy::Cli],
        };

        for strategy in order {
            match strategy {
                Strategy::Cli => {
                    if !self.cli_available() {
                        info!("primary tool not on PATH, skipping CLI strategy");
                        continue;
                    }
                    let (text, all_ok) = self.run_cli_batch(commands).await;
                    if all_ok {
                        return EvidenceBlob {
                            text,
                            provenance: Provenance::PrimaryTool,
                        };
                    }
                    warn!("primary tool batch had failures, trying next strategy");
                }
                Strategy::Programmatic => {
                    let Some(client) = &self.programmatic else {
                        info!("no programmatic client configured, skipping");
                        continue;
                    };
                    match client.search_trials(condition, intervention).await {
                        Ok(text) => {
                            return EvidenceBlob {
                                text,
                                provenance: Provenance::ProgrammaticTool,
                            };
                        }
                        Err(err) => {
                            warn!(error = %err, "programmatic lookup failed, trying next strategy");
                        }
                    }
                }
            }
        }

        info!("falling back to synthetic evidence");
        EvidenceBlob {
            text: synthetic_evidence(commands),
            provenance: Provenance::Synthetic,
        }
    }

    /// Run every command even after failures so the transcript is complete;
    /// any failure marks the whole batch failed.
    async fn run_cli_batch(&self, commands: &[String]) -> (String, bool) {
        let mut outputs = Vec::new();
        let mut all_ok = true;
        for command in commands {
            match self.run_single(command).await {
                Ok(output) => outputs.push(format!(">>> {command}\n{}", output.trim())),
                Err(err) => {
                    all_ok = false;
                    warn!(command = %command, error = %err, "tool command failed");
                    outputs.push(format!(">>> {command}\nERROR: {err}"));
                }
            }
        }
        (outputs.join("\n\n"), all_ok)
    }

    async fn run_single(&self, command: &str) -> Result<String> {
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("failed to spawn shell")?;

        let output = tokio::time::timeout(self.config.command_timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "timed out after {}s",
                    self.config.command_timeout.as_secs()
                )
            })?
            .context("failed to collect command output")?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        if !output.status.success() {
            anyhow::bail!("{}: {}", output.status, text.trim());
        }
        Ok(text)
    }
}

/// One synthetic block per command. Figures are uniformly sampled
/// placeholders; the NOTES line plus the `synthetic` provenance keep them
/// from ever being read as sourced data.
fn synthetic_evidence(commands: &[String]) -> String {
    let mut rng = rand::thread_rng();
    commands
        .iter()
        .map(|command| {
            format!(
                ">>> {command}\n\
                 RESULT_COUNT: {count}\n\
                 TOP_SITES: [\"MD Anderson\", \"Mayo Clinic\", \"Memorial Sloan Kettering\", \"Stanford\", \"UCSF\"]\n\
                 AVG_ENROLLMENT_RATE_PM: {rate:.2}\n\
                 SCREEN_FAIL_RATE: {fail:.2}\n\
                 REGIONS: [\"US\", \"EU\", \"APAC\"]\n\
                 HIST_TRIALS_MATCHED: {matched}\n\
                 NOTES: \"Synthetic placeholder values, not sourced from any registry.\"",
                count = rng.gen_range(5..=25),
                rate = rng.gen_range(0.5..6.0),
                fail = rng.gen_range(0.05..0.35),
                matched = rng.gen_range(8..=60),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(
        template: &str,
        prefer: StrategyPreference,
        programmatic: Option<Arc<dyn TrialSearch>>,
    ) -> ToolRunner {
        ToolRunner::new(
            ToolRunnerConfig {
                command_template: template.to_string(),
                prefer,
                command_timeout: Duration::from_secs(5),
            },
            programmatic,
        )
    }

    struct WorkingSearch;

    #[async_trait]
    impl TrialSearch for WorkingSearch {
        async fn search_trials(&self, condition: &str, intervention: &str) -> Result<String> {
            Ok(format!("precedents for {condition} / {intervention}"))
        }
    }

    struct BrokenSearch;

    #[async_trait]
    impl TrialSearch for BrokenSearch {
        async fn search_trials(&self, _condition: &str, _intervention: &str) -> Result<String> {
            anyhow::bail!("api unreachable")
        }
    }

    #[tokio::test]
    async fn cli_strategy_runs_commands_when_available() {
        // `sh` is always resolvable, so templates starting with it probe true.
        let runner = runner("sh -c {condition}", StrategyPreference::Cli, None);
        let blob = runner
            .collect(&["printf 'RESULT_COUNT: 3'".to_string()], "c", "i")
            .await;
        assert_eq!(blob.provenance, Provenance::PrimaryTool);
        assert!(blob.text.contains(">>> printf 'RESULT_COUNT: 3'"));
        assert!(blob.text.contains("RESULT_COUNT: 3"));
    }

    #[tokio::test]
    async fn failed_batch_keeps_running_then_falls_back() {
        let runner = runner("sh -c {condition}", StrategyPreference::Cli, None);
        let blob = runner
            .collect(&["exit 3".to_string(), "printf ok".to_string()], "c", "i")
            .await;
        // Both commands ran, but the batch failed and nothing else is
        // configured, so the blob is synthetic.
        assert_eq!(blob.provenance, Provenance::Synthetic);
        assert!(blob.text.contains("RESULT_COUNT:"));
    }

    #[tokio::test]
    async fn missing_executable_skips_cli() {
        let runner = runner(
            "definitely-not-a-real-tool-on-path search",
            StrategyPreference::Cli,
            Some(Arc::new(WorkingSearch)),
        );
        let blob = runner.collect(&["ignored".to_string()], "T2DM", "GLP-1").await;
        assert_eq!(blob.provenance, Provenance::ProgrammaticTool);
        assert!(blob.text.contains("T2DM / GLP-1"));
    }

    #[tokio::test]
    async fn programmatic_preference_is_honored() {
        let runner = runner(
            "sh -c {condition}",
            StrategyPreference::Programmatic,
            Some(Arc::new(WorkingSearch)),
        );
        let blob = runner.collect(&["printf unused".to_string()], "c", "i").await;
        assert_eq!(blob.provenance, Provenance::ProgrammaticTool);
    }

    #[tokio::test]
    async fn everything_failing_degrades_to_synthetic() {
        let runner = runner(
            "definitely-not-a-real-tool-on-path search",
            StrategyPreference::Cli,
            Some(Arc::new(BrokenSearch)),
        );
        let blob = runner.collect(&["cmd one".to_string()], "c", "i").await;
        assert_eq!(blob.provenance, Provenance::Synthetic);
        assert!(blob.text.contains(">>> cmd one"));
        assert!(blob.text.contains("NOTES:"));
    }

    #[tokio::test]
    async fn commands_time_out() {
        let runner = ToolRunner::new(
            ToolRunnerConfig {
                command_template: "sh -c {condition}".to_string(),
                prefer: StrategyPreference::Cli,
                command_timeout: Duration::from_millis(100),
            },
            None,
        );
        let (text, all_ok) = runner.run_cli_batch(&["sleep 5".to_string()]).await;
        assert!(!all_ok);
        assert!(text.contains("ERROR:"));
        assert!(text.contains("timed out"));
    }

    #[test]
    fn synthetic_blob_is_labelled_per_command() {
        let text = synthetic_evidence(&["alpha".to_string(), "beta".to_string()]);
        assert!(text.contains(">>> alpha"));
        assert!(text.contains(">>> beta"));
        assert_eq!(text.matches("RESULT_COUNT:").count(), 2);
        assert!(text.contains("Synthetic placeholder"));
    }
}
