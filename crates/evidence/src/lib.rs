pub mod commands;
pub mod runner;

pub use commands::{MIN_COMMAND_LIMIT, render_commands};
pub use runner::{StrategyPreference, ToolRunner, ToolRunnerConfig, TrialSearch};

use serde::Serialize;

/// Which execution strategy actually produced the evidence text. Carried
/// through to the report so synthetic figures are never presented as
/// sourced data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    PrimaryTool,
    ProgrammaticTool,
    Synthetic,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Provenance::PrimaryTool => "primary-tool",
            Provenance::ProgrammaticTool => "programmatic-tool",
            Provenance::Synthetic => "synthetic",
        };
        f.write_str(label)
    }
}

/// External evidence plus where it came from.
#[derive(Debug, Clone)]
pub struct EvidenceBlob {
    pub text: String,
    pub provenance: Provenance,
}
