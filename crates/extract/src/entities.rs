use regex::Regex;
use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";

/// What the pipeline knows about the trial after extraction. The `*_clean`
/// fields are registry-friendly forms of the raw terms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrialEntities {
    pub condition: String,
    pub intervention: String,
    pub aliases: Vec<String>,
    pub condition_clean: String,
    pub intervention_clean: String,
}

impl Default for TrialEntities {
    fn default() -> Self {
        Self {
            condition: UNKNOWN.to_string(),
            intervention: UNKNOWN.to_string(),
            aliases: Vec::new(),
            condition_clean: UNKNOWN.to_string(),
            intervention_clean: UNKNOWN.to_string(),
        }
    }
}

impl TrialEntities {
    /// Build from a scanned JSON object, applying the default policy for
    /// missing, empty or malformed fields. A lone alias string is promoted
    /// to a one-element list.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let mut entities = Self::default();
        if let Some(condition) = non_empty_str(value.get("condition")) {
            entities.condition = condition;
        }
        if let Some(intervention) = non_empty_str(value.get("intervention")) {
            entities.intervention = intervention;
        }
        entities.aliases = match value.get("aliases") {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
                vec![s.trim().to_string()]
            }
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        };
        entities.condition_clean = clean_term(&entities.condition);
        entities.intervention_clean = clean_term(&entities.intervention);
        entities
    }

    pub fn is_unknown(&self) -> bool {
        self.condition == UNKNOWN && self.intervention == UNKNOWN
    }
}

fn non_empty_str(value: Option<&serde_json::Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalize a raw extracted term for querying: parentheticals dropped,
/// only the first of several slash/comma alternatives kept, whitespace
/// collapsed, stray punctuation trimmed. Can return an empty string when
/// the input had no queryable core.
pub fn clean_term(term: &str) -> String {
    if term.trim().is_empty() {
        return String::new();
    }
    let no_parens = Regex::new(r"\([^)]*\)").unwrap().replace_all(term, "");
    let first = Regex::new(r"[/,;]")
        .unwrap()
        .split(&no_parens)
        .next()
        .unwrap_or("")
        .to_string();
    let collapsed = Regex::new(r"\s+").unwrap().replace_all(&first, " ");
    collapsed
        .trim()
        .trim_matches(|c: char| matches!(c, '-' | ')' | ']' | '.' | ' '))
        .to_string()
}
