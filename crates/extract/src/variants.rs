use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

use crate::entities::TrialEntities;

/// One condition/intervention combination to query external sources with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryPair {
    pub condition: String,
    pub intervention: String,
}

/// Expand extracted entities into the query pairs worth trying, plus the
/// canonical `condition|intervention` key naming the run.
///
/// Condition variants: cleaned term, parenthetical abbreviations from the
/// raw term, aliases, then the raw term itself when it differs from the
/// cleaned one. Intervention variants are built the same way minus aliases.
/// Both lists keep first-seen order and drop duplicates, so the cross
/// product is duplicate-free as well.
pub fn build_variants(entities: &TrialEntities) -> (Vec<QueryPair>, String) {
    let condition = entities.condition.trim();
    let intervention = entities.intervention.trim();
    let condition_clean = clean_or_raw(&entities.condition_clean, condition);
    let intervention_clean = clean_or_raw(&entities.intervention_clean, intervention);

    let mut condition_variants = vec![condition_clean.clone()];
    condition_variants.extend(parenthetical_abbreviations(condition));
    condition_variants.extend(entities.aliases.iter().map(|a| a.trim().to_string()));
    if condition != condition_clean {
        condition_variants.push(condition.to_string());
    }
    let condition_variants = dedup_preserving(condition_variants);

    let mut intervention_variants = vec![intervention_clean.clone()];
    intervention_variants.extend(parenthetical_abbreviations(intervention));
    if intervention != intervention_clean {
        intervention_variants.push(intervention.to_string());
    }
    let intervention_variants = dedup_preserving(intervention_variants);

    let mut pairs = Vec::with_capacity(condition_variants.len() * intervention_variants.len());
    for c in &condition_variants {
        for i in &intervention_variants {
            pairs.push(QueryPair {
                condition: c.clone(),
                intervention: i.clone(),
            });
        }
    }

    let canonical = format!("{condition_clean}|{intervention_clean}");
    (pairs, canonical)
}

fn clean_or_raw(clean: &str, raw: &str) -> String {
    let clean = clean.trim();
    if clean.is_empty() {
        raw.to_string()
    } else {
        clean.to_string()
    }
}

/// `(T2DM)` style abbreviations embedded in a raw term.
pub fn parenthetical_abbreviations(term: &str) -> Vec<String> {
    let re = Regex::new(r"\(([A-Za-z0-9\-]+)\)").unwrap();
    re.captures_iter(term)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// First-seen-wins dedup that also drops empty entries.
pub fn dedup_preserving(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        if value.is_empty() {
            continue;
        }
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn t2dm_entities() -> TrialEntities {
        TrialEntities::from_value(&json!({
            "condition": "Type 2 Diabetes Mellitus (T2DM)",
            "intervention": "GLP-1 Agonist",
            "aliases": ["T2DM", "Type 2 Diabetes"]
        }))
    }

    #[test]
    fn builds_cross_product_with_canonical_key() {
        let (pairs, canonical) = build_variants(&t2dm_entities());
        assert_eq!(canonical, "Type 2 Diabetes Mellitus|GLP-1 Agonist");

        // Cleaned pair first, then abbreviation, alias and raw variants.
        assert_eq!(
            pairs[0],
            QueryPair {
                condition: "Type 2 Diabetes Mellitus".into(),
                intervention: "GLP-1 Agonist".into(),
            }
        );
        let conditions: Vec<&str> = pairs.iter().map(|p| p.condition.as_str()).collect();
        assert_eq!(
            conditions,
            vec![
                "Type 2 Diabetes Mellitus",
                "T2DM",
                "Type 2 Diabetes",
                "Type 2 Diabetes Mellitus (T2DM)",
            ]
        );
    }

    #[test]
    fn pairs_are_duplicate_free() {
        let (pairs, _) = build_variants(&t2dm_entities());
        let unique: HashSet<&QueryPair> = pairs.iter().collect();
        assert_eq!(unique.len(), pairs.len());
    }

    #[test]
    fn unknown_entities_still_produce_one_pair() {
        let (pairs, canonical) = build_variants(&TrialEntities::default());
        assert_eq!(pairs.len(), 1);
        assert_eq!(canonical, "Unknown|Unknown");
    }

    #[test]
    fn empty_cleaned_term_falls_back_to_raw() {
        let entities = TrialEntities::from_value(&json!({
            "condition": "(XYZ)",
            "intervention": "Drug A"
        }));
        assert_eq!(entities.condition_clean, "");
        let (pairs, canonical) = build_variants(&entities);
        assert_eq!(canonical, "(XYZ)|Drug A");
        assert!(pairs.iter().any(|p| p.condition == "(XYZ)"));
    }

    #[test]
    fn abbreviations_are_pulled_from_parentheses() {
        assert_eq!(
            parenthetical_abbreviations("Non-Small Cell Lung Cancer (NSCLC) (Stage IV)"),
            vec!["NSCLC".to_string()]
        );
    }

    #[test]
    fn dedup_preserves_first_seen_order() {
        let out = dedup_preserving(vec![
            "b".into(),
            "".into(),
            "a".into(),
            "b".into(),
        ]);
        assert_eq!(out, vec!["b".to_string(), "a".to_string()]);
    }
}
