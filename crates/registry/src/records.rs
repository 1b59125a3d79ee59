use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Flat projection of one registry study entry. Field names stay camelCase
/// on disk so the JSONL artifact mirrors the registry's own vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudyRecord {
    pub nct_id: Option<String>,
    pub brief_title: Option<String>,
    pub overall_status: Option<String>,
    pub start_date: Option<String>,
    pub completion_date: Option<String>,
    pub study_type: Option<String>,
    pub phases: Vec<String>,
    pub conditions: Vec<String>,
    pub interventions: Vec<Value>,
}

/// Project the nested registry payload down to `StudyRecord`s. Absent
/// modules or fields become `None`/empty rather than errors; registry
/// payloads are inconsistently populated.
pub fn simplify(payload: &Value) -> Vec<StudyRecord> {
    let Some(studies) = payload.get("studies").and_then(Value::as_array) else {
        return Vec::new();
    };

    studies
        .iter()
        .map(|study| {
            let protocol = study.get("protocolSection");
            let ident = module(protocol, "identificationModule");
            let status = module(protocol, "statusModule");
            let design = module(protocol, "designModule");
            let conditions = module(protocol, "conditionsModule");
            let arms = module(protocol, "armsInterventionsModule");

            StudyRecord {
                nct_id: text(ident, "nctId"),
                brief_title: text(ident, "briefTitle"),
                overall_status: text(status, "overallStatus"),
                start_date: nested_date(status, "startDateStruct"),
                completion_date: nested_date(status, "completionDateStruct"),
                study_type: text(design, "studyType"),
                phases: text_list(design, "phases"),
                conditions: text_list(conditions, "conditions"),
                interventions: value_list(arms, "interventions"),
            }
        })
        .collect()
}

/// Merge records from several variant queries: the first record seen for
/// each registry identifier wins, order is preserved, and records without
/// an identifier are dropped.
pub fn dedupe(records: Vec<StudyRecord>) -> Vec<StudyRecord> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for record in records {
        let Some(id) = record.nct_id.clone() else {
            continue;
        };
        if seen.insert(id) {
            out.push(record);
        }
    }
    out
}

fn module<'a>(protocol: Option<&'a Value>, name: &str) -> Option<&'a Value> {
    protocol.and_then(|p| p.get(name))
}

fn text(module: Option<&Value>, field: &str) -> Option<String> {
    module
        .and_then(|m| m.get(field))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn nested_date(module: Option<&Value>, field: &str) -> Option<String> {
    module
        .and_then(|m| m.get(field))
        .and_then(|s| s.get("date"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn text_list(module: Option<&Value>, field: &str) -> Vec<String> {
    module
        .and_then(|m| m.get(field))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn value_list(module: Option<&Value>, field: &str) -> Vec<Value> {
    module
        .and_then(|m| m.get(field))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "studies": [
                {
                    "protocolSection": {
                        "identificationModule": {
                            "nctId": "NCT01234567",
                            "briefTitle": "A Study of GLP-1 in T2DM"
                        },
                        "statusModule": {
                            "overallStatus": "COMPLETED",
                            "startDateStruct": { "date": "2019-03" },
                            "completionDateStruct": { "date": "2021-11" }
                        },
                        "designModule": {
                            "studyType": "INTERVENTIONAL",
                            "phases": ["PHASE3"]
                        },
                        "conditionsModule": {
                            "conditions": ["Type 2 Diabetes Mellitus"]
                        },
                        "armsInterventionsModule": {
                            "interventions": [
                                { "type": "DRUG", "name": "Semaglutide" }
                            ]
                        }
                    }
                },
                { "protocolSection": { "identificationModule": {} } }
            ]
        })
    }

    #[test]
    fn simplify_projects_known_modules() {
        let records = simplify(&sample_payload());
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.nct_id.as_deref(), Some("NCT01234567"));
        assert_eq!(first.brief_title.as_deref(), Some("A Study of GLP-1 in T2DM"));
        assert_eq!(first.overall_status.as_deref(), Some("COMPLETED"));
        assert_eq!(first.start_date.as_deref(), Some("2019-03"));
        assert_eq!(first.completion_date.as_deref(), Some("2021-11"));
        assert_eq!(first.study_type.as_deref(), Some("INTERVENTIONAL"));
        assert_eq!(first.phases, vec!["PHASE3".to_string()]);
        assert_eq!(first.conditions, vec!["Type 2 Diabetes Mellitus".to_string()]);
        assert_eq!(first.interventions.len(), 1);
    }

    #[test]
    fn simplify_tolerates_sparse_entries() {
        let records = simplify(&sample_payload());
        let sparse = &records[1];
        assert_eq!(sparse.nct_id, None);
        assert!(sparse.phases.is_empty());
        assert!(sparse.interventions.is_empty());
    }

    #[test]
    fn simplify_of_unexpected_shape_is_empty() {
        assert!(simplify(&json!({"count": 3})).is_empty());
        assert!(simplify(&json!("just a string")).is_empty());
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let mut a = simplify(&sample_payload());
        let mut b = simplify(&sample_payload());
        b[0].brief_title = Some("Different title, same id".to_string());
        a.append(&mut b);

        let merged = dedupe(a);
        // Four in, one with an id kept once, id-less entries dropped.
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].brief_title.as_deref(), Some("A Study of GLP-1 in T2DM"));
    }

    #[test]
    fn dedupe_is_idempotent() {
        let mut records = simplify(&sample_payload());
        records.extend(simplify(&sample_payload()));
        let once = dedupe(records);
        let twice = dedupe(once.clone());
        assert_eq!(twice, once);
    }

    #[test]
    fn jsonl_round_trips_camel_case() {
        let records = simplify(&sample_payload());
        let line = serde_json::to_string(&records[0]).unwrap();
        assert!(line.contains("\"nctId\":\"NCT01234567\""));
        let back: StudyRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back, records[0]);
    }
}
