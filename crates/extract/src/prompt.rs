/// Prompt for pulling trial entities out of protocol excerpts. The model
/// must answer with bare JSON so the scanner can find one object.
pub fn build_entity_prompt(contexts: &[String]) -> String {
    let sources = contexts
        .iter()
        .enumerate()
        .map(|(i, c)| format!("Source[{}]:\n{}", i, c))
        .collect::<Vec<_>>()
        .join("\n\n---\n");

    format!(
        r#"You are a meticulous CRO protocol analyst. Extract the trial entities from the protocol excerpts below.

INSTRUCTIONS:
1. Identify the primary condition (disease or indication) under study
2. Identify the primary intervention (drug, biologic, device or therapy)
3. List alternative names or abbreviations used for the condition
4. Use ONLY the provided sources, never outside knowledge
5. If a fact is not present in the sources, use "Unknown"
6. Output ONLY the JSON object, no markdown, no explanations

SCHEMA:
{{
  "condition": "primary condition or Unknown",
  "intervention": "primary intervention or Unknown",
  "aliases": ["alternative name", "abbreviation"]
}}

SOURCES:
{}

JSON OUTPUT:"#,
        sources
    )
}
