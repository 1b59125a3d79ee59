use extract::{QueryPair, dedup_preserving};

/// Variant pairs below this count are always all rendered.
pub const MIN_COMMAND_LIMIT: usize = 5;

/// Render the `{condition}` / `{intervention}` placeholders for the leading
/// variant pairs. Distinct pairs can render to identical command lines, so
/// the result is deduplicated again, preserving order.
pub fn render_commands(template: &str, pairs: &[QueryPair], limit: usize) -> Vec<String> {
    let limit = limit.max(MIN_COMMAND_LIMIT);
    let rendered = pairs
        .iter()
        .take(limit)
        .map(|pair| {
            template
                .replace("{condition}", &pair.condition)
                .replace("{intervention}", &pair.intervention)
        })
        .collect();
    dedup_preserving(rendered)
}
