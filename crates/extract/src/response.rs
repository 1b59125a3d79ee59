use thiserror::Error;

/// Why a generation response yielded no usable JSON object.
#[derive(Debug, Error)]
pub enum JsonScanError {
    #[error("no JSON object found in generation output")]
    NoObject,
    #[error("unbalanced braces in generation output")]
    Unbalanced,
    #[error("invalid JSON object: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Find the first balanced top-level `{...}` span in free-form model output
/// and parse it. Brace balancing respects string literals, so braces inside
/// quoted values do not end the span early.
pub fn scan_json_object(raw: &str) -> Result<serde_json::Value, JsonScanError> {
    let Some(start) = raw.find('{') else {
        return Err(JsonScanError::NoObject);
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let span = &raw[start..start + offset + 1];
                    return Ok(serde_json::from_str(span)?);
                }
            }
            _ => {}
        }
    }
    Err(JsonScanError::Unbalanced)
}
