use serde::{Deserialize, Serialize};

/// A bounded slice of protocol text. The ordinal `id` reflects final
/// document order and is the citation anchor: grounded prompts reference
/// chunk `i` as `[Prot:i]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(id: usize, text: String) -> Self {
        Self { id, text }
    }

    /// Citation token used in prompts and the rendered report.
    pub fn citation_tag(&self) -> String {
        format!("[Prot:{}]", self.id)
    }
}
