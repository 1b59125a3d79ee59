pub mod chunk;
pub mod chunker;
pub mod reader;

pub use chunk::Chunk;
pub use chunker::{Chunker, ChunkerConfig};
pub use reader::{DocumentReader, clean_text};

use anyhow::Result;
use std::path::Path;
use tracing::debug;

/// Load, clean and segment a protocol document in one pass.
pub async fn ingest_document(path: &Path, config: ChunkerConfig) -> Result<Vec<Chunk>> {
    let raw = DocumentReader::load(path).await?;
    let text = clean_text(&raw);

    let chunker = Chunker::new(config);
    let chunks = chunker.chunk_text(&text);
    debug!(path = %path.display(), chunks = chunks.len(), "protocol segmented");

    Ok(chunks)
}
