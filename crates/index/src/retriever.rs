use anyhow::{Context, Result};
use ingest::Chunk;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::embeddings::Embedder;
use crate::vector_index::{VectorIndex, corpus_fingerprint};

pub const DEFAULT_TOP_K: usize = 8;

/// Semantic lookup over the chunked protocol. Owns the index, the chunks it
/// maps back into, and the embedder used for queries.
pub struct Retriever {
    index: VectorIndex,
    chunks: Vec<Chunk>,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("index", &self.index)
            .field("chunks", &self.chunks)
            .finish_non_exhaustive()
    }
}

impl Retriever {
    /// Embed every chunk, build the index and persist it under `index_dir`.
    /// An embedding failure aborts the build; there is no degraded index.
    pub async fn build(
        chunks: Vec<Chunk>,
        index_dir: &Path,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder
            .embed_batch(&texts)
            .await
            .context("Failed to embed protocol chunks")?;

        let fingerprint = corpus_fingerprint(embedder.model(), &texts);
        let index = VectorIndex::from_vectors(embedder.model().to_string(), fingerprint, vectors)?;
        index.save(index_dir)?;
        info!(vectors = index.len(), dir = %index_dir.display(), "vector index persisted");

        Ok(Self {
            index,
            chunks,
            embedder,
        })
    }

    /// Reopen a persisted index for the given chunks. Rejects artifacts
    /// built by a different embedding model or for a different corpus.
    pub fn load(chunks: Vec<Chunk>, index_dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let index = VectorIndex::load(index_dir)?;
        if index.meta().model != embedder.model() {
            anyhow::bail!(
                "index was built with model '{}' but the embedder uses '{}'",
                index.meta().model,
                embedder.model()
            );
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let fingerprint = corpus_fingerprint(embedder.model(), &texts);
        if index.meta().fingerprint != fingerprint {
            anyhow::bail!("persisted index does not match the current protocol text");
        }

        Ok(Self {
            index,
            chunks,
            embedder,
        })
    }

    /// Top-k chunks for a query, in descending similarity order.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .context("Failed to embed query")?;
        let hits = self.index.search(&vector, k);
        Ok(hits
            .into_iter()
            .filter_map(|(id, _)| self.chunks.get(id).cloned())
            .collect())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
