pub mod embeddings;
pub mod retriever;
pub mod vector_index;

pub use embeddings::{Embedder, OllamaEmbedder};
pub use retriever::{DEFAULT_TOP_K, Retriever};
pub use vector_index::{IndexMeta, VectorIndex, corpus_fingerprint};
