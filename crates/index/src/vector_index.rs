use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use tracing::warn;

const MAGIC: u32 = 0x5649_4458; // "VIDX"
const VERSION: u32 = 1;

const VECTORS_FILE: &str = "vectors.bin";
const IDS_FILE: &str = "ids.txt";
const META_FILE: &str = "meta.json";

/// Recorded next to the vectors so a reload can detect model drift or a
/// changed source document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexMeta {
    pub model: String,
    pub dimension: usize,
    pub fingerprint: String,
}

/// Flat inner-product index over L2-normalized vectors. Scores are cosine
/// similarity; search is an exhaustive scan, which is plenty for a single
/// protocol document.
#[derive(Debug)]
pub struct VectorIndex {
    vectors: Vec<Vec<f32>>,
    ids: Vec<usize>,
    meta: IndexMeta,
}

impl VectorIndex {
    /// Build from row vectors in chunk-ordinal order. Rows are normalized
    /// in place; all rows must share one dimension.
    pub fn from_vectors(
        model: String,
        fingerprint: String,
        mut vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        let Some(first) = vectors.first() else {
            anyhow::bail!("cannot build a vector index from zero vectors");
        };
        let dimension = first.len();
        for (i, row) in vectors.iter().enumerate() {
            if row.len() != dimension {
                anyhow::bail!(
                    "embedding dimension mismatch: row {} has {} dims, expected {}",
                    i,
                    row.len(),
                    dimension
                );
            }
        }
        for row in &mut vectors {
            normalize(row);
        }

        let ids = (0..vectors.len()).collect();
        Ok(Self {
            vectors,
            ids,
            meta: IndexMeta {
                model,
                dimension,
                fingerprint,
            },
        })
    }

    /// Top-k inner-product scan. The query is normalized before scoring, so
    /// results are ranked by cosine similarity, ties broken by ordinal.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if query.len() != self.meta.dimension {
            warn!(
                got = query.len(),
                expected = self.meta.dimension,
                "query dimension mismatch, returning no hits"
            );
            return Vec::new();
        }
        let mut normalized = query.to_vec();
        normalize(&mut normalized);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .zip(&self.ids)
            .map(|(row, &id)| (id, dot(row, &normalized)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);
        scored
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    /// Persist as three artifacts: `vectors.bin` (binary rows), `ids.txt`
    /// (one ordinal per line) and `meta.json`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create index directory {:?}", dir))?;

        let mut buf = Vec::with_capacity(16 + self.vectors.len() * self.meta.dimension * 4);
        buf.extend_from_slice(&MAGIC.to_le_bytes());
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&(self.meta.dimension as u32).to_le_bytes());
        buf.extend_from_slice(&(self.vectors.len() as u32).to_le_bytes());
        for row in &self.vectors {
            for value in row {
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }
        fs::write(dir.join(VECTORS_FILE), buf).context("Failed to write vectors.bin")?;

        let ids: String = self
            .ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(dir.join(IDS_FILE), ids + "\n").context("Failed to write ids.txt")?;

        let meta = serde_json::to_string_pretty(&self.meta)?;
        fs::write(dir.join(META_FILE), meta).context("Failed to write meta.json")?;
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let meta: IndexMeta = serde_json::from_str(
            &fs::read_to_string(dir.join(META_FILE)).context("Failed to read meta.json")?,
        )
        .context("Failed to parse meta.json")?;

        let raw = fs::read(dir.join(VECTORS_FILE)).context("Failed to read vectors.bin")?;
        if raw.len() < 16 {
            anyhow::bail!("vectors.bin is truncated");
        }
        let magic = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let version = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
        let dimension = u32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]]) as usize;
        let count = u32::from_le_bytes([raw[12], raw[13], raw[14], raw[15]]) as usize;
        if magic != MAGIC {
            anyhow::bail!("vectors.bin has wrong magic: {:#010x}", magic);
        }
        if version != VERSION {
            anyhow::bail!("unsupported index version: {}", version);
        }
        if dimension != meta.dimension {
            anyhow::bail!(
                "meta.json dimension {} disagrees with vectors.bin {}",
                meta.dimension,
                dimension
            );
        }
        let payload = &raw[16..];
        if payload.len() != count * dimension * 4 {
            anyhow::bail!(
                "vectors.bin payload is {} bytes, expected {}",
                payload.len(),
                count * dimension * 4
            );
        }
        let mut vectors = Vec::with_capacity(count);
        for row_idx in 0..count {
            let mut row = Vec::with_capacity(dimension);
            for col in 0..dimension {
                let at = (row_idx * dimension + col) * 4;
                row.push(f32::from_le_bytes([
                    payload[at],
                    payload[at + 1],
                    payload[at + 2],
                    payload[at + 3],
                ]));
            }
            vectors.push(row);
        }

        let ids: Vec<usize> = fs::read_to_string(dir.join(IDS_FILE))
            .context("Failed to read ids.txt")?
            .lines()
            .map(|line| line.trim().parse::<usize>().context("invalid ordinal in ids.txt"))
            .collect::<Result<_>>()?;
        if ids.len() != count {
            anyhow::bail!("ids.txt lists {} ordinals for {} vectors", ids.len(), count);
        }

        Ok(Self { vectors, ids, meta })
    }
}

fn normalize(row: &mut [f32]) {
    let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in row.iter_mut() {
            *value /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Stable fingerprint of the embedded corpus, keyed by model so a model
/// swap also invalidates the artifact.
pub fn corpus_fingerprint(model: &str, texts: &[String]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    for text in texts {
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
    }
    let result = hasher.finalize();
    hex::encode(&result[..16])
}
