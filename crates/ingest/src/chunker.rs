use regex::Regex;

use crate::chunk::Chunk;

pub struct ChunkerConfig {
    pub target_size: usize,
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_size: 2500,
            overlap: 300,
        }
    }
}

pub struct Chunker {
    config: ChunkerConfig,
    heading: Regex,
    sentence: Regex,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self {
            config,
            // An ALL-CAPS line of at least five characters opens a new section.
            heading: Regex::new(r"^[A-Z][A-Z0-9 ._-]{4,}$").unwrap(),
            sentence: Regex::new(r"[.!?]\s+").unwrap(),
        }
    }

    /// Segment cleaned protocol text into ordered, overlapping chunks.
    ///
    /// Section blocks that fit within `target_size` stay whole; oversized
    /// blocks are packed greedily at sentence boundaries. Every chunk after
    /// the first is prefixed with the tail of its predecessor so that text
    /// near a boundary is retrievable from either side.
    pub fn chunk_text(&self, text: &str) -> Vec<Chunk> {
        let mut parts = Vec::new();
        for block in self.split_blocks(text) {
            if block.chars().count() <= self.config.target_size {
                parts.push(block);
            } else {
                self.pack_sentences(&block, &mut parts);
            }
        }

        self.apply_overlap(&parts)
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .enumerate()
            .map(|(id, text)| Chunk::new(id, text))
            .collect()
    }

    fn split_blocks(&self, text: &str) -> Vec<String> {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut blocks = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let terminated = i + 1 < lines.len();
            if i > 0 && terminated && self.heading.is_match(line) {
                blocks.push(current.join("\n"));
                current = Vec::new();
            }
            current.push(line);
        }
        blocks.push(current.join("\n"));

        if blocks.len() > 1 {
            return blocks;
        }
        // No recognizable section headings: fall back to blank-line paragraphs.
        text.split("\n\n").map(str::to_string).collect()
    }

    /// Greedy sentence packing. A single sentence longer than `target_size`
    /// becomes its own oversized part rather than being split mid-sentence.
    fn pack_sentences(&self, block: &str, parts: &mut Vec<String>) {
        let mut buffer = String::new();
        let mut buffer_chars = 0usize;

        for sentence in self.split_sentences(block) {
            let sentence_chars = sentence.chars().count();
            if buffer_chars + sentence_chars + 1 <= self.config.target_size {
                buffer.push_str(sentence);
                buffer.push(' ');
                buffer_chars += sentence_chars + 1;
            } else {
                if !buffer.trim().is_empty() {
                    parts.push(buffer.trim().to_string());
                }
                buffer = format!("{sentence} ");
                buffer_chars = sentence_chars + 1;
            }
        }
        if !buffer.trim().is_empty() {
            parts.push(buffer.trim().to_string());
        }
    }

    fn split_sentences<'a>(&self, block: &'a str) -> Vec<&'a str> {
        let mut pieces = Vec::new();
        let mut last = 0;
        for m in self.sentence.find_iter(block) {
            // Keep the terminal punctuation, drop the whitespace run.
            let cut = m.start() + 1;
            pieces.push(&block[last..cut]);
            last = m.end();
        }
        if last < block.len() {
            pieces.push(&block[last..]);
        }
        pieces
    }

    /// Prefix each part after the first with the trailing `overlap` characters
    /// of its pre-overlap predecessor, then cap the stitched part at
    /// `target_size + overlap` characters keeping the tail.
    fn apply_overlap(&self, parts: &[String]) -> Vec<String> {
        let cap = self.config.target_size + self.config.overlap;
        parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                if i == 0 {
                    return part.clone();
                }
                let tail = tail_chars(&parts[i - 1], self.config.overlap);
                let combined = format!("{tail}{part}");
                tail_chars(&combined, cap).to_string()
            })
            .collect()
    }
}

/// Last `n` characters of `s`, on char boundaries.
fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
