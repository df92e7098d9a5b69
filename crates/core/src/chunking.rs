use crate::error::IngestError;
use crate::models::{IngestionOptions, SourceDocument, TextChunk};
use std::collections::{HashMap, VecDeque};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub separator: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::from(IngestionOptions::default())
    }
}

impl From<IngestionOptions> for ChunkingConfig {
    fn from(value: IngestionOptions) -> Self {
        Self {
            separator: value.separator,
            chunk_size: value.chunk_size,
            chunk_overlap: value.chunk_overlap,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap > self.chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "chunk_overlap {} is larger than chunk_size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

pub fn chunk_id(filename: &str, page: u64) -> String {
    format!("{filename}.{page}")
}

/// Splits on the literal separator and greedily packs the pieces back
/// together. Lengths are counted in characters.
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let pieces: Vec<&str> = if config.separator.is_empty() {
        text.char_indices()
            .map(|(start, ch)| &text[start..start + ch.len_utf8()])
            .collect()
    } else {
        text.split(config.separator.as_str())
            .filter(|piece| !piece.is_empty())
            .collect()
    };

    merge_pieces(&pieces, config)
}

fn merge_pieces(pieces: &[&str], config: &ChunkingConfig) -> Vec<String> {
    let separator_len = config.separator.chars().count();
    let mut chunks = Vec::new();
    let mut current: VecDeque<(&str, usize)> = VecDeque::new();
    let mut total = 0usize;

    for &piece in pieces {
        let len = piece.chars().count();

        if total + len + joiner(current.len(), separator_len) > config.chunk_size {
            if total > config.chunk_size {
                warn!(
                    size = total,
                    chunk_size = config.chunk_size,
                    "created a chunk longer than the configured chunk size"
                );
            }

            if !current.is_empty() {
                push_joined(&mut chunks, &current, &config.separator);

                // Keep at most `chunk_overlap` characters as the head of the next chunk.
                while total > config.chunk_overlap
                    || (total + len + joiner(current.len(), separator_len) > config.chunk_size
                        && total > 0)
                {
                    let extra = if current.len() > 1 { separator_len } else { 0 };
                    let Some((_, first_len)) = current.pop_front() else {
                        break;
                    };
                    total = total.saturating_sub(first_len + extra);
                }
            }
        }

        current.push_back((piece, len));
        total += len + if current.len() > 1 { separator_len } else { 0 };
    }

    push_joined(&mut chunks, &current, &config.separator);
    chunks
}

fn joiner(pieces: usize, separator_len: usize) -> usize {
    if pieces == 0 {
        0
    } else {
        separator_len
    }
}

fn push_joined(chunks: &mut Vec<String>, current: &VecDeque<(&str, usize)>, separator: &str) {
    let joined = current
        .iter()
        .map(|(piece, _)| *piece)
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Page numbers count chunks per file name, across every row of that file.
pub fn split_documents(documents: &[SourceDocument], config: &ChunkingConfig) -> Vec<TextChunk> {
    let mut pages: HashMap<&str, u64> = HashMap::new();
    let mut chunks = Vec::new();

    for document in documents {
        for text in split_text(&document.content, config) {
            let page = pages.entry(document.filename.as_str()).or_insert(0);
            chunks.push(TextChunk {
                chunk_id: chunk_id(&document.filename, *page),
                filename: document.filename.clone(),
                source_path: document.source_path.clone(),
                row: document.row,
                page: *page,
                text,
            });
            *page += 1;
        }
    }

    chunks
}
