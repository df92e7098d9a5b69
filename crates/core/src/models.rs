use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CHUNK_LABEL: &str = "Chunk";
pub const HAS_ENTITY: &str = "HAS_ENTITY";

/// One CSV record rendered as `header: value` lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDocument {
    pub source_path: String,
    pub filename: String,
    pub row: u64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextChunk {
    pub chunk_id: String,
    pub filename: String,
    pub source_path: String,
    pub row: u64,
    pub page: u64,
    pub text: String,
}

/// A chunk paired with the embedding that will be stored on its node.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkRecord<'a> {
    pub chunk: &'a TextChunk,
    pub embedding: &'a [f32],
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    pub fn chunk(chunk_id: impl Into<String>) -> Self {
        Self::new(chunk_id, CHUNK_LABEL)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GraphRelationship {
    pub source: GraphNode,
    pub target: GraphNode,
    pub rel_type: String,
}

/// Entities and relationships extracted from a single chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<GraphRelationship>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorIndexConfig {
    pub name: String,
    pub label: String,
    pub property: String,
    pub dimensions: usize,
    pub similarity: String,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            name: "chunkVector".to_string(),
            label: CHUNK_LABEL.to_string(),
            property: "textEmbedding".to_string(),
            dimensions: 1_536,
            similarity: "cosine".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub glob_pattern: String,
    pub separator: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            glob_pattern: "**/*.csv".to_string(),
            separator: "\n\n".to_string(),
            chunk_size: 1_500,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub chunks: usize,
    pub documents: usize,
    pub entity_nodes: usize,
    pub relationships: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
