use crate::{ChunkRecord, GraphDocument, StoreError, VectorIndexConfig};
use async_trait::async_trait;

#[async_trait]
pub trait GraphStore {
    /// Merges the chunk, its document and the `PART_OF` edge, then stores the embedding.
    async fn upsert_chunk(&self, record: &ChunkRecord<'_>) -> Result<(), StoreError>;

    async fn add_graph_documents(&self, documents: &[GraphDocument]) -> Result<(), StoreError>;

    async fn ensure_vector_index(&self, config: &VectorIndexConfig) -> Result<(), StoreError>;
}
