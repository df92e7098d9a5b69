use crate::embeddings::Embedder;
use crate::extractor::{link_chunk_entities, GraphExtractor};
use crate::traits::GraphStore;
use crate::{ChunkRecord, IngestionReport, StoreError, TextChunk, VectorIndexConfig};
use chrono::Utc;
use std::collections::HashSet;
use tracing::info;

pub struct IngestPipeline<E, X, S>
where
    E: Embedder,
    X: GraphExtractor,
    S: GraphStore,
{
    embedder: E,
    extractor: X,
    store: S,
    index: VectorIndexConfig,
}

impl<E, X, S> IngestPipeline<E, X, S>
where
    E: Embedder + Send + Sync,
    X: GraphExtractor + Send + Sync,
    S: GraphStore + Send + Sync,
{
    /// Fails when the embedder's output size differs from the index dimensions.
    pub fn new(
        embedder: E,
        extractor: X,
        store: S,
        index: VectorIndexConfig,
    ) -> Result<Self, StoreError> {
        if embedder.dimensions() != index.dimensions {
            return Err(StoreError::DimensionMismatch {
                expected: index.dimensions,
                actual: embedder.dimensions(),
            });
        }
        Ok(Self {
            embedder,
            extractor,
            store,
            index,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Embeds, writes and extracts each chunk in order, then creates the vector index.
    /// The first failure aborts the run.
    pub async fn run(&self, chunks: &[TextChunk]) -> Result<IngestionReport, StoreError> {
        let started_at = Utc::now();
        let mut documents = HashSet::new();
        let mut entity_nodes = 0usize;
        let mut relationships = 0usize;

        for chunk in chunks {
            info!(chunk_id = %chunk.chunk_id, "Processing");

            let embedding = self.embedder.embed(&chunk.text).await?;
            if embedding.len() != self.index.dimensions {
                return Err(StoreError::DimensionMismatch {
                    expected: self.index.dimensions,
                    actual: embedding.len(),
                });
            }

            self.store
                .upsert_chunk(&ChunkRecord {
                    chunk,
                    embedding: &embedding,
                })
                .await?;

            let mut graph = self.extractor.extract(chunk).await?;
            link_chunk_entities(&chunk.chunk_id, &mut graph);
            entity_nodes += graph.nodes.len();
            relationships += graph.relationships.len();

            self.store
                .add_graph_documents(std::slice::from_ref(&graph))
                .await?;
            documents.insert(chunk.filename.as_str());
        }

        self.ensure_index().await?;

        Ok(IngestionReport {
            chunks: chunks.len(),
            documents: documents.len(),
            entity_nodes,
            relationships,
            started_at,
            finished_at: Utc::now(),
        })
    }

    pub async fn ensure_index(&self) -> Result<(), StoreError> {
        info!(
            index = %self.index.name,
            dimensions = self.index.dimensions,
            similarity = %self.index.similarity,
            "ensuring vector index"
        );
        self.store.ensure_vector_index(&self.index).await
    }
}
