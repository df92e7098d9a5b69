pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod openai;
pub mod pipeline;
pub mod schema;
pub mod stores;
pub mod traits;

pub use chunking::{chunk_id, split_documents, split_text, ChunkingConfig};
pub use embeddings::{
    Embedder, OpenAiEmbedder, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL,
};
pub use error::{IngestError, StoreError};
pub use extractor::{link_chunk_entities, GraphExtractor, LlmGraphTransformer, DEFAULT_CHAT_MODEL};
pub use ingest::{discover_csv_files, ingest_folder_chunks, load_csv_documents, load_csv_file};
pub use models::{
    ChunkRecord, GraphDocument, GraphNode, GraphRelationship, IngestionOptions, IngestionReport,
    SourceDocument, TextChunk, VectorIndexConfig, CHUNK_LABEL, HAS_ENTITY,
};
pub use openai::{OpenAiClient, DEFAULT_OPENAI_BASE_URL};
pub use pipeline::IngestPipeline;
pub use schema::Schema;
pub use stores::Neo4jStore;
pub use traits::GraphStore;
