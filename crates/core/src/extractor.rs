use crate::models::{GraphDocument, GraphNode, GraphRelationship, TextChunk, HAS_ENTITY};
use crate::openai::OpenAiClient;
use crate::schema::Schema;
use crate::StoreError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

#[async_trait]
pub trait GraphExtractor {
    async fn extract(&self, chunk: &TextChunk) -> Result<GraphDocument, StoreError>;
}

/// Extracts a typed subgraph from chunk text with a chat-completion model.
#[derive(Debug, Clone)]
pub struct LlmGraphTransformer {
    client: OpenAiClient,
    model: String,
    schema: Schema,
    strict: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RawGraph {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    relationships: Vec<RawRelationship>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default)]
    id: Value,
    #[serde(rename = "type", default)]
    node_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRelationship {
    #[serde(default)]
    source_node_id: Value,
    #[serde(default)]
    source_node_type: Option<String>,
    #[serde(default)]
    target_node_id: Value,
    #[serde(default)]
    target_node_type: Option<String>,
    #[serde(rename = "type", default)]
    rel_type: Option<String>,
}

impl LlmGraphTransformer {
    pub fn new(client: OpenAiClient, model: impl Into<String>, schema: Schema) -> Self {
        Self {
            client,
            model: model.into(),
            schema,
            strict: true,
        }
    }

    /// Keep node and relationship types outside the schema instead of dropping them.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn system_prompt(&self) -> String {
        format!(
            "You build knowledge graphs from text. Identify the entities mentioned in the text \
             and the relationships between them.\n\
             Use only these node types: {}.\n\
             Use only these relationship types: {}.\n\
             Node ids are human-readable identifiers taken from the text, never integers \
             you invent. Reuse the same id whenever the same entity appears again.\n\
             Answer with a single JSON object of the form \
             {{\"nodes\": [{{\"id\": string, \"type\": string}}], \
             \"relationships\": [{{\"source_node_id\": string, \"source_node_type\": string, \
             \"target_node_id\": string, \"target_node_type\": string, \"type\": string}}]}} \
             and nothing else.",
            self.schema.nodes.join(", "),
            self.schema.relationships.join(", "),
        )
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": 0.0,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": self.system_prompt() },
                {
                    "role": "user",
                    "content": format!("Extract entities and relationships from the following input:\n{text}"),
                },
            ],
        })
    }
}

#[async_trait]
impl GraphExtractor for LlmGraphTransformer {
    async fn extract(&self, chunk: &TextChunk) -> Result<GraphDocument, StoreError> {
        let response = self
            .client
            .post_json("chat/completions", &self.request_body(&chunk.text))
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| StoreError::BackendResponse {
                backend: "openai".to_string(),
                details: "chat completion had no message content".to_string(),
            })?;

        let raw: RawGraph = serde_json::from_str(strip_code_fence(content))?;
        let document = to_graph_document(raw, &self.schema, self.strict);
        debug!(
            chunk_id = %chunk.chunk_id,
            nodes = document.nodes.len(),
            relationships = document.relationships.len(),
            "extracted graph document"
        );
        Ok(document)
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn id_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn resolve_label(schema: &Schema, strict: bool, label: Option<&str>) -> Option<String> {
    let label = label?;
    if strict {
        schema.canonical_node(label).map(str::to_string)
    } else {
        let label = label.trim();
        (!label.is_empty()).then(|| label.to_string())
    }
}

fn resolve_rel_type(schema: &Schema, strict: bool, rel_type: Option<&str>) -> Option<String> {
    let rel_type = rel_type?;
    if strict {
        schema.canonical_relationship(rel_type).map(str::to_string)
    } else {
        let rel_type = rel_type.trim();
        (!rel_type.is_empty()).then(|| rel_type.replace(' ', "_").to_uppercase())
    }
}

fn to_graph_document(raw: RawGraph, schema: &Schema, strict: bool) -> GraphDocument {
    let mut document = GraphDocument::default();
    let mut seen = HashSet::new();
    let mut dropped = 0usize;

    for node in raw.nodes {
        let (Some(id), Some(label)) = (
            id_text(&node.id),
            resolve_label(schema, strict, node.node_type.as_deref()),
        ) else {
            dropped += 1;
            continue;
        };
        let node = GraphNode::new(id, label);
        if seen.insert(node.clone()) {
            document.nodes.push(node);
        }
    }

    for relationship in raw.relationships {
        let source = id_text(&relationship.source_node_id).zip(resolve_label(
            schema,
            strict,
            relationship.source_node_type.as_deref(),
        ));
        let target = id_text(&relationship.target_node_id).zip(resolve_label(
            schema,
            strict,
            relationship.target_node_type.as_deref(),
        ));
        let rel_type = resolve_rel_type(schema, strict, relationship.rel_type.as_deref());

        let (Some((source_id, source_label)), Some((target_id, target_label)), Some(rel_type)) =
            (source, target, rel_type)
        else {
            dropped += 1;
            continue;
        };

        let source = GraphNode::new(source_id, source_label);
        let target = GraphNode::new(target_id, target_label);
        for endpoint in [&source, &target] {
            if seen.insert(endpoint.clone()) {
                document.nodes.push(endpoint.clone());
            }
        }

        document.relationships.push(GraphRelationship {
            source,
            target,
            rel_type,
        });
    }

    if dropped > 0 {
        warn!(dropped, "dropped extracted items outside the schema");
    }

    document
}

/// Links the chunk node to every node of the document with `HAS_ENTITY`.
pub fn link_chunk_entities(chunk_id: &str, document: &mut GraphDocument) {
    let chunk = GraphNode::chunk(chunk_id);
    let links: Vec<_> = document
        .nodes
        .iter()
        .map(|node| GraphRelationship {
            source: chunk.clone(),
            target: node.clone(),
            rel_type: HAS_ENTITY.to_string(),
        })
        .collect();
    document.relationships.extend(links);
}
