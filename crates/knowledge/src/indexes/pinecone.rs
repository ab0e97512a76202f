//! Pinecone vector index over the REST data plane.
//!
//! Chunk text is stored in metadata under [`TEXT_KEY`]. Pinecone metadata is
//! flat, so nested objects are flattened to dotted keys on write.

use crate::types::{DocumentChunk, IndexEntry, Metadata};
use crate::vector_index::VectorIndex;
use ragchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2024-07";

/// Metadata key holding the chunk text.
pub const TEXT_KEY: &str = "text";

/// Vectors per upsert request.
const UPSERT_BATCH: usize = 100;

/// Connection settings for a Pinecone index.
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: String,

    /// Index name, used to look up the host when `host` is unset
    pub index_name: Option<String>,

    /// Data-plane host, with or without scheme
    pub host: Option<String>,

    pub namespace: Option<String>,

    pub timeout: Option<Duration>,
}

pub struct PineconeIndex {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStatsResponse {
    #[serde(default)]
    namespaces: std::collections::HashMap<String, NamespaceStats>,
    #[serde(default)]
    total_vector_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: usize,
}

fn build_client(timeout: Option<Duration>) -> AppResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| AppError::Index(format!("Failed to create HTTP client for Pinecone: {}", e)))
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

async fn check_status(response: reqwest::Response, action: &str) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(AppError::Index(format!(
        "Pinecone {} failed ({}): {}",
        action, status, body
    )))
}

impl PineconeIndex {
    /// Client for a known data-plane host.
    pub fn new(
        host: &str,
        api_key: impl Into<String>,
        namespace: Option<String>,
        timeout: Option<Duration>,
    ) -> AppResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: normalize_host(host),
            api_key: api_key.into(),
            namespace,
        })
    }

    /// Connect using `config`, asking the control plane for the host when
    /// only the index name is known.
    pub async fn connect(config: PineconeConfig) -> AppResult<Self> {
        if config.api_key.is_empty() {
            return Err(AppError::Config("Pinecone API key is empty".to_string()));
        }

        let host = match (config.host, config.index_name) {
            (Some(host), _) => host,
            (None, Some(name)) => {
                Self::describe_host(&build_client(config.timeout)?, &config.api_key, &name).await?
            }
            (None, None) => {
                return Err(AppError::Config(
                    "Pinecone index name or host is required".to_string(),
                ))
            }
        };

        tracing::info!("Using Pinecone index at {}", host);
        Self::new(&host, config.api_key, config.namespace, config.timeout)
    }

    async fn describe_host(client: &reqwest::Client, api_key: &str, name: &str) -> AppResult<String> {
        let url = format!("{}/indexes/{}", CONTROL_PLANE_URL, name);
        tracing::debug!("Resolving Pinecone host for index '{}'", name);

        let response = client
            .get(&url)
            .header("Api-Key", api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| AppError::Index(format!("Failed to reach Pinecone: {}", e)))?;

        let body: DescribeIndexResponse = check_status(response, "describe index")
            .await?
            .json()
            .await
            .map_err(|e| AppError::Index(format!("Failed to parse Pinecone response: {}", e)))?;

        Ok(body.host)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        action: &str,
    ) -> AppResult<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Index(format!("Failed to reach Pinecone: {}", e)))?;

        check_status(response, action).await
    }
}

/// Flatten metadata into Pinecone's value model and add the chunk text.
///
/// Strings, numbers, booleans and string lists pass through; objects become
/// dotted keys; nulls are dropped; other lists are stored as JSON text.
fn to_pinecone_metadata(text: &str, metadata: &Metadata) -> Metadata {
    fn flatten(prefix: &str, value: &Value, out: &mut Metadata) {
        match value {
            Value::Null => {}
            Value::Object(map) => {
                for (key, nested) in map {
                    flatten(&format!("{}.{}", prefix, key), nested, out);
                }
            }
            Value::Array(items) if !items.iter().all(Value::is_string) => {
                out.insert(prefix.to_string(), Value::String(value.to_string()));
            }
            other => {
                out.insert(prefix.to_string(), other.clone());
            }
        }
    }

    let mut out = Metadata::new();
    for (key, value) in metadata {
        flatten(key, value, &mut out);
    }
    if let Some(shadowed) = out.insert(TEXT_KEY.to_string(), Value::String(text.to_string())) {
        tracing::warn!(
            "Metadata key '{}' is reserved for chunk text; dropping value {}",
            TEXT_KEY,
            shadowed
        );
    }
    out
}

/// Split the stored text back out of a match's metadata.
fn from_pinecone_match(m: QueryMatch) -> DocumentChunk {
    let mut metadata = m.metadata.unwrap_or_default();
    let text = match metadata.remove(TEXT_KEY) {
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
        None => String::new(),
    };

    DocumentChunk {
        id: m.id,
        text,
        metadata,
        score: m.score,
    }
}

#[async_trait::async_trait]
impl VectorIndex for PineconeIndex {
    fn backend_name(&self) -> &str {
        "pinecone"
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<DocumentChunk>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let body: QueryResponse = self
            .post("/query", &request, "query")
            .await?
            .json()
            .await
            .map_err(|e| AppError::Index(format!("Failed to parse Pinecone query: {}", e)))?;

        tracing::debug!("Pinecone returned {} matches", body.matches.len());

        Ok(body.matches.into_iter().map(from_pinecone_match).collect())
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> AppResult<()> {
        let mut upserted = 0;

        for batch in entries.chunks(UPSERT_BATCH) {
            let request = UpsertRequest {
                vectors: batch
                    .iter()
                    .map(|entry| PineconeVector {
                        id: &entry.id,
                        values: &entry.vector,
                        metadata: to_pinecone_metadata(&entry.text, &entry.metadata),
                    })
                    .collect(),
                namespace: self.namespace.as_deref(),
            };

            let body: UpsertResponse = self
                .post("/vectors/upsert", &request, "upsert")
                .await?
                .json()
                .await
                .map_err(|e| AppError::Index(format!("Failed to parse Pinecone upsert: {}", e)))?;
            upserted += body.upserted_count;
        }

        tracing::debug!("Pinecone upserted {} vectors", upserted);
        Ok(())
    }

    async fn count(&self) -> AppResult<usize> {
        let body: IndexStatsResponse = self
            .post("/describe_index_stats", &serde_json::json!({}), "describe_index_stats")
            .await?
            .json()
            .await
            .map_err(|e| AppError::Index(format!("Failed to parse Pinecone stats: {}", e)))?;

        Ok(match &self.namespace {
            Some(ns) => body.namespaces.get(ns).map(|s| s.vector_count).unwrap_or(0),
            None => body.total_vector_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> Metadata {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("docs-abc123.svc.us-east1.pinecone.io"),
            "https://docs-abc123.svc.us-east1.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
    }

    #[test]
    fn test_metadata_flattening() {
        let input = metadata(json!({
            "page": 1,
            "source": "guide.pdf",
            "loc": { "lines": { "from": 3, "to": 9 } },
            "tags": ["geo", "europe"],
            "mixed": [1, "a"],
            "missing": null
        }));

        let out = to_pinecone_metadata("Paris is the capital of France.", &input);
        assert_eq!(out["text"], "Paris is the capital of France.");
        assert_eq!(out["page"], 1);
        assert_eq!(out["loc.lines.from"], 3);
        assert_eq!(out["loc.lines.to"], 9);
        assert_eq!(out["tags"], json!(["geo", "europe"]));
        assert_eq!(out["mixed"], "[1,\"a\"]");
        assert!(!out.contains_key("missing"));
        assert!(!out.contains_key("loc"));
    }

    #[test]
    fn test_chunk_text_wins_over_metadata_text_key() {
        let input = metadata(json!({ "text": "caller value", "page": 2 }));

        let out = to_pinecone_metadata("Paris is the capital of France.", &input);
        assert_eq!(out["text"], "Paris is the capital of France.");
        assert_eq!(out["page"], 2);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_query_request_shape() {
        let vector = [0.1, 0.2];
        let json = serde_json::to_value(QueryRequest {
            vector: &vector,
            top_k: 4,
            include_metadata: true,
            include_values: false,
            namespace: None,
        })
        .unwrap();
        assert_eq!(json["topK"], 4);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("namespace").is_none());
    }

    #[test]
    fn test_match_text_extracted() {
        let response: QueryResponse = serde_json::from_value(json!({
            "matches": [
                { "id": "a", "score": 0.91, "metadata": { "text": "Paris is the capital of France.", "page": 1 } },
                { "id": "b", "score": 0.42 }
            ],
            "namespace": ""
        }))
        .unwrap();

        let chunks: Vec<DocumentChunk> =
            response.matches.into_iter().map(from_pinecone_match).collect();
        assert_eq!(chunks[0].text, "Paris is the capital of France.");
        assert_eq!(chunks[0].metadata["page"], 1);
        assert!(!chunks[0].metadata.contains_key("text"));
        assert_eq!(chunks[0].score, Some(0.91));
        assert_eq!(chunks[1].text, "");
    }

    #[test]
    fn test_stats_response_parsing() {
        let stats: IndexStatsResponse = serde_json::from_value(json!({
            "namespaces": { "docs": { "vectorCount": 12 } },
            "dimension": 1536,
            "totalVectorCount": 20
        }))
        .unwrap();
        assert_eq!(stats.total_vector_count, 20);
        assert_eq!(stats.namespaces["docs"].vector_count, 12);
    }

    #[tokio::test]
    async fn test_connect_requires_name_or_host() {
        let result = PineconeIndex::connect(PineconeConfig {
            api_key: "pc-test".to_string(),
            index_name: None,
            host: None,
            namespace: None,
            timeout: None,
        })
        .await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_connect_with_host_skips_lookup() {
        let index = PineconeIndex::connect(PineconeConfig {
            api_key: "pc-test".to_string(),
            index_name: Some("docs".to_string()),
            host: Some("docs-abc123.svc.pinecone.io".to_string()),
            namespace: Some("team".to_string()),
            timeout: None,
        })
        .await
        .unwrap();
        assert_eq!(index.base_url, "https://docs-abc123.svc.pinecone.io");
        assert_eq!(index.backend_name(), "pinecone");
    }
}
