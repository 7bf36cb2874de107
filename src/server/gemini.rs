use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::api::types::{
    count_from_string_or_number, ChatReply, Citation, PageRef, StoreSummary, UsageStats,
};
use crate::app::config::ServerConfig;
use crate::error::{Error, Result};

pub const NO_ANSWER: &str =
    "Could not generate response. The model may not have found relevant information in the documents.";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];
const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";
/// Keeps the key out of request URLs, and so out of reqwest error messages.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Calls the Gemini REST API on behalf of the proxy. The key is passed per
/// call since it can be replaced while the server runs.
pub struct FileSearchClient {
    client: Client,
    base_url: String,
    model: String,
    generation: GenerationConfig,
}

impl FileSearchClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::server(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            generation: GenerationConfig {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                max_output_tokens: config.max_output_tokens,
            },
        })
    }

    fn build_request(&self, query: &str, store_names: &[String]) -> GenerateRequest {
        let tools = if store_names.is_empty() {
            None
        } else {
            Some(vec![Tool {
                file_search: FileSearch {
                    file_search_store_names: store_names.to_vec(),
                },
            }])
        };

        GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: query.to_string(),
                }],
            }],
            generation_config: self.generation.clone(),
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: SAFETY_THRESHOLD,
                })
                .collect(),
            tools,
        }
    }

    /// Runs one grounded generation. A non-2xx answer from Gemini becomes
    /// [`Error::Upstream`] with the raw body.
    pub async fn generate(
        &self,
        api_key: &str,
        query: &str,
        store_names: &[String],
    ) -> Result<ChatReply> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = self.build_request(query, store_names);
        debug!("generateContent on {} with {} store(s)", self.model, store_names.len());

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!("Gemini API error: {} - {}", status, text);
            return Err(Error::upstream(status.as_u16(), text));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)?;
        Ok(reply_from_response(query, parsed))
    }

    pub async fn list_stores(&self, api_key: &str) -> Result<Vec<StoreSummary>> {
        let url = format!("{}/fileSearchStores", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::upstream(status.as_u16(), text));
        }

        let listing: StoreListing = response.json().await?;
        Ok(listing.file_search_stores.into_iter().map(StoreSummary::from).collect())
    }

    /// True when Gemini accepts the key for a minimal model listing.
    pub async fn validate_key(&self, api_key: &str) -> bool {
        let url = format!("{}/models", self.base_url);
        match self
            .client
            .get(&url)
            .query(&[("pageSize", "1")])
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("API key validation failed: HTTP {}", response.status());
                false
            }
            Err(e) => {
                warn!("API key validation failed: {}", e);
                false
            }
        }
    }
}

/// Folds a Gemini response into the reply the chat endpoint sends.
pub fn reply_from_response(query: &str, response: GenerateResponse) -> ChatReply {
    let candidate = response.candidates.into_iter().next();

    let answer = candidate
        .as_ref()
        .and_then(|c| c.content.as_ref())
        .and_then(|content| content.parts.first())
        .and_then(|part| part.text.clone())
        .unwrap_or_else(|| NO_ANSWER.to_string());

    let citations = candidate
        .and_then(|c| c.grounding_metadata)
        .map(|meta| meta.grounding_chunks.into_iter().map(citation_from_chunk).collect())
        .unwrap_or_default();

    // An absent usage block still goes out as `{}`.
    let usage = response
        .usage_metadata
        .map(|u| UsageStats {
            total_token_count: Some(u.total_token_count.unwrap_or(0)),
            prompt_token_count: Some(u.prompt_token_count.unwrap_or(0)),
            candidates_token_count: Some(u.candidates_token_count.unwrap_or(0)),
        })
        .unwrap_or_default();

    ChatReply {
        query: Some(query.to_string()),
        response: Some(answer),
        error: None,
        citations: Some(citations),
        usage: Some(usage),
    }
}

fn citation_from_chunk(chunk: GroundingChunk) -> Citation {
    match chunk.retrieved_context {
        Some(context) => {
            let text = context.text.unwrap_or_default();
            let page = page_label(&text);
            Citation {
                source: Some(context.title.unwrap_or_else(|| "Unknown".to_string())),
                page: Some(PageRef::Label(page)),
                text: Some(text),
            }
        }
        None => Citation {
            source: Some(chunk.source.unwrap_or_else(|| "Unknown".to_string())),
            page: Some(PageRef::Label(String::new())),
            text: Some(match chunk.content {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s,
                Some(other) => other.to_string(),
            }),
        },
    }
}

fn page_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"--- PAGE (\d+) ---").expect("page marker pattern"))
}

/// `"Page 3, 4"` for every page marker in `text`, empty when there is none.
pub fn page_label(text: &str) -> String {
    let pages: Vec<&str> = page_marker()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    if pages.is_empty() {
        String::new()
    } else {
        format!("Page {}", pages.join(", "))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    file_search: FileSearch,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileSearch {
    file_search_store_names: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingChunk {
    #[serde(default)]
    retrieved_context: Option<RetrievedContext>,
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RetrievedContext {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: Option<u64>,
    #[serde(default)]
    prompt_token_count: Option<u64>,
    #[serde(default)]
    candidates_token_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreListing {
    #[serde(default)]
    file_search_stores: Vec<RemoteStore>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteStore {
    #[serde(default)]
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default, deserialize_with = "count_from_string_or_number")]
    active_documents_count: u64,
    #[serde(default, deserialize_with = "count_from_string_or_number")]
    pending_documents_count: u64,
    #[serde(default, deserialize_with = "count_from_string_or_number")]
    failed_documents_count: u64,
    #[serde(default, deserialize_with = "count_from_string_or_number")]
    size_bytes: u64,
}

impl From<RemoteStore> for StoreSummary {
    fn from(store: RemoteStore) -> Self {
        Self {
            name: store.name,
            display_name: store.display_name,
            active_documents_count: store.active_documents_count,
            pending_documents_count: store.pending_documents_count,
            failed_documents_count: store.failed_documents_count,
            size_bytes: store.size_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_request_payload() {
        let client = FileSearchClient::new(&ServerConfig::default()).unwrap();

        let with_store = serde_json::to_value(
            client.build_request("hi", &["fileSearchStores/abc".to_string()]),
        )
        .unwrap();
        assert_eq!(with_store["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(with_store["generationConfig"]["topK"], 32);
        assert_eq!(with_store["generationConfig"]["maxOutputTokens"], 4096);
        assert_eq!(with_store["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(
            with_store["tools"][0]["fileSearch"]["fileSearchStoreNames"][0],
            "fileSearchStores/abc"
        );

        let without = serde_json::to_value(client.build_request("hi", &[])).unwrap();
        assert!(without.get("tools").is_none());
    }

    #[test]
    fn test_reply_with_grounding() {
        let reply = reply_from_response(
            "what is x?",
            parse(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "X is 42."}]},
                    "groundingMetadata": {"groundingChunks": [
                        {"retrievedContext": {
                            "title": "manual.pdf",
                            "text": "--- PAGE 3 ---\nx\n--- PAGE 4 ---\ny"
                        }},
                        {"retrievedContext": {"text": "no markers"}},
                        {"content": {"a": 1}, "source": "inline"},
                        {}
                    ]}
                }],
                "usageMetadata": {"totalTokenCount": 120, "promptTokenCount": 100}
            })),
        );

        assert_eq!(reply.query.as_deref(), Some("what is x?"));
        assert_eq!(reply.response.as_deref(), Some("X is 42."));

        let citations = reply.citations.unwrap();
        assert_eq!(citations.len(), 4);
        assert_eq!(citations[0].source.as_deref(), Some("manual.pdf"));
        assert_eq!(citations[0].page, Some(PageRef::Label("Page 3, 4".into())));
        assert_eq!(citations[1].source.as_deref(), Some("Unknown"));
        assert_eq!(citations[1].page, Some(PageRef::Label(String::new())));
        assert_eq!(citations[2].source.as_deref(), Some("inline"));
        assert_eq!(citations[2].text.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(citations[3].source.as_deref(), Some("Unknown"));
        assert_eq!(citations[3].text.as_deref(), Some(""));

        let usage = reply.usage.unwrap();
        assert_eq!(usage.total_token_count, Some(120));
        assert_eq!(usage.prompt_token_count, Some(100));
        assert_eq!(usage.candidates_token_count, Some(0));
    }

    #[test]
    fn test_reply_without_candidates() {
        let reply = reply_from_response("q", parse(json!({})));
        assert_eq!(reply.response.as_deref(), Some(NO_ANSWER));
        assert_eq!(reply.citations, Some(Vec::new()));

        let wire = serde_json::to_value(&reply).unwrap();
        assert_eq!(wire["usage"], json!({}));
    }

    #[test]
    fn test_page_label() {
        assert_eq!(page_label("--- PAGE 12 ---"), "Page 12");
        assert_eq!(page_label("--- PAGE x ---"), "");
        assert_eq!(page_label(""), "");
    }

    #[test]
    fn test_store_listing_counts_as_strings() {
        let listing: StoreListing = serde_json::from_value(json!({
            "fileSearchStores": [{
                "name": "fileSearchStores/abc",
                "displayName": "Manuals",
                "activeDocumentsCount": "7",
                "sizeBytes": "2048"
            }]
        }))
        .unwrap();

        let store = StoreSummary::from(listing.file_search_stores.into_iter().next().unwrap());
        assert_eq!(store.label(), "Manuals");
        assert_eq!(store.active_documents_count, 7);
        assert_eq!(store.pending_documents_count, 0);
        assert_eq!(store.size_bytes, 2048);
    }
}
