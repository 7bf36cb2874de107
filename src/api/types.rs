//! Shapes exchanged with the backend, plus the one place a raw chat reply is
//! turned into a [`ChatOutcome`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::Result;

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub query: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub store_names: Vec<String>,
}

impl ChatRequest {
    pub fn for_store(query: impl Into<String>, store_name: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            store_names: vec![store_name.into()],
        }
    }
}

/// Raw reply of `POST /api/chat` as it travels on the wire. Either `response`
/// or `error` is expected; [`ChatOutcome::from_reply`] decides which.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageStats>,
}

impl ChatReply {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Page reference of a citation; the backend sends either a label such as
/// `"Page 3, 4"` or a bare number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageRef {
    Number(i64),
    Label(String),
}

impl PageRef {
    /// Zero and blank labels carry no page information.
    pub fn is_specified(&self) -> bool {
        match self {
            PageRef::Number(n) => *n != 0,
            PageRef::Label(label) => !label.is_empty(),
        }
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRef::Number(n) => write!(f, "{}", n),
            PageRef::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates_token_count: Option<u64>,
}

impl UsageStats {
    pub fn total(&self) -> u64 {
        self.total_token_count.unwrap_or(0)
    }

    pub fn prompt(&self) -> u64 {
        self.prompt_token_count.unwrap_or(0)
    }

    pub fn candidates(&self) -> u64 {
        self.candidates_token_count.unwrap_or(0)
    }
}

/// Successful chat answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatAnswer {
    pub text: String,
    pub citations: Vec<Citation>,
    pub usage: Option<UsageStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatFailure {
    /// The backend answered but reported an error (or no answer at all).
    Remote { message: Option<String> },
    /// The request never produced a decodable reply.
    Transport { detail: String },
}

/// A chat reply decoded at the network boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    Success(ChatAnswer),
    Failure(ChatFailure),
}

impl ChatOutcome {
    /// A non-empty `response` wins over everything else; anything else is a
    /// remote failure carrying `error` when present.
    pub fn from_reply(reply: ChatReply) -> Self {
        match reply.response {
            Some(text) if !text.is_empty() => ChatOutcome::Success(ChatAnswer {
                text,
                citations: reply.citations.unwrap_or_default(),
                usage: reply.usage,
            }),
            _ => ChatOutcome::Failure(ChatFailure::Remote {
                message: reply.error.filter(|e| !e.is_empty()),
            }),
        }
    }

    pub fn from_result(result: Result<ChatReply>) -> Self {
        match result {
            Ok(reply) => Self::from_reply(reply),
            Err(e) => ChatOutcome::Failure(ChatFailure::Transport {
                detail: e.to_string(),
            }),
        }
    }
}

/// Entry of `GET /api/stores`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub name: String,
    #[serde(default, alias = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "count_from_string_or_number")]
    pub active_documents_count: u64,
    #[serde(default, deserialize_with = "count_from_string_or_number")]
    pub pending_documents_count: u64,
    #[serde(default, deserialize_with = "count_from_string_or_number")]
    pub failed_documents_count: u64,
    #[serde(default, deserialize_with = "count_from_string_or_number")]
    pub size_bytes: u64,
}

impl StoreSummary {
    pub fn label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.name,
        }
    }
}

/// An explicit `null` reads the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Counters are int64 on the Gemini side, which JSON-encodes them as strings.
pub(crate) fn count_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
        Null(()),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) if s.trim().is_empty() => Ok(0),
        Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Count::Null(()) => Ok(0),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeyRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyAck {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn reply(value: serde_json::Value) -> ChatReply {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_success_with_citations_and_usage() {
        let outcome = ChatOutcome::from_reply(reply(json!({
            "query": "what?",
            "response": "hello",
            "citations": [{"source": "doc.pdf", "page": "Page 2", "text": "abc"}],
            "usage": {"total_token_count": 5, "prompt_token_count": 3}
        })));

        match outcome {
            ChatOutcome::Success(answer) => {
                assert_eq!(answer.text, "hello");
                assert_eq!(answer.citations.len(), 1);
                assert_eq!(answer.citations[0].page, Some(PageRef::Label("Page 2".into())));
                let usage = answer.usage.unwrap();
                assert_eq!(usage.total(), 5);
                assert_eq!(usage.candidates(), 0);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_response_is_failure() {
        let outcome = ChatOutcome::from_reply(reply(json!({"response": ""})));
        assert_eq!(
            outcome,
            ChatOutcome::Failure(ChatFailure::Remote { message: None })
        );
    }

    #[test]
    fn test_error_field_is_failure() {
        let outcome = ChatOutcome::from_reply(reply(json!({"error": "bad store"})));
        assert_eq!(
            outcome,
            ChatOutcome::Failure(ChatFailure::Remote {
                message: Some("bad store".into())
            })
        );
    }

    #[test]
    fn test_response_wins_over_error() {
        let outcome = ChatOutcome::from_reply(reply(json!({"response": "x", "error": "y"})));
        assert!(matches!(outcome, ChatOutcome::Success(answer) if answer.text == "x"));
    }

    #[test]
    fn test_request_fields_accept_null() {
        let request: ChatRequest =
            serde_json::from_value(json!({"query": null, "store_names": null})).unwrap();
        assert_eq!(request, ChatRequest::default());

        let key: ApiKeyRequest = serde_json::from_value(json!({"api_key": null})).unwrap();
        assert!(key.api_key.is_empty());
    }

    #[test]
    fn test_transport_failure() {
        let outcome = ChatOutcome::from_result(Err(Error::api("connection refused")));
        match outcome {
            ChatOutcome::Failure(ChatFailure::Transport { detail }) => {
                assert!(detail.contains("connection refused"));
            }
            other => panic!("expected transport failure, got {:?}", other),
        }
    }

    #[test]
    fn test_page_ref_variants() {
        let numeric: Citation = serde_json::from_value(json!({"page": 7})).unwrap();
        assert_eq!(numeric.page, Some(PageRef::Number(7)));
        assert!(numeric.page.unwrap().is_specified());

        assert!(!PageRef::Number(0).is_specified());
        assert!(!PageRef::Label(String::new()).is_specified());
    }

    #[test]
    fn test_store_counts_accept_strings_and_numbers() {
        let stores: Vec<StoreSummary> = serde_json::from_value(json!([
            {"name": "fileSearchStores/a", "displayName": "Alpha", "active_documents_count": "12", "size_bytes": "2048"},
            {"name": "fileSearchStores/b", "active_documents_count": 3, "pending_documents_count": null}
        ]))
        .unwrap();

        assert_eq!(stores[0].label(), "Alpha");
        assert_eq!(stores[0].active_documents_count, 12);
        assert_eq!(stores[0].size_bytes, 2048);
        assert_eq!(stores[1].label(), "fileSearchStores/b");
        assert_eq!(stores[1].active_documents_count, 3);
        assert_eq!(stores[1].pending_documents_count, 0);
    }
}
