pub mod client;
pub mod types;

pub use client::{ApiClient, ChatBackend};
pub use types::{
    ApiKeyAck, ApiKeyRequest, ChatAnswer, ChatFailure, ChatOutcome, ChatReply, ChatRequest,
    Citation, PageRef, StoreSummary, UsageStats,
};
