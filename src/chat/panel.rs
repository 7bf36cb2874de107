//! The chat panel controller.
//!
//! A submission goes through two steps: [`ChatPanel::submit`] validates the
//! input, appends the user message and hands back a [`PendingChat`]; once the
//! backend has answered, [`ChatPanel::complete`] appends the bot message and
//! replaces the citations and usage panels. The caller owns the request in
//! between, so several may be outstanding at once and the last completion wins
//! on the panels.

use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::api::client::ChatBackend;
use crate::api::types::{ChatFailure, ChatOutcome, ChatRequest};
use crate::chat::format::{citations_view, usage_view};
use crate::chat::types::ChatMessage;

const REMOTE_FAILURE_PREFIX: &str = "Sorry, there was an error processing your request: ";
const TRANSPORT_FAILURE: &str = "Sorry, there was an error connecting to the API.";

/// Rejected before anything is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Please enter a message")]
    EmptyQuery,
    #[error("Please select a store")]
    NoStoreSelected,
}

/// A submitted query whose reply has not been applied yet.
#[derive(Debug, Clone)]
pub struct PendingChat {
    pub ticket: u64,
    pub request: ChatRequest,
    started_at: Instant,
}

impl PendingChat {
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationEntry {
    pub reference: usize,
    pub source: String,
    pub page: String,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationsView {
    pub summary: String,
    pub entries: Vec<CitationEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCounts {
    pub total: u64,
    pub prompt: u64,
    pub candidates: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageView {
    /// Absent after failures and when the reply carried no usage object.
    pub tokens: Option<TokenCounts>,
    pub elapsed: String,
}

/// Read-only snapshot the renderers work from.
#[derive(Debug, Clone, Copy)]
pub struct ChatPanelView<'a> {
    pub transcript: &'a [ChatMessage],
    pub citations: Option<&'a CitationsView>,
    pub usage: Option<&'a UsageView>,
    pub outstanding: usize,
}

impl ChatPanelView<'_> {
    pub fn is_awaiting(&self) -> bool {
        self.outstanding > 0
    }
}

#[derive(Debug, Default)]
pub struct ChatPanel {
    transcript: Vec<ChatMessage>,
    citations: Option<CitationsView>,
    usage: Option<UsageView>,
    outstanding: usize,
    next_ticket: u64,
}

impl ChatPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, query: &str, store: Option<&str>) -> Result<PendingChat, SubmitError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SubmitError::EmptyQuery);
        }
        let store = store
            .filter(|s| !s.is_empty())
            .ok_or(SubmitError::NoStoreSelected)?;

        let started_at = Instant::now();
        self.transcript.push(ChatMessage::user(query));
        self.outstanding += 1;
        self.next_ticket += 1;

        debug!("Submitted chat #{} against {}", self.next_ticket, store);

        Ok(PendingChat {
            ticket: self.next_ticket,
            request: ChatRequest::for_store(query, store),
            started_at,
        })
    }

    pub fn complete(&mut self, pending: PendingChat, outcome: ChatOutcome) -> &ChatMessage {
        let elapsed = pending.elapsed();
        self.complete_after(pending, outcome, elapsed)
    }

    pub fn complete_after(
        &mut self,
        pending: PendingChat,
        outcome: ChatOutcome,
        elapsed: Duration,
    ) -> &ChatMessage {
        self.outstanding = self.outstanding.saturating_sub(1);

        let message = match outcome {
            ChatOutcome::Success(answer) => {
                self.citations = citations_view(&answer.citations);
                self.usage = Some(usage_view(answer.usage.as_ref(), elapsed));
                ChatMessage::bot(&answer.text)
            }
            ChatOutcome::Failure(failure) => {
                self.usage = Some(usage_view(None, elapsed));
                match failure {
                    ChatFailure::Remote { message } => {
                        let reason = message.as_deref().unwrap_or("Unknown error");
                        warn!("Chat #{} failed: {}", pending.ticket, reason);
                        ChatMessage::bot(&format!("{}{}", REMOTE_FAILURE_PREFIX, reason))
                    }
                    ChatFailure::Transport { detail } => {
                        error!("Chat #{} could not reach the backend: {}", pending.ticket, detail);
                        ChatMessage::bot(TRANSPORT_FAILURE)
                    }
                }
            }
        };

        self.transcript.push(message);
        &self.transcript[self.transcript.len() - 1]
    }

    pub fn view(&self) -> ChatPanelView<'_> {
        ChatPanelView {
            transcript: &self.transcript,
            citations: self.citations.as_ref(),
            usage: self.usage.as_ref(),
            outstanding: self.outstanding,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }
}

/// Runs one full exchange: submit, a single backend call, complete.
pub async fn run_turn<B>(
    panel: &mut ChatPanel,
    backend: &B,
    query: &str,
    store: Option<&str>,
) -> Result<(), SubmitError>
where
    B: ChatBackend + ?Sized,
{
    let pending = panel.submit(query, store)?;
    let outcome = ChatOutcome::from_result(backend.chat(&pending.request).await);
    panel.complete(pending, outcome);
    Ok(())
}
