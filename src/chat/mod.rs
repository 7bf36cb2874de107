pub mod format;
pub mod panel;
pub mod types;

pub use format::{format_elapsed, render_plain, truncate_excerpt};
pub use panel::{
    run_turn, ChatPanel, ChatPanelView, CitationEntry, CitationsView, PendingChat, SubmitError,
    TokenCounts, UsageView,
};
pub use types::{ChatMessage, MessageBody, Sender};
