//! Display rules shared by the terminal UI and the one-shot CLI.

use std::fmt::Write;
use std::time::Duration;

use crate::api::types::{Citation, UsageStats};
use crate::chat::panel::{ChatPanelView, CitationEntry, CitationsView, TokenCounts, UsageView};
use crate::chat::types::Sender;

/// Citation excerpts longer than this many characters are cut.
pub const EXCERPT_LIMIT: usize = 200;

pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis >= 1000 {
        format!("{:.2} seconds", millis as f64 / 1000.0)
    } else {
        format!("{} ms", millis)
    }
}

pub fn truncate_excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub(crate) fn citations_view(citations: &[Citation]) -> Option<CitationsView> {
    if citations.is_empty() {
        return None;
    }

    let entries = citations
        .iter()
        .enumerate()
        .map(|(index, citation)| CitationEntry {
            reference: index + 1,
            source: citation
                .source
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            page: citation
                .page
                .as_ref()
                .filter(|p| p.is_specified())
                .map(|p| p.to_string())
                .unwrap_or_else(|| "Not specified".to_string()),
            excerpt: citation
                .text
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(truncate_excerpt)
                .unwrap_or_else(|| "N/A".to_string()),
        })
        .collect::<Vec<_>>();

    Some(CitationsView {
        summary: format!("Citations ({} references used)", entries.len()),
        entries,
    })
}

pub(crate) fn usage_view(usage: Option<&UsageStats>, elapsed: Duration) -> UsageView {
    UsageView {
        tokens: usage.map(|u| TokenCounts {
            total: u.total(),
            prompt: u.prompt(),
            candidates: u.candidates(),
        }),
        elapsed: format_elapsed(elapsed),
    }
}

impl TokenCounts {
    pub fn lines(&self) -> [String; 3] {
        [
            format!("Total tokens used: {}", self.total),
            format!("Prompt tokens (including documents): {}", self.prompt),
            format!("Response tokens generated: {}", self.candidates),
        ]
    }
}

/// Plain-text rendering of the whole panel.
pub fn render_plain(view: &ChatPanelView<'_>) -> String {
    let mut out = String::new();

    for message in view.transcript {
        let who = match message.sender {
            Sender::User => "You",
            Sender::Bot => "Bot",
        };
        let _ = writeln!(out, "{}:", who);
        for line in message.text().lines() {
            let _ = writeln!(out, "  {}", line);
        }
        out.push('\n');
    }

    if let Some(citations) = &view.citations {
        let _ = writeln!(out, "{}", citations.summary);
        for entry in &citations.entries {
            let _ = writeln!(out, "  Reference {}:", entry.reference);
            let _ = writeln!(out, "    File ID: {}", entry.source);
            let _ = writeln!(out, "    Page: {}", entry.page);
            let _ = writeln!(out, "    Text: \"{}\"", entry.excerpt);
        }
        out.push('\n');
    }

    if let Some(usage) = &view.usage {
        if let Some(tokens) = &usage.tokens {
            let _ = writeln!(out, "Token Usage:");
            for line in tokens.lines() {
                let _ = writeln!(out, "  {}", line);
            }
        }
        let _ = writeln!(out, "Response Time:");
        let _ = writeln!(out, "  Time taken: {}", usage.elapsed);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::PageRef;

    #[test]
    fn test_elapsed_formatting() {
        assert_eq!(format_elapsed(Duration::from_millis(850)), "850 ms");
        assert_eq!(format_elapsed(Duration::from_millis(999)), "999 ms");
        assert_eq!(format_elapsed(Duration::from_millis(1000)), "1.00 seconds");
        assert_eq!(format_elapsed(Duration::from_millis(2500)), "2.50 seconds");
        assert_eq!(format_elapsed(Duration::from_millis(0)), "0 ms");
    }

    #[test]
    fn test_excerpt_truncation() {
        let exact = "a".repeat(200);
        assert_eq!(truncate_excerpt(&exact), exact);

        let long = "b".repeat(201);
        let cut = truncate_excerpt(&long);
        assert_eq!(cut, format!("{}...", "b".repeat(200)));

        // Counted in characters, not bytes.
        let accented = "é".repeat(250);
        assert_eq!(truncate_excerpt(&accented).chars().count(), 203);
    }

    #[test]
    fn test_citation_defaults() {
        let view = citations_view(&[
            Citation::default(),
            Citation {
                source: Some("report.pdf".into()),
                page: Some(PageRef::Number(4)),
                text: Some("quarterly numbers".into()),
            },
        ])
        .unwrap();

        assert_eq!(view.summary, "Citations (2 references used)");
        assert_eq!(view.entries[0].reference, 1);
        assert_eq!(view.entries[0].source, "Unknown");
        assert_eq!(view.entries[0].page, "Not specified");
        assert_eq!(view.entries[0].excerpt, "N/A");
        assert_eq!(view.entries[1].reference, 2);
        assert_eq!(view.entries[1].page, "4");
        assert_eq!(view.entries[1].excerpt, "quarterly numbers");
    }

    #[test]
    fn test_no_citations_clears_panel() {
        assert!(citations_view(&[]).is_none());
    }

    #[test]
    fn test_usage_defaults_to_zero() {
        let usage = UsageStats {
            total_token_count: Some(5),
            ..Default::default()
        };
        let view = usage_view(Some(&usage), Duration::from_millis(120));
        let tokens = view.tokens.unwrap();
        assert_eq!((tokens.total, tokens.prompt, tokens.candidates), (5, 0, 0));
        assert_eq!(view.elapsed, "120 ms");
    }
}
