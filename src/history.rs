//! Message-history trimming
//!
//! The full turn log is replayed into every model invocation, bounded to an
//! approximate token budget. The trimmed window always starts on a user
//! entry and ends on a user or tool entry so tool-call/tool-result adjacency
//! is never broken mid-pair.

use crate::models::MessageEntry;

/// Approximate token budget replayed into each model invocation.
pub const HISTORY_TOKEN_BUDGET: usize = 8000;

/// Rough token estimate: four characters per token plus per-entry overhead.
fn approx_tokens(entry: &MessageEntry) -> usize {
    let chars = match entry {
        MessageEntry::User { text } => text.len(),
        MessageEntry::Assistant { text, tool_call } => {
            text.len()
                + tool_call
                    .as_ref()
                    .map(|call| call.name.len() + call.args.to_string().len())
                    .unwrap_or(0)
        }
        MessageEntry::ToolResult { content, .. } => content.len(),
    };
    chars / 4 + 4
}

pub fn approx_token_count(messages: &[MessageEntry]) -> usize {
    messages.iter().map(approx_tokens).sum()
}

fn valid_tail(entry: &MessageEntry) -> bool {
    entry.is_user() || entry.is_tool_result()
}

/// Trim to the most recent window that fits `budget` approximate tokens.
pub fn trim_history(messages: &[MessageEntry], budget: usize) -> Vec<MessageEntry> {
    if messages.is_empty() {
        return Vec::new();
    }

    // Keep the newest entries that fit the budget (always at least one).
    let mut start = messages.len();
    let mut used = 0;
    while start > 0 {
        let cost = approx_tokens(&messages[start - 1]);
        if used + cost > budget && start < messages.len() {
            break;
        }
        used += cost;
        start -= 1;
    }

    // The window must open on a user entry.
    let mut window_start = start;
    while window_start < messages.len() && !messages[window_start].is_user() {
        window_start += 1;
    }

    // No user entry inside the window: fall back to the latest user entry so
    // the model always sees what the customer actually asked.
    if window_start >= messages.len() {
        window_start = match messages.iter().rposition(MessageEntry::is_user) {
            Some(position) => position,
            None => return Vec::new(),
        };
    }

    // The window must close on a user or tool entry.
    let mut window_end = messages.len();
    while window_end > window_start && !valid_tail(&messages[window_end - 1]) {
        window_end -= 1;
    }

    messages[window_start..window_end].to_vec()
}
