//! Digest formatting (feed items → one Slack `mrkdwn` text block).

use crate::domain::FeedItem;

/// Maximum number of entries in a digest.
pub const MAX_DIGEST_ITEMS: usize = 10;

/// Escape the characters Slack treats as control sequences in `mrkdwn`.
pub fn escape_mrkdwn(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Percent-encode the characters that would end a `<link|label>` early.
pub fn escape_link(link: &str) -> String {
    link.replace('<', "%3C")
        .replace('>', "%3E")
        .replace('|', "%7C")
}

/// Render `header` followed by up to [`MAX_DIGEST_ITEMS`] numbered entries.
///
/// Entry layout is `N. <link|title>`, with the summary on an indented second
/// line when present. Items past the tenth are dropped; no padding is added.
pub fn format_digest(header: &str, items: &[FeedItem]) -> String {
    let mut lines = Vec::with_capacity(items.len().min(MAX_DIGEST_ITEMS) + 1);
    lines.push(header.to_string());

    for (idx, item) in items.iter().take(MAX_DIGEST_ITEMS).enumerate() {
        lines.push(format_entry(idx + 1, item));
    }

    lines.join("\n")
}

fn format_entry(index: usize, item: &FeedItem) -> String {
    let title = escape_mrkdwn(item.title.trim());
    let link = escape_link(item.link.trim());

    let mut entry = if link.is_empty() {
        format!("{index}. {title}")
    } else {
        format!("{index}. <{link}|{title}>")
    };

    if let Some(summary) = item.summary.as_deref().map(str::trim) {
        if !summary.is_empty() {
            entry.push_str("\n\t");
            entry.push_str(&escape_mrkdwn(summary));
        }
    }

    entry
}
