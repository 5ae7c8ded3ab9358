//! Rendering of search results into postable text

use crate::types::{CandidateItem, PublishableMessage};

/// Maximum length of the quoted title, counting the opening quote
pub const MAX_QUOTED_TITLE_CHARS: usize = 100;

/// Appended to a title that was cut short
pub const ELLIPSIS: &str = "...";

/// Render an item as `"<title>" #<hashtag> <link>`
///
/// The title is HTML-decoded first, since the search API returns it
/// entity-encoded. Lengths are counted in characters, never bytes, so a
/// multi-byte title is never split mid-character.
pub fn format_message(item: &CandidateItem, hashtag: &str) -> PublishableMessage {
    let decoded = html_escape::decode_html_entities(&item.title);

    let mut quoted = String::with_capacity(decoded.len() + 8);
    quoted.push('"');
    quoted.push_str(&decoded);

    if quoted.chars().count() > MAX_QUOTED_TITLE_CHARS {
        quoted = quoted.chars().take(MAX_QUOTED_TITLE_CHARS).collect();
        quoted.push_str(ELLIPSIS);
    }

    PublishableMessage::new(format!("{}\" #{} {}", quoted, hashtag, item.link))
}
