//! Turn arbitrary header text into safe, bounded file name components.

use crate::model::address::EmailAddress;

/// Returned whenever nothing usable is left after cleaning.
pub const PLACEHOLDER: &str = "Unknown";

/// Longest file name, in bytes, accepted by common file systems.
pub const MAX_NAME_BYTES: usize = 255;

/// Characters rejected by common file systems (besides control characters).
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Clean `text` for use inside a file name.
///
/// - invalid and control characters become `_`
/// - runs of whitespace collapse to one space, runs of `_` to one `_`
/// - leading/trailing spaces, dots and underscores are trimmed
/// - the result is cut to `max_length` characters, at the last whitespace
///   when there is one
///
/// Never returns an empty string. A `max_length` of 0 is treated as 1.
pub fn clean(text: &str, max_length: usize) -> String {
    let max_length = max_length.max(1);

    let mut collapsed = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for ch in text.chars() {
        let ch = if ch.is_control() || INVALID_CHARS.contains(&ch) {
            '_'
        } else if ch.is_whitespace() {
            ' '
        } else {
            ch
        };
        if (ch == ' ' || ch == '_') && prev == Some(ch) {
            continue;
        }
        collapsed.push(ch);
        prev = Some(ch);
    }

    let truncated = truncate_at_word(trim_edges(&collapsed), max_length);
    let result = trim_edges(&truncated);
    if result.is_empty() {
        PLACEHOLDER.chars().take(max_length).collect()
    } else {
        result.to_string()
    }
}

/// Human name for an address header value.
///
/// `"Jane Doe <jane@x.com>"` gives `"Jane Doe"`, `"john.doe@x.com"` gives
/// `"John Doe"`. Empty input gives [`PLACEHOLDER`].
pub fn name_from_address(address: &str) -> String {
    EmailAddress::parse_first(address)
        .human_name()
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Cut `text` to at most `max_bytes` of UTF-8, on a character boundary.
///
/// Edges are trimmed again after the cut. Never returns an empty string.
pub fn fit_bytes(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let cut = trim_edges(&text[..end]);
    if cut.is_empty() {
        PLACEHOLDER.chars().take(max_bytes.max(1)).collect()
    } else {
        cut.to_string()
    }
}

/// Clean a complete file name, keeping its extension intact.
///
/// Path separators in `name` are neutralized, so the result is always a
/// single path component. The result is at most `max_length` characters and
/// [`MAX_NAME_BYTES`] bytes.
pub fn clean_file_name(name: &str, max_length: usize) -> String {
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && ext.len() <= 10 && !stem.trim().is_empty() => {
            (stem, Some(ext))
        }
        _ => (name, None),
    };
    match ext {
        Some(ext) => {
            let ext = clean(ext, 10);
            let stem_max = max_length.saturating_sub(ext.chars().count() + 1);
            let stem_bytes = MAX_NAME_BYTES.saturating_sub(ext.len() + 1);
            format!("{}.{}", fit_bytes(&clean(stem, stem_max), stem_bytes), ext)
        }
        None => fit_bytes(&clean(stem, max_length), MAX_NAME_BYTES),
    }
}

fn trim_edges(s: &str) -> &str {
    s.trim_matches(|c| c == ' ' || c == '.' || c == '_')
}

/// Cut to `max` characters, backing up to the last whitespace if any.
fn truncate_at_word(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max).collect();
    match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => cut[..idx].to_string(),
        _ => cut,
    }
}
