//! HTML escaping for text and attribute content.

use std::borrow::Cow;

/// Get the HTML entity for a special character.
#[inline]
fn entity(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML special characters.
///
/// Borrows when nothing needs escaping, so the common case does not allocate.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.chars().any(|c| entity(c).is_some()) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match entity(c) {
            Some(e) => out.push_str(e),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}
