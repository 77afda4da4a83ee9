//! Plain-text helpers used while normalizing feed items: markup stripping,
//! summaries, numeric character references, and filename-safe ids.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

/// The maximum number of characters in an item summary.
pub const SUMMARY_LENGTH: usize = 150;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*?>").unwrap());

/// Removes everything that looks like a tag (`<` up to the next `>`).
///
/// This is a best-effort approximation, not an HTML parser. Nesting is not
/// understood and unbalanced brackets silently swallow the text between them,
/// e.g. `a < b and c > d` becomes `a  d`.
pub fn strip_markup(text: &str) -> String {
    TAG.replace_all(text, "").into_owned()
}

/// Reduces raw item content to a short plain-text summary of at most
/// [`SUMMARY_LENGTH`] characters.
///
/// Whitespace handling is narrow: newlines become spaces, then
/// each literal run of two spaces and each literal run of eight spaces is
/// replaced by a single space, in that order. Longer runs are therefore only
/// partially collapsed.
pub fn summarize(content: &str) -> String {
    strip_markup(content)
        .replace('\n', " ")
        .replace("  ", " ")
        .replace("        ", " ")
        .replace('>', "")
        .replace('<', "")
        .chars()
        .take(SUMMARY_LENGTH)
        .collect()
}

/// Replaces every non-ASCII character with its decimal numeric character
/// reference so the text survives a single-byte document encoding.
pub fn fix_encoding(text: &str) -> String {
    if text.is_ascii() {
        return text.to_owned();
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            // writing to a String can't fail
            let _ = write!(out, "&#{};", c as u32);
        }
    }
    out
}

/// Strips the characters that feed-reader ids carry but which aren't safe in
/// filenames or fragment identifiers: `:` and `_`, plus path separators.
pub fn sanitize_id(id: &str) -> String {
    id.chars()
        .filter(|c| !matches!(c, ':' | '_' | '/' | '\\'))
        .collect()
}
