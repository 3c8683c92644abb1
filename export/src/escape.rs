//! Item name escaping for XML names.
//!
//! Characters that cannot appear in an XML name are written as `_xHHHH_`,
//! with `HHHH` the character's code point. A literal `_xHHHH` already in the
//! name gets its underscore escaped first, so decoding is unambiguous.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static LITERAL_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(x[0-9a-fA-F]{4})").expect("valid regex"));

static ESCAPE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_x([0-9a-fA-F]{4})_").expect("valid regex"));

const REPLACEMENTS: [(char, &str); 5] = [
    (' ', "_x0020_"),
    ('<', "_x003c_"),
    ('>', "_x003e_"),
    ('"', "_x0022_"),
    ('\'', "_x0027_"),
];

/// Escape an item name for use as an XML element or attribute name.
pub fn escape_name(name: &str) -> String {
    let guarded = LITERAL_ESCAPE.replace_all(name, "_x005f_$1");
    let mut escaped = String::with_capacity(guarded.len());
    for c in guarded.chars() {
        match REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, token)) => escaped.push_str(token),
            None => escaped.push(c),
        }
    }
    escaped
}

/// Decode every `_xHHHH_` token back to its character.
pub fn unescape_name(name: &str) -> String {
    ESCAPE_TOKEN
        .replace_all(name, |caps: &regex_lite::Captures<'_>| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
