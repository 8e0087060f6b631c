//! Escaping of query-language metacharacters.

/// Characters with meaning in the query language.
pub const RESERVED: &[char] = &[
    '\\', '+', '-', '!', '(', ')', ':', '^', '[', ']', '"', '{', '}', '~', '*', '?', '|', '&',
];

/// Escapes every reserved character with a backslash.
///
/// The result parses as plain terms: no operators, groups, fields, ranges,
/// wildcards or boosts. Upper-case `AND`/`OR`/`NOT` words are left alone and
/// still act as keywords, so callers that need fully inert text should
/// lower-case it first.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if RESERVED.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
