//! Tokenizing of `NAME=VALUE` attribute lists.
//!
//! Several tags carry an [attribute list]
//! (https://tools.ietf.org/html/draft-pantos-http-live-streaming-19#section-4.2):
//! a comma-separated sequence of `NAME=VALUE` pairs where a VALUE may be a
//! double-quoted string that itself contains commas.

use std::collections::HashMap;

/// Tokenize the attribute list of a tag into a name to raw value map.
///
/// Commas inside double quotes do not separate attributes, a quote escapes
/// nothing, and an unmatched quote stays open to the end of the string.
/// Tokens without a `=` are dropped, the last occurrence of a duplicated
/// name wins, and enclosing quotes and whitespace are trimmed off the
/// values.
///
/// # Examples
///
/// ```
/// use m3u8_scan::parse_attribute_list;
///
/// let attrs = parse_attribute_list("BANDWIDTH=300000,CODECS=\"mp4a.40.2,avc1.4d401e\"");
/// assert_eq!(attrs["BANDWIDTH"], "300000");
/// assert_eq!(attrs["CODECS"], "mp4a.40.2,avc1.4d401e");
/// ```
pub fn parse_attribute_list(value: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    let mut in_quotes = false;
    let mut token_start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                insert_token(&mut attrs, &value[token_start..i]);
                token_start = i + 1;
            }
            _ => {}
        }
    }
    insert_token(&mut attrs, &value[token_start..]);

    attrs
}

/// One comma-free token; dropped silently unless it splits into `NAME=VALUE`.
fn insert_token(attrs: &mut HashMap<String, String>, token: &str) {
    if let Some((name, value)) = token.split_once('=') {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let value = value.trim_matches(|c: char| c.is_whitespace() || c == '"');
        attrs.insert(name.to_string(), value.to_string());
    }
}
