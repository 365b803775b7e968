//! Cache key construction and glob matching.
//!
//! Keys have the form `<category>:<part>[:<part>...]`. Coordinates are
//! rendered verbatim, so `40.0` and `40.00001` never share an entry.

use greenroute_kernel::{Location, SignalCategory};
use regex::Regex;

/// `<category>:<key>`
pub fn category_key(category: SignalCategory, key: &str) -> String {
    format!("{}:{}", category.as_str(), key)
}

/// Join key parts with `:`.
pub fn compose(parts: &[&str]) -> String {
    parts.join(":")
}

/// `lat,lon` key part for a single location.
pub fn location_key(at: &Location) -> String {
    at.key_fragment()
}

/// `lat,lon:lat,lon` key part for a segment.
pub fn segment_key(from: &Location, to: &Location) -> String {
    compose(&[&from.key_fragment(), &to.key_fragment()])
}

/// Compile a glob (`*` any run, `?` any single character) into an anchored regex.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '*' | '?' => {
                expr.push_str(&regex::escape(&literal));
                literal.clear();
                expr.push_str(if ch == '*' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    expr.push_str(&regex::escape(&literal));
    expr.push('$');
    Regex::new(&expr)
}

/// Patterns removing every key that mentions `at`, across all categories.
///
/// Substring match on the rendered coordinate; there is no notion of radius.
pub fn area_patterns(at: &Location) -> Vec<String> {
    let fragment = at.key_fragment();
    SignalCategory::ALL
        .iter()
        .map(|category| format!("{}:*{}*", category.as_str(), fragment))
        .collect()
}
