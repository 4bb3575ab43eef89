use std::sync::LazyLock;

use regex::{Captures, Regex};

// One alternative per tag: the closing name must match the opening one.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<search>(?P<search>.*?)</search>|<memory>(?P<memory>.*?)</memory>|<query>(?P<query>.*?)</query>")
        .expect("tag pattern is valid")
});

/// Rewrites `<search>`, `<memory>` and `<query>` spans into bracketed annotations.
///
/// Only the text changes; nothing is actually looked up.
pub fn process_search_commands(response: &str) -> String {
    TAG_RE
        .replace_all(response, |caps: &Captures| {
            if let Some(term) = caps.name("search") {
                format!("[Searching internet for: {}]", term.as_str())
            } else if let Some(term) = caps.name("memory") {
                format!("[Searching memory for: {}]", term.as_str())
            } else if let Some(term) = caps.name("query") {
                format!("[Searching database for: {}]", term.as_str())
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}
