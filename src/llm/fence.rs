// src/llm/fence.rs
//
// Post-processing of generator replies: keep the fenced code, drop the prose.

use std::sync::OnceLock;

use regex::Regex;

pub const DEFAULT_FENCE_LANGUAGES: &[&str] = &["javascript", "js", "jsx", "typescript", "ts", "tsx"];

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```([A-Za-z0-9_+-]*)[^\n]*\n(.*?)```").expect("fence pattern is valid")
    })
}

/// Extract code blocks fenced with one of `languages`, strip their blank
/// lines and join the non-empty ones. A reply without such blocks yields an
/// empty string.
pub fn extract_code_blocks(reply: &str, languages: &[String]) -> String {
    fence_re()
        .captures_iter(reply)
        .filter(|cap| {
            let lang = cap.get(1).map_or("", |m| m.as_str());
            languages.iter().any(|l| l.eq_ignore_ascii_case(lang))
        })
        .filter_map(|cap| cap.get(2))
        .map(|body| strip_blank_lines(body.as_str()))
        .filter(|code| !code.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text that already looks like code (no fences at all) is used as is.
pub fn unwrap_reply(reply: &str, languages: &[String]) -> String {
    if reply.contains("```") {
        extract_code_blocks(reply, languages)
    } else {
        reply.trim().to_string()
    }
}

pub fn default_languages() -> Vec<String> {
    DEFAULT_FENCE_LANGUAGES.iter().map(|s| s.to_string()).collect()
}

fn strip_blank_lines(code: &str) -> String {
    code.lines()
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
