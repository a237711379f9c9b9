//! Locating the HTML payload inside free-form model output.

use std::sync::LazyLock;

use regex::Regex;

use promptpage_shared::{PromptPageError, Result};

use crate::tree::Document;

/// A fenced block, optionally tagged `html`. Captures the interior.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?i:html)?\s*(.*?)\s*```").expect("valid regex"));

/// Tags whose presence marks an unfenced response as markup.
const MARKUP_TAGS: &[&str] = &[
    "html", "body", "div", "section", "header", "footer", "p", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Return the HTML carried by `response`.
///
/// The first fenced block wins; otherwise the whole response is returned if
/// it contains recognizable page markup.
pub fn extract_html(response: &str) -> Result<String> {
    if let Some(caps) = FENCE_RE.captures(response) {
        return Ok(caps[1].trim().to_string());
    }

    let doc = Document::parse(response);
    if !doc.find_all(MARKUP_TAGS).is_empty() {
        return Ok(response.trim().to_string());
    }

    Err(PromptPageError::extraction(
        "Could not extract HTML from LLM response",
    ))
}
