//! Cleanup of streamed model output before display.
//!
//! The sanitizer always runs over the whole accumulated response, never over a
//! single fragment: reasoning markup and boilerplate can straddle fragment
//! boundaries.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Known filler opening emitted by small reasoning models.
pub const BOILERPLATE_PHRASE: &str = "Okay, so I'm trying to figure out what to do here";

static CLOSED_THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("closed think pattern"));

// Opener whose closing tag has not streamed in yet: drop up to the line end.
static OPEN_THINK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[^\n]*").expect("open think pattern"));

/// Pure cleanup of an accumulated response. Idempotent.
pub fn sanitize_response(accumulated: &str) -> String {
    let without_blocks = CLOSED_THINK_BLOCK.replace_all(accumulated, "");
    let without_open = OPEN_THINK_LINE.replace_all(&without_blocks, "");
    let cleaned = without_open.replace(BOILERPLATE_PHRASE, "");
    escape_dollars(cleaned.trim())
}

/// `$` → `\$` so the renderer does not read amounts as math delimiters.
/// Dollars that are already escaped stay as they are.
pub fn escape_dollars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev: Option<char> = None;
    for ch in s.chars() {
        if ch == '$' && prev != Some('\\') {
            out.push('\\');
        }
        out.push(ch);
        prev = Some(ch);
    }
    out
}

/// Fold state for one generation call.
///
/// `raw` is everything received so far; `display` is always
/// `sanitize_response(raw)`. The sanitized view is never fed back into the
/// fold, so trimming and escaping cannot compound across updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseState {
    pub raw: String,
    pub display: String,
    pub fragments: usize,
}

impl ResponseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(self, fragment: &str) -> Self {
        let mut raw = self.raw;
        raw.push_str(fragment);
        let display = sanitize_response(&raw);
        Self {
            raw,
            display,
            fragments: self.fragments + 1,
        }
    }
}
