use bns_core::corpus::normalize_text;

/// Section texts longer than this are embedded as several documents.
pub const MAX_CHUNK_CHARS: usize = 1600;

/// Split normalized section text into sentence-packed chunks of at most
/// `max_chars` bytes. A single sentence longer than the limit stays whole.
pub fn chunk_section_text(text: &str, max_chars: usize) -> Vec<String> {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut buf = String::new();
    for sentence in split_sentences(&normalized) {
        let add_len = if buf.is_empty() { sentence.len() } else { 1 + sentence.len() };
        if !buf.is_empty() && buf.len() + add_len > max_chars {
            out.push(std::mem::take(&mut buf));
        }
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(sentence);
    }
    if !buf.is_empty() {
        out.push(buf);
    }
    out
}

// Sentence ends at ". " / "; " in normalized text.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let bytes = text.as_bytes();
    for i in 0..bytes.len().saturating_sub(1) {
        if (bytes[i] == b'.' || bytes[i] == b';') && bytes[i + 1] == b' ' {
            out.push(&text[start..=i]);
            start = i + 2;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}
