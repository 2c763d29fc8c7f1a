/// Collapse every whitespace run (newlines included) to one space and trim.
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn join_fragments(fragments: &[String]) -> String {
    normalize_text(&fragments.join(" "))
}
