use bns_core::sanitize::{sanitize_response, ResponseState};
use pretty_assertions::assert_eq;

fn fold(fragments: &[&str]) -> Vec<String> {
    let mut state = ResponseState::new();
    let mut views = Vec::new();
    for f in fragments {
        state = state.advance(f);
        views.push(state.display.clone());
    }
    views
}

#[test]
fn reasoning_line_disappears_once_newline_arrives() {
    assert_eq!(sanitize_response("<think>reasoning here\nACTUAL ANSWER"), "ACTUAL ANSWER");
}

#[test]
fn reasoning_tag_split_across_fragments_is_never_shown() {
    let views = fold(&["<thi", "nk>weighing options", "\nSection 115", " applies."]);
    assert_eq!(views[0], "<thi");
    assert_eq!(views[1], "");
    assert_eq!(views[2], "Section 115");
    assert_eq!(views[3], "Section 115 applies.");
}

#[test]
fn dollar_amount_is_escaped_without_touching_digits() {
    let out = sanitize_response("Fine up to $100 or imprisonment.");
    assert_eq!(out, "Fine up to \\$100 or imprisonment.");
    assert!(out.contains("100"));
}

#[test]
fn sanitizer_is_pure_and_idempotent() {
    let inputs = [
        "<think>a\nb</think>\nAnswer costs $5",
        "Okay, so I'm trying to figure out what to do here\n- BNS 115",
        "  plain  ",
        "<think>",
    ];
    for input in inputs {
        let once = sanitize_response(input);
        assert_eq!(sanitize_response(input), once);
        assert_eq!(sanitize_response(&once), once);
    }
}

#[test]
fn fold_preserves_whitespace_between_fragments() {
    let views = fold(&["Section ", "115", " - hurt"]);
    assert_eq!(views, vec!["Section", "Section 115", "Section 115 - hurt"]);

    let state = ["a", "b", "c"].iter().fold(ResponseState::new(), |s, f| s.advance(f));
    assert_eq!(state.raw, "abc");
    assert_eq!(state.fragments, 3);
}
