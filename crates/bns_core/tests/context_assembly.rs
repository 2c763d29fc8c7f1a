use std::collections::BTreeMap;

use bns_core::context::ContextAssembler;
use bns_core::corpus::{CorpusStore, SectionId};
use pretty_assertions::assert_eq;

fn corpus() -> CorpusStore {
    let mut sections = BTreeMap::new();
    sections.insert("5".to_string(), vec!["Theft of movable".to_string(), "property.".to_string()]);
    sections.insert("12".to_string(), vec!["Murder  is punishable\nwith death.".to_string()]);
    sections.insert("40".to_string(), vec!["No cross reference.".to_string()]);
    let mut cross = BTreeMap::new();
    cross.insert("5".to_string(), vec!["IPC 378".to_string()]);
    cross.insert("12".to_string(), vec!["IPC 302".to_string()]);
    CorpusStore::from_fragments(sections, cross)
}

fn ids(raw: &[&str]) -> Vec<SectionId> {
    raw.iter().map(|s| SectionId::from(*s)).collect()
}

#[test]
fn legal_context_keeps_retrieval_order_with_triple_newlines() {
    let corpus = corpus();
    let ctx = ContextAssembler::new(&corpus).assemble(&ids(&["5", "12"])).unwrap();

    assert_eq!(
        ctx.legal_context,
        "### Section: 5\n\nSection text: Theft of movable property.\n\n\n\
         ### Section: 12\n\nSection text: Murder is punishable with death."
    );
    let first = ctx.legal_context.find("### Section: 5").unwrap();
    let second = ctx.legal_context.find("### Section: 12").unwrap();
    assert!(first < second);
}

#[test]
fn cross_references_and_listing_use_blank_line_separators() {
    let corpus = corpus();
    let ctx = ContextAssembler::new(&corpus).assemble(&ids(&["12", "5"])).unwrap();

    assert_eq!(
        ctx.cross_references,
        "Section 12 ------> Corresponding sections IPC 302\n\n\
         Section 5 ------> Corresponding sections IPC 378"
    );
    assert_eq!(
        ctx.section_listing,
        "### Section: 12\n\nSection text: Murder is punishable with death.\n\n\
         ### Section: 5\n\nSection text: Theft of movable property."
    );
}

#[test]
fn missing_key_fails_without_partial_context() {
    let corpus = corpus();
    let assembler = ContextAssembler::new(&corpus);

    let err = assembler.assemble(&ids(&["5", "40"])).unwrap_err();
    assert_eq!(err.code, "CORPUS_KEY_NOT_FOUND");
    assert!(err.details.unwrap_or_default().contains("cross_references"));

    let err = assembler.assemble(&ids(&["999", "5"])).unwrap_err();
    assert_eq!(err.code, "CORPUS_KEY_NOT_FOUND");
    assert!(err.details.unwrap_or_default().contains("section_id=999"));
}
