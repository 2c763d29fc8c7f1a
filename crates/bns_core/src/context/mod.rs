use serde::{Deserialize, Serialize};

use crate::corpus::{normalize_text, CorpusStore, SectionId};
use crate::error::AppError;

const LEGAL_BLOCK_SEPARATOR: &str = "\n\n\n";
const LISTING_SEPARATOR: &str = "\n\n";

/// Text blocks rebuilt for every query from the selected sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssembledContext {
    /// Fed to the model as `{legal_context}`.
    pub legal_context: String,
    /// BNS → IPC cross-reference listing shown next to the answer.
    pub cross_references: String,
    /// Full section texts, shown in their own display region.
    pub section_listing: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler<'a> {
    corpus: &'a CorpusStore,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(corpus: &'a CorpusStore) -> Self {
        Self { corpus }
    }

    /// Render sections in the order given. A missing key in either document
    /// fails the whole assembly; nothing partial is returned.
    pub fn assemble(&self, ids: &[SectionId]) -> Result<AssembledContext, AppError> {
        let mut legal_blocks: Vec<String> = Vec::with_capacity(ids.len());
        let mut cross_lines: Vec<String> = Vec::with_capacity(ids.len());

        for id in ids {
            let text = self.corpus.section_text(id)?;
            let cross = self.corpus.cross_reference(id)?;
            legal_blocks.push(render_section(id, text));
            cross_lines.push(render_cross_reference(id, cross));
        }

        Ok(AssembledContext {
            legal_context: legal_blocks.join(LEGAL_BLOCK_SEPARATOR),
            cross_references: cross_lines.join(LISTING_SEPARATOR),
            section_listing: legal_blocks.join(LISTING_SEPARATOR),
        })
    }
}

fn render_section(id: &SectionId, text: &str) -> String {
    format!("### Section: {id}\n\nSection text: {}", normalize_text(text))
}

fn render_cross_reference(id: &SectionId, text: &str) -> String {
    format!(
        "Section {id} ------> Corresponding sections {}",
        normalize_text(text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_block_has_header_and_body() {
        assert_eq!(
            render_section(&"5".into(), "Theft  is\npunishable"),
            "### Section: 5\n\nSection text: Theft is punishable"
        );
    }

    #[test]
    fn cross_reference_line_format() {
        assert_eq!(
            render_cross_reference(&"103".into(), "IPC 302"),
            "Section 103 ------> Corresponding sections IPC 302"
        );
    }
}
