//! Where translatable text lives in `word/document.xml`.

/// A body-level container whose runs get translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyElement {
    /// `w:body / w:p`
    Paragraph,
    /// `w:body / w:tbl / w:tr / w:tc / w:p`
    TableCell,
}

const PARAGRAPH_PATH: &[&[u8]] = &[b"w:body", b"w:p"];
const TABLE_CELL_PATH: &[&[u8]] = &[b"w:body", b"w:tbl", b"w:tr", b"w:tc", b"w:p"];

impl BodyElement {
    /// Classify the innermost open paragraph given the stack of open element
    /// names, outermost first. Only paragraphs directly in the body or
    /// directly in a top-level table cell qualify.
    pub fn locate<N: AsRef<[u8]>>(open: &[N]) -> Option<Self> {
        if ends_with_path(open, PARAGRAPH_PATH) {
            Some(BodyElement::Paragraph)
        } else if ends_with_path(open, TABLE_CELL_PATH) {
            Some(BodyElement::TableCell)
        } else {
            None
        }
    }
}

fn ends_with_path<N: AsRef<[u8]>>(open: &[N], path: &[&[u8]]) -> bool {
    // The body must be directly under the document root.
    if open.len() != path.len() + 1 {
        return false;
    }
    open[1..]
        .iter()
        .zip(path)
        .all(|(name, expected)| name.as_ref() == *expected)
}
