//! Layout-preserving PDF translation.
//!
//! Source pages are read through the [`PdfBackend`] trait, their text is
//! extracted as positioned fragments, translated, and redrawn onto fresh
//! pages of the same size with the standard Type1 fonts.
//!
//! ```text
//! source page  ->  TextFragment[]  ->  ContentSink ops  ->  destination page
//!                  parser::extract     render::reconstruct  render::document
//! ```

use doctranslate_core::fragment::TextFragment;
use doctranslate_core::translate::{Oracle, OracleError, Translator};
use log::{debug, info};
use thiserror::Error;

use parser::backend::{LopdfBackend, PdfBackend};
use render::canvas::PageCanvas;
use render::document::DocumentWriter;

pub mod fonts;
pub mod parser;
pub mod render;
pub mod types;

pub use fonts::{FontMapping, StandardFont};
pub use types::*;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("Rendering error: {0}")]
    Render(String),
    #[error("Character {ch:?} cannot be drawn with {font}")]
    UnmappableGlyph { ch: char, font: &'static str },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Translate a PDF, keeping each text fragment where it was on its page.
///
/// Any failure aborts the whole document; no partial output is produced.
pub fn translate_document<O: Oracle + ?Sized>(
    bytes: &[u8],
    translator: &Translator<'_, O>,
) -> Result<Vec<u8>, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    translate_with_backend(&backend, translator)
}

/// [`translate_document`] over an already opened source.
pub fn translate_with_backend<O: Oracle + ?Sized>(
    backend: &dyn PdfBackend,
    translator: &Translator<'_, O>,
) -> Result<Vec<u8>, PdfError> {
    let fonts = FontMapping::default();
    let pages = backend.pages();
    let total = pages.len();
    let mut writer = DocumentWriter::new();

    for (page_num, page_id) in pages {
        let media_box = backend.page_media_box(page_id)?;
        let fragments = parser::extract::extract_page_fragments(backend, page_id)?;
        info!(
            "Translating page {}/{} ({} fragments)",
            page_num,
            total,
            fragments.len()
        );

        let mut canvas = PageCanvas::new();
        render::reconstruct::reconstruct_page(&mut canvas, &fragments, &fonts, translator)?;
        writer.add_page(media_box, canvas)?;
    }

    debug!("Serializing {} pages", writer.page_count());
    writer.finish()
}

/// Extract every page's fragment stream without translating.
///
/// Returns `(page_number, fragments)` pairs with 1-based page numbers.
pub fn extract_fragments(bytes: &[u8]) -> Result<Vec<(u32, Vec<TextFragment>)>, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    parser::extract::extract_all_pages(&backend)
}
