//! Run-by-run DOCX translation.
//!
//! Only `word/document.xml` is rewritten; every other part of the package is
//! copied over byte for byte, compression included.

use std::io::{Cursor, Read, Write};

use doctranslate_core::translate::{Oracle, OracleError, Translator};
use log::info;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub mod body;
pub mod rewrite;

pub use body::BodyElement;

/// Main document part inside the package.
pub const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("ZIP error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Missing required part: {0}")]
    MissingPart(String),
    #[error("Malformed part: {0}")]
    MalformedPart(String),
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Translate the body text of a DOCX package.
///
/// Paragraphs directly in the body and paragraphs directly in top-level table
/// cells are visited; in each of their runs the first `w:t` is replaced by
/// its translation.
pub fn translate_docx<O: Oracle + ?Sized>(
    bytes: &[u8],
    translator: &Translator<'_, O>,
) -> Result<Vec<u8>, DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut xml = Vec::new();
    match archive.by_name(DOCUMENT_PART) {
        Ok(mut part) => {
            part.read_to_end(&mut xml)?;
        }
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(DocxError::MissingPart(DOCUMENT_PART.to_string()))
        }
        Err(e) => return Err(e.into()),
    }

    info!(
        "Translating {} ({} bytes) from {} to {}",
        DOCUMENT_PART,
        xml.len(),
        translator.languages().source,
        translator.languages().target
    );
    let translated = rewrite::rewrite_document_xml(&xml, translator)?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if entry.name() == DOCUMENT_PART {
            drop(entry);
            writer.start_file(DOCUMENT_PART, options)?;
            writer.write_all(&translated)?;
        } else {
            writer.raw_copy_file(entry)?;
        }
    }

    Ok(writer.finish()?.into_inner())
}
