use crate::prelude::*;
use doctranslate_core::kind::DocumentKind;
use doctranslate_core::translate::{translate_plain_text, Oracle, Translator};

/// Run the pipeline for `kind` over a whole document.
///
/// Blocking: call it from `spawn_blocking` when on the runtime.
pub fn translate_bytes<O: Oracle + ?Sized>(
    kind: DocumentKind,
    bytes: &[u8],
    translator: &Translator<'_, O>,
) -> Result<Vec<u8>> {
    match kind {
        DocumentKind::Pdf => pdf::translate_document(bytes, translator).map_err(|e| eyre!(e)),
        DocumentKind::Docx => docx::translate_docx(bytes, translator).map_err(|e| eyre!(e)),
        DocumentKind::Txt => translate_plain_text(bytes, translator).map_err(|e| eyre!(e)),
    }
}

/// Run a blocking closure off the async workers.
pub async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| eyre!("Task join error: {e}"))?
}
