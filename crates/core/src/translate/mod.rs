//! Translation gateway.
//!
//! The oracle itself (an LLM behind some transport) lives in the shell; this
//! module only knows the [`Oracle`] trait. Everything here is deterministic
//! given the oracle's answers, which keeps it testable with stub oracles.

pub mod prompt;
pub mod types;

pub use prompt::build_prompt;
pub use types::LanguagePair;

use crate::chunk::{chunk, DEFAULT_CHUNK_SIZE};

/// Failure reported by a translation oracle.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Oracle request failed: {0}")]
    Request(String),

    #[error("Oracle timed out after {0} seconds")]
    Timeout(u64),
}

/// A text-in, text-out completion service.
///
/// Implementations block until the model answers or fails. Timeouts and
/// retries, if any, are the implementation's business.
pub trait Oracle {
    fn complete(&self, prompt: &str) -> Result<String, OracleError>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        (**self).complete(prompt)
    }
}

/// An oracle bound to a language pair.
pub struct Translator<'a, O: Oracle + ?Sized> {
    oracle: &'a O,
    languages: LanguagePair,
}

impl<'a, O: Oracle + ?Sized> Translator<'a, O> {
    pub fn new(oracle: &'a O, languages: LanguagePair) -> Self {
        Self { oracle, languages }
    }

    pub fn languages(&self) -> &LanguagePair {
        &self.languages
    }

    /// Translate a single payload.
    ///
    /// Empty or whitespace-only input returns `""` without calling the
    /// oracle. Otherwise the oracle's response is returned verbatim and any
    /// oracle error is passed through unchanged.
    pub fn translate(&self, text: &str) -> Result<String, OracleError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        self.oracle.complete(&build_prompt(text, &self.languages))
    }

    /// Translate `text` in [`DEFAULT_CHUNK_SIZE`] windows and concatenate the
    /// results in order.
    pub fn translate_chunked(&self, text: &str) -> Result<String, OracleError> {
        let mut translated = String::new();
        for part in chunk(text, DEFAULT_CHUNK_SIZE) {
            translated.push_str(&self.translate(&part)?);
        }
        Ok(translated)
    }
}

/// Translate a plain-text document.
///
/// The bytes are decoded as UTF-8 (invalid sequences are replaced), split into
/// [`DEFAULT_CHUNK_SIZE`] windows, translated in order and re-encoded.
pub fn translate_plain_text<O: Oracle + ?Sized>(
    bytes: &[u8],
    translator: &Translator<'_, O>,
) -> Result<Vec<u8>, OracleError> {
    let text = String::from_utf8_lossy(bytes);
    Ok(translator.translate_chunked(&text)?.into_bytes())
}
