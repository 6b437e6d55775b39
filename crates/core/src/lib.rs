//! Core library for doctranslate
//!
//! This crate implements the **Functional Core** of the doctranslate
//! application, following the Functional Core - Imperative Shell pattern.
//!
//! # Architecture Overview
//!
//! - **`doctranslate_core`** (this crate): chunking, prompts, fragment
//!   classification and cursor bookkeeping, with zero I/O
//! - **`pdf`** / **`docx`**: container codecs that feed the core
//! - **`doctranslate`**: the CLI and HTTP shell, including the Ollama oracle
//!
//! The only seam to the outside world is the [`translate::Oracle`] trait. Tests
//! plug in stub oracles; the shell plugs in a real model.
//!
//! # Module Organization
//!
//! - [`chunk`]: fixed-size chunking and display-line splitting
//! - [`fragment`]: positioned text fragments and new-line classification
//! - [`kind`]: file-type dispatch and output naming
//! - [`layout`]: the per-page render cursor
//! - [`translate`]: the translation gateway and plain-text path
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use doctranslate_core::translate::{LanguagePair, Oracle, OracleError, Translator};
//!
//! struct Shout;
//!
//! impl Oracle for Shout {
//!     fn complete(&self, prompt: &str) -> Result<String, OracleError> {
//!         Ok(prompt.to_uppercase())
//!     }
//! }
//!
//! let translator = Translator::new(&Shout, LanguagePair::new("en", "fr"));
//! assert_eq!(translator.translate("   ")?, "");
//! ```

pub mod chunk;
pub mod fragment;
pub mod kind;
pub mod layout;
pub mod translate;
