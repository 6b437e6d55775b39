use crate::oracle::OllamaOracle;
use crate::pipeline::{run_blocking, translate_bytes};
use crate::prelude::{eprintln, println, *};
use doctranslate_core::kind::{detect_kind, translated_file_name, DocumentKind};
use doctranslate_core::translate::{LanguagePair, Oracle, Translator};
use std::path::{Path, PathBuf};

#[derive(Debug, clap::Parser)]
#[command(name = "translate")]
#[command(about = "Translate a PDF, DOCX or TXT file")]
pub struct App {
    /// Document to translate
    pub path: PathBuf,

    /// Source language, e.g. "English"
    #[clap(long)]
    pub from: String,

    /// Target language, e.g. "Spanish"
    #[clap(long)]
    pub to: String,

    /// Where to write the result (defaults to `translated-<name>` next to the input)
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let output = output_path(&app.path, app.output.as_deref());
    let languages = LanguagePair::new(app.from, app.to);
    let oracle = OllamaOracle::new(&global.ollama)?;

    if global.verbose {
        eprintln!("Ollama URL: {}", global.ollama.ollama_url);
        eprintln!("Model: {}", global.ollama.model);
        eprintln!(
            "Translating {} from {} to {}",
            app.path.display(),
            languages.source,
            languages.target
        );
    }

    let input = app.path.clone();
    let written = output.clone();
    let kind = run_blocking(move || {
        let translator = Translator::new(&oracle, languages);
        translate_file(&input, &written, &translator)
    })
    .await?;

    if global.verbose {
        eprintln!("Detected {:?} document", kind);
    }
    println!("{}", output.display());

    Ok(())
}

/// Default output location: `translated-<name>` in the input's directory.
pub fn output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    if let Some(output) = output {
        return output.to_path_buf();
    }
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(translated_file_name(&name))
}

/// Translate `input` into `output`. Nothing is written unless the whole
/// document translated.
pub fn translate_file<O: Oracle + ?Sized>(
    input: &Path,
    output: &Path,
    translator: &Translator<'_, O>,
) -> Result<DocumentKind> {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kind = detect_kind(None, &name)
        .ok_or_else(|| Error::UnsupportedInputType(input.display().to_string()))?;

    let bytes = std::fs::read(input)
        .with_context(|| f!("Failed to read file '{}'", input.display()))?;
    let translated = translate_bytes(kind, &bytes, translator)
        .with_context(|| f!("Failed to translate '{}'", input.display()))?;
    std::fs::write(output, translated)
        .with_context(|| f!("Failed to write file '{}'", output.display()))?;

    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctranslate_core::translate::OracleError;

    struct Upper;

    impl Oracle for Upper {
        fn complete(&self, prompt: &str) -> Result<String, OracleError> {
            let start = prompt.find("'''").map(|i| i + 3).unwrap_or(0);
            let end = prompt.rfind("'''").unwrap_or(prompt.len());
            Ok(prompt[start..end].to_uppercase())
        }
    }

    struct Down;

    impl Oracle for Down {
        fn complete(&self, _prompt: &str) -> Result<String, OracleError> {
            Err(OracleError::Timeout(120))
        }
    }

    fn pair() -> LanguagePair {
        LanguagePair::new("English", "German")
    }

    #[test]
    fn test_output_path_defaults_next_to_input() {
        assert_eq!(
            output_path(Path::new("/tmp/docs/report.pdf"), None),
            PathBuf::from("/tmp/docs/translated-report.pdf")
        );
        assert_eq!(
            output_path(Path::new("report.pdf"), Some(Path::new("out.pdf"))),
            PathBuf::from("out.pdf")
        );
    }

    #[test]
    fn test_translates_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, "good morning").unwrap();
        let output = output_path(&input, None);

        let translator = Translator::new(&Upper, pair());
        let kind = translate_file(&input, &output, &translator).unwrap();

        assert_eq!(kind, DocumentKind::Txt);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "GOOD MORNING");
        assert_eq!(output.file_name().unwrap(), "translated-notes.txt");
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.png");
        std::fs::write(&input, [0u8, 1, 2]).unwrap();
        let output = output_path(&input, None);

        let translator = Translator::new(&Upper, pair());
        let err = translate_file(&input, &output, &translator).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnsupportedInputType(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_oracle_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, "good morning").unwrap();
        let output = output_path(&input, None);

        let translator = Translator::new(&Down, pair());
        assert!(translate_file(&input, &output, &translator).is_err());
        assert!(!output.exists());
    }
}
