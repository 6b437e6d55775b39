use super::types::LanguagePair;

/// Build the oracle prompt for translating `text`.
///
/// The text is embedded literally between triple single-quotes so the model
/// can tell the instruction apart from the payload.
pub fn build_prompt(text: &str, languages: &LanguagePair) -> String {
    format!(
        "Translate the following text from {} to {}: '''{}'''",
        languages.source, languages.target, text
    )
}
