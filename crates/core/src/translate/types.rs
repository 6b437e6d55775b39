use serde::{Deserialize, Serialize};

/// Source and target language names, passed verbatim into the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    /// Language the document is written in (e.g. `"English"` or `"en"`).
    pub source: String,
    /// Language to translate into.
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}
