//! Positioned text fragments and new-line classification.
//!
//! The extractor hands over [`TextRun`]s in reading order; [`classify_runs`]
//! folds them through a [`LineClassifier`] to produce the page's
//! [`TextFragment`] stream. The classifier's running `current_y` is page-wide
//! state, so a fresh classifier must be used for every page.

use serde::Serialize;

/// Vertical distance (in page units) beyond which a run starts a new line.
pub const NEW_LINE_THRESHOLD: f32 = 5.0;

/// A run of text as reported by the extraction engine, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Raw run text, untrimmed.
    pub text: String,
    /// Baseline X of the first glyph.
    pub x: f32,
    /// Baseline Y of the first glyph (origin bottom-left, Y up).
    pub y: f32,
    pub font_size: f32,
    pub font_name: Option<String>,
}

/// One extracted unit of text with its position and font metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    pub is_new_line: bool,
}

impl TextFragment {
    /// Whether there is nothing to translate or draw.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Running state for the new-line decision over one page.
#[derive(Debug, Clone, Copy)]
pub struct LineClassifier {
    current_y: f32,
    threshold: f32,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new(NEW_LINE_THRESHOLD)
    }
}

impl LineClassifier {
    pub fn new(threshold: f32) -> Self {
        Self {
            current_y: 0.0,
            threshold,
        }
    }

    /// Classify a baseline. Only a new line moves `current_y`.
    pub fn classify(&mut self, y: f32) -> bool {
        let is_new_line = (y - self.current_y).abs() > self.threshold;
        if is_new_line {
            self.current_y = y;
        }
        is_new_line
    }

    pub fn current_y(&self) -> f32 {
        self.current_y
    }
}

/// Turn a page's runs (already in reading order) into fragments.
pub fn classify_runs(runs: impl IntoIterator<Item = TextRun>) -> Vec<TextFragment> {
    runs.into_iter()
        .scan(LineClassifier::default(), |classifier, run| {
            let is_new_line = classifier.classify(run.y);
            Some(TextFragment {
                text: run.text.trim().to_string(),
                x: run.x,
                y: run.y,
                font_size: run.font_size,
                font_name: run.font_name,
                is_new_line,
            })
        })
        .collect()
}
