//! Replays a page's translated fragments onto a destination page.

use doctranslate_core::chunk::to_lines;
use doctranslate_core::fragment::TextFragment;
use doctranslate_core::layout::{PenMove, RenderCursor};
use doctranslate_core::translate::{Oracle, Translator};
use log::debug;

use super::canvas::ContentSink;
use crate::fonts::FontMapping;
use crate::PdfError;

/// Translate and draw every drawable fragment of one page.
///
/// Blank fragments and fragments without a positive, finite font size (text
/// set with `0 Tf`, or collapsed by a degenerate matrix) are skipped.
///
/// Each fragment's text is translated in chunks and split into display lines.
/// Every line is drawn in its own text object, positioned by a page-scoped
/// [`RenderCursor`]: a line on the same baseline as the previous one is
/// placed relative to where that line ended, anything else is placed at the
/// fragment's own coordinates.
///
/// The first error, whether from the oracle or from drawing, aborts the page.
pub fn reconstruct_page<S, O>(
    sink: &mut S,
    fragments: &[TextFragment],
    fonts: &FontMapping,
    translator: &Translator<'_, O>,
) -> Result<(), PdfError>
where
    S: ContentSink + ?Sized,
    O: Oracle + ?Sized,
{
    let mut cursor = RenderCursor::default();

    for fragment in fragments.iter().filter(|f| is_drawable(f)) {
        let translated = translator.translate_chunked(&fragment.text)?;
        let font = fonts.resolve(fragment.font_name.as_deref());

        for line in to_lines(&translated) {
            let width = font.text_width(&line, fragment.font_size);

            sink.begin_text()?;
            sink.set_font(font, fragment.font_size)?;
            match cursor.position(fragment.x, fragment.y) {
                PenMove::Absolute { x, y } => sink.move_to(x, y)?,
                PenMove::Relative { dx, dy } => sink.move_by(dx, dy)?,
            }
            sink.show_text(&line)?;
            sink.end_text()?;

            cursor.advance(fragment.x, width, fragment.font_size);
            debug!(
                "drew {:?} at ({}, {}) with {}",
                line,
                fragment.x,
                fragment.y,
                font.base_font()
            );
        }
    }

    Ok(())
}

fn is_drawable(fragment: &TextFragment) -> bool {
    if fragment.is_blank() {
        return false;
    }
    if !(fragment.font_size.is_finite() && fragment.font_size > 0.0) {
        debug!(
            "skipping {:?} with font size {}",
            fragment.text, fragment.font_size
        );
        return false;
    }
    true
}
