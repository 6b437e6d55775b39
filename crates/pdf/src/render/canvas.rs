//! Page drawing context.
//!
//! [`ContentSink`] is the narrow set of text operations the reconstructor
//! needs. [`PageCanvas`] records them as lopdf content operations for one
//! destination page.

use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};

use crate::fonts::StandardFont;
use crate::PdfError;

/// Text drawing operations on a single destination page.
pub trait ContentSink {
    fn begin_text(&mut self) -> Result<(), PdfError>;

    fn set_font(&mut self, font: StandardFont, size: f32) -> Result<(), PdfError>;

    /// Move the pen to an absolute page position.
    fn move_to(&mut self, x: f32, y: f32) -> Result<(), PdfError>;

    /// Move the pen relative to where the last drawn text ended.
    fn move_by(&mut self, dx: f32, dy: f32) -> Result<(), PdfError>;

    /// Draw `text` at the pen with the current font and advance the pen.
    fn show_text(&mut self, text: &str) -> Result<(), PdfError>;

    fn end_text(&mut self) -> Result<(), PdfError>;
}

/// Records text operations for one page.
///
/// `Td` is relative to the start of the current line, and `BT` resets that
/// to the origin. The canvas tracks both the line start and the pen so that
/// `move_to` and `move_by` land where the caller expects regardless of which
/// text object they are issued in.
#[derive(Debug, Default)]
pub struct PageCanvas {
    operations: Vec<Operation>,
    in_text: bool,
    font: Option<(StandardFont, f32)>,
    line_start: (f32, f32),
    pen: (f32, f32),
}

impl PageCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pen position in page space.
    pub fn pen(&self) -> (f32, f32) {
        self.pen
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Encode the recorded operations as a content stream.
    pub fn into_content(self) -> Result<Vec<u8>, PdfError> {
        if self.in_text {
            return Err(PdfError::Render("unterminated text object".into()));
        }
        Content {
            operations: self.operations,
        }
        .encode()
        .map_err(|e| PdfError::Render(format!("content stream encode error: {}", e)))
    }

    fn require_text(&self, operator: &str) -> Result<(), PdfError> {
        if self.in_text {
            Ok(())
        } else {
            Err(PdfError::Render(format!(
                "{} outside of a text object",
                operator
            )))
        }
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (lx, ly) = self.line_start;
        self.operations
            .push(Operation::new("Td", vec![(x - lx).into(), (y - ly).into()]));
        self.line_start = (x, y);
        self.pen = (x, y);
    }
}

impl ContentSink for PageCanvas {
    fn begin_text(&mut self) -> Result<(), PdfError> {
        if self.in_text {
            return Err(PdfError::Render("nested text object".into()));
        }
        self.operations.push(Operation::new("BT", vec![]));
        self.in_text = true;
        self.line_start = (0.0, 0.0);
        Ok(())
    }

    fn set_font(&mut self, font: StandardFont, size: f32) -> Result<(), PdfError> {
        self.require_text("Tf")?;
        if !(size.is_finite() && size > 0.0) {
            return Err(PdfError::Render(format!("invalid font size {}", size)));
        }
        self.operations.push(Operation::new(
            "Tf",
            vec![font.resource_name().into(), size.into()],
        ));
        self.font = Some((font, size));
        Ok(())
    }

    fn move_to(&mut self, x: f32, y: f32) -> Result<(), PdfError> {
        self.require_text("Td")?;
        self.line_to(x, y);
        Ok(())
    }

    fn move_by(&mut self, dx: f32, dy: f32) -> Result<(), PdfError> {
        self.require_text("Td")?;
        let (px, py) = self.pen;
        self.line_to(px + dx, py + dy);
        Ok(())
    }

    fn show_text(&mut self, text: &str) -> Result<(), PdfError> {
        self.require_text("Tj")?;
        let (font, size) = self
            .font
            .ok_or_else(|| PdfError::Render("Tj before any Tf".into()))?;
        let bytes = font.encode(text)?;
        self.operations.push(Operation::new(
            "Tj",
            vec![Object::String(bytes, StringFormat::Literal)],
        ));
        self.pen.0 += font.text_width(text, size);
        Ok(())
    }

    fn end_text(&mut self) -> Result<(), PdfError> {
        self.require_text("ET")?;
        self.operations.push(Operation::new("ET", vec![]));
        self.in_text = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operators(canvas: &PageCanvas) -> Vec<&str> {
        canvas
            .operations()
            .iter()
            .map(|op| op.operator.as_str())
            .collect()
    }

    fn td_operands(op: &Operation) -> (f32, f32) {
        (
            op.operands[0].as_float().unwrap(),
            op.operands[1].as_float().unwrap(),
        )
    }

    #[test]
    fn test_single_line() {
        let mut canvas = PageCanvas::new();
        canvas.begin_text().unwrap();
        canvas.set_font(StandardFont::Helvetica, 12.0).unwrap();
        canvas.move_to(50.0, 700.0).unwrap();
        canvas.show_text("Hello").unwrap();
        canvas.end_text().unwrap();

        assert_eq!(operators(&canvas), vec!["BT", "Tf", "Td", "Tj", "ET"]);
        assert_eq!(td_operands(&canvas.operations()[2]), (50.0, 700.0));
        let expected_x = 50.0 + StandardFont::Helvetica.text_width("Hello", 12.0);
        assert_eq!(canvas.pen(), (expected_x, 700.0));
    }

    #[test]
    fn test_move_by_across_text_objects() {
        let mut canvas = PageCanvas::new();
        canvas.begin_text().unwrap();
        canvas.set_font(StandardFont::Courier, 10.0).unwrap();
        canvas.move_to(50.0, 700.0).unwrap();
        canvas.show_text("abc").unwrap();
        canvas.end_text().unwrap();

        canvas.begin_text().unwrap();
        canvas.set_font(StandardFont::Courier, 10.0).unwrap();
        canvas.move_by(52.0, 0.0).unwrap();
        canvas.end_text().unwrap();

        // Pen was at 50 + 3 * 6 = 68; the new BT starts from the origin.
        let td = &canvas.operations()[7];
        assert_eq!(td.operator, "Td");
        assert_eq!(td_operands(td), (120.0, 700.0));
    }

    #[test]
    fn test_move_to_within_text_object_is_relative_to_line_start() {
        let mut canvas = PageCanvas::new();
        canvas.begin_text().unwrap();
        canvas.move_to(100.0, 500.0).unwrap();
        canvas.move_to(100.0, 480.0).unwrap();
        canvas.end_text().unwrap();

        assert_eq!(td_operands(&canvas.operations()[2]), (0.0, -20.0));
    }

    #[test]
    fn test_show_text_requires_font() {
        let mut canvas = PageCanvas::new();
        canvas.begin_text().unwrap();
        assert!(matches!(canvas.show_text("x"), Err(PdfError::Render(_))));
    }

    #[test]
    fn test_operations_require_text_object() {
        let mut canvas = PageCanvas::new();
        assert!(canvas.move_to(1.0, 1.0).is_err());
        assert!(canvas.end_text().is_err());
        canvas.begin_text().unwrap();
        assert!(canvas.begin_text().is_err());
    }

    #[test]
    fn test_rejects_non_positive_size() {
        let mut canvas = PageCanvas::new();
        canvas.begin_text().unwrap();
        assert!(canvas.set_font(StandardFont::Helvetica, 0.0).is_err());
    }

    #[test]
    fn test_unmappable_glyph_is_an_error() {
        let mut canvas = PageCanvas::new();
        canvas.begin_text().unwrap();
        canvas.set_font(StandardFont::TimesRoman, 12.0).unwrap();
        let err = canvas.show_text("日本").unwrap_err();
        assert!(matches!(err, PdfError::UnmappableGlyph { ch: '日', .. }));
    }

    #[test]
    fn test_into_content_rejects_open_text_object() {
        let mut canvas = PageCanvas::new();
        canvas.begin_text().unwrap();
        assert!(canvas.into_content().is_err());
    }

    #[test]
    fn test_into_content_encodes() {
        let mut canvas = PageCanvas::new();
        canvas.begin_text().unwrap();
        canvas.set_font(StandardFont::Helvetica, 12.0).unwrap();
        canvas.move_to(10.0, 20.0).unwrap();
        canvas.show_text("Hi").unwrap();
        canvas.end_text().unwrap();

        let bytes = canvas.into_content().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/F1"), "got {}", text);
        assert!(text.contains("(Hi) Tj"), "got {}", text);
    }
}
