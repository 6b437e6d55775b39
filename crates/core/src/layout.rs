//! Cursor bookkeeping for re-rendering translated fragments.
//!
//! A [`RenderCursor`] lives for exactly one page. For every display line it
//! decides whether the pen jumps to the fragment's position or continues
//! horizontally from the previous line ([`RenderCursor::position`]), and then
//! records where the line ended ([`RenderCursor::advance`]).

/// Line height as a multiple of font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// How the pen reaches the start of the next display line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PenMove {
    /// Move to page coordinates.
    Absolute { x: f32, y: f32 },
    /// Move relative to the current pen position.
    Relative { dx: f32, dy: f32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderCursor {
    pub last_x: f32,
    /// Baseline of the last drawn line; `None` until something is drawn.
    pub last_y: Option<f32>,
    pub current_y: f32,
}

impl RenderCursor {
    /// Pick the move for a line belonging to a fragment at `(x, y)`.
    ///
    /// Same-line detection is exact float equality between `last_y` and `y`.
    /// `current_y` is seeded with the baseline the line will be drawn on.
    #[allow(clippy::float_cmp)]
    pub fn position(&mut self, x: f32, y: f32) -> PenMove {
        match self.last_y {
            Some(last_y) if last_y == y => {
                self.current_y = last_y;
                PenMove::Relative {
                    dx: x - self.last_x,
                    dy: 0.0,
                }
            }
            _ => {
                self.last_x = x;
                self.current_y = y;
                PenMove::Absolute { x, y }
            }
        }
    }

    /// Record a drawn line that started at `x` and is `width` units wide.
    pub fn advance(&mut self, x: f32, width: f32, font_size: f32) {
        self.last_x = x + width;
        self.last_y = Some(self.current_y);
        self.current_y -= font_size * LINE_HEIGHT_FACTOR;
    }
}
