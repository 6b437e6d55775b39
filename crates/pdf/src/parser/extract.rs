//! Positioned text extraction.
//!
//! Walks one page's content stream through a text-state machine and reports
//! every show operator as a [`TextRun`] carrying the page-space baseline of
//! its first glyph. Form XObjects painted with `Do` are walked in place. Runs
//! are then put in reading order and classified into a [`TextFragment`]
//! stream.
//!
//! ```text
//! content ops  ->  TextRun[]  ->  sorted TextRun[]  ->  TextFragment[]
//!                  extract        sort_reading_order     classify_runs
//! ```

use doctranslate_core::fragment::{classify_runs, TextFragment, TextRun};
use log::{debug, warn};
use lopdf::ObjectId;

use super::backend::{
    decode_guess, BackendFontInfo, ContentOp, FormXObject, PageId, PdfBackend, PdfValue, Scope,
};
use crate::fonts::StandardFont;
use crate::PdfError;

/// Advance used for glyphs of non-standard fonts, as a fraction of the em.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Baselines closer than this (in page units) share a line when sorting.
pub const SAME_LINE_TOLERANCE: f32 = 1.0;

/// How many form XObjects may be nested inside each other.
const MAX_FORM_DEPTH: usize = 8;

/// The identity 2x3 matrix: [a, b, c, d, e, f].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m1 x m2` for PDF's row-vector affine matrices.
fn multiply(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn number(value: &PdfValue) -> Option<f32> {
    value.as_number()
}

fn matrix_operand(operands: &[PdfValue]) -> Option<[f32; 6]> {
    let vals: Vec<f32> = operands.iter().take(6).filter_map(number).collect();
    match vals.as_slice() {
        [a, b, c, d, e, f] => Some([*a, *b, *c, *d, *e, *f]),
        _ => None,
    }
}

/// Mutable state tracked while walking a content stream.
#[derive(Debug, Clone)]
struct TextState {
    /// Index of the current font in the fonts of the stream being walked.
    font: Option<usize>,
    /// BaseFont of the current font, subset prefix removed.
    font_name: Option<String>,
    /// Metrics to advance with, when the current font is a standard one.
    metrics: Option<StandardFont>,
    font_size: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    /// Current transformation matrix (graphics state).
    ctm: [f32; 6],
    /// Saved CTMs for `q` / `Q`.
    ctm_stack: Vec<[f32; 6]>,
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            font_name: None,
            metrics: None,
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            ctm: IDENTITY_MATRIX,
            ctm_stack: Vec::new(),
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    /// Text rendering matrix without the font size: `Tm x CTM`.
    fn rendering_matrix(&self) -> [f32; 6] {
        multiply(&self.text_matrix, &self.ctm)
    }

    /// Page-space position of the next glyph's baseline origin.
    fn origin(&self) -> (f32, f32) {
        let m = self.rendering_matrix();
        let rise = self.text_rise;
        (m[2] * rise + m[4], m[3] * rise + m[5])
    }

    /// Font size in page units, scaled by the text matrix and the CTM.
    fn effective_font_size(&self) -> f32 {
        let m = self.rendering_matrix();
        let scale = (m[1].powi(2) + m[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    /// Advance the text matrix horizontally by `dx` text-space units.
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Multiply the text line matrix by a translation (used by Td / TD).
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    fn glyph_width(&self, ch: char) -> f32 {
        match self.metrics {
            Some(font) => font.char_width(ch) / 1000.0,
            None => APPROX_CHAR_WIDTH_RATIO,
        }
    }

    /// Advance past `text` the way a viewer would after showing it.
    fn advance_after_show(&mut self, text: &str) {
        let mut total_dx = 0.0;
        for ch in text.chars() {
            total_dx += self.glyph_width(ch) * self.font_size + self.char_spacing;
            if ch == ' ' {
                total_dx += self.word_spacing;
            }
        }
        self.advance_x(total_dx * self.horiz_scale);
    }

    fn run(&self, text: String, (x, y): (f32, f32)) -> TextRun {
        TextRun {
            text,
            x,
            y,
            font_size: self.effective_font_size(),
            font_name: self.font_name.clone(),
        }
    }

    /// `Tf`: select a font from the stream's resources and a size.
    fn set_font(&mut self, operands: &[PdfValue], fonts: &[&BackendFontInfo<'_>]) {
        let [key, size, ..] = operands else {
            return;
        };
        let key = match key {
            PdfValue::Name(n) | PdfValue::Str(n) => n.as_slice(),
            _ => return,
        };

        self.font = fonts.iter().position(|info| info.name == key);
        if self.font.is_none() {
            debug!("font /{} is not in the resources", String::from_utf8_lossy(key));
        }
        let font_name = self
            .font
            .and_then(|i| fonts[i].base_font.as_deref())
            .map(|base| strip_subset_prefix(base).to_string());

        self.metrics = font_name.as_deref().and_then(StandardFont::from_base_font);
        self.font_name = font_name;
        self.font_size = number(size).unwrap_or(0.0);
    }

    /// Decode a string operand with the current font.
    fn decode(&self, operand: &PdfValue, fonts: &[&BackendFontInfo<'_>]) -> String {
        let PdfValue::Str(bytes) = operand else {
            return String::new();
        };
        match self.font.and_then(|i| fonts.get(i)) {
            Some(font) => font.decoding.decode(bytes),
            None => decode_guess(bytes),
        }
    }
}

/// Strip a subset tag such as `ABCDEF+` from a BaseFont name.
pub fn strip_subset_prefix(base_font: &str) -> &str {
    match base_font.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => base_font,
    }
}

/// Collects the runs of one page, descending into form XObjects.
struct Walker<'b> {
    backend: &'b dyn PdfBackend,
    runs: Vec<TextRun>,
    /// Forms currently being walked, outermost first.
    forms: Vec<ObjectId>,
}

impl<'b> Walker<'b> {
    fn new(backend: &'b dyn PdfBackend) -> Self {
        Self {
            backend,
            runs: Vec::new(),
            forms: Vec::new(),
        }
    }

    /// Walk the content of `content`, resolving names against `resources`.
    fn walk(
        &mut self,
        content: Scope,
        resources: Scope,
        fonts: &[&BackendFontInfo<'_>],
        state: &mut TextState,
    ) -> Result<(), PdfError> {
        let ops = self.backend.content(content)?;
        for op in &ops {
            self.apply(op, resources, fonts, state);
        }
        Ok(())
    }

    fn apply(
        &mut self,
        op: &ContentOp,
        resources: Scope,
        fonts: &[&BackendFontInfo<'_>],
        state: &mut TextState,
    ) {
        let first = op.operands.first();
        match op.operator.as_str() {
            // -- Graphics state -----------------------------------------
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.ctm_stack.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operand(&op.operands) {
                    state.ctm = multiply(&m, &state.ctm);
                }
            }
            "Do" => {
                if let Some(PdfValue::Name(name)) = first {
                    self.paint_form(name, resources, fonts, state);
                }
            }

            // -- Text object delimiters ---------------------------------
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            "ET" => {}

            "Tf" => state.set_font(&op.operands, fonts),

            // -- Text matrix / position ---------------------------------
            "Tm" => {
                if let Some(m) = matrix_operand(&op.operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "Td" => {
                if let [tx, ty, ..] = op.operands.as_slice() {
                    state.translate_line(number(tx).unwrap_or(0.0), number(ty).unwrap_or(0.0));
                }
            }
            "TD" => {
                // -ty TL ; tx ty Td
                if let [tx, ty, ..] = op.operands.as_slice() {
                    let ty = number(ty).unwrap_or(0.0);
                    state.leading = -ty;
                    state.translate_line(number(tx).unwrap_or(0.0), ty);
                }
            }
            "T*" => state.translate_line(0.0, -state.leading),
            "TL" => {
                if let Some(v) = first.and_then(number) {
                    state.leading = v;
                }
            }

            // -- Spacing / scaling --------------------------------------
            "Tc" => {
                if let Some(v) = first.and_then(number) {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = first.and_then(number) {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = first.and_then(number) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = first.and_then(number) {
                    state.text_rise = v;
                }
            }

            // -- Show text ----------------------------------------------
            "Tj" => {
                if let Some(text) = first {
                    self.show_string(text, fonts, state);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = first {
                    self.show_tj_array(arr, fonts, state);
                }
            }
            "'" => {
                state.translate_line(0.0, -state.leading);
                if let Some(text) = first {
                    self.show_string(text, fonts, state);
                }
            }
            "\"" => {
                // aw ac string "  =>  Tw, Tc, T*, Tj
                if let [aw, ac, text, ..] = op.operands.as_slice() {
                    if let Some(aw) = number(aw) {
                        state.word_spacing = aw;
                    }
                    if let Some(ac) = number(ac) {
                        state.char_spacing = ac;
                    }
                    state.translate_line(0.0, -state.leading);
                    self.show_string(text, fonts, state);
                }
            }

            _ => {}
        }
    }

    /// `Do`: walk a form XObject as if its content were inlined between
    /// `q` and `Q`, with the form's `/Matrix` concatenated onto the CTM.
    ///
    /// A form that cannot be read is logged and skipped; the page goes on.
    fn paint_form(
        &mut self,
        name: &[u8],
        resources: Scope,
        fonts: &[&BackendFontInfo<'_>],
        state: &mut TextState,
    ) {
        let form = match self.backend.form_xobject(resources, name) {
            Ok(Some(form)) => form,
            Ok(None) => return,
            Err(e) => {
                warn!("skipping XObject /{}: {}", String::from_utf8_lossy(name), e);
                return;
            }
        };
        if self.forms.contains(&form.id) {
            warn!("form {:?} paints itself, skipping", form.id);
            return;
        }
        if self.forms.len() >= MAX_FORM_DEPTH {
            warn!("form {:?} nested deeper than {}", form.id, MAX_FORM_DEPTH);
            return;
        }

        let saved = state.clone();
        state.ctm = multiply(&form.matrix, &state.ctm);
        state.ctm_stack.clear();

        self.forms.push(form.id);
        let walked = self.walk_form(form, resources, fonts, state);
        self.forms.pop();
        *state = saved;

        if let Err(e) = walked {
            warn!("skipping form {:?}: {}", form.id, e);
        }
    }

    fn walk_form(
        &mut self,
        form: FormXObject,
        parent: Scope,
        fonts: &[&BackendFontInfo<'_>],
        state: &mut TextState,
    ) -> Result<(), PdfError> {
        let scope = Scope::Form(form.id);
        if !form.has_resources {
            return self.walk(scope, parent, fonts, state);
        }

        let backend = self.backend;
        let own = backend.fonts(scope)?;
        let mut scoped: Vec<&BackendFontInfo<'_>> = own.iter().collect();
        // The font selected before `Do` stays current until the form sets one.
        if let Some(current) = state.font.and_then(|i| fonts.get(i).copied()) {
            state.font = Some(scoped.len());
            scoped.push(current);
        }
        self.walk(scope, scope, &scoped, state)
    }

    /// Shared by `Tj`, `'` and `"`.
    fn show_string(
        &mut self,
        operand: &PdfValue,
        fonts: &[&BackendFontInfo<'_>],
        state: &mut TextState,
    ) {
        let text = state.decode(operand, fonts);
        if text.is_empty() {
            return;
        }
        let origin = state.origin();
        state.advance_after_show(&text);
        self.runs.push(state.run(text, origin));
    }

    /// Process a `TJ` array: elements are either strings to show or numeric
    /// kerning adjustments in thousandths of a text-space unit. The whole
    /// array becomes one run; large negative adjustments read as word gaps.
    fn show_tj_array(
        &mut self,
        arr: &[PdfValue],
        fonts: &[&BackendFontInfo<'_>],
        state: &mut TextState,
    ) {
        let mut buf = String::new();
        let mut origin = None;

        for elem in arr {
            match elem {
                PdfValue::Str(_) => {
                    let fragment = state.decode(elem, fonts);
                    if fragment.is_empty() {
                        continue;
                    }
                    origin.get_or_insert_with(|| state.origin());
                    buf.push_str(&fragment);
                    state.advance_after_show(&fragment);
                }
                val => {
                    if let Some(adj) = number(val) {
                        let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
                        let gap_threshold =
                            state.font_size * APPROX_CHAR_WIDTH_RATIO * state.horiz_scale * 0.3;

                        if dx > gap_threshold && !buf.is_empty() && !buf.ends_with(' ') {
                            buf.push(' ');
                        }

                        state.advance_x(dx);
                    }
                }
            }
        }

        if let Some(origin) = origin {
            self.runs.push(state.run(buf, origin));
        }
    }
}

/// Walk a page's content stream and return its text runs in stream order.
///
/// | Operator          | Action |
/// |-------------------|--------|
/// | `q` / `Q` / `cm`  | Save, restore, concatenate the CTM |
/// | `Do`              | Walk a form XObject under its `/Matrix` |
/// | `BT` / `ET`       | Begin / end text object |
/// | `Tf`              | Set font and size |
/// | `Tm` `Td` `TD` `T*` `TL` | Position and leading |
/// | `Tc` `Tw` `Tz` `Ts` | Spacing, scaling and rise |
/// | `Tj` `'` `"`      | Show a string (one run each) |
/// | `TJ`              | Show strings with kerning (one run per array) |
///
/// A run is dropped only when its decoded text is empty. A page whose content
/// or fonts cannot be read is an error.
pub fn extract_page_runs(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<TextRun>, PdfError> {
    let page = Scope::Page(page_id);
    let fonts = backend.fonts(page)?;
    let fonts: Vec<&BackendFontInfo<'_>> = fonts.iter().collect();

    let mut walker = Walker::new(backend);
    walker.walk(page, page, &fonts, &mut TextState::default())?;
    Ok(walker.runs)
}

/// Sort runs top-to-bottom then left-to-right.
///
/// Runs whose baselines are within [`SAME_LINE_TOLERANCE`] of the first run
/// of a line are ordered by x alone. The sort is stable, so runs with
/// identical coordinates keep their stream order.
pub fn sort_reading_order(runs: &mut [TextRun]) {
    runs.sort_by(|a, b| b.y.total_cmp(&a.y));

    let mut start = 0;
    while start < runs.len() {
        let anchor = runs[start].y;
        let end = runs[start..]
            .iter()
            .position(|run| (anchor - run.y).abs() > SAME_LINE_TOLERANCE)
            .map_or(runs.len(), |offset| start + offset);
        runs[start..end].sort_by(|a, b| a.x.total_cmp(&b.x));
        start = end;
    }
}

/// Extract one page's fragment stream in reading order.
pub fn extract_page_fragments(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<TextFragment>, PdfError> {
    let mut runs = extract_page_runs(backend, page_id)?;
    sort_reading_order(&mut runs);
    Ok(classify_runs(runs))
}

/// Extract the fragment stream of every page.
///
/// Returns `(page_number, fragments)` pairs where `page_number` is 1-based.
pub fn extract_all_pages(
    backend: &dyn PdfBackend,
) -> Result<Vec<(u32, Vec<TextFragment>)>, PdfError> {
    backend
        .pages()
        .into_iter()
        .map(|(page_num, page_id)| Ok((page_num, extract_page_fragments(backend, page_id)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::backend::TextDecoding;
    use crate::MediaBox;
    use std::collections::BTreeMap;

    type FontSpec = (&'static [u8], &'static str);

    struct MockForm {
        name: &'static [u8],
        form: FormXObject,
        fonts: Vec<FontSpec>,
        ops: Vec<ContentOp>,
        unreadable: bool,
    }

    fn mock_form(name: &'static [u8], matrix: [f32; 6], has_resources: bool) -> MockForm {
        MockForm {
            name,
            form: FormXObject {
                id: (9, 0),
                matrix,
                has_resources,
            },
            fonts: Vec::new(),
            ops: Vec::new(),
            unreadable: false,
        }
    }

    /// Serves pre-decoded operations; fonts decode by guessing.
    struct MockBackend {
        page_ids: BTreeMap<u32, PageId>,
        fonts: Vec<FontSpec>,
        ops: Vec<ContentOp>,
        forms: Vec<MockForm>,
        broken_fonts: bool,
    }

    impl MockBackend {
        fn form(&self, id: ObjectId) -> Result<&MockForm, PdfError> {
            self.forms
                .iter()
                .find(|f| f.form.id == id)
                .ok_or_else(|| PdfError::Parse(format!("no form {:?}", id)))
        }
    }

    fn infos(fonts: &[FontSpec]) -> Vec<BackendFontInfo<'static>> {
        fonts
            .iter()
            .map(|(key, base)| BackendFontInfo {
                name: key.to_vec(),
                base_font: Some(base.to_string()),
                decoding: TextDecoding::Unknown,
            })
            .collect()
    }

    impl PdfBackend for MockBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            self.page_ids.clone()
        }

        fn page_media_box(&self, _page: PageId) -> Result<MediaBox, PdfError> {
            Ok(MediaBox::LETTER)
        }

        fn content(&self, scope: Scope) -> Result<Vec<ContentOp>, PdfError> {
            match scope {
                Scope::Page(_) => Ok(self.ops.clone()),
                Scope::Form(id) => {
                    let form = self.form(id)?;
                    if form.unreadable {
                        return Err(PdfError::Parse("content stream decode error".to_string()));
                    }
                    Ok(form.ops.clone())
                }
            }
        }

        fn fonts(&self, scope: Scope) -> Result<Vec<BackendFontInfo<'_>>, PdfError> {
            match scope {
                Scope::Page(_) if self.broken_fonts => {
                    Err(PdfError::Parse("Font is not a dictionary".to_string()))
                }
                Scope::Page(_) => Ok(infos(&self.fonts)),
                Scope::Form(id) => Ok(infos(&self.form(id)?.fonts)),
            }
        }

        fn form_xobject(
            &self,
            _scope: Scope,
            name: &[u8],
        ) -> Result<Option<FormXObject>, PdfError> {
            Ok(self.forms.iter().find(|f| f.name == name).map(|f| f.form))
        }
    }

    fn backend(fonts: Vec<FontSpec>, ops: Vec<ContentOp>) -> MockBackend {
        MockBackend {
            page_ids: [(1, (1, 0))].into_iter().collect(),
            fonts,
            ops,
            forms: Vec::new(),
            broken_fonts: false,
        }
    }

    fn runs_of(b: &MockBackend) -> Vec<TextRun> {
        extract_page_runs(b, (1, 0)).unwrap()
    }

    fn make_op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }

    fn font(key: &'static [u8], base: &'static str) -> FontSpec {
        (key, base)
    }

    fn helvetica_font() -> Vec<FontSpec> {
        vec![font(b"F1", "Helvetica")]
    }

    fn bt_op() -> ContentOp {
        make_op("BT", vec![])
    }

    fn et_op() -> ContentOp {
        make_op("ET", vec![])
    }

    fn tf_op(font: &[u8], size: f32) -> ContentOp {
        make_op(
            "Tf",
            vec![PdfValue::Name(font.to_vec()), PdfValue::Real(size)],
        )
    }

    fn matrix_op(operator: &str, m: [f32; 6]) -> ContentOp {
        make_op(operator, m.iter().map(|v| PdfValue::Real(*v)).collect())
    }

    fn td_op(tx: f32, ty: f32) -> ContentOp {
        make_op("Td", vec![PdfValue::Real(tx), PdfValue::Real(ty)])
    }

    fn tj_op(text: &[u8]) -> ContentOp {
        make_op("Tj", vec![PdfValue::Str(text.to_vec())])
    }

    fn tj_array_op(elements: Vec<PdfValue>) -> ContentOp {
        make_op("TJ", vec![PdfValue::Array(elements)])
    }

    fn do_op(name: &[u8]) -> ContentOp {
        make_op("Do", vec![PdfValue::Name(name.to_vec())])
    }

    fn translate(tx: f32, ty: f32) -> [f32; 6] {
        [1.0, 0.0, 0.0, 1.0, tx, ty]
    }

    fn line(x: f32, y: f32, text: &[u8]) -> Vec<ContentOp> {
        vec![bt_op(), tf_op(b"F1", 12.0), td_op(x, y), tj_op(text), et_op()]
    }

    #[test]
    fn test_extract_simple_tj() {
        let b = backend(helvetica_font(), line(50.0, 700.0, b"Hello"));
        let runs = runs_of(&b);

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Hello");
        assert_eq!(runs[0].x, 50.0);
        assert_eq!(runs[0].y, 700.0);
        assert_eq!(runs[0].font_size, 12.0);
        assert_eq!(runs[0].font_name.as_deref(), Some("Helvetica"));
    }

    #[test]
    fn test_each_tj_is_its_own_run() {
        let ops = vec![
            bt_op(),
            tf_op(b"F1", 10.0),
            td_op(100.0, 500.0),
            tj_op(b"Hello"),
            tj_op(b"World"),
            et_op(),
        ];
        let runs = runs_of(&backend(helvetica_font(), ops));

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].x, 100.0);
        // Second run starts after "Hello" at Helvetica widths: 2278/1000 * 10.
        assert!((runs[1].x - 122.78).abs() < 1e-3, "got {}", runs[1].x);
        assert_eq!(runs[1].y, 500.0);
    }

    #[test]
    fn test_non_standard_font_uses_approximate_advance() {
        let ops = vec![
            bt_op(),
            tf_op(b"F2", 10.0),
            td_op(0.0, 0.0),
            tj_op(b"abcd"),
            tj_op(b"e"),
            et_op(),
        ];
        let runs = runs_of(&backend(vec![font(b"F2", "ABCDEF+Garamond")], ops));

        assert_eq!(runs[1].x, 20.0);
        assert_eq!(runs[0].font_name.as_deref(), Some("Garamond"));
    }

    #[test]
    fn test_unresolved_font_has_no_name() {
        let runs = runs_of(&backend(vec![], line(10.0, 10.0, b"x")));
        assert_eq!(runs[0].font_name, None);
    }

    #[test]
    fn test_empty_string_yields_no_run() {
        let runs = runs_of(&backend(helvetica_font(), line(10.0, 10.0, b"")));
        assert!(runs.is_empty());
    }

    #[test]
    fn test_whitespace_run_is_kept() {
        let runs = runs_of(&backend(helvetica_font(), line(10.0, 10.0, b"   ")));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "   ");
    }

    #[test]
    fn test_tj_array_is_one_run() {
        let ops = vec![
            bt_op(),
            tf_op(b"F1", 12.0),
            td_op(72.0, 600.0),
            tj_array_op(vec![
                PdfValue::Str(b"Hel".to_vec()),
                PdfValue::Integer(-20),
                PdfValue::Str(b"lo".to_vec()),
            ]),
            et_op(),
        ];
        let runs = runs_of(&backend(helvetica_font(), ops));

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Hello");
        assert_eq!(runs[0].x, 72.0);
    }

    #[test]
    fn test_tj_array_large_kerning_inserts_space() {
        let ops = vec![
            bt_op(),
            tf_op(b"F1", 12.0),
            td_op(72.0, 600.0),
            tj_array_op(vec![
                PdfValue::Str(b"Hello".to_vec()),
                PdfValue::Integer(-500),
                PdfValue::Str(b"World".to_vec()),
            ]),
            et_op(),
        ];
        let runs = runs_of(&backend(helvetica_font(), ops));

        assert_eq!(runs[0].text, "Hello World");
    }

    #[test]
    fn test_tm_scales_font_size() {
        let ops = vec![
            bt_op(),
            tf_op(b"F1", 1.0),
            matrix_op("Tm", [14.0, 0.0, 0.0, 14.0, 30.0, 400.0]),
            tj_op(b"Title"),
            et_op(),
        ];
        let runs = runs_of(&backend(helvetica_font(), ops));

        assert_eq!(runs[0].font_size, 14.0);
        assert_eq!((runs[0].x, runs[0].y), (30.0, 400.0));
    }

    #[test]
    fn test_cm_moves_text_into_page_space() {
        let ops = vec![
            make_op("q", vec![]),
            matrix_op("cm", [1.0, 0.0, 0.0, 1.0, 100.0, 200.0]),
            bt_op(),
            tf_op(b"F1", 10.0),
            td_op(5.0, 5.0),
            tj_op(b"inside"),
            et_op(),
            make_op("Q", vec![]),
            bt_op(),
            tf_op(b"F1", 10.0),
            td_op(5.0, 5.0),
            tj_op(b"outside"),
            et_op(),
        ];
        let runs = runs_of(&backend(helvetica_font(), ops));

        assert_eq!((runs[0].x, runs[0].y), (105.0, 205.0));
        assert_eq!((runs[1].x, runs[1].y), (5.0, 5.0));
    }

    #[test]
    fn test_cm_scale_affects_font_size() {
        let ops = vec![
            matrix_op("cm", [2.0, 0.0, 0.0, 2.0, 0.0, 0.0]),
            bt_op(),
            tf_op(b"F1", 9.0),
            td_op(10.0, 10.0),
            tj_op(b"big"),
            et_op(),
        ];
        let runs = runs_of(&backend(helvetica_font(), ops));

        assert_eq!(runs[0].font_size, 18.0);
        assert_eq!((runs[0].x, runs[0].y), (20.0, 20.0));
    }

    #[test]
    fn test_tl_and_t_star() {
        let ops = vec![
            bt_op(),
            tf_op(b"F1", 12.0),
            td_op(72.0, 700.0),
            make_op("TL", vec![PdfValue::Real(14.0)]),
            tj_op(b"one"),
            make_op("T*", vec![]),
            tj_op(b"two"),
            make_op("'", vec![PdfValue::Str(b"three".to_vec())]),
            et_op(),
        ];
        let runs = runs_of(&backend(helvetica_font(), ops));

        let ys: Vec<f32> = runs.iter().map(|r| r.y).collect();
        assert_eq!(ys, vec![700.0, 686.0, 672.0]);
        assert!(runs.iter().all(|r| r.x == 72.0));
    }

    #[test]
    fn test_double_quote_sets_spacing() {
        let ops = vec![
            bt_op(),
            tf_op(b"F1", 12.0),
            td_op(0.0, 100.0),
            make_op("TD", vec![PdfValue::Real(10.0), PdfValue::Real(-20.0)]),
            make_op(
                "\"",
                vec![
                    PdfValue::Real(1.0),
                    PdfValue::Real(0.5),
                    PdfValue::Str(b"quoted".to_vec()),
                ],
            ),
            et_op(),
        ];
        let runs = runs_of(&backend(helvetica_font(), ops));

        // TD set leading to 20, so the quote moved one more line down.
        assert_eq!((runs[0].x, runs[0].y), (10.0, 60.0));
        assert_eq!(runs[0].text, "quoted");
    }

    #[test]
    fn test_text_rise_shifts_baseline() {
        let ops = vec![
            bt_op(),
            tf_op(b"F1", 12.0),
            make_op("Ts", vec![PdfValue::Real(3.0)]),
            td_op(10.0, 100.0),
            tj_op(b"sup"),
            et_op(),
        ];
        let runs = runs_of(&backend(helvetica_font(), ops));
        assert_eq!(runs[0].y, 103.0);
    }

    #[test]
    fn test_reading_order_sort() {
        let run = |text: &str, x: f32, y: f32| TextRun {
            text: text.to_string(),
            x,
            y,
            font_size: 10.0,
            font_name: None,
        };
        let mut runs = vec![
            run("bottom", 10.0, 100.0),
            run("right", 200.0, 700.0),
            run("left", 50.0, 700.0),
            run("tie-a", 300.0, 400.0),
            run("tie-b", 300.0, 400.0),
        ];

        sort_reading_order(&mut runs);

        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["left", "right", "tie-a", "tie-b", "bottom"]);
    }

    #[test]
    fn test_reading_order_tolerates_baseline_jitter() {
        let run = |text: &str, x: f32, y: f32| TextRun {
            text: text.to_string(),
            x,
            y,
            font_size: 10.0,
            font_name: None,
        };
        let mut runs = vec![
            run("right", 200.0, 700.0),
            run("left", 50.0, 699.99994),
            run("raised", 10.0, 703.0),
            run("middle", 120.0, 699.5),
        ];

        sort_reading_order(&mut runs);

        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["raised", "left", "middle", "right"]);
    }

    #[test]
    fn test_form_xobject_text_is_extracted() {
        let mut b = backend(
            helvetica_font(),
            vec![
                matrix_op("cm", translate(100.0, 0.0)),
                do_op(b"Fm1"),
                bt_op(),
                tf_op(b"F1", 12.0),
                td_op(5.0, 5.0),
                tj_op(b"after"),
                et_op(),
            ],
        );
        let mut form = mock_form(b"Fm1", translate(0.0, 50.0), true);
        form.fonts = vec![font(b"F2", "Courier")];
        form.ops = vec![
            bt_op(),
            tf_op(b"F2", 10.0),
            td_op(5.0, 5.0),
            tj_op(b"inside"),
            et_op(),
            // Unbalanced: must not leak out of the form.
            matrix_op("cm", translate(0.0, 300.0)),
        ];
        b.forms.push(form);

        let runs = runs_of(&b);

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "inside");
        assert_eq!((runs[0].x, runs[0].y), (105.0, 55.0));
        assert_eq!(runs[0].font_name.as_deref(), Some("Courier"));
        assert_eq!(runs[1].text, "after");
        assert_eq!((runs[1].x, runs[1].y), (105.0, 5.0));
        assert_eq!(runs[1].font_name.as_deref(), Some("Helvetica"));
    }

    #[test]
    fn test_form_keeps_the_font_selected_before_do() {
        let mut b = backend(helvetica_font(), vec![tf_op(b"F1", 12.0), do_op(b"Fm1")]);
        let mut form = mock_form(b"Fm1", IDENTITY_MATRIX, true);
        form.fonts = vec![font(b"F2", "Courier")];
        form.ops = vec![bt_op(), td_op(1.0, 1.0), tj_op(b"plain"), et_op()];
        b.forms.push(form);

        let runs = runs_of(&b);

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].font_name.as_deref(), Some("Helvetica"));
        assert_eq!(runs[0].font_size, 12.0);
    }

    #[test]
    fn test_form_without_resources_uses_page_fonts() {
        let mut b = backend(helvetica_font(), vec![do_op(b"Fm1")]);
        let mut form = mock_form(b"Fm1", IDENTITY_MATRIX, false);
        form.ops = line(10.0, 20.0, b"shared");
        b.forms.push(form);

        let runs = runs_of(&b);

        assert_eq!(runs[0].text, "shared");
        assert_eq!(runs[0].font_name.as_deref(), Some("Helvetica"));
    }

    #[test]
    fn test_self_painting_form_is_walked_once() {
        let mut ops = line(0.0, 0.0, b"again");
        ops.push(do_op(b"Fm1"));
        let mut b = backend(helvetica_font(), vec![do_op(b"Fm1")]);
        let mut form = mock_form(b"Fm1", IDENTITY_MATRIX, false);
        form.ops = ops;
        b.forms.push(form);

        assert_eq!(runs_of(&b).len(), 1);
    }

    #[test]
    fn test_unknown_and_unreadable_xobjects_are_skipped() {
        let mut ops = vec![do_op(b"Im0"), do_op(b"Broken")];
        ops.extend(line(1.0, 1.0, b"still here"));
        let mut b = backend(helvetica_font(), ops);
        let mut form = mock_form(b"Broken", IDENTITY_MATRIX, true);
        form.unreadable = true;
        b.forms.push(form);

        let runs = runs_of(&b);

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "still here");
    }

    #[test]
    fn test_unreadable_page_fonts_are_an_error() {
        let mut b = backend(helvetica_font(), line(1.0, 1.0, b"x"));
        b.broken_fonts = true;

        let err = extract_page_runs(&b, (1, 0)).unwrap_err();

        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_extract_page_fragments_classifies_lines() {
        let mut ops = line(120.0, 700.0, b"World");
        ops.extend(line(50.0, 700.0, b"Hello"));
        ops.extend(line(50.0, 690.0, b" next "));
        let b = backend(helvetica_font(), ops);

        let fragments = extract_page_fragments(&b, (1, 0)).unwrap();

        let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "World", "next"]);
        let flags: Vec<bool> = fragments.iter().map(|f| f.is_new_line).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn test_extract_all_pages_numbers_pages() {
        let mut b = backend(helvetica_font(), line(1.0, 1.0, b"x"));
        b.page_ids = [(1, (3, 0)), (2, (4, 0))].into_iter().collect();

        let pages = extract_all_pages(&b).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].0, 1);
        assert_eq!(pages[1].0, 2);
    }

    #[test]
    fn test_strip_subset_prefix() {
        assert_eq!(strip_subset_prefix("ABCDEF+Times-Roman"), "Times-Roman");
        assert_eq!(strip_subset_prefix("Helvetica"), "Helvetica");
        assert_eq!(strip_subset_prefix("abcdef+Foo"), "abcdef+Foo");
        assert_eq!(strip_subset_prefix("AB+Foo"), "AB+Foo");
    }
}
