//! Source-document access.
//!
//! The extractor never touches `lopdf` directly: it asks a [`PdfBackend`] for
//! a content stream's operations, the fonts in its resources and the form
//! XObjects it paints. Content streams belong either to a page or to a form
//! XObject, named by a [`Scope`].

use std::collections::BTreeMap;

use encoding_rs::WINDOWS_1252;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use log::{debug, warn};

use crate::{MediaBox, PdfError};

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

/// Owner of a content stream, and of the resources it is read against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Page(PageId),
    Form(ObjectId),
}

/// Operand values the extractor cares about, detached from `lopdf::Object`.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Dict(Vec<(Vec<u8>, PdfValue)>),
    Reference(ObjectId),
}

impl PdfValue {
    /// Numeric value of an `Integer` or `Real`.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            PdfValue::Integer(i) => Some(*i as f32),
            PdfValue::Real(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<&Object> for PdfValue {
    fn from(obj: &Object) -> Self {
        match obj {
            Object::Null => PdfValue::Null,
            Object::Boolean(b) => PdfValue::Bool(*b),
            Object::Integer(i) => PdfValue::Integer(*i),
            Object::Real(f) => PdfValue::Real(*f),
            Object::Name(n) => PdfValue::Name(n.clone()),
            Object::String(s, _) => PdfValue::Str(s.clone()),
            Object::Array(items) => PdfValue::Array(items.iter().map(PdfValue::from).collect()),
            Object::Dictionary(dict) => PdfValue::Dict(
                dict.iter()
                    .map(|(k, v)| (k.clone(), PdfValue::from(v)))
                    .collect(),
            ),
            // Inline images and the like never need their data here.
            Object::Stream(stream) => PdfValue::Dict(
                stream
                    .dict
                    .iter()
                    .map(|(k, v)| (k.clone(), PdfValue::from(v)))
                    .collect(),
            ),
            Object::Reference(id) => PdfValue::Reference(*id),
        }
    }
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// How the bytes of a shown string become text.
pub enum TextDecoding<'a> {
    /// The font's own encoding as lopdf resolves it, `/ToUnicode` CMaps
    /// included.
    Font(Encoding<'a>),
    /// WinAnsiEncoding on a dictionary lopdf will not treat as a font,
    /// typically one missing `/Type /Font`.
    WinAnsi,
    /// `Identity-H`/`Identity-V` without a usable CMap: codes read as UTF-16BE.
    Identity,
    /// Nothing declared; guess from the bytes.
    Unknown,
}

impl std::fmt::Debug for TextDecoding<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextDecoding::Font(encoding) => write!(f, "Font({:?})", encoding),
            TextDecoding::WinAnsi => f.write_str("WinAnsi"),
            TextDecoding::Identity => f.write_str("Identity"),
            TextDecoding::Unknown => f.write_str("Unknown"),
        }
    }
}

impl TextDecoding<'_> {
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextDecoding::Font(encoding) => match Document::decode_text(encoding, bytes) {
                Ok(text) if !text.is_empty() || bytes.is_empty() => text,
                Ok(_) => decode_guess(bytes),
                Err(e) => {
                    debug!("falling back from {:?}: {}", encoding, e);
                    decode_guess(bytes)
                }
            },
            TextDecoding::WinAnsi => decode_win_ansi(bytes),
            TextDecoding::Identity => decode_identity(bytes).unwrap_or_else(|| decode_guess(bytes)),
            TextDecoding::Unknown => decode_guess(bytes),
        }
    }
}

/// A font from a resource dictionary, ready to decode strings shown with it.
#[derive(Debug)]
pub struct BackendFontInfo<'a> {
    /// Resource key, e.g. `b"F1"`.
    pub name: Vec<u8>,
    pub base_font: Option<String>,
    pub decoding: TextDecoding<'a>,
}

/// A form XObject painted by `Do`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormXObject {
    pub id: ObjectId,
    /// Form space to user space, `/Matrix` or identity.
    pub matrix: [f32; 6],
    /// Whether the form carries its own `/Resources`. When it does not, the
    /// painting stream's resources apply.
    pub has_resources: bool,
}

/// Decode string bytes with no encoding information.
///
/// A `FE FF` prefix means UTF-16BE, valid UTF-8 is taken as is, and anything
/// else is read as Latin-1.
pub fn decode_guess(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Decode single-byte WinAnsiEncoding (Windows-1252) string bytes.
fn decode_win_ansi(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

fn decode_identity(bytes: &[u8]) -> Option<String> {
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    let decoded = String::from_utf16_lossy(&units);
    if decoded.chars().all(|c| c == '\u{FFFD}' || c.is_control()) {
        return None;
    }
    Some(decoded)
}

/// Read access to a source document.
pub trait PdfBackend {
    /// 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// The page's MediaBox, inherited from the page tree when absent.
    fn page_media_box(&self, page: PageId) -> Result<MediaBox, PdfError>;

    /// Decoded operations of a page's or a form's content stream.
    fn content(&self, scope: Scope) -> Result<Vec<ContentOp>, PdfError>;

    /// Fonts of the scope's resources, each with its decoder resolved.
    fn fonts(&self, scope: Scope) -> Result<Vec<BackendFontInfo<'_>>, PdfError>;

    /// Resolve the operand of `Do` against the scope's resources.
    ///
    /// `Ok(None)` for image XObjects and names the resources do not define.
    fn form_xobject(&self, scope: Scope, name: &[u8]) -> Result<Option<FormXObject>, PdfError>;
}

/// [`PdfBackend`] over a parsed [`lopdf::Document`].
pub struct LopdfBackend {
    doc: Document,
}

impl LopdfBackend {
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }
        Ok(Self { doc })
    }

    fn dictionary(&self, id: ObjectId) -> Result<&Dictionary, PdfError> {
        self.doc
            .get_dictionary(id)
            .map_err(|e| PdfError::Parse(format!("object {:?}: {}", id, e)))
    }

    /// Follow one level of indirection.
    fn deref<'a>(&'a self, obj: &'a Object) -> Result<&'a Object, PdfError> {
        match obj {
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .map_err(|e| PdfError::Parse(format!("object {:?}: {}", id, e))),
            other => Ok(other),
        }
    }

    fn inherited<'a>(&'a self, node: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        let mut node = node;
        // Bounded against Parent cycles.
        for _ in 0..64 {
            if let Ok(value) = node.get(key) {
                return Some(value);
            }
            let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
            node = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn form_dictionary(&self, id: ObjectId) -> Result<&Dictionary, PdfError> {
        self.doc
            .get_object(id)
            .and_then(Object::as_stream)
            .map(|stream| &stream.dict)
            .map_err(|e| PdfError::Parse(format!("form {:?}: {}", id, e)))
    }

    /// The resource dictionaries that apply to a scope, nearest first.
    fn resources(&self, scope: Scope) -> Result<Vec<&Dictionary>, PdfError> {
        let owner = match scope {
            Scope::Page(page) => self.dictionary(page)?,
            Scope::Form(id) => self.form_dictionary(id)?,
        };
        let found = match scope {
            Scope::Page(_) => self.inherited(owner, b"Resources"),
            Scope::Form(_) => owner.get(b"Resources").ok(),
        };
        match found {
            Some(obj) => Ok(vec![self.deref(obj)?.as_dict().map_err(|e| {
                PdfError::Parse(format!("Resources of {:?}: {}", scope, e))
            })?]),
            None => Ok(Vec::new()),
        }
    }

    /// Entries of a resource category such as `/Font` or `/XObject`.
    fn category<'a>(
        &'a self,
        resources: &'a Dictionary,
        key: &[u8],
    ) -> Result<Option<&'a Dictionary>, PdfError> {
        match resources.get(key) {
            Ok(obj) => Ok(Some(self.deref(obj)?.as_dict().map_err(|e| {
                PdfError::Parse(format!("/{}: {}", String::from_utf8_lossy(key), e))
            })?)),
            Err(_) => Ok(None),
        }
    }

    fn font_info<'a>(&'a self, name: &[u8], font: &'a Dictionary) -> BackendFontInfo<'a> {
        let base_font = font
            .get(b"BaseFont")
            .and_then(Object::as_name)
            .ok()
            .map(|n| String::from_utf8_lossy(n).into_owned());

        BackendFontInfo {
            name: name.to_vec(),
            base_font,
            decoding: self.text_decoding(font),
        }
    }

    fn text_decoding<'a>(&'a self, font: &'a Dictionary) -> TextDecoding<'a> {
        let declared = font.get(b"Encoding").and_then(Object::as_name).ok();

        if declared.is_some() || font.has(b"ToUnicode") {
            match font.get_font_encoding(&self.doc) {
                Ok(encoding) => return TextDecoding::Font(encoding),
                Err(e) => debug!("font encoding unavailable: {}", e),
            }
        }

        match declared {
            Some(b"WinAnsiEncoding") => TextDecoding::WinAnsi,
            Some(name) if name.starts_with(b"Identity") => TextDecoding::Identity,
            _ => TextDecoding::Unknown,
        }
    }

    /// The matrix of a form, or identity when absent or malformed.
    fn form_matrix(&self, form: &Dictionary) -> [f32; 6] {
        let identity = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let Ok(Object::Array(items)) = form.get(b"Matrix") else {
            return identity;
        };
        let nums: Vec<f32> = items
            .iter()
            .filter_map(|item| self.deref(item).ok()?.as_float().ok())
            .collect();
        match nums.as_slice() {
            [a, b, c, d, e, f] => [*a, *b, *c, *d, *e, *f],
            _ => {
                warn!("ignoring form /Matrix with {} numbers", nums.len());
                identity
            }
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_media_box(&self, page: PageId) -> Result<MediaBox, PdfError> {
        let page_dict = self.dictionary(page)?;
        let media_box = self
            .inherited(page_dict, b"MediaBox")
            .ok_or_else(|| PdfError::Parse(format!("no MediaBox for page {:?}", page)))?;

        let items = self
            .deref(media_box)?
            .as_array()
            .map_err(|e| PdfError::Parse(format!("MediaBox: {}", e)))?;
        let nums = items
            .iter()
            .map(|item| {
                self.deref(item)?
                    .as_float()
                    .map_err(|e| PdfError::Parse(format!("MediaBox entry: {}", e)))
            })
            .collect::<Result<Vec<f32>, PdfError>>()?;

        MediaBox::from_slice(&nums).ok_or_else(|| {
            PdfError::Parse(format!("MediaBox has {} elements, expected 4", nums.len()))
        })
    }

    fn content(&self, scope: Scope) -> Result<Vec<ContentOp>, PdfError> {
        let data = match scope {
            Scope::Page(page) => self
                .doc
                .get_page_content(page)
                .map_err(|e| PdfError::Parse(format!("page content: {}", e)))?,
            Scope::Form(id) => self
                .doc
                .get_object(id)
                .and_then(Object::as_stream)
                .and_then(|stream| stream.get_plain_content())
                .map_err(|e| PdfError::Parse(format!("form {:?} content: {}", id, e)))?,
        };

        let content = Content::decode(&data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(PdfValue::from).collect(),
                operator: op.operator,
            })
            .collect())
    }

    fn fonts(&self, scope: Scope) -> Result<Vec<BackendFontInfo<'_>>, PdfError> {
        if let Scope::Page(page) = scope {
            let fonts = self
                .doc
                .get_page_fonts(page)
                .map_err(|e| PdfError::Parse(format!("cannot get page fonts: {}", e)))?;
            return Ok(fonts
                .into_iter()
                .map(|(name, font)| self.font_info(&name, font))
                .collect());
        }

        let mut fonts = Vec::new();
        for resources in self.resources(scope)? {
            let Some(entries) = self.category(resources, b"Font")? else {
                continue;
            };
            for (name, value) in entries.iter() {
                match self.deref(value).and_then(|obj| {
                    obj.as_dict()
                        .map_err(|e| PdfError::Parse(format!("font entry: {}", e)))
                }) {
                    Ok(font) => fonts.push(self.font_info(name, font)),
                    Err(e) => warn!("skipping font /{}: {}", String::from_utf8_lossy(name), e),
                }
            }
        }
        Ok(fonts)
    }

    fn form_xobject(&self, scope: Scope, name: &[u8]) -> Result<Option<FormXObject>, PdfError> {
        for resources in self.resources(scope)? {
            let Some(xobjects) = self.category(resources, b"XObject")? else {
                continue;
            };
            let Ok(Object::Reference(id)) = xobjects.get(name) else {
                continue;
            };
            let form = self.form_dictionary(*id)?;
            if form.get(b"Subtype").and_then(Object::as_name).ok() != Some(b"Form".as_slice()) {
                return Ok(None);
            }
            return Ok(Some(FormXObject {
                id: *id,
                matrix: self.form_matrix(form),
                has_resources: form.has(b"Resources"),
            }));
        }

        debug!("XObject /{} not found", String::from_utf8_lossy(name));
        Ok(None)
    }
}
