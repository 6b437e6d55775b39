//! Destination document assembly.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::canvas::PageCanvas;
use crate::fonts::StandardFont;
use crate::{MediaBox, PdfError};

/// Builds the translated document page by page.
///
/// All pages share one resource dictionary that registers the standard
/// fonts under their [`StandardFont::resource_name`] keys.
pub struct DocumentWriter {
    doc: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for DocumentWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let fonts = StandardFont::ALL.into_iter().map(|font| {
            let font_id = doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Font".to_vec())),
                ("Subtype", Object::Name(b"Type1".to_vec())),
                ("BaseFont", Object::Name(font.base_font().as_bytes().to_vec())),
                ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
            ]));
            (font.resource_name(), Object::Reference(font_id))
        });
        let font_dict = Dictionary::from_iter(fonts.collect::<Vec<_>>());

        let resources_id = doc.add_object(Dictionary::from_iter([(
            "Font",
            Object::Dictionary(font_dict),
        )]));

        Self {
            doc,
            pages_id,
            resources_id,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page of the given size drawn by `canvas`.
    pub fn add_page(&mut self, media_box: MediaBox, canvas: PageCanvas) -> Result<(), PdfError> {
        let content = canvas.into_content()?;
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content));

        let page_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(self.resources_id)),
            ("MediaBox", media_box.to_object()),
        ]));
        self.kids.push(Object::Reference(page_id));
        Ok(())
    }

    /// Close the page tree and serialize the document.
    pub fn finish(mut self) -> Result<Vec<u8>, PdfError> {
        let count = self.kids.len() as i64;
        let page_tree = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(self.kids)),
            ("Count", Object::Integer(count)),
        ]);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(page_tree));

        let catalog_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut output = Vec::new();
        self.doc.save_to(&mut output)?;
        Ok(output)
    }
}
