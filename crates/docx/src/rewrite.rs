//! Streaming rewrite of `word/document.xml`.
//!
//! Every XML event is copied to the output unchanged except the text of the
//! first `w:t` of each run inside a [`BodyElement`], which is replaced by its
//! translation.

use doctranslate_core::translate::{Oracle, Translator};
use log::debug;
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::body::BodyElement;
use crate::DocxError;

/// Where the rewriter is relative to the translatable structure.
#[derive(Debug, Default)]
struct Scope {
    /// Open paragraph that qualifies, with the stack depth it was opened at.
    paragraph: Option<(BodyElement, usize)>,
    /// Open run directly inside that paragraph, and whether its first `w:t`
    /// has been seen.
    run: Option<(usize, bool)>,
    /// Text collected from the `w:t` being replaced.
    capture: Option<String>,
}

pub fn rewrite_document_xml<O: Oracle + ?Sized>(
    xml: &[u8],
    translator: &Translator<'_, O>,
) -> Result<Vec<u8>, DocxError> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut scope = Scope::default();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Eof => break,

            Event::Start(ref e) => {
                let name = e.name().as_ref().to_vec();
                let depth = open.len();
                open.push(name);

                match open[depth].as_slice() {
                    b"w:p" => {
                        if let Some(element) = BodyElement::locate(&open) {
                            scope.paragraph = Some((element, depth));
                        }
                    }
                    b"w:r" if matches!(scope.paragraph, Some((_, p)) if p + 1 == depth) => {
                        scope.run = Some((depth, false));
                    }
                    b"w:t" => {
                        if let Some((r, seen)) = scope.run.as_mut() {
                            if !*seen && *r + 1 == depth {
                                *seen = true;
                                scope.capture = Some(String::new());
                            }
                        }
                    }
                    _ => {}
                }
                writer.write_event(event)?;
            }

            Event::Empty(ref e) => {
                // A self-closing first `w:t` has no text but still counts.
                if e.name().as_ref() == b"w:t" {
                    if let Some((r, seen)) = scope.run.as_mut() {
                        if *r + 1 == open.len() {
                            *seen = true;
                        }
                    }
                }
                writer.write_event(event)?;
            }

            Event::Text(ref e) if scope.capture.is_some() => {
                let text = e.unescape()?;
                if let Some(captured) = scope.capture.as_mut() {
                    captured.push_str(&text);
                }
            }

            Event::CData(ref e) if scope.capture.is_some() => {
                let text = String::from_utf8_lossy(e).into_owned();
                if let Some(captured) = scope.capture.as_mut() {
                    captured.push_str(&text);
                }
            }

            Event::End(ref e) => {
                if let Some(original) = scope.capture.take() {
                    let element = scope.paragraph.map(|(el, _)| el);
                    let translated = translate_run_text(element, &original, translator)?;
                    writer.write_event(Event::Text(BytesText::new(&translated)))?;
                }

                let depth = open.len().saturating_sub(1);
                if open.pop().as_deref() != Some(e.name().as_ref()) {
                    return Err(DocxError::MalformedPart(format!(
                        "unbalanced </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    )));
                }
                if matches!(scope.run, Some((r, _)) if r == depth) {
                    scope.run = None;
                }
                if matches!(scope.paragraph, Some((_, p)) if p == depth) {
                    scope.paragraph = None;
                }
                writer.write_event(event)?;
            }

            other => writer.write_event(other)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

/// Translate the first text of a run. Empty text is left as it is.
fn translate_run_text<O: Oracle + ?Sized>(
    element: Option<BodyElement>,
    text: &str,
    translator: &Translator<'_, O>,
) -> Result<String, DocxError> {
    if text.is_empty() {
        return Ok(String::new());
    }
    debug!("translating {} chars in {:?}", text.chars().count(), element);
    Ok(translator.translate_chunked(text)?)
}
