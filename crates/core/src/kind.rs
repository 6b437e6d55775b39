//! File-type dispatch for the upload boundary.

use serde::Serialize;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const TXT_CONTENT_TYPE: &str = "text/plain";

/// Container formats the translator knows how to rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
}

impl DocumentKind {
    /// Content type used when the caller did not supply one.
    pub fn content_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_CONTENT_TYPE,
            DocumentKind::Docx => DOCX_CONTENT_TYPE,
            DocumentKind::Txt => TXT_CONTENT_TYPE,
        }
    }
}

/// Decide which pipeline handles a file.
///
/// The content type wins for PDF and DOCX; otherwise the file name's extension
/// decides. Plain text is recognised by extension only. Extensions are matched
/// ASCII case-insensitively.
pub fn detect_kind(content_type: Option<&str>, file_name: &str) -> Option<DocumentKind> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match (content_type, extension.as_deref()) {
        (Some(PDF_CONTENT_TYPE), _) | (_, Some("pdf")) => Some(DocumentKind::Pdf),
        (Some(DOCX_CONTENT_TYPE), _) | (_, Some("docx")) => Some(DocumentKind::Docx),
        (_, Some("txt")) => Some(DocumentKind::Txt),
        _ => None,
    }
}

/// Name of the translated file handed back to the user.
///
/// Any directory components of `file_name` are dropped.
pub fn translated_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("document");
    format!("translated-{}", base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_content_type() {
        assert_eq!(
            detect_kind(Some(PDF_CONTENT_TYPE), "upload"),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(
            detect_kind(Some(DOCX_CONTENT_TYPE), "upload.bin"),
            Some(DocumentKind::Docx)
        );
    }

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(detect_kind(None, "report.pdf"), Some(DocumentKind::Pdf));
        assert_eq!(detect_kind(None, "Letter.DOCX"), Some(DocumentKind::Docx));
        assert_eq!(
            detect_kind(Some("application/octet-stream"), "notes.txt"),
            Some(DocumentKind::Txt)
        );
    }

    #[test]
    fn test_plain_text_content_type_alone_is_not_enough() {
        assert_eq!(detect_kind(Some(TXT_CONTENT_TYPE), "notes"), None);
    }

    #[test]
    fn test_unsupported_types() {
        assert_eq!(detect_kind(Some("image/png"), "photo.png"), None);
        assert_eq!(detect_kind(None, "no_extension"), None);
        assert_eq!(detect_kind(None, ""), None);
    }

    #[test]
    fn test_translated_file_name() {
        assert_eq!(translated_file_name("report.pdf"), "translated-report.pdf");
        assert_eq!(
            translated_file_name("/tmp/in/notes.txt"),
            "translated-notes.txt"
        );
        assert_eq!(translated_file_name(""), "translated-document");
    }
}
