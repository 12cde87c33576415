//! Document loading: bytes on disk to clean scannable text.
//!
//! Plain text and Markdown load natively. PDF goes through the PDFium
//! text layer when the `pdf` feature is compiled in. Word documents are
//! rejected with a conversion hint rather than half-parsed.

use std::ffi::OsStr;
use std::path::Path;

use super::ScanError;

/// Read a document and return sanitized text ready for chunking.
pub fn load_document(path: &Path) -> Result<String, ScanError> {
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let raw = match extension.as_str() {
        "pdf" => load_pdf(path)?,
        "docx" | "doc" => {
            return Err(ScanError::UnsupportedFormat(format!(
                "{extension} is not supported; export the document as plain text or PDF first"
            )));
        }
        _ => {
            let bytes = std::fs::read(path)?;
            String::from_utf8(bytes).map_err(|e| ScanError::EncodingError(e.to_string()))?
        }
    };

    let text = sanitize_document_text(&raw);
    if text.trim().is_empty() {
        return Err(ScanError::EmptyDocument);
    }

    tracing::info!(
        path = %path.display(),
        bytes = text.len(),
        "document loaded"
    );
    Ok(text)
}

/// Strip control characters (keeping newlines and tabs), trim trailing
/// whitespace per line, and collapse blank-line runs to a single blank
/// line so paragraph boundaries survive for the chunker.
pub fn sanitize_document_text(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect();

    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = true;
    for line in filtered.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !previous_blank {
                lines.push("");
            }
            previous_blank = true;
        } else {
            lines.push(line);
            previous_blank = false;
        }
    }
    while lines.last() == Some(&"") {
        lines.pop();
    }

    lines.join("\n")
}

#[cfg(feature = "pdf")]
fn load_pdf(path: &Path) -> Result<String, ScanError> {
    let bytes = std::fs::read(path)?;
    let pdfium = load_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(&bytes, None)
        .map_err(|e| ScanError::Pdf(format!("failed to open {}: {e}", path.display())))?;

    // A page without a text layer contributes nothing rather than
    // failing the whole scan.
    let mut pages = Vec::with_capacity(document.pages().len() as usize);
    for page in document.pages().iter() {
        pages.push(page.text().map(|t| t.all()).unwrap_or_default());
    }

    tracing::info!(path = %path.display(), pages = pages.len(), "extracted PDF text layer");
    Ok(pages.join("\n\n"))
}

/// Bind PDFium from `PDFIUM_DYNAMIC_LIB_PATH` when set, else from the
/// system library path.
#[cfg(feature = "pdf")]
fn load_pdfium() -> Result<pdfium_render::prelude::Pdfium, ScanError> {
    use pdfium_render::prelude::Pdfium;

    if let Ok(lib_path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let bindings = Pdfium::bind_to_library(&lib_path)
            .map_err(|e| ScanError::Pdf(format!("failed to bind {lib_path}: {e}")))?;
        return Ok(Pdfium::new(bindings));
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        ScanError::Pdf(format!(
            "PDFium library not found (set PDFIUM_DYNAMIC_LIB_PATH): {e}"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

#[cfg(not(feature = "pdf"))]
fn load_pdf(_path: &Path) -> Result<String, ScanError> {
    Err(ScanError::UnsupportedFormat(
        "pdf support is not compiled in; rebuild with --features pdf or convert to plain text"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(name: &str, bytes: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_plain_text() {
        let (_dir, path) = write_temp("memo.txt", b"Quarterly numbers attached.\n");

        let text = load_document(&path).unwrap();

        assert_eq!(text, "Quarterly numbers attached.");
    }

    #[test]
    fn unknown_extension_treated_as_text() {
        let (_dir, path) = write_temp("notes.log", b"draft press release\n");

        assert!(load_document(&path).is_ok());
    }

    #[test]
    fn whitespace_only_document_rejected() {
        let (_dir, path) = write_temp("blank.txt", b"   \n\n \t \n");

        assert!(matches!(
            load_document(&path),
            Err(ScanError::EmptyDocument)
        ));
    }

    #[test]
    fn invalid_utf8_rejected() {
        let (_dir, path) = write_temp("binary.txt", &[0xFF, 0xFE, 0x80, 0x00]);

        assert!(matches!(
            load_document(&path),
            Err(ScanError::EncodingError(_))
        ));
    }

    #[test]
    fn word_documents_rejected_with_hint() {
        let (_dir, path) = write_temp("deal.docx", b"PK\x03\x04");

        match load_document(&path) {
            Err(ScanError::UnsupportedFormat(hint)) => {
                assert!(hint.contains("docx"));
                assert!(hint.contains("plain text"));
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let (_dir, path) = write_temp("DEAL.DOCX", b"PK\x03\x04");

        assert!(matches!(
            load_document(&path),
            Err(ScanError::UnsupportedFormat(_))
        ));
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn pdf_without_feature_rejected_with_hint() {
        let (_dir, path) = write_temp("deck.pdf", b"%PDF-1.4");

        match load_document(&path) {
            Err(ScanError::UnsupportedFormat(hint)) => {
                assert!(hint.contains("--features pdf"));
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            load_document(&dir.path().join("gone.txt")),
            Err(ScanError::Io(_))
        ));
    }

    #[test]
    fn sanitize_strips_control_chars_keeps_tabs() {
        let out = sanitize_document_text("a\u{0}b\u{7}c\td\n");
        assert_eq!(out, "abc\td");
    }

    #[test]
    fn sanitize_normalizes_crlf() {
        let out = sanitize_document_text("one\r\ntwo\r\n");
        assert_eq!(out, "one\ntwo");
    }

    #[test]
    fn sanitize_trims_trailing_space_per_line() {
        let out = sanitize_document_text("one   \ntwo\t\n");
        assert_eq!(out, "one\ntwo");
    }

    #[test]
    fn sanitize_collapses_blank_runs_but_keeps_paragraphs() {
        let out = sanitize_document_text("para one\n\n\n\n\npara two\n");
        assert_eq!(out, "para one\n\npara two");
    }

    #[test]
    fn sanitize_drops_leading_and_trailing_blanks() {
        let out = sanitize_document_text("\n\n  \nbody\n\n\n");
        assert_eq!(out, "body");
    }
}
