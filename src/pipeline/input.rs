//! Input resolution: validate a user-supplied path and classify it.
//!
//! pdfium crashes unhelpfully on files that are not PDFs, so the magic bytes
//! (`%PDF`) are checked before anything is handed to it. Files ending in
//! `.json` are treated as pre-extracted word dumps and skip pdfium entirely.

use crate::error::PautaError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a validated input will be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedInput {
    /// A PDF opened through pdfium.
    Pdf(PathBuf),
    /// A JSON word dump (`{"pages": [[word, ..], ..]}`).
    WordDump(PathBuf),
}

impl ResolvedInput {
    /// Path to the file regardless of its kind.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Pdf(p) | ResolvedInput::WordDump(p) => p,
        }
    }
}

/// Check if the path names a JSON word dump.
pub fn is_word_dump(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Validate existence and readability, then classify the file.
pub fn resolve_input(path: &Path) -> Result<ResolvedInput, PautaError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(PautaError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PautaError::PermissionDenied { path });
        }
        Err(_) => return Err(PautaError::FileNotFound { path }),
    };

    if is_word_dump(&path) {
        debug!("Resolved word dump: {}", path.display());
        return Ok(ResolvedInput::WordDump(path));
    }

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
        return Err(PautaError::NotAPdf { path, magic });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Pdf(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_word_dump() {
        assert!(is_word_dump(Path::new("/tmp/words.json")));
        assert!(is_word_dump(Path::new("WORDS.JSON")));
        assert!(!is_word_dump(Path::new("/tmp/pauta.pdf")));
        assert!(!is_word_dump(Path::new("json")));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = resolve_input(Path::new("/no/such/pauta.pdf")).unwrap_err();
        assert!(matches!(err, PautaError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_bytes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"PK\x03\x04rest").unwrap();
        match resolve_input(&path).unwrap_err() {
            PautaError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pdf_and_dump_are_classified() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("pauta.pdf");
        std::fs::write(&pdf, b"%PDF-1.7\n").unwrap();
        let dump = dir.path().join("pauta.json");
        std::fs::write(&dump, b"{\"pages\": []}").unwrap();

        assert_eq!(resolve_input(&pdf).unwrap(), ResolvedInput::Pdf(pdf.clone()));
        assert_eq!(resolve_input(&dump).unwrap(), ResolvedInput::WordDump(dump.clone()));
    }
}
