//! Input files: a name, a self-reported media type, and the raw bytes.
//!
//! Uploads must report an `image/*` media type; documents must start with
//! the PDF magic bytes (`%PDF`). Both checks happen before any decoding so
//! callers get a meaningful `UnsupportedFormat` rather than a decoder crash.

use crate::error::StudyError;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Media type reported for PDF documents.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A user-supplied file, as handed over by the front-end.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a local file, inferring its media type from the extension.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, StudyError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => StudyError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => StudyError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = media_type_for_path(path);
        debug!("Read '{}' ({} bytes, {})", name, bytes.len(), media_type);

        Ok(Self {
            name,
            media_type,
            bytes,
        })
    }

    /// `true` when the file self-reports an image media type.
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// `true` when the content starts with the PDF magic bytes.
    pub fn is_pdf(&self) -> bool {
        self.bytes.starts_with(b"%PDF")
    }

    pub(crate) fn unsupported(&self, detail: impl Into<String>) -> StudyError {
        StudyError::UnsupportedFormat {
            name: self.name.clone(),
            detail: detail.into(),
        }
    }
}

/// Guess a media type from the file extension.
pub fn media_type_for_path(path: &Path) -> String {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        return PDF_MEDIA_TYPE.to_string();
    }
    ImageFormat::from_path(path)
        .map(|f| f.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

/// Resolve `~/` and relative paths typed at the prompt.
pub fn expand_path(input: &str) -> PathBuf {
    let input = input.trim();
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn media_type_from_extension() {
        assert_eq!(media_type_for_path(Path::new("notes.PDF")), "application/pdf");
        assert_eq!(media_type_for_path(Path::new("shot.png")), "image/png");
        assert_eq!(media_type_for_path(Path::new("shot.jpg")), "image/jpeg");
        assert_eq!(
            media_type_for_path(Path::new("archive.zip")),
            "application/octet-stream"
        );
    }

    #[test]
    fn pdf_magic_check() {
        let pdf = InputFile::new("a.pdf", PDF_MEDIA_TYPE, b"%PDF-1.7\n".to_vec());
        let fake = InputFile::new("b.pdf", PDF_MEDIA_TYPE, b"PK\x03\x04".to_vec());
        assert!(pdf.is_pdf());
        assert!(!fake.is_pdf());
    }

    #[test]
    fn expand_relative_path_unchanged() {
        assert_eq!(expand_path(" docs/a.pdf "), PathBuf::from("docs/a.pdf"));
    }

    #[tokio::test]
    async fn read_local_file() {
        let mut tmp = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        tmp.write_all(b"not really a png").unwrap();
        let file = InputFile::read(tmp.path()).await.expect("read succeeds");
        assert_eq!(file.media_type, "image/png");
        assert!(file.is_image());
        assert_eq!(file.bytes, b"not really a png");
    }

    #[tokio::test]
    async fn read_missing_file() {
        let err = InputFile::read("/definitely/not/here.png").await.unwrap_err();
        assert!(matches!(err, StudyError::FileNotFound { .. }));
    }
}
