//! PDF rasterisation: the render collaborator and its pdfium implementation.
//!
//! The navigator only needs three things from a PDF engine: open a document
//! and learn its page count, report a page's natural width, and rasterise a
//! page at a scale factor. [`PdfRenderer`] captures exactly that so tests can
//! substitute a deterministic stand-in.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async code. Every pdfium call in
//! [`PdfiumRenderer`] runs on Tokio's blocking pool.
//!
//! ## Why reload per call?
//!
//! A `PdfDocument` borrows the `Pdfium` bindings it was opened with, so it
//! cannot be parked across `.await` points. The renderer keeps the raw bytes
//! of each open document instead and re-opens them on the blocking thread.
//! Opening an in-memory PDF is cheap next to rasterising a page.

use crate::error::StudyError;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Opaque identifier of a document opened by a [`PdfRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub u64);

/// A loaded PDF: opaque handle plus page count (always ≥ 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDocument {
    pub id: DocumentId,
    pub name: String,
    pub page_count: usize,
}

/// The PDF decoding/rendering engine the navigator drives.
///
/// Page numbers are 1-indexed throughout.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Open a document from its bytes.
    async fn load(&self, name: &str, bytes: Vec<u8>) -> Result<PdfDocument, StudyError>;

    /// Width of `page` in points at scale 1.
    async fn page_width(&self, doc: &PdfDocument, page: usize) -> Result<f32, StudyError>;

    /// Rasterise `page` scaled by `scale`, preserving aspect ratio.
    async fn render_page(
        &self,
        doc: &PdfDocument,
        page: usize,
        scale: f32,
    ) -> Result<DynamicImage, StudyError>;

    /// Forget a document. Further calls with its id fail.
    async fn unload(&self, doc: &PdfDocument);
}

/// [`PdfRenderer`] backed by pdfium.
pub struct PdfiumRenderer {
    lib_path: Option<PathBuf>,
    documents: Mutex<HashMap<DocumentId, Arc<Vec<u8>>>>,
    next_id: AtomicU64,
}

impl PdfiumRenderer {
    /// Create a renderer. `lib_path` may point at libpdfium or the
    /// directory containing it; `None` uses the system search path.
    pub fn new(lib_path: Option<PathBuf>) -> Self {
        Self {
            lib_path,
            documents: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn bytes_for(&self, doc: &PdfDocument) -> Result<Arc<Vec<u8>>, StudyError> {
        self.documents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&doc.id)
            .cloned()
            .ok_or_else(|| StudyError::Internal(format!("document '{}' is not open", doc.name)))
    }

    /// Run `f` against an opened pdfium document on the blocking pool.
    async fn with_document<T, F>(&self, doc: &PdfDocument, page: usize, f: F) -> Result<T, StudyError>
    where
        T: Send + 'static,
        F: FnOnce(&PdfPage<'_>) -> Result<T, PdfiumError> + Send + 'static,
    {
        let bytes = self.bytes_for(doc)?;
        let lib_path = self.lib_path.clone();

        tokio::task::spawn_blocking(move || {
            let pdfium = bind_pdfium(lib_path.as_deref())?;
            let document = pdfium
                .load_pdf_from_byte_slice(&bytes, None)
                .map_err(|e| StudyError::RenderFailed {
                    page,
                    detail: format!("{:?}", e),
                })?;
            let index = u16::try_from(page.saturating_sub(1)).map_err(|_| StudyError::RenderFailed {
                page,
                detail: "page index exceeds pdfium's limit".to_string(),
            })?;
            let pdf_page = document
                .pages()
                .get(index)
                .map_err(|e| StudyError::RenderFailed {
                    page,
                    detail: format!("{:?}", e),
                })?;
            f(&pdf_page).map_err(|e| StudyError::RenderFailed {
                page,
                detail: format!("{:?}", e),
            })
        })
        .await
        .map_err(|e| StudyError::Internal(format!("Render task panicked: {}", e)))?
    }
}

#[async_trait]
impl PdfRenderer for PdfiumRenderer {
    async fn load(&self, name: &str, bytes: Vec<u8>) -> Result<PdfDocument, StudyError> {
        let bytes = Arc::new(bytes);
        let lib_path = self.lib_path.clone();
        let shared = Arc::clone(&bytes);
        let file_name = name.to_string();

        let page_count = tokio::task::spawn_blocking(move || {
            let pdfium = bind_pdfium(lib_path.as_deref())?;
            let document = pdfium
                .load_pdf_from_byte_slice(&shared, None)
                .map_err(|e| StudyError::UnsupportedFormat {
                    name: file_name,
                    detail: format!("{:?}", e),
                })?;
            Ok::<usize, StudyError>(document.pages().len() as usize)
        })
        .await
        .map_err(|e| StudyError::Internal(format!("Load task panicked: {}", e)))??;

        if page_count == 0 {
            return Err(StudyError::UnsupportedFormat {
                name: name.to_string(),
                detail: "document has no pages".to_string(),
            });
        }

        let id = DocumentId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.documents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, bytes);
        info!("PDF loaded: '{}' ({} pages)", name, page_count);

        Ok(PdfDocument {
            id,
            name: name.to_string(),
            page_count,
        })
    }

    async fn page_width(&self, doc: &PdfDocument, page: usize) -> Result<f32, StudyError> {
        self.with_document(doc, page, |p| Ok(p.width().value)).await
    }

    async fn render_page(
        &self,
        doc: &PdfDocument,
        page: usize,
        scale: f32,
    ) -> Result<DynamicImage, StudyError> {
        let image = self
            .with_document(doc, page, move |p| {
                let config = PdfRenderConfig::new().scale_page_by_factor(scale);
                let bitmap = p.render_with_config(&config)?;
                Ok(bitmap.as_image())
            })
            .await?;
        debug!(
            "Rendered page {} → {}x{} px",
            page,
            image.width(),
            image.height()
        );
        Ok(image)
    }

    async fn unload(&self, doc: &PdfDocument) {
        self.documents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&doc.id);
        debug!("Unloaded '{}'", doc.name);
    }
}

/// Bind to libpdfium: the configured path first, then the system library.
fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, StudyError> {
    let bindings = match lib_path {
        Some(path) if path.is_dir() => {
            Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path(path))
        }
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| StudyError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}
