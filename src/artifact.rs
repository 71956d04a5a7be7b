//! Artifact source tracker: which visual artifact is staged for the model.
//!
//! Exactly one [`ArtifactSource`] is active at a time. Both setters replace it
//! unconditionally (last write wins); nothing merges. The tracker only ever
//! holds decoded-and-encoded [`Raster`]s, never raw file bytes, so whatever
//! is active can be embedded in a request as-is.

use crate::error::StudyError;
use crate::pipeline::encode::{decode_image, encode_data_uri};
use crate::pipeline::input::InputFile;
use crate::pipeline::render::{DocumentId, PdfDocument};
use image::DynamicImage;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// A decoded pixel image, held as a PNG data URI plus its dimensions.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data_uri: Arc<str>,
}

impl Raster {
    /// Snapshot a decoded image.
    pub fn from_image(img: &DynamicImage) -> Result<Self, StudyError> {
        let data_uri = encode_data_uri(img)
            .map_err(|e| StudyError::Internal(format!("Image encoding failed: {}", e)))?;
        Ok(Self {
            width: img.width(),
            height: img.height(),
            data_uri: data_uri.into(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `data:image/png;base64,…`
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_uri_len", &self.data_uri.len())
            .finish()
    }
}

/// The staged artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ArtifactSource {
    #[default]
    None,
    Upload {
        raster: Raster,
    },
    PdfPage {
        document: PdfDocument,
        page: usize,
        raster: Raster,
    },
}

impl ArtifactSource {
    pub fn raster(&self) -> Option<&Raster> {
        match self {
            ArtifactSource::None => None,
            ArtifactSource::Upload { raster } | ArtifactSource::PdfPage { raster, .. } => {
                Some(raster)
            }
        }
    }

    /// Hint interpolated into the system prompt.
    pub fn source_context(&self) -> String {
        match self {
            ArtifactSource::PdfPage { document, page, .. } => format!(
                "the user sent page {} of the PDF document \"{}\"",
                page, document.name
            ),
            _ => "the user sent a screenshot".to_string(),
        }
    }

    /// Short label used in logbook entries.
    pub fn source_label(&self) -> String {
        match self {
            ArtifactSource::PdfPage { page, .. } => format!("PDF page {page}"),
            _ => "image".to_string(),
        }
    }
}

/// Owner of the single active [`ArtifactSource`].
#[derive(Debug, Default)]
pub struct ArtifactTracker {
    active: Mutex<ArtifactSource>,
}

impl ArtifactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_upload(&self, raster: Raster) {
        debug!("Staged upload ({}x{})", raster.width(), raster.height());
        self.replace(ArtifactSource::Upload { raster });
    }

    pub fn set_pdf_page(&self, document: PdfDocument, page: usize, raster: Raster) {
        debug!(
            "Staged page {} of '{}' ({}x{})",
            page,
            document.name,
            raster.width(),
            raster.height()
        );
        self.replace(ArtifactSource::PdfPage {
            document,
            page,
            raster,
        });
    }

    /// Validate, decode and stage an uploaded image.
    ///
    /// The file must self-report an `image/*` media type and decode cleanly;
    /// on either failure nothing changes.
    pub fn stage_upload(&self, file: &InputFile) -> Result<(), StudyError> {
        if !file.is_image() {
            return Err(file.unsupported(format!(
                "expected an image, got '{}'",
                file.media_type
            )));
        }
        let img = decode_image(&file.bytes).map_err(|e| file.unsupported(e.to_string()))?;
        let raster = Raster::from_image(&img)?;
        info!("Image '{}' staged", file.name);
        self.set_upload(raster);
        Ok(())
    }

    /// Drop the staged page if it belongs to `document`.
    ///
    /// Uploads and pages of other documents are left alone. Returns whether
    /// anything was cleared.
    pub fn clear_pdf_page(&self, document: DocumentId) -> bool {
        let mut active = self.lock();
        match &*active {
            ArtifactSource::PdfPage { document: staged, .. } if staged.id == document => {
                debug!("Unstaged page of '{}'", staged.name);
                *active = ArtifactSource::None;
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> ArtifactSource {
        self.lock().clone()
    }

    pub fn has_artifact(&self) -> bool {
        !matches!(*self.lock(), ArtifactSource::None)
    }

    fn replace(&self, source: ArtifactSource) {
        *self.lock() = source;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ArtifactSource> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}
