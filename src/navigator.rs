//! PDF navigator: which page of the loaded document is current.
//!
//! State machine over `Unloaded` / `Loaded { document, page }`. Every page
//! change goes through [`PdfNavigator::render`], which
//!
//! 1. refuses to start while another render is in flight (the call is
//!    dropped, not queued; callers re-issue it later),
//! 2. sizes the page to `min(viewport - margin, max width)` and derives the
//!    scale from the page's natural width,
//! 3. rasterises it through the [`PdfRenderer`] collaborator, and
//! 4. only then commits the new page index and stages the raster in the
//!    [`ArtifactTracker`].
//!
//! A failed render therefore never moves the page index, and a render that
//! finishes after its document was replaced is discarded.

use crate::artifact::{ArtifactTracker, Raster};
use crate::error::StudyError;
use crate::guard::InFlight;
use crate::pipeline::input::InputFile;
use crate::pipeline::render::{PdfDocument, PdfRenderer};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Why a navigation request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another render is still running.
    InFlight,
    /// No document is loaded.
    NoDocument,
    /// The requested page is outside `[1, page_count]`.
    OutOfRange,
    /// Already on the first (prev) or last (next) page.
    AtBoundary,
    /// The document was replaced while this render was running.
    Stale,
}

/// Result of a navigation request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The page was rasterised and staged.
    Rendered { page: usize, width: u32, height: u32 },
    /// The cached raster of the current page was staged again.
    Restaged { page: usize },
    /// Nothing happened.
    Skipped(SkipReason),
}

/// Snapshot of the navigator for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavStatus {
    Unloaded,
    Loaded {
        name: String,
        page: usize,
        page_count: usize,
    },
}

impl std::fmt::Display for NavStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavStatus::Unloaded => f.write_str("no PDF loaded"),
            NavStatus::Loaded {
                name,
                page,
                page_count,
            } => write!(f, "{name}: page {page} / {page_count}"),
        }
    }
}

#[derive(Debug, Default)]
enum NavState {
    #[default]
    Unloaded,
    Loaded {
        document: PdfDocument,
        page: usize,
        /// Raster of `page`, once it has rendered.
        snapshot: Option<Raster>,
    },
}

/// Owner of the loaded document and the current page index.
pub struct PdfNavigator {
    renderer: Arc<dyn PdfRenderer>,
    tracker: Arc<ArtifactTracker>,
    render_width: u32,
    state: Mutex<NavState>,
    rendering: InFlight,
}

impl PdfNavigator {
    pub fn new(renderer: Arc<dyn PdfRenderer>, tracker: Arc<ArtifactTracker>, render_width: u32) -> Self {
        Self {
            renderer,
            tracker,
            render_width: render_width.max(1),
            state: Mutex::new(NavState::Unloaded),
            rendering: InFlight::new(),
        }
    }

    /// Load a new document, replacing any previous one, and render page 1.
    ///
    /// The file must start with `%PDF`. If decoding succeeds but page 1 fails
    /// to render, the document stays loaded at page 1 and the render error is
    /// returned; [`use_current_page`](Self::use_current_page) retries it.
    /// A staged page of the replaced document is unstaged either way; a
    /// staged upload is kept.
    pub async fn load(&self, file: &InputFile) -> Result<RenderOutcome, StudyError> {
        if !file.is_pdf() {
            return Err(file.unsupported("not a PDF document"));
        }

        let document = self.renderer.load(&file.name, file.bytes.clone()).await?;
        if document.page_count == 0 {
            self.renderer.unload(&document).await;
            return Err(file.unsupported("document has no pages"));
        }
        info!("Loaded '{}' ({} pages)", document.name, document.page_count);

        let previous = {
            let mut state = self.lock();
            let previous = std::mem::replace(
                &mut *state,
                NavState::Loaded {
                    document,
                    page: 1,
                    snapshot: None,
                },
            );
            // A staged page of the replaced document must not outlive it.
            if let NavState::Loaded { document: old, .. } = &previous {
                self.tracker.clear_pdf_page(old.id);
            }
            previous
        };
        if let NavState::Loaded { document: old, .. } = previous {
            self.renderer.unload(&old).await;
        }

        self.render(1).await
    }

    /// Rasterise `page` and make it current.
    pub async fn render(&self, page: usize) -> Result<RenderOutcome, StudyError> {
        let Some(_token) = self.rendering.try_acquire() else {
            debug!("Render of page {} dropped: another render is in flight", page);
            return Ok(RenderOutcome::Skipped(SkipReason::InFlight));
        };

        let document = match &*self.lock() {
            NavState::Unloaded => return Ok(RenderOutcome::Skipped(SkipReason::NoDocument)),
            NavState::Loaded { document, .. } => document.clone(),
        };
        if page < 1 || page > document.page_count {
            return Ok(RenderOutcome::Skipped(SkipReason::OutOfRange));
        }

        let raster = self.rasterise(&document, page).await.map_err(|e| {
            warn!("Page {} of '{}' failed to render: {}", page, document.name, e);
            e
        })?;
        let (width, height) = (raster.width(), raster.height());

        {
            let mut state = self.lock();
            match &mut *state {
                NavState::Loaded {
                    document: current,
                    page: current_page,
                    snapshot,
                } if current.id == document.id => {
                    *current_page = page;
                    *snapshot = Some(raster.clone());
                    self.tracker.set_pdf_page(document, page, raster);
                }
                _ => {
                    debug!("Discarding render of '{}': document replaced", document.name);
                    return Ok(RenderOutcome::Skipped(SkipReason::Stale));
                }
            }
        }

        Ok(RenderOutcome::Rendered {
            page,
            width,
            height,
        })
    }

    pub async fn next(&self) -> Result<RenderOutcome, StudyError> {
        match self.position() {
            None => Ok(RenderOutcome::Skipped(SkipReason::NoDocument)),
            Some((page, count)) if page >= count => {
                Ok(RenderOutcome::Skipped(SkipReason::AtBoundary))
            }
            Some((page, _)) => self.render(page + 1).await,
        }
    }

    pub async fn prev(&self) -> Result<RenderOutcome, StudyError> {
        match self.position() {
            None => Ok(RenderOutcome::Skipped(SkipReason::NoDocument)),
            Some((page, _)) if page <= 1 => Ok(RenderOutcome::Skipped(SkipReason::AtBoundary)),
            Some((page, _)) => self.render(page - 1).await,
        }
    }

    /// Stage the current page again without moving.
    ///
    /// Needed after an upload replaced the staged artifact: the page is
    /// still on screen but no longer what would be sent.
    pub async fn use_current_page(&self) -> Result<RenderOutcome, StudyError> {
        if self.rendering.is_busy() {
            return Ok(RenderOutcome::Skipped(SkipReason::InFlight));
        }
        let missing = {
            let state = self.lock();
            match &*state {
                NavState::Unloaded => return Ok(RenderOutcome::Skipped(SkipReason::NoDocument)),
                NavState::Loaded {
                    document,
                    page,
                    snapshot: Some(raster),
                } => {
                    self.tracker.set_pdf_page(document.clone(), *page, raster.clone());
                    return Ok(RenderOutcome::Restaged { page: *page });
                }
                NavState::Loaded { page, .. } => *page,
            }
        };
        self.render(missing).await
    }

    pub fn status(&self) -> NavStatus {
        match &*self.lock() {
            NavState::Unloaded => NavStatus::Unloaded,
            NavState::Loaded { document, page, .. } => NavStatus::Loaded {
                name: document.name.clone(),
                page: *page,
                page_count: document.page_count,
            },
        }
    }

    /// Current 1-indexed page, if a document is loaded.
    pub fn page_index(&self) -> Option<usize> {
        self.position().map(|(page, _)| page)
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering.is_busy()
    }

    async fn rasterise(&self, document: &PdfDocument, page: usize) -> Result<Raster, StudyError> {
        let natural_width = self
            .renderer
            .page_width(document, page)
            .await
            .map_err(|e| as_render_failure(page, e))?;
        if natural_width.is_nan() || natural_width <= 0.0 {
            return Err(StudyError::RenderFailed {
                page,
                detail: format!("page reports a width of {natural_width}"),
            });
        }

        let scale = self.render_width as f32 / natural_width;
        debug!(
            "Rendering page {} at {} px (scale {:.3})",
            page, self.render_width, scale
        );
        let image = self
            .renderer
            .render_page(document, page, scale)
            .await
            .map_err(|e| as_render_failure(page, e))?;
        Raster::from_image(&image)
    }

    fn position(&self) -> Option<(usize, usize)> {
        match &*self.lock() {
            NavState::Unloaded => None,
            NavState::Loaded { document, page, .. } => Some((*page, document.page_count)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NavState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn as_render_failure(page: usize, e: StudyError) -> StudyError {
    match e {
        StudyError::RenderFailed { .. } => e,
        other => StudyError::RenderFailed {
            page,
            detail: other.to_string(),
        },
    }
}
