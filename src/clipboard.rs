//! Clipboard collaborator.
//!
//! Writing to the clipboard fails in more places than it works (headless
//! sessions, SSH, sandboxed terminals), so writers compose:
//! [`FallbackClipboard`] tries a primary writer and falls back to a second
//! one, and only reports failure when both fail.

use crate::error::StudyError;
use std::sync::Arc;
use tracing::warn;

/// Something text can be copied to.
pub trait Clipboard: Send + Sync {
    fn write(&self, text: &str) -> Result<(), StudyError>;
}

/// Try `primary`, then `fallback`.
pub struct FallbackClipboard {
    primary: Arc<dyn Clipboard>,
    fallback: Arc<dyn Clipboard>,
}

impl FallbackClipboard {
    pub fn new(primary: Arc<dyn Clipboard>, fallback: Arc<dyn Clipboard>) -> Self {
        Self { primary, fallback }
    }
}

impl Clipboard for FallbackClipboard {
    fn write(&self, text: &str) -> Result<(), StudyError> {
        match self.primary.write(text) {
            Ok(()) => Ok(()),
            Err(primary_err) => {
                warn!("Primary clipboard failed ({}); using fallback", primary_err);
                self.fallback.write(text).map_err(|fallback_err| {
                    StudyError::Clipboard(format!("{primary_err}; fallback: {fallback_err}"))
                })
            }
        }
    }
}

/// A clipboard that is never available.
///
/// Default for sessions built without a system clipboard.
#[derive(Debug, Default)]
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn write(&self, _text: &str) -> Result<(), StudyError> {
        Err(StudyError::Clipboard("no clipboard configured".into()))
    }
}

/// The desktop clipboard, via `arboard`.
#[cfg(feature = "system-clipboard")]
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[cfg(feature = "system-clipboard")]
impl Clipboard for SystemClipboard {
    fn write(&self, text: &str) -> Result<(), StudyError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| StudyError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| StudyError::Clipboard(e.to_string()))?;
        tracing::debug!("Copied {} chars to the system clipboard", text.len());
        Ok(())
    }
}
