//! A study session: every component, wired once.
//!
//! Each piece of mutable state has exactly one owner. The credential lives in
//! [`CredentialHolder`], the staged artifact in [`ArtifactTracker`], and the
//! page index in [`PdfNavigator`]. The orchestrator and navigator receive
//! handles to what they read or write at construction time; nothing is global.

use crate::artifact::ArtifactTracker;
use crate::ask::{Answer, AskOrchestrator};
use crate::clipboard::{Clipboard, NoClipboard};
use crate::config::SessionConfig;
use crate::credential::CredentialHolder;
use crate::error::StudyError;
use crate::logbook::{LogKind, Logbook};
use crate::navigator::{PdfNavigator, RenderOutcome};
use crate::pipeline::input::InputFile;
use crate::pipeline::llm::{HttpTransport, LlmTransport};
use crate::pipeline::render::{PdfRenderer, PdfiumRenderer};
use crate::prompts::PromptMode;
use crate::storage::{MemorySessionStore, SessionStore};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// The external collaborators a session talks to.
///
/// Tests substitute deterministic stand-ins for any of them.
pub struct Collaborators {
    pub renderer: Arc<dyn PdfRenderer>,
    pub transport: Arc<dyn LlmTransport>,
    pub store: Arc<dyn SessionStore>,
    pub clipboard: Arc<dyn Clipboard>,
}

impl Collaborators {
    /// pdfium, reqwest, an in-memory store, and no clipboard.
    pub fn standard(config: &SessionConfig) -> Result<Self, StudyError> {
        Ok(Self {
            renderer: Arc::new(PdfiumRenderer::new(config.pdfium_lib_path.clone())),
            transport: Arc::new(HttpTransport::new()?),
            store: Arc::new(MemorySessionStore::new()),
            clipboard: Arc::new(NoClipboard),
        })
    }

    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }
}

pub struct StudySession {
    config: SessionConfig,
    credentials: Arc<CredentialHolder>,
    tracker: Arc<ArtifactTracker>,
    navigator: PdfNavigator,
    orchestrator: AskOrchestrator,
    notes: Logbook,
    mistakes: Logbook,
    mode: Mutex<PromptMode>,
}

impl StudySession {
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            renderer,
            transport,
            store,
            clipboard,
        } = collaborators;

        let credentials = Arc::new(CredentialHolder::new(Arc::clone(&store)));
        let tracker = Arc::new(ArtifactTracker::new());
        let navigator = PdfNavigator::new(renderer, Arc::clone(&tracker), config.render_width());
        let orchestrator = AskOrchestrator::new(
            Arc::clone(&credentials),
            Arc::clone(&tracker),
            transport,
            config.endpoint.clone(),
        );
        let notes = Logbook::new(LogKind::Notes, Arc::clone(&store), Arc::clone(&clipboard));
        let mistakes = Logbook::new(LogKind::Mistakes, store, clipboard);
        debug!("Session ready: {:?}", config);

        Self {
            config,
            credentials,
            tracker,
            navigator,
            orchestrator,
            notes,
            mistakes,
            mode: Mutex::new(PromptMode::default()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialHolder {
        &self.credentials
    }

    pub fn tracker(&self) -> &ArtifactTracker {
        &self.tracker
    }

    pub fn navigator(&self) -> &PdfNavigator {
        &self.navigator
    }

    pub fn orchestrator(&self) -> &AskOrchestrator {
        &self.orchestrator
    }

    pub fn logbook(&self, kind: LogKind) -> &Logbook {
        match kind {
            LogKind::Notes => &self.notes,
            LogKind::Mistakes => &self.mistakes,
        }
    }

    pub fn mode(&self) -> PromptMode {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_mode(&self, mode: PromptMode) {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;
    }

    /// Stage an uploaded image.
    pub fn upload(&self, file: &InputFile) -> Result<(), StudyError> {
        self.tracker.stage_upload(file)
    }

    /// Load a PDF and stage its first page.
    pub async fn open_pdf(&self, file: &InputFile) -> Result<RenderOutcome, StudyError> {
        self.navigator.load(file).await
    }

    /// Ask in the selected mode.
    pub async fn ask(&self, user_text: &str) -> Result<Answer, StudyError> {
        self.orchestrator.ask(self.mode(), user_text).await
    }

    /// Switch to `mode`, then ask: the mode shortcuts.
    pub async fn ask_with_mode(&self, mode: PromptMode, user_text: &str) -> Result<Answer, StudyError> {
        self.set_mode(mode);
        self.orchestrator.ask(mode, user_text).await
    }

    /// File the last shown answer into `kind`. `None` if nothing was shown.
    pub fn file_last_answer(&self, kind: LogKind) -> Option<String> {
        let answer = self.orchestrator.last_answer()?;
        Some(
            self.logbook(kind)
                .file_answer(&answer.text, &answer.user_text, &answer.source_label),
        )
    }
}
