//! Ask orchestrator: preconditions → prompt → request → answer.
//!
//! Preconditions are checked in a fixed order and each short-circuits before
//! any network traffic:
//!
//! 1. a credential is saved,
//! 2. an artifact is staged,
//! 3. the user message is non-empty.
//!
//! Only one ask can be outstanding. The in-flight token is held by the
//! running ask and released when it finishes, whichever way it finishes.
//! There is no timeout and no cancellation: a hung endpoint keeps the ask
//! busy until the transport gives up.

use crate::artifact::ArtifactTracker;
use crate::config::MODEL;
use crate::credential::CredentialHolder;
use crate::error::StudyError;
use crate::guard::InFlight;
use crate::pipeline::llm::{assemble, extract_text, send, LlmTransport, PendingRequest};
use crate::prompts::{self, PromptMode};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, warn};

/// A successful answer and what produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub mode: PromptMode,
    /// Extracted answer text, trimmed.
    pub text: String,
    /// The user's message as sent (trimmed).
    pub user_text: String,
    /// `PDF page N` or `image`.
    pub source_label: String,
}

pub struct AskOrchestrator {
    credentials: Arc<CredentialHolder>,
    tracker: Arc<ArtifactTracker>,
    transport: Arc<dyn LlmTransport>,
    endpoint: String,
    asking: InFlight,
    last_answer: Mutex<Option<Answer>>,
}

impl AskOrchestrator {
    pub fn new(
        credentials: Arc<CredentialHolder>,
        tracker: Arc<ArtifactTracker>,
        transport: Arc<dyn LlmTransport>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            tracker,
            transport,
            endpoint: endpoint.into(),
            asking: InFlight::new(),
            last_answer: Mutex::new(None),
        }
    }

    /// Ask the model about the staged artifact.
    pub async fn ask(&self, mode: PromptMode, user_text: &str) -> Result<Answer, StudyError> {
        let credential = self.credentials.get().ok_or(StudyError::MissingCredential)?;
        let source = self.tracker.current();
        let raster = source.raster().cloned().ok_or(StudyError::NoArtifact)?;
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(StudyError::EmptyUserText);
        }

        let Some(_token) = self.asking.try_acquire() else {
            return Err(StudyError::Busy);
        };

        let start = Instant::now();
        let source_label = source.source_label();
        info!("Asking in {} mode about {}", mode, source_label);

        let pending = PendingRequest {
            system_prompt: prompts::build(mode, &source.source_context()),
            user_text: user_text.to_string(),
            raster,
            credential,
        };
        let request = assemble(&pending, &self.endpoint, MODEL);

        let body = send(self.transport.as_ref(), &request).await.map_err(|e| {
            warn!("Ask failed after {:?}: {}", start.elapsed(), e);
            e
        })?;
        let text = extract_text(&body).trim().to_string();
        info!("Answer received: {} chars in {:?}", text.len(), start.elapsed());

        let answer = Answer {
            mode,
            text,
            user_text: pending.user_text,
            source_label,
        };
        *self.last_answer.lock().unwrap_or_else(|e| e.into_inner()) = Some(answer.clone());
        Ok(answer)
    }

    /// [`ask`](Self::ask), rendered as the text for the output area.
    ///
    /// Failures become a single line; nothing escapes this boundary.
    pub async fn ask_for_display(&self, mode: PromptMode, user_text: &str) -> String {
        match self.ask(mode, user_text).await {
            Ok(answer) => answer.text,
            Err(e) => e.display_line(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.asking.is_busy()
    }

    /// The most recent successful answer, for filing into a logbook.
    pub fn last_answer(&self) -> Option<Answer> {
        self.last_answer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
