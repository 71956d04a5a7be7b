//! # edgequake-study
//!
//! A study assistant around a Vision Language Model: stage a screenshot or a
//! rendered PDF page, add a short question, pick a mode, and get back study
//! notes, an exam drill, or flashcards. Answers worth keeping are filed into
//! session-scoped Notes and Mistakes logs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image upload ─┐
//!               ├─ 1. Artifact  one staged raster (PNG data URI)
//! PDF page ─────┘      ▲
//!    (pdfium, fixed    │ next / prev / use-page
//!     target width)    │
//!                   2. Prompt   mode template + source context
//!                   3. Request  system + user(text, image) → POST
//!                   4. Answer   lenient text extraction
//!                   5. Logbook  timestamped, append-only
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_study::{Collaborators, InputFile, PromptMode, SessionConfig, StudySession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::default();
//!     let session = StudySession::new(config.clone(), Collaborators::standard(&config)?);
//!
//!     session.credentials().save(&std::env::var("OPENAI_API_KEY")?)?;
//!     session.open_pdf(&InputFile::read("lecture.pdf").await?).await?;
//!     session.navigator().next().await?;
//!
//!     let answer = session
//!         .ask_with_mode(PromptMode::Exam, "What is likely to be asked about this?")
//!         .await?;
//!     println!("{}", answer.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `study` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `system-clipboard` | with `cli` | [`clipboard::SystemClipboard`] via arboard |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifact;
pub mod ask;
pub mod clipboard;
pub mod config;
pub mod credential;
pub mod error;
pub mod guard;
pub mod logbook;
pub mod navigator;
pub mod pipeline;
pub mod prompts;
pub mod session;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifact::{ArtifactSource, ArtifactTracker, Raster};
pub use ask::{Answer, AskOrchestrator};
pub use config::{SessionConfig, SessionConfigBuilder, DEFAULT_ENDPOINT, MODEL};
pub use credential::{Credential, CredentialHolder};
pub use error::StudyError;
pub use logbook::{LogKind, Logbook};
pub use navigator::{NavStatus, PdfNavigator, RenderOutcome, SkipReason};
pub use pipeline::input::InputFile;
pub use pipeline::llm::{extract_text, HttpTransport, LlmTransport, WireRequest, WireResponse};
pub use pipeline::render::{PdfDocument, PdfRenderer, PdfiumRenderer};
pub use prompts::PromptMode;
pub use session::{Collaborators, StudySession};
