//! Integration tests for a full study session.
//!
//! Every collaborator is a deterministic stand-in: no pdfium, no network,
//! no desktop clipboard. Run with:
//!   cargo test --test session

use async_trait::async_trait;
use edgequake_study::clipboard::Clipboard;
use edgequake_study::pipeline::llm::{ContentPart, Role};
use edgequake_study::pipeline::render::DocumentId;
use edgequake_study::storage::{MemorySessionStore, SessionStore};
use edgequake_study::{
    ArtifactSource, Collaborators, InputFile, LlmTransport, LogKind, NavStatus, PdfDocument,
    PdfRenderer, PromptMode, RenderOutcome, SessionConfig, StudyError, StudySession, WireRequest,
    WireResponse,
};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Stand-ins ────────────────────────────────────────────────────────────────

/// Letter-sized pages of solid white.
struct BlankPages {
    page_count: usize,
    next_id: AtomicU64,
}

#[async_trait]
impl PdfRenderer for BlankPages {
    async fn load(&self, name: &str, _bytes: Vec<u8>) -> Result<PdfDocument, StudyError> {
        Ok(PdfDocument {
            id: DocumentId(self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: name.to_string(),
            page_count: self.page_count,
        })
    }

    async fn page_width(&self, _doc: &PdfDocument, _page: usize) -> Result<f32, StudyError> {
        Ok(612.0)
    }

    async fn render_page(
        &self,
        _doc: &PdfDocument,
        _page: usize,
        scale: f32,
    ) -> Result<DynamicImage, StudyError> {
        let w = (612.0 * scale).round() as u32;
        let h = (792.0 * scale).round() as u32;
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            w,
            h,
            Rgba([255, 255, 255, 255]),
        )))
    }

    async fn unload(&self, _doc: &PdfDocument) {}
}

/// Answers every request with a fixed response and records what it saw.
struct CannedTransport {
    response: WireResponse,
    calls: AtomicUsize,
    last: Mutex<Option<WireRequest>>,
}

impl CannedTransport {
    fn new(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            response: WireResponse {
                status,
                body: body.to_string(),
            },
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }

    fn last_request(&self) -> WireRequest {
        self.last.lock().unwrap().clone().expect("no request was sent")
    }
}

#[async_trait]
impl LlmTransport for CannedTransport {
    async fn post(&self, request: &WireRequest) -> Result<WireResponse, StudyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());
        Ok(self.response.clone())
    }
}

#[derive(Default)]
struct Pasteboard {
    contents: Mutex<Vec<String>>,
}

impl Clipboard for Pasteboard {
    fn write(&self, text: &str) -> Result<(), StudyError> {
        self.contents.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

struct Harness {
    session: StudySession,
    transport: Arc<CannedTransport>,
    store: Arc<MemorySessionStore>,
    clipboard: Arc<Pasteboard>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn harness(transport: Arc<CannedTransport>) -> Harness {
    init_tracing();
    let store = Arc::new(MemorySessionStore::new());
    let clipboard = Arc::new(Pasteboard::default());
    let config = SessionConfig::builder()
        .viewport_width(648)
        .page_margin(48)
        .build()
        .unwrap();
    let session = StudySession::new(
        config,
        Collaborators {
            renderer: Arc::new(BlankPages {
                page_count: 3,
                next_id: AtomicU64::new(1),
            }),
            transport: transport.clone(),
            store: store.clone(),
            clipboard: clipboard.clone(),
        },
    );
    Harness {
        session,
        transport,
        store,
        clipboard,
    }
}

fn png_upload(name: &str) -> InputFile {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([0, 0, 0, 255])));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    InputFile::new(name, "image/png", bytes)
}

fn pdf_upload(name: &str) -> InputFile {
    InputFile::new(name, "application/pdf", b"%PDF-1.4\n%stand-in".to_vec())
}

fn system_prompt(request: &WireRequest) -> String {
    match &request.body.input[0].content[0] {
        ContentPart::Text { text } => text.clone(),
        other => panic!("unexpected system part: {other:?}"),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_page_exam_answer_filed_into_notes() {
    let h = harness(CannedTransport::new(200, r#"{"output_text":"  Answer A.  "}"#));
    h.session.credentials().save("  sk-test  ").unwrap();

    let outcome = h.session.open_pdf(&pdf_upload("lecture.pdf")).await.unwrap();
    assert_eq!(
        outcome,
        RenderOutcome::Rendered {
            page: 1,
            width: 600,
            height: 776
        }
    );
    h.session.navigator().next().await.unwrap();
    assert_eq!(
        h.session.navigator().status(),
        NavStatus::Loaded {
            name: "lecture.pdf".into(),
            page: 2,
            page_count: 3
        }
    );

    let answer = h
        .session
        .ask_with_mode(PromptMode::Exam, "what will be asked?")
        .await
        .unwrap();
    assert_eq!(answer.text, "Answer A.");
    assert_eq!(answer.source_label, "PDF page 2");
    assert_eq!(h.session.mode(), PromptMode::Exam);

    let request = h.transport.last_request();
    assert_eq!(request.credential.expose(), "sk-test");
    assert_eq!(request.body.model, "gpt-4.1-mini");
    assert_eq!(request.body.input[0].role, Role::System);
    assert_eq!(request.body.input[1].role, Role::User);
    let prompt = system_prompt(&request);
    assert!(prompt.contains(r#"page 2 of the PDF document "lecture.pdf""#));
    assert!(prompt.contains("exam-style questions"));
    match &request.body.input[1].content[..] {
        [ContentPart::InputText { text }, ContentPart::InputImage { image_url }] => {
            assert_eq!(text, "what will be asked?");
            assert!(image_url.starts_with("data:image/png;base64,"));
        }
        other => panic!("unexpected user content: {other:?}"),
    }

    let block = h.session.file_last_answer(LogKind::Notes).unwrap();
    assert!(block.contains("] PDF page 2\nRequest: what will be asked?\n\nAnswer A."));
    assert_eq!(h.session.logbook(LogKind::Notes).read(), block);
    assert!(h.session.logbook(LogKind::Mistakes).is_empty());
}

#[tokio::test]
async fn screenshot_ask_uses_screenshot_context() {
    let body = r#"{"output":[{"content":[{"type":"output_text","text":"From blocks"}]}]}"#;
    let h = harness(CannedTransport::new(200, body));
    h.session.credentials().save("sk-test").unwrap();
    h.session.upload(&png_upload("board.png")).unwrap();

    let answer = h.session.ask("explain").await.unwrap();
    assert_eq!(answer.text, "From blocks");
    assert_eq!(answer.mode, PromptMode::Study);
    assert_eq!(answer.source_label, "image");
    assert!(system_prompt(&h.transport.last_request()).contains("the user sent a screenshot"));
}

#[tokio::test]
async fn preconditions_are_checked_before_any_request() {
    let h = harness(CannedTransport::new(200, r#"{"output_text":"x"}"#));

    let err = h.session.ask("hello").await.unwrap_err();
    assert_eq!(err, StudyError::MissingCredential);
    assert_eq!(err.display_line(), "Save an API key first.");

    h.session.credentials().save("sk").unwrap();
    let err = h.session.ask("hello").await.unwrap_err();
    assert_eq!(err.display_line(), "Select a screenshot or a PDF page first.");

    h.session.upload(&png_upload("a.png")).unwrap();
    let err = h.session.ask("   ").await.unwrap_err();
    assert_eq!(err.display_line(), "Write your message first.");

    assert_eq!(h.transport.calls.load(Ordering::SeqCst), 0);
    assert!(h.session.file_last_answer(LogKind::Notes).is_none());
}

#[tokio::test]
async fn remote_error_is_one_line_and_keeps_previous_answer() {
    let h = harness(CannedTransport::new(401, "{\n  \"error\": \"bad key\"\n}"));
    h.session.credentials().save("sk").unwrap();
    h.session.upload(&png_upload("a.png")).unwrap();

    let line = h
        .session
        .orchestrator()
        .ask_for_display(PromptMode::Study, "hi")
        .await;
    assert!(line.starts_with("Error: HTTP 401"), "got: {line}");
    assert!(!line.contains('\n'));
    assert!(h.session.orchestrator().last_answer().is_none());
}

#[tokio::test]
async fn credential_lives_in_session_store() {
    let h = harness(CannedTransport::new(200, "{}"));
    assert!(!h.session.credentials().is_set());

    h.session.credentials().save(" sk-abc ").unwrap();
    assert_eq!(
        h.store.get("openai_api_key_session").as_deref(),
        Some("sk-abc")
    );

    h.session.credentials().clear();
    assert!(h.store.get("openai_api_key_session").is_none());
    assert_eq!(
        h.session.credentials().save("   "),
        Err(StudyError::EmptyCredential)
    );
}

#[tokio::test]
async fn logs_copy_and_clear_independently() {
    let h = harness(CannedTransport::new(200, r#"{"output_text":"Card 1"}"#));
    h.session.credentials().save("sk").unwrap();
    h.session.upload(&png_upload("a.png")).unwrap();

    h.session.logbook(LogKind::Mistakes).copy().unwrap();
    assert!(h.clipboard.contents.lock().unwrap().is_empty());

    h.session
        .ask_with_mode(PromptMode::Flashcards, "cards please")
        .await
        .unwrap();
    h.session.file_last_answer(LogKind::Mistakes).unwrap();
    h.session.file_last_answer(LogKind::Notes).unwrap();

    h.session.logbook(LogKind::Mistakes).copy().unwrap();
    let copied = h.clipboard.contents.lock().unwrap().clone();
    assert_eq!(copied.len(), 1);
    assert!(copied[0].contains("Card 1"));
    assert_eq!(
        h.store.get("study_mistakes_session").as_deref(),
        Some(copied[0].as_str())
    );

    h.session.logbook(LogKind::Mistakes).clear();
    assert!(h.session.logbook(LogKind::Mistakes).is_empty());
    assert!(h.session.logbook(LogKind::Notes).read().contains("Card 1"));
}

#[tokio::test]
async fn upload_replaces_pdf_page_until_use_page() {
    let h = harness(CannedTransport::new(200, "{}"));
    h.session.open_pdf(&pdf_upload("a.pdf")).await.unwrap();
    h.session.upload(&png_upload("shot.png")).unwrap();
    assert!(matches!(
        h.session.tracker().current(),
        ArtifactSource::Upload { .. }
    ));

    let outcome = h.session.navigator().use_current_page().await.unwrap();
    assert!(matches!(
        outcome,
        RenderOutcome::Restaged { page: 1 } | RenderOutcome::Rendered { page: 1, .. }
    ));
    assert_eq!(h.session.tracker().current().source_label(), "PDF page 1");
}

#[tokio::test]
async fn rejected_uploads_leave_artifact_untouched() {
    let h = harness(CannedTransport::new(200, "{}"));
    h.session.upload(&png_upload("a.png")).unwrap();

    let err = h
        .session
        .upload(&InputFile::new("notes.txt", "text/plain", b"hi".to_vec()))
        .unwrap_err();
    assert!(matches!(err, StudyError::UnsupportedFormat { .. }));

    let err = h
        .session
        .open_pdf(&InputFile::new("fake.pdf", "application/pdf", b"nope".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, StudyError::UnsupportedFormat { .. }));
    assert_eq!(h.session.navigator().status(), NavStatus::Unloaded);
    assert_eq!(h.session.tracker().current().source_label(), "image");
}
