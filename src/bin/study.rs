//! CLI binary for edgequake-study.
//!
//! An interactive shell over [`StudySession`]: stage a screenshot or a PDF
//! page, type a message, ask, and file answers into the session logs.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_study::clipboard::{Clipboard, FallbackClipboard, SystemClipboard};
use edgequake_study::pipeline::input::expand_path;
use edgequake_study::{
    Collaborators, InputFile, LogKind, PromptMode, RenderOutcome, SessionConfig, SkipReason,
    StudyError, StudySession,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const HELP: &str = r#"COMMANDS:
  key <k>                  Save the API key for this session
  clear-key                Forget the API key
  image <path>             Stage a screenshot (PNG, JPEG, GIF, WebP)
  pdf <path>               Load a PDF and stage page 1
  next | prev              Move to the next / previous page
  use-page                 Stage the current page again
  page                     Show the loaded document and page
  mode <study|exam|flashcards>
                           Select the prompt mode
  say <text>               Set the message sent with the next ask
  ask [mode]               Ask about the staged image
  exam | cards             Switch mode and ask
  note | mistake           File the last answer into Notes / Mistakes
  show notes|mistakes      Print a log
  clear notes|mistakes     Empty a log
  copy notes|mistakes      Copy a log to the clipboard
  help                     This text
  quit                     Leave
"#;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start a session
  study

  # Use a local pdfium and a compatible endpoint
  PDFIUM_LIB_PATH=/opt/pdfium/lib study --endpoint http://localhost:8080/v1/responses

ENVIRONMENT VARIABLES:
  STUDY_ENDPOINT          Responses endpoint (default https://api.openai.com/v1/responses)
  PDFIUM_LIB_PATH         Directory or file of an existing libpdfium
  RUST_LOG                Overrides the log filter
"#;

/// Study from screenshots and PDF pages with a Vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "study",
    version,
    about = "Study from screenshots and PDF pages with a Vision LLM",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Responses endpoint the requests are POSTed to.
    #[arg(long, env = "STUDY_ENDPOINT")]
    endpoint: Option<String>,

    /// Width of the page viewport in pixels.
    #[arg(long, env = "STUDY_VIEWPORT_WIDTH", default_value_t = 1280)]
    viewport_width: u32,

    /// Horizontal margin subtracted from the viewport.
    #[arg(long, env = "STUDY_PAGE_MARGIN", default_value_t = 48)]
    page_margin: u32,

    /// Upper bound on the rendered page width.
    #[arg(long, env = "STUDY_MAX_PAGE_WIDTH", default_value_t = 1100)]
    max_page_width: u32,

    /// Directory or file of an existing libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "STUDY_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, env = "STUDY_QUIET")]
    quiet: bool,
}

/// Last-resort clipboard: print the text between markers.
struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn write(&self, text: &str) -> Result<(), StudyError> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", dim("----- copy below -----"))
            .and_then(|_| handle.write_all(text.as_bytes()))
            .and_then(|_| writeln!(handle, "{}", dim("----- copy above -----")))
            .map_err(|e| StudyError::Clipboard(e.to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let clipboard: Arc<dyn Clipboard> = Arc::new(FallbackClipboard::new(
        Arc::new(SystemClipboard),
        Arc::new(StdoutClipboard),
    ));
    let collaborators = Collaborators::standard(&config)
        .context("Failed to set up the HTTP client")?
        .with_clipboard(clipboard);
    let session = StudySession::new(config, collaborators);

    println!("{}", bold("study: type `help` for commands"));
    println!("{}", dim(session.credentials().status_line()));

    let mut shell = Shell {
        session,
        message: String::new(),
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", bold(&format!("[{}]>", shell.session.mode())));
        io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        match shell.dispatch(line.trim()).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => println!("{}", red(&e.display_line())),
        }
    }
    Ok(())
}

/// Map CLI args to `SessionConfig`.
fn build_config(cli: &Cli) -> Result<SessionConfig> {
    let mut builder = SessionConfig::builder()
        .viewport_width(cli.viewport_width)
        .page_margin(cli.page_margin)
        .max_page_width(cli.max_page_width);
    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint.clone());
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(path.clone());
    }
    builder.build().context("Invalid configuration")
}

enum Flow {
    Continue,
    Quit,
}

struct Shell {
    session: StudySession,
    /// The message typed with `say`, sent with the next ask.
    message: String,
}

impl Shell {
    async fn dispatch(&mut self, line: &str) -> Result<Flow, StudyError> {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "help" => print!("{HELP}"),
            "quit" | "exit" => return Ok(Flow::Quit),
            "key" => {
                self.session.credentials().save(rest)?;
                println!("{}", green(self.session.credentials().status_line()));
            }
            "clear-key" => {
                self.session.credentials().clear();
                println!("{}", self.session.credentials().status_line());
            }
            "image" => {
                let file = InputFile::read(expand_path(rest)).await?;
                self.session.upload(&file)?;
                println!("{} staged {}", green("✓"), file.name);
            }
            "pdf" => {
                let file = InputFile::read(expand_path(rest)).await?;
                let outcome = self.session.open_pdf(&file).await?;
                self.report(outcome);
            }
            "next" => {
                let outcome = self.session.navigator().next().await?;
                self.report(outcome);
            }
            "prev" => {
                let outcome = self.session.navigator().prev().await?;
                self.report(outcome);
            }
            "use-page" => {
                let outcome = self.session.navigator().use_current_page().await?;
                self.report(outcome);
            }
            "page" => println!("{}", self.session.navigator().status()),
            "mode" => {
                let mode = parse_mode(rest)?;
                self.session.set_mode(mode);
                println!("mode: {mode}");
            }
            "say" => {
                self.message = rest.to_string();
            }
            "ask" => {
                if !rest.is_empty() {
                    let mode = parse_mode(rest)?;
                    self.session.set_mode(mode);
                }
                self.ask(self.session.mode()).await?;
            }
            "exam" => self.ask(PromptMode::Exam).await?,
            "cards" => self.ask(PromptMode::Flashcards).await?,
            "note" => self.file(LogKind::Notes),
            "mistake" => self.file(LogKind::Mistakes),
            "show" => {
                let kind = parse_kind(rest)?;
                let text = self.session.logbook(kind).read();
                if text.is_empty() {
                    println!("{}", dim(&format!("({kind} is empty)")));
                } else {
                    print!("{text}");
                }
            }
            "clear" => {
                let kind = parse_kind(rest)?;
                self.session.logbook(kind).clear();
                println!("{} cleared", kind);
            }
            "copy" => {
                let kind = parse_kind(rest)?;
                self.session.logbook(kind).copy()?;
            }
            other => println!("{}", red(&format!("unknown command '{other}' (try help)"))),
        }
        Ok(Flow::Continue)
    }

    async fn ask(&self, mode: PromptMode) -> Result<(), StudyError> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        spinner.set_message("Sending…");
        spinner.enable_steady_tick(Duration::from_millis(80));

        let result = self.session.ask_with_mode(mode, &self.message).await;
        spinner.finish_and_clear();

        let answer = result?;
        println!("{}", answer.text);
        Ok(())
    }

    fn file(&self, kind: LogKind) {
        match self.session.file_last_answer(kind) {
            Some(_) => println!("{} filed into {}", green("✓"), kind),
            None => println!("{}", dim("nothing to file yet")),
        }
    }

    fn report(&self, outcome: RenderOutcome) {
        match outcome {
            RenderOutcome::Rendered { width, height, .. } => println!(
                "{} {}  {}",
                green("✓"),
                self.session.navigator().status(),
                dim(&format!("{width}×{height}px"))
            ),
            RenderOutcome::Restaged { page } => {
                println!("{} page {page} staged", green("✓"))
            }
            RenderOutcome::Skipped(reason) => println!("{}", dim(skip_text(reason))),
        }
    }
}

fn parse_mode(s: &str) -> Result<PromptMode, StudyError> {
    s.parse().map_err(StudyError::Usage)
}

fn parse_kind(s: &str) -> Result<LogKind, StudyError> {
    s.parse().map_err(StudyError::Usage)
}

fn skip_text(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::InFlight => "a page is still rendering",
        SkipReason::NoDocument => "no PDF loaded",
        SkipReason::OutOfRange => "no such page",
        SkipReason::AtBoundary => "already at the edge of the document",
        SkipReason::Stale => "the document changed while rendering",
    }
}
