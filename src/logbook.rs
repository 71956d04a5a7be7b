//! Logbooks: session-scoped, append-only text logs.
//!
//! Two independent instances exist per session, Notes and Mistakes. Each is
//! one growing text blob in the session store; entries are appended in the
//! order they are filed and never parsed back out.
//!
//! Entry layout (the separator keeps long logs scannable):
//!
//! ```text
//! [14:05] PDF page 3
//! Request: why does the curve flatten?
//!
//! <answer text>
//!
//! ----------------------------------------
//! ```

use crate::clipboard::Clipboard;
use crate::error::StudyError;
use crate::storage::SessionStore;
use chrono::{Local, NaiveTime, Timelike};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Closes every filed entry.
pub const ENTRY_SEPARATOR: &str = "----------------------------------------";

/// Stand-in for an entry filed without a user message.
pub const NO_MESSAGE: &str = "(no message)";

/// Which log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Notes,
    Mistakes,
}

impl LogKind {
    /// Session-storage key holding this log's text.
    pub fn storage_key(self) -> &'static str {
        match self {
            LogKind::Notes => "study_notes_session",
            LogKind::Mistakes => "study_mistakes_session",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogKind::Notes => "notes",
            LogKind::Mistakes => "mistakes",
        })
    }
}

impl FromStr for LogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "notes" | "note" => Ok(LogKind::Notes),
            "mistakes" | "mistake" => Ok(LogKind::Mistakes),
            other => Err(format!("unknown log '{other}' (expected notes or mistakes)")),
        }
    }
}

/// One append-only log backed by the session store.
pub struct Logbook {
    kind: LogKind,
    store: Arc<dyn SessionStore>,
    clipboard: Arc<dyn Clipboard>,
}

impl Logbook {
    pub fn new(kind: LogKind, store: Arc<dyn SessionStore>, clipboard: Arc<dyn Clipboard>) -> Self {
        Self {
            kind,
            store,
            clipboard,
        }
    }

    pub fn kind(&self) -> LogKind {
        self.kind
    }

    /// Concatenate `block` to the end of the log.
    pub fn append(&self, block: &str) {
        let mut text = self.read();
        text.push_str(block);
        self.store.set(self.kind.storage_key(), text);
        debug!("Appended {} chars to {}", block.len(), self.kind);
    }

    pub fn read(&self) -> String {
        self.store.get(self.kind.storage_key()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.store.set(self.kind.storage_key(), String::new());
        info!("Cleared {}", self.kind);
    }

    /// Copy the whole log to the clipboard. An empty log copies nothing.
    pub fn copy(&self) -> Result<(), StudyError> {
        let text = self.read();
        if text.is_empty() {
            return Ok(());
        }
        self.clipboard.write(&text)
    }

    /// Format the shown answer as a timestamped entry and append it.
    ///
    /// Returns the appended block.
    pub fn file_answer(&self, answer_text: &str, user_text: &str, source_label: &str) -> String {
        let block = format_entry(Local::now().time(), source_label, user_text, answer_text);
        self.append(&block);
        info!("Filed answer into {}", self.kind);
        block
    }
}

/// Lay out one logbook entry stamped with `time` (hour:minute).
pub fn format_entry(time: NaiveTime, source_label: &str, user_text: &str, answer_text: &str) -> String {
    let request = match user_text.trim() {
        "" => NO_MESSAGE,
        text => text,
    };
    format!(
        "[{:02}:{:02}] {}\nRequest: {}\n\n{}\n\n{}\n\n",
        time.hour(),
        time.minute(),
        source_label,
        request,
        answer_text.trim_end(),
        ENTRY_SEPARATOR
    )
}
