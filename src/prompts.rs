//! System prompts for the three study modes.
//!
//! Every prompt is built here so that tests can inspect them without a
//! model. Each template carries the same three obligations:
//!
//! 1. rely only on the supplied image and the user's message,
//! 2. say so when something in the image cannot be read instead of guessing,
//! 3. answer in a fixed structure specific to the mode.
//!
//! The source context (screenshot vs. page N of a PDF) is interpolated into
//! the opening line; it changes the phrasing, never the template.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Phrase the model is told to use for unreadable content.
pub const ILLEGIBLE_PHRASE: &str = "not legible in the image";

/// Which instruction template to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Bullet study notes plus one check question (default).
    #[default]
    Study,
    /// Explanation, key points, and two self-test questions.
    Exam,
    /// 5–10 front/back cards.
    Flashcards,
}

impl PromptMode {
    pub const ALL: [PromptMode; 3] = [PromptMode::Study, PromptMode::Exam, PromptMode::Flashcards];

    pub fn as_str(self) -> &'static str {
        match self {
            PromptMode::Study => "study",
            PromptMode::Exam => "exam",
            PromptMode::Flashcards => "flashcards",
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "study" => Ok(PromptMode::Study),
            "exam" => Ok(PromptMode::Exam),
            "flashcards" | "cards" => Ok(PromptMode::Flashcards),
            other => Err(format!(
                "unknown mode '{other}' (expected study, exam or flashcards)"
            )),
        }
    }
}

/// Build the system prompt for `mode`.
///
/// `source_context` is a short clause such as
/// `the user sent page 3 of the PDF document "notes.pdf"`.
pub fn build(mode: PromptMode, source_context: &str) -> String {
    let context = source_context;
    match mode {
        PromptMode::Exam => format!(
            "You are an exam preparation assistant; {context}.\n\
Rely only on the text and figures in that image and on the user's message.\n\
Do not make anything up. If something in the image is unclear, say \"{ILLEGIBLE_PHRASE}\".\n\
Output:\n\
1) Short explanation\n\
2) Key points (bulleted)\n\
3) 2 exam-style questions, each with a short answer key"
        ),
        PromptMode::Flashcards => format!(
            "You are a flashcard generator; {context}.\n\
Use only the content of that image and the user's message.\n\
Do not make anything up. If something in the image is unclear, say \"{ILLEGIBLE_PHRASE}\".\n\
Produce 5-10 flashcards:\n\
- Front: question or term\n\
- Back: short answer or explanation"
        ),
        PromptMode::Study => format!(
            "You are a study assistant; {context}.\n\
Use only the content of that image and the user's message.\n\
Do not make anything up. If something in the image is unclear, say \"{ILLEGIBLE_PHRASE}\".\n\
Output:\n\
- Study notes of 6-10 bullet points\n\
- 1 short open-ended check question (no answer)"
        ),
    }
}
