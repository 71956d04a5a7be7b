//! Pipeline stages between a user's file and the model's answer.
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm
//! (file)    (pdfium)   (data URI) (assemble / send / extract)
//! ```
//!
//! 1. [`input`]  - a user file with its self-reported media type
//! 2. [`render`] - the PDF render collaborator; pdfium runs in
//!    `spawn_blocking` because it is not async-safe
//! 3. [`encode`] - PNG-encode rasters into `data:` URIs for the request body
//! 4. [`llm`]    - build the Responses request, POST it, extract the text;
//!    the only stage with network I/O

pub mod encode;
pub mod input;
pub mod llm;
pub mod render;
