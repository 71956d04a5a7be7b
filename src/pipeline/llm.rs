//! Model interaction: assemble the wire request, send it, read the answer.
//!
//! The request is a Responses-style body with exactly two messages:
//!
//! 1. **System message**: the mode prompt from [`crate::prompts`]
//! 2. **User message**: the user's text and the staged raster as a data URI
//!
//! The model id is fixed ([`crate::config::MODEL`]); nothing else in the body
//! is configurable.
//!
//! ## Lenient extraction
//!
//! The response shape is not pinned down by contract, so [`extract_text`]
//! walks a fallback chain instead of deserialising into a strict schema:
//! the flat `output_text` field, then every `output_text` / `text` content
//! block under `output[]`, then a pretty-printed dump of the whole body.
//! The user always sees *something*.

use crate::artifact::Raster;
use crate::credential::Credential;
use crate::error::StudyError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Everything one ask needs. Built fresh per ask, never stored.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub system_prompt: String,
    pub user_text: String,
    pub raster: Raster,
    pub credential: Credential,
}

/// JSON body of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsesBody {
    pub model: String,
    pub input: Vec<InputMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One content part, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    InputText { text: String },
    InputImage { image_url: String },
}

/// A request ready to send.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub endpoint: String,
    pub credential: Credential,
    pub body: ResponsesBody,
}

/// Raw HTTP result as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}

impl WireResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Build the wire request for `pending`.
pub fn assemble(pending: &PendingRequest, endpoint: &str, model: &str) -> WireRequest {
    let body = ResponsesBody {
        model: model.to_string(),
        input: vec![
            InputMessage {
                role: Role::System,
                content: vec![ContentPart::Text {
                    text: pending.system_prompt.clone(),
                }],
            },
            InputMessage {
                role: Role::User,
                content: vec![
                    ContentPart::InputText {
                        text: pending.user_text.clone(),
                    },
                    ContentPart::InputImage {
                        image_url: pending.raster.data_uri().to_string(),
                    },
                ],
            },
        ],
    };

    WireRequest {
        endpoint: endpoint.to_string(),
        credential: pending.credential.clone(),
        body,
    }
}

/// Moves a [`WireRequest`] to the endpoint and returns whatever came back.
///
/// Implementations report transport failures as
/// [`StudyError::NetworkFailure`] and hand every HTTP response back
/// untouched, whatever its status; [`send`] interprets the status.
#[async_trait]
pub trait LlmTransport: Send + Sync {
    async fn post(&self, request: &WireRequest) -> Result<WireResponse, StudyError>;
}

/// Send `request` and return the body of a 2xx response.
///
/// Non-2xx statuses become [`StudyError::RemoteError`] carrying the raw body
/// so the provider's own message reaches the user.
pub async fn send(transport: &dyn LlmTransport, request: &WireRequest) -> Result<String, StudyError> {
    let response = transport.post(request).await?;
    if !response.is_success() {
        warn!("Endpoint answered HTTP {}", response.status);
        return Err(StudyError::RemoteError {
            status: response.status,
            body: response.body,
        });
    }
    debug!("Endpoint answered HTTP {} ({} bytes)", response.status, response.body.len());
    Ok(response.body)
}

/// [`LlmTransport`] over HTTPS with reqwest.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, StudyError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| StudyError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LlmTransport for HttpTransport {
    async fn post(&self, request: &WireRequest) -> Result<WireResponse, StudyError> {
        let payload = serde_json::to_vec(&request.body)
            .map_err(|e| StudyError::Internal(format!("Request serialisation: {e}")))?;
        debug!("POST {} ({} bytes)", request.endpoint, payload.len());

        let response = self
            .client
            .post(&request.endpoint)
            .bearer_auth(request.credential.expose())
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| StudyError::NetworkFailure(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| StudyError::NetworkFailure(e.to_string()))?;

        Ok(WireResponse { status, body })
    }
}

/// Pull the answer text out of a response body.
///
/// Never fails: a body that is not JSON is returned as-is, and JSON with no
/// recognisable text is pretty-printed.
pub fn extract_text(body: &str) -> String {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            let err = StudyError::MalformedResponse(e.to_string());
            warn!("{}; showing the raw body", err);
            return body.to_string();
        }
    };

    if let Some(text) = value.get("output_text").and_then(Value::as_str) {
        if !text.is_empty() {
            return text.to_string();
        }
    }

    let mut acc = String::new();
    for item in value
        .get("output")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        for block in item
            .get("content")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let kind = block.get("type").and_then(Value::as_str);
            let text = block.get("text").and_then(Value::as_str);
            if let (Some("output_text" | "text"), Some(text)) = (kind, text) {
                acc.push_str(text);
            }
        }
    }

    if !acc.is_empty() {
        return acc;
    }

    warn!("No text blocks in response; showing the full body");
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string())
}
