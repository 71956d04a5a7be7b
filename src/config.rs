//! Configuration for a study session.
//!
//! All tunables live in [`SessionConfig`], built via its
//! [`SessionConfigBuilder`]. There is deliberately very little to tune: the
//! model identifier is fixed and the request body has no user-configurable
//! fields. What remains is where requests go and how wide PDF pages are
//! rasterised.

use crate::error::StudyError;
use std::path::PathBuf;

/// Responses-style endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/responses";

/// Model identifier sent with every request. Not configurable.
pub const MODEL: &str = "gpt-4.1-mini";

/// Configuration for a [`crate::session::StudySession`].
///
/// # Example
/// ```rust
/// use edgequake_study::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .viewport_width(1024)
///     .max_page_width(900)
///     .build()
///     .unwrap();
/// assert_eq!(config.render_width(), 900);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Where requests are POSTed. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Width of the surface the page is shown on, in pixels. Default: 1280.
    pub viewport_width: u32,

    /// Horizontal space subtracted from the viewport before sizing a page.
    /// Default: 48.
    pub page_margin: u32,

    /// Upper bound on the rendered page width, in pixels. Default: 1100.
    ///
    /// Wider renders only inflate the request body; the model reads a
    /// 1100 px page as well as a 2000 px one.
    pub max_page_width: u32,

    /// Directory (or full path) of an existing libpdfium. When `None` the
    /// system library search path is used.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            viewport_width: 1280,
            page_margin: 48,
            max_page_width: 1100,
            pdfium_lib_path: None,
        }
    }
}

impl SessionConfig {
    /// Create a new builder for `SessionConfig`.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Target raster width: `min(viewport - margin, max_page_width)`, never 0.
    pub fn render_width(&self) -> u32 {
        self.viewport_width
            .saturating_sub(self.page_margin)
            .min(self.max_page_width)
            .max(1)
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn viewport_width(mut self, px: u32) -> Self {
        self.config.viewport_width = px;
        self
    }

    pub fn page_margin(mut self, px: u32) -> Self {
        self.config.page_margin = px;
        self
    }

    pub fn max_page_width(mut self, px: u32) -> Self {
        self.config.max_page_width = px.max(1);
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SessionConfig, StudyError> {
        let c = &self.config;
        if c.viewport_width <= c.page_margin {
            return Err(StudyError::InvalidConfig(format!(
                "viewport width ({}) must be larger than the page margin ({})",
                c.viewport_width, c.page_margin
            )));
        }
        let endpoint = c.endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(StudyError::InvalidConfig(format!(
                "endpoint must be an http(s) URL, got '{}'",
                c.endpoint
            )));
        }
        Ok(self.config)
    }
}
