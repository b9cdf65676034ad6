//! Configuration for extraction, remapping and rendering.
//!
//! Every constant the pipeline relies on lives in [`ReflowConfig`], built via
//! its [`ReflowConfigBuilder`]. The layout constants (font floor, line pitch,
//! margins, fallback font) shape both flow-mode remapping and the renderer;
//! the raster and recognizer settings only matter for scanned input.

use crate::error::ReflowError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Font identifier substituted whenever no font can be resolved.
pub const DEFAULT_FALLBACK_FONT: &str = "Helvetica";

/// Configuration for a document round trip.
///
/// Built via [`ReflowConfig::builder()`] or using [`ReflowConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdfedit::ReflowConfig;
///
/// let config = ReflowConfig::builder()
///     .dpi(200)
///     .min_font_size(11.0)
///     .fallback_font("Times-Roman")
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Clone)]
pub struct ReflowConfig {
    // ── Layout constants ─────────────────────────────────────────────────
    /// Smallest font size ever rendered, in page units. Default: 12.
    pub min_font_size: f32,

    /// Gap added below each flow-mode line. Default: 2.
    pub line_gap: f32,

    /// Flow-mode font size is `page height / lines_per_page`, floored at
    /// `min_font_size`. Default: 60.
    pub lines_per_page: f32,

    /// Top of the first flow-mode line and top edge of the OCR printable
    /// region. Default: 40.
    pub top_margin: f32,

    /// Left edge of flow-mode lines and of the OCR printable region. Default: 40.
    pub left_margin: f32,

    /// Font identifier used when a block carries no resolvable font. Default: Helvetica.
    pub fallback_font: String,

    // ── Rasterisation ────────────────────────────────────────────────────
    /// DPI used when rasterising scanned PDF pages. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Longest raster edge in pixels, independent of DPI. Default: 2000.
    ///
    /// Also bounds the size of the background image carried into the output.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit libpdfium location. Falls back to `PDFIUM_LIB_PATH`, the
    /// working directory and finally the system library search path.
    pub pdfium_library_path: Option<PathBuf>,

    // ── Recognition ──────────────────────────────────────────────────────
    /// Vision model identifier, e.g. "gpt-4.1-nano".
    pub model: Option<String>,

    /// Provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for transcription. Default: 0.0.
    pub temperature: f32,

    /// Maximum tokens the recognizer may generate per page. Default: 4096.
    pub max_tokens: usize,

    /// Retry attempts on a failed recognition call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled after each attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call recognizer timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Custom transcription prompt. If None, uses the built-in one.
    pub system_prompt: Option<String>,

    // ── Input ────────────────────────────────────────────────────────────
    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self {
            min_font_size: 12.0,
            line_gap: 2.0,
            lines_per_page: 60.0,
            top_margin: 40.0,
            left_margin: 40.0,
            fallback_font: DEFAULT_FALLBACK_FONT.to_string(),
            dpi: 150,
            max_rendered_pixels: 2000,
            password: None,
            pdfium_library_path: None,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            system_prompt: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReflowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflowConfig")
            .field("min_font_size", &self.min_font_size)
            .field("line_gap", &self.line_gap)
            .field("lines_per_page", &self.lines_per_page)
            .field("top_margin", &self.top_margin)
            .field("left_margin", &self.left_margin)
            .field("fallback_font", &self.fallback_font)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("max_retries", &self.max_retries)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ReflowProgressCallback>"),
            )
            .finish()
    }
}

impl ReflowConfig {
    /// Create a new builder for `ReflowConfig`.
    pub fn builder() -> ReflowConfigBuilder {
        ReflowConfigBuilder {
            config: Self::default(),
        }
    }

    /// Flow-mode font size for a page of the given height.
    pub fn flow_font_size(&self, page_height: f32) -> f32 {
        (page_height / self.lines_per_page).max(self.min_font_size)
    }

    /// Flow-mode vertical distance between consecutive line tops.
    pub fn line_pitch(&self, page_height: f32) -> f32 {
        self.flow_font_size(page_height) + self.line_gap
    }
}

/// Builder for [`ReflowConfig`].
#[derive(Debug)]
pub struct ReflowConfigBuilder {
    config: ReflowConfig,
}

impl ReflowConfigBuilder {
    pub fn min_font_size(mut self, size: f32) -> Self {
        self.config.min_font_size = size;
        self
    }

    pub fn line_gap(mut self, gap: f32) -> Self {
        self.config.line_gap = gap;
        self
    }

    pub fn lines_per_page(mut self, lines: f32) -> Self {
        self.config.lines_per_page = lines;
        self
    }

    pub fn top_margin(mut self, margin: f32) -> Self {
        self.config.top_margin = margin;
        self
    }

    pub fn left_margin(mut self, margin: f32) -> Self {
        self.config.left_margin = margin;
        self
    }

    pub fn fallback_font(mut self, font: impl Into<String>) -> Self {
        self.config.fallback_font = font.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReflowConfig, ReflowError> {
        let c = &self.config;
        if !(c.min_font_size.is_finite() && c.min_font_size > 0.0) {
            return Err(ReflowError::InvalidConfig(format!(
                "Minimum font size must be > 0, got {}",
                c.min_font_size
            )));
        }
        if !(c.lines_per_page.is_finite() && c.lines_per_page > 0.0) {
            return Err(ReflowError::InvalidConfig(format!(
                "Lines per page must be > 0, got {}",
                c.lines_per_page
            )));
        }
        if c.line_gap < 0.0 || c.top_margin < 0.0 || c.left_margin < 0.0 {
            return Err(ReflowError::InvalidConfig(
                "Line gap and margins must be ≥ 0".into(),
            ));
        }
        if c.fallback_font.trim().is_empty() {
            return Err(ReflowError::InvalidConfig(
                "Fallback font must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_layout() {
        let c = ReflowConfig::default();
        assert_eq!(c.min_font_size, 12.0);
        assert_eq!(c.line_gap, 2.0);
        assert_eq!(c.top_margin, 40.0);
        assert_eq!(c.left_margin, 40.0);
        assert_eq!(c.fallback_font, "Helvetica");
    }

    #[test]
    fn flow_font_size_floors_at_minimum() {
        let c = ReflowConfig::default();
        // 600 / 60 = 10 → floored to 12
        assert_eq!(c.flow_font_size(600.0), 12.0);
        // 1800 / 60 = 30
        assert_eq!(c.flow_font_size(1800.0), 30.0);
        assert_eq!(c.line_pitch(1800.0), 32.0);
    }

    #[test]
    fn builder_clamps_dpi() {
        let c = ReflowConfig::builder().dpi(1000).build().unwrap();
        assert_eq!(c.dpi, 400);
        let c = ReflowConfig::builder().dpi(10).build().unwrap();
        assert_eq!(c.dpi, 72);
    }

    #[test]
    fn builder_rejects_zero_font_size() {
        let err = ReflowConfig::builder().min_font_size(0.0).build().unwrap_err();
        assert!(matches!(err, ReflowError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_empty_fallback_font() {
        let err = ReflowConfig::builder().fallback_font("  ").build().unwrap_err();
        assert!(err.to_string().contains("Fallback font"));
    }

    #[test]
    fn debug_hides_provider() {
        let c = ReflowConfig::default();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("ReflowConfig"));
        assert!(dbg.contains("min_font_size"));
    }
}
