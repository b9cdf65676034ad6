//! Text recognition: raster in, ordered lines out.
//!
//! The extractor only needs "given an image, produce the text lines on it",
//! expressed as the [`TextRecognizer`] trait. Any closure with the right
//! signature is a recognizer, which is what the tests use.
//!
//! [`VisionRecognizer`] is the production implementation: it sends the page
//! PNG to a vision LLM through `edgequake-llm` and cleans the transcription.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient. Exponential backoff
//! (`retry_backoff_ms * 2^(attempt-1)`) with 500 ms base and 3 retries waits
//! 500 ms → 1 s → 2 s before giving up on a page.

use crate::config::ReflowConfig;
use crate::error::{RecognitionError, ReflowError};
use crate::pipeline::{encode, postprocess};
use crate::prompts::OCR_SYSTEM_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use image::DynamicImage;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Model used when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Recognise the text lines on a raster, top to bottom as the backend
/// returns them.
pub trait TextRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, RecognitionError>;
}

impl<F> TextRecognizer for F
where
    F: Fn(&DynamicImage) -> Result<Vec<String>, RecognitionError>,
{
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, RecognitionError> {
        self(image)
    }
}

/// Recognizer backed by a vision LLM.
///
/// Calls are driven on `handle` with `Handle::block_on`, so `recognize` must
/// run on a thread that is not itself executing async code (a
/// `spawn_blocking` worker or a plain thread).
pub struct VisionRecognizer {
    handle: Handle,
    config: ReflowConfig,
    provider: OnceLock<Result<Arc<dyn LLMProvider>, String>>,
}

impl VisionRecognizer {
    pub fn new(handle: Handle, config: ReflowConfig) -> Self {
        Self {
            handle,
            config,
            provider: OnceLock::new(),
        }
    }

    /// Resolved on first use so documents with a text layer never need
    /// credentials.
    fn provider(&self) -> Result<Arc<dyn LLMProvider>, RecognitionError> {
        self.provider
            .get_or_init(|| resolve_provider(&self.config).map_err(|e| e.to_string()))
            .clone()
            .map_err(RecognitionError::Unavailable)
    }

    async fn transcribe(
        &self,
        provider: Arc<dyn LLMProvider>,
        image_data: ImageData,
    ) -> Result<Vec<String>, RecognitionError> {
        let config = &self.config;
        let start = Instant::now();
        let system_prompt = config
            .system_prompt
            .as_deref()
            .unwrap_or(OCR_SYSTEM_PROMPT);

        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user_with_images("", vec![image_data]),
        ];
        let options = build_options(config);
        let call_timeout = Duration::from_secs(config.api_timeout_secs);

        let mut last_err: Option<String> = None;

        for attempt in 0..=config.max_retries {
            if attempt > 0 {
                let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Recognition retry {}/{} after {}ms",
                    attempt, config.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match timeout(call_timeout, provider.chat(&messages, Some(&options))).await {
                Ok(Ok(response)) => {
                    debug!(
                        "Recognised page: {} input tokens, {} output tokens, {:?}",
                        response.prompt_tokens,
                        response.completion_tokens,
                        start.elapsed()
                    );
                    return Ok(postprocess::recognized_lines(&response.content));
                }
                Ok(Err(e)) => {
                    warn!("Recognition attempt {} failed: {}", attempt + 1, e);
                    last_err = Some(e.to_string());
                }
                Err(_) => {
                    warn!(
                        "Recognition attempt {} timed out after {}s",
                        attempt + 1,
                        config.api_timeout_secs
                    );
                    last_err = Some(format!("timed out after {}s", config.api_timeout_secs));
                }
            }
        }

        Err(RecognitionError::Failed {
            attempts: config.max_retries + 1,
            detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

impl TextRecognizer for VisionRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, RecognitionError> {
        let provider = self.provider()?;
        let image_data =
            encode::encode_page(image).map_err(|e| RecognitionError::Encoding(e.to_string()))?;
        self.handle.block_on(self.transcribe(provider, image_data))
    }
}

fn build_options(config: &ReflowConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ReflowError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReflowError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the vision provider, from most to least specific:
///
/// 1. `config.provider`, used as-is
/// 2. `config.provider_name` with `config.model`
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 4. OpenAI, when `OPENAI_API_KEY` is set
/// 5. `ProviderFactory::from_env` auto-detection
pub fn resolve_provider(config: &ReflowConfig) -> Result<Arc<dyn LLMProvider>, ReflowError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_vision_provider(&prov, &env_model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_vision_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReflowError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No vision provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn blank() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255])))
    }

    #[test]
    fn closures_are_recognizers() {
        let fake = |img: &DynamicImage| -> Result<Vec<String>, RecognitionError> {
            Ok(vec![format!("{}x{}", img.width(), img.height())])
        };
        assert_eq!(fake.recognize(&blank()).unwrap(), vec!["8x8"]);
    }

    #[test]
    fn recognizer_errors_pass_through() {
        let failing = |_: &DynamicImage| -> Result<Vec<String>, RecognitionError> {
            Err(RecognitionError::Unavailable("offline".into()))
        };
        assert!(matches!(
            failing.recognize(&blank()),
            Err(RecognitionError::Unavailable(_))
        ));
    }

    #[test]
    fn options_follow_config() {
        let config = ReflowConfig::builder()
            .temperature(0.3)
            .max_tokens(1024)
            .build()
            .unwrap();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.3));
        assert_eq!(opts.max_tokens, Some(1024));
    }
}
