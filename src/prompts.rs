//! System prompts for vision-model text recognition.
//!
//! Kept in one place so the transcription rules can be inspected by tests
//! and changed without touching retry or error-handling code.
//!
//! Callers can override the default via [`crate::config::ReflowConfig::system_prompt`].

/// Default system prompt for transcribing a page image line by line.
///
/// The recognised lines become the editable text of a scanned page, so the
/// model must return plain text only, one output line per visual line.
pub const OCR_SYSTEM_PROMPT: &str = r#"You are a precise OCR engine. Transcribe the text visible in the image.

Follow these rules precisely:

1. TEXT PRESERVATION
   - Transcribe ALL visible text exactly as written, including numbers and punctuation
   - Do not correct spelling, translate, summarise or complete partial words

2. ORDER
   - Read from top to bottom; within a line, left to right
   - Output one line of text for each visual line in the image

3. OUTPUT FORMAT
   - Output ONLY the transcribed text as plain text
   - Do NOT use Markdown, bullet markers, headings or tables
   - Do NOT wrap the answer in ``` fences
   - Do NOT add commentary, explanations or descriptions of images
   - If the image contains no text, output nothing"#;
