pub mod gemini;

use serde::Serialize;

use crate::core::error::AnswerError;
use crate::core::{EncodedImage, Frame};

pub use gemini::GeminiClient;

pub const EMPTY_QUESTION_TEXT: &str = "Please ask a question about what I have seen.";
pub const NOTHING_OBSERVED_TEXT: &str =
    "I haven't seen anything yet! Start recording and let me watch for a while first.";
pub const ANSWER_FAILED_TEXT: &str =
    "I'm having trouble reaching the answering service. Please check the API key and network.";

/// Remote question answering over a list of stills.
pub trait AnswerClient: Send + Sync {
    /// `images` are in capture order; the question is sent after them.
    fn answer(&self, question: &str, images: &[EncodedImage]) -> Result<String, AnswerError>;
}

/// Stand-in used when no API key is configured; every call fails.
pub struct Unconfigured {
    pub var: String,
}

impl AnswerClient for Unconfigured {
    fn answer(&self, _question: &str, _images: &[EncodedImage]) -> Result<String, AnswerError> {
        Err(AnswerError::MissingApiKey {
            var: self.var.clone(),
        })
    }
}

/// Result of one question/answer exchange, always safe to show to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub ok: bool,
    pub text: String,
}

impl Answer {
    fn fallback(text: &str) -> Self {
        Self {
            ok: false,
            text: text.to_string(),
        }
    }
}

/// Asks `client` about `frames`. Never fails: a blank question or an empty
/// frame list short-circuits without calling the client, and client errors
/// become a fixed explanation.
pub fn ask(client: &dyn AnswerClient, question: &str, frames: &[Frame]) -> Answer {
    let question = question.trim();
    if question.is_empty() {
        return Answer::fallback(EMPTY_QUESTION_TEXT);
    }
    if frames.is_empty() {
        log::info!("[answer] no frames buffered yet, not calling answering service");
        return Answer::fallback(NOTHING_OBSERVED_TEXT);
    }

    let images: Vec<EncodedImage> = frames.iter().map(|f| f.image().clone()).collect();
    log::debug!(
        "[answer] asking with {} frames (seq {}..={})",
        images.len(),
        frames[0].seq(),
        frames[frames.len() - 1].seq()
    );

    match client.answer(question, &images) {
        Ok(text) => Answer { ok: true, text },
        Err(err) => {
            log::error!("[answer] answering service failed: {}", err);
            Answer::fallback(ANSWER_FAILED_TEXT)
        }
    }
}
