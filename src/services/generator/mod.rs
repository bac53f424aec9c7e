/// Generator client and the generative text backends behind it
///
/// The client owns prompt construction; backends only move a prompt to a
/// model and bring the text back. A call is a single round trip: no timeout,
/// no retry, no cancellation.
use std::sync::Arc;
use std::time::Instant;

use crate::error::{AppError, AppResult};
use crate::models::MAX_CANDIDATES;

pub mod gemini;
pub mod openai;

pub use gemini::GeminiGenerator;
pub use openai::OpenAiGenerator;

/// Generative text capability: one prompt in, raw text out
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> AppResult<String>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Builds recommendation prompts and sends them to a [`TextGenerator`]
#[derive(Clone)]
pub struct GeneratorClient {
    backend: Arc<dyn TextGenerator>,
}

impl GeneratorClient {
    pub fn new(backend: Arc<dyn TextGenerator>) -> Self {
        Self { backend }
    }

    /// Asks the model for recommendations matching `user_intent`, steering it
    /// away from every title in `exclusion_titles`
    ///
    /// Any backend failure is a generation error. The reply text is returned
    /// as-is, even when empty; judging its shape is the parser's job.
    pub async fn generate(&self, user_intent: &str, exclusion_titles: &[String]) -> AppResult<String> {
        let prompt = build_prompt(user_intent, exclusion_titles);
        let started = Instant::now();

        let raw = self.backend.complete(&prompt).await.map_err(|e| match e {
            AppError::Generation(_) => e,
            other => AppError::Generation(other.to_string()),
        })?;

        tracing::info!(
            backend = self.backend.name(),
            excluded = exclusion_titles.len(),
            reply_len = raw.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generator call completed"
        );

        Ok(raw)
    }
}

/// Builds the single instruction prompt for one round
///
/// The exclusion clause is only present when there is something to exclude.
pub fn build_prompt(user_intent: &str, exclusion_titles: &[String]) -> String {
    let mut prompt = format!(
        "You are a movie recommendation assistant. Recommend movies for the request below.\n\
         \n\
         Request: \"{intent}\"\n\
         \n\
         Respond ONLY with a JSON object of exactly this shape and nothing else:\n\
         {{\n\
         \x20 \"message\": \"a short, friendly summary of your recommendations\",\n\
         \x20 \"recommendations\": [\n\
         \x20   {{\"title\": \"movie title\", \"year\": 2010, \"reason\": \"one or two sentences on why it fits the request\"}}\n\
         \x20 ]\n\
         }}\n\
         \n\
         Recommend at most {max} movies. Use each movie's original title as listed in \
         major movie databases and its original release year.",
        intent = user_intent.trim(),
        max = MAX_CANDIDATES,
    );

    if !exclusion_titles.is_empty() {
        let quoted: Vec<String> = exclusion_titles
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect();
        prompt.push_str(&format!(
            "\n\nThe user has already seen these movies. Do NOT recommend any of them again: {}.",
            quoted.join(", ")
        ));
    }

    prompt
}
