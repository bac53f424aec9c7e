use crate::{
    error::{AppError, AppResult},
    models::{GeneratorReply, ResolvedItem},
    services::{aggregator::ResolutionAggregator, generator::GeneratorClient, parser},
};

/// Result of one generate → parse → resolve cycle
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    Clarification {
        question: String,
    },
    Recommendations {
        summary: String,
        items: Vec<ResolvedItem>,
    },
}

impl RoundOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            RoundOutcome::Clarification { .. } => "clarification",
            RoundOutcome::Recommendations { .. } => "recommendations",
        }
    }
}

/// Turns free-text intent into catalog-backed recommendations
///
/// Generation and parsing failures abort the round. Catalog failures for
/// individual candidates only shorten the result.
#[derive(Clone)]
pub struct RecommendationPipeline {
    generator: GeneratorClient,
    aggregator: ResolutionAggregator,
}

impl RecommendationPipeline {
    pub fn new(generator: GeneratorClient, aggregator: ResolutionAggregator) -> Self {
        Self {
            generator,
            aggregator,
        }
    }

    pub async fn run_round(
        &self,
        user_intent: &str,
        exclusion_titles: &[String],
    ) -> AppResult<RoundOutcome> {
        let raw = self.generator.generate(user_intent, exclusion_titles).await?;

        match parser::parse(&raw)? {
            GeneratorReply::Clarification { question } => {
                tracing::info!("Generator asked for clarification");
                Ok(RoundOutcome::Clarification { question })
            }
            GeneratorReply::Recommendations(draft) => {
                let items = self.aggregator.aggregate(&draft).await;

                tracing::info!(
                    candidates = draft.candidates.len(),
                    resolved = items.len(),
                    "Recommendation round completed"
                );

                Ok(RoundOutcome::Recommendations {
                    summary: draft.summary_text,
                    items,
                })
            }
        }
    }
}

/// Builds a generator intent from the tags a finished quiz produced
pub fn intent_from_tags(tags: &[String]) -> AppResult<String> {
    let mut cleaned: Vec<&str> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }

    if cleaned.is_empty() {
        return Err(AppError::Validation("tags required".to_string()));
    }

    Ok(format!(
        "Recommend movies for someone whose taste is described by these preferences: {}.",
        cleaned.join(", ")
    ))
}
