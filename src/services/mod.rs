pub mod accumulator;
pub mod aggregator;
pub mod catalog;
pub mod generator;
pub mod parser;
pub mod quiz;
pub mod recommendations;
pub mod resolver;

pub use aggregator::ResolutionAggregator;
pub use quiz::{QuizService, SessionStore};
pub use recommendations::{RecommendationPipeline, RoundOutcome};
pub use resolver::{CatalogResolver, MatchPolicy};
