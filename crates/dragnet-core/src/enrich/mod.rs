mod enricher;
mod segment;
mod sentiment;

pub use enricher::{
    ContextEnricher, EnrichError, EnrichResult, EnrichedDocument, MatchStrategy, RecordsByType,
};
pub use segment::{RuleSegmenter, SentenceSegmenter};
pub use sentiment::{LexiconScorer, SentimentScorer};
