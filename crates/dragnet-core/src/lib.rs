pub mod aggregate;
pub mod analytics;
pub mod artifact;
pub mod document;
pub mod enrich;
pub mod entity;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod relationship;
pub mod storage;

pub use aggregate::RelationshipAggregator;
pub use analytics::{
    AnalyticsConfig, AnalyticsEngine, AnalyticsError, AnalyticsReport, AnalyticsResult,
    RelationshipGraph,
};
pub use artifact::{ArtifactError, ArtifactStore, FsArtifactStore};
pub use document::{decode_document, DocumentEvent, DocumentPayload, InputError};
pub use enrich::{
    ContextEnricher, EnrichError, EnrichedDocument, LexiconScorer, MatchStrategy, RecordsByType,
    RuleSegmenter, SentenceSegmenter, SentimentScorer,
};
pub use entity::{EntityRecord, EntityRef, EntityType, Occurrence, SentimentLabel, SentimentScore};
pub use error::{Error, Result};
pub use extract::{EntityExtractor, PatternSet, ValuesByType};
pub use fetch::{DocumentFetcher, FetchError, FsFetcher, HttpFetcher};
pub use pipeline::{BatchOutcome, DocumentOutcome, DocumentPipeline, PipelineConfig, PipelineError};
pub use relationship::Relationship;
pub use storage::{DocumentSummary, Storage, StoredRelationship};
