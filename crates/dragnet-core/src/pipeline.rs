//! Event-driven document pipeline: fetch, decode, extract, enrich,
//! aggregate, persist, then snapshot. One inbound event processes one
//! document; batches isolate failures per document.

use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::aggregate::RelationshipAggregator;
use crate::artifact::{analysis_key, ArtifactError, ArtifactStore};
use crate::document::{decode_document, DocumentEvent, InputError};
use crate::enrich::{ContextEnricher, EnrichError, EnrichedDocument, MatchStrategy};
use crate::extract::{EntityExtractor, PatternError};
use crate::fetch::{DocumentFetcher, FetchError, FsFetcher};
use crate::relationship::Relationship;
use crate::storage::{DocumentSummary, Storage};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Enrichment error: {0}")]
    Enrich(#[from] EnrichError),

    #[error("Storage error: {0}")]
    Store(#[from] crate::Error),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

impl PipelineError {
    /// True when the document itself is unusable. Retrying the same event
    /// cannot succeed; the document owner has to fix the input.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    /// True when an external capability failed. The event is safe to
    /// retry once that capability recovers.
    #[must_use]
    pub fn is_capability_error(&self) -> bool {
        matches!(
            self,
            Self::Fetch(_) | Self::Enrich(_) | Self::Store(_) | Self::Artifact(_)
        )
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Tuning carried into the enricher.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub match_strategy: MatchStrategy,
    /// Sentences on each side of an occurrence in its context window.
    pub context_radius: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            match_strategy: MatchStrategy::default(),
            context_radius: 1,
        }
    }
}

/// Everything one processed document produced.
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub document_id: String,
    pub source: String,
    pub entity_count: usize,
    pub relationship_count: usize,
    pub sentence_count: usize,
    pub artifact_key: String,
    pub duration_ms: u64,
}

/// Result of a batch run. Failed documents never abort the batch; they
/// land here with the error that sidelined them.
pub struct BatchOutcome {
    pub successful: Vec<DocumentOutcome>,
    pub failed: Vec<(String, PipelineError)>,
}

impl BatchOutcome {
    #[must_use]
    pub fn new() -> Self {
        Self {
            successful: Vec::new(),
            failed: Vec::new(),
        }
    }

    fn add_success(&mut self, outcome: DocumentOutcome) {
        self.successful.push(outcome);
    }

    fn add_failure(&mut self, source: String, error: PipelineError) {
        self.failed.push((source, error));
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successful.len()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    #[must_use]
    pub fn total_entities(&self) -> usize {
        self.successful.iter().map(|o| o.entity_count).sum()
    }

    #[must_use]
    pub fn total_relationships(&self) -> usize {
        self.successful.iter().map(|o| o.relationship_count).sum()
    }
}

impl Default for BatchOutcome {
    fn default() -> Self {
        Self::new()
    }
}

/// End-to-end processor for inbound document events.
///
/// Defaults pair the filesystem fetcher with the built-in patterns, rule
/// segmenter, and lexicon scorer; every seam is replaceable through the
/// `with_*` builders.
pub struct DocumentPipeline {
    fetcher: Box<dyn DocumentFetcher>,
    extractor: EntityExtractor,
    enricher: ContextEnricher,
    aggregator: RelationshipAggregator,
}

impl DocumentPipeline {
    pub fn new() -> Result<Self, PatternError> {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Result<Self, PatternError> {
        Ok(Self {
            fetcher: Box::new(FsFetcher::new()),
            extractor: EntityExtractor::new()?,
            enricher: ContextEnricher::new()
                .with_strategy(config.match_strategy)
                .with_context_radius(config.context_radius),
            aggregator: RelationshipAggregator::new(),
        })
    }

    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Box<dyn DocumentFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: EntityExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn with_enricher(mut self, enricher: ContextEnricher) -> Self {
        self.enricher = enricher;
        self
    }

    /// Process one document event: fetch and decode the content, extract
    /// and enrich entities, aggregate relationships, persist the document
    /// snapshot, then write the analysis artifact.
    pub async fn process(
        &self,
        event: &DocumentEvent,
        storage: &Storage,
        artifacts: &dyn ArtifactStore,
    ) -> PipelineResult<DocumentOutcome> {
        let start = Instant::now();

        let payload = self.fetcher.fetch(event).await?;
        let text = decode_document(&payload)?;
        let values = self.extractor.extract(&text);
        let enriched = self.enricher.enrich(&text, &values).await?;
        let relationships = self.aggregator.aggregate(&enriched.records);

        let document_id = event.document_id();
        let summary = DocumentSummary {
            id: document_id.clone(),
            source: event.source.clone(),
            content_type: payload.content_type.clone(),
            size_bytes: payload.data.len() as u64,
            processed_at: Utc::now(),
            entity_count: enriched.entity_count() as u32,
            relationship_count: relationships.len() as u32,
        };
        storage
            .store_document(&summary, &enriched.records, &relationships)
            .await?;

        let artifact_key = analysis_key(&event.stem(), Uuid::now_v7());
        let snapshot = analysis_snapshot(&summary, &enriched, &relationships)?;
        artifacts.put_json(&artifact_key, &snapshot).await?;

        tracing::info!(
            "Processed {}: {} entities, {} relationships",
            event.source,
            enriched.entity_count(),
            relationships.len()
        );

        Ok(DocumentOutcome {
            document_id,
            source: event.source.clone(),
            entity_count: enriched.entity_count(),
            relationship_count: relationships.len(),
            sentence_count: enriched.sentence_count(),
            artifact_key,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Process a batch of events. A failing document is logged and
    /// recorded without touching its siblings.
    pub async fn process_batch(
        &self,
        events: &[DocumentEvent],
        storage: &Storage,
        artifacts: &dyn ArtifactStore,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::new();

        for event in events {
            match self.process(event, storage, artifacts).await {
                Ok(result) => outcome.add_success(result),
                Err(error) => {
                    tracing::warn!("Skipping {}: {}", event.source, error);
                    outcome.add_failure(event.source.clone(), error);
                }
            }
        }

        outcome
    }
}

/// The per-document JSON artifact: the full enrichment output plus the
/// summary counts a reader scans first.
fn analysis_snapshot(
    document: &DocumentSummary,
    enriched: &EnrichedDocument,
    relationships: &[Relationship],
) -> Result<serde_json::Value, ArtifactError> {
    let entity_counts: serde_json::Map<String, serde_json::Value> = enriched
        .records
        .iter()
        .map(|(entity_type, records)| (entity_type.as_str().to_string(), records.len().into()))
        .collect();

    Ok(serde_json::json!({
        "source": document.source,
        "document_id": document.id,
        "content_type": document.content_type,
        "size_bytes": document.size_bytes,
        "processed_at": document.processed_at,
        "entities": serde_json::to_value(&enriched.records)?,
        "relationships": serde_json::to_value(relationships)?,
        "summary": {
            "entity_counts": entity_counts,
            "relationship_count": relationships.len(),
            "sentence_count": enriched.sentence_count(),
        },
    }))
}
