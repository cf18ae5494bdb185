use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{EntityRecord, EntityType, Occurrence, SentimentScore};
use crate::extract::ValuesByType;

use super::segment::{RuleSegmenter, SentenceSegmenter};
use super::sentiment::{LexiconScorer, SentimentScorer};

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Segmentation failed: {0}")]
    Segmentation(String),
    #[error("Sentiment scoring failed: {0}")]
    Sentiment(String),
}

pub type EnrichResult<T> = Result<T, EnrichError>;

/// How an entity value is located inside a sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Plain substring containment.
    #[default]
    Substring,
    /// Substring containment where the match may not be flanked by
    /// alphanumeric characters on either side.
    TokenBoundary,
}

impl MatchStrategy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Substring => "substring",
            Self::TokenBoundary => "token_boundary",
        }
    }

    /// True when `value` occurs in `sentence` under this strategy.
    #[must_use]
    pub fn matches(&self, sentence: &str, value: &str) -> bool {
        match self {
            Self::Substring => sentence.contains(value),
            Self::TokenBoundary => token_bounded(sentence, value),
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchStrategy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "substring" => Ok(Self::Substring),
            "token_boundary" => Ok(Self::TokenBoundary),
            other => Err(crate::Error::InvalidMatchStrategy(other.to_string())),
        }
    }
}

/// Enrichment output: the document's sentences plus, per type, the entity
/// records carrying occurrences and sentiment.
pub type RecordsByType = BTreeMap<EntityType, Vec<EntityRecord>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedDocument {
    pub sentences: Vec<String>,
    pub records: RecordsByType,
}

impl EnrichedDocument {
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }
}

/// Attaches context windows and sentiment to extracted entity values.
///
/// Every value keeps its record even when it never occurs verbatim in a
/// sentence (a normalized phone number rarely does); such records carry
/// zero occurrences and an average sentiment of 0.
pub struct ContextEnricher {
    segmenter: Box<dyn SentenceSegmenter>,
    scorer: Box<dyn SentimentScorer>,
    strategy: MatchStrategy,
    context_radius: usize,
}

impl ContextEnricher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            segmenter: Box::new(RuleSegmenter::new()),
            scorer: Box::new(LexiconScorer::new()),
            strategy: MatchStrategy::default(),
            context_radius: 1,
        }
    }

    #[must_use]
    pub fn with_segmenter(mut self, segmenter: Box<dyn SentenceSegmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    #[must_use]
    pub fn with_scorer(mut self, scorer: Box<dyn SentimentScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sentences included on each side of an occurrence in its context
    /// window. Zero narrows the window to the matching sentence alone.
    #[must_use]
    pub fn with_context_radius(mut self, radius: usize) -> Self {
        self.context_radius = radius;
        self
    }

    pub async fn enrich(&self, text: &str, values: &ValuesByType) -> EnrichResult<EnrichedDocument> {
        let sentences = self.segmenter.segment(text).await?;

        // One score per sentence, computed on first demand.
        let mut scores: Vec<Option<SentimentScore>> = vec![None; sentences.len()];
        let mut records = RecordsByType::new();

        for (&entity_type, type_values) in values {
            let mut list = Vec::with_capacity(type_values.len());

            for value in type_values {
                let mut record = EntityRecord::new(value);

                for (index, sentence) in sentences.iter().enumerate() {
                    if !self.strategy.matches(sentence, value) {
                        continue;
                    }

                    let sentiment = match scores[index] {
                        Some(score) => score,
                        None => {
                            let score = self.scorer.score(sentence).await?;
                            scores[index] = Some(score);
                            score
                        }
                    };

                    record.push_occurrence(Occurrence {
                        sentence_index: index,
                        context: context_window(&sentences, index, self.context_radius),
                        sentiment,
                    });
                }

                list.push(record);
            }

            records.insert(entity_type, list);
        }

        Ok(EnrichedDocument { sentences, records })
    }
}

impl Default for ContextEnricher {
    fn default() -> Self {
        Self::new()
    }
}

fn token_bounded(sentence: &str, value: &str) -> bool {
    if value.is_empty() {
        return false;
    }

    let mut from = 0;
    while let Some(found) = sentence[from..].find(value) {
        let start = from + found;
        let end = start + value.len();

        let clear_before = sentence[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let clear_after = sentence[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());

        if clear_before && clear_after {
            return true;
        }

        let step = sentence[start..].chars().next().map_or(1, char::len_utf8);
        from = start + step;
    }

    false
}

/// Context for an occurrence at `index`: the sentence plus up to `radius`
/// neighbors on each side, joined with a single space.
fn context_window(sentences: &[String], index: usize, radius: usize) -> String {
    let start = index.saturating_sub(radius);
    let end = (index + radius).min(sentences.len().saturating_sub(1));
    sentences[start..=end].join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::EntityExtractor;

    async fn enrich_text(text: &str) -> EnrichedDocument {
        let extractor = EntityExtractor::new().unwrap();
        let values = extractor.extract(text);
        ContextEnricher::new().enrich(text, &values).await.unwrap()
    }

    #[tokio::test]
    async fn context_covers_adjacent_sentences() {
        let text = "The intro sentence. Mail jane@x.com for details. A closing sentence.";
        let enriched = enrich_text(text).await;

        let emails = &enriched.records[&EntityType::Email];
        let occurrence = &emails[0].occurrences[0];

        assert_eq!(occurrence.sentence_index, 1);
        assert_eq!(
            occurrence.context,
            "The intro sentence. Mail jane@x.com for details. A closing sentence."
        );
    }

    #[tokio::test]
    async fn context_clamps_at_document_edges() {
        let enriched = enrich_text("Mail jane@x.com today. Nothing else here.").await;
        let occurrence = &enriched.records[&EntityType::Email][0].occurrences[0];

        assert_eq!(occurrence.sentence_index, 0);
        assert_eq!(occurrence.context, "Mail jane@x.com today. Nothing else here.");
    }

    #[tokio::test]
    async fn context_radius_zero_keeps_only_the_sentence() {
        let text = "The intro sentence. Mail jane@x.com for details. A closing sentence.";
        let extractor = EntityExtractor::new().unwrap();
        let values = extractor.extract(text);
        let enriched = ContextEnricher::new()
            .with_context_radius(0)
            .enrich(text, &values)
            .await
            .unwrap();

        let occurrence = &enriched.records[&EntityType::Email][0].occurrences[0];
        assert_eq!(occurrence.context, "Mail jane@x.com for details.");
    }

    #[tokio::test]
    async fn normalized_values_missing_from_text_keep_empty_records() {
        let enriched = enrich_text("Call 555-123-4567 about jane@x.com. It went great.").await;

        let phones = &enriched.records[&EntityType::Phone];
        assert_eq!(phones[0].value, "5551234567");
        assert!(phones[0].occurrences.is_empty());
        assert!((phones[0].average_sentiment).abs() < f64::EPSILON);

        let emails = &enriched.records[&EntityType::Email];
        assert_eq!(emails[0].occurrence_count(), 1);
    }

    #[tokio::test]
    async fn histogram_matches_occurrence_count() {
        let enriched =
            enrich_text("jane@x.com closed a great deal. Later jane@x.com faced a scam.").await;

        let record = &enriched.records[&EntityType::Email][0];
        assert_eq!(record.occurrence_count(), 2);
        assert_eq!(record.sentiment_counts.total(), 2);
        assert_eq!(record.sentiment_counts.positive, 1);
        assert_eq!(record.sentiment_counts.negative, 1);
    }

    #[test]
    fn token_boundary_rejects_embedded_matches() {
        assert!(MatchStrategy::Substring.matches("concatenate words", "cat"));
        assert!(!MatchStrategy::TokenBoundary.matches("concatenate words", "cat"));
        assert!(MatchStrategy::TokenBoundary.matches("the cat sat", "cat"));
        assert!(MatchStrategy::TokenBoundary.matches("cat", "cat"));
        assert!(MatchStrategy::TokenBoundary.matches("a cat, fine", "cat"));
    }

    #[test]
    fn strategy_round_trips_through_strings() {
        for strategy in [MatchStrategy::Substring, MatchStrategy::TokenBoundary] {
            assert_eq!(strategy.as_str().parse::<MatchStrategy>().unwrap(), strategy);
        }
        assert!("fuzzy".parse::<MatchStrategy>().is_err());
    }
}
