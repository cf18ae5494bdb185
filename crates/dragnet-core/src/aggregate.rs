use std::collections::BTreeMap;

use crate::entity::EntityRef;
use crate::enrich::RecordsByType;
use crate::relationship::{pairable, Relationship};

/// Derives co-occurrence relationships from one document's enriched
/// records: every unordered pair of entities sighted in the same sentence
/// becomes (or strengthens) a relationship.
pub struct RelationshipAggregator;

impl RelationshipAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Pair sentiment is the mean of the two occurrences' compound scores
    /// at that sentence. Merging is idempotent per sentence index.
    #[must_use]
    pub fn aggregate(&self, records: &RecordsByType) -> Vec<Relationship> {
        // Sentence index -> entities sighted there. Type order then record
        // order keeps pair enumeration deterministic.
        let mut sighted: BTreeMap<usize, Vec<(EntityRef, f64)>> = BTreeMap::new();

        for (&entity_type, list) in records {
            for record in list {
                for occurrence in &record.occurrences {
                    sighted
                        .entry(occurrence.sentence_index)
                        .or_default()
                        .push((
                            EntityRef::new(entity_type, &record.value),
                            occurrence.sentiment.compound,
                        ));
                }
            }
        }

        let mut relationships: Vec<Relationship> = Vec::new();

        for (&index, entries) in &sighted {
            for i in 0..entries.len() {
                for j in (i + 1)..entries.len() {
                    let (a, sentiment_a) = &entries[i];
                    let (b, sentiment_b) = &entries[j];

                    if !pairable(a, b) {
                        continue;
                    }

                    let pair_sentiment = (sentiment_a + sentiment_b) / 2.0;
                    match relationships.iter_mut().find(|rel| rel.matches_pair(a, b)) {
                        Some(rel) => rel.merge_context(index, pair_sentiment),
                        None => relationships.push(Relationship::new(
                            a.clone(),
                            b.clone(),
                            index,
                            pair_sentiment,
                        )),
                    }
                }
            }
        }

        relationships
    }
}

impl Default for RelationshipAggregator {
    fn default() -> Self {
        Self::new()
    }
}
