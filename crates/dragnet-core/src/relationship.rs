use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityRef, EntityType};

/// Symmetric co-occurrence between two entities, accumulated within one
/// document. (A, B) and (B, A) are the same relationship.
///
/// Invariants: `strength` equals the number of recorded contexts, and
/// `sentiment` is the running mean of the pair sentiment over those
/// contexts, updated incrementally as each new context arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub source: EntityRef,
    pub target: EntityRef,
    /// Sentence index -> pair sentiment observed there. The key set is the
    /// context set; keeping the per-context value lets the store persist
    /// each observation as its own mergeable fact.
    pub contexts: BTreeMap<usize, f64>,
    pub strength: u32,
    pub sentiment: f64,
}

impl Relationship {
    #[must_use]
    pub fn new(source: EntityRef, target: EntityRef, sentence_index: usize, sentiment: f64) -> Self {
        Self {
            source,
            target,
            contexts: BTreeMap::from([(sentence_index, sentiment)]),
            strength: 1,
            sentiment,
        }
    }

    /// True when {a, b} equals this relationship's endpoints in either
    /// orientation.
    #[must_use]
    pub fn matches_pair(&self, a: &EntityRef, b: &EntityRef) -> bool {
        (self.source == *a && self.target == *b) || (self.source == *b && self.target == *a)
    }

    /// Records one more co-occurrence. Re-observing a sentence index is a
    /// no-op, so strength never double-counts a sentence.
    pub fn merge_context(&mut self, sentence_index: usize, sentiment: f64) {
        match self.contexts.entry(sentence_index) {
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(sentiment);
                self.strength += 1;
                self.sentiment += (sentiment - self.sentiment) / f64::from(self.strength);
            }
        }
    }

    pub fn context_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.contexts.keys().copied()
    }

    /// Stable persistence key over the unordered endpoint pair.
    #[must_use]
    pub fn key(&self) -> String {
        relationship_key(&self.source, &self.target)
    }
}

/// Same-type pairs carry no signal and are skipped, except emails: two
/// addresses in one sentence still indicate a link.
#[must_use]
pub fn pairable(a: &EntityRef, b: &EntityRef) -> bool {
    a.entity_type != b.entity_type || a.entity_type == EntityType::Email
}

/// Symmetric content-hash key: endpoint digests are sorted before the final
/// digest, so both orientations produce the same key.
#[must_use]
pub fn relationship_key(a: &EntityRef, b: &EntityRef) -> String {
    let ka = a.key();
    let kb = b.key();
    let (lo, hi) = if ka <= kb { (ka, kb) } else { (kb, ka) };
    blake3::hash(format!("{lo}|{hi}").as_bytes()).to_hex().to_string()
}
