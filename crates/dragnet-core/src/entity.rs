use serde::{Deserialize, Serialize};

/// Closed set of entity kinds the extractor recognizes. Adding a kind means
/// adding a matcher to the pattern registry and a rule to the normalizer.
///
/// Declaration order fixes the order types appear in extractor output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Email,
    Phone,
    Url,
    CreditCard,
    IpAddress,
    Username,
    Ssn,
    Domain,
}

impl EntityType {
    pub const ALL: [Self; 8] = [
        Self::Email,
        Self::Phone,
        Self::Url,
        Self::CreditCard,
        Self::IpAddress,
        Self::Username,
        Self::Ssn,
        Self::Domain,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Url => "url",
            Self::CreditCard => "credit_card",
            Self::IpAddress => "ip_address",
            Self::Username => "username",
            Self::Ssn => "ssn",
            Self::Domain => "domain",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "url" => Ok(Self::Url),
            "credit_card" => Ok(Self::CreditCard),
            "ip_address" => Ok(Self::IpAddress),
            "username" => Ok(Self::Username),
            "ssn" => Ok(Self::Ssn),
            "domain" => Ok(Self::Domain),
            _ => Err(crate::Error::InvalidEntityType(s.to_string())),
        }
    }
}

/// Sentiment components for one sentence. Compound is in [-1, 1]; the
/// positive/negative/neutral components are proportions in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentScore {
    pub compound: f64,
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl SentimentScore {
    #[must_use]
    pub fn label(&self) -> SentimentLabel {
        SentimentLabel::from_compound(self.compound)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Compound at or above 0.05 is positive, at or below -0.05 negative,
    /// anything between is neutral.
    #[must_use]
    pub fn from_compound(compound: f64) -> Self {
        if compound >= 0.05 {
            Self::Positive
        } else if compound <= -0.05 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sentence-level sighting of an entity within a document. Immutable
/// once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub sentence_index: usize,
    /// The matching sentence joined with its adjacent sentences.
    pub context: String,
    pub sentiment: SentimentScore,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentHistogram {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
}

impl SentimentHistogram {
    pub fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.positive + self.negative + self.neutral
    }
}

/// One entity's sightings within one document, with the sentiment histogram
/// and average kept in step with the occurrence list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub value: String,
    pub occurrences: Vec<Occurrence>,
    pub sentiment_counts: SentimentHistogram,
    /// Mean compound sentiment over all occurrences; 0 when there are none.
    pub average_sentiment: f64,
}

impl EntityRecord {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            occurrences: Vec::new(),
            sentiment_counts: SentimentHistogram::default(),
            average_sentiment: 0.0,
        }
    }

    pub fn push_occurrence(&mut self, occurrence: Occurrence) {
        self.sentiment_counts.record(occurrence.sentiment.label());
        self.occurrences.push(occurrence);
        let total: f64 = self.occurrences.iter().map(|o| o.sentiment.compound).sum();
        self.average_sentiment = total / self.occurrences.len() as f64;
    }

    #[must_use]
    pub fn occurrence_count(&self) -> usize {
        self.occurrences.len()
    }
}

/// Entity identity: the (type, normalized value) pair. Two raw matches that
/// normalize to the same pair are the same entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub value: String,
}

impl EntityRef {
    #[must_use]
    pub fn new(entity_type: EntityType, value: impl Into<String>) -> Self {
        Self {
            entity_type,
            value: value.into(),
        }
    }

    /// Stable persistence key: BLAKE3 digest of "type:value". Reproducible
    /// across runs and machines.
    #[must_use]
    pub fn key(&self) -> String {
        let digest = blake3::hash(format!("{}:{}", self.entity_type.as_str(), self.value).as_bytes());
        digest.to_hex().to_string()
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_round_trip() {
        for entity_type in EntityType::ALL {
            let parsed: EntityType = entity_type.as_str().parse().unwrap();
            assert_eq!(parsed, entity_type);
        }
    }

    #[test]
    fn entity_type_rejects_unknown() {
        assert!("passport".parse::<EntityType>().is_err());
    }

    #[test]
    fn label_thresholds() {
        assert_eq!(SentimentLabel::from_compound(0.05), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_compound(0.049), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_compound(-0.049), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_compound(-0.05), SentimentLabel::Negative);
    }

    #[test]
    fn histogram_tracks_occurrences() {
        let mut record = EntityRecord::new("jane@x.com");
        for compound in [0.8, -0.6, 0.0] {
            record.push_occurrence(Occurrence {
                sentence_index: 0,
                context: String::new(),
                sentiment: SentimentScore {
                    compound,
                    ..SentimentScore::default()
                },
            });
        }

        assert_eq!(record.sentiment_counts.total(), 3);
        assert_eq!(record.sentiment_counts.positive, 1);
        assert_eq!(record.sentiment_counts.negative, 1);
        assert_eq!(record.sentiment_counts.neutral, 1);
        assert!((record.average_sentiment - 0.2 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_record_averages_zero() {
        let record = EntityRecord::new("x.com");
        assert_eq!(record.occurrence_count(), 0);
        assert_eq!(record.average_sentiment, 0.0);
    }

    #[test]
    fn key_is_stable_and_type_scoped() {
        let a = EntityRef::new(EntityType::Email, "jane@x.com");
        let b = EntityRef::new(EntityType::Email, "jane@x.com");
        let c = EntityRef::new(EntityType::Domain, "jane@x.com");

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
        assert_eq!(a.key().len(), 64);
    }
}
