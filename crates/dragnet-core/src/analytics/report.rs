//! Data model for the analytics report: graph statistics, ranked
//! centrality listings, community summaries, the sentiment rollup, and
//! the visualization requests handed to an external renderer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::graph::RelationshipGraph;
use crate::entity::EntityType;
use crate::storage::StoredRelationship;

/// Shape of the relationship graph for one analytics window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub connected_components: usize,
    pub density: f64,
}

impl From<&RelationshipGraph> for GraphStats {
    fn from(graph: &RelationshipGraph) -> Self {
        Self {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            connected_components: graph.connected_component_count(),
            density: graph.density(),
        }
    }
}

/// One node in a centrality listing. Scores are rounded to four decimal
/// places on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntity {
    pub entity: String,
    pub score: f64,
}

impl RankedEntity {
    #[must_use]
    pub fn new(entity: impl Into<String>, score: f64) -> Self {
        Self {
            entity: entity.into(),
            score: round4(score),
        }
    }
}

/// Top-ranked nodes per centrality measure. The eigenvector listing is
/// best effort when the power iteration runs out of budget, with
/// `eigenvector_converged` recording which case this run hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralityMeasures {
    pub degree: Vec<RankedEntity>,
    pub betweenness: Vec<RankedEntity>,
    pub eigenvector: Vec<RankedEntity>,
    pub eigenvector_converged: bool,
}

impl Default for CentralityMeasures {
    fn default() -> Self {
        Self {
            degree: Vec::new(),
            betweenness: Vec::new(),
            eigenvector: Vec::new(),
            eigenvector_converged: true,
        }
    }
}

/// One detected community: stable id within the run, full size, and a
/// capped sample of member labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunitySummary {
    pub id: usize,
    pub size: usize,
    pub members: Vec<String>,
}

/// Flattened relationship used in the most negative / most positive
/// listings. Sentiment is carried unrounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDigest {
    pub source: String,
    pub source_type: EntityType,
    pub target: String,
    pub target_type: EntityType,
    pub sentiment: f64,
    pub strength: u32,
}

impl From<&StoredRelationship> for RelationshipDigest {
    fn from(rel: &StoredRelationship) -> Self {
        Self {
            source: rel.source.value.clone(),
            source_type: rel.source.entity_type,
            target: rel.target.value.clone(),
            target_type: rel.target.entity_type,
            sentiment: rel.sentiment,
            strength: rel.strength,
        }
    }
}

/// Fixed sentiment band over mean relationship sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentBand {
    VeryNegative,
    Negative,
    Neutral,
    Positive,
    VeryPositive,
}

impl SentimentBand {
    /// Band for a mean sentiment. Bands are half-open on the upper bound
    /// except the top one, which closes at exactly 1.0. Values outside
    /// [-1, 1] fall in no band.
    #[must_use]
    pub fn classify(sentiment: f64) -> Option<Self> {
        if (-1.0..-0.6).contains(&sentiment) {
            Some(Self::VeryNegative)
        } else if (-0.6..-0.2).contains(&sentiment) {
            Some(Self::Negative)
        } else if (-0.2..0.2).contains(&sentiment) {
            Some(Self::Neutral)
        } else if (0.2..0.6).contains(&sentiment) {
            Some(Self::Positive)
        } else if (0.6..=1.0).contains(&sentiment) {
            Some(Self::VeryPositive)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryNegative => "very_negative",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Positive => "positive",
            Self::VeryPositive => "very_positive",
        }
    }
}

/// Relationship counts per sentiment band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub very_negative: usize,
    pub negative: usize,
    pub neutral: usize,
    pub positive: usize,
    pub very_positive: usize,
}

impl SentimentDistribution {
    pub fn record(&mut self, band: SentimentBand) {
        match band {
            SentimentBand::VeryNegative => self.very_negative += 1,
            SentimentBand::Negative => self.negative += 1,
            SentimentBand::Neutral => self.neutral += 1,
            SentimentBand::Positive => self.positive += 1,
            SentimentBand::VeryPositive => self.very_positive += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.very_negative + self.negative + self.neutral + self.positive + self.very_positive
    }
}

/// Sentiment rollup over the window's relationships.
///
/// `most_negative` holds the 10 lowest-sentiment relationships, or every
/// relationship when the corpus has fewer than 10. `most_positive` holds
/// the 10 highest, and is empty for corpora under 10 relationships. Ties
/// keep corpus order on both ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub distribution: SentimentDistribution,
    pub overall_average: f64,
    pub most_negative: Vec<RelationshipDigest>,
    pub most_positive: Vec<RelationshipDigest>,
}

impl SentimentAnalysis {
    #[must_use]
    pub fn from_relationships(relationships: &[StoredRelationship]) -> Self {
        let mut distribution = SentimentDistribution::default();
        for rel in relationships {
            if let Some(band) = SentimentBand::classify(rel.sentiment) {
                distribution.record(band);
            }
        }

        let overall_average = if relationships.is_empty() {
            0.0
        } else {
            relationships.iter().map(|rel| rel.sentiment).sum::<f64>()
                / relationships.len() as f64
        };

        let mut ascending: Vec<&StoredRelationship> = relationships.iter().collect();
        ascending.sort_by(|a, b| a.sentiment.total_cmp(&b.sentiment));

        let most_negative = ascending.iter().take(10).map(|rel| (*rel).into()).collect();
        let most_positive = if ascending.len() >= 10 {
            ascending.iter().rev().take(10).map(|rel| (*rel).into()).collect()
        } else {
            Vec::new()
        };

        Self {
            distribution,
            overall_average,
            most_negative,
            most_positive,
        }
    }
}

/// Kind of graph structure the engine wants rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationKind {
    FullNetwork,
    Community,
    EgoNetwork,
    SentimentDistribution,
}

/// One structure handed to the external renderer: a stable key plus the
/// node and edge counts the renderer labels its output with. All requests
/// from one run share the run's timestamp slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationRequest {
    #[serde(rename = "type")]
    pub kind: VisualizationKind,
    pub key: String,
    pub node_count: usize,
    pub edge_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_id: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub central_node: Option<String>,
}

impl VisualizationRequest {
    #[must_use]
    pub fn full_network(slug: &str, node_count: usize, edge_count: usize) -> Self {
        Self {
            kind: VisualizationKind::FullNetwork,
            key: format!("full_network_{slug}"),
            node_count,
            edge_count,
            community_id: None,
            central_node: None,
        }
    }

    #[must_use]
    pub fn community(id: usize, slug: &str, node_count: usize, edge_count: usize) -> Self {
        Self {
            kind: VisualizationKind::Community,
            key: format!("community_{id}_{slug}"),
            node_count,
            edge_count,
            community_id: Some(id),
            central_node: None,
        }
    }

    /// The key carries only the first 20 characters of the center label;
    /// `central_node` keeps the full label.
    #[must_use]
    pub fn ego_network(center: &str, slug: &str, node_count: usize, edge_count: usize) -> Self {
        let prefix: String = center.chars().take(20).collect();
        Self {
            kind: VisualizationKind::EgoNetwork,
            key: format!("ego_network_{prefix}_{slug}"),
            node_count,
            edge_count,
            community_id: None,
            central_node: Some(center.to_string()),
        }
    }

    #[must_use]
    pub fn sentiment_distribution(slug: &str) -> Self {
        Self {
            kind: VisualizationKind::SentimentDistribution,
            key: format!("sentiment_distribution_{slug}"),
            node_count: 0,
            edge_count: 0,
            community_id: None,
            central_node: None,
        }
    }
}

/// Full output of one analytics run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub generated_at: DateTime<Utc>,
    pub window_days: i64,
    pub min_strength: u32,
    pub graph_stats: GraphStats,
    pub centrality_measures: CentralityMeasures,
    pub communities: Vec<CommunitySummary>,
    pub sentiment_analysis: SentimentAnalysis,
    pub visualizations: Vec<VisualizationRequest>,
}

impl AnalyticsReport {
    /// Report for a window with no relationships: zero stats, every
    /// section empty, nothing to visualize.
    #[must_use]
    pub fn empty(generated_at: DateTime<Utc>, window_days: i64, min_strength: u32) -> Self {
        Self {
            generated_at,
            window_days,
            min_strength,
            graph_stats: GraphStats::default(),
            centrality_measures: CentralityMeasures::default(),
            communities: Vec::new(),
            sentiment_analysis: SentimentAnalysis::default(),
            visualizations: Vec::new(),
        }
    }
}

fn round4(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}
