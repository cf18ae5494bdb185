//! Periodic analytics over the accumulated relationship corpus: graph
//! construction, centrality measures, community detection, ego networks,
//! and the sentiment rollup, assembled into a single publishable report.

mod centrality;
mod community;
mod graph;
mod report;

pub use graph::{EdgeAttrs, NodeAttrs, RelationshipGraph};
pub use report::{
    AnalyticsReport, CentralityMeasures, CommunitySummary, GraphStats, RankedEntity,
    RelationshipDigest, SentimentAnalysis, SentimentBand, SentimentDistribution,
    VisualizationKind, VisualizationRequest,
};

use std::collections::HashSet;

use chrono::Utc;
use petgraph::graph::NodeIndex;
use thiserror::Error;

use crate::artifact::{report_key, timestamp_slug, ArtifactError, ArtifactStore};
use crate::storage::{Storage, StoredRelationship};

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Storage error: {0}")]
    Store(#[from] crate::Error),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;

/// Tuning for an analytics run. Defaults follow the production schedule:
/// a 30 day window over anything with at least one context fact.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Corpus window in days, counted back from now.
    pub window_days: i64,
    /// Keep relationships with at least this many context facts.
    pub min_strength: u32,
    /// Entries kept per centrality listing.
    pub top_central: usize,
    /// Ego networks examined, taken from the top of the degree ranking.
    pub top_ego: usize,
    /// Member labels sampled per community summary.
    pub community_sample: usize,
    pub eigenvector_iterations: usize,
    pub eigenvector_tolerance: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            min_strength: 1,
            top_central: 20,
            top_ego: 5,
            community_sample: 20,
            eigenvector_iterations: 1000,
            eigenvector_tolerance: 1e-6,
        }
    }
}

impl AnalyticsConfig {
    /// Configuration from the environment, falling back to defaults for
    /// anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            window_days: env_parse("DRAGNET_WINDOW_DAYS", defaults.window_days),
            min_strength: env_parse("DRAGNET_MIN_STRENGTH", defaults.min_strength),
            ..defaults
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

/// Computes the analytics report for a window of the relationship corpus
/// and publishes it to an artifact store.
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AnalyticsConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AnalyticsConfig) -> Self {
        self.config = config;
        self
    }

    /// Query the configured corpus window and compute the full report.
    pub async fn run(&self, storage: &Storage) -> AnalyticsResult<AnalyticsReport> {
        let relationships = storage
            .query_relationships(self.config.window_days, self.config.min_strength)
            .await?;
        Ok(self.analyze(&relationships))
    }

    /// Compute the report for an already-loaded relationship slice. An
    /// empty slice produces a zeroed report rather than an error.
    #[must_use]
    pub fn analyze(&self, relationships: &[StoredRelationship]) -> AnalyticsReport {
        let generated_at = Utc::now();
        if relationships.is_empty() {
            tracing::info!("No relationships in window, emitting empty report");
            return AnalyticsReport::empty(
                generated_at,
                self.config.window_days,
                self.config.min_strength,
            );
        }

        let graph = RelationshipGraph::from_relationships(relationships);
        tracing::info!(
            "Built graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        let degree_scores = centrality::degree(graph.inner());
        let betweenness_scores = centrality::betweenness(graph.inner());
        let (eigenvector_scores, converged) = centrality::eigenvector(
            graph.inner(),
            self.config.eigenvector_iterations,
            self.config.eigenvector_tolerance,
        );
        if !converged {
            tracing::warn!(
                "Eigenvector centrality did not converge within {} iterations, reporting best-effort scores",
                self.config.eigenvector_iterations
            );
        }

        let centrality_measures = CentralityMeasures {
            degree: self.top_ranked(&graph, &degree_scores),
            betweenness: self.top_ranked(&graph, &betweenness_scores),
            eigenvector: self.top_ranked(&graph, &eigenvector_scores),
            eigenvector_converged: converged,
        };

        let communities = community::detect_communities(graph.inner());
        let community_summaries: Vec<CommunitySummary> = communities
            .iter()
            .enumerate()
            .map(|(id, members)| CommunitySummary {
                id,
                size: members.len(),
                members: members
                    .iter()
                    .take(self.config.community_sample)
                    .map(|&node| graph.label(node))
                    .collect(),
            })
            .collect();

        let slug = timestamp_slug(generated_at);
        let mut visualizations = vec![VisualizationRequest::full_network(
            &slug,
            graph.node_count(),
            graph.edge_count(),
        )];

        // Subgraph renders for the five largest communities, skipping
        // anything too small to draw meaningfully.
        for (id, members) in communities.iter().take(5).enumerate() {
            if members.len() > 2 {
                let nodes: HashSet<NodeIndex> =
                    members.iter().map(|&node| NodeIndex::new(node)).collect();
                visualizations.push(VisualizationRequest::community(
                    id,
                    &slug,
                    members.len(),
                    graph.induced_edge_count(&nodes),
                ));
            }
        }

        for &node in centrality::ranked_indices(&degree_scores)
            .iter()
            .take(self.config.top_ego)
        {
            let members = graph.ego_members(NodeIndex::new(node));
            if members.len() > 2 {
                visualizations.push(VisualizationRequest::ego_network(
                    &graph.label(node),
                    &slug,
                    members.len(),
                    graph.induced_edge_count(&members),
                ));
            }
        }

        visualizations.push(VisualizationRequest::sentiment_distribution(&slug));

        let report = AnalyticsReport {
            generated_at,
            window_days: self.config.window_days,
            min_strength: self.config.min_strength,
            graph_stats: GraphStats::from(&graph),
            centrality_measures,
            communities: community_summaries,
            sentiment_analysis: SentimentAnalysis::from_relationships(relationships),
            visualizations,
        };
        tracing::info!(
            "Analytics run covered {} relationships in {} communities",
            relationships.len(),
            report.communities.len()
        );
        report
    }

    /// Serialize the report and persist it under its timestamped key,
    /// returning the key.
    pub async fn publish(
        &self,
        report: &AnalyticsReport,
        artifacts: &dyn ArtifactStore,
    ) -> AnalyticsResult<String> {
        let key = report_key(report.generated_at);
        let value = serde_json::to_value(report)?;
        artifacts.put_json(&key, &value).await?;
        tracing::info!("Stored analytics report at {}", key);
        Ok(key)
    }

    fn top_ranked(&self, graph: &RelationshipGraph, scores: &[f64]) -> Vec<RankedEntity> {
        centrality::ranked_indices(scores)
            .into_iter()
            .take(self.config.top_central)
            .map(|node| RankedEntity::new(graph.label(node), scores[node]))
            .collect()
    }
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new()
    }
}
