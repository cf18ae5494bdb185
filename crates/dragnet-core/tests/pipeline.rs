use dragnet_core::analytics::{AnalyticsEngine, VisualizationKind};
use dragnet_core::artifact::FsArtifactStore;
use dragnet_core::storage::StoredRelationship;
use dragnet_core::{DocumentEvent, DocumentPipeline, EntityType, FsFetcher, Storage};
use tempfile::TempDir;

const MEMO: &str = "Call 555-123-4567 about jane@x.com right away. It went great.";
const UPDATE: &str = "Everyone said jane@x.com was trusted. Sadly a scam followed.";

fn write_doc(dir: &TempDir, name: &str, content: &str) {
    std::fs::write(dir.path().join(name), content).unwrap();
}

/// Pipeline rooted in a fresh tempdir, in-memory storage, and an artifact
/// store under `<tempdir>/artifacts`. The tempdir guard must be kept alive.
async fn corpus() -> (TempDir, DocumentPipeline, Storage, FsArtifactStore) {
    let dir = TempDir::new().unwrap();
    let pipeline = DocumentPipeline::new()
        .unwrap()
        .with_fetcher(Box::new(FsFetcher::rooted(dir.path())));
    let storage = Storage::open_memory().await.unwrap();
    let artifacts = FsArtifactStore::new(dir.path().join("artifacts"));
    (dir, pipeline, storage, artifacts)
}

/// Corpus of two documents sharing the jane@x.com / @x / x.com triangle,
/// both processed.
async fn seeded_corpus() -> (TempDir, DocumentPipeline, Storage, FsArtifactStore) {
    let (dir, pipeline, storage, artifacts) = corpus().await;
    write_doc(&dir, "memo.txt", MEMO);
    write_doc(&dir, "update.txt", UPDATE);
    for name in ["memo.txt", "update.txt"] {
        pipeline
            .process(&DocumentEvent::new(name), &storage, &artifacts)
            .await
            .unwrap();
    }
    (dir, pipeline, storage, artifacts)
}

fn has_pair(
    rels: &[StoredRelationship],
    a: (EntityType, &str),
    b: (EntityType, &str),
) -> bool {
    rels.iter().any(|rel| {
        let source = (rel.source.entity_type, rel.source.value.as_str());
        let target = (rel.target.entity_type, rel.target.value.as_str());
        (source == a && target == b) || (source == b && target == a)
    })
}

// --- Document flow ---

#[tokio::test]
async fn case_variants_collapse_to_one_entity() {
    let (dir, pipeline, storage, artifacts) = corpus().await;
    write_doc(&dir, "contact.txt", "Contact jane@x.com or JANE@x.com for details.");

    let outcome = pipeline
        .process(&DocumentEvent::new("contact.txt"), &storage, &artifacts)
        .await
        .unwrap();

    let records = storage.entity_records(&outcome.document_id).await.unwrap();
    let emails: Vec<_> = records
        .iter()
        .filter(|record| record.entity_ref.entity_type == EntityType::Email)
        .collect();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].entity_ref.value, "jane@x.com");
    assert_eq!(emails[0].record.occurrence_count(), 1);
}

#[tokio::test]
async fn shared_pairs_accumulate_strength_across_documents() {
    let (_dir, _pipeline, storage, _artifacts) = seeded_corpus().await;

    let rels = storage.query_relationships(30, 1).await.unwrap();

    assert_eq!(rels.len(), 3);
    assert!(rels.iter().all(|rel| rel.strength == 2));
    assert!(has_pair(
        &rels,
        (EntityType::Email, "jane@x.com"),
        (EntityType::Domain, "x.com"),
    ));
    assert!(has_pair(
        &rels,
        (EntityType::Email, "jane@x.com"),
        (EntityType::Username, "@x"),
    ));
    assert!(has_pair(
        &rels,
        (EntityType::Username, "@x"),
        (EntityType::Domain, "x.com"),
    ));

    // One neutral and one clearly positive sentence average out positive.
    for rel in &rels {
        assert!(rel.sentiment > 0.2 && rel.sentiment < 0.3);
    }
}

#[tokio::test]
async fn minimum_strength_filters_the_window() {
    let (_dir, _pipeline, storage, _artifacts) = seeded_corpus().await;

    assert_eq!(storage.query_relationships(30, 2).await.unwrap().len(), 3);
    assert!(storage.query_relationships(30, 3).await.unwrap().is_empty());
}

// --- Analytics ---

#[tokio::test]
async fn report_covers_the_seeded_corpus() {
    let (_dir, _pipeline, storage, _artifacts) = seeded_corpus().await;

    let report = AnalyticsEngine::new().run(&storage).await.unwrap();

    assert_eq!(report.graph_stats.nodes, 3);
    assert_eq!(report.graph_stats.edges, 3);
    assert_eq!(report.graph_stats.connected_components, 1);
    assert!((report.graph_stats.density - 1.0).abs() < 1e-9);

    assert_eq!(report.centrality_measures.degree.len(), 3);
    assert!(report
        .centrality_measures
        .degree
        .iter()
        .all(|ranked| (ranked.score - 1.0).abs() < 1e-9));
    assert!(report.centrality_measures.eigenvector_converged);

    assert_eq!(report.communities.len(), 1);
    assert_eq!(report.communities[0].size, 3);

    assert_eq!(report.sentiment_analysis.distribution.positive, 3);
    assert_eq!(report.sentiment_analysis.most_negative.len(), 3);
    assert!(report.sentiment_analysis.most_positive.is_empty());

    let kinds: Vec<VisualizationKind> = report
        .visualizations
        .iter()
        .map(|request| request.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            VisualizationKind::FullNetwork,
            VisualizationKind::Community,
            VisualizationKind::EgoNetwork,
            VisualizationKind::EgoNetwork,
            VisualizationKind::EgoNetwork,
            VisualizationKind::SentimentDistribution,
        ]
    );
}

#[tokio::test]
async fn published_report_lands_under_graphs() {
    let (dir, _pipeline, storage, artifacts) = seeded_corpus().await;

    let engine = AnalyticsEngine::new();
    let report = engine.run(&storage).await.unwrap();
    let key = engine.publish(&report, &artifacts).await.unwrap();

    assert!(key.starts_with("graphs/poi_graph_analysis_"));
    assert!(key.ends_with(".json"));

    let raw = std::fs::read_to_string(dir.path().join("artifacts").join(&key)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["graph_stats"]["nodes"], 3);
    assert_eq!(value["sentiment_analysis"]["distribution"]["positive"], 3);
    assert_eq!(value["visualizations"][0]["type"], "full_network");
}

// --- Small corpus behavior ---

#[tokio::test]
async fn empty_corpus_reports_zero_and_still_publishes() {
    let (dir, _pipeline, storage, artifacts) = corpus().await;

    let engine = AnalyticsEngine::new();
    let report = engine.run(&storage).await.unwrap();

    assert_eq!(report.graph_stats.nodes, 0);
    assert_eq!(report.graph_stats.edges, 0);
    assert!(report.graph_stats.density.abs() < f64::EPSILON);
    assert!(report.centrality_measures.degree.is_empty());
    assert!(report.communities.is_empty());
    assert!(report.visualizations.is_empty());
    assert!(report.sentiment_analysis.overall_average.abs() < f64::EPSILON);

    let key = engine.publish(&report, &artifacts).await.unwrap();
    assert!(dir.path().join("artifacts").join(&key).exists());
}
