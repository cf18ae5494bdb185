//! Centrality measures over the relationship graph. All three operate on
//! the unweighted structure; scores are indexed by node index.

use std::collections::VecDeque;

use petgraph::graph::{NodeIndex, UnGraph};

use super::graph::{EdgeAttrs, NodeAttrs};

/// Degree centrality: degree / (n - 1). Graphs with a single node score 1.
#[must_use]
pub fn degree(graph: &UnGraph<NodeAttrs, EdgeAttrs>) -> Vec<f64> {
    let n = graph.node_count();
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 1.0 / (n as f64 - 1.0);
    graph
        .node_indices()
        .map(|node| graph.neighbors(node).count() as f64 * scale)
        .collect()
}

/// Betweenness centrality via Brandes' accumulation over breadth-first
/// shortest paths, normalized by 1 / ((n-1)(n-2)). Both orientations of
/// every pair contribute, which is what makes that normalization land on
/// 1.0 for the center of a star.
#[must_use]
pub fn betweenness(graph: &UnGraph<NodeAttrs, EdgeAttrs>) -> Vec<f64> {
    let n = graph.node_count();
    let mut centrality = vec![0.0; n];
    if n <= 2 {
        return centrality;
    }

    let mut stack: Vec<NodeIndex> = Vec::with_capacity(n);
    let mut queue: VecDeque<NodeIndex> = VecDeque::with_capacity(n);

    for source in graph.node_indices() {
        stack.clear();
        queue.clear();
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut path_counts = vec![0.0f64; n];
        let mut distance = vec![-1i64; n];

        path_counts[source.index()] = 1.0;
        distance[source.index()] = 0;
        queue.push_back(source);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for w in graph.neighbors(v) {
                if distance[w.index()] < 0 {
                    distance[w.index()] = distance[v.index()] + 1;
                    queue.push_back(w);
                }
                if distance[w.index()] == distance[v.index()] + 1 {
                    path_counts[w.index()] += path_counts[v.index()];
                    predecessors[w.index()].push(v.index());
                }
            }
        }

        let mut dependency = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w.index()] {
                dependency[v] +=
                    path_counts[v] / path_counts[w.index()] * (1.0 + dependency[w.index()]);
            }
            if w != source {
                centrality[w.index()] += dependency[w.index()];
            }
        }
    }

    let scale = 1.0 / ((n as f64 - 1.0) * (n as f64 - 2.0));
    for score in &mut centrality {
        *score *= scale;
    }
    centrality
}

/// Eigenvector centrality by power iteration on A + I, starting uniform
/// and renormalizing to unit L2 norm each round. Returns the scores and
/// whether the iteration converged (total absolute change below
/// `n * tolerance`); callers get the best-effort vector either way.
#[must_use]
pub fn eigenvector(
    graph: &UnGraph<NodeAttrs, EdgeAttrs>,
    max_iterations: usize,
    tolerance: f64,
) -> (Vec<f64>, bool) {
    let n = graph.node_count();
    if n == 0 {
        return (Vec::new(), true);
    }

    let mut scores = vec![1.0 / n as f64; n];
    for _ in 0..max_iterations {
        let previous = scores.clone();
        for v in graph.node_indices() {
            for u in graph.neighbors(v) {
                scores[u.index()] += previous[v.index()];
            }
        }

        let norm = scores.iter().map(|s| s * s).sum::<f64>().sqrt();
        let norm = if norm == 0.0 { 1.0 } else { norm };
        for score in &mut scores {
            *score /= norm;
        }

        let change: f64 = scores
            .iter()
            .zip(&previous)
            .map(|(now, before)| (now - before).abs())
            .sum();
        if change < n as f64 * tolerance {
            return (scores, true);
        }
    }

    (scores, false)
}

/// Node indices ordered by descending score. The sort is stable, so ties
/// resolve to first-inserted (corpus order).
#[must_use]
pub fn ranked_indices(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}
