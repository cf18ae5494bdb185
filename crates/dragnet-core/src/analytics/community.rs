//! Community detection by greedy modularity maximization in the
//! Clauset-Newman-Moore style: every node starts in its own community and
//! the connected pair whose merge gains the most modularity merges, until
//! no merge improves the partition. Edges are weighted by relationship
//! strength.

use std::cmp::Ordering;
use std::collections::HashMap;

use petgraph::graph::UnGraph;

use super::graph::{EdgeAttrs, NodeAttrs};

/// Partition the graph into communities of node indices. Communities come
/// back largest first (ties broken by smallest member) with members in
/// node order, so community numbering is stable for a given graph.
#[must_use]
pub fn detect_communities(graph: &UnGraph<NodeAttrs, EdgeAttrs>) -> Vec<Vec<usize>> {
    let count = graph.node_count();
    if count == 0 {
        return Vec::new();
    }

    // Inter-community weight and weighted degree, keyed by community id.
    // Community ids start out as node indices; a merge keeps the smaller id.
    let mut adjacency: Vec<HashMap<usize, f64>> = vec![HashMap::new(); count];
    let mut degree = vec![0.0f64; count];
    let mut total = 0.0f64;

    for edge in graph.edge_indices() {
        let Some((a, b)) = graph.edge_endpoints(edge) else {
            continue;
        };
        let weight = f64::from(graph[edge].strength);
        *adjacency[a.index()].entry(b.index()).or_insert(0.0) += weight;
        *adjacency[b.index()].entry(a.index()).or_insert(0.0) += weight;
        degree[a.index()] += weight;
        degree[b.index()] += weight;
        total += weight;
    }

    let mut members: Vec<Vec<usize>> = (0..count).map(|node| vec![node]).collect();

    while total > 0.0 {
        // Best merge among connected community pairs. Ties take the
        // smallest pair so the outcome never depends on map order.
        let mut best: Option<(f64, usize, usize)> = None;
        for a in 0..count {
            if members[a].is_empty() {
                continue;
            }
            for (&b, &weight) in &adjacency[a] {
                if b <= a {
                    continue;
                }
                let gain = weight / total - degree[a] * degree[b] / (2.0 * total * total);
                let replace = match best {
                    None => true,
                    Some((best_gain, best_a, best_b)) => match gain.total_cmp(&best_gain) {
                        Ordering::Greater => true,
                        Ordering::Equal => (a, b) < (best_a, best_b),
                        Ordering::Less => false,
                    },
                };
                if replace {
                    best = Some((gain, a, b));
                }
            }
        }

        let Some((gain, keep, absorbed)) = best else {
            break;
        };
        if gain <= 0.0 {
            break;
        }

        let edges = std::mem::take(&mut adjacency[absorbed]);
        for (neighbor, weight) in edges {
            adjacency[neighbor].remove(&absorbed);
            if neighbor == keep {
                continue;
            }
            *adjacency[keep].entry(neighbor).or_insert(0.0) += weight;
            *adjacency[neighbor].entry(keep).or_insert(0.0) += weight;
        }
        degree[keep] += degree[absorbed];
        let moved = std::mem::take(&mut members[absorbed]);
        members[keep].extend(moved);
    }

    let mut communities: Vec<Vec<usize>> = members
        .into_iter()
        .filter(|community| !community.is_empty())
        .map(|mut community| {
            community.sort_unstable();
            community
        })
        .collect();
    communities.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
    communities
}
