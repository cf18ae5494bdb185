use std::collections::{HashMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};

use crate::entity::EntityType;
use crate::storage::StoredRelationship;

#[derive(Debug, Clone)]
pub struct NodeAttrs {
    /// Display label, `type:value`.
    pub label: String,
    pub entity_type: EntityType,
}

#[derive(Debug, Clone, Copy)]
pub struct EdgeAttrs {
    pub strength: u32,
    pub sentiment: f64,
}

/// In-memory undirected graph over one analytics window. Nodes enter in
/// corpus order, so node indices are deterministic for a given slice.
pub struct RelationshipGraph {
    graph: UnGraph<NodeAttrs, EdgeAttrs>,
    index: HashMap<String, NodeIndex>,
}

impl RelationshipGraph {
    #[must_use]
    pub fn from_relationships(relationships: &[StoredRelationship]) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut index: HashMap<String, NodeIndex> = HashMap::new();

        for rel in relationships {
            let a = intern(&mut graph, &mut index, &rel.source.to_string(), rel.source.entity_type);
            let b = intern(&mut graph, &mut index, &rel.target.to_string(), rel.target.entity_type);
            graph.add_edge(
                a,
                b,
                EdgeAttrs {
                    strength: rel.strength,
                    sentiment: rel.sentiment,
                },
            );
        }

        Self { graph, index }
    }

    #[must_use]
    pub fn inner(&self) -> &UnGraph<NodeAttrs, EdgeAttrs> {
        &self.graph
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn connected_component_count(&self) -> usize {
        petgraph::algo::connected_components(&self.graph)
    }

    /// Fraction of possible edges present: 2m / (n(n-1)), 0 for graphs
    /// with fewer than two nodes.
    #[must_use]
    pub fn density(&self) -> f64 {
        let n = self.node_count() as f64;
        if n < 2.0 {
            return 0.0;
        }
        2.0 * self.edge_count() as f64 / (n * (n - 1.0))
    }

    #[must_use]
    pub fn label(&self, index: usize) -> String {
        self.graph[NodeIndex::new(index)].label.clone()
    }

    #[must_use]
    pub fn node_index(&self, label: &str) -> Option<NodeIndex> {
        self.index.get(label).copied()
    }

    /// The radius-1 neighborhood around `center`, center included.
    #[must_use]
    pub fn ego_members(&self, center: NodeIndex) -> HashSet<NodeIndex> {
        let mut members: HashSet<NodeIndex> = self.graph.neighbors(center).collect();
        members.insert(center);
        members
    }

    /// Number of edges in the subgraph induced by `members`.
    #[must_use]
    pub fn induced_edge_count(&self, members: &HashSet<NodeIndex>) -> usize {
        self.graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .filter(|(a, b)| members.contains(a) && members.contains(b))
            .count()
    }
}

fn intern(
    graph: &mut UnGraph<NodeAttrs, EdgeAttrs>,
    index: &mut HashMap<String, NodeIndex>,
    label: &str,
    entity_type: EntityType,
) -> NodeIndex {
    if let Some(&found) = index.get(label) {
        return found;
    }
    let added = graph.add_node(NodeAttrs {
        label: label.to_string(),
        entity_type,
    });
    index.insert(label.to_string(), added);
    added
}
