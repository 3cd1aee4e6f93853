//! Graph synthesis from accumulated tool results.
//!
//! After a turn's tool loop finishes, the accumulated results are scanned
//! for renderable graph data. Two payload shapes contribute: flat edge
//! lists (each endpoint becomes a node) and nodes+edges fragments. Nodes
//! and edges are deduplicated, missing node types are inferred from
//! relation semantics, and the result is capped to display limits.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::tool::{GraphFragment, RelationEdge, ToolCallResult, ToolOutcome, ToolPayload};

/// Display cap on synthesized nodes.
pub const MAX_DISPLAY_NODES: usize = 100;

/// Display cap on synthesized edges.
pub const MAX_DISPLAY_EDGES: usize = 200;

/// Node type tags used for downstream coloring.
pub const TYPE_DRUG: &str = "drug";
pub const TYPE_DISEASE: &str = "disease";
pub const TYPE_GENE_PROTEIN: &str = "gene/protein";
pub const TYPE_PHENOTYPE: &str = "phenotype";
pub const TYPE_UNKNOWN: &str = "Unknown";

/// A renderable graph node. Identifiers are unique within a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

/// A renderable graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relation: String,
}

/// The graph handed to the renderer. Transient: built once per assistant
/// turn and discarded when the next turn starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPayload {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub is_truncated: bool,
}

/// Synthesizes an optional graph from one turn's tool results.
///
/// Returns `None` when no result contributed any node — a frequent,
/// valid outcome, not an error.
pub fn synthesize(results: &[ToolCallResult]) -> Option<GraphPayload> {
    let mut builder = GraphBuilder::default();

    for result in results {
        let ToolOutcome::Success { payload, .. } = &result.outcome else {
            continue;
        };
        match payload {
            ToolPayload::Edges(edges) => {
                for edge in edges {
                    builder.add_relation_edge(edge);
                }
            }
            ToolPayload::Fragment(fragment) => builder.add_fragment(fragment),
            _ => {}
        }
    }

    builder.finish()
}

#[derive(Default)]
struct GraphBuilder {
    nodes: Vec<GraphNode>,
    seen_nodes: HashSet<String>,
    edges: Vec<GraphEdge>,
    seen_edges: HashSet<String>,
}

impl GraphBuilder {
    /// First occurrence wins; later duplicates are dropped.
    fn add_node(&mut self, id: &str, node_type: &str) {
        if self.seen_nodes.insert(id.to_string()) {
            self.nodes.push(GraphNode {
                id: id.to_string(),
                name: id.to_string(),
                node_type: node_type.to_string(),
            });
        }
    }

    fn add_edge(&mut self, source: &str, relation: &str, target: &str) {
        let key = format!("{source}-{relation}-{target}");
        if self.seen_edges.insert(key) {
            self.edges.push(GraphEdge {
                source: source.to_string(),
                target: target.to_string(),
                relation: relation.to_string(),
            });
        }
    }

    fn add_relation_edge(&mut self, edge: &RelationEdge) {
        let (source_type, target_type) = endpoint_types(edge);
        self.add_node(&edge.source, &source_type);
        self.add_node(&edge.target, &target_type);
        self.add_edge(&edge.source, &edge.relation, &edge.target);
    }

    fn add_fragment(&mut self, fragment: &GraphFragment) {
        for node in &fragment.nodes {
            if let Some(id) = node.identifier() {
                self.add_node(id, node.node_type.as_deref().unwrap_or(TYPE_UNKNOWN));
            }
        }
        for edge in &fragment.edges {
            self.add_edge(
                &edge.source,
                edge.relation.as_deref().unwrap_or("related_to"),
                &edge.target,
            );
        }
    }

    fn finish(self) -> Option<GraphPayload> {
        let GraphBuilder {
            mut nodes,
            mut edges,
            ..
        } = self;

        if nodes.is_empty() {
            return None;
        }

        let mut is_truncated = false;
        if nodes.len() > MAX_DISPLAY_NODES {
            nodes.truncate(MAX_DISPLAY_NODES);
            is_truncated = true;
        }

        // Drop edges whose endpoints did not survive node truncation, or
        // that referenced nodes never present in any nodes array.
        let surviving: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
        edges.retain(|edge| {
            surviving.contains(edge.source.as_str()) && surviving.contains(edge.target.as_str())
        });
        if edges.len() > MAX_DISPLAY_EDGES {
            edges.truncate(MAX_DISPLAY_EDGES);
            is_truncated = true;
        }

        Some(GraphPayload {
            nodes,
            edges,
            is_truncated,
        })
    }
}

/// Infers endpoint types from relation semantics.
///
/// Best effort: the relation name is weak evidence, used only because
/// several tool responses omit explicit type fields and an untyped node
/// still needs a class for rendering. Explicit types always win;
/// `Unknown` is the intentional default when no rule matches.
fn endpoint_types(edge: &RelationEdge) -> (String, String) {
    let relation = edge.relation.to_ascii_lowercase();
    let (source_default, target_default) = match relation.as_str() {
        "indication" | "contraindication" | "off_label_use" => {
            complement_pair(edge, TYPE_DRUG, TYPE_DISEASE)
        }
        "target" | "transporter" | "enzyme" | "carrier" => (TYPE_DRUG, TYPE_GENE_PROTEIN),
        "synergistic_interaction" => (TYPE_DRUG, TYPE_DRUG),
        "ppi" => (TYPE_GENE_PROTEIN, TYPE_GENE_PROTEIN),
        _ if relation.contains("phenotype") => complement_pair(edge, TYPE_DISEASE, TYPE_PHENOTYPE),
        _ => (TYPE_UNKNOWN, TYPE_UNKNOWN),
    };

    (
        edge.source_type
            .clone()
            .unwrap_or_else(|| source_default.to_string()),
        edge.target_type
            .clone()
            .unwrap_or_else(|| target_default.to_string()),
    )
}

/// Orients an asymmetric relation pair around whichever endpoint carries
/// an explicit type; defaults to (a, b) when neither does.
fn complement_pair<'a>(
    edge: &RelationEdge,
    a: &'a str,
    b: &'a str,
) -> (&'a str, &'a str) {
    match (edge.source_type.as_deref(), edge.target_type.as_deref()) {
        (Some(source), None) if source.eq_ignore_ascii_case(b) => (b, a),
        (None, Some(target)) if target.eq_ignore_ascii_case(a) => (b, a),
        _ => (a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{FragmentEdge, FragmentNode, ToolName};
    use serde_json::Map;

    fn result_with(payload: ToolPayload) -> ToolCallResult {
        ToolCallResult::success(ToolName::GetNeighbors, Map::new(), payload, None)
    }

    fn typed_edge(
        source: &str,
        relation: &str,
        target: &str,
        source_type: Option<&str>,
        target_type: Option<&str>,
    ) -> RelationEdge {
        RelationEdge {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
            source_type: source_type.map(Into::into),
            target_type: target_type.map(Into::into),
        }
    }

    #[test]
    fn empty_results_yield_no_graph() {
        assert_eq!(synthesize(&[]), None);
        let text_only = result_with(ToolPayload::Text("nothing".into()));
        assert_eq!(synthesize(&[text_only]), None);
    }

    #[test]
    fn edge_list_endpoints_become_nodes() {
        let results = [result_with(ToolPayload::Edges(vec![RelationEdge::new(
            "aspirin",
            "indication",
            "migraine",
        )]))];

        let graph = synthesize(&results).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert!(!graph.is_truncated);
        assert_eq!(graph.nodes[0].node_type, TYPE_DRUG);
        assert_eq!(graph.nodes[1].node_type, TYPE_DISEASE);
    }

    #[test]
    fn duplicate_edges_are_dropped() {
        let edge = RelationEdge::new("a", "ppi", "b");
        let results = [
            result_with(ToolPayload::Edges(vec![edge.clone(), edge.clone()])),
            result_with(ToolPayload::Edges(vec![edge])),
        ];

        let graph = synthesize(&results).unwrap();
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn first_node_occurrence_wins() {
        let results = [result_with(ToolPayload::Edges(vec![
            typed_edge("imatinib", "target", "ABL1", None, None),
            typed_edge("imatinib", "indication", "leukemia", Some("compound"), None),
        ]))];

        let graph = synthesize(&results).unwrap();
        let imatinib = graph.nodes.iter().find(|n| n.id == "imatinib").unwrap();
        // The first sighting (typed drug via the target rule) is kept.
        assert_eq!(imatinib.node_type, TYPE_DRUG);
    }

    #[test]
    fn relation_semantics_drive_type_inference() {
        let cases = [
            ("target", TYPE_DRUG, TYPE_GENE_PROTEIN),
            ("enzyme", TYPE_DRUG, TYPE_GENE_PROTEIN),
            ("synergistic_interaction", TYPE_DRUG, TYPE_DRUG),
            ("ppi", TYPE_GENE_PROTEIN, TYPE_GENE_PROTEIN),
            ("disease_phenotype_positive", TYPE_DISEASE, TYPE_PHENOTYPE),
            ("mystery_relation", TYPE_UNKNOWN, TYPE_UNKNOWN),
        ];

        for (relation, source_type, target_type) in cases {
            let (s, t) = endpoint_types(&RelationEdge::new("a", relation, "b"));
            assert_eq!((s.as_str(), t.as_str()), (source_type, target_type), "{relation}");
        }
    }

    #[test]
    fn indication_orients_around_the_typed_endpoint() {
        let (s, t) = endpoint_types(&typed_edge(
            "migraine",
            "indication",
            "aspirin",
            Some("disease"),
            None,
        ));
        assert_eq!((s.as_str(), t.as_str()), (TYPE_DISEASE, TYPE_DRUG));

        let (s, t) = endpoint_types(&typed_edge(
            "migraine",
            "indication",
            "aspirin",
            None,
            Some("drug"),
        ));
        assert_eq!((s.as_str(), t.as_str()), (TYPE_DISEASE, TYPE_DRUG));
    }

    #[test]
    fn fragment_ids_fall_back_and_relations_default() {
        let fragment = GraphFragment {
            nodes: vec![
                FragmentNode {
                    db_id: Some("DB00945".into()),
                    node_type: Some("drug".into()),
                    ..FragmentNode::default()
                },
                FragmentNode::named("migraine"),
            ],
            edges: vec![FragmentEdge {
                source: "DB00945".into(),
                target: "migraine".into(),
                relation: None,
            }],
        };

        let graph = synthesize(&[result_with(ToolPayload::Fragment(fragment))]).unwrap();
        assert_eq!(graph.nodes[0].id, "DB00945");
        assert_eq!(graph.nodes[1].node_type, TYPE_UNKNOWN);
        assert_eq!(graph.edges[0].relation, "related_to");
    }

    #[test]
    fn display_truncation_caps_nodes_and_drops_dangling_edges() {
        // A star around one hub with 150 unique leaves.
        let edges: Vec<_> = (0..150)
            .map(|i| RelationEdge::new("hub", "ppi", format!("leaf{i}")))
            .collect();

        let graph = synthesize(&[result_with(ToolPayload::Edges(edges))]).unwrap();
        assert!(graph.is_truncated);
        assert_eq!(graph.nodes.len(), MAX_DISPLAY_NODES);

        let surviving: HashSet<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in &graph.edges {
            assert!(surviving.contains(edge.source.as_str()));
            assert!(surviving.contains(edge.target.as_str()));
        }
    }

    #[test]
    fn fragment_edges_to_unlisted_nodes_are_dropped() {
        let fragment = GraphFragment {
            nodes: vec![FragmentNode::named("a")],
            edges: vec![FragmentEdge {
                source: "a".into(),
                target: "ghost".into(),
                relation: Some("ppi".into()),
            }],
        };

        let graph = synthesize(&[result_with(ToolPayload::Fragment(fragment))]).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }
}
