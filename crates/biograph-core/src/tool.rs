//! Tool call types and declarations.
//!
//! The model requests tools by name; every name the assistant understands
//! is a variant of [`ToolName`], so dispatch is checked at compile time
//! rather than through string-keyed branching. Tool results are decoded
//! into the typed [`ToolPayload`] union at the adapter boundary — the
//! graph synthesizer never has to sniff raw JSON shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use strum::{Display, EnumIter, EnumString};

/// Every tool the model may request in knowledge-graph mode.
///
/// Wire names are camelCase, matching the function declarations sent to
/// the model.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ToolName {
    /// Resolve a free-text entity mention to canonical graph entities.
    SearchEntities,
    /// Summary statistics of the knowledge graph.
    GetGraphStats,
    /// 1-hop neighborhood of an entity.
    GetNeighbors,
    /// Induced subgraph over a set of entities.
    GetSubgraph,
    /// Shortest path between two entities.
    GetShortestPath,
    /// Drug repurposing candidates for a disease.
    GetRepurposingCandidates,
    /// Known targets, transporters, enzymes and carriers of a drug.
    GetDrugTargets,
    /// Candidate drug combinations for a disease.
    GetDrugCombinations,
    /// Mechanistic paths linking a drug to a disease.
    GetMechanismPaths,
    /// Phenotypes associated with a disease.
    GetPhenotypeAssociations,
    /// Environmental risk factors associated with a disease.
    GetEnvironmentalRisks,
    /// Ranked literature citations for an entity.
    SearchLiterature,
}

impl ToolName {
    /// Short description sent to the model in the function declaration.
    pub fn description(&self) -> &'static str {
        match self {
            Self::SearchEntities => {
                "Search the knowledge graph for entities matching a free-text query. \
                 Use this first to resolve names mentioned by the user to canonical entities."
            }
            Self::GetGraphStats => {
                "Return summary statistics about the knowledge graph (entity and relation counts)."
            }
            Self::GetNeighbors => {
                "Return the direct (1-hop) relations of an entity in the knowledge graph."
            }
            Self::GetSubgraph => {
                "Return the induced subgraph connecting a set of entities."
            }
            Self::GetShortestPath => {
                "Return the shortest relation path between two entities."
            }
            Self::GetRepurposingCandidates => {
                "Return drug repurposing candidates for a disease, ranked by evidence."
            }
            Self::GetDrugTargets => {
                "Return the known targets, transporters, enzymes and carriers of a drug."
            }
            Self::GetDrugCombinations => {
                "Return candidate drug combinations for treating a disease."
            }
            Self::GetMechanismPaths => {
                "Return mechanistic paths explaining how a drug may act on a disease."
            }
            Self::GetPhenotypeAssociations => {
                "Return phenotypes associated with a disease."
            }
            Self::GetEnvironmentalRisks => {
                "Return environmental exposures associated with a disease."
            }
            Self::SearchLiterature => {
                "Search the literature for publications about an entity, ranked by citations."
            }
        }
    }

    /// JSON schema for the tool's parameters.
    pub fn parameters(&self) -> Value {
        match self {
            Self::SearchEntities => object_schema(
                json!({
                    "query": { "type": "string", "description": "Free-text entity query." },
                    "limit": { "type": "integer", "description": "Maximum number of hits." }
                }),
                &["query"],
            ),
            Self::GetGraphStats => object_schema(json!({}), &[]),
            Self::GetNeighbors => object_schema(
                json!({
                    "entity": { "type": "string", "description": "Canonical entity name." },
                    "limit": { "type": "integer", "description": "Maximum number of relations." }
                }),
                &["entity"],
            ),
            Self::GetSubgraph => object_schema(
                json!({
                    "entities": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Canonical entity names to connect."
                    }
                }),
                &["entities"],
            ),
            Self::GetShortestPath => object_schema(
                json!({
                    "source": { "type": "string", "description": "Start entity." },
                    "target": { "type": "string", "description": "End entity." }
                }),
                &["source", "target"],
            ),
            Self::GetRepurposingCandidates | Self::GetDrugCombinations
            | Self::GetPhenotypeAssociations | Self::GetEnvironmentalRisks => object_schema(
                json!({
                    "disease": { "type": "string", "description": "Canonical disease name." }
                }),
                &["disease"],
            ),
            Self::GetDrugTargets => object_schema(
                json!({
                    "drug": { "type": "string", "description": "Canonical drug name." }
                }),
                &["drug"],
            ),
            Self::GetMechanismPaths => object_schema(
                json!({
                    "drug": { "type": "string", "description": "Canonical drug name." },
                    "disease": { "type": "string", "description": "Canonical disease name." }
                }),
                &["drug", "disease"],
            ),
            Self::SearchLiterature => object_schema(
                json!({
                    "entity": { "type": "string", "description": "Entity to search for." },
                    "entityType": { "type": "string", "description": "Entity type hint (drug, disease, gene)." },
                    "limit": { "type": "integer", "description": "Maximum number of citations." }
                }),
                &["entity"],
            ),
        }
    }

    /// Builds the full declaration for this tool.
    pub fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: *self,
            description: self.description(),
            parameters: self.parameters(),
        }
    }
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// A function declaration advertised to the model.
#[derive(Debug, Clone)]
pub struct ToolDeclaration {
    pub name: ToolName,
    pub description: &'static str,
    pub parameters: Value,
}

impl ToolDeclaration {
    /// Serializes the declaration in the provider's wire shape.
    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name.to_string(),
            "description": self.description,
            "parameters": self.parameters,
        })
    }
}

/// A tool call requested by the model.
///
/// Consumed exactly once per loop iteration; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Opaque identifier correlating the eventual result.
    pub id: String,
    /// Which tool to run.
    pub name: ToolName,
    /// Argument bag as produced by the model.
    pub args: Map<String, Value>,
}

impl ToolCallRequest {
    /// Creates a request with a synthesized identifier.
    ///
    /// Used when the provider does not supply call ids of its own.
    pub fn new(name: ToolName, args: Map<String, Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            args,
        }
    }

    /// Creates a request with a provider-supplied identifier.
    pub fn with_id(id: impl Into<String>, name: ToolName, args: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name,
            args,
        }
    }
}

/// A relation edge returned by the knowledge graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEdge {
    pub source: String,
    pub target: String,
    pub relation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
}

impl RelationEdge {
    /// Creates an untyped edge.
    pub fn new(
        source: impl Into<String>,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
            source_type: None,
            target_type: None,
        }
    }
}

/// A node inside a [`GraphFragment`].
///
/// Different services populate different identifier fields; the first
/// present of `name`, `id`, `db_id`, `node_id` is the canonical one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
}

impl FragmentNode {
    /// Creates a node keyed by display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// The canonical identifier: first present of name, id, db_id, node_id.
    pub fn identifier(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .or(self.db_id.as_deref())
            .or(self.node_id.as_deref())
    }
}

/// An edge inside a [`GraphFragment`]; `relation` defaults to `related_to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentEdge {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

/// A nodes+edges object returned by subgraph-style tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphFragment {
    #[serde(default)]
    pub nodes: Vec<FragmentNode>,
    #[serde(default)]
    pub edges: Vec<FragmentEdge>,
}

/// A literature citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Typed result payload, decoded once at the tool-adapter boundary.
#[derive(Debug, Clone)]
pub enum ToolPayload {
    /// Flat edge list (neighbors, paths, association tools).
    Edges(Vec<RelationEdge>),
    /// Nodes+edges object (subgraph).
    Fragment(GraphFragment),
    /// Plain list of opaque items (entity search hits).
    Items(Vec<Value>),
    /// Named-array wrapper (`candidates`, `targets`, `combinations`).
    Named { key: &'static str, items: Vec<Value> },
    /// Literature citations.
    Citations(Vec<Citation>),
    /// Benign sentinel or other plain textual result.
    Text(String),
    /// Passthrough JSON (graph stats).
    Value(Value),
}

/// Metadata attached to a capped result.
///
/// Invariant: `original_count` always refers to the pre-truncation size,
/// so nothing is lost from the count even when items are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationMeta {
    pub original_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_edge_count: Option<usize>,
}

/// Outcome of executing one tool call.
///
/// Failures are values, never exceptions crossing back into the model:
/// the orchestrator logs them and the turn continues.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    Success {
        payload: ToolPayload,
        truncation: Option<TruncationMeta>,
    },
    Error {
        message: String,
    },
}

/// The resolved result of one tool call.
///
/// Invariant: every [`ToolCallRequest`] in a turn produces exactly one
/// `ToolCallResult`, even on failure.
#[derive(Debug, Clone)]
pub struct ToolCallResult {
    pub name: ToolName,
    pub args: Map<String, Value>,
    pub outcome: ToolOutcome,
}

impl ToolCallResult {
    /// Wraps a successful payload.
    pub fn success(
        name: ToolName,
        args: Map<String, Value>,
        payload: ToolPayload,
        truncation: Option<TruncationMeta>,
    ) -> Self {
        Self {
            name,
            args,
            outcome: ToolOutcome::Success {
                payload,
                truncation,
            },
        }
    }

    /// Wraps an execution failure as a model-visible error value.
    pub fn error(name: ToolName, args: Map<String, Value>, message: impl Into<String>) -> Self {
        Self {
            name,
            args,
            outcome: ToolOutcome::Error {
                message: message.into(),
            },
        }
    }

    /// Returns true when the outcome is an execution failure.
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Error { .. })
    }

    /// Serializes the outcome in the shape fed back to the model.
    ///
    /// Capped results are wrapped in a truncation envelope so the model
    /// knows more data exists; failures become `{error: true, message}`.
    pub fn to_model_value(&self) -> Value {
        match &self.outcome {
            ToolOutcome::Error { message } => json!({ "error": true, "message": message }),
            ToolOutcome::Success {
                payload,
                truncation,
            } => payload_to_value(payload, truncation.as_ref()),
        }
    }
}

fn payload_to_value(payload: &ToolPayload, truncation: Option<&TruncationMeta>) -> Value {
    match payload {
        ToolPayload::Edges(items) => enveloped(json!(items), "items", truncation),
        ToolPayload::Items(items) => enveloped(json!(items), "items", truncation),
        ToolPayload::Citations(items) => enveloped(json!(items), "items", truncation),
        ToolPayload::Named { key, items } => {
            let mut object = Map::new();
            object.insert((*key).to_string(), json!(items));
            if let Some(meta) = truncation {
                object.insert("truncated".to_string(), json!(true));
                object.insert("originalCount".to_string(), json!(meta.original_count));
            }
            Value::Object(object)
        }
        ToolPayload::Fragment(fragment) => match truncation {
            None => json!({ "nodes": fragment.nodes, "edges": fragment.edges }),
            Some(meta) => {
                let mut value = json!({
                    "nodes": fragment.nodes,
                    "edges": fragment.edges,
                    "truncated": true,
                    "originalCount": meta.original_count,
                });
                if let (Some(object), Some(edge_count)) =
                    (value.as_object_mut(), meta.original_edge_count)
                {
                    object.insert("originalEdgeCount".to_string(), json!(edge_count));
                }
                value
            }
        },
        ToolPayload::Text(text) => json!({ "result": text }),
        ToolPayload::Value(value) => value.clone(),
    }
}

fn enveloped(items: Value, key: &str, truncation: Option<&TruncationMeta>) -> Value {
    match truncation {
        None => items,
        Some(meta) => {
            let mut object = Map::new();
            object.insert(key.to_string(), items);
            object.insert("truncated".to_string(), json!(true));
            object.insert("originalCount".to_string(), json!(meta.original_count));
            Value::Object(object)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn tool_names_round_trip_camel_case() {
        assert_eq!(ToolName::GetShortestPath.to_string(), "getShortestPath");
        assert_eq!(
            ToolName::from_str("searchEntities").unwrap(),
            ToolName::SearchEntities
        );
        assert!(ToolName::from_str("fetchTheMoon").is_err());
    }

    #[test]
    fn declarations_carry_required_parameters() {
        let declaration = ToolName::GetShortestPath.declaration();
        let value = declaration.to_value();
        assert_eq!(value["name"], "getShortestPath");
        let required = value["parameters"]["required"].as_array().unwrap();
        assert_eq!(required.len(), 2);
    }

    #[test]
    fn fragment_node_identifier_prefers_name() {
        let node = FragmentNode {
            name: Some("aspirin".into()),
            db_id: Some("DB00945".into()),
            ..FragmentNode::default()
        };
        assert_eq!(node.identifier(), Some("aspirin"));

        let node = FragmentNode {
            db_id: Some("DB00945".into()),
            ..FragmentNode::default()
        };
        assert_eq!(node.identifier(), Some("DB00945"));
        assert_eq!(FragmentNode::default().identifier(), None);
    }

    #[test]
    fn error_outcome_serializes_as_sentinel() {
        let result = ToolCallResult::error(ToolName::GetNeighbors, Map::new(), "boom");
        let value = result.to_model_value();
        assert_eq!(value["error"], true);
        assert_eq!(value["message"], "boom");
    }

    #[test]
    fn untruncated_list_serializes_as_bare_array() {
        let result = ToolCallResult::success(
            ToolName::GetNeighbors,
            Map::new(),
            ToolPayload::Edges(vec![RelationEdge::new("a", "ppi", "b")]),
            None,
        );
        assert!(result.to_model_value().is_array());
    }

    #[test]
    fn truncated_list_carries_envelope() {
        let result = ToolCallResult::success(
            ToolName::GetNeighbors,
            Map::new(),
            ToolPayload::Edges(vec![RelationEdge::new("a", "ppi", "b")]),
            Some(TruncationMeta {
                original_count: 40,
                original_edge_count: None,
            }),
        );
        let value = result.to_model_value();
        assert_eq!(value["truncated"], true);
        assert_eq!(value["originalCount"], 40);
        assert_eq!(value["items"].as_array().unwrap().len(), 1);
    }
}
