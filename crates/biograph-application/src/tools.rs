//! Tool adapter registry.
//!
//! Maps each [`ToolName`] to its external call, converts failures into
//! model-visible values, and caps oversized results. Dispatch is a match
//! over the enum, so adding a tool without an adapter fails to compile.

use std::sync::Arc;

use serde_json::{Value, json};

use biograph_core::BioGraphError;
use biograph_core::services::{KnowledgeGraphService, LiteratureService};
use biograph_core::tool::{ToolCallRequest, ToolCallResult, ToolName, ToolPayload};
use biograph_core::truncate;

const DEFAULT_SEARCH_LIMIT: usize = 10;
const DEFAULT_NEIGHBOR_LIMIT: usize = 50;
const DEFAULT_LITERATURE_LIMIT: usize = 10;

/// Executes tool calls against the backing services.
#[derive(Clone)]
pub struct ToolRegistry {
    kg: Arc<dyn KnowledgeGraphService>,
    literature: Arc<dyn LiteratureService>,
}

impl ToolRegistry {
    /// Creates a registry over the given services.
    pub fn new(kg: Arc<dyn KnowledgeGraphService>, literature: Arc<dyn LiteratureService>) -> Self {
        Self { kg, literature }
    }

    /// Executes one tool call, always producing exactly one result.
    ///
    /// Not-found failures become benign sentinel texts the model can
    /// narrate; anything else becomes an `{error: true, message}` value.
    /// Successful list results are capped before being returned.
    pub async fn execute(&self, call: &ToolCallRequest) -> ToolCallResult {
        match self.dispatch(call).await {
            Ok(payload) => {
                let (payload, truncation) = truncate::apply(payload);
                ToolCallResult::success(call.name, call.args.clone(), payload, truncation)
            }
            Err(err) if err.is_not_found() => ToolCallResult::success(
                call.name,
                call.args.clone(),
                ToolPayload::Text(not_found_sentinel(call)),
                None,
            ),
            Err(err) => {
                tracing::warn!(
                    target: "tool_exec",
                    tool = %call.name,
                    error = %err,
                    "tool execution failed"
                );
                ToolCallResult::error(call.name, call.args.clone(), err.to_string())
            }
        }
    }

    async fn dispatch(&self, call: &ToolCallRequest) -> Result<ToolPayload, BioGraphError> {
        match call.name {
            ToolName::SearchEntities => {
                let query = require_str(call, "query")?;
                let limit = optional_usize(call, "limit", DEFAULT_SEARCH_LIMIT);
                let hits = self.kg.search_entities(query, limit).await?;
                let items = hits.into_iter().map(|hit| json!(hit)).collect();
                Ok(ToolPayload::Items(items))
            }
            ToolName::GetGraphStats => Ok(ToolPayload::Value(self.kg.stats().await?)),
            ToolName::GetNeighbors => {
                let entity = require_str(call, "entity")?;
                let limit = optional_usize(call, "limit", DEFAULT_NEIGHBOR_LIMIT);
                Ok(ToolPayload::Edges(self.kg.neighbors(entity, limit).await?))
            }
            ToolName::GetSubgraph => {
                let entities = require_string_array(call, "entities")?;
                Ok(ToolPayload::Fragment(self.kg.subgraph(&entities).await?))
            }
            ToolName::GetShortestPath => {
                let source = require_str(call, "source")?;
                let target = require_str(call, "target")?;
                Ok(ToolPayload::Edges(
                    self.kg.shortest_path(source, target).await?,
                ))
            }
            ToolName::GetRepurposingCandidates => {
                let disease = require_str(call, "disease")?;
                Ok(ToolPayload::Named {
                    key: "candidates",
                    items: self.kg.repurposing_candidates(disease).await?,
                })
            }
            ToolName::GetDrugTargets => {
                let drug = require_str(call, "drug")?;
                Ok(ToolPayload::Named {
                    key: "targets",
                    items: self.kg.drug_targets(drug).await?,
                })
            }
            ToolName::GetDrugCombinations => {
                let disease = require_str(call, "disease")?;
                Ok(ToolPayload::Named {
                    key: "combinations",
                    items: self.kg.drug_combinations(disease).await?,
                })
            }
            ToolName::GetMechanismPaths => {
                let drug = require_str(call, "drug")?;
                let disease = require_str(call, "disease")?;
                Ok(ToolPayload::Edges(
                    self.kg.mechanism_paths(drug, disease).await?,
                ))
            }
            ToolName::GetPhenotypeAssociations => {
                let disease = require_str(call, "disease")?;
                Ok(ToolPayload::Edges(
                    self.kg.phenotype_associations(disease).await?,
                ))
            }
            ToolName::GetEnvironmentalRisks => {
                let disease = require_str(call, "disease")?;
                Ok(ToolPayload::Edges(
                    self.kg.environmental_risks(disease).await?,
                ))
            }
            ToolName::SearchLiterature => {
                let entity = require_str(call, "entity")?;
                let entity_type = call.args.get("entityType").and_then(Value::as_str);
                let limit = optional_usize(call, "limit", DEFAULT_LITERATURE_LIMIT);
                Ok(ToolPayload::Citations(
                    self.literature.search(entity, entity_type, limit).await?,
                ))
            }
        }
    }
}

/// Required arguments are a caller error when missing, never defaulted.
fn require_str<'a>(call: &'a ToolCallRequest, key: &str) -> Result<&'a str, BioGraphError> {
    call.args
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            BioGraphError::invalid_argument(format!(
                "{}: missing required argument '{key}'",
                call.name
            ))
        })
}

fn require_string_array(call: &ToolCallRequest, key: &str) -> Result<Vec<String>, BioGraphError> {
    let values = call
        .args
        .get(key)
        .and_then(Value::as_array)
        .filter(|values| !values.is_empty())
        .ok_or_else(|| {
            BioGraphError::invalid_argument(format!(
                "{}: missing required argument '{key}'",
                call.name
            ))
        })?;
    values
        .iter()
        .map(|value| {
            value.as_str().map(str::to_string).ok_or_else(|| {
                BioGraphError::invalid_argument(format!(
                    "{}: argument '{key}' must be an array of strings",
                    call.name
                ))
            })
        })
        .collect()
}

fn optional_usize(call: &ToolCallRequest, key: &str, default: usize) -> usize {
    call.args
        .get(key)
        .and_then(Value::as_u64)
        .map(|value| value as usize)
        .unwrap_or(default)
}

fn not_found_sentinel(call: &ToolCallRequest) -> String {
    let arg = |key: &str| {
        call.args
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("the requested entity")
            .to_string()
    };
    match call.name {
        ToolName::GetShortestPath => format!(
            "No path found between '{}' and '{}'.",
            arg("source"),
            arg("target")
        ),
        ToolName::GetMechanismPaths => format!(
            "No mechanistic paths found linking '{}' to '{}'.",
            arg("drug"),
            arg("disease")
        ),
        ToolName::SearchEntities => format!("No entities matched '{}'.", arg("query")),
        ToolName::SearchLiterature => format!("No publications found for '{}'.", arg("entity")),
        ToolName::GetDrugTargets => format!("No results found for '{}'.", arg("drug")),
        _ => format!("No results found for '{}'.", arg("disease")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use biograph_core::services::EntityHit;
    use biograph_core::tool::{Citation, GraphFragment, RelationEdge, ToolOutcome};
    use serde_json::Map;

    struct StubKnowledgeGraph;

    #[async_trait]
    impl KnowledgeGraphService for StubKnowledgeGraph {
        async fn health(&self) -> Result<Value, BioGraphError> {
            Ok(json!({ "status": "ok" }))
        }

        async fn stats(&self) -> Result<Value, BioGraphError> {
            Ok(json!({ "entities": 4000000 }))
        }

        async fn search_entities(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<EntityHit>, BioGraphError> {
            Ok(vec![EntityHit {
                name: "aspirin".into(),
                entity_type: Some("drug".into()),
                db_id: None,
                score: Some(0.98),
            }])
        }

        async fn neighbors(
            &self,
            entity: &str,
            _limit: usize,
        ) -> Result<Vec<RelationEdge>, BioGraphError> {
            // More edges than the default cap, to exercise truncation.
            Ok((0..40)
                .map(|i| RelationEdge::new(entity, "ppi", format!("p{i}")))
                .collect())
        }

        async fn subgraph(&self, _entities: &[String]) -> Result<GraphFragment, BioGraphError> {
            Ok(GraphFragment::default())
        }

        async fn shortest_path(
            &self,
            source: &str,
            target: &str,
        ) -> Result<Vec<RelationEdge>, BioGraphError> {
            Err(BioGraphError::not_found(
                "path",
                format!("{source} -> {target}"),
            ))
        }

        async fn repurposing_candidates(
            &self,
            _disease: &str,
        ) -> Result<Vec<Value>, BioGraphError> {
            Ok(vec![json!({ "drug": "metformin", "score": 0.7 })])
        }

        async fn drug_targets(&self, _drug: &str) -> Result<Vec<Value>, BioGraphError> {
            Ok(Vec::new())
        }

        async fn drug_combinations(&self, _disease: &str) -> Result<Vec<Value>, BioGraphError> {
            Ok(Vec::new())
        }

        async fn mechanism_paths(
            &self,
            _drug: &str,
            _disease: &str,
        ) -> Result<Vec<RelationEdge>, BioGraphError> {
            Err(BioGraphError::http(Some(500), "graph engine crashed"))
        }

        async fn phenotype_associations(
            &self,
            _disease: &str,
        ) -> Result<Vec<RelationEdge>, BioGraphError> {
            Ok(Vec::new())
        }

        async fn environmental_risks(
            &self,
            _disease: &str,
        ) -> Result<Vec<RelationEdge>, BioGraphError> {
            Ok(Vec::new())
        }
    }

    struct StubLiterature;

    #[async_trait]
    impl LiteratureService for StubLiterature {
        async fn search(
            &self,
            _entity: &str,
            _entity_type: Option<&str>,
            _limit: usize,
        ) -> Result<Vec<Citation>, BioGraphError> {
            Ok(Vec::new())
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new(Arc::new(StubKnowledgeGraph), Arc::new(StubLiterature))
    }

    fn call(name: ToolName, args: Value) -> ToolCallRequest {
        let map = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        ToolCallRequest::new(name, map)
    }

    #[tokio::test]
    async fn missing_required_argument_is_an_error_value() {
        let result = registry()
            .execute(&call(ToolName::GetNeighbors, json!({})))
            .await;
        assert!(result.is_error());
        let value = result.to_model_value();
        assert_eq!(value["error"], true);
        assert!(
            value["message"]
                .as_str()
                .unwrap()
                .contains("missing required argument 'entity'")
        );
    }

    #[tokio::test]
    async fn non_string_array_elements_are_rejected() {
        let result = registry()
            .execute(&call(
                ToolName::GetSubgraph,
                json!({ "entities": [1, 2, 3] }),
            ))
            .await;
        assert!(result.is_error());
        assert!(
            result.to_model_value()["message"]
                .as_str()
                .unwrap()
                .contains("must be an array of strings")
        );
    }

    #[tokio::test]
    async fn successful_results_are_truncated() {
        let result = registry()
            .execute(&call(ToolName::GetNeighbors, json!({ "entity": "TP53" })))
            .await;
        let ToolOutcome::Success {
            payload: ToolPayload::Edges(edges),
            truncation,
        } = &result.outcome
        else {
            panic!("expected edges");
        };
        assert_eq!(edges.len(), truncate::DEFAULT_ITEM_CAP);
        assert_eq!(truncation.unwrap().original_count, 40);
    }

    #[tokio::test]
    async fn not_found_becomes_a_benign_sentinel() {
        let result = registry()
            .execute(&call(
                ToolName::GetShortestPath,
                json!({ "source": "aspirin", "target": "ALS" }),
            ))
            .await;
        assert!(!result.is_error());
        let ToolOutcome::Success {
            payload: ToolPayload::Text(text),
            ..
        } = &result.outcome
        else {
            panic!("expected sentinel text");
        };
        assert_eq!(text, "No path found between 'aspirin' and 'ALS'.");
    }

    #[tokio::test]
    async fn other_failures_surface_as_error_values() {
        let result = registry()
            .execute(&call(
                ToolName::GetMechanismPaths,
                json!({ "drug": "aspirin", "disease": "migraine" }),
            ))
            .await;
        assert!(result.is_error());
        let value = result.to_model_value();
        assert!(value["message"].as_str().unwrap().contains("graph engine"));
    }

    #[tokio::test]
    async fn named_wrappers_keep_their_key() {
        let result = registry()
            .execute(&call(
                ToolName::GetRepurposingCandidates,
                json!({ "disease": "ALS" }),
            ))
            .await;
        let value = result.to_model_value();
        assert!(value.get("candidates").is_some());
    }
}
