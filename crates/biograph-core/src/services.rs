//! Trait seams for the external collaborators.
//!
//! The knowledge-graph and literature services are consumed behind these
//! traits; HTTP implementations live in the interaction crate and tests
//! substitute mocks. A 404-class response must surface as
//! [`BioGraphError::NotFound`] so the tool adapters can turn it into a
//! benign, narratable sentinel instead of a fault.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BioGraphError;
use crate::tool::{Citation, GraphFragment, RelationEdge};

/// An entity search hit from the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityHit {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Queries against the remote biomedical knowledge graph.
#[async_trait]
pub trait KnowledgeGraphService: Send + Sync {
    /// Service liveness check.
    async fn health(&self) -> Result<Value, BioGraphError>;

    /// Summary statistics (entity counts, relation counts).
    async fn stats(&self) -> Result<Value, BioGraphError>;

    /// Resolves a free-text query to candidate entities.
    async fn search_entities(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<EntityHit>, BioGraphError>;

    /// 1-hop relations of an entity.
    async fn neighbors(&self, entity: &str, limit: usize)
    -> Result<Vec<RelationEdge>, BioGraphError>;

    /// Induced subgraph over a set of entities.
    async fn subgraph(&self, entities: &[String]) -> Result<GraphFragment, BioGraphError>;

    /// Shortest relation path between two entities.
    async fn shortest_path(
        &self,
        source: &str,
        target: &str,
    ) -> Result<Vec<RelationEdge>, BioGraphError>;

    /// Drug repurposing hypotheses for a disease.
    async fn repurposing_candidates(&self, disease: &str) -> Result<Vec<Value>, BioGraphError>;

    /// Targets, transporters, enzymes and carriers of a drug.
    async fn drug_targets(&self, drug: &str) -> Result<Vec<Value>, BioGraphError>;

    /// Candidate drug combinations for a disease.
    async fn drug_combinations(&self, disease: &str) -> Result<Vec<Value>, BioGraphError>;

    /// Mechanistic paths linking a drug to a disease.
    async fn mechanism_paths(
        &self,
        drug: &str,
        disease: &str,
    ) -> Result<Vec<RelationEdge>, BioGraphError>;

    /// Phenotypes associated with a disease.
    async fn phenotype_associations(
        &self,
        disease: &str,
    ) -> Result<Vec<RelationEdge>, BioGraphError>;

    /// Environmental exposures associated with a disease.
    async fn environmental_risks(&self, disease: &str)
    -> Result<Vec<RelationEdge>, BioGraphError>;
}

/// Ranked literature search for an entity.
#[async_trait]
pub trait LiteratureService: Send + Sync {
    /// Searches publications about an entity.
    async fn search(
        &self,
        entity: &str,
        entity_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Citation>, BioGraphError>;
}
