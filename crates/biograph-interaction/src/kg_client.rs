//! HTTP client for the remote biomedical knowledge-graph service.
//!
//! Implements [`KnowledgeGraphService`] against a REST API. A 404 from
//! the service is mapped to [`BioGraphError::NotFound`] so the tool
//! adapters can narrate "nothing found" instead of failing the turn.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use biograph_core::BioGraphError;
use biograph_core::services::{EntityHit, KnowledgeGraphService};
use biograph_core::tool::{GraphFragment, RelationEdge};

use crate::config::ServiceConfig;

/// REST implementation of the knowledge-graph service.
#[derive(Clone)]
pub struct HttpKnowledgeGraph {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpKnowledgeGraph {
    /// Creates a client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Creates a client from a loaded secret configuration.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Attaches an API key sent as the `x-api-key` header.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        subject: &str,
    ) -> Result<T, BioGraphError> {
        let mut request = self.client.get(self.url(path)).query(query);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }
        let response = request.send().await.map_err(|err| {
            BioGraphError::http(None, format!("knowledge graph request failed: {err}"))
        })?;
        Self::decode(response, subject).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        subject: &str,
    ) -> Result<T, BioGraphError> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }
        let response = request.send().await.map_err(|err| {
            BioGraphError::http(None, format!("knowledge graph request failed: {err}"))
        })?;
        Self::decode(response, subject).await
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        subject: &str,
    ) -> Result<T, BioGraphError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BioGraphError::not_found("graph entity", subject));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(BioGraphError::http(
                Some(status.as_u16()),
                extract_error_message(&body),
            ));
        }
        response.json().await.map_err(|err| {
            BioGraphError::serialization(format!(
                "Failed to parse knowledge graph response: {err}"
            ))
        })
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .or_else(|| json.get("detail"))
                .and_then(|msg| msg.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl KnowledgeGraphService for HttpKnowledgeGraph {
    async fn health(&self) -> Result<Value, BioGraphError> {
        self.get_json("api/health", &[], "health").await
    }

    async fn stats(&self) -> Result<Value, BioGraphError> {
        self.get_json("api/stats", &[], "stats").await
    }

    async fn search_entities(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<EntityHit>, BioGraphError> {
        self.get_json(
            "api/search",
            &[("q", query.to_string()), ("limit", limit.to_string())],
            query,
        )
        .await
    }

    async fn neighbors(
        &self,
        entity: &str,
        limit: usize,
    ) -> Result<Vec<RelationEdge>, BioGraphError> {
        self.get_json(
            "api/neighbors",
            &[("entity", entity.to_string()), ("limit", limit.to_string())],
            entity,
        )
        .await
    }

    async fn subgraph(&self, entities: &[String]) -> Result<GraphFragment, BioGraphError> {
        let body = serde_json::json!({ "entities": entities });
        self.post_json("api/subgraph", &body, &entities.join(", "))
            .await
    }

    async fn shortest_path(
        &self,
        source: &str,
        target: &str,
    ) -> Result<Vec<RelationEdge>, BioGraphError> {
        self.get_json(
            "api/shortest_path",
            &[("source", source.to_string()), ("target", target.to_string())],
            &format!("{source} -> {target}"),
        )
        .await
    }

    async fn repurposing_candidates(&self, disease: &str) -> Result<Vec<Value>, BioGraphError> {
        self.get_json(
            "api/hypotheses/repurposing",
            &[("disease", disease.to_string())],
            disease,
        )
        .await
    }

    async fn drug_targets(&self, drug: &str) -> Result<Vec<Value>, BioGraphError> {
        self.get_json("api/hypotheses/targets", &[("drug", drug.to_string())], drug)
            .await
    }

    async fn drug_combinations(&self, disease: &str) -> Result<Vec<Value>, BioGraphError> {
        self.get_json(
            "api/hypotheses/combinations",
            &[("disease", disease.to_string())],
            disease,
        )
        .await
    }

    async fn mechanism_paths(
        &self,
        drug: &str,
        disease: &str,
    ) -> Result<Vec<RelationEdge>, BioGraphError> {
        self.get_json(
            "api/hypotheses/mechanism",
            &[("drug", drug.to_string()), ("disease", disease.to_string())],
            &format!("{drug} -> {disease}"),
        )
        .await
    }

    async fn phenotype_associations(
        &self,
        disease: &str,
    ) -> Result<Vec<RelationEdge>, BioGraphError> {
        self.get_json(
            "api/hypotheses/phenotypes",
            &[("disease", disease.to_string())],
            disease,
        )
        .await
    }

    async fn environmental_risks(
        &self,
        disease: &str,
    ) -> Result<Vec<RelationEdge>, BioGraphError> {
        self.get_json(
            "api/hypotheses/environmental",
            &[("disease", disease.to_string())],
            disease,
        )
        .await
    }
}
