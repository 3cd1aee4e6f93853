//! HTTP client for the remote literature-search service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use biograph_core::BioGraphError;
use biograph_core::services::LiteratureService;
use biograph_core::tool::Citation;

use crate::config::ServiceConfig;

/// REST implementation of the literature-search service.
#[derive(Clone)]
pub struct HttpLiteratureService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpLiteratureService {
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
}

#[async_trait]
impl LiteratureService for HttpLiteratureService {
    async fn search(
        &self,
        entity: &str,
        entity_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Citation>, BioGraphError> {
        let url = format!(
            "{}/api/literature/search",
            self.base_url.trim_end_matches('/')
        );
        let mut query = vec![
            ("entity", entity.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(entity_type) = entity_type {
            query.push(("type", entity_type.to_string()));
        }

        let mut request = self.client.get(url).query(&query);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }
        let response = request.send().await.map_err(|err| {
            BioGraphError::http(None, format!("literature search request failed: {err}"))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BioGraphError::not_found("literature", entity));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(BioGraphError::http(Some(status.as_u16()), body));
        }

        response.json().await.map_err(|err| {
            BioGraphError::serialization(format!("Failed to parse literature response: {err}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citations_deserialize_with_missing_fields() {
        let citations: Vec<Citation> = serde_json::from_str(
            r#"[
                { "title": "Aspirin in migraine prophylaxis", "year": 2019,
                  "citation_count": 42, "snippet": "..." },
                { "title": "Untitled preprint" }
            ]"#,
        )
        .unwrap();
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].year, Some(2019));
        assert!(citations[1].citation_count.is_none());
    }
}
