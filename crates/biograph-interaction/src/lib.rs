//! HTTP implementations of the BioGraph collaborator traits.
//!
//! This crate owns all network code: the Gemini chat client, the
//! knowledge-graph REST client and the literature-search client, plus
//! secret.json configuration loading. The application layer consumes
//! these only through the trait seams defined in `biograph-core`.

pub mod config;
pub mod gemini;
pub mod kg_client;
pub mod literature;

pub use config::{GeminiConfig, SecretConfig, ServiceConfig, load_secret_config};
pub use gemini::GeminiChatModel;
pub use kg_client::HttpKnowledgeGraph;
pub use literature::HttpLiteratureService;
