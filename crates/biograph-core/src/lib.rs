//! BioGraph Assistant core.
//!
//! Domain types and pure algorithms for the tool-calling research
//! assistant: conversation messages, tool call contracts, the mutually
//! exclusive tool modes, history windowing, result truncation and graph
//! synthesis, plus the trait seams (`ChatModel`, `KnowledgeGraphService`,
//! `LiteratureService`) the orchestrator consumes. This crate holds no
//! network or persistence code.

pub mod error;
pub mod graph;
pub mod history;
pub mod message;
pub mod mode;
pub mod model;
pub mod services;
pub mod tool;
pub mod truncate;

// Re-export common error type
pub use error::BioGraphError;
