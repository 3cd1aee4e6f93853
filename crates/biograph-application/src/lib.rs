//! Application layer for BioGraph Assistant.
//!
//! This crate provides the use cases that coordinate between the domain
//! layer and the infrastructure adapters: the tool registry executing
//! model-requested knowledge-graph and literature queries, and the turn
//! use case driving the multi-turn tool-calling conversation loop.

pub mod tools;
pub mod turn_usecase;

pub use tools::ToolRegistry;
pub use turn_usecase::{CompletedTurn, TurnOptions, TurnOutcome, TurnUseCase};
