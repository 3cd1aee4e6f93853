//! Tool-mode selection.
//!
//! A turn runs with exactly one of two disjoint tool sets: the structured
//! knowledge-graph function declarations, or the provider-native web
//! search. The provider rejects requests that mix its native search
//! capability with user-defined function declarations, so the two are
//! never combined.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::tool::{ToolDeclaration, ToolName};

const KNOWLEDGE_GRAPH_INSTRUCTION: &str = "You are BioGraph Assistant, a biomedical research \
copilot backed by a structured knowledge graph. Answer using the provided knowledge-graph tools: \
resolve entity mentions with searchEntities before querying other tools, and cite which tool \
results support each claim. If a tool reports that nothing was found, say so plainly instead of \
guessing. Web search is not available in this mode.";

const WEB_SEARCH_INSTRUCTION: &str = "You are BioGraph Assistant, a biomedical research copilot. \
Web search is enabled for this turn: ground your answer in current search results and cite your \
sources. The structured knowledge-graph tools are not available in this mode.";

/// The mutually exclusive operating modes of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolMode {
    /// Knowledge-graph function declarations are active.
    KnowledgeGraph,
    /// Provider-native web search is active; no function declarations.
    WebSearch,
}

impl ToolMode {
    /// Chooses the mode for a turn. Pure selection, no side effects.
    pub fn select(web_search: bool) -> Self {
        if web_search {
            Self::WebSearch
        } else {
            Self::KnowledgeGraph
        }
    }

    /// The function declarations to advertise for this mode.
    ///
    /// Empty in web-search mode: the provider-native search tool is
    /// enabled by the model client from the mode flag instead.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        match self {
            Self::KnowledgeGraph => ToolName::iter().map(|name| name.declaration()).collect(),
            Self::WebSearch => Vec::new(),
        }
    }

    /// Whether the provider-native search capability is enabled.
    pub fn uses_provider_search(&self) -> bool {
        matches!(self, Self::WebSearch)
    }

    /// Mode-specific guidance prepended to the system prompt.
    pub fn system_instruction(&self) -> &'static str {
        match self {
            Self::KnowledgeGraph => KNOWLEDGE_GRAPH_INSTRUCTION,
            Self::WebSearch => WEB_SEARCH_INSTRUCTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_is_deterministic() {
        assert_eq!(ToolMode::select(false), ToolMode::KnowledgeGraph);
        assert_eq!(ToolMode::select(true), ToolMode::WebSearch);
    }

    #[test]
    fn tool_sets_are_never_mixed() {
        for web_search in [false, true] {
            let mode = ToolMode::select(web_search);
            let has_declarations = !mode.declarations().is_empty();
            // Provider search and function declarations are mutually exclusive.
            assert!(!(has_declarations && mode.uses_provider_search()));
        }
    }

    #[test]
    fn knowledge_graph_mode_declares_every_tool() {
        let declarations = ToolMode::KnowledgeGraph.declarations();
        assert_eq!(declarations.len(), ToolName::iter().count());
        assert!(!ToolMode::KnowledgeGraph.uses_provider_search());
    }

    #[test]
    fn instructions_name_the_unavailable_capability() {
        assert!(
            ToolMode::KnowledgeGraph
                .system_instruction()
                .contains("Web search is not available")
        );
        assert!(
            ToolMode::WebSearch
                .system_instruction()
                .contains("knowledge-graph tools are not available")
        );
    }
}
