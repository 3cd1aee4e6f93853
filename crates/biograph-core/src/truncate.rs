//! Result truncation.
//!
//! Caps oversized tool outputs before they are fed back to the model, to
//! protect the conversation's token budget. Truncation always keeps the
//! first N items in original order and reports the pre-truncation count
//! through [`TruncationMeta`].

use std::collections::HashSet;

use crate::tool::{GraphFragment, ToolPayload, TruncationMeta};

/// Default cap applied to every list-shaped tool result.
pub const DEFAULT_ITEM_CAP: usize = 25;

/// Fragment edges are allowed up to this multiple of the node cap.
pub const FRAGMENT_EDGE_FACTOR: usize = 2;

/// Applies the default cap to a payload.
pub fn apply(payload: ToolPayload) -> (ToolPayload, Option<TruncationMeta>) {
    apply_with_cap(payload, DEFAULT_ITEM_CAP)
}

/// Applies an explicit cap to a payload.
///
/// Each list shape is capped independently; text and passthrough values
/// are returned unchanged.
pub fn apply_with_cap(payload: ToolPayload, cap: usize) -> (ToolPayload, Option<TruncationMeta>) {
    match payload {
        ToolPayload::Edges(items) => {
            let (items, meta) = cap_items(items, cap);
            (ToolPayload::Edges(items), meta)
        }
        ToolPayload::Items(items) => {
            let (items, meta) = cap_items(items, cap);
            (ToolPayload::Items(items), meta)
        }
        ToolPayload::Citations(items) => {
            let (items, meta) = cap_items(items, cap);
            (ToolPayload::Citations(items), meta)
        }
        ToolPayload::Named { key, items } => {
            let (items, meta) = cap_items(items, cap);
            (ToolPayload::Named { key, items }, meta)
        }
        ToolPayload::Fragment(fragment) => {
            let (fragment, meta) = cap_fragment(fragment, cap);
            (ToolPayload::Fragment(fragment), meta)
        }
        passthrough @ (ToolPayload::Text(_) | ToolPayload::Value(_)) => (passthrough, None),
    }
}

/// Caps a plain list, keeping a prefix of the original order.
pub fn cap_items<T>(mut items: Vec<T>, cap: usize) -> (Vec<T>, Option<TruncationMeta>) {
    let original_count = items.len();
    if original_count <= cap {
        return (items, None);
    }
    items.truncate(cap);
    (
        items,
        Some(TruncationMeta {
            original_count,
            original_edge_count: None,
        }),
    )
}

/// Caps a nodes+edges fragment.
///
/// Nodes are capped first; edges are then re-filtered to reference only
/// surviving nodes and capped at `cap * FRAGMENT_EDGE_FACTOR`.
pub fn cap_fragment(
    mut fragment: GraphFragment,
    cap: usize,
) -> (GraphFragment, Option<TruncationMeta>) {
    let original_count = fragment.nodes.len();
    let original_edge_count = fragment.edges.len();

    fragment.nodes.truncate(cap);

    let surviving: HashSet<&str> = fragment
        .nodes
        .iter()
        .filter_map(|node| node.identifier())
        .collect();
    fragment.edges.retain(|edge| {
        surviving.contains(edge.source.as_str()) && surviving.contains(edge.target.as_str())
    });
    fragment.edges.truncate(cap * FRAGMENT_EDGE_FACTOR);

    if fragment.nodes.len() == original_count && fragment.edges.len() == original_edge_count {
        return (fragment, None);
    }
    (
        fragment,
        Some(TruncationMeta {
            original_count,
            original_edge_count: Some(original_edge_count),
        }),
    )
}
