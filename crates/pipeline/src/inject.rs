//! Per-request endpoint injection into connectivity nodes.

use serde_json::{Map, Value};

use backend::WorkflowGraph;

/// `class_type` substring that identifies a connectivity node.
pub const DEFAULT_CONNECTIVITY_MARKER: &str = "OllamaConnectivity";

/// Input key that receives the endpoint.
pub const ENDPOINT_INPUT: &str = "url";

/// Set `inputs.url = endpoint` on every node whose `class_type` contains
/// `marker`, creating `inputs` when the node has none.  Returns how many nodes
/// were modified.
///
/// The graph is mutated in place.  A matching node whose `inputs` exists but
/// is not an object is left alone and not counted.
pub fn inject(graph: &mut WorkflowGraph, marker: &str, endpoint: &str) -> usize {
    let mut injected = 0;

    for (_, node) in graph.nodes_mut() {
        let Some(node) = node.as_object_mut() else {
            continue;
        };
        let matches = node
            .get("class_type")
            .and_then(Value::as_str)
            .is_some_and(|class_type| class_type.contains(marker));
        if !matches {
            continue;
        }

        let inputs = node
            .entry("inputs")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(inputs) = inputs.as_object_mut() {
            inputs.insert(ENDPOINT_INPUT.to_string(), Value::String(endpoint.to_string()));
            injected += 1;
        }
    }

    injected
}
