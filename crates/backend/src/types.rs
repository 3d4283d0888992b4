//! Wire types shared by the pipeline and every `Backend` implementation.
//!
//! The engine owns the semantics of graphs and history records, so these
//! types stay close to raw JSON and only expose the handful of fields the
//! pipeline actually reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// WorkflowGraph
// ---------------------------------------------------------------------------

/// A declarative workflow graph: node id → node object.
///
/// Node bodies are kept as raw JSON; the engine validates them itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowGraph(Map<String, Value>);

impl WorkflowGraph {
    /// Wrap a JSON value, returning `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a node body by id.
    pub fn node(&self, id: &str) -> Option<&Value> {
        self.0.get(id)
    }

    /// Mutable iteration over `(node_id, node_body)` pairs.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = (&String, &mut Value)> {
        self.0.iter_mut()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for WorkflowGraph {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ---------------------------------------------------------------------------
// JobHandle
// ---------------------------------------------------------------------------

/// Opaque job identifier (`prompt_id`) handed out by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// CompletionRecord
// ---------------------------------------------------------------------------

/// The engine's history entry for a finished job.
///
/// `outputs` maps an output-producing node id to a mapping of
/// output category → list of items.  A record only exists once `outputs`
/// is a non-empty object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub outputs: Map<String, Value>,
}

impl CompletionRecord {
    /// Build a record from a raw history entry.
    ///
    /// Returns `None` while the entry is missing, not an object, or has no
    /// outputs yet.
    pub fn from_history_entry(entry: Option<&Value>) -> Option<Self> {
        let outputs = entry?.get("outputs")?.as_object()?;
        if outputs.is_empty() {
            return None;
        }
        Some(Self {
            outputs: outputs.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Submission payloads
// ---------------------------------------------------------------------------

/// Body of `POST /prompt`.
#[derive(Debug, Serialize)]
pub(crate) struct SubmitPayload<'a> {
    pub prompt: &'a WorkflowGraph,
    pub client_id: &'a str,
}

/// The part of the `POST /prompt` response we care about.
#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    pub prompt_id: String,
}
