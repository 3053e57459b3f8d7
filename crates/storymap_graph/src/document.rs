// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persistable graph document.
//!
//! ```json
//! {
//!   "nodes": [{ "uid": "…", "x": 0, "y": 0, "name": "", "story": "", "reference": "" }],
//!   "connections": [{
//!     "startNodeId": 0, "endNodeId": 1,
//!     "startNodeUid": "…", "endNodeUid": "…",
//!     "description": "", "symbol": ""
//!   }]
//! }
//! ```
//!
//! `startNodeId`/`endNodeId` are positions in the `nodes` array. Documents
//! written here also carry the node `uid`s, which take precedence on load so
//! reordering the node list cannot silently re-wire connections. Documents
//! without uids resolve positionally.
//!
//! Loading assigns fresh node and connection IDs. A connection whose
//! reference cannot be resolved is skipped and reported; the rest of the
//! document still loads.

use crate::graph::{Graph, GraphError};
use crate::node::NodeId;
use emath::pos2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Serialized graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Nodes in store order
    pub nodes: Vec<DocumentNode>,
    /// Connections in store order
    pub connections: Vec<DocumentConnection>,
}

/// Serialized node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    /// Document-local identity used by connection references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uuid>,
    /// Left edge
    #[serde(default)]
    pub x: f32,
    /// Top edge
    #[serde(default)]
    pub y: f32,
    /// Name
    #[serde(default)]
    pub name: String,
    /// Story
    #[serde(default)]
    pub story: String,
    /// Reference
    #[serde(default)]
    pub reference: String,
}

/// Serialized connection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentConnection {
    /// Index of the start node in [`GraphDocument::nodes`]
    #[serde(default)]
    pub start_node_id: Option<i64>,
    /// Index of the end node in [`GraphDocument::nodes`]
    #[serde(default)]
    pub end_node_id: Option<i64>,
    /// `uid` of the start node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_node_uid: Option<Uuid>,
    /// `uid` of the end node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_node_uid: Option<Uuid>,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Symbol
    #[serde(default)]
    pub symbol: String,
}

/// Outcome of loading a document
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Nodes created
    pub nodes: usize,
    /// Connections created
    pub connections: usize,
    /// Connections that were skipped, with the reason
    pub skipped: Vec<DocumentError>,
}

impl LoadReport {
    /// Whether every entry of the document was loaded
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Error when reading a document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The document does not have the expected shape
    #[error("Invalid canvas data format: {0}")]
    Validation(String),

    /// The text is not valid JSON
    #[error("Error parsing JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A connection refers to a node that is not in the document
    #[error("Connection {index} refers to missing node {reference}")]
    MalformedReference {
        /// Position of the connection in the document
        index: usize,
        /// The unresolved reference
        reference: String,
    },

    /// The graph refused a connection (self-loop or saturated pair)
    #[error("Connection {index} rejected: {source}")]
    Rejected {
        /// Position of the connection in the document
        index: usize,
        /// Why the graph refused it
        source: GraphError,
    },
}

/// Snapshot a graph as a document
pub fn serialize(graph: &Graph) -> GraphDocument {
    GraphDocument::from_graph(graph)
}

/// Build a fresh graph from a document
pub fn deserialize(document: &GraphDocument) -> (Graph, LoadReport) {
    let mut graph = Graph::new();
    let report = document.load_into(&mut graph);
    (graph, report)
}

impl GraphDocument {
    /// Snapshot a graph. Connection endpoints become positions in the
    /// emitted node list, alongside the nodes' uids.
    pub fn from_graph(graph: &Graph) -> Self {
        let nodes = graph
            .nodes()
            .map(|n| DocumentNode {
                uid: Some(n.id.0),
                x: n.position.x,
                y: n.position.y,
                name: n.name.clone(),
                story: n.story.clone(),
                reference: n.reference.clone(),
            })
            .collect();

        let index = |id: NodeId| graph.node_index(id).map(|i| i as i64);
        let connections = graph
            .connections()
            .map(|c| DocumentConnection {
                start_node_id: index(c.start_node),
                end_node_id: index(c.end_node),
                start_node_uid: Some(c.start_node.0),
                end_node_uid: Some(c.end_node.0),
                description: c.description.clone(),
                symbol: c.symbol.clone(),
            })
            .collect();

        Self { nodes, connections }
    }

    /// Parse and validate JSON text
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Validate and convert a JSON value.
    ///
    /// Both `nodes` and `connections` must be present and be arrays, and no
    /// two nodes may share a `uid`.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        Self::validate(&value)?;
        let document: Self =
            serde_json::from_value(value).map_err(|e| DocumentError::Validation(e.to_string()))?;
        let mut seen = HashSet::new();
        if let Some(uid) = document.nodes.iter().filter_map(|n| n.uid).find(|uid| !seen.insert(*uid)) {
            return Err(DocumentError::Validation(format!("duplicate node uid {uid}")));
        }
        Ok(document)
    }

    /// Check the structural shape of a JSON value
    pub fn validate(value: &Value) -> Result<(), DocumentError> {
        let Some(object) = value.as_object() else {
            return Err(DocumentError::Validation("document must be an object".to_string()));
        };
        for key in ["nodes", "connections"] {
            if !object.get(key).is_some_and(Value::is_array) {
                return Err(DocumentError::Validation(format!("`{key}` must be an array")));
            }
        }
        Ok(())
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace the graph's contents with this document.
    ///
    /// Nodes are rebuilt in document order with fresh IDs, then
    /// connections are resolved against them. Unresolvable connections are
    /// skipped and listed in the report. A repeated `uid` refers to the
    /// first node carrying it.
    pub fn load_into(&self, graph: &mut Graph) -> LoadReport {
        graph.clear();

        let created: Vec<NodeId> = self
            .nodes
            .iter()
            .map(|n| {
                graph.add_node(
                    pos2(n.x, n.y),
                    n.name.clone(),
                    n.story.clone(),
                    n.reference.clone(),
                )
            })
            .collect();

        let mut by_uid: HashMap<Uuid, usize> = HashMap::new();
        for (i, uid) in self.nodes.iter().enumerate().filter_map(|(i, n)| n.uid.map(|uid| (i, uid))) {
            by_uid.entry(uid).or_insert(i);
        }

        let mut report = LoadReport {
            nodes: created.len(),
            ..LoadReport::default()
        };

        for (index, c) in self.connections.iter().enumerate() {
            let ends = self
                .resolve(index, c.start_node_uid, c.start_node_id, &by_uid)
                .and_then(|s| {
                    self.resolve(index, c.end_node_uid, c.end_node_id, &by_uid)
                        .map(|e| (s, e))
                });
            let (start, end) = match ends {
                Ok(ends) => ends,
                Err(err) => {
                    tracing::warn!("Dropping connection: {err}");
                    report.skipped.push(err);
                    continue;
                }
            };

            match graph.create_connection(created[start], created[end], c.description.clone(), c.symbol.clone()) {
                Ok(_) => report.connections += 1,
                Err(source) => {
                    let err = DocumentError::Rejected { index, source };
                    tracing::warn!("Dropping connection: {err}");
                    report.skipped.push(err);
                }
            }
        }

        tracing::info!(
            "Loaded {} nodes and {} connections ({} skipped)",
            report.nodes,
            report.connections,
            report.skipped.len()
        );
        report
    }

    /// Resolve one endpoint to a position in `self.nodes`
    fn resolve(
        &self,
        index: usize,
        uid: Option<Uuid>,
        position: Option<i64>,
        by_uid: &HashMap<Uuid, usize>,
    ) -> Result<usize, DocumentError> {
        if let Some(uid) = uid {
            return by_uid.get(&uid).copied().ok_or(DocumentError::MalformedReference {
                index,
                reference: uid.to_string(),
            });
        }
        position
            .and_then(|p| usize::try_from(p).ok())
            .filter(|p| *p < self.nodes.len())
            .ok_or_else(|| DocumentError::MalformedReference {
                index,
                reference: position.map_or_else(|| "none".to_string(), |p| p.to_string()),
            })
    }
}
