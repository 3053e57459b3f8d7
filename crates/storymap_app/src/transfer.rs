// SPDX-License-Identifier: MIT OR Apache-2.0
//! Import and export of graph documents as JSON files.

use std::path::{Path, PathBuf};
use storymap_graph::{DocumentError, Graph, GraphDocument, LoadReport};

/// Error when moving a document in or out of a file
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Filesystem failure
    #[error("Failed to access {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The content is not a valid document
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Pretty-printed JSON of the whole graph
pub fn export_document(graph: &Graph) -> Result<String, DocumentError> {
    GraphDocument::from_graph(graph).to_json()
}

/// Write the graph to a JSON file
pub fn export_to_path(graph: &Graph, path: &Path) -> Result<(), TransferError> {
    let json = export_document(graph)?;
    std::fs::write(path, json).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        "Exported {} nodes and {} connections to {}",
        graph.node_count(),
        graph.connection_count(),
        path.display()
    );
    Ok(())
}

/// Replace the graph with a JSON document.
///
/// The document is validated before anything is touched, so a rejected
/// import leaves the graph as it was.
pub fn import_str(graph: &mut Graph, text: &str) -> Result<LoadReport, DocumentError> {
    let document = GraphDocument::parse(text).inspect_err(|err| {
        tracing::warn!("Import rejected: {err}");
    })?;
    Ok(document.load_into(graph))
}

/// Replace the graph with the contents of a JSON file
pub fn import_path(graph: &mut Graph, path: &Path) -> Result<LoadReport, TransferError> {
    let text = std::fs::read_to_string(path).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let report = import_str(graph, &text)?;
    tracing::info!("Imported {}", path.display());
    Ok(report)
}
