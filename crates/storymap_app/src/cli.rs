// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line front end over a file-backed session.

use crate::session::{Notice, Session};
use crate::settings::Settings;
use crate::store::{FileStore, KeyValueStore};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use emath::pos2;
use std::io::Write;
use std::path::PathBuf;
use storymap_graph::{Graph, NodeId};

/// Edit a story map from the command line
#[derive(Parser, Debug)]
#[command(name = "storymap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Story map canvas: nodes, annotated connections, import and export")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the canvas, view state and settings
    #[arg(long, env = "STORYMAP_DATA_DIR", global = true, default_value = ".storymap")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List nodes and connections
    List,

    /// Add a node
    Add {
        /// Node name
        name: String,
        /// Left edge
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f32,
        /// Top edge
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        y: f32,
        /// Story text
        #[arg(long, default_value = "")]
        story: String,
        /// Reference text
        #[arg(long, default_value = "")]
        reference: String,
    },

    /// Rename a node
    Rename {
        /// Current name
        name: String,
        /// New name
        new_name: String,
    },

    /// Connect two nodes
    Connect {
        /// Start node name
        from: String,
        /// End node name
        to: String,
        /// Connection description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Connection symbol
        #[arg(short, long, default_value = "")]
        symbol: String,
    },

    /// Remove every connection from one node to another
    Disconnect {
        /// Start node name
        from: String,
        /// End node name
        to: String,
    },

    /// Remove a node and its connections
    Remove {
        /// Node name
        name: String,
    },

    /// Remove everything
    Clear,

    /// Replace the canvas with a JSON document
    Import {
        /// File to read
        file: PathBuf,
    },

    /// Write the canvas as JSON
    Export {
        /// File to write; standard output when omitted
        file: Option<PathBuf>,
    },

    /// Show the stored pan and zoom
    View,
}

/// Open the session in `cli.data_dir` and run the command
pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let store = FileStore::open(&cli.data_dir)
        .with_context(|| format!("Failed to open data directory {}", cli.data_dir.display()))?;
    tracing::debug!("Using data directory {}", store.root().display());
    let settings = Settings::load(&Settings::file_path(&cli.data_dir))?;
    let mut session = Session::open(store, settings)?;
    for notice in session.take_notices() {
        tracing::warn!("{notice}");
    }
    execute(&mut session, cli.command, out)
}

/// Run one command against a session
pub fn execute<S: KeyValueStore>(session: &mut Session<S>, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::List => list(session.graph(), out)?,
        Command::Add {
            name,
            x,
            y,
            story,
            reference,
        } => {
            session.edit(|g| g.add_node(pos2(x, y), name.as_str(), story, reference));
            writeln!(out, "Added {}", storymap_graph::label::display_label(&name))?;
        }
        Command::Rename { name, new_name } => {
            let id = find(session.graph(), &name)?;
            session.rename_node(id, &new_name)?;
            writeln!(out, "Renamed {name} to {}", new_name.trim())?;
        }
        Command::Connect {
            from,
            to,
            description,
            symbol,
        } => {
            let (start, end) = (find(session.graph(), &from)?, find(session.graph(), &to)?);
            session.edit(|g| g.create_connection(start, end, description, symbol))?;
            writeln!(out, "Connected {from} -> {to}")?;
        }
        Command::Disconnect { from, to } => {
            let (start, end) = (find(session.graph(), &from)?, find(session.graph(), &to)?);
            let removed = session.edit(|g| {
                let ids: Vec<_> = g
                    .connections_between(start, end)
                    .filter(|c| c.start_node == start)
                    .map(|c| c.id)
                    .collect();
                ids.into_iter().filter_map(|id| g.delete_connection(id)).count()
            });
            if removed == 0 {
                bail!("{from} is not connected to {to}");
            }
            writeln!(out, "Removed {removed} connection(s)")?;
        }
        Command::Remove { name } => {
            let id = find(session.graph(), &name)?;
            session.edit(|g| g.delete_node(id));
            writeln!(out, "Removed {name}")?;
        }
        Command::Clear => {
            session.edit(Graph::clear);
            writeln!(out, "Cleared canvas")?;
        }
        Command::Import { file } => {
            let report = session.import_path(&file)?;
            writeln!(
                out,
                "Imported {} nodes and {} connections",
                report.nodes, report.connections
            )?;
            for skipped in &report.skipped {
                writeln!(out, "Skipped: {skipped}")?;
            }
        }
        Command::Export { file: Some(file) } => {
            session.export_to_path(&file)?;
            writeln!(out, "Exported to {}", file.display())?;
        }
        Command::Export { file: None } => {
            writeln!(out, "{}", session.export_document()?)?;
        }
        Command::View => {
            let viewport = session.viewport();
            writeln!(
                out,
                "scale {} offset ({}, {})",
                viewport.scale, viewport.offset.x, viewport.offset.y
            )?;
        }
    }

    // Everything above is persisted on the way out of `edit`
    let failures: Vec<String> = session
        .take_notices()
        .into_iter()
        .filter(|n| matches!(n, Notice::PersistFailed(_)))
        .map(|n| n.to_string())
        .collect();
    if !failures.is_empty() {
        bail!(failures.join("; "));
    }
    Ok(())
}

fn find(graph: &Graph, name: &str) -> Result<NodeId> {
    match graph.find_by_name(name) {
        Some(node) => Ok(node.id),
        None => bail!("No node named {name:?}"),
    }
}

fn list(graph: &Graph, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{} nodes", graph.node_count())?;
    for node in graph.nodes() {
        writeln!(out, "  {} ({}, {})", node.label(), node.position.x, node.position.y)?;
    }
    writeln!(out, "{} connections", graph.connection_count())?;
    for connection in graph.connections() {
        let name = |id| graph.node(id).map_or("?", |n| n.label());
        write!(
            out,
            "  {} -> {}",
            name(connection.start_node),
            name(connection.end_node)
        )?;
        if let Some(badge) = graph.symbol_badge(connection.id) {
            write!(out, " [{badge}]")?;
        }
        if !connection.description.is_empty() {
            write!(out, ": {}", connection.description)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
