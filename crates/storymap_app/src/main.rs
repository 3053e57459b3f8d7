// SPDX-License-Identifier: MIT OR Apache-2.0
//! `storymap` - edit a story map canvas from the command line.

use clap::Parser;
use storymap_app::cli::{self, Cli};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("storymap_app=info".parse()?)
        .add_directive("storymap_graph=warn".parse()?);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::debug!("Starting storymap v{}", env!("CARGO_PKG_VERSION"));

    let mut stdout = std::io::stdout().lock();
    cli::run(cli, &mut stdout)
}
