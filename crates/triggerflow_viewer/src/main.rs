// SPDX-License-Identifier: MIT OR Apache-2.0
//! Triggerflow Viewer - trigger event graphs on the desktop
//!
//! Loads a RON scene description and shows its trigger graph:
//! - Layered layout by containment depth
//! - Live reload when the scene file changes
//! - Click a box to report the object behind it
//!
//! ## Architecture
//!
//! The window and wgpu setup live in [`app`]; everything graph related is
//! delegated to `triggerflow_graph::Visualizer`, which the app drives with
//! tick and source-changed events.

mod app;
mod file_watcher;
mod scene_file;
mod settings;

use app::ViewerApp;
use clap::Parser;
use settings::ViewerSettings;
use std::path::PathBuf;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default log directives, extended by `RUST_LOG`
const LOG_DIRECTIVES: &[&str] = &[
    "triggerflow_viewer=debug",
    "triggerflow_graph=debug",
    "wgpu=warn",
    "naga=warn",
];

#[derive(Parser)]
#[command(name = "triggerflow_viewer", version, about = "Show the trigger graph of a scene")]
struct Cli {
    /// Scene description to open (RON); the demo scene is shown if omitted
    #[arg(long, value_name = "FILE")]
    scene: Option<PathBuf>,

    /// Viewer settings (RON)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Write the default settings to FILE and exit
    #[arg(long, value_name = "FILE")]
    write_default_settings: Option<PathBuf>,
}

fn main() {
    let env_filter = LOG_DIRECTIVES
        .iter()
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(tracing_subscriber::EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(directive)
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!("Viewer failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> app::Result<()> {
    if let Some(path) = &cli.write_default_settings {
        ViewerSettings::default().save(path)?;
        return Ok(());
    }

    let settings = match &cli.settings {
        Some(path) => ViewerSettings::load(path)?,
        None => ViewerSettings::default(),
    };

    tracing::info!("Starting Triggerflow Viewer v{}", env!("CARGO_PKG_VERSION"));
    ViewerApp::run(settings, cli.scene)
}
