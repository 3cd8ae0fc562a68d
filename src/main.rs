use std::path::PathBuf;

use clap::Parser;

use graph_notes::graph_utils::graph::GraphStore;
use graph_notes::gui::controller::InteractionController;
use graph_notes::gui::frontend::GraphApp;
use graph_notes::persistence::settings::{AppSettings, ZoomAnchor};

#[derive(Parser, Debug)]
#[command(name = "Graph-Notes", version, about = "Interactive node-graph note editor")]
struct Cli {
    /// Graph file to load at startup and write on exit
    #[arg(long)]
    data_file: Option<PathBuf>,
    /// Settings file (defaults to the per-user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long, value_enum)]
    zoom_anchor: Option<ZoomAnchor>,
    /// Persist the effective settings (including the flags above)
    #[arg(long)]
    write_settings: bool,
}

fn main() -> eframe::Result {
    env_logger::init();
    let cli = Cli::parse();

    let settings_path = cli.settings.clone().unwrap_or_else(AppSettings::settings_path);
    let mut settings = AppSettings::load_from(&settings_path).unwrap_or_else(|e| {
        log::warn!("ignoring settings at {}: {e}", settings_path.display());
        AppSettings::default()
    });
    if let Some(path) = cli.data_file {
        settings.data_file = path;
    }
    if let Some(anchor) = cli.zoom_anchor {
        settings.zoom_anchor = anchor;
    }
    if cli.write_settings {
        match settings.save_to(&settings_path) {
            Ok(()) => log::info!("settings written to {}", settings_path.display()),
            Err(e) => log::warn!("could not write settings to {}: {e}", settings_path.display()),
        }
    }

    // A missing or unreadable graph file starts an empty session
    let store = GraphStore::with_placement_bounds(settings.placement_bounds());
    let mut controller = InteractionController::new(store, settings.zoom_anchor);
    controller.load(&settings.data_file);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window_width, settings.window_height])
            .with_min_inner_size([400.0, 300.0])
            .with_resizable(true),
        ..Default::default()
    };
    let data_file = settings.data_file.clone();
    eframe::run_native(
        "Graph-Notes",
        options,
        Box::new(move |_cc| Ok(Box::new(GraphApp::new(controller, data_file)) as Box<dyn eframe::App>)),
    )
}
