mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use app::BandgapViewerApp;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional session file as the first argument.
    let mut state = AppState::default();
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        if let Err(e) = state.open_session(&path) {
            log::error!("Failed to open session {}: {e:#}", path.display());
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }

    let [width, height] = state.plot.figsize;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width * 100.0, height * 100.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Bandgap Viewer – XES / XAS",
        options,
        Box::new(|_cc| Ok(Box::new(BandgapViewerApp::new(state)))),
    )
}
