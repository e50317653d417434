use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use bandgap_viewer::data::export::{export_analysis, export_spectrum};
use bandgap_viewer::data::model::{SpectrumKind, SpectrumOrigin};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – spectrum list and smoothing controls
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Spectra");
    ui.separator();

    if state.store.is_empty() {
        ui.label("No session loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.checkbox(&mut state.normalize, "Normalize spectra");
            ui.separator();

            for kind in SpectrumKind::ALL {
                egui::CollapsingHeader::new(RichText::new(kind.tag()).strong())
                    .id_salt(kind.tag())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        for origin in [SpectrumOrigin::Experimental, SpectrumOrigin::Calculated] {
                            spectrum_list(ui, state, kind, origin);
                        }
                    });
            }
        });
}

fn spectrum_list(ui: &mut Ui, state: &mut AppState, kind: SpectrumKind, origin: SpectrumOrigin) {
    let names = state.store.names(kind, origin);
    if names.is_empty() {
        return;
    }

    ui.label(
        RichText::new(match origin {
            SpectrumOrigin::Experimental => "Experimental",
            SpectrumOrigin::Calculated => "Calculated",
        })
        .italics(),
    );

    for name in &names {
        let mut checked = state.is_visible(kind, origin, name);
        let text = RichText::new(name).color(state.colors.color_for(kind, origin, name));
        if ui.checkbox(&mut checked, text).changed() {
            state.toggle_visible(kind, origin, name);
        }
        if origin == SpectrumOrigin::Experimental {
            smoothing_controls(ui, state, kind, name);
        }
    }
}

/// Window / poly-order editors for one experimental spectrum.
fn smoothing_controls(ui: &mut Ui, state: &mut AppState, kind: SpectrumKind, name: &str) {
    let key = (kind, name.to_string());
    let Some(mut params) = state.smoothing_edits.get(&key).copied() else {
        return;
    };

    let mut apply = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.add_space(18.0);
        ui.label("window");
        ui.add(egui::DragValue::new(&mut params.window).range(3..=201).speed(2.0));
        ui.label("poly");
        ui.add(egui::DragValue::new(&mut params.polyorder).range(0..=10));
        apply = ui.small_button("Apply").clicked();
        if ui.small_button("Preview").clicked() {
            state.preview = Some((kind, name.to_string()));
        }
    });

    let applied = state.store.processed(kind, name).map(|p| p.params);
    ui.horizontal(|ui: &mut Ui| {
        ui.add_space(18.0);
        match applied {
            Some(p) => ui.weak(format!("smoothed: {} / {}", p.window, p.polyorder)),
            None => ui.weak("not smoothed"),
        };
    });

    state.smoothing_edits.insert(key, params);
    if apply {
        state.resmooth(kind, name);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open session…").clicked() {
                open_session_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(!state.store.is_empty(), egui::Button::new("Export second derivatives…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if !state.store.is_empty() {
            ui.label(format!("{} spectra loaded", state.store.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_session_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open analysis session")
        .add_filter("Session", &["json"])
        .pick_file();

    if let Some(path) = file {
        match state.open_session(&path) {
            Ok(()) => {
                log::info!(
                    "Opened session {} with {} spectra",
                    path.display(),
                    state.store.len()
                );
            }
            Err(e) => {
                log::error!("Failed to open session: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn export_dialog(state: &mut AppState) {
    let Some(dir) = rfd::FileDialog::new()
        .set_title("Export second derivatives to folder")
        .pick_folder()
    else {
        return;
    };

    match export_analysis(&dir, &state.export_basename(), &state.store) {
        Ok(paths) => {
            state.status_message = None;
            log::info!("Wrote {} files to {}", paths.len(), dir.display());
        }
        Err(e) => {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

/// Save the second-derivative table of one smoothed spectrum.
pub fn save_spectrum_dialog(state: &mut AppState, kind: SpectrumKind, name: &str) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Save second derivative")
        .set_file_name(format!("{name}_{}_second_derivative.csv", kind.tag()))
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };

    match export_spectrum(&path, &state.store, kind, name) {
        Ok(()) => state.status_message = None,
        Err(e) => {
            log::error!("Saving {kind} '{name}' failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
