use eframe::egui::{self, Align2, Color32, RichText, Ui};
use egui_plot::{Arrows, Legend, Line, LineStyle, Plot, PlotPoint, PlotUi, Points, Text};

use bandgap_viewer::analysis::features::{normalize_abs_max, onset_peak};
use bandgap_viewer::analysis::OnsetRegion;
use bandgap_viewer::config::{Arrow, PlotSettings};
use bandgap_viewer::data::model::{ProcessedSpectrum, Spectrum, SpectrumKind, SpectrumOrigin};

use crate::state::AppState;
use crate::ui::panels;

// ---------------------------------------------------------------------------
// 2x2 comparison figure (central panel)
// ---------------------------------------------------------------------------

/// Spectra on top, second derivatives below; emission left, absorption right.
pub fn comparison_plot(ui: &mut Ui, state: &AppState) {
    if state.store.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a session to view spectra  (File → Open session…)");
        });
        return;
    }

    if let Some(title) = &state.plot.title {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.heading(title);
        });
    }

    // Spectra get twice the height of the derivative row.
    let total = ui.available_height();
    let top_height = (total * 2.0 / 3.0 - 8.0).max(120.0);
    let bottom_height = (total / 3.0 - 8.0).max(60.0);

    ui.columns(2, |cols: &mut [Ui]| {
        for kind in SpectrumKind::ALL {
            let col = &mut cols[PlotSettings::column(kind)];
            spectra_panel(col, state, kind, top_height);
            derivative_panel(col, state, kind, bottom_height);
        }
    });
}

fn spectra_panel(ui: &mut Ui, state: &AppState, kind: SpectrumKind, height: f32) {
    let xlims = state.plot.xlims(kind);
    let label = &state.plot.subplot_labels[0][PlotSettings::column(kind)];

    let mut plot = Plot::new(format!("spectra_{kind}"))
        .legend(Legend::default())
        .height(height)
        .y_axis_label(if state.normalize {
            "Normalized intensity"
        } else {
            "Intensity"
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if let Some([lo, hi]) = xlims {
        plot = plot.include_x(lo).include_x(hi);
    }

    plot.show(ui, |plot_ui: &mut PlotUi| {
        for origin in [SpectrumOrigin::Experimental, SpectrumOrigin::Calculated] {
            for sp in state.visible_spectra(kind, origin) {
                let y = if state.normalize {
                    normalize_abs_max(&sp.y)
                } else {
                    sp.y.clone()
                };
                let mut line = Line::new(clipped_points(&sp.x, &y, xlims))
                    .name(&sp.name)
                    .color(state.colors.color_for(kind, origin, &sp.name))
                    .width(1.5);
                if origin == SpectrumOrigin::Calculated {
                    line = line.style(LineStyle::dashed_loose());
                }
                plot_ui.line(line);
            }
        }
        corner_label(plot_ui, label);
    });
}

fn derivative_panel(ui: &mut Ui, state: &AppState, kind: SpectrumKind, height: f32) {
    let xlims = state.plot.xlims(kind);
    let label = &state.plot.subplot_labels[1][PlotSettings::column(kind)];

    let curves: Vec<(&Spectrum, &ProcessedSpectrum)> = state
        .visible_spectra(kind, SpectrumOrigin::Experimental)
        .into_iter()
        .filter_map(|sp| state.store.processed(kind, &sp.name).map(|p| (sp, p)))
        .collect();

    // Centre zero on the y axis over the visible x range.
    let abs_max = curves
        .iter()
        .flat_map(|(sp, p)| sp.x.iter().zip(&p.second_derivative))
        .filter(|(x, _)| in_limits(**x, xlims))
        .map(|(_, d2)| d2.abs())
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);

    let mut plot = Plot::new(format!("second_derivative_{kind}"))
        .height(height)
        .x_axis_label("Energy (eV)")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if let Some([lo, hi]) = xlims {
        plot = plot.include_x(lo).include_x(hi);
    }
    if abs_max > 0.0 {
        plot = plot.include_y(-abs_max * 1.05).include_y(abs_max * 1.05);
    }

    plot.show(ui, |plot_ui: &mut PlotUi| {
        for (sp, p) in &curves {
            let color = state.colors.color_for(kind, SpectrumOrigin::Experimental, &sp.name);
            plot_ui.line(
                Line::new(clipped_points(&sp.x, &p.second_derivative, xlims))
                    .name(&sp.name)
                    .color(color)
                    .width(1.5),
            );
        }

        match state.plot.arrow(kind) {
            Some(arrow) => draw_arrow(plot_ui, arrow),
            None => {
                for (sp, p) in &curves {
                    let Some(i) = onset_peak(kind, &sp.x, &p.second_derivative, p.onset_region)
                    else {
                        continue;
                    };
                    let tip = [sp.x[i], p.second_derivative[i]];
                    let color = state.colors.color_for(kind, SpectrumOrigin::Experimental, &sp.name);
                    plot_ui.points(Points::new(vec![tip]).radius(4.0).color(color));
                    plot_ui.text(
                        Text::new(PlotPoint::new(tip[0], tip[1]), format!("{:.1} eV", tip[0]))
                            .anchor(Align2::CENTER_BOTTOM),
                    );
                }
            }
        }
        corner_label(plot_ui, label);
    });
}

// ---------------------------------------------------------------------------
// Raw vs smoothed preview window
// ---------------------------------------------------------------------------

/// Floating window comparing one experimental spectrum with its smoothed
/// curve, plus a zoom on the onset region when one is set.
pub fn smoothing_preview(ctx: &egui::Context, state: &mut AppState) {
    let Some((kind, name)) = state.preview.clone() else {
        return;
    };

    let mut open = true;
    let mut save = false;
    egui::Window::new(format!("{kind} '{name}': raw vs smoothed"))
        .id(egui::Id::new("smoothing_preview"))
        .open(&mut open)
        .default_size([760.0, 360.0])
        .show(ctx, |ui: &mut Ui| {
            let (Some(sp), Some(p)) = (
                state.store.get(kind, SpectrumOrigin::Experimental, &name),
                state.store.processed(kind, &name),
            ) else {
                ui.label("Not smoothed yet. Press Apply in the side panel.");
                return;
            };

            ui.horizontal(|ui: &mut Ui| {
                ui.label(format!(
                    "window {} / polyorder {}",
                    p.params.window, p.params.polyorder
                ));
                save = ui.button("Save table…").clicked();
            });

            let color = state.colors.color_for(kind, SpectrumOrigin::Experimental, &name);
            let views = preview_panels(p.onset_region);
            let height = (ui.available_height() - 8.0).max(160.0);
            ui.columns(views.len(), |cols: &mut [Ui]| {
                for (col, (title, xlims)) in cols.iter_mut().zip(&views) {
                    col.label(RichText::new(*title).strong());
                    Plot::new(format!("preview_{kind}_{title}"))
                        .legend(Legend::default())
                        .height(height)
                        .x_axis_label("Energy (eV)")
                        .show(col, |plot_ui: &mut PlotUi| {
                            plot_ui.line(
                                Line::new(clipped_points(&sp.x, &sp.y, *xlims))
                                    .name("Raw data")
                                    .color(Color32::GRAY)
                                    .width(1.0),
                            );
                            plot_ui.line(
                                Line::new(clipped_points(&sp.x, &p.smoothed, *xlims))
                                    .name("Smoothed data")
                                    .color(color)
                                    .width(1.8),
                            );
                        });
                }
            });
        });

    if save {
        panels::save_spectrum_dialog(state, kind, &name);
    }
    if !open {
        state.preview = None;
    }
}

/// Panels of the preview window: the full range, then the onset region
/// with its bounds in ascending order.
fn preview_panels(onset: Option<OnsetRegion>) -> Vec<(&'static str, Option<[f64; 2]>)> {
    let mut panels = vec![("Full range", None)];
    if let Some(r) = onset {
        panels.push(("Onset region", Some([r.min.min(r.max), r.min.max(r.max)])));
    }
    panels
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn in_limits(x: f64, xlims: Option<[f64; 2]>) -> bool {
    xlims.map_or(true, |[a, b]| x >= a.min(b) && x <= a.max(b))
}

/// Points inside the configured x limits, so auto-bounds follow the limits.
fn clipped_points(x: &[f64], y: &[f64], xlims: Option<[f64; 2]>) -> Vec<[f64; 2]> {
    x.iter()
        .zip(y)
        .filter(|(xi, _)| in_limits(**xi, xlims))
        .map(|(&xi, &yi)| [xi, yi])
        .collect()
}

fn draw_arrow(plot_ui: &mut PlotUi, arrow: &Arrow) {
    plot_ui.arrows(Arrows::new(vec![arrow.xytext], vec![arrow.xy]).color(Color32::BLACK));
    plot_ui.text(
        Text::new(
            PlotPoint::new(arrow.xytext[0], arrow.xytext[1]),
            RichText::new(&arrow.text).color(Color32::BLACK),
        )
        .anchor(Align2::CENTER_CENTER),
    );
}

/// White-on-black tag in the top-left corner of a panel.
fn corner_label(plot_ui: &mut PlotUi, text: &str) {
    let bounds = plot_ui.plot_bounds();
    let [x_min, _] = bounds.min();
    let [_, y_max] = bounds.max();
    plot_ui.text(
        Text::new(
            PlotPoint::new(x_min, y_max),
            RichText::new(text)
                .color(Color32::WHITE)
                .background_color(Color32::BLACK),
        )
        .anchor(Align2::LEFT_TOP),
    );
}
