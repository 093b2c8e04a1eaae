use anyhow::Context;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::export;
use crate::data::model::{CurveMetric, ScalarMetric};
use crate::state::{AppState, ResultView};

// ---------------------------------------------------------------------------
// Left side panel – condition selection
// ---------------------------------------------------------------------------

/// Render the left condition panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Conditions");
    ui.separator();

    let Some(session) = &state.session else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let conditions: Vec<String> = session.dataset.conditions.iter().cloned().collect();
    let selection = session.selection.clone();

    ui.label(format!("{}/{} selected", selection.len(), conditions.len()));
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all_conditions();
        }
        if ui.small_button("None").clicked() {
            state.select_no_conditions();
        }
    });
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for condition in &conditions {
                let mut checked = selection.contains(condition);

                // Show the condition in its plot colour.
                let mut text = RichText::new(condition);
                if let Some(cm) = &state.color_map {
                    text = text.color(cm.color_for(condition));
                }

                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_condition(condition);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }

            let has_stats = state
                .session
                .as_ref()
                .is_some_and(|s| !s.bar_stats.is_empty());
            if ui
                .add_enabled(has_stats, egui::Button::new("Export bar statistics…"))
                .clicked()
            {
                export_bar_statistics(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(has_stats, egui::Button::new("Export curve statistics…"))
                .clicked()
            {
                export_curve_statistics(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for view in ResultView::ALL {
            if ui.selectable_label(state.view == view, view.label()).clicked() {
                state.view = view;
            }
        }

        ui.separator();

        match state.view {
            ResultView::Curves => {
                egui::ComboBox::from_id_salt("curve_metric")
                    .selected_text(state.curve_metric.label())
                    .show_ui(ui, |ui: &mut Ui| {
                        for metric in CurveMetric::ALL {
                            if ui
                                .selectable_label(state.curve_metric == metric, metric.label())
                                .clicked()
                            {
                                state.curve_metric = metric;
                            }
                        }
                    });
            }
            ResultView::Bars => {
                egui::ComboBox::from_id_salt("bar_metric")
                    .selected_text(state.bar_metric.label())
                    .show_ui(ui, |ui: &mut Ui| {
                        for metric in ScalarMetric::ALL {
                            if ui
                                .selectable_label(state.bar_metric == metric, metric.label())
                                .clicked()
                            {
                                state.bar_metric = metric;
                            }
                        }
                    });
            }
            ResultView::Table => {}
        }

        ui.separator();

        if let Some(session) = &state.session {
            ui.label(format!(
                "{} replicates, {} conditions loaded",
                session.dataset.len(),
                session.dataset.conditions.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open growth table")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        let loaded = crate::data::loader::load_file(&path)
            .with_context(|| format!("loading {}", path.display()));
        match loaded {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} replicates across {} conditions",
                    dataset.len(),
                    dataset.conditions.len()
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
                state.loading = false;
            }
        }
    }
}

fn export_bar_statistics(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export bar statistics")
        .set_file_name("bar_statistics.csv")
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };

    let result = state.session.as_ref().map(|session| {
        export::write_bar_statistics(&path, &session.bar_stats)
            .with_context(|| format!("writing {}", path.display()))
    });
    finish_export(state, result, &path);
}

fn export_curve_statistics(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export curve statistics")
        .set_file_name("curve_statistics.csv")
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };

    let result = state.session.as_ref().map(|session| {
        export::write_curve_statistics(&path, &session.curves)
            .with_context(|| format!("writing {}", path.display()))
    });
    finish_export(state, result, &path);
}

fn finish_export(
    state: &mut AppState,
    result: Option<anyhow::Result<()>>,
    path: &std::path::Path,
) {
    match result {
        Some(Ok(())) => {
            log::info!("Exported statistics to {}", path.display());
        }
        Some(Err(e)) => {
            log::error!("Failed to export statistics: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
        None => {}
    }
}
