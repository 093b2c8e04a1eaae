use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

use crate::data::model::COL_TIME;
use crate::data::stats::SummaryStat;
use crate::state::{AppState, ResultView, Session};

// ---------------------------------------------------------------------------
// Central panel – dispatch to the active result view
// ---------------------------------------------------------------------------

/// Render the active result view in the central panel.
pub fn results_panel(ui: &mut Ui, state: &AppState) {
    let Some(session) = &state.session else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a growth table to begin  (File → Open…)");
        });
        return;
    };

    if session.selection.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Select at least one condition");
        });
        return;
    }

    match state.view {
        ResultView::Curves => curve_plot(ui, state, session),
        ResultView::Bars => bar_plot(ui, state, session),
        ResultView::Table => stats_table(ui, session),
    }
}

// ---------------------------------------------------------------------------
// Growth curves – mean line ± std whiskers per condition
// ---------------------------------------------------------------------------

fn curve_plot(ui: &mut Ui, state: &AppState, session: &Session) {
    let metric = state.curve_metric;

    Plot::new("curve_plot")
        .legend(Legend::default())
        .x_axis_label(COL_TIME)
        .y_axis_label(metric.label())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for condition in &session.selection {
                let color = condition_color(state, condition);

                let points: Vec<(f64, &SummaryStat)> = session
                    .curves
                    .iter()
                    .filter(|p| &p.condition == condition)
                    .map(|p| (p.rounded_time as f64, p.stat(metric)))
                    .collect();
                if points.is_empty() {
                    continue;
                }

                // Curve rows arrive sorted by time, so the line needs no
                // extra sorting here.
                let mean_line: PlotPoints = points
                    .iter()
                    .map(|&(t, stat)| [t, stat.mean])
                    .collect();
                plot_ui.line(
                    Line::new(mean_line)
                        .name(condition)
                        .color(color)
                        .width(1.5),
                );

                // Std whiskers; degenerate buckets draw none.
                for &(t, stat) in &points {
                    let std = stat.std_or_zero();
                    if std > 0.0 {
                        let whisker: PlotPoints =
                            vec![[t, stat.mean - std], [t, stat.mean + std]].into();
                        plot_ui.line(Line::new(whisker).color(color).width(1.0));
                    }
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Summary bars – per-condition mean ± std of one scalar field
// ---------------------------------------------------------------------------

fn bar_plot(ui: &mut Ui, state: &AppState, session: &Session) {
    let metric = state.bar_metric;

    Plot::new("bar_plot")
        .legend(Legend::default())
        .y_axis_label(metric.label())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let mut bars = Vec::new();
            let mut whiskers = Vec::new();

            for (i, stat) in session.bar_stats.iter().enumerate() {
                let Some(summary) = stat.stat(metric) else {
                    continue;
                };
                let x = i as f64;
                let color = condition_color(state, &stat.condition);

                bars.push(
                    Bar::new(x, summary.mean)
                        .name(&stat.condition)
                        .width(0.6)
                        .fill(color),
                );

                let std = summary.std_or_zero();
                if std > 0.0 {
                    whiskers.push((x, summary.mean - std, summary.mean + std));
                }
            }

            plot_ui.bar_chart(BarChart::new(bars).name(metric.label()));
            for (x, lo, hi) in whiskers {
                let whisker: PlotPoints = vec![[x, lo], [x, hi]].into();
                plot_ui.line(Line::new(whisker).color(Color32::DARK_GRAY).width(1.5));
            }
        });
}

// ---------------------------------------------------------------------------
// Statistics table
// ---------------------------------------------------------------------------

fn stats_table(ui: &mut Ui, session: &Session) {
    use crate::data::model::ScalarMetric;
    use egui_extras::{Column, TableBuilder};

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(120.0))
        .column(Column::auto())
        .columns(Column::remainder(), ScalarMetric::ALL.len())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Condition");
            });
            header.col(|ui| {
                ui.strong("Replicates");
            });
            for metric in ScalarMetric::ALL {
                header.col(|ui| {
                    ui.strong(metric.label());
                });
            }
        })
        .body(|mut body| {
            for stat in &session.bar_stats {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(&stat.condition);
                    });
                    row.col(|ui| {
                        ui.label(stat.replicates.to_string());
                    });
                    for metric in ScalarMetric::ALL {
                        row.col(|ui| {
                            ui.label(format_stat(stat.stat(metric)));
                        });
                    }
                });
            }
        });
}

/// `mean ± std`, with the degenerate single-replicate case spelled out
/// instead of shown as a zero error.
fn format_stat(stat: Option<&SummaryStat>) -> String {
    match stat {
        None => "–".to_string(),
        Some(s) => match s.std {
            Some(std) => format!("{:.3} ± {:.3}", s.mean, std),
            None => format!("{:.3} (n = 1)", s.mean),
        },
    }
}

fn condition_color(state: &AppState, condition: &str) -> Color32 {
    state
        .color_map
        .as_ref()
        .map(|cm| cm.color_for(condition))
        .unwrap_or(Color32::LIGHT_BLUE)
}
