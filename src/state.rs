use crate::color::ColorMap;
use crate::data::error::DataError;
use crate::data::filter::{
    default_selection, select_observations, select_replicates, ConditionSelection,
};
use crate::data::model::{CurveMetric, Dataset, Observation, Replicate, ScalarMetric};
use crate::data::pipeline::prepare;
use crate::data::stats::{bar_statistics, curve_statistics, BarStat, CurvePoint};

// ---------------------------------------------------------------------------
// Session – one loaded table and its derived stages
// ---------------------------------------------------------------------------

/// One analysis session.  Parsing and reshaping happen once per upload and
/// stay cached here; a selection change only re-runs filter + aggregation.
pub struct Session {
    pub dataset: Dataset,
    /// Rows after both truncation stages.
    pub aligned: Vec<Replicate>,
    /// Long-form samples expanded from `aligned`.
    pub observations: Vec<Observation>,
    /// Conditions currently selected for aggregation.
    pub selection: ConditionSelection,
    /// Aggregates for the current selection; empty while nothing is selected.
    pub bar_stats: Vec<BarStat>,
    pub curves: Vec<CurvePoint>,
}

impl Session {
    /// Reshape a freshly loaded table and pick the default selection.
    pub fn new(dataset: Dataset) -> Self {
        let (aligned, observations) = prepare(&dataset);
        let selection = default_selection(&dataset.conditions);
        Session {
            dataset,
            aligned,
            observations,
            selection,
            bar_stats: Vec::new(),
            curves: Vec::new(),
        }
    }

    /// Re-run filter + aggregation for the current selection.
    pub fn recompute(&mut self) -> Result<(), DataError> {
        let rows = select_replicates(&self.aligned, &self.selection)?;
        let observations = select_observations(&self.observations, &self.selection)?;
        self.bar_stats = bar_statistics(&rows);
        self.curves = curve_statistics(&observations);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Result views
// ---------------------------------------------------------------------------

/// Which result the central panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultView {
    Curves,
    Bars,
    Table,
}

impl ResultView {
    pub const ALL: [ResultView; 3] = [ResultView::Curves, ResultView::Bars, ResultView::Table];

    pub fn label(self) -> &'static str {
        match self {
            ResultView::Curves => "Growth curves",
            ResultView::Bars => "Summary bars",
            ResultView::Table => "Statistics table",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Current session (None until the user loads a file).
    pub session: Option<Session>,

    /// Condition label → plot colour.
    pub color_map: Option<ColorMap>,

    /// Metric shown in the curve plot.
    pub curve_metric: CurveMetric,

    /// Metric shown in the bar chart.
    pub bar_metric: ScalarMetric,

    /// Active central view.
    pub view: ResultView,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: None,
            color_map: None,
            curve_metric: CurveMetric::CellCount,
            bar_metric: ScalarMetric::GrowthRateK,
            view: ResultView::Curves,
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded table: reshape, colour, default selection.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.color_map = Some(ColorMap::new(&dataset.conditions));
        self.session = Some(Session::new(dataset));
        self.status_message = None;
        self.loading = false;
        self.refilter();
    }

    /// Re-run filter + aggregation after a selection change.  An empty
    /// selection clears the aggregates and shows a prompt instead of
    /// failing the session.
    pub fn refilter(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        match session.recompute() {
            Ok(()) => self.status_message = None,
            Err(DataError::EmptySelection) => {
                session.bar_stats.clear();
                session.curves.clear();
                self.status_message = Some("Select at least one condition".to_string());
            }
            Err(e) => self.status_message = Some(format!("Error: {e}")),
        }
    }

    /// Toggle one condition in the selection.
    pub fn toggle_condition(&mut self, label: &str) {
        if let Some(session) = &mut self.session {
            if !session.selection.remove(label) {
                session.selection.insert(label.to_string());
            }
        }
        self.refilter();
    }

    /// Select every condition in the table.
    pub fn select_all_conditions(&mut self) {
        if let Some(session) = &mut self.session {
            session.selection = session.dataset.conditions.clone();
        }
        self.refilter();
    }

    /// Clear the selection.
    pub fn select_no_conditions(&mut self) {
        if let Some(session) = &mut self.session {
            session.selection.clear();
        }
        self.refilter();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rep(condition: &str, times: &[f64], counts: &[f64]) -> Replicate {
        Replicate {
            condition: condition.to_string(),
            time_after_seeding: Some(times.to_vec()),
            cell_count: Some(counts.to_vec()),
            morphology: Some(vec![0.5; times.len()]),
            precipitation: Some(vec![0.1; times.len()]),
            average_morphology: Some(0.5),
            growth_rate_k: Some(0.2),
            average_precipitation: Some(0.1),
        }
    }

    fn seven_condition_state() -> AppState {
        let replicates = (0..7)
            .map(|i| rep(&format!("C{i}"), &[0.0, 6.0], &[1.0, 2.0]))
            .collect();
        let mut state = AppState::default();
        state.set_dataset(Dataset::from_replicates(replicates));
        state
    }

    #[test]
    fn loading_picks_default_selection_and_aggregates() {
        let state = seven_condition_state();
        let session = state.session.as_ref().unwrap();
        assert_eq!(session.selection.len(), 5);
        assert_eq!(session.bar_stats.len(), 5);
        // two curve points per selected condition
        assert_eq!(session.curves.len(), 10);
        assert!(state.status_message.is_none());
    }

    #[test]
    fn deselecting_everything_is_recoverable() {
        let mut state = seven_condition_state();
        state.select_no_conditions();

        let session = state.session.as_ref().unwrap();
        assert!(session.bar_stats.is_empty());
        assert!(session.curves.is_empty());
        assert!(state.status_message.is_some());

        state.toggle_condition("C0");
        let session = state.session.as_ref().unwrap();
        assert_eq!(session.bar_stats.len(), 1);
        assert!(state.status_message.is_none());
    }

    #[test]
    fn selection_change_keeps_reshaped_caches() {
        let mut state = seven_condition_state();
        let before = state.session.as_ref().unwrap().observations.clone();
        state.toggle_condition("C6");
        state.toggle_condition("C0");
        let after = &state.session.as_ref().unwrap().observations;
        assert_eq!(&before, after);
    }

    #[test]
    fn select_all_covers_every_condition() {
        let mut state = seven_condition_state();
        state.select_all_conditions();
        let session = state.session.as_ref().unwrap();
        assert_eq!(session.selection.len(), 7);
        assert_eq!(session.bar_stats.len(), 7);
    }
}
