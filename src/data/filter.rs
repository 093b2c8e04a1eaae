use std::collections::BTreeSet;

use super::error::DataError;
use super::model::{Observation, Replicate};

// ---------------------------------------------------------------------------
// Condition selection
// ---------------------------------------------------------------------------

/// The set of condition labels the caller wants aggregated.
pub type ConditionSelection = BTreeSet<String>;

/// How many conditions the default selection picks.
pub const DEFAULT_SELECTION_SIZE: usize = 5;

/// Initial selection for a freshly loaded table: the first
/// [`DEFAULT_SELECTION_SIZE`] condition labels in sorted order.
pub fn default_selection(conditions: &BTreeSet<String>) -> ConditionSelection {
    conditions
        .iter()
        .take(DEFAULT_SELECTION_SIZE)
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Pure restriction
// ---------------------------------------------------------------------------

/// Keep only replicates whose condition is selected.  An empty selection is
/// the recoverable [`DataError::EmptySelection`]; nothing downstream runs.
pub fn select_replicates(
    rows: &[Replicate],
    selection: &ConditionSelection,
) -> Result<Vec<Replicate>, DataError> {
    if selection.is_empty() {
        return Err(DataError::EmptySelection);
    }
    Ok(rows
        .iter()
        .filter(|rep| selection.contains(&rep.condition))
        .cloned()
        .collect())
}

/// Keep only observations whose condition is selected.
pub fn select_observations(
    observations: &[Observation],
    selection: &ConditionSelection,
) -> Result<Vec<Observation>, DataError> {
    if selection.is_empty() {
        return Err(DataError::EmptySelection);
    }
    Ok(observations
        .iter()
        .filter(|obs| selection.contains(&obs.condition))
        .cloned()
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
