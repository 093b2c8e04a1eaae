use std::collections::BTreeMap;

use super::model::{Dataset, Observation, Replicate};

// ---------------------------------------------------------------------------
// Truncation – repair ragged series lengths
// ---------------------------------------------------------------------------

/// Truncate every present series of a replicate to the shortest present
/// series, so that element `i` of each series refers to the same
/// measurement occasion.  A replicate with no series passes through
/// unchanged.
pub fn truncate_replicate(mut rep: Replicate) -> Replicate {
    let min_len = rep.series_lengths().min();
    if let Some(n) = min_len {
        for series in rep.series_mut().into_iter().flatten() {
            series.truncate(n);
        }
    }
    rep
}

/// Row-wise truncation over the whole table.
pub fn truncate_rows(rows: Vec<Replicate>) -> Vec<Replicate> {
    rows.into_iter().map(truncate_replicate).collect()
}

/// Truncate every replicate of a condition group to the group's shortest
/// time series, so a condition's aggregate curve is supported by the same
/// number of replicates over its full length.
///
/// Replicates without a time series cannot contribute curve points and do
/// not constrain the group minimum.  A single-member group is a no-op.
pub fn align_condition_lengths(rows: Vec<Replicate>) -> Vec<Replicate> {
    let mut min_points: BTreeMap<String, usize> = BTreeMap::new();
    for rep in &rows {
        if let Some(time) = &rep.time_after_seeding {
            min_points
                .entry(rep.condition.clone())
                .and_modify(|m| *m = (*m).min(time.len()))
                .or_insert(time.len());
        }
    }

    rows.into_iter()
        .map(|mut rep| {
            if let Some(&n) = min_points.get(&rep.condition) {
                for series in rep.series_mut().into_iter().flatten() {
                    series.truncate(n);
                }
            }
            rep
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Long-form expansion
// ---------------------------------------------------------------------------

/// Explode each replicate's parallel series into one [`Observation`] per
/// index, carrying the condition label onto every emitted row.
///
/// Rounded time uses `f64::round` (nearest integer, ties away from zero),
/// applied uniformly here and nowhere else.  Replicates missing any of the
/// four series cannot form complete tuples and emit nothing.
pub fn expand_observations(rows: &[Replicate]) -> Vec<Observation> {
    let mut observations = Vec::new();

    for rep in rows {
        let (Some(time), Some(count), Some(morphology), Some(precipitation)) = (
            &rep.time_after_seeding,
            &rep.cell_count,
            &rep.morphology,
            &rep.precipitation,
        ) else {
            log::debug!(
                "replicate under '{}' lacks a complete series set, emitting no observations",
                rep.condition
            );
            continue;
        };

        // Post-truncation all four series have equal length.
        for i in 0..time.len() {
            observations.push(Observation {
                condition: rep.condition.clone(),
                time: time[i],
                rounded_time: time[i].round() as i64,
                cell_count: count[i],
                morphology: morphology[i],
                precipitation: precipitation[i],
            });
        }
    }

    observations
}

// ---------------------------------------------------------------------------
// Full reshape
// ---------------------------------------------------------------------------

/// Run both truncation stages and the expansion for one loaded table.
///
/// The returned rows and observations are cached per upload; a selection
/// change only re-runs filtering and aggregation downstream of this.
pub fn prepare(dataset: &Dataset) -> (Vec<Replicate>, Vec<Observation>) {
    let aligned = align_condition_lengths(truncate_rows(dataset.replicates.clone()));
    let observations = expand_observations(&aligned);
    (aligned, observations)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
