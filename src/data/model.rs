use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Column names of the input table
// ---------------------------------------------------------------------------

pub const COL_CONDITION: &str = "Condition";
pub const COL_TIME: &str = "Time after seeding";
pub const COL_CELL_COUNT: &str = "Cell count";
pub const COL_MORPHOLOGY: &str = "Morphology";
pub const COL_PRECIPITATION: &str = "Precipitation";
pub const COL_AVG_MORPHOLOGY: &str = "Average morphology";
pub const COL_GROWTH_RATE: &str = "Growth rate (k)";
pub const COL_AVG_PRECIPITATION: &str = "Average precipitation";

/// Every column a loaded file must provide.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_CONDITION,
    COL_TIME,
    COL_CELL_COUNT,
    COL_MORPHOLOGY,
    COL_PRECIPITATION,
    COL_AVG_MORPHOLOGY,
    COL_GROWTH_RATE,
    COL_AVG_PRECIPITATION,
];

// ---------------------------------------------------------------------------
// Replicate – one row of the source table
// ---------------------------------------------------------------------------

/// One specimen measured under a condition (one row of the source table).
///
/// The four series may have different lengths straight after loading; the
/// pipeline truncates them into alignment. `None` means the cell held no
/// sequence at all (empty CSV cell, JSON/Parquet null), which is distinct
/// from an empty sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Replicate {
    pub condition: String,
    pub time_after_seeding: Option<Vec<f64>>,
    pub cell_count: Option<Vec<f64>>,
    pub morphology: Option<Vec<f64>>,
    pub precipitation: Option<Vec<f64>>,
    pub average_morphology: Option<f64>,
    pub growth_rate_k: Option<f64>,
    pub average_precipitation: Option<f64>,
}

impl Replicate {
    /// All four series slots, mutably, in column order.
    pub fn series_mut(&mut self) -> [&mut Option<Vec<f64>>; 4] {
        [
            &mut self.time_after_seeding,
            &mut self.cell_count,
            &mut self.morphology,
            &mut self.precipitation,
        ]
    }

    /// Lengths of the series that are actually present.
    pub fn series_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        [
            &self.time_after_seeding,
            &self.cell_count,
            &self.morphology,
            &self.precipitation,
        ]
        .into_iter()
        .filter_map(|s| s.as_ref().map(Vec::len))
    }
}

// ---------------------------------------------------------------------------
// Observation – one exploded (condition, timepoint) sample
// ---------------------------------------------------------------------------

/// One long-form sample: element `i` of a replicate's parallel series.
///
/// `rounded_time` snaps `time` to the nearest integer so that replicates
/// sampled at slightly different moments land in the same aggregation
/// bucket. The rounding is deliberately lossy.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub condition: String,
    pub time: f64,
    pub rounded_time: i64,
    pub cell_count: f64,
    pub morphology: f64,
    pub precipitation: f64,
}

// ---------------------------------------------------------------------------
// Metric selectors for the chart layer
// ---------------------------------------------------------------------------

/// A series-derived metric plotted against time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveMetric {
    CellCount,
    Morphology,
    Precipitation,
}

impl CurveMetric {
    pub const ALL: [CurveMetric; 3] = [
        CurveMetric::CellCount,
        CurveMetric::Morphology,
        CurveMetric::Precipitation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CurveMetric::CellCount => COL_CELL_COUNT,
            CurveMetric::Morphology => COL_MORPHOLOGY,
            CurveMetric::Precipitation => COL_PRECIPITATION,
        }
    }

    pub fn value(self, obs: &Observation) -> f64 {
        match self {
            CurveMetric::CellCount => obs.cell_count,
            CurveMetric::Morphology => obs.morphology,
            CurveMetric::Precipitation => obs.precipitation,
        }
    }
}

/// A scalar per-replicate summary metric shown as bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarMetric {
    AverageMorphology,
    GrowthRateK,
    AveragePrecipitation,
}

impl ScalarMetric {
    pub const ALL: [ScalarMetric; 3] = [
        ScalarMetric::AverageMorphology,
        ScalarMetric::GrowthRateK,
        ScalarMetric::AveragePrecipitation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ScalarMetric::AverageMorphology => COL_AVG_MORPHOLOGY,
            ScalarMetric::GrowthRateK => COL_GROWTH_RATE,
            ScalarMetric::AveragePrecipitation => COL_AVG_PRECIPITATION,
        }
    }

    pub fn value(self, rep: &Replicate) -> Option<f64> {
        match self {
            ScalarMetric::AverageMorphology => rep.average_morphology,
            ScalarMetric::GrowthRateK => rep.growth_rate_k,
            ScalarMetric::AveragePrecipitation => rep.average_precipitation,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with its condition index.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All replicates (rows), in file order.
    pub replicates: Vec<Replicate>,
    /// Sorted set of condition labels present in the table.
    pub conditions: BTreeSet<String>,
}

impl Dataset {
    /// Build the condition index from the loaded rows.
    pub fn from_replicates(replicates: Vec<Replicate>) -> Self {
        let conditions = replicates.iter().map(|r| r.condition.clone()).collect();
        Dataset {
            replicates,
            conditions,
        }
    }

    /// Number of replicates.
    pub fn len(&self) -> usize {
        self.replicates.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.replicates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replicate(condition: &str) -> Replicate {
        Replicate {
            condition: condition.to_string(),
            time_after_seeding: None,
            cell_count: None,
            morphology: None,
            precipitation: None,
            average_morphology: None,
            growth_rate_k: None,
            average_precipitation: None,
        }
    }

    #[test]
    fn dataset_indexes_unique_conditions_sorted() {
        let ds = Dataset::from_replicates(vec![
            replicate("LB + glucose"),
            replicate("Control"),
            replicate("LB + glucose"),
        ]);
        let conditions: Vec<&str> = ds.conditions.iter().map(String::as_str).collect();
        assert_eq!(conditions, ["Control", "LB + glucose"]);
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn series_lengths_skip_absent_series() {
        let mut rep = replicate("A");
        rep.time_after_seeding = Some(vec![0.0, 6.0, 12.0]);
        rep.morphology = Some(vec![1.0]);
        let lengths: Vec<usize> = rep.series_lengths().collect();
        assert_eq!(lengths, [3, 1]);
    }
}
