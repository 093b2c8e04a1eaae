use std::collections::BTreeMap;

use super::model::{CurveMetric, Observation, Replicate, ScalarMetric};

// ---------------------------------------------------------------------------
// SummaryStat – mean and sample standard deviation of one group
// ---------------------------------------------------------------------------

/// Mean and sample standard deviation (n − 1 denominator) of one group of
/// samples.  `std` is `None` for a single-sample group: "insufficient
/// sample" is kept distinct from a true zero variance, and the rendering
/// default lives in [`SummaryStat::std_or_zero`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStat {
    pub mean: f64,
    pub std: Option<f64>,
    pub n: usize,
}

impl SummaryStat {
    /// `None` for an empty sample set.
    pub fn from_samples(samples: &[f64]) -> Option<SummaryStat> {
        let n = samples.len();
        if n == 0 {
            return None;
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let std = if n >= 2 {
            let ss: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
            Some((ss / (n - 1) as f64).sqrt())
        } else {
            None
        };
        Some(SummaryStat { mean, std, n })
    }

    /// Chart-facing default: a degenerate group draws no error bar.
    pub fn std_or_zero(&self) -> f64 {
        self.std.unwrap_or(0.0)
    }

    fn is_degenerate(&self) -> bool {
        self.std.is_none()
    }
}

// ---------------------------------------------------------------------------
// Bar statistics – per-condition scalar summaries
// ---------------------------------------------------------------------------

/// Per-condition mean ± std of the three scalar summary fields.
#[derive(Debug, Clone, PartialEq)]
pub struct BarStat {
    pub condition: String,
    /// Replicates in the condition group (including those with absent
    /// scalar fields).
    pub replicates: usize,
    pub average_morphology: Option<SummaryStat>,
    pub growth_rate_k: Option<SummaryStat>,
    pub average_precipitation: Option<SummaryStat>,
}

impl BarStat {
    pub fn stat(&self, metric: ScalarMetric) -> Option<&SummaryStat> {
        match metric {
            ScalarMetric::AverageMorphology => self.average_morphology.as_ref(),
            ScalarMetric::GrowthRateK => self.growth_rate_k.as_ref(),
            ScalarMetric::AveragePrecipitation => self.average_precipitation.as_ref(),
        }
    }
}

/// Group replicates by condition and summarise the scalar fields.  Absent
/// field values are skipped rather than poisoning the mean.  Output is
/// sorted by condition label.
pub fn bar_statistics(rows: &[Replicate]) -> Vec<BarStat> {
    let mut groups: BTreeMap<&str, Vec<&Replicate>> = BTreeMap::new();
    for rep in rows {
        groups.entry(&rep.condition).or_default().push(rep);
    }

    let mut degenerate = 0usize;
    let stats = groups
        .into_iter()
        .map(|(condition, members)| {
            let mut field = |metric: ScalarMetric| {
                let values: Vec<f64> =
                    members.iter().filter_map(|rep| metric.value(rep)).collect();
                let stat = SummaryStat::from_samples(&values);
                if stat.is_some_and(|s| s.is_degenerate()) {
                    degenerate += 1;
                }
                stat
            };
            BarStat {
                condition: condition.to_string(),
                replicates: members.len(),
                average_morphology: field(ScalarMetric::AverageMorphology),
                growth_rate_k: field(ScalarMetric::GrowthRateK),
                average_precipitation: field(ScalarMetric::AveragePrecipitation),
            }
        })
        .collect();

    if degenerate > 0 {
        log::debug!("{degenerate} scalar summary groups have a single contributor; std undefined");
    }
    stats
}

// ---------------------------------------------------------------------------
// Curve statistics – per (condition, rounded time) series summaries
// ---------------------------------------------------------------------------

/// Mean ± std of the three series metrics at one (condition, rounded time)
/// bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvePoint {
    pub condition: String,
    pub rounded_time: i64,
    pub cell_count: SummaryStat,
    pub morphology: SummaryStat,
    pub precipitation: SummaryStat,
}

impl CurvePoint {
    pub fn stat(&self, metric: CurveMetric) -> &SummaryStat {
        match metric {
            CurveMetric::CellCount => &self.cell_count,
            CurveMetric::Morphology => &self.morphology,
            CurveMetric::Precipitation => &self.precipitation,
        }
    }
}

/// Group observations by (condition, rounded time) and summarise each
/// metric across the bucket.  Output rows are sorted by condition, then by
/// rounded time; the chart consumer relies on that order.
pub fn curve_statistics(observations: &[Observation]) -> Vec<CurvePoint> {
    let mut buckets: BTreeMap<(&str, i64), Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        buckets
            .entry((&obs.condition, obs.rounded_time))
            .or_default()
            .push(obs);
    }

    let mut degenerate = 0usize;
    let mut points = Vec::with_capacity(buckets.len());

    for ((condition, rounded_time), members) in buckets {
        let summarise = |metric: CurveMetric| {
            let values: Vec<f64> = members.iter().map(|obs| metric.value(obs)).collect();
            SummaryStat::from_samples(&values)
        };
        let (Some(cell_count), Some(morphology), Some(precipitation)) = (
            summarise(CurveMetric::CellCount),
            summarise(CurveMetric::Morphology),
            summarise(CurveMetric::Precipitation),
        ) else {
            continue;
        };
        if cell_count.is_degenerate() {
            degenerate += 1;
        }
        points.push(CurvePoint {
            condition: condition.to_string(),
            rounded_time,
            cell_count,
            morphology,
            precipitation,
        });
    }

    if degenerate > 0 {
        log::debug!("{degenerate} curve buckets have a single observation; std undefined");
    }
    points
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Dataset;
    use crate::data::pipeline::prepare;
    use proptest::prelude::*;

    fn obs(condition: &str, time: f64, cell_count: f64) -> Observation {
        Observation {
            condition: condition.to_string(),
            time,
            rounded_time: time.round() as i64,
            cell_count,
            morphology: cell_count * 0.5,
            precipitation: cell_count.abs(),
        }
    }

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

    #[test]
    fn sample_std_uses_n_minus_one() {
        let stat = SummaryStat::from_samples(&[2.0, 1.0]).unwrap();
        assert_eq!(stat.mean, 1.5);
        assert!((stat.std.unwrap() - 0.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(stat.n, 2);
    }

    #[test]
    fn single_sample_std_is_undefined_not_nan() {
        let stat = SummaryStat::from_samples(&[3.0]).unwrap();
        assert_eq!(stat.mean, 3.0);
        assert_eq!(stat.std, None);
        assert_eq!(stat.std_or_zero(), 0.0);
    }

    #[test]
    fn empty_samples_yield_no_stat() {
        assert_eq!(SummaryStat::from_samples(&[]), None);
    }

    #[test]
    fn two_replicate_scenario_after_alignment() {
        // Two replicates of A with ragged lengths; alignment clips both to
        // two timepoints before aggregation.
        let dataset = Dataset::from_replicates(vec![
            rep("A", &[0.0, 6.0, 12.0], &[1.0, 2.0, 3.0]),
            rep("A", &[0.0, 6.0], &[1.0, 1.0]),
        ]);
        let (_, observations) = prepare(&dataset);
        let curves = curve_statistics(&observations);

        assert_eq!(curves.len(), 2);

        let at_zero = &curves[0];
        assert_eq!(at_zero.rounded_time, 0);
        assert_eq!(at_zero.cell_count.mean, 1.0);
        assert_eq!(at_zero.cell_count.std, Some(0.0));

        let at_six = &curves[1];
        assert_eq!(at_six.rounded_time, 6);
        assert_eq!(at_six.cell_count.mean, 1.5);
        assert!((at_six.cell_count.std.unwrap() - 0.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn curve_rows_sorted_by_condition_then_time() {
        let observations = vec![
            obs("B", 6.0, 2.0),
            obs("A", 12.0, 3.0),
            obs("A", 0.0, 1.0),
            obs("B", 0.0, 1.0),
        ];
        let curves = curve_statistics(&observations);
        let keys: Vec<(&str, i64)> = curves
            .iter()
            .map(|p| (p.condition.as_str(), p.rounded_time))
            .collect();
        assert_eq!(keys, [("A", 0), ("A", 12), ("B", 0), ("B", 6)]);
    }

    #[test]
    fn nearby_times_merge_into_one_bucket() {
        let observations = vec![obs("A", 5.98, 2.0), obs("A", 6.02, 4.0)];
        let curves = curve_statistics(&observations);
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].rounded_time, 6);
        assert_eq!(curves[0].cell_count.mean, 3.0);
        assert_eq!(curves[0].cell_count.n, 2);
    }

    #[test]
    fn bar_statistics_per_condition() {
        let mut r1 = rep("A", &[0.0], &[1.0]);
        r1.growth_rate_k = Some(0.2);
        let mut r2 = rep("A", &[0.0], &[1.0]);
        r2.growth_rate_k = Some(0.4);
        let r3 = rep("B", &[0.0], &[1.0]);

        let stats = bar_statistics(&[r1, r2, r3]);
        assert_eq!(stats.len(), 2);

        let a = &stats[0];
        assert_eq!(a.condition, "A");
        assert_eq!(a.replicates, 2);
        let k = a.growth_rate_k.unwrap();
        assert!((k.mean - 0.3).abs() < 1e-12);
        assert!(k.std.is_some());

        // Singleton group: mean defined, std undefined, no NaN anywhere.
        let b = &stats[1];
        let k = b.growth_rate_k.unwrap();
        assert_eq!(k.std, None);
        assert!(k.mean.is_finite());
        assert_eq!(k.std_or_zero(), 0.0);
    }

    #[test]
    fn absent_scalar_fields_are_skipped_not_poisoning() {
        let mut r1 = rep("A", &[0.0], &[1.0]);
        r1.growth_rate_k = None;
        let mut r2 = rep("A", &[0.0], &[1.0]);
        r2.growth_rate_k = Some(0.4);

        let stats = bar_statistics(&[r1, r2]);
        let k = stats[0].growth_rate_k.unwrap();
        assert_eq!(k.n, 1);
        assert_eq!(k.mean, 0.4);

        let mut r3 = rep("B", &[0.0], &[1.0]);
        r3.average_precipitation = None;
        let stats = bar_statistics(&[r3]);
        assert_eq!(stats[0].average_precipitation, None);
    }

    proptest! {
        #[test]
        fn curve_statistics_are_order_independent(
            samples in proptest::collection::vec(
                (0u8..3, 0u8..5, -100.0f64..100.0),
                1..40,
            ),
            rotation in 0usize..40,
        ) {
            let observations: Vec<Observation> = samples
                .iter()
                .map(|&(c, t, v)| obs(&format!("C{c}"), f64::from(t), v))
                .collect();

            let mut permuted = observations.clone();
            permuted.reverse();
            let len = permuted.len();
            permuted.rotate_left(rotation % len);

            let a = curve_statistics(&observations);
            let b = curve_statistics(&permuted);
            prop_assert_eq!(a.len(), b.len());
            for (x, y) in a.iter().zip(&b) {
                prop_assert_eq!(&x.condition, &y.condition);
                prop_assert_eq!(x.rounded_time, y.rounded_time);
                prop_assert!((x.cell_count.mean - y.cell_count.mean).abs() < 1e-9);
                prop_assert!(
                    (x.cell_count.std_or_zero() - y.cell_count.std_or_zero()).abs() < 1e-9
                );
                prop_assert_eq!(x.cell_count.n, y.cell_count.n);
            }
        }

        #[test]
        fn full_pipeline_is_idempotent(
            lengths in proptest::collection::vec((0u8..3, 1usize..6), 1..8),
        ) {
            let replicates: Vec<Replicate> = lengths
                .iter()
                .map(|&(c, len)| {
                    let times: Vec<f64> = (0..len).map(|i| i as f64 * 6.0).collect();
                    let counts: Vec<f64> = (0..len).map(|i| (i + 1) as f64).collect();
                    rep(&format!("C{c}"), &times, &counts)
                })
                .collect();
            let dataset = Dataset::from_replicates(replicates);

            let (rows_a, obs_a) = prepare(&dataset);
            let (rows_b, obs_b) = prepare(&dataset);
            prop_assert_eq!(rows_a, rows_b);
            prop_assert_eq!(&obs_a, &obs_b);

            prop_assert_eq!(curve_statistics(&obs_a), curve_statistics(&obs_b));
        }
    }
}
