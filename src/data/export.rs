use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::error::DataError;
use super::stats::{BarStat, CurvePoint, SummaryStat};

// ---------------------------------------------------------------------------
// Flat CSV records
// ---------------------------------------------------------------------------

/// One Bar Statistics row, flattened for CSV.  An undefined std serialises
/// as an empty cell, never as 0.
#[derive(Debug, Serialize)]
struct BarRecord<'a> {
    #[serde(rename = "Condition")]
    condition: &'a str,
    #[serde(rename = "Replicates")]
    replicates: usize,
    #[serde(rename = "Average morphology (mean)")]
    average_morphology_mean: Option<f64>,
    #[serde(rename = "Average morphology (std)")]
    average_morphology_std: Option<f64>,
    #[serde(rename = "Growth rate (k) (mean)")]
    growth_rate_k_mean: Option<f64>,
    #[serde(rename = "Growth rate (k) (std)")]
    growth_rate_k_std: Option<f64>,
    #[serde(rename = "Average precipitation (mean)")]
    average_precipitation_mean: Option<f64>,
    #[serde(rename = "Average precipitation (std)")]
    average_precipitation_std: Option<f64>,
}

#[derive(Debug, Serialize)]
struct CurveRecord<'a> {
    #[serde(rename = "Condition")]
    condition: &'a str,
    #[serde(rename = "Time")]
    rounded_time: i64,
    #[serde(rename = "Observations")]
    n: usize,
    #[serde(rename = "Cell count (mean)")]
    cell_count_mean: f64,
    #[serde(rename = "Cell count (std)")]
    cell_count_std: Option<f64>,
    #[serde(rename = "Morphology (mean)")]
    morphology_mean: f64,
    #[serde(rename = "Morphology (std)")]
    morphology_std: Option<f64>,
    #[serde(rename = "Precipitation (mean)")]
    precipitation_mean: f64,
    #[serde(rename = "Precipitation (std)")]
    precipitation_std: Option<f64>,
}

fn mean_of(stat: Option<&SummaryStat>) -> Option<f64> {
    stat.map(|s| s.mean)
}

fn std_of(stat: Option<&SummaryStat>) -> Option<f64> {
    stat.and_then(|s| s.std)
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

pub fn write_bar_statistics(path: &Path, stats: &[BarStat]) -> Result<(), DataError> {
    write_bar_records(csv::Writer::from_path(path)?, stats)
}

pub fn write_curve_statistics(path: &Path, points: &[CurvePoint]) -> Result<(), DataError> {
    write_curve_records(csv::Writer::from_path(path)?, points)
}

fn write_bar_records<W: Write>(
    mut writer: csv::Writer<W>,
    stats: &[BarStat],
) -> Result<(), DataError> {
    for stat in stats {
        writer.serialize(BarRecord {
            condition: &stat.condition,
            replicates: stat.replicates,
            average_morphology_mean: mean_of(stat.average_morphology.as_ref()),
            average_morphology_std: std_of(stat.average_morphology.as_ref()),
            growth_rate_k_mean: mean_of(stat.growth_rate_k.as_ref()),
            growth_rate_k_std: std_of(stat.growth_rate_k.as_ref()),
            average_precipitation_mean: mean_of(stat.average_precipitation.as_ref()),
            average_precipitation_std: std_of(stat.average_precipitation.as_ref()),
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn write_curve_records<W: Write>(
    mut writer: csv::Writer<W>,
    points: &[CurvePoint],
) -> Result<(), DataError> {
    for point in points {
        writer.serialize(CurveRecord {
            condition: &point.condition,
            rounded_time: point.rounded_time,
            n: point.cell_count.n,
            cell_count_mean: point.cell_count.mean,
            cell_count_std: point.cell_count.std,
            morphology_mean: point.morphology.mean,
            morphology_std: point.morphology.std,
            precipitation_mean: point.precipitation.mean,
            precipitation_std: point.precipitation.std,
        })?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_std_exports_as_empty_cell() {
        let stats = vec![BarStat {
            condition: "A".to_string(),
            replicates: 1,
            average_morphology: SummaryStat::from_samples(&[0.5]),
            growth_rate_k: SummaryStat::from_samples(&[0.2]),
            average_precipitation: None,
        }];

        let mut buf = Vec::new();
        write_bar_records(csv::Writer::from_writer(&mut buf), &stats).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("Condition,Replicates,"));
        // mean present, std empty; wholly absent field empty twice
        assert_eq!(lines.next().unwrap(), "A,1,0.5,,0.2,,,");
    }

    #[test]
    fn curve_export_round_trips_sorted_rows() {
        let points = vec![CurvePoint {
            condition: "A".to_string(),
            rounded_time: 6,
            cell_count: SummaryStat {
                mean: 1.5,
                std: Some(0.5),
                n: 2,
            },
            morphology: SummaryStat {
                mean: 0.5,
                std: Some(0.0),
                n: 2,
            },
            precipitation: SummaryStat {
                mean: 0.1,
                std: Some(0.0),
                n: 2,
            },
        }];

        let mut buf = Vec::new();
        write_curve_records(csv::Writer::from_writer(&mut buf), &points).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("A,6,2,1.5,0.5,"));
    }
}
