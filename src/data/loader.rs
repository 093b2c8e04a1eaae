use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeListArray, ListArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::DataError;
use super::model::{
    Dataset, Replicate, COL_AVG_MORPHOLOGY, COL_AVG_PRECIPITATION, COL_CELL_COUNT, COL_CONDITION,
    COL_GROWTH_RATE, COL_MORPHOLOGY, COL_PRECIPITATION, COL_TIME, REQUIRED_COLUMNS,
};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a growth table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – delimited text; the four series columns hold sequence
///   literals such as `"[0, 6, 12, 24]"`
/// * `.json`    – `[{ "Condition": "...", "Time after seeding": [...], ... }, ...]`
/// * `.parquet` – series columns as List<Float64>, e.g. written by pandas
///
/// The decoding contract is fixed per format: CSV series cells are always
/// encoded text, JSON and Parquet series columns always arrive pre-typed.
/// Every format is checked for the full required column set before any row
/// is read.
pub fn load_file(path: &Path) -> Result<Dataset, DataError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(DataError::UnsupportedExtension(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset, DataError> {
    read_csv(csv::Reader::from_path(path)?)
}

/// CSV layout: header row with the full column set; series cells hold
/// bracketed numeric sequence literals, scalar cells plain numbers.  Empty
/// cells mean "not recorded for this replicate" and are not an error;
/// ragged series lengths are repaired later by the pipeline.
fn read_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Dataset, DataError> {
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let col = |name: &str| -> Result<usize, DataError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    };

    // Resolve the whole schema before touching any record.
    let condition_idx = col(COL_CONDITION)?;
    let time_idx = col(COL_TIME)?;
    let count_idx = col(COL_CELL_COUNT)?;
    let morphology_idx = col(COL_MORPHOLOGY)?;
    let precipitation_idx = col(COL_PRECIPITATION)?;
    let avg_morphology_idx = col(COL_AVG_MORPHOLOGY)?;
    let growth_rate_idx = col(COL_GROWTH_RATE)?;
    let avg_precipitation_idx = col(COL_AVG_PRECIPITATION)?;

    let mut replicates = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

        replicates.push(Replicate {
            condition: cell(condition_idx).to_string(),
            time_after_seeding: parse_sequence_literal(cell(time_idx), row_no, COL_TIME)?,
            cell_count: parse_sequence_literal(cell(count_idx), row_no, COL_CELL_COUNT)?,
            morphology: parse_sequence_literal(cell(morphology_idx), row_no, COL_MORPHOLOGY)?,
            precipitation: parse_sequence_literal(
                cell(precipitation_idx),
                row_no,
                COL_PRECIPITATION,
            )?,
            average_morphology: parse_scalar(cell(avg_morphology_idx), row_no, COL_AVG_MORPHOLOGY)?,
            growth_rate_k: parse_scalar(cell(growth_rate_idx), row_no, COL_GROWTH_RATE)?,
            average_precipitation: parse_scalar(
                cell(avg_precipitation_idx),
                row_no,
                COL_AVG_PRECIPITATION,
            )?,
        });
    }

    Ok(Dataset::from_replicates(replicates))
}

/// Decode a text cell holding a numeric sequence literal, e.g. `[0, 6, 12]`.
fn parse_sequence_literal(
    text: &str,
    row: usize,
    column: &str,
) -> Result<Option<Vec<f64>>, DataError> {
    if text.is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<Vec<f64>>(text)
        .map(Some)
        .map_err(|e| {
            DataError::parse(row, column, format!("'{text}' is not a numeric sequence: {e}"))
        })
}

fn parse_scalar(text: &str, row: usize, column: &str) -> Result<Option<f64>, DataError> {
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| DataError::parse(row, column, format!("'{text}' is not a number")))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "Condition": "Control",
///     "Time after seeding": [0.0, 6.0, 12.0],
///     "Cell count": [1.0e5, 4.0e5, 1.6e6],
///     ...
///     "Growth rate (k)": 0.23
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Dataset, DataError> {
    let text = std::fs::read_to_string(path)?;
    read_json(&text)
}

fn read_json(text: &str) -> Result<Dataset, DataError> {
    let root: JsonValue = serde_json::from_str(text)?;

    let records = root
        .as_array()
        .ok_or_else(|| DataError::parse(0, "<root>", "expected a top-level JSON array"))?;

    // Schema check against the first record before parsing anything.
    if let Some(first) = records.first() {
        let obj = first
            .as_object()
            .ok_or_else(|| DataError::parse(0, "<root>", "row 0 is not a JSON object"))?;
        for column in REQUIRED_COLUMNS {
            if !obj.contains_key(column) {
                return Err(DataError::MissingColumn(column.to_string()));
            }
        }
    }

    let mut replicates = Vec::with_capacity(records.len());

    for (row_no, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| {
            DataError::parse(row_no, "<root>", "row is not a JSON object")
        })?;

        let condition = obj
            .get(COL_CONDITION)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| DataError::parse(row_no, COL_CONDITION, "missing or non-string label"))?
            .to_string();

        replicates.push(Replicate {
            condition,
            time_after_seeding: json_series(obj.get(COL_TIME), row_no, COL_TIME)?,
            cell_count: json_series(obj.get(COL_CELL_COUNT), row_no, COL_CELL_COUNT)?,
            morphology: json_series(obj.get(COL_MORPHOLOGY), row_no, COL_MORPHOLOGY)?,
            precipitation: json_series(obj.get(COL_PRECIPITATION), row_no, COL_PRECIPITATION)?,
            average_morphology: json_scalar(obj.get(COL_AVG_MORPHOLOGY), row_no, COL_AVG_MORPHOLOGY)?,
            growth_rate_k: json_scalar(obj.get(COL_GROWTH_RATE), row_no, COL_GROWTH_RATE)?,
            average_precipitation: json_scalar(
                obj.get(COL_AVG_PRECIPITATION),
                row_no,
                COL_AVG_PRECIPITATION,
            )?,
        });
    }

    Ok(Dataset::from_replicates(replicates))
}

/// JSON series arrive pre-typed: a numeric array or null, never text.
fn json_series(
    val: Option<&JsonValue>,
    row: usize,
    column: &str,
) -> Result<Option<Vec<f64>>, DataError> {
    let val = match val {
        None | Some(JsonValue::Null) => return Ok(None),
        Some(v) => v,
    };
    let arr = val
        .as_array()
        .ok_or_else(|| DataError::parse(row, column, "expected a numeric array or null"))?;
    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .ok_or_else(|| DataError::parse(row, column, format!("element {j} is not a number")))
        })
        .collect::<Result<Vec<f64>, DataError>>()
        .map(Some)
}

fn json_scalar(
    val: Option<&JsonValue>,
    row: usize,
    column: &str,
) -> Result<Option<f64>, DataError> {
    match val {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| DataError::parse(row, column, "expected a number or null")),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet growth table.
///
/// Expected schema:
/// - the four series columns as List<Float64> / LargeList<Float64>
/// - `Condition` as Utf8
/// - the three summary columns as Float64 (Float32/Int also accepted)
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset, DataError> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    // Schema check before any batch is decoded.
    let schema = builder.schema().clone();
    for column in REQUIRED_COLUMNS {
        if schema.index_of(column).is_err() {
            return Err(DataError::MissingColumn(column.to_string()));
        }
    }

    let reader = builder.build()?;
    let mut replicates = Vec::new();
    let mut row_offset = 0usize;

    for batch_result in reader {
        let batch = batch_result?;
        let by_name = |name: &str| batch.column(schema.index_of(name).expect("checked above"));

        let condition_col = by_name(COL_CONDITION);
        let time_col = by_name(COL_TIME);
        let count_col = by_name(COL_CELL_COUNT);
        let morphology_col = by_name(COL_MORPHOLOGY);
        let precipitation_col = by_name(COL_PRECIPITATION);
        let avg_morphology_col = by_name(COL_AVG_MORPHOLOGY);
        let growth_rate_col = by_name(COL_GROWTH_RATE);
        let avg_precipitation_col = by_name(COL_AVG_PRECIPITATION);

        for row in 0..batch.num_rows() {
            let row_no = row_offset + row;
            replicates.push(Replicate {
                condition: extract_condition(condition_col, row, row_no)?,
                time_after_seeding: extract_series(time_col, row, row_no, COL_TIME)?,
                cell_count: extract_series(count_col, row, row_no, COL_CELL_COUNT)?,
                morphology: extract_series(morphology_col, row, row_no, COL_MORPHOLOGY)?,
                precipitation: extract_series(precipitation_col, row, row_no, COL_PRECIPITATION)?,
                average_morphology: extract_scalar(avg_morphology_col, row, row_no, COL_AVG_MORPHOLOGY)?,
                growth_rate_k: extract_scalar(growth_rate_col, row, row_no, COL_GROWTH_RATE)?,
                average_precipitation: extract_scalar(
                    avg_precipitation_col,
                    row,
                    row_no,
                    COL_AVG_PRECIPITATION,
                )?,
            });
        }
        row_offset += batch.num_rows();
    }

    Ok(Dataset::from_replicates(replicates))
}

// -- Parquet / Arrow helpers --

fn extract_condition(col: &Arc<dyn Array>, row: usize, row_no: usize) -> Result<String, DataError> {
    if col.is_null(row) {
        return Err(DataError::parse(row_no, COL_CONDITION, "null condition label"));
    }
    match col.data_type() {
        DataType::Utf8 => Ok(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => Err(DataError::parse(
            row_no,
            COL_CONDITION,
            format!("expected Utf8 column, got {other:?}"),
        )),
    }
}

/// Extract an optional `Vec<f64>` from a List or LargeList column.
fn extract_series(
    col: &Arc<dyn Array>,
    row: usize,
    row_no: usize,
    column: &str,
) -> Result<Option<Vec<f64>>, DataError> {
    if col.is_null(row) {
        return Ok(None);
    }

    let values = match col.data_type() {
        DataType::List(_) => {
            let list = col
                .as_any()
                .downcast_ref::<ListArray>()
                .expect("List column downcasts to ListArray");
            list.value(row)
        }
        DataType::LargeList(_) => {
            let list = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .expect("LargeList column downcasts to LargeListArray");
            list.value(row)
        }
        other => {
            return Err(DataError::parse(
                row_no,
                column,
                format!("expected List or LargeList column, got {other:?}"),
            ));
        }
    };

    // The inner array can be Float64 or Float32.
    if let Some(f64_arr) = values.as_any().downcast_ref::<Float64Array>() {
        Ok(Some(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect()))
    } else if let Some(f32_arr) = values.as_any().downcast_ref::<Float32Array>() {
        Ok(Some(
            f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect(),
        ))
    } else {
        Err(DataError::parse(
            row_no,
            column,
            format!(
                "list inner type is {:?}, expected Float64 or Float32",
                values.data_type()
            ),
        ))
    }
}

fn extract_scalar(
    col: &Arc<dyn Array>,
    row: usize,
    row_no: usize,
    column: &str,
) -> Result<Option<f64>, DataError> {
    if col.is_null(row) {
        return Ok(None);
    }
    match col.data_type() {
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            Ok(Some(arr.value(row)))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            Ok(Some(arr.value(row) as f64))
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            Ok(Some(arr.value(row) as f64))
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            Ok(Some(arr.value(row) as f64))
        }
        other => Err(DataError::parse(
            row_no,
            column,
            format!("expected a numeric column, got {other:?}"),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Condition,Time after seeding,Cell count,Morphology,Precipitation,\
Average morphology,Growth rate (k),Average precipitation";

    fn csv_dataset(body: &str) -> Result<Dataset, DataError> {
        let text = format!("{HEADER}\n{body}");
        read_csv(csv::Reader::from_reader(text.as_bytes()))
    }

    #[test]
    fn csv_decodes_sequence_literals_and_scalars() {
        let ds = csv_dataset(
            "Control,\"[0, 6, 12, 24]\",\"[1.0, 2.0, 4.0, 8.0]\",\"[0.5, 0.6, 0.7, 0.8]\",\
\"[0.0, 0.1, 0.1, 0.2]\",0.65,0.23,0.1\n",
        )
        .unwrap();

        assert_eq!(ds.len(), 1);
        let rep = &ds.replicates[0];
        assert_eq!(rep.condition, "Control");
        assert_eq!(rep.time_after_seeding.as_deref(), Some(&[0.0, 6.0, 12.0, 24.0][..]));
        assert_eq!(rep.cell_count.as_deref(), Some(&[1.0, 2.0, 4.0, 8.0][..]));
        assert_eq!(rep.growth_rate_k, Some(0.23));
    }

    #[test]
    fn csv_accepts_ragged_series_lengths() {
        // Series of different lengths are the pipeline's problem, not the
        // loader's.
        let ds = csv_dataset(
            "A,\"[0, 6, 12]\",\"[1, 2]\",\"[0.5]\",\"[0.0, 0.1, 0.2, 0.3]\",,,\n",
        )
        .unwrap();
        let rep = &ds.replicates[0];
        assert_eq!(rep.time_after_seeding.as_ref().unwrap().len(), 3);
        assert_eq!(rep.cell_count.as_ref().unwrap().len(), 2);
        assert_eq!(rep.average_morphology, None);
    }

    #[test]
    fn csv_empty_series_cells_are_absent_not_errors() {
        let ds = csv_dataset("A,,,,,0.5,0.2,0.1\n").unwrap();
        let rep = &ds.replicates[0];
        assert_eq!(rep.time_after_seeding, None);
        assert_eq!(rep.average_morphology, Some(0.5));
    }

    #[test]
    fn csv_missing_column_is_a_schema_error() {
        let text = "Condition,Time after seeding\nA,\"[0]\"\n";
        let err = read_csv(csv::Reader::from_reader(text.as_bytes())).unwrap_err();
        match err {
            DataError::MissingColumn(col) => assert_eq!(col, COL_CELL_COUNT),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn csv_bad_sequence_literal_is_fatal() {
        let err = csv_dataset("A,\"[0, oops]\",\"[1]\",\"[1]\",\"[1]\",,,\n").unwrap_err();
        match err {
            DataError::Parse { row, column, .. } => {
                assert_eq!(row, 0);
                assert_eq!(column, COL_TIME);
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn json_series_arrive_pre_typed() {
        let text = r#"[
          {
            "Condition": "Control",
            "Time after seeding": [0.0, 6.0],
            "Cell count": [1.0, 2.0],
            "Morphology": [0.5, 0.6],
            "Precipitation": null,
            "Average morphology": 0.55,
            "Growth rate (k)": 0.2,
            "Average precipitation": null
          }
        ]"#;
        let ds = read_json(text).unwrap();
        let rep = &ds.replicates[0];
        assert_eq!(rep.time_after_seeding.as_deref(), Some(&[0.0, 6.0][..]));
        assert_eq!(rep.precipitation, None);
        assert_eq!(rep.average_precipitation, None);
    }

    #[test]
    fn json_string_encoded_series_is_rejected() {
        // Per the ingestion contract JSON series are never text.
        let text = r#"[
          {
            "Condition": "A",
            "Time after seeding": "[0, 6]",
            "Cell count": [1.0, 2.0],
            "Morphology": [0.5, 0.6],
            "Precipitation": [0.0, 0.1],
            "Average morphology": 1,
            "Growth rate (k)": 1,
            "Average precipitation": 1
          }
        ]"#;
        assert!(matches!(
            read_json(text).unwrap_err(),
            DataError::Parse { .. }
        ));
    }

    #[test]
    fn json_missing_required_key_is_a_schema_error() {
        let text = r#"[{"Condition": "A", "Time after seeding": [0.0]}]"#;
        assert!(matches!(
            read_json(text).unwrap_err(),
            DataError::MissingColumn(_)
        ));
    }

    #[test]
    fn unsupported_extension_is_reported() {
        let err = load_file(Path::new("growth.xlsx")).unwrap_err();
        match err {
            DataError::UnsupportedExtension(ext) => assert_eq!(ext, "xlsx"),
            other => panic!("expected UnsupportedExtension, got {other:?}"),
        }
    }
}
