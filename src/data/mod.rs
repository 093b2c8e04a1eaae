/// Data layer: core types, loading, reshaping, and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (schema-checked, typed series)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ pipeline  │  row truncation → condition alignment → Observations
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  restrict to the selected conditions (pure)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  bar statistics + curve statistics (mean ± sample std)
///   └──────────┘
/// ```
///
/// Every stage returns a new table; nothing mutates shared state.  Loading
/// and reshaping run once per upload, filtering and aggregation re-run on
/// each selection change.

pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod stats;
