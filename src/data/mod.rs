/// Data layer: record model and dataset loading.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Record>, column index
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  JSON filter spec → row indices (see crate::filter)
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
