/// Data layer: core types, the built-in table, loading and export.
///
/// Architecture:
/// ```text
///  iris::dataset()     .parquet / .json / .csv
///        │                     │
///        │               ┌──────────┐
///        │               │  loader   │  parse file → Dataset
///        │               └──────────┘
///        ▼                     ▼
///   ┌────────────────────────────────┐
///   │ Dataset                        │  predictors + class label, row ids
///   └────────────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  Dataset → .csv / .parquet
///   └──────────┘
/// ```

pub mod export;
pub mod iris;
pub mod loader;
pub mod model;
