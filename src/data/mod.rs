/// Data layer: core types, loading, cleaning rules and writing.
///
/// Architecture:
/// ```text
///   raw listings .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (numeric key columns typed)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  price range, then bounding box → drop rows
///   │  dates    │  last_review → Date | Missing
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  Dataset → clean .csv, same columns, no index
///   └──────────┘
/// ```

pub mod dates;
pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;
