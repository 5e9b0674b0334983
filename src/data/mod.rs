/// Data layer: schemas, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .parquet      Schema (name → type)
///        │                   │
///        ▼                   ▼
///   ┌──────────────────────────┐
///   │  loader                  │  validate + coerce → Table
///   └──────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  Vec<Row>, unique values per column (immutable)
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │  filter   │   │ records   │  typed rows per research question
///   └──────────┘   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group-by sums, ratios, shares
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod records;
pub mod schema;
