/// Data layer: core types, loading, cleaning, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable      (memoized by cache)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  canonical columns, typed values, Revenue → SalesTable
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  region / product / date predicates → filtered SalesTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  KPIs + grouped revenue → AggregateSnapshot
///   └───────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
