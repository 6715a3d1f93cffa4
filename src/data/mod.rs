/// Data layer: core types, ingestion, filtering and summaries.
///
/// Architecture:
/// ```text
///  .xlsx / .xls / .ods / .csv
///        │
///        ▼
///   ┌──────────┐      ┌────────┐
///   │  loader   │ ◄─── │ cache  │  content digest → ingested table
///   └──────────┘      └────────┘
///        │  header row, empty/known columns, footer, start date → year
///        ▼
///   ┌───────────┐
///   │ CaseTable │  columns + Vec<CaseRecord>, never mutated
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  predicate chain → row indices (AND, order kept)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐      ┌────────┐
///   │ summary  │      │ export │  search, groups, metrics / .xlsx
///   └──────────┘      └────────┘
/// ```

pub mod cache;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;
