//! WA Score Comparator
//!
//! Browse scoring tables: points per performance, grouped by discipline and
//! gender, filtered by a discipline selection and/or an exact point value.
//!
//! This library provides:
//! - `record`: canonical scoring records and the normalizer for raw rows
//! - `index`: discipline/gender grouping
//! - `query`: the filter/sort engine
//! - `loader`: JSON and CSV sources, local or over HTTP
//! - `store`: the current index, swapped whole on each load
//! - `params`, `render`, `config`: input acceptance, text output, settings
//!
//! Binaries:
//! - `score-table`: query a scoring table from the command line
//! - `score-browser`: desktop browser with discipline buttons and point input

pub mod config;
pub mod index;
pub mod loader;
pub mod params;
pub mod query;
pub mod record;
pub mod render;
pub mod store;

pub use index::{GenderBuckets, GroupedIndex};
pub use loader::{load, LoadStats, LoadedData, Source, SourceFormat};
pub use params::{parse_point_input, QueryParams};
pub use query::{query, GroupView};
pub use record::{normalize, Gender, Record, ResultValue};
pub use store::IndexStore;
