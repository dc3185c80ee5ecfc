//! `yearlink-xref`: cross-year entity linkage engine.
//!
//! Pure engine crate: receives pre-loaded JSON records, links the ones that
//! denote the same entity across filing years, returns annotated records.
//! No CLI or IO dependencies.

pub mod engine;
pub mod error;
pub mod fields;
pub mod matcher;
pub mod model;
pub mod partition;
pub mod report;

pub use engine::{inspect_collection, link_collection, run, LinkedCollection, RunInput, RunOptions, RunOutput};
pub use error::XrefError;
pub use fields::FieldTable;
pub use matcher::{match_across_years, MatchStats, UnknownKindPolicy};
pub use model::{LinkSet, Record, RecordId, RecordKind};
pub use partition::{partition_by_year, YearBlock, YearCounts, YearPartition};
pub use report::{CollectionProfile, CollectionReport, RunMeta, RunResult, YearCount};
