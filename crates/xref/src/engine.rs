use serde_json::Value;
use tracing::info;

use crate::error::XrefError;
use crate::fields::FieldTable;
use crate::matcher::{match_across_years, UnknownKindPolicy};
use crate::model::Record;
use crate::partition::partition_by_year;
use crate::report::{
    collection_profile, collection_report, CollectionProfile, CollectionReport, RunMeta, RunResult,
};

pub const TRANSACTEES: &str = "transactees";
pub const PARTIES: &str = "parties";

/// Both collections as loaded, one JSON object per record.
pub struct RunInput {
    pub transactees: Vec<Value>,
    pub parties: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub field_table: FieldTable,
    pub unknown_kind: UnknownKindPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            field_table: FieldTable::standard(),
            unknown_kind: UnknownKindPolicy::default(),
        }
    }
}

/// Annotated records (year-sorted) plus their report.
#[derive(Debug)]
pub struct LinkedCollection {
    pub records: Vec<Value>,
    pub report: CollectionReport,
}

pub struct RunOutput {
    pub transactees: Vec<Value>,
    pub parties: Vec<Value>,
    pub result: RunResult,
}

fn parse_records(values: Vec<Value>) -> Result<Vec<Record>, XrefError> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| Record::from_json(i, v))
        .collect()
}

/// Classify, partition and link one collection. Errors are tagged with `name`.
pub fn link_collection(
    name: &str,
    values: Vec<Value>,
    table: &FieldTable,
    policy: UnknownKindPolicy,
) -> Result<LinkedCollection, XrefError> {
    let records = parse_records(values).map_err(|e| e.in_collection(name))?;
    let mut partition = partition_by_year(records);

    info!(
        collection = name,
        records = partition.records.len(),
        years = partition.year_counts.years(),
        "linking across years"
    );

    let stats = match_across_years(&mut partition.records, &partition.year_counts, table, policy)
        .map_err(|e| e.in_collection(name))?;

    let report = collection_report(name, &partition.records, &partition.year_counts, stats);
    info!(
        collection = name,
        matched_pairs = stats.matched_pairs,
        new_links = stats.new_links,
        "linking done"
    );

    Ok(LinkedCollection {
        records: partition.records.into_iter().map(Record::into_json).collect(),
        report,
    })
}

/// Classify and partition one collection without linking anything.
pub fn inspect_collection(name: &str, values: Vec<Value>) -> Result<CollectionProfile, XrefError> {
    let records = parse_records(values).map_err(|e| e.in_collection(name))?;
    let partition = partition_by_year(records);
    Ok(collection_profile(name, &partition.records, &partition.year_counts))
}

/// Link transactees, then parties. Either both succeed or nothing is returned.
pub fn run(input: RunInput, options: &RunOptions) -> Result<RunOutput, XrefError> {
    let transactees = link_collection(
        TRANSACTEES,
        input.transactees,
        &options.field_table,
        options.unknown_kind,
    )?;
    let parties = link_collection(PARTIES, input.parties, &options.field_table, options.unknown_kind)?;

    Ok(RunOutput {
        transactees: transactees.records,
        parties: parties.records,
        result: RunResult {
            meta: RunMeta {
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            transactees: transactees.report,
            parties: parties.report,
        },
    })
}
