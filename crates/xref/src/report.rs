use std::collections::BTreeMap;

use serde::Serialize;

use crate::matcher::MatchStats;
use crate::model::Record;
use crate::partition::YearCounts;

// ---------------------------------------------------------------------------
// Per collection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub records: usize,
}

/// Diagnostic counts for one linked collection. Not a data contract.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub name: String,
    pub records: usize,
    pub years: Vec<YearCount>,
    pub matched_pairs: usize,
    pub new_links: usize,
    /// Records holding at least one equivalent id after the run.
    pub linked_records: usize,
}

/// Shape of a collection before matching: records per year and per kind.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionProfile {
    pub name: String,
    pub records: usize,
    pub years: Vec<YearCount>,
    pub kinds: BTreeMap<String, usize>,
    /// Records that already carry equivalent ids.
    pub linked_records: usize,
}

fn year_list(year_counts: &YearCounts) -> Vec<YearCount> {
    year_counts
        .iter()
        .map(|(year, records)| YearCount { year, records })
        .collect()
}

fn linked(records: &[Record]) -> usize {
    records
        .iter()
        .filter(|r| r.equivalent_ids.as_ref().is_some_and(|l| !l.is_empty()))
        .count()
}

pub fn collection_report(
    name: &str,
    records: &[Record],
    year_counts: &YearCounts,
    stats: MatchStats,
) -> CollectionReport {
    CollectionReport {
        name: name.to_string(),
        records: records.len(),
        years: year_list(year_counts),
        matched_pairs: stats.matched_pairs,
        new_links: stats.new_links,
        linked_records: linked(records),
    }
}

pub fn collection_profile(name: &str, records: &[Record], year_counts: &YearCounts) -> CollectionProfile {
    let mut kinds: BTreeMap<String, usize> = BTreeMap::new();
    for r in records {
        *kinds.entry(r.kind.to_string()).or_insert(0) += 1;
    }
    CollectionProfile {
        name: name.to_string(),
        records: records.len(),
        years: year_list(year_counts),
        kinds,
        linked_records: linked(records),
    }
}

// ---------------------------------------------------------------------------
// Whole run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub meta: RunMeta,
    pub transactees: CollectionReport,
    pub parties: CollectionReport,
}
