use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::XrefError;
use crate::fields::FieldTable;
use crate::model::Record;
use crate::partition::{YearBlock, YearCounts};

/// What to do with records whose kind has no comparison field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKindPolicy {
    /// Abort the whole collection before any record is touched.
    #[default]
    Fail,
    /// Leave such records unlinked.
    Isolate,
}

/// Counters from one matcher pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    /// Judged-equal (earlier, later) pairs, whether or not they were already linked.
    pub matched_pairs: usize,
    /// Pairs where at least one side gained an id.
    pub new_links: usize,
}

/// Link records that denote the same entity across filing years.
///
/// `records` must be year-sorted as produced by `partition_by_year`, with
/// `year_counts` describing its blocks. Every record of every year except the
/// last is compared against every record of all later years; records of one
/// year are never compared with each other. Matches are linked both ways
/// through `equivalent_ids`, at most once per id.
///
/// All input checks run before the first link is written, so an error leaves
/// `records` untouched.
pub fn match_across_years(
    records: &mut [Record],
    year_counts: &YearCounts,
    table: &FieldTable,
    policy: UnknownKindPolicy,
) -> Result<MatchStats, XrefError> {
    let blocks = year_counts.blocks();
    preflight(records, year_counts, &blocks, table, policy)?;

    let mut stats = MatchStats::default();
    let Some((_, earlier)) = blocks.split_last() else {
        return Ok(stats);
    };

    for block in earlier {
        let before = stats;
        for i in block.start..block.end {
            // No field set: isolated kind (preflight rejected it otherwise)
            let Some(fields) = table.fields_for(&records[i].kind) else {
                continue;
            };
            for j in block.end..records.len() {
                if records[j].kind != records[i].kind {
                    continue;
                }
                if !same_entity(&records[i], &records[j], fields) {
                    continue;
                }
                stats.matched_pairs += 1;
                if link_pair(records, i, j) {
                    stats.new_links += 1;
                }
            }
        }
        debug!(
            year = block.year,
            records = block.len(),
            later = records.len() - block.end,
            matched = stats.matched_pairs - before.matched_pairs,
            "compared year block"
        );
    }

    Ok(stats)
}

/// JSON value equality: strings are not normalized, and `1` differs from `1.0`.
fn same_entity(a: &Record, b: &Record, fields: &[String]) -> bool {
    fields.iter().all(|f| a.field(f) == b.field(f))
}

/// Link `records[i]` and `records[j]` (i < j) symmetrically.
fn link_pair(records: &mut [Record], i: usize, j: usize) -> bool {
    let (head, tail) = records.split_at_mut(j);
    let earlier = &mut head[i];
    let later = &mut tail[0];
    let later_added = earlier.link(&later.id);
    let earlier_added = later.link(&earlier.id);
    later_added || earlier_added
}

fn preflight(
    records: &[Record],
    year_counts: &YearCounts,
    blocks: &[YearBlock],
    table: &FieldTable,
    policy: UnknownKindPolicy,
) -> Result<(), XrefError> {
    let counted = year_counts.total();
    if counted != records.len() {
        return Err(XrefError::PartitionMismatch {
            counted,
            records: records.len(),
        });
    }

    for block in blocks {
        for record in &records[block.start..block.end] {
            if record.filed_year != block.year {
                return Err(XrefError::YearOutOfOrder {
                    id: record.id.clone(),
                    year: record.filed_year,
                    block: block.year,
                });
            }
        }
    }

    let mut isolated: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        match table.fields_for(&record.kind) {
            Some(fields) => {
                if let Some(missing) = fields.iter().find(|f| record.field(f).is_none()) {
                    return Err(XrefError::MissingField {
                        id: record.id.clone(),
                        field: missing.clone(),
                    });
                }
            }
            None if policy == UnknownKindPolicy::Fail => {
                return Err(XrefError::FieldTableMiss {
                    id: record.id.clone(),
                    kind: record.kind.clone(),
                });
            }
            None => *isolated.entry(record.kind.to_string()).or_insert(0) += 1,
        }
    }
    for (kind, count) in &isolated {
        warn!(kind = %kind, count, "no comparison fields for kind; records left unlinked");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RecordId, RecordKind};
    use crate::partition::partition_by_year;
    use serde_json::{json, Value};

    fn records(values: Vec<Value>) -> (Vec<Record>, YearCounts) {
        let parsed = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| Record::from_json(i, v).unwrap())
            .collect();
        let part = partition_by_year(parsed);
        (part.records, part.year_counts)
    }

    fn run(values: Vec<Value>) -> (Vec<Record>, MatchStats) {
        let (mut recs, counts) = records(values);
        let stats =
            match_across_years(&mut recs, &counts, &FieldTable::standard(), UnknownKindPolicy::Fail).unwrap();
        (recs, stats)
    }

    fn links(rec: &Record) -> Vec<String> {
        rec.equivalent_ids
            .as_ref()
            .map(|l| l.iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    fn transactee(id: &str, year: i32, name: &str, address: &str) -> Value {
        json!({"id": id, "filed_year": year, "transactee_type": "Business", "name": name, "address": address})
    }

    #[test]
    fn transactee_same_name_and_address() {
        let (recs, stats) = run(vec![
            transactee("t1", 2019, "Acme Corp", "1 Main St"),
            transactee("t2", 2020, "Acme Corp", "1 Main St"),
        ]);
        assert_eq!(stats.matched_pairs, 1);
        assert_eq!(stats.new_links, 1);
        assert_eq!(links(&recs[0]), ["t2"]);
        assert_eq!(links(&recs[1]), ["t1"]);
    }

    #[test]
    fn transactee_address_differs() {
        let (recs, stats) = run(vec![
            transactee("t1", 2019, "Acme Corp", "1 Main St"),
            transactee("t2", 2020, "Acme Corp", "2 Main St"),
        ]);
        assert_eq!(stats.matched_pairs, 0);
        assert!(recs.iter().all(|r| r.equivalent_ids.is_none()));
    }

    #[test]
    fn same_year_is_never_linked() {
        let (recs, stats) = run(vec![
            transactee("t1", 2019, "Acme Corp", "1 Main St"),
            transactee("t2", 2019, "Acme Corp", "1 Main St"),
        ]);
        assert_eq!(stats.matched_pairs, 0);
        assert!(recs.iter().all(|r| r.equivalent_ids.is_none()));
    }

    #[test]
    fn candidate_district_differs() {
        let (_, stats) = run(vec![
            json!({"id": "c1", "filed_year": 2018, "type": "Candidate", "name": "Jo Park", "office": "Mayor", "district": "1"}),
            json!({"id": "c2", "filed_year": 2020, "type": "Candidate", "name": "Jo Park", "office": "Mayor", "district": "2"}),
        ]);
        assert_eq!(stats.matched_pairs, 0);
    }

    #[test]
    fn pac_clique_across_three_years() {
        let (recs, stats) = run(vec![
            json!({"id": "p3", "filed_year": 2020, "type": "PAC", "name": "Friends of Parks"}),
            json!({"id": "p1", "filed_year": 2018, "type": "PAC", "name": "Friends of Parks"}),
            json!({"id": "p2", "filed_year": 2019, "type": "PAC", "name": "Friends of Parks"}),
        ]);
        assert_eq!(stats.matched_pairs, 3);
        assert_eq!(links(&recs[0]), ["p2", "p3"]);
        assert_eq!(links(&recs[1]), ["p1", "p3"]);
        assert_eq!(links(&recs[2]), ["p1", "p2"]);
    }

    #[test]
    fn kinds_never_cross() {
        let (recs, stats) = run(vec![
            transactee("t1", 2019, "Jo Park", "1 Main St"),
            json!({"id": "c1", "filed_year": 2020, "type": "Candidate", "name": "Jo Park", "office": "Mayor", "district": "1"}),
        ]);
        assert_eq!(stats.matched_pairs, 0);
        assert!(recs.iter().all(|r| r.equivalent_ids.is_none()));
    }

    #[test]
    fn values_compare_exactly() {
        let (_, stats) = run(vec![
            json!({"id": "p1", "filed_year": 2019, "type": "PAC", "name": "Friends of Parks"}),
            json!({"id": "p2", "filed_year": 2020, "type": "PAC", "name": "friends of parks "}),
        ]);
        assert_eq!(stats.matched_pairs, 0);

        let (_, stats) = run(vec![
            json!({"id": "p1", "filed_year": 2019, "type": "PAC", "name": 1}),
            json!({"id": "p2", "filed_year": 2020, "type": "PAC", "name": 1.0}),
        ]);
        assert_eq!(stats.matched_pairs, 0);
    }

    #[test]
    fn rerun_counts_pairs_but_adds_no_links() {
        let (mut recs, counts) = records(vec![
            json!({"id": "p1", "filed_year": 2018, "type": "PAC", "name": "N"}),
            json!({"id": "p2", "filed_year": 2019, "type": "PAC", "name": "N"}),
        ]);
        let table = FieldTable::standard();
        let first = match_across_years(&mut recs, &counts, &table, UnknownKindPolicy::Fail).unwrap();
        let second = match_across_years(&mut recs, &counts, &table, UnknownKindPolicy::Fail).unwrap();
        assert_eq!(first, MatchStats { matched_pairs: 1, new_links: 1 });
        assert_eq!(second, MatchStats { matched_pairs: 1, new_links: 0 });
        assert_eq!(links(&recs[0]), ["p2"]);
        assert_eq!(links(&recs[1]), ["p1"]);
    }

    #[test]
    fn one_sided_existing_link_is_completed() {
        let (recs, stats) = run(vec![
            json!({"id": "p1", "filed_year": 2018, "type": "PAC", "name": "N", "equivalent_ids": ["p2"]}),
            json!({"id": "p2", "filed_year": 2019, "type": "PAC", "name": "N"}),
        ]);
        assert_eq!(stats.new_links, 1);
        assert_eq!(links(&recs[0]), ["p2"]);
        assert_eq!(links(&recs[1]), ["p1"]);
    }

    #[test]
    fn unknown_kind_fails_before_any_link() {
        let (mut recs, counts) = records(vec![
            json!({"id": "p1", "filed_year": 2018, "type": "PAC", "name": "N"}),
            json!({"id": "p2", "filed_year": 2019, "type": "PAC", "name": "N"}),
            json!({"id": "x1", "filed_year": 2019, "type": "Committee", "name": "N"}),
        ]);
        let err = match_across_years(&mut recs, &counts, &FieldTable::standard(), UnknownKindPolicy::Fail)
            .unwrap_err();
        assert!(matches!(
            err,
            XrefError::FieldTableMiss { ref id, ref kind }
                if *id == RecordId::from("x1") && *kind == RecordKind::Other("Committee".into())
        ));
        assert!(recs.iter().all(|r| r.equivalent_ids.is_none()));
    }

    #[test]
    fn unknown_kind_isolated() {
        let (mut recs, counts) = records(vec![
            json!({"id": "x1", "filed_year": 2018, "type": "Committee", "name": "N"}),
            json!({"id": "x2", "filed_year": 2019, "type": "Committee", "name": "N"}),
            json!({"id": "p1", "filed_year": 2018, "type": "PAC", "name": "N"}),
            json!({"id": "p2", "filed_year": 2019, "type": "PAC", "name": "N"}),
        ]);
        let stats = match_across_years(&mut recs, &counts, &FieldTable::standard(), UnknownKindPolicy::Isolate)
            .unwrap();
        assert_eq!(stats.matched_pairs, 1);
        for rec in &recs {
            assert_eq!(rec.equivalent_ids.is_some(), rec.kind == RecordKind::Pac);
        }
    }

    #[test]
    fn missing_comparison_field_fails() {
        let (mut recs, counts) = records(vec![
            json!({"id": "c1", "filed_year": 2018, "type": "Candidate", "name": "A", "office": "Mayor"}),
        ]);
        let err = match_across_years(&mut recs, &counts, &FieldTable::standard(), UnknownKindPolicy::Fail)
            .unwrap_err();
        assert!(matches!(err, XrefError::MissingField { ref field, .. } if field == "district"));
    }

    #[test]
    fn counts_must_cover_sequence() {
        let (mut recs, _) = records(vec![
            json!({"id": "p1", "filed_year": 2018, "type": "PAC", "name": "N"}),
            json!({"id": "p2", "filed_year": 2019, "type": "PAC", "name": "N"}),
        ]);
        let short: YearCounts = [(2018, 1)].into_iter().collect();
        let err =
            match_across_years(&mut recs, &short, &FieldTable::standard(), UnknownKindPolicy::Fail).unwrap_err();
        assert!(matches!(err, XrefError::PartitionMismatch { counted: 1, records: 2 }));
    }

    #[test]
    fn unsorted_sequence_is_rejected() {
        let (mut recs, counts) = records(vec![
            json!({"id": "p1", "filed_year": 2018, "type": "PAC", "name": "N"}),
            json!({"id": "p2", "filed_year": 2019, "type": "PAC", "name": "N"}),
        ]);
        recs.swap(0, 1);
        let err =
            match_across_years(&mut recs, &counts, &FieldTable::standard(), UnknownKindPolicy::Fail).unwrap_err();
        assert!(matches!(err, XrefError::YearOutOfOrder { year: 2019, block: 2018, .. }));
    }

    #[test]
    fn single_year_and_empty_input() {
        let (_, stats) = run(vec![json!({"id": "p1", "filed_year": 2018, "type": "PAC", "name": "N"})]);
        assert_eq!(stats, MatchStats::default());
        let (_, stats) = run(Vec::new());
        assert_eq!(stats, MatchStats::default());
    }
}
