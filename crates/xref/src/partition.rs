use std::collections::BTreeMap;

use crate::model::Record;

/// Records per filing year, ascending by year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearCounts(BTreeMap<i32, usize>);

/// Half-open index range `[start, end)` one year occupies in the sorted sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBlock {
    pub year: i32,
    pub start: usize,
    pub end: usize,
}

impl YearBlock {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl YearCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, year: i32, count: usize) {
        self.0.insert(year, count);
    }

    pub fn get(&self, year: i32) -> Option<usize> {
        self.0.get(&year).copied()
    }

    /// `(year, count)` pairs, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (i32, usize)> + '_ {
        self.0.iter().map(|(y, c)| (*y, *c))
    }

    pub fn years(&self) -> usize {
        self.0.len()
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Contiguous blocks in chronological order.
    pub fn blocks(&self) -> Vec<YearBlock> {
        let mut start = 0;
        self.0
            .iter()
            .map(|(&year, &count)| {
                let block = YearBlock { year, start, end: start + count };
                start += count;
                block
            })
            .collect()
    }
}

impl FromIterator<(i32, usize)> for YearCounts {
    fn from_iter<I: IntoIterator<Item = (i32, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Year-sorted records plus the size of each year's block.
#[derive(Debug)]
pub struct YearPartition {
    pub records: Vec<Record>,
    pub year_counts: YearCounts,
}

/// Group records by `filed_year` and concatenate the groups oldest first.
/// Records keep their relative order within a year.
pub fn partition_by_year(records: Vec<Record>) -> YearPartition {
    let mut by_year: BTreeMap<i32, Vec<Record>> = BTreeMap::new();
    for record in records {
        by_year.entry(record.filed_year).or_default().push(record);
    }

    let mut year_counts = YearCounts::new();
    let mut combined = Vec::with_capacity(by_year.values().map(Vec::len).sum());
    for (year, group) in by_year {
        year_counts.insert(year, group.len());
        combined.extend(group);
    }

    YearPartition {
        records: combined,
        year_counts,
    }
}
