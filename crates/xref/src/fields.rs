use std::collections::HashMap;

use crate::model::RecordKind;

/// Which fields must be equal for two records of one kind to be the same entity.
#[derive(Debug, Clone, Default)]
pub struct FieldTable {
    fields: HashMap<RecordKind, Vec<String>>,
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contributors/payees match on name and address, candidates on name,
    /// office and district, PACs on name alone.
    pub fn standard() -> Self {
        Self::new()
            .with(RecordKind::Transactee, &["name", "address"])
            .with(RecordKind::Candidate, &["name", "office", "district"])
            .with(RecordKind::Pac, &["name"])
    }

    pub fn with(mut self, kind: RecordKind, fields: &[&str]) -> Self {
        self.fields
            .insert(kind, fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn fields_for(&self, kind: &RecordKind) -> Option<&[String]> {
        self.fields.get(kind).map(Vec::as_slice)
    }
}
