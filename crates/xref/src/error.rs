use thiserror::Error;

use crate::model::{RecordId, RecordKind};

#[derive(Debug, Error)]
pub enum XrefError {
    /// Input element is not a JSON object.
    #[error("record #{index}: expected a JSON object")]
    NotAnObject { index: usize },

    /// `id` is absent or is neither a string nor an integer.
    #[error("record #{index}: missing or invalid id (expected string or integer)")]
    InvalidId { index: usize },

    /// A required attribute (`filed_year` or a comparison field) is absent.
    #[error("record '{id}': missing field '{field}'")]
    MissingField { id: RecordId, field: String },

    /// `filed_year` is present but is not an integer year.
    #[error("record '{id}': cannot parse filed_year '{value}'")]
    InvalidYear { id: RecordId, value: String },

    /// Neither `transactee_type` nor `type` is present.
    #[error("record '{id}': cannot classify (no 'transactee_type' or 'type')")]
    MissingKind { id: RecordId },

    /// `type` is present but is not a string.
    #[error("record '{id}': 'type' must be a string")]
    InvalidKind { id: RecordId },

    /// `equivalent_ids` is present but is not an array of ids.
    #[error("record '{id}': 'equivalent_ids' must be an array of string or integer ids")]
    InvalidLinks { id: RecordId },

    /// The record's kind has no comparison field set.
    #[error("record '{id}': no comparison fields defined for kind '{kind}'")]
    FieldTableMiss { id: RecordId, kind: RecordKind },

    /// Year counts do not cover the record sequence exactly.
    #[error("year counts cover {counted} record(s) but sequence holds {records}")]
    PartitionMismatch { counted: usize, records: usize },

    /// A record sits inside the block of a different year.
    #[error("record '{id}' (filed {year}) found in the {block} block; sequence is not year-sorted")]
    YearOutOfOrder { id: RecordId, year: i32, block: i32 },

    /// Any of the above, tagged with the collection it came from.
    #[error("{name}: {source}")]
    Collection {
        name: String,
        #[source]
        source: Box<XrefError>,
    },
}

impl XrefError {
    pub fn in_collection(self, name: &str) -> Self {
        Self::Collection {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}
