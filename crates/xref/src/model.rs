use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::XrefError;

/// Attribute holding the cross-year links of a record.
pub const EQUIVALENT_IDS: &str = "equivalent_ids";
pub const FILED_YEAR: &str = "filed_year";
const ID: &str = "id";
const TRANSACTEE_TYPE: &str = "transactee_type";
const TYPE: &str = "type";

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Record id as found in the input. Unique within one collection only.
///
/// Kept in its original JSON shape so linked ids serialize back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    /// Integer ids above `i64::MAX`.
    UInt(u64),
    Text(String),
}

impl RecordId {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_u64().map(Self::UInt)),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::UInt(n) => Value::from(*n),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::UInt(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// Discriminator selecting which fields decide equivalence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    Transactee,
    Candidate,
    Pac,
    /// Any other `type` value. Never compared against a different kind.
    Other(String),
}

impl RecordKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Transactee => "Transactee",
            Self::Candidate => "Candidate",
            Self::Pac => "PAC",
            Self::Other(name) => name,
        }
    }

    fn from_type_name(name: &str) -> Self {
        match name {
            "Transactee" => Self::Transactee,
            "Candidate" => Self::Candidate,
            "PAC" => Self::Pac,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a record: `transactee_type` wins, then the `type` value.
pub fn classify(id: &RecordId, fields: &Map<String, Value>) -> Result<RecordKind, XrefError> {
    if fields.contains_key(TRANSACTEE_TYPE) {
        return Ok(RecordKind::Transactee);
    }
    match fields.get(TYPE) {
        Some(Value::String(name)) => Ok(RecordKind::from_type_name(name)),
        Some(_) => Err(XrefError::InvalidKind { id: id.clone() }),
        None => Err(XrefError::MissingKind { id: id.clone() }),
    }
}

fn parse_year(id: &RecordId, value: &Value) -> Result<i32, XrefError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| XrefError::InvalidYear {
        id: id.clone(),
        value: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    })
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Ordered, deduplicated list of linked ids.
#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    ids: Vec<RecordId>,
    seen: HashSet<RecordId>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` unless already present. Returns true when it was new.
    pub fn insert(&mut self, id: RecordId) -> bool {
        if self.seen.contains(&id) {
            return false;
        }
        self.seen.insert(id.clone());
        self.ids.push(id);
        true
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.seen.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.ids.iter().map(RecordId::to_value).collect())
    }
}

impl FromIterator<RecordId> for LinkSet {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One entity observation in one filing year.
///
/// `fields` is the full original object; `equivalent_ids` is the only
/// attribute the engine changes, and it is written back by `into_json`.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: RecordId,
    pub filed_year: i32,
    pub kind: RecordKind,
    pub fields: Map<String, Value>,
    pub equivalent_ids: Option<LinkSet>,
}

impl Record {
    /// Validate and classify one input object. `index` is its position in
    /// the input collection, used for errors raised before the id is known.
    pub fn from_json(index: usize, value: Value) -> Result<Self, XrefError> {
        let Value::Object(fields) = value else {
            return Err(XrefError::NotAnObject { index });
        };

        let id = fields
            .get(ID)
            .and_then(RecordId::from_value)
            .ok_or(XrefError::InvalidId { index })?;

        let filed_year = match fields.get(FILED_YEAR) {
            Some(v) => parse_year(&id, v)?,
            None => {
                return Err(XrefError::MissingField {
                    id,
                    field: FILED_YEAR.into(),
                })
            }
        };

        let kind = classify(&id, &fields)?;

        let equivalent_ids = match fields.get(EQUIVALENT_IDS) {
            None => None,
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .map(|v| RecordId::from_value(v).ok_or_else(|| XrefError::InvalidLinks { id: id.clone() }))
                    .collect::<Result<LinkSet, _>>()?,
            ),
            Some(_) => return Err(XrefError::InvalidLinks { id }),
        };

        Ok(Self {
            id,
            filed_year,
            kind,
            fields,
            equivalent_ids,
        })
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Add `other` to this record's links, creating the list if needed.
    pub fn link(&mut self, other: &RecordId) -> bool {
        self.equivalent_ids
            .get_or_insert_with(LinkSet::new)
            .insert(other.clone())
    }

    pub fn is_linked_to(&self, other: &RecordId) -> bool {
        self.equivalent_ids
            .as_ref()
            .is_some_and(|links| links.contains(other))
    }

    /// Back to a JSON object. Existing field order is kept; a freshly
    /// created `equivalent_ids` lands at the end.
    pub fn into_json(self) -> Value {
        let mut fields = self.fields;
        if let Some(links) = &self.equivalent_ids {
            fields.insert(EQUIVALENT_IDS.to_string(), links.to_value());
        }
        Value::Object(fields)
    }
}
