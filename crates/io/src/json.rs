// JSON record collections

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::IoError;

/// Load a collection: the file must hold one JSON array of records.
pub fn load_records(path: &Path) -> Result<Vec<Value>, IoError> {
    let file = File::open(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_reader(BufReader::new(file)).map_err(|source| IoError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let Value::Array(records) = value else {
        return Err(IoError::NotAnArray {
            path: path.to_path_buf(),
        });
    };

    info!(path = %path.display(), records = records.len(), "loaded records");
    Ok(records)
}

/// Write a collection back out.
///
/// Pretty output sorts object keys at every level and indents by four
/// spaces; compact output keeps field order as loaded. The target is
/// replaced atomically, so a failed write leaves an existing file intact.
pub fn write_records(path: &Path, records: &[Value], pretty: bool) -> Result<(), IoError> {
    let ser_err = |source| IoError::Serialize {
        path: path.to_path_buf(),
        source,
    };

    write_atomic(path, |writer| {
        if pretty {
            let sorted: Vec<Value> = records.iter().map(sort_keys).collect();
            let mut ser = Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"    "));
            sorted.serialize(&mut ser).map_err(ser_err)
        } else {
            serde_json::to_writer(writer, records).map_err(ser_err)
        }
    })?;

    info!(path = %path.display(), records = records.len(), pretty, "wrote records");
    Ok(())
}

/// Write to a temp file beside `path`, then rename it over `path`.
///
/// The temp file is removed if `body` or any later step fails.
fn write_atomic<F>(path: &Path, body: F) -> Result<(), IoError>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<(), IoError>,
{
    let write_err = |source| IoError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        body(&mut writer)?;
        writer.write_all(b"\n").map_err(write_err)?;
        writer.flush().map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;

    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_keys(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
