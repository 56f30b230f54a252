use crate::record::Schema;
use serde_json::{Map, Value};
use thiserror::Error;

pub type JsonRecord = Map<String, Value>;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Invalid JSON on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record {index} is not a JSON object")]
    NotAnObject { index: usize },
}

/// Parse either a JSON array of objects or one JSON object per line
pub fn parse_records(content: &str) -> Result<Vec<JsonRecord>, InputError> {
    let trimmed = content.trim_start();
    let values = if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<Value>>(trimmed)
            .map_err(|source| InputError::Json { line: 1, source })?
    } else {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str::<Value>(line).map_err(|source| InputError::Json {
                    line: idx + 1,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(record) => Ok(record),
            _ => Err(InputError::NotAnObject { index }),
        })
        .collect()
}

/// Every key found in the records, plus the extra names
pub fn schema_for(records: &[JsonRecord], extra: &[String]) -> Schema {
    let mut names: Vec<&str> = records
        .iter()
        .flat_map(|record| record.keys().map(String::as_str))
        .chain(extra.iter().map(String::as_str))
        .collect();
    names.sort_unstable();
    names.dedup();
    Schema::new(names)
}
