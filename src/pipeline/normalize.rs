//! Aligning feature records to a table header
//!
//! A header column maps to a record field by a fixed rule: lower-case, spaces
//! to underscores, a trailing single-letter plural marker such as `(s)`
//! folded into the word, remaining parentheses dropped. So
//! `"Example Activation Command(s)"` reads field `example_activation_commands`.

use crate::extraction::FeatureRecord;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("record has {actual} positional fields but the header has {expected} columns")]
    SchemaMismatch { expected: usize, actual: usize },
}

/// Field key a header column reads from.
pub fn header_field_key(column: &str) -> String {
    let mut key = column.trim().to_lowercase().replace(' ', "_");

    let marker = key.len().checked_sub(3).and_then(|start| key.get(start..));
    if let Some(&[b'(', letter, b')']) = marker.map(str::as_bytes) {
        if letter.is_ascii_alphabetic() {
            let start = key.len() - 3;
            key.replace_range(start.., &char::from(letter).to_string());
        }
    }

    key.retain(|c| c != '(' && c != ')');
    key
}

/// Produces one cell per header column.
///
/// A positional row passes through when its length matches the header. A
/// keyed record is read column by column, missing fields become empty cells.
pub fn normalize<S: AsRef<str>>(
    record: &FeatureRecord,
    header: &[S],
) -> Result<Vec<String>, NormalizeError> {
    match record {
        FeatureRecord::Row(row) if row.len() == header.len() => Ok(row.clone()),
        FeatureRecord::Row(row) => Err(NormalizeError::SchemaMismatch {
            expected: header.len(),
            actual: row.len(),
        }),
        keyed => Ok(header
            .iter()
            .map(|column| {
                keyed
                    .field(&header_field_key(column.as_ref()))
                    .unwrap_or_default()
            })
            .collect()),
    }
}
