//! Row-level data: cell entries and highlighted row sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::codec::CodecError;

/// One cell-level fact belonging to a snapshot.
///
/// The wire names stay `field_key`/`field_value` so existing clients can post
/// rows unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowEntry {
    /// Stable identity of the cell, normally an `R{row}C{col}` key.
    pub field_key: String,
    /// Cell value. Empty cells are carried as `""`.
    #[serde(deserialize_with = "deserialize_cell_value")]
    pub field_value: String,
}

impl RowEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(field_key: impl Into<String>, field_value: impl Into<String>) -> Self {
        Self {
            field_key: field_key.into(),
            field_value: field_value.into(),
        }
    }
}

/// Spreadsheet ingestion hands us raw cell values, so numbers, booleans and
/// nulls are accepted and stored as their textual form.
fn deserialize_cell_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
            return Err(serde::de::Error::custom(format!(
                "cell value must be a scalar, got {other}"
            )));
        }
    })
}

/// Ordered set of highlighted row indices (0-based).
///
/// Indices are kept sorted and deduplicated. They must fit in a Postgres
/// `INTEGER` column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct HighlightedRows(BTreeSet<u32>);

impl HighlightedRows {
    /// Build a highlight set from arbitrary indices.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::HighlightOutOfRange` if an index exceeds `i32::MAX`.
    pub fn new(indices: impl IntoIterator<Item = u32>) -> Result<Self, CodecError> {
        let set: BTreeSet<u32> = indices.into_iter().collect();
        if let Some(&max) = set.last()
            && i32::try_from(max).is_err()
        {
            return Err(CodecError::HighlightOutOfRange(max));
        }
        Ok(Self(set))
    }

    /// Empty highlight set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Whether `row` is highlighted.
    #[must_use]
    pub fn contains(&self, row: u32) -> bool {
        self.0.contains(&row)
    }

    /// Number of highlighted rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no rows are highlighted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Indices as stored in an `INTEGER[]` column.
    #[must_use]
    pub fn to_db(&self) -> Vec<i32> {
        // Construction guarantees every index fits.
        self.0
            .iter()
            .filter_map(|&i| i32::try_from(i).ok())
            .collect()
    }

    /// Rebuild from an `INTEGER[]` column.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::NegativeHighlight` for negative values.
    pub fn from_db(values: &[i32]) -> Result<Self, CodecError> {
        let mut set = BTreeSet::new();
        for &v in values {
            let idx = u32::try_from(v).map_err(|_| CodecError::NegativeHighlight(v))?;
            set.insert(idx);
        }
        Ok(Self(set))
    }
}

impl TryFrom<Vec<u32>> for HighlightedRows {
    type Error = CodecError;

    fn try_from(value: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HighlightedRows> for Vec<u32> {
    fn from(value: HighlightedRows) -> Self {
        value.0.into_iter().collect()
    }
}
