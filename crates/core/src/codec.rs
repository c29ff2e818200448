//! Conversion between tabular grids and flat row entries.
//!
//! Storage keeps one `(field_key, field_value)` pair per cell. The key is the
//! cell's position written as `R{row}C{col}` with 1-based indices, so a grid
//! can always be rebuilt from its entries. Empty cells are stored as `""`
//! rather than skipped; skipping them would shrink the grid on the way back.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::types::RowEntry;

/// Ordered rows of ordered cell values.
pub type Grid = Vec<Vec<String>>;

/// Upper bound on `rows * cols` when rebuilding a grid from sparse keys.
pub const MAX_GRID_CELLS: usize = 2_000_000;

/// Errors produced while validating or decoding row data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// No rows were supplied.
    #[error("row data is empty")]
    Empty,

    /// An entry has an empty field key.
    #[error("entry {0} has an empty field key")]
    EmptyKey(usize),

    /// A field key does not encode a cell position.
    #[error("invalid cell key: {0}")]
    InvalidKey(String),

    /// Two entries claim the same field key.
    #[error("duplicate field key: {0}")]
    DuplicateKey(String),

    /// Grid would exceed `MAX_GRID_CELLS`.
    #[error("grid of {rows}x{cols} cells is too large")]
    GridTooLarge { rows: usize, cols: usize },

    /// Highlight index does not fit in an `INTEGER` column.
    #[error("highlighted row {0} is out of range")]
    HighlightOutOfRange(u32),

    /// Stored highlight index is negative.
    #[error("highlighted row {0} is negative")]
    NegativeHighlight(i32),
}

/// Position of a cell, 1-based on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub row: usize,
    pub col: usize,
}

impl CellKey {
    /// Key for the cell at 0-based grid indices.
    #[must_use]
    pub const fn from_indices(row: usize, col: usize) -> Self {
        Self {
            row: row + 1,
            col: col + 1,
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}C{}", self.row, self.col)
    }
}

impl FromStr for CellKey {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CodecError::InvalidKey(s.to_owned());

        let rest = s.strip_prefix('R').ok_or_else(invalid)?;
        let (row, col) = rest.split_once('C').ok_or_else(invalid)?;

        Ok(Self {
            row: parse_index(row).ok_or_else(invalid)?,
            col: parse_index(col).ok_or_else(invalid)?,
        })
    }
}

/// Parse a 1-based decimal index: digits only, no leading zero, no zero.
fn parse_index(s: &str) -> Option<usize> {
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Stateless grid/entry converter.
pub struct RowCodec;

impl RowCodec {
    /// Flatten a grid into entries in row-major order.
    ///
    /// Ragged rows are padded with `""` up to the widest row, so the result
    /// always describes a rectangle.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::GridTooLarge` when the padded rectangle exceeds
    /// `MAX_GRID_CELLS`.
    pub fn encode(grid: &Grid) -> Result<Vec<RowEntry>, CodecError> {
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        if grid.len().saturating_mul(width) > MAX_GRID_CELLS {
            return Err(CodecError::GridTooLarge {
                rows: grid.len(),
                cols: width,
            });
        }
        let mut entries = Vec::with_capacity(grid.len() * width);

        for (r, row) in grid.iter().enumerate() {
            for c in 0..width {
                let value = row.get(c).cloned().unwrap_or_default();
                entries.push(RowEntry::new(
                    CellKey::from_indices(r, c).to_string(),
                    value,
                ));
            }
        }

        Ok(entries)
    }

    /// Rebuild a grid from positional entries.
    ///
    /// The grid spans the largest row and column seen; positions without an
    /// entry come back as `""`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::InvalidKey` for a non-positional key,
    /// `CodecError::DuplicateKey` when two entries share a position, and
    /// `CodecError::GridTooLarge` when the span exceeds `MAX_GRID_CELLS`.
    pub fn decode(entries: &[RowEntry]) -> Result<Grid, CodecError> {
        let mut cells = Vec::with_capacity(entries.len());
        let mut seen = HashSet::with_capacity(entries.len());
        let (mut rows, mut cols) = (0, 0);

        for entry in entries {
            let key: CellKey = entry.field_key.parse()?;
            if !seen.insert(key) {
                return Err(CodecError::DuplicateKey(entry.field_key.clone()));
            }
            rows = rows.max(key.row);
            cols = cols.max(key.col);
            cells.push((key, entry.field_value.as_str()));
        }

        if rows.saturating_mul(cols) > MAX_GRID_CELLS {
            return Err(CodecError::GridTooLarge { rows, cols });
        }

        let mut grid = vec![vec![String::new(); cols]; rows];
        for (key, value) in cells {
            if let Some(cell) = grid
                .get_mut(key.row - 1)
                .and_then(|row| row.get_mut(key.col - 1))
            {
                value.clone_into(cell);
            }
        }

        Ok(grid)
    }

    /// Check a payload before it reaches storage.
    ///
    /// Keys need not be positional here: any non-empty, unique key is stored
    /// as given.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Empty`, `CodecError::EmptyKey` or
    /// `CodecError::DuplicateKey`.
    pub fn validate(entries: &[RowEntry]) -> Result<(), CodecError> {
        if entries.is_empty() {
            return Err(CodecError::Empty);
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.field_key.is_empty() {
                return Err(CodecError::EmptyKey(i));
            }
            if !seen.insert(entry.field_key.as_str()) {
                return Err(CodecError::DuplicateKey(entry.field_key.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|row| row.iter().map(|s| (*s).to_owned()).collect())
            .collect()
    }

    #[test]
    fn test_cell_key_parse_and_display() {
        let key: CellKey = "R12C3".parse().unwrap();
        assert_eq!(key, CellKey { row: 12, col: 3 });
        assert_eq!(key.to_string(), "R12C3");
    }

    #[test]
    fn test_cell_key_rejects_malformed() {
        for bad in ["", "R", "RC", "R1", "C1", "R0C1", "R1C0", "R01C1", "r1c1", "R1C1x", "R-1C1"] {
            assert!(
                matches!(bad.parse::<CellKey>(), Err(CodecError::InvalidKey(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_encode_keeps_empty_cells() {
        let entries = RowCodec::encode(&grid(&[&["a", ""], &["", "d"]])).unwrap();
        let pairs: Vec<(&str, &str)> = entries
            .iter()
            .map(|e| (e.field_key.as_str(), e.field_value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("R1C1", "a"), ("R1C2", ""), ("R2C1", ""), ("R2C2", "d")]
        );
    }

    #[test]
    fn test_decode_reproduces_grid_with_empty_cells() {
        let original = grid(&[&["", "x", ""], &["", "", ""], &["y", "", "z"]]);
        let decoded = RowCodec::decode(&RowCodec::encode(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(RowCodec::encode(&decoded), RowCodec::encode(&original));
    }

    #[test]
    fn test_encode_pads_ragged_rows() {
        let entries = RowCodec::encode(&grid(&[&["a"], &["b", "c", "d"]])).unwrap();
        assert_eq!(entries.len(), 6);
        let decoded = RowCodec::decode(&entries).unwrap();
        assert_eq!(decoded, grid(&[&["a", "", ""], &["b", "c", "d"]]));
    }

    #[test]
    fn test_decode_fills_missing_positions() {
        let entries = vec![RowEntry::new("R2C3", "v"), RowEntry::new("R1C1", "w")];
        let decoded = RowCodec::decode(&entries).unwrap();
        assert_eq!(decoded, grid(&[&["w", "", ""], &["", "", "v"]]));
    }

    #[test]
    fn test_decode_empty_is_empty_grid() {
        assert!(RowCodec::decode(&[]).unwrap().is_empty());
        assert!(RowCodec::encode(&Grid::new()).unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_duplicates_and_bad_keys() {
        let dup = vec![RowEntry::new("R1C1", "a"), RowEntry::new("R1C1", "b")];
        assert!(matches!(
            RowCodec::decode(&dup),
            Err(CodecError::DuplicateKey(_))
        ));

        let bad = vec![RowEntry::new("Column1", "a")];
        assert!(matches!(
            RowCodec::decode(&bad),
            Err(CodecError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_span() {
        let entries = vec![RowEntry::new("R1000000C1000", "far")];
        assert!(matches!(
            RowCodec::decode(&entries),
            Err(CodecError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn test_encode_rejects_oversized_ragged_grid() {
        // One wide row pads every empty row after it.
        let mut ragged = vec![vec![String::new(); 3000]];
        ragged.extend(std::iter::repeat_with(Vec::new).take(3000));

        assert_eq!(
            RowCodec::encode(&ragged),
            Err(CodecError::GridTooLarge {
                rows: 3001,
                cols: 3000
            })
        );
    }

    #[test]
    fn test_validate() {
        assert_eq!(RowCodec::validate(&[]), Err(CodecError::Empty));
        assert_eq!(
            RowCodec::validate(&[RowEntry::new("", "x")]),
            Err(CodecError::EmptyKey(0))
        );
        assert!(matches!(
            RowCodec::validate(&[RowEntry::new("a", "1"), RowEntry::new("a", "2")]),
            Err(CodecError::DuplicateKey(_))
        ));
        // Non-positional keys are fine for storage.
        assert!(RowCodec::validate(&[RowEntry::new("Column1", "1")]).is_ok());
    }
}
