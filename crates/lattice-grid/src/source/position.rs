//! Cell addresses.
//!
//! A [`Position`] is a (row, column) pair into the grid's logical data space.
//! Negative indices address header and fixed cells. The canonical string id
//! of a position is `"row:column"`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A (row, column) address into the grid's data space.
///
/// Positions order row-major: first by row, then by column. A position is
/// also used as a size tuple, e.g. by [`DataSource::size`](super::DataSource::size).
///
/// # Example
///
/// ```
/// use lattice_grid::source::Position;
///
/// let pos = Position::new(12, 3);
/// assert_eq!(pos.to_id(), "12:3");
/// assert_eq!(Position::from_id("12:3").unwrap(), pos);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    row: i64,
    column: i64,
}

impl Position {
    /// Creates a position.
    #[inline]
    pub const fn new(row: i64, column: i64) -> Self {
        Self { row, column }
    }

    /// The origin, `0:0`.
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Returns the row index.
    #[inline]
    pub const fn row(&self) -> i64 {
        self.row
    }

    /// Returns the column index.
    #[inline]
    pub const fn column(&self) -> i64 {
        self.column
    }

    /// Returns a position at the same column but a different row.
    #[inline]
    pub const fn with_row(self, row: i64) -> Self {
        Self::new(row, self.column)
    }

    /// Returns a position at the same row but a different column.
    #[inline]
    pub const fn with_column(self, column: i64) -> Self {
        Self::new(self.row, column)
    }

    /// Returns the canonical string id, `"row:column"`.
    pub fn to_id(&self) -> String {
        self.to_string()
    }

    /// Parses a canonical string id produced by [`to_id`](Self::to_id).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPositionId`] if `id` is not two integers
    /// separated by a single `:`, or is not in canonical form (no
    /// whitespace, sign `+`, or leading zeros).
    pub fn from_id(id: &str) -> Result<Self> {
        let invalid = || Error::InvalidPositionId { id: id.to_string() };
        let (row, column) = id.split_once(':').ok_or_else(invalid)?;
        let row = row.parse::<i64>().map_err(|_| invalid())?;
        let column = column.parse::<i64>().map_err(|_| invalid())?;
        let pos = Self::new(row, column);
        if pos.to_id() != id {
            return Err(invalid());
        }
        Ok(pos)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_id(s)
    }
}

impl From<(i64, i64)> for Position {
    fn from((row, column): (i64, i64)) -> Self {
        Self::new(row, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip() {
        let pairs = [(0, 0), (5, 3), (999_999, 12), (4, -1), (-2, -7), (i64::MIN, i64::MAX)];
        for (row, column) in pairs {
            let pos = Position::new(row, column);
            assert_eq!(Position::from_id(&pos.to_id()).unwrap(), pos);
        }
    }

    #[test]
    fn test_id_format() {
        assert_eq!(Position::new(7, 2).to_id(), "7:2");
        assert_eq!(Position::new(0, -1).to_id(), "0:-1");
    }

    #[test]
    fn test_invalid_ids() {
        let ids = [
            "", "3", "3:", ":4", "a:b", "1:2:3", "1;2", " 3 : 4", "3:4 ", "+3:4", "3:+4", "03:4",
            "-0:1",
        ];
        for id in ids {
            assert!(
                matches!(Position::from_id(id), Err(Error::InvalidPositionId { .. })),
                "expected {id:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_equality_and_ordering() {
        assert_eq!(Position::new(1, 2), Position::from((1, 2)));
        assert_ne!(Position::new(1, 2), Position::new(2, 1));
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(1, 0) < Position::new(1, 1));
    }

    #[test]
    fn test_from_str() {
        let pos: Position = "10:20".parse().unwrap();
        assert_eq!(pos.row(), 10);
        assert_eq!(pos.column(), 20);
    }
}
