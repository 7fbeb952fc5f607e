//! Rectangular windows over the data space.
//!
//! A [`Range`] is the unit of data materialization: the viewport controller
//! asks a data source to make a range available, and the data source reports
//! availability in terms of ranges.

use std::fmt;
use std::iter::FusedIterator;

use super::position::Position;

/// A rectangular window of positions.
///
/// Defined by an origin and non-negative extents. Negative extents passed to
/// the constructors are clamped to zero.
///
/// # Example
///
/// ```
/// use lattice_grid::source::{Position, Range};
///
/// let window = Range::new(Position::new(5, 0), 10, 5);
/// let visible = Range::new(Position::new(6, 1), 2, 2);
/// assert!(window.eclipses(&visible));
/// assert_eq!(window.iter().count(), 50);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Range {
    start: Position,
    rows: i64,
    columns: i64,
}

impl Range {
    /// Creates a range from an origin and row/column counts.
    pub fn new(start: Position, rows: i64, columns: i64) -> Self {
        Self {
            start,
            rows: rows.max(0),
            columns: columns.max(0),
        }
    }

    /// Creates a range spanning `min` to `max`, both inclusive.
    ///
    /// If `max` lies before `min` on either axis the range is empty on that axis.
    pub fn from_corners(min: Position, max: Position) -> Self {
        Self::new(
            min,
            max.row().saturating_sub(min.row()).saturating_add(1),
            max.column().saturating_sub(min.column()).saturating_add(1),
        )
    }

    /// Returns the origin (top-left) position.
    #[inline]
    pub fn start(&self) -> Position {
        self.start
    }

    /// Returns the exclusive end position (one past the bottom-right corner).
    ///
    /// Saturates at `i64::MAX`.
    #[inline]
    pub fn end(&self) -> Position {
        Position::new(
            self.start.row().saturating_add(self.rows),
            self.start.column().saturating_add(self.columns),
        )
    }

    /// Returns the number of rows.
    #[inline]
    pub fn rows(&self) -> i64 {
        self.rows
    }

    /// Returns the number of columns.
    #[inline]
    pub fn columns(&self) -> i64 {
        self.columns
    }

    /// Returns `true` if the range contains no positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns == 0
    }

    /// Returns the number of positions in the range.
    pub fn len(&self) -> usize {
        usize::try_from(self.rows.saturating_mul(self.columns)).unwrap_or(usize::MAX)
    }

    /// Returns `true` if `pos` lies inside the range.
    pub fn contains(&self, pos: Position) -> bool {
        let end = self.end();
        pos.row() >= self.start.row()
            && pos.row() < end.row()
            && pos.column() >= self.start.column()
            && pos.column() < end.column()
    }

    /// Returns `true` if this range's rectangle fully contains `other`'s.
    ///
    /// An empty range eclipses only empty ranges with the same origin, and a
    /// non-empty range never eclipses an empty one.
    pub fn eclipses(&self, other: &Range) -> bool {
        if other.is_empty() {
            return self.is_empty() && self.start == other.start;
        }
        if self.is_empty() {
            return false;
        }
        let (end, other_end) = (self.end(), other.end());
        other.start.row() >= self.start.row()
            && other.start.column() >= self.start.column()
            && other_end.row() <= end.row()
            && other_end.column() <= end.column()
    }

    /// Returns the sub-range covering column 0 of every row in this range.
    ///
    /// Always one column wide, whatever this range's column count is; used
    /// for row headers and a frozen first column.
    pub fn column_zero(&self) -> Range {
        Range::new(Position::new(self.start.row(), 0), self.rows, 1)
    }

    /// Returns the overlap of two ranges, which may be empty.
    pub fn intersection(&self, other: &Range) -> Range {
        let start = Position::new(
            self.start.row().max(other.start.row()),
            self.start.column().max(other.start.column()),
        );
        let (end, other_end) = (self.end(), other.end());
        Range::new(
            start,
            end.row().min(other_end.row()).saturating_sub(start.row()),
            end.column().min(other_end.column()).saturating_sub(start.column()),
        )
    }

    /// Trims the extents so the range ends at or before `size`.
    ///
    /// The origin is kept; extents shrink to zero if the origin lies outside.
    pub fn clamp_to(&self, size: Position) -> Range {
        let end = self.end();
        Range::new(
            self.start,
            end.row().min(size.row()).saturating_sub(self.start.row()),
            end.column().min(size.column()).saturating_sub(self.start.column()),
        )
    }

    /// Returns the positions in row-major order.
    ///
    /// The iterator is finite; call `iter()` again to restart it.
    pub fn iter(&self) -> PositionIter {
        PositionIter {
            range: *self,
            next: 0,
            len: self.len(),
        }
    }

    /// Returns the column-0 position of every row in the range, top to bottom.
    ///
    /// Used when a window only changes its row extent, and for the sticky
    /// first column.
    pub fn rows_iter(&self) -> PositionIter {
        self.column_zero().iter()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} +{}x{}]", self.start, self.rows, self.columns)
    }
}

impl IntoIterator for Range {
    type Item = Position;
    type IntoIter = PositionIter;

    fn into_iter(self) -> PositionIter {
        self.iter()
    }
}

impl IntoIterator for &Range {
    type Item = Position;
    type IntoIter = PositionIter;

    fn into_iter(self) -> PositionIter {
        self.iter()
    }
}

/// Row-major iterator over the positions of a [`Range`].
#[derive(Debug, Clone)]
pub struct PositionIter {
    range: Range,
    next: usize,
    len: usize,
}

impl Iterator for PositionIter {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        if self.next >= self.len {
            return None;
        }
        let columns = usize::try_from(self.range.columns).unwrap_or(usize::MAX);
        let (row_offset, column_offset) = (self.next / columns, self.next % columns);
        self.next += 1;
        let start = self.range.start;
        Some(Position::new(
            start.row().saturating_add(i64::try_from(row_offset).unwrap_or(i64::MAX)),
            start.column().saturating_add(i64::try_from(column_offset).unwrap_or(i64::MAX)),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PositionIter {}

impl FusedIterator for PositionIter {}
