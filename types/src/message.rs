//! Protocol messages exchanged between the coordinator and its workers.

use std::ops::Range;

use crate::{Element, Error, Rank};

/// Logical shape of a row-block multiply, sent ahead of the block itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeMessage {
    /// Rows in the block.
    pub rows: usize,
    /// Inner dimension shared by the block and the right-hand matrix.
    pub shared_side: usize,
    /// Columns of the right-hand matrix.
    pub columns: usize,
}

impl ShapeMessage {
    pub const WIRE_LEN: usize = 3;

    pub fn new(rows: usize, shared_side: usize, columns: usize) -> Self {
        Self {
            rows,
            shared_side,
            columns,
        }
    }

    /// Number of elements in the row block this shape describes.
    pub fn block_len(&self) -> usize {
        self.rows * self.shared_side
    }

    /// Number of elements in the right-hand matrix.
    pub fn rhs_len(&self) -> usize {
        self.shared_side * self.columns
    }

    /// Number of elements in the block's result.
    pub fn result_len(&self) -> usize {
        self.rows * self.columns
    }

    pub fn to_wire(&self) -> Result<Vec<Element>, Error> {
        [self.rows, self.shared_side, self.columns]
            .into_iter()
            .map(|v| Element::try_from(v).map_err(|_| Error::OutOfRange(v)))
            .collect()
    }

    pub fn from_wire(buf: &[Element]) -> Result<Self, Error> {
        match *buf {
            [rows, shared_side, columns] if rows >= 0 && shared_side >= 0 && columns >= 0 => {
                Ok(Self::new(rows as usize, shared_side as usize, columns as usize))
            }
            _ => Err(Error::MalformedShape(buf.to_vec())),
        }
    }
}

/// A contiguous range of left-hand rows owned by one rank.
///
/// Rank 0 holds the residual; every other rank holds an equal-sized block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkAssignment {
    pub rank: Rank,
    pub row_offset: usize,
    pub row_count: usize,
}

impl WorkAssignment {
    pub fn row_range(&self) -> Range<usize> {
        self.row_offset..self.row_offset + self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_wire_order() {
        let shape = ShapeMessage::new(4, 2, 3);
        assert_eq!(shape.to_wire().unwrap(), vec![4, 2, 3]);
        assert_eq!(ShapeMessage::from_wire(&[4, 2, 3]).unwrap(), shape);
        assert_eq!(shape.block_len(), 8);
        assert_eq!(shape.rhs_len(), 6);
        assert_eq!(shape.result_len(), 12);
    }

    #[test]
    fn shape_rejects_bad_wire() {
        assert!(ShapeMessage::from_wire(&[1, 2]).is_err());
        assert!(ShapeMessage::from_wire(&[1, 2, 3, 4]).is_err());
        assert!(ShapeMessage::from_wire(&[1, -2, 3]).is_err());
    }

    #[test]
    fn shape_rejects_oversized_dimension() {
        let shape = ShapeMessage::new(usize::MAX, 1, 1);
        assert_eq!(shape.to_wire(), Err(Error::OutOfRange(usize::MAX)));
    }

    #[test]
    fn assignment_range() {
        let a = WorkAssignment {
            rank: 2,
            row_offset: 10,
            row_count: 5,
        };
        assert_eq!(a.row_range(), 10..15);
        assert!(!a.is_empty());
    }
}
