//! Row-major dense integer matrix.

use std::fmt;
use std::ops::Range;

use crate::{Element, Error};

/// A dense, row-major matrix of [`Element`]s.
///
/// The buffer always holds exactly `rows * cols` elements; every constructor
/// checks this, so slicing by row ranges never needs to re-validate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Element>,
}

impl Matrix {
    /// Wraps an existing row-major buffer.
    pub fn new(rows: usize, cols: usize, data: Vec<Element>) -> Result<Self, Error> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(Error::BufferLength {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    /// Builds a matrix by calling `f(row, col)` for every element, row by row.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Element) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Builds a matrix from nested rows. All rows must have the same length.
    ///
    /// An empty outer vector yields a 0x0 matrix.
    pub fn from_rows(rows: Vec<Vec<Element>>) -> Result<Self, Error> {
        let cols = rows.first().map_or(0, |row| row.len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::RaggedRows {
                    row: i,
                    len: row.len(),
                    expected: cols,
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Element> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    pub fn as_slice(&self) -> &[Element] {
        &self.data
    }

    /// Iterates over rows as slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Element]> {
        // chunks_exact(0) panics; a zero-column matrix has no data anyway
        self.data.chunks_exact(self.cols.max(1))
    }

    /// Returns the contiguous elements of rows `offset..offset + count`.
    pub fn row_block(&self, offset: usize, count: usize) -> Result<&[Element], Error> {
        let range = self.block_range(offset, count)?;
        Ok(&self.data[range])
    }

    /// Mutable counterpart of [`Matrix::row_block`].
    pub fn row_block_mut(&mut self, offset: usize, count: usize) -> Result<&mut [Element], Error> {
        let range = self.block_range(offset, count)?;
        Ok(&mut self.data[range])
    }

    fn block_range(&self, offset: usize, count: usize) -> Result<Range<usize>, Error> {
        let end = offset.checked_add(count).filter(|&end| end <= self.rows);
        match end {
            Some(end) => Ok(offset * self.cols..end * self.cols),
            None => Err(Error::RowBlock {
                offset,
                end: offset.saturating_add(count),
                rows: self.rows,
            }),
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.iter_rows() {
            writeln!(f, "  {:?}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_buffer_length() {
        let err = Matrix::new(2, 3, vec![1, 2, 3, 4, 5]).unwrap_err();
        assert_eq!(
            err,
            Error::BufferLength {
                rows: 2,
                cols: 3,
                len: 5
            }
        );
    }

    #[test]
    fn from_rows_is_row_major() {
        let m = Matrix::from_rows(vec![vec![1, 2], vec![3, 4], vec![5, 6]]).unwrap();
        assert_eq!(m.rows(), 3);
        assert_eq!(m.cols(), 2);
        assert_eq!(m.as_slice(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(m.get(2, 1), Some(6));
        assert_eq!(m.get(3, 0), None);
    }

    #[test]
    fn from_fn_fills_row_major() {
        let m = Matrix::from_fn(2, 3, |i, j| (i * 10 + j) as Element);
        assert_eq!(m.as_slice(), &[0, 1, 2, 10, 11, 12]);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = Matrix::from_rows(vec![vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, Error::RaggedRows { row: 1, .. }));
    }

    #[test]
    fn row_block_slices_whole_rows() {
        let mut m = Matrix::from_rows(vec![vec![1, 2], vec![3, 4], vec![5, 6]]).unwrap();
        assert_eq!(m.row_block(1, 2).unwrap(), &[3, 4, 5, 6]);
        assert!(m.row_block(2, 0).unwrap().is_empty());
        assert!(m.row_block(2, 2).is_err());

        m.row_block_mut(0, 1).unwrap().copy_from_slice(&[9, 9]);
        assert_eq!(m.iter_rows().next().unwrap(), &[9, 9]);
    }
}
