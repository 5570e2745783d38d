//! Dense row-block multiply used by every participant.

use matmul_types::{Element, Matrix, ShapeMessage};

use crate::Error;

/// Computes `lhs * rhs` into `out`, where `lhs` is `shape.rows x
/// shape.shared_side`, `rhs` is `shape.shared_side x shape.columns` and
/// `out` is `shape.rows x shape.columns`, all row-major.
///
/// `out` is zeroed first. Products and sums wrap on overflow.
pub fn multiply_into(
    out: &mut [Element],
    lhs: &[Element],
    rhs: &[Element],
    shape: ShapeMessage,
) -> Result<(), Error> {
    check_len(lhs, shape.rows, shape.shared_side)?;
    check_len(rhs, shape.shared_side, shape.columns)?;
    check_len(out, shape.rows, shape.columns)?;

    out.fill(0);
    if shape.shared_side == 0 || shape.columns == 0 {
        return Ok(());
    }

    let out_rows = out.chunks_exact_mut(shape.columns);
    let lhs_rows = lhs.chunks_exact(shape.shared_side);
    for (out_row, lhs_row) in out_rows.zip(lhs_rows) {
        for (&a, rhs_row) in lhs_row.iter().zip(rhs.chunks_exact(shape.columns)) {
            for (c, &b) in out_row.iter_mut().zip(rhs_row) {
                *c = c.wrapping_add(a.wrapping_mul(b));
            }
        }
    }
    Ok(())
}

/// Allocating variant of [`multiply_into`].
pub fn multiply(lhs: &[Element], rhs: &[Element], shape: ShapeMessage) -> Result<Vec<Element>, Error> {
    let mut out = vec![0; shape.result_len()];
    multiply_into(&mut out, lhs, rhs, shape)?;
    Ok(out)
}

/// Multiplies two whole matrices as a single block.
pub fn multiply_matrices(lhs: &Matrix, rhs: &Matrix) -> Result<Matrix, Error> {
    if lhs.cols() != rhs.rows() {
        return Err(Error::ShapeMismatch(
            lhs.rows(),
            lhs.cols(),
            rhs.rows(),
            rhs.cols(),
        ));
    }
    let shape = ShapeMessage::new(lhs.rows(), lhs.cols(), rhs.cols());
    let data = multiply(lhs.as_slice(), rhs.as_slice(), shape)?;
    Ok(Matrix::new(shape.rows, shape.columns, data)?)
}

fn check_len(buf: &[Element], rows: usize, cols: usize) -> Result<(), Error> {
    if rows.checked_mul(cols) == Some(buf.len()) {
        Ok(())
    } else {
        Err(matmul_types::Error::BufferLength {
            rows,
            cols,
            len: buf.len(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: Vec<Vec<Element>>) -> Matrix {
        Matrix::from_rows(rows).unwrap()
    }

    #[test]
    fn small_product() {
        let a = matrix(vec![vec![1, 2], vec![3, 4]]);
        let b = matrix(vec![vec![5, 6], vec![7, 8]]);
        let c = multiply_matrices(&a, &b).unwrap();
        assert_eq!(c, matrix(vec![vec![19, 22], vec![43, 50]]));
    }

    #[test]
    fn non_square_product() {
        // 2x3 * 3x4
        let a = matrix(vec![vec![1, 0, -2], vec![0, 3, 1]]);
        let b = matrix(vec![
            vec![1, 2, 3, 4],
            vec![0, 1, 0, 1],
            vec![2, 0, 1, -1],
        ]);
        let c = multiply_matrices(&a, &b).unwrap();
        assert_eq!(
            c,
            matrix(vec![vec![-3, 2, 1, 6], vec![2, 3, 1, 2]])
        );
    }

    #[test]
    fn output_is_overwritten() {
        let shape = ShapeMessage::new(1, 1, 2);
        let mut out = vec![100, 100];
        multiply_into(&mut out, &[2], &[3, 4], shape).unwrap();
        assert_eq!(out, vec![6, 8]);
    }

    #[test]
    fn overflow_wraps() {
        let shape = ShapeMessage::new(1, 2, 1);
        let out = multiply(&[i32::MAX, 1], &[2, 2], shape).unwrap();
        assert_eq!(out, vec![i32::MAX.wrapping_mul(2).wrapping_add(2)]);
    }

    #[test]
    fn empty_inner_dimension_gives_zeros() {
        let shape = ShapeMessage::new(2, 0, 3);
        assert_eq!(multiply(&[], &[], shape).unwrap(), vec![0; 6]);
    }

    #[test]
    fn rejects_mismatched_buffers() {
        let shape = ShapeMessage::new(2, 2, 2);
        assert!(matches!(
            multiply(&[1, 2, 3], &[1, 2, 3, 4], shape),
            Err(Error::Protocol(_))
        ));
        let a = matrix(vec![vec![1, 2]]);
        assert!(matches!(
            multiply_matrices(&a, &a),
            Err(Error::ShapeMismatch(1, 2, 1, 2))
        ));
    }
}
