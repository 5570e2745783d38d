//! Text matrix files: `[rows,cols]((a,b),(c,d))`.
//!
//! Whitespace between tokens is ignored, so files written with `", "`
//! separators read back the same.

use std::path::Path;

use matmul_types::{Element, Matrix};
use rand::Rng;

use crate::Error;

/// Smallest value produced by [`random_matrix`].
pub const MIN_VALUE: Element = -1_000_000;
/// Largest value produced by [`random_matrix`].
pub const MAX_VALUE: Element = 1_000_000;

pub async fn read_matrix(path: impl AsRef<Path>) -> Result<Matrix, Error> {
    let text = tokio::fs::read_to_string(path).await?;
    parse_matrix(&text)
}

pub async fn write_matrix(path: impl AsRef<Path>, matrix: &Matrix) -> Result<(), Error> {
    tokio::fs::write(path, format_matrix(matrix)).await?;
    Ok(())
}

pub fn format_matrix(matrix: &Matrix) -> String {
    let rows: Vec<String> = matrix
        .iter_rows()
        .map(|row| {
            let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            format!("({})", values.join(","))
        })
        .collect();
    format!("[{},{}]({})", matrix.rows(), matrix.cols(), rows.join(","))
}

pub fn parse_matrix(text: &str) -> Result<Matrix, Error> {
    let mut cursor = Cursor { text, pos: 0 };

    cursor.expect(b'[')?;
    let rows = cursor.dimension()?;
    cursor.expect(b',')?;
    let cols = cursor.dimension()?;
    cursor.expect(b']')?;

    let len = rows
        .checked_mul(cols)
        .ok_or_else(|| cursor.error(format!("{}x{} matrix is too large", rows, cols)))?;
    // every element takes at least one byte of input
    if len > text.len() {
        return Err(cursor.error(format!(
            "{}x{} matrix does not fit in {} bytes",
            rows,
            cols,
            text.len()
        )));
    }
    let mut data = Vec::with_capacity(len);

    cursor.expect(b'(')?;
    for i in 0..rows {
        if i > 0 {
            cursor.expect(b',')?;
        }
        cursor.expect(b'(')?;
        for j in 0..cols {
            if j > 0 {
                cursor.expect(b',')?;
            }
            data.push(cursor.element()?);
        }
        cursor.expect(b')')?;
    }
    cursor.expect(b')')?;
    cursor.end()?;

    Ok(Matrix::new(rows, cols, data)?)
}

/// Fills a matrix with values drawn uniformly from
/// [`MIN_VALUE`]`..=`[`MAX_VALUE`].
pub fn random_matrix<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
    Matrix::from_fn(rows, cols, |_, _| rng.gen_range(MIN_VALUE..=MAX_VALUE))
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn skip_whitespace(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.text.as_bytes().get(self.pos).copied()
    }

    fn expect(&mut self, want: u8) -> Result<(), Error> {
        match self.peek() {
            Some(got) if got == want => {
                self.pos += 1;
                Ok(())
            }
            Some(got) => Err(self.error(format!(
                "expected '{}', found '{}'",
                want as char, got as char
            ))),
            None => Err(self.error(format!("expected '{}', found end of input", want as char))),
        }
    }

    fn token(&mut self) -> &str {
        self.skip_whitespace();
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let mut end = start;
        if matches!(bytes.get(end), Some(b'-' | b'+')) {
            end += 1;
        }
        while matches!(bytes.get(end), Some(b) if b.is_ascii_digit()) {
            end += 1;
        }
        self.pos = end;
        &self.text[start..end]
    }

    fn dimension(&mut self) -> Result<usize, Error> {
        let start = self.pos;
        let token = self.token();
        token.parse().map_err(|_| Error::MatrixFile {
            offset: start,
            message: format!("invalid dimension {:?}", token),
        })
    }

    fn element(&mut self) -> Result<Element, Error> {
        let start = self.pos;
        let token = self.token();
        token.parse().map_err(|_| Error::MatrixFile {
            offset: start,
            message: format!("invalid element {:?}", token),
        })
    }

    fn end(&mut self) -> Result<(), Error> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.error("trailing characters after matrix".into())),
        }
    }

    fn error(&self, message: String) -> Error {
        Error::MatrixFile {
            offset: self.pos,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn rejects_header_larger_than_input() {
        let err = parse_matrix("[1000000000000,1000000]()").unwrap_err();
        assert!(matches!(err, Error::MatrixFile { .. }));

        let err = parse_matrix("[3,1]((1),(2))").unwrap_err();
        assert!(matches!(err, Error::MatrixFile { .. }));
    }

    #[test]
    fn parses_generator_output() {
        let m = parse_matrix("[2, 3]((1, -2, 3), (4, 5, -600000))").unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert_eq!(m.as_slice(), &[1, -2, 3, 4, 5, -600000]);
    }

    #[test]
    fn format_reads_back() {
        let m = Matrix::from_rows(vec![vec![7, -8], vec![0, 1], vec![2, 3]]).unwrap();
        let text = format_matrix(&m);
        assert_eq!(text, "[3,2]((7,-8),(0,1),(2,3))");
        assert_eq!(parse_matrix(&text).unwrap(), m);
    }

    #[test]
    fn empty_matrix() {
        let m = parse_matrix("[0,0]()").unwrap();
        assert_eq!(m.rows(), 0);
        assert_eq!(format_matrix(&m), "[0,0]()");
    }

    #[test]
    fn reports_errors_with_offsets() {
        let err = parse_matrix("[2,2]((1,2),(3))").unwrap_err();
        assert!(matches!(err, Error::MatrixFile { offset: 14, .. }), "{err:?}");

        assert!(matches!(
            parse_matrix("[1,1]((99999999999))"),
            Err(Error::MatrixFile { .. })
        ));
        assert!(matches!(
            parse_matrix("[1,1]((1)) extra"),
            Err(Error::MatrixFile { .. })
        ));
    }

    #[test]
    fn random_values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = random_matrix(20, 30, &mut rng);
        assert_eq!(m.as_slice().len(), 600);
        assert!(
            m.as_slice()
                .iter()
                .all(|v| (MIN_VALUE..=MAX_VALUE).contains(v))
        );
    }

    #[tokio::test]
    async fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("matrix-mul-{}.txt", std::process::id()));
        let m = Matrix::from_rows(vec![vec![1, 2, 3]]).unwrap();
        write_matrix(&path, &m).await.unwrap();
        assert_eq!(read_matrix(&path).await.unwrap(), m);
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
