use crate::dtype::Float;
use crate::error::{TensorError, TensorResult};
use crate::tensor::Tensor;

/// Compressed sparse row matrix holding encoded feature matrices.
///
/// One-hot blocks and term counts are almost entirely zeros, so only the
/// nonzero entries are stored:
///
/// - `values`: nonzero values, row by row
/// - `col_indices`: column of each value, ascending within a row
/// - `row_ptrs`: row `i` owns `values[row_ptrs[i]..row_ptrs[i + 1]]`
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix<T: Float> {
    values: Vec<T>,
    col_indices: Vec<usize>,
    row_ptrs: Vec<usize>,
    n_cols: usize,
}

/// Borrowed view of one row's nonzero entries.
#[derive(Debug, Clone, Copy)]
pub struct SparseRow<'a, T> {
    indices: &'a [usize],
    values: &'a [T],
}

impl<T: Float> SparseMatrix<T> {
    /// An `n_rows × n_cols` matrix with no stored entries.
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        SparseMatrix {
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptrs: vec![0; n_rows + 1],
            n_cols,
        }
    }

    /// Build from per-row `(column, value)` entries in any order.
    /// Repeated columns within a row are summed and zeros are dropped.
    pub fn from_rows(rows: Vec<Vec<(usize, T)>>, n_cols: usize) -> TensorResult<Self> {
        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_ptrs = Vec::with_capacity(rows.len() + 1);
        row_ptrs.push(0);

        for mut entries in rows {
            if let Some(&(col, _)) = entries.iter().find(|(c, _)| *c >= n_cols) {
                return Err(TensorError::IndexOutOfBounds {
                    index: col,
                    axis: 1,
                    size: n_cols,
                });
            }
            entries.sort_by_key(|&(c, _)| c);
            let start = values.len();
            for (col, v) in entries {
                if col_indices.len() > start && col_indices.last() == Some(&col) {
                    if let Some(last) = values.last_mut() {
                        *last += v;
                    }
                } else {
                    col_indices.push(col);
                    values.push(v);
                }
            }
            // drop explicit zeros, including sums that cancelled
            let mut k = start;
            for j in start..values.len() {
                if values[j] != T::ZERO {
                    values[k] = values[j];
                    col_indices[k] = col_indices[j];
                    k += 1;
                }
            }
            values.truncate(k);
            col_indices.truncate(k);
            row_ptrs.push(values.len());
        }

        Ok(SparseMatrix {
            values,
            col_indices,
            row_ptrs,
            n_cols,
        })
    }

    /// Keep the nonzero entries of a dense matrix.
    pub fn from_dense(dense: &Tensor<T>) -> TensorResult<Self> {
        let n_rows = dense.nrows()?;
        let n_cols = dense.ncols()?;
        let rows = (0..n_rows)
            .map(|i| {
                Ok(dense
                    .row(i)?
                    .iter()
                    .enumerate()
                    .filter(|(_, &v)| v != T::ZERO)
                    .map(|(j, &v)| (j, v))
                    .collect())
            })
            .collect::<TensorResult<Vec<Vec<(usize, T)>>>>()?;
        SparseMatrix::from_rows(rows, n_cols)
    }

    pub fn nrows(&self) -> usize {
        self.row_ptrs.len() - 1
    }

    pub fn ncols(&self) -> usize {
        self.n_cols
    }

    pub fn shape_vec(&self) -> Vec<usize> {
        vec![self.nrows(), self.n_cols]
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Fraction of cells that are stored; `0.0` for an empty matrix.
    pub fn density(&self) -> f64 {
        let cells = self.nrows() * self.n_cols;
        if cells == 0 {
            0.0
        } else {
            self.nnz() as f64 / cells as f64
        }
    }

    pub fn row(&self, i: usize) -> TensorResult<SparseRow<'_, T>> {
        let rows = self.nrows();
        if i >= rows {
            return Err(TensorError::IndexOutOfBounds {
                index: i,
                axis: 0,
                size: rows,
            });
        }
        let range = self.row_ptrs[i]..self.row_ptrs[i + 1];
        Ok(SparseRow {
            indices: &self.col_indices[range.clone()],
            values: &self.values[range],
        })
    }

    /// All rows in order.
    pub fn rows(&self) -> impl Iterator<Item = SparseRow<'_, T>> {
        self.row_ptrs.windows(2).map(move |w| SparseRow {
            indices: &self.col_indices[w[0]..w[1]],
            values: &self.values[w[0]..w[1]],
        })
    }

    /// Gather rows by index, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> TensorResult<SparseMatrix<T>> {
        let mut out = SparseMatrix::zeros(0, self.n_cols);
        for &i in indices {
            let row = self.row(i)?;
            out.col_indices.extend_from_slice(row.indices);
            out.values.extend_from_slice(row.values);
            out.row_ptrs.push(out.values.len());
        }
        Ok(out)
    }

    /// Place matrices side by side, shifting each block's columns past the
    /// blocks before it. Row counts must agree.
    pub fn hstack(blocks: &[&SparseMatrix<T>]) -> TensorResult<SparseMatrix<T>> {
        let first = blocks.first().ok_or(TensorError::EmptyTensor)?;
        let rows = first.nrows();
        if let Some(bad) = blocks.iter().find(|b| b.nrows() != rows) {
            return Err(TensorError::ShapeMismatch {
                expected: vec![rows, bad.n_cols],
                got: bad.shape_vec(),
            });
        }

        let n_cols = blocks.iter().map(|b| b.n_cols).sum();
        let nnz = blocks.iter().map(|b| b.nnz()).sum();
        let mut out = SparseMatrix {
            values: Vec::with_capacity(nnz),
            col_indices: Vec::with_capacity(nnz),
            row_ptrs: Vec::with_capacity(rows + 1),
            n_cols,
        };
        out.row_ptrs.push(0);
        for i in 0..rows {
            let mut offset = 0;
            for block in blocks {
                let row = block.row(i)?;
                out.col_indices.extend(row.indices.iter().map(|&j| j + offset));
                out.values.extend_from_slice(row.values);
                offset += block.n_cols;
            }
            out.row_ptrs.push(out.values.len());
        }
        Ok(out)
    }

    /// Population variance over every cell, implicit zeros included.
    pub fn var_all(&self) -> TensorResult<T> {
        let cells = self.nrows() * self.n_cols;
        if cells == 0 {
            return Err(TensorError::EmptyTensor);
        }
        let n = T::from_usize(cells);
        let sum: T = self.values.iter().copied().sum();
        let sum_sq: T = self.values.iter().map(|&v| v * v).sum();
        let mean = sum / n;
        Ok((sum_sq / n - mean * mean).max(T::ZERO))
    }
}

impl<'a, T: Float> SparseRow<'a, T> {
    /// `(column, value)` pairs in ascending column order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + 'a {
        let (indices, values) = (self.indices, self.values);
        indices.iter().copied().zip(values.iter().copied())
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Value at column `j`, zero when not stored.
    pub fn get(&self, j: usize) -> T {
        match self.indices.binary_search(&j) {
            Ok(k) => self.values[k],
            Err(_) => T::ZERO,
        }
    }

    /// Dot product with a dense vector indexed by column.
    pub fn dot_dense(&self, dense: &[T]) -> T {
        self.iter().fold(T::ZERO, |acc, (j, v)| acc + v * dense[j])
    }

    /// Dot product with another sparse row, merging the sorted indices.
    pub fn dot(&self, other: &SparseRow<'_, T>) -> T {
        let (mut a, mut b) = (0, 0);
        let mut acc = T::ZERO;
        while a < self.indices.len() && b < other.indices.len() {
            match self.indices[a].cmp(&other.indices[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    acc += self.values[a] * other.values[b];
                    a += 1;
                    b += 1;
                }
            }
        }
        acc
    }

    pub fn sq_norm(&self) -> T {
        self.values.iter().map(|&v| v * v).sum()
    }
}
