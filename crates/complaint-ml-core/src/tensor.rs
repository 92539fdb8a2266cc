use crate::dtype::Float;
use crate::error::{TensorError, TensorResult};

/// Dense row-major tensor: label vectors (1-D) and small matrices (2-D)
/// that are converted with [`SparseMatrix::from_dense`](crate::SparseMatrix::from_dense).
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T: Float> {
    data: Vec<T>,
    shape: Vec<usize>,
}

impl<T: Float> Tensor<T> {
    /// Wrap flat row-major data; `data.len()` must equal the product of `shape`.
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> TensorResult<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(TensorError::ShapeMismatch {
                expected: shape,
                got: vec![data.len()],
            });
        }
        Ok(Tensor { data, shape })
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let n = shape.iter().product();
        Tensor {
            data: vec![T::ZERO; n],
            shape,
        }
    }

    /// 1-D tensor, typically a label vector.
    pub fn from_slice(data: &[T]) -> Self {
        Tensor {
            data: data.to_vec(),
            shape: vec![data.len()],
        }
    }

    /// 2-D tensor from equally long rows.
    pub fn from_vec2d(rows: &[Vec<T>]) -> TensorResult<Self> {
        let Some(first) = rows.first() else {
            return Ok(Tensor::zeros(vec![0, 0]));
        };
        let cols = first.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(TensorError::ShapeMismatch {
                expected: vec![cols],
                got: vec![bad.len()],
            });
        }
        let flat: Vec<T> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Tensor::new(flat, vec![rows.len(), cols])
    }

    pub fn shape_vec(&self) -> Vec<usize> {
        self.shape.clone()
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    fn dim(&self, axis: usize) -> TensorResult<usize> {
        self.shape.get(axis).copied().ok_or(TensorError::InvalidAxis {
            axis,
            ndim: self.ndim(),
        })
    }

    /// Number of rows (samples).
    pub fn nrows(&self) -> TensorResult<usize> {
        self.dim(0)
    }

    /// Number of columns (features) of a matrix.
    pub fn ncols(&self) -> TensorResult<usize> {
        if self.ndim() != 2 {
            return Err(TensorError::DimensionMismatch(format!(
                "ncols needs a matrix, got {} dimensions",
                self.ndim()
            )));
        }
        self.dim(1)
    }

    /// Borrow row `i` of a matrix.
    pub fn row(&self, i: usize) -> TensorResult<&[T]> {
        let cols = self.ncols()?;
        let rows = self.dim(0)?;
        if i >= rows {
            return Err(TensorError::IndexOutOfBounds {
                index: i,
                axis: 0,
                size: rows,
            });
        }
        Ok(&self.data[i * cols..(i + 1) * cols])
    }

    /// Gather elements of a vector by index, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> TensorResult<Tensor<T>> {
        if self.ndim() != 1 {
            return Err(TensorError::InvalidOperation(format!(
                "select_rows needs a vector, got {} dimensions",
                self.ndim()
            )));
        }
        let n = self.numel();
        let data = indices
            .iter()
            .map(|&i| {
                self.data.get(i).copied().ok_or(TensorError::IndexOutOfBounds {
                    index: i,
                    axis: 0,
                    size: n,
                })
            })
            .collect::<TensorResult<Vec<T>>>()?;
        Tensor::new(data, vec![indices.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tensor<f64> {
        Tensor::from_vec2d(&[
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_construction() {
        let t = sample();
        assert_eq!(t.shape_vec(), vec![3, 3]);
        assert_eq!(t.ncols().unwrap(), 3);
        assert!(Tensor::<f64>::from_vec2d(&[vec![1.0], vec![1.0, 2.0]]).is_err());
        assert!(matches!(
            Tensor::<f64>::new(vec![1.0, 2.0, 3.0], vec![2, 2]),
            Err(TensorError::ShapeMismatch { .. })
        ));
        assert_eq!(Tensor::<f64>::zeros(vec![0, 7]).numel(), 0);
    }

    #[test]
    fn test_rows() {
        let t = sample();
        assert_eq!(t.row(2).unwrap(), &[7.0, 8.0, 9.0]);
        assert!(t.row(3).is_err());

        let y: Tensor<f64> = Tensor::from_slice(&[0.0, 1.0]);
        assert!(y.ncols().is_err());
        assert_eq!(y.nrows().unwrap(), 2);
    }

    #[test]
    fn test_select_rows() {
        assert!(sample().select_rows(&[0]).is_err());

        let y: Tensor<f64> = Tensor::from_slice(&[0.0, 1.0, 1.0]);
        assert_eq!(y.select_rows(&[1, 0]).unwrap().data(), &[1.0, 0.0]);
        assert!(y.select_rows(&[5]).is_err());
    }
}
