use complaint_ml_core::{class_counts, ClassWeight, Float, SparseMatrix, SparseRow, Tensor, TensorError};
use complaint_ml_core::error::TensorResult;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::rc::Rc;

/// Kernel entries kept in the row cache during `fit`.
const KERNEL_CACHE_ENTRIES: usize = 1 << 24;

/// RBF kernel width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gamma<T: Float> {
    /// `1 / (n_features * var(X))`, resolved at fit time.
    Scale,
    Value(T),
}

/// RBF Support Vector Classifier using simplified SMO with error and kernel-row caches.
///
/// Squared distances are computed as `|a|² + |b|² - 2 a·b` from sparse dot
/// products and cached row norms.
///
/// With `ClassWeight::Balanced` the box constraint of each sample is
/// `C * class_weight`, so errors on the minority class cost more.
#[derive(Debug, Clone)]
pub struct SVC<T: Float> {
    pub c: T,
    pub gamma: Gamma<T>,
    /// Consecutive passes without an update before stopping.
    pub max_passes: usize,
    /// Hard cap on passes over the training set.
    pub max_iter: usize,
    pub tol: T,
    pub class_weight: ClassWeight,
    pub seed: u64,
    // Trained parameters
    support_vectors: Option<SparseMatrix<T>>,
    support_norms: Vec<T>,
    dual_coef: Vec<T>,
    bias: T,
    gamma_value: T,
}

impl<T: Float> SVC<T> {
    pub fn new(c: T, gamma: Gamma<T>, max_passes: usize) -> Self {
        SVC {
            c,
            gamma,
            max_passes,
            max_iter: 1000,
            tol: T::from_f64(1e-3),
            class_weight: ClassWeight::None,
            seed: 0,
            support_vectors: None,
            support_norms: Vec::new(),
            dual_coef: Vec::new(),
            bias: T::ZERO,
            gamma_value: T::ONE,
        }
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Number of support vectors kept after `fit`.
    pub fn n_support(&self) -> usize {
        self.dual_coef.len()
    }

    /// `exp(-gamma * |a - b|²)` given both rows' squared norms.
    fn kernel_eval(&self, a: &SparseRow<'_, T>, a_norm: T, b: &SparseRow<'_, T>, b_norm: T) -> T {
        let sq_dist = (a_norm + b_norm - T::TWO * a.dot(b)).max(T::ZERO);
        (-self.gamma_value * sq_dist).exp()
    }

    fn resolve_gamma(&self, x: &SparseMatrix<T>) -> TensorResult<T> {
        match self.gamma {
            Gamma::Value(g) => Ok(g),
            Gamma::Scale => {
                let p = x.ncols();
                let var = x.var_all()?;
                if var > T::ZERO && p > 0 {
                    Ok(T::ONE / (T::from_usize(p) * var))
                } else {
                    Ok(T::ONE)
                }
            }
        }
    }

    /// Fit using simplified SMO: every KKT violator `i` is paired with a
    /// randomly drawn partner `j`.
    pub fn fit(&mut self, x: &SparseMatrix<T>, y: &Tensor<T>) -> TensorResult<()> {
        let n = x.nrows();
        if y.numel() != n {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n],
                got: y.shape_vec(),
            });
        }
        if class_counts(y).iter().filter(|&&c| c > 0).count() < 2 {
            return Err(TensorError::InvalidOperation(
                "SVC needs samples of both classes".into(),
            ));
        }
        self.gamma_value = self.resolve_gamma(x)?;

        // Convert labels to +1/-1
        let labels: Vec<T> = y
            .data()
            .iter()
            .map(|&v| if v > T::HALF { T::ONE } else { T::NEG_ONE })
            .collect();
        let bounds: Vec<T> = self
            .class_weight
            .sample_weights(y)
            .into_iter()
            .map(|w| self.c * T::from_f64(w))
            .collect();
        let rows: Vec<SparseRow<'_, T>> = x.rows().collect();
        let norms: Vec<T> = rows.iter().map(SparseRow::sq_norm).collect();
        let mut cache = KernelCache::new(n);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut alphas = vec![T::ZERO; n];
        let mut b = T::ZERO;
        // E_k = f(x_k) - y_k, with f = 0 initially
        let mut errors: Vec<T> = labels.iter().map(|&l| -l).collect();

        let mut quiet_passes = 0;
        let mut iter = 0;
        while quiet_passes < self.max_passes && iter < self.max_iter {
            iter += 1;
            let mut num_changed = 0;

            for i in 0..n {
                let yi = labels[i];
                let ei = errors[i];
                let ci = bounds[i];
                if !((yi * ei < -self.tol && alphas[i] < ci) || (yi * ei > self.tol && alphas[i] > T::ZERO)) {
                    continue;
                }

                let mut j = rng.gen_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                let yj = labels[j];
                let ej = errors[j];
                let cj = bounds[j];

                let ai_old = alphas[i];
                let aj_old = alphas[j];

                let (lo, hi) = if yi != yj {
                    (T::ZERO.max(aj_old - ai_old), cj.min(ci + aj_old - ai_old))
                } else {
                    (T::ZERO.max(ai_old + aj_old - ci), cj.min(ai_old + aj_old))
                };
                if hi - lo < T::EPSILON {
                    continue;
                }

                let ki = cache.row(i, |k| self.kernel_eval(&rows[i], norms[i], &rows[k], norms[k]));
                let kj = cache.row(j, |k| self.kernel_eval(&rows[j], norms[j], &rows[k], norms[k]));
                let (kii, kjj, kij) = (ki[i], kj[j], ki[j]);
                let eta = T::TWO * kij - kii - kjj;
                if eta >= T::ZERO {
                    continue;
                }

                let aj = (aj_old - yj * (ei - ej) / eta).max(lo).min(hi);
                if (aj - aj_old).abs() < T::from_f64(1e-5) {
                    continue;
                }
                let ai = ai_old + yi * yj * (aj_old - aj);
                alphas[i] = ai;
                alphas[j] = aj;

                let di = yi * (ai - ai_old);
                let dj = yj * (aj - aj_old);
                let b1 = b - ei - di * kii - dj * kij;
                let b2 = b - ej - di * kij - dj * kjj;
                let b_new = if ai > T::ZERO && ai < ci {
                    b1
                } else if aj > T::ZERO && aj < cj {
                    b2
                } else {
                    (b1 + b2) / T::TWO
                };
                let db = b_new - b;
                b = b_new;

                for (k, e) in errors.iter_mut().enumerate() {
                    *e = *e + di * ki[k] + dj * kj[k] + db;
                }
                num_changed += 1;
            }

            if num_changed == 0 {
                quiet_passes += 1;
            } else {
                quiet_passes = 0;
            }
        }

        if !b.is_finite() {
            return Err(TensorError::Diverged("SVC bias is not finite".into()));
        }

        let support: Vec<usize> = (0..n).filter(|&i| alphas[i] > T::EPSILON).collect();
        self.dual_coef = support.iter().map(|&i| alphas[i] * labels[i]).collect();
        self.support_norms = support.iter().map(|&i| norms[i]).collect();
        self.support_vectors = Some(x.select_rows(&support)?);
        self.bias = b;
        Ok(())
    }

    /// Signed distance-like score; positive means class 1.
    pub fn decision_function(&self, x: &SparseMatrix<T>) -> TensorResult<Tensor<T>> {
        let sv = self.support_vectors.as_ref().ok_or(TensorError::NotFitted)?;
        if x.ncols() != sv.ncols() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![x.nrows(), sv.ncols()],
                got: x.shape_vec(),
            });
        }

        let support: Vec<SparseRow<'_, T>> = sv.rows().collect();
        let scores: Vec<T> = x
            .rows()
            .map(|row| {
                let norm = row.sq_norm();
                support
                    .iter()
                    .zip(&self.support_norms)
                    .zip(&self.dual_coef)
                    .fold(self.bias, |f, ((s, &s_norm), &coef)| {
                        f + coef * self.kernel_eval(s, s_norm, &row, norm)
                    })
            })
            .collect();
        Ok(Tensor::from_slice(&scores))
    }

    pub fn predict(&self, x: &SparseMatrix<T>) -> TensorResult<Tensor<T>> {
        let labels: Vec<T> = self
            .decision_function(x)?
            .data()
            .iter()
            .map(|&f| if f > T::ZERO { T::ONE } else { T::ZERO })
            .collect();
        Ok(Tensor::from_slice(&labels))
    }
}

/// Kernel rows computed during `fit`; the oldest row is evicted once
/// [`KERNEL_CACHE_ENTRIES`] would be exceeded.
struct KernelCache<T> {
    rows: Vec<Option<Rc<Vec<T>>>>,
    order: VecDeque<usize>,
    capacity: usize,
}

impl<T: Float> KernelCache<T> {
    fn new(n: usize) -> Self {
        KernelCache {
            rows: vec![None; n],
            order: VecDeque::new(),
            capacity: (KERNEL_CACHE_ENTRIES / n.max(1)).max(2),
        }
    }

    fn row(&mut self, i: usize, eval: impl Fn(usize) -> T) -> Rc<Vec<T>> {
        if let Some(row) = &self.rows[i] {
            return Rc::clone(row);
        }
        if self.order.len() >= self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.rows[old] = None;
            }
        }
        let row = Rc::new((0..self.rows.len()).map(eval).collect::<Vec<T>>());
        self.rows[i] = Some(Rc::clone(&row));
        self.order.push_back(i);
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse(rows: &[Vec<f64>]) -> SparseMatrix<f64> {
        SparseMatrix::from_dense(&Tensor::from_vec2d(rows).unwrap()).unwrap()
    }

    fn blobs() -> (SparseMatrix<f64>, Tensor<f64>) {
        let x = sparse(&[
            vec![0.0, 0.0], vec![0.5, 0.5], vec![1.0, 1.0],
            vec![5.0, 5.0], vec![5.5, 5.5], vec![6.0, 6.0],
        ]);
        let y: Tensor<f64> = Tensor::from_slice(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        (x, y)
    }

    #[test]
    fn test_svc_rbf_blobs() {
        let (x, y) = blobs();
        let mut svc = SVC::new(1.0, Gamma::Scale, 10);
        svc.fit(&x, &y).unwrap();
        let pred = svc.predict(&x).unwrap();

        let correct: usize = pred.data().iter().zip(y.data().iter())
            .filter(|(&p, &t)| (p - t).abs() < 0.5)
            .count();
        assert!(correct >= 4, "SVM classified {} out of 6", correct);
    }

    #[test]
    fn test_svc_rbf_xor() {
        // XOR is not linearly separable but is easy for an RBF kernel.
        let x = sparse(&[
            vec![0.0, 0.0], vec![1.0, 1.0], vec![0.0, 1.0], vec![1.0, 0.0],
        ]);
        let y: Tensor<f64> = Tensor::from_slice(&[0.0, 0.0, 1.0, 1.0]);
        let mut svc = SVC::new(10.0, Gamma::Value(2.0), 10).with_seed(123);
        svc.fit(&x, &y).unwrap();
        assert_eq!(svc.predict(&x).unwrap().data(), y.data());
        assert!(svc.n_support() > 0);
    }

    #[test]
    fn test_kernel_matches_dense_distance() {
        let x = sparse(&[vec![1.0, 0.0, 2.0], vec![0.0, 3.0, 1.0]]);
        let mut svc = SVC::<f64>::new(1.0, Gamma::Value(0.1), 10);
        svc.gamma_value = 0.1;
        let (a, b) = (x.row(0).unwrap(), x.row(1).unwrap());
        // |a - b|² = 1 + 9 + 1
        let k = svc.kernel_eval(&a, a.sq_norm(), &b, b.sq_norm());
        approx::assert_relative_eq!(k, (-1.1f64).exp(), epsilon = 1e-12);
        approx::assert_relative_eq!(svc.kernel_eval(&a, a.sq_norm(), &a, a.sq_norm()), 1.0);
    }

    #[test]
    fn test_seeded_fit_is_deterministic() {
        let (x, y) = blobs();
        let fit = || {
            let mut svc = SVC::new(1.0, Gamma::Scale, 10)
                .with_class_weight(ClassWeight::Balanced)
                .with_seed(123);
            svc.fit(&x, &y).unwrap();
            svc.decision_function(&x).unwrap()
        };
        assert_eq!(fit(), fit());
    }

    #[test]
    fn test_errors() {
        let (x, _) = blobs();
        let svc = SVC::<f64>::new(1.0, Gamma::Scale, 10);
        assert_eq!(svc.predict(&x).unwrap_err(), TensorError::NotFitted);

        let mut svc = SVC::new(1.0, Gamma::Scale, 10);
        let one_class: Tensor<f64> = Tensor::from_slice(&[1.0; 6]);
        assert!(svc.fit(&x, &one_class).is_err());
    }
}
