use nalgebra::{DMatrix, DVector};
use rand::Rng;

/// Truncated singular value decomposition `X ≈ U diag(s) Vᵗ`
///
/// * `u` - left singular vectors (rows x k)
/// * `s` - singular values, non-negative and descending (k)
/// * `v` - right singular vectors (columns x k)
#[derive(Debug, Clone)]
pub struct SvdFactors {
    pub u: DMatrix<f64>,
    pub s: DVector<f64>,
    pub v: DMatrix<f64>,
}

impl SvdFactors {
    /// No components for a `nrow x ncol` matrix
    pub fn empty(nrow: usize, ncol: usize) -> Self {
        Self {
            u: DMatrix::zeros(nrow, 0),
            s: DVector::zeros(0),
            v: DMatrix::zeros(ncol, 0),
        }
    }

    pub fn rank(&self) -> usize {
        self.s.len()
    }

    /// Keep the first `k` components
    pub fn truncate(self, k: usize) -> Self {
        let k = k.min(self.rank());
        Self {
            u: self.u.columns(0, k).into_owned(),
            s: self.s.rows(0, k).into_owned(),
            v: self.v.columns(0, k).into_owned(),
        }
    }

    /// Factors of the transposed matrix: `Xᵗ = V diag(s) Uᵗ`
    pub fn transpose(self) -> Self {
        Self {
            u: self.v,
            s: self.s,
            v: self.u,
        }
    }

    /// `U diag(s) Vᵗ`
    pub fn reconstruct(&self) -> DMatrix<f64> {
        let mut us = self.u.clone();
        for (mut u_k, s_k) in us.column_iter_mut().zip(self.s.iter()) {
            u_k *= *s_k;
        }
        us * self.v.transpose()
    }
}

/// A method that computes the top singular triples of a dense matrix
pub trait SvdEngine {
    /// Decompose `xx` keeping `min(num_components, nrows, ncols)`
    /// components in descending order of singular values
    fn decompose(&self, xx: &DMatrix<f64>, num_components: usize) -> anyhow::Result<SvdFactors>;
}

/// Operations to sample random matrices
pub trait SampleOps {
    type Mat;

    /// Sample a `dd x nn` matrix from `U(0,1)`, filling one column
    /// after another
    fn runif_with<R: Rng + ?Sized>(dd: usize, nn: usize, rng: &mut R) -> Self::Mat;

    /// Same as `runif_with` using a fresh generator seeded by `seed`
    fn runif_seeded(dd: usize, nn: usize, seed: u64) -> Self::Mat;
}
