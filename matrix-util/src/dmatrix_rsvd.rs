use crate::dmatrix_svd::effective_rank;
use crate::dmatrix_util::{check_finite, dense_svd, orthonormalize};
use crate::traits::{SampleOps, SvdEngine, SvdFactors};
use log::info;
use nalgebra::{DMatrix, DVector};

type Mat = DMatrix<f64>;
type DVec = DVector<f64>;

pub const DEFAULT_POWER_ITERATIONS: usize = 10;
pub const DEFAULT_OVERSAMPLES: usize = 200;
pub const DEFAULT_RANDOM_SEED: u64 = 42;

pub trait RSVD {
    fn rsvd(&self, rank: usize) -> anyhow::Result<(Mat, DVec, Mat)>;
}

impl RSVD for Mat {
    fn rsvd(&self, rank: usize) -> anyhow::Result<(Mat, DVec, Mat)> {
        let mut rsvd = RandomizedSVD::new(rank, DEFAULT_POWER_ITERATIONS);
        rsvd.compute(self)?;
        let SvdFactors { u, s, v } = rsvd.into_factors();
        Ok((u, s, v))
    }
}

/// Tuning parameters of the randomized SVD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomizedSvdParams {
    /// number of subspace (power) iterations `q`
    pub iter: usize,
    /// number of extra random directions `p`
    pub oversample: usize,
    /// seed of the test matrix generator
    pub seed: u64,
}

impl Default for RandomizedSvdParams {
    fn default() -> Self {
        Self {
            iter: DEFAULT_POWER_ITERATIONS,
            oversample: DEFAULT_OVERSAMPLES,
            seed: DEFAULT_RANDOM_SEED,
        }
    }
}

impl SvdEngine for RandomizedSvdParams {
    fn decompose(&self, xx: &Mat, num_components: usize) -> anyhow::Result<SvdFactors> {
        let mut rsvd = RandomizedSVD::with_params(num_components, *self);
        if log::log_enabled!(log::Level::Info) {
            rsvd.set_verbose();
        }
        rsvd.compute(xx)?;
        Ok(rsvd.into_factors())
    }
}

/// Which matrix the iterations run on. A wide matrix is handled
/// through its transpose so that the working matrix `A` always has
/// at least as many rows as columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    AsIs,
    Transposed,
}

/// `A` seen through an orientation, without copying `xx`
struct Oriented<'a> {
    xx: &'a Mat,
    orientation: Orientation,
}

impl<'a> Oriented<'a> {
    fn new(xx: &'a Mat) -> Self {
        let orientation = if xx.nrows() < xx.ncols() {
            Orientation::Transposed
        } else {
            Orientation::AsIs
        };
        Self { xx, orientation }
    }

    fn nrows(&self) -> usize {
        match self.orientation {
            Orientation::AsIs => self.xx.nrows(),
            Orientation::Transposed => self.xx.ncols(),
        }
    }

    fn ncols(&self) -> usize {
        match self.orientation {
            Orientation::AsIs => self.xx.ncols(),
            Orientation::Transposed => self.xx.nrows(),
        }
    }

    /// `A * rhs`
    fn mul(&self, rhs: &Mat) -> Mat {
        match self.orientation {
            Orientation::AsIs => self.xx * rhs,
            Orientation::Transposed => self.xx.tr_mul(rhs),
        }
    }

    /// `Aᵗ * rhs`
    fn tr_mul(&self, rhs: &Mat) -> Mat {
        match self.orientation {
            Orientation::AsIs => self.xx.tr_mul(rhs),
            Orientation::Transposed => self.xx * rhs,
        }
    }

    /// Express factors of `A` as factors of `xx`
    fn restore(&self, factors: SvdFactors) -> SvdFactors {
        match self.orientation {
            Orientation::AsIs => factors,
            Orientation::Transposed => factors.transpose(),
        }
    }
}

/// Randomized SVD
///
/// Implement Alg 4.4 of Halko et al. (2009), re-orthonormalizing by
/// QR between every multiplication.
///
pub struct RandomizedSVD {
    max_rank: usize,
    params: RandomizedSvdParams,
    u_vectors: Mat,
    singular_values: DVec,
    v_vectors: Mat,
    verbose: bool,
}

impl RandomizedSVD {
    pub fn new(max_rank: usize, iter: usize) -> Self {
        Self::with_params(
            max_rank,
            RandomizedSvdParams {
                iter,
                ..Default::default()
            },
        )
    }

    pub fn with_params(max_rank: usize, params: RandomizedSvdParams) -> Self {
        Self {
            max_rank,
            params,
            u_vectors: Mat::zeros(0, 0),
            singular_values: DVec::zeros(0),
            v_vectors: Mat::zeros(0, 0),
            verbose: false,
        }
    }

    pub fn oversample(mut self, oversample: usize) -> Self {
        self.params.oversample = oversample;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.params.seed = seed;
        self
    }

    pub fn matrix_u(&self) -> &Mat {
        &self.u_vectors
    }

    pub fn matrix_v(&self) -> &Mat {
        &self.v_vectors
    }

    pub fn singular_values(&self) -> &DVec {
        &self.singular_values
    }

    pub fn into_factors(self) -> SvdFactors {
        SvdFactors {
            u: self.u_vectors,
            s: self.singular_values,
            v: self.v_vectors,
        }
    }

    pub fn set_verbose(&mut self) {
        self.verbose = true;
    }

    pub fn compute(&mut self, xx: &Mat) -> anyhow::Result<()> {
        let (nr, nc) = xx.shape();
        if nr == 0 || nc == 0 {
            anyhow::bail!("cannot decompose an empty matrix [{} x {}]", nr, nc);
        }
        check_finite(xx)?;

        let rank = effective_rank(self.max_rank, nr, nc);

        if rank == 0 {
            let SvdFactors { u, s, v } = SvdFactors::empty(nr, nc);
            self.u_vectors = u;
            self.singular_values = s;
            self.v_vectors = v;
            return Ok(());
        }

        let aa = Oriented::new(xx);
        let rank_and_oversample = (rank + self.params.oversample).min(aa.ncols());

        if self.verbose {
            info!(
                "Randomized SVD on [{} x {}] ({:?}), rank {} + oversample {}, {} iterations, seed {}",
                aa.nrows(),
                aa.ncols(),
                aa.orientation,
                rank,
                rank_and_oversample - rank,
                self.params.iter,
                self.params.seed
            );
        }

        let qq = self.rand_subspace_iteration(&aa, rank_and_oversample);

        // B = Qᵗ A
        let bb = aa.tr_mul(&qq).transpose();

        if self.verbose {
            info!("Final svd on [{} x {}]", bb.nrows(), bb.ncols());
        }

        let svd_b = dense_svd(bb)?;

        let factors = SvdFactors {
            u: &qq * svd_b.u,
            s: svd_b.s,
            v: svd_b.v,
        }
        .truncate(rank);

        if factors.rank() != rank {
            anyhow::bail!(
                "expected {} singular values, but found {}",
                rank,
                factors.rank()
            );
        }

        let SvdFactors { u, s, v } = aa.restore(factors);
        self.u_vectors = u;
        self.singular_values = s;
        self.v_vectors = v;

        if self.verbose {
            info!("Done: RandomizedSVD.compute()");
        }
        Ok(())
    }

    // Find an orthonormal matrix whose range approximates the range of A
    fn rand_subspace_iteration(&self, aa: &Oriented, rank_and_oversample: usize) -> Mat {
        let omega = Mat::runif_seeded(aa.ncols(), rank_and_oversample, self.params.seed);

        let mut yy = aa.mul(&omega);

        for i in 0..self.params.iter {
            let qq_y = orthonormalize(yy);
            let qq_z = orthonormalize(aa.tr_mul(&qq_y));
            yy = aa.mul(&qq_z);

            if self.verbose {
                info!("[Done] subspace iteration {:>10}", i + 1);
            }
        }

        let qq = orthonormalize(yy);

        if self.verbose {
            info!("Found Q [{} x {}]", qq.nrows(), qq.ncols());
        }
        qq
    }
}
