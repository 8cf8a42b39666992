use crate::dmatrix_util::{check_finite, dense_svd};
use crate::traits::{SvdEngine, SvdFactors};
use log::{info, warn};
use nalgebra::DMatrix;

/// Deterministic full SVD, sorted and truncated to the requested
/// number of components. Affordable when both dimensions are small.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSVD;

impl ExactSVD {
    pub fn new() -> Self {
        Self
    }
}

/// Number of components that can be kept for a `nr x nc` matrix,
/// reporting when it falls short of the request
pub fn effective_rank(num_components: usize, nr: usize, nc: usize) -> usize {
    let rank = num_components.min(nr).min(nc);
    if rank < num_components {
        warn!(
            "{} components requested, but only {} can be computed from [{} x {}]",
            num_components, rank, nr, nc
        );
    }
    rank
}

impl SvdEngine for ExactSVD {
    fn decompose(&self, xx: &DMatrix<f64>, num_components: usize) -> anyhow::Result<SvdFactors> {
        let (nr, nc) = xx.shape();
        if nr == 0 || nc == 0 {
            anyhow::bail!("cannot decompose an empty matrix [{} x {}]", nr, nc);
        }
        check_finite(xx)?;

        let rank = effective_rank(num_components, nr, nc);
        info!("Exact SVD on [{} x {}]", nr, nc);
        let svd = dense_svd(xx.clone())?;
        Ok(svd.truncate(rank))
    }
}
