use crate::traits::{SampleOps, SvdFactors};
pub use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

impl SampleOps for DMatrix<f64> {
    type Mat = DMatrix<f64>;

    fn runif_with<R: Rng + ?Sized>(dd: usize, nn: usize, rng: &mut R) -> Self::Mat {
        let rvec: Vec<f64> = (0..(dd * nn)).map(|_| rng.random::<f64>()).collect();
        DMatrix::<f64>::from_vec(dd, nn, rvec)
    }

    fn runif_seeded(dd: usize, nn: usize, seed: u64) -> Self::Mat {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::runif_with(dd, nn, &mut rng)
    }
}

/// Orthonormal basis of the column space of `xx` (`d x min(d, n)`),
/// the thin `Q` of a Householder QR decomposition
pub fn orthonormalize(xx: DMatrix<f64>) -> DMatrix<f64> {
    xx.qr().q()
}

/// Cap on the implicit QR sweeps of the dense SVD
pub const SVD_MAX_ITERATIONS: usize = 10_000;

/// Fail on the first `NaN` or `±inf` entry, naming its row and column
pub fn check_finite(xx: &DMatrix<f64>) -> anyhow::Result<()> {
    if let Some(pos) = xx.iter().position(|x| !x.is_finite()) {
        let (i, j) = (pos % xx.nrows(), pos / xx.nrows());
        anyhow::bail!(
            "non-finite value {} at row {}, column {} of [{} x {}]",
            xx[(i, j)],
            i,
            j,
            xx.nrows(),
            xx.ncols()
        );
    }
    Ok(())
}

/// Full dense SVD of `xx` with the singular triples sorted by
/// decreasing singular value
pub fn dense_svd(xx: DMatrix<f64>) -> anyhow::Result<SvdFactors> {
    let (nr, nc) = xx.shape();
    if nr == 0 || nc == 0 {
        return Ok(SvdFactors::empty(nr, nc));
    }

    let svd = xx
        .try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "SVD failed to converge on [{} x {}] in {} iterations",
                nr,
                nc,
                SVD_MAX_ITERATIONS
            )
        })?;

    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => anyhow::bail!("SVD failed"),
    };

    let s = svd.singular_values;
    let mut order: Vec<usize> = (0..s.len()).collect();
    order.sort_by(|&a, &b| s[b].total_cmp(&s[a]));

    let kk = order.len();
    let mut u_sorted = DMatrix::<f64>::zeros(nr, kk);
    let mut v_sorted = DMatrix::<f64>::zeros(nc, kk);
    let mut s_sorted = DVector::<f64>::zeros(kk);

    for (k, &idx) in order.iter().enumerate() {
        s_sorted[k] = s[idx];
        u_sorted.column_mut(k).copy_from(&u.column(idx));
        v_sorted.column_mut(k).tr_copy_from(&v_t.row(idx));
    }

    Ok(SvdFactors {
        u: u_sorted,
        s: s_sorted,
        v: v_sorted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn seeded_runif_is_reproducible() {
        let aa = DMatrix::<f64>::runif_seeded(7, 3, 11);
        let bb = DMatrix::<f64>::runif_seeded(7, 3, 11);
        let cc = DMatrix::<f64>::runif_seeded(7, 3, 12);
        assert_eq!(aa, bb);
        assert_ne!(aa, cc);
        assert!(aa.iter().all(|&x| (0.0..1.0).contains(&x)));
    }

    #[test]
    fn orthonormal_columns() {
        let xx = DMatrix::<f64>::runif_seeded(20, 4, 1);
        let qq = orthonormalize(xx);
        assert_eq!(qq.shape(), (20, 4));
        let qtq = qq.transpose() * &qq;
        assert_abs_diff_eq!(qtq, DMatrix::<f64>::identity(4, 4), epsilon = 1e-10);
    }

    #[test]
    fn non_finite_entry_is_located() {
        let mut xx = DMatrix::<f64>::from_element(4, 3, 1.0);
        assert!(check_finite(&xx).is_ok());
        xx[(2, 1)] = f64::NEG_INFINITY;
        let err = check_finite(&xx).unwrap_err();
        assert!(err.to_string().contains("row 2, column 1"), "{}", err);
    }

    #[test]
    fn dense_svd_sorted() -> anyhow::Result<()> {
        let xx = DMatrix::<f64>::from_diagonal(&DVector::from_vec(vec![1.0, 5.0, 3.0]));
        let svd = dense_svd(xx.clone())?;
        assert_abs_diff_eq!(svd.s, DVector::from_vec(vec![5.0, 3.0, 1.0]), epsilon = 1e-12);
        assert_abs_diff_eq!(svd.reconstruct(), xx, epsilon = 1e-10);
        Ok(())
    }
}
