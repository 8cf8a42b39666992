use approx::{assert_abs_diff_eq, assert_relative_eq};
use matrix_util::dmatrix_rsvd::{RandomizedSVD, RandomizedSvdParams, RSVD};
use matrix_util::dmatrix_svd::ExactSVD;
use matrix_util::dmatrix_util::orthonormalize;
use matrix_util::traits::SvdEngine;
use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand_distr::StandardNormal;

/// `nr x nc` matrix with singular values `sv` plus a little noise
fn low_rank_matrix(nr: usize, nc: usize, sv: &[f64], noise: f64, seed: u64) -> DMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let kk = sv.len();
    let uu = orthonormalize(DMatrix::from_fn(nr, kk, |_, _| rng.sample(StandardNormal)));
    let vv = orthonormalize(DMatrix::from_fn(nc, kk, |_, _| rng.sample(StandardNormal)));
    let dd = DMatrix::from_diagonal(&DVector::from_column_slice(sv));
    let ee: DMatrix<f64> = DMatrix::from_fn(nr, nc, |_, _| rng.sample::<f64, _>(StandardNormal));
    uu * dd * vv.transpose() + ee * noise
}

fn assert_orthonormal_columns(xx: &DMatrix<f64>, tol: f64) {
    let kk = xx.ncols();
    assert_abs_diff_eq!(
        xx.transpose() * xx,
        DMatrix::<f64>::identity(kk, kk),
        epsilon = tol
    );
}

#[test]
fn randomized_matches_exact_on_low_rank() -> anyhow::Result<()> {
    let sv = [50.0, 30.0, 20.0, 10.0, 5.0];
    let xx = low_rank_matrix(80, 40, &sv, 1e-3, 1);

    let params = RandomizedSvdParams {
        iter: 10,
        oversample: 20,
        seed: 7,
    };
    let approx = params.decompose(&xx, 5)?;
    let exact = ExactSVD.decompose(&xx, 5)?;

    assert_eq!(approx.rank(), 5);
    for k in 0..5 {
        assert_relative_eq!(approx.s[k], exact.s[k], max_relative = 1e-3);
    }

    assert_eq!(approx.u.shape(), (80, 5));
    assert_eq!(approx.v.shape(), (40, 5));
    assert_orthonormal_columns(&approx.u, 1e-6);
    assert_orthonormal_columns(&approx.v, 1e-6);
    Ok(())
}

#[test]
fn same_seed_is_bit_identical() -> anyhow::Result<()> {
    let xx = low_rank_matrix(60, 25, &[9.0, 4.0, 1.0], 0.1, 2);
    let params = RandomizedSvdParams {
        iter: 3,
        oversample: 5,
        seed: 2024,
    };

    let first = params.decompose(&xx, 3)?;
    let second = params.decompose(&xx, 3)?;

    assert_eq!(first.u, second.u);
    assert_eq!(first.s, second.s);
    assert_eq!(first.v, second.v);
    Ok(())
}

#[test]
fn transposed_input_swaps_factors() -> anyhow::Result<()> {
    let xx = low_rank_matrix(50, 12, &[12.0, 6.0, 3.0, 1.0], 0.01, 3);
    let params = RandomizedSvdParams {
        iter: 10,
        oversample: 8,
        seed: 5,
    };

    let tall = params.decompose(&xx, 4)?;
    let wide = params.decompose(&xx.transpose(), 4)?;

    assert_eq!(wide.u.shape(), (12, 4));
    assert_eq!(wide.v.shape(), (50, 4));
    assert_abs_diff_eq!(tall.s, wide.s, epsilon = 1e-8);

    // singular vectors agree up to sign
    for k in 0..4 {
        let dot_u = tall.u.column(k).dot(&wide.v.column(k)).abs();
        let dot_v = tall.v.column(k).dot(&wide.u.column(k)).abs();
        assert_abs_diff_eq!(dot_u, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(dot_v, 1.0, epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn wide_matrix_reconstruction() -> anyhow::Result<()> {
    let xx = low_rank_matrix(6, 30, &[8.0, 2.0], 0.0, 4);
    let mut rsvd = RandomizedSVD::new(2, 5).oversample(4).seed(9);
    rsvd.compute(&xx)?;

    assert_eq!(rsvd.matrix_u().shape(), (6, 2));
    assert_eq!(rsvd.matrix_v().shape(), (30, 2));
    assert_abs_diff_eq!(rsvd.into_factors().reconstruct(), xx, epsilon = 1e-8);
    Ok(())
}

#[test]
fn too_many_components_are_reduced() -> anyhow::Result<()> {
    let xx = low_rank_matrix(20, 3, &[3.0, 2.0, 1.0], 0.0, 5);
    let out = RandomizedSvdParams::default().decompose(&xx, 10)?;
    assert_eq!(out.rank(), 3);
    assert!(out.s[0] >= out.s[1] && out.s[1] >= out.s[2]);
    Ok(())
}

#[test]
fn zero_components_is_empty() -> anyhow::Result<()> {
    let xx = low_rank_matrix(10, 4, &[1.0], 0.1, 6);
    let out = RandomizedSvdParams::default().decompose(&xx, 0)?;
    assert_eq!(out.rank(), 0);
    assert_eq!(out.u.shape(), (10, 0));
    assert_eq!(out.v.shape(), (4, 0));
    Ok(())
}

#[test]
fn empty_matrix_is_rejected() {
    let xx = DMatrix::<f64>::zeros(0, 5);
    assert!(RandomizedSvdParams::default().decompose(&xx, 2).is_err());
}

#[test]
fn non_finite_entry_is_rejected_by_both_engines() {
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        for (nr, nc) in [(6, 3), (3, 6)] {
            let mut xx = DMatrix::<f64>::from_fn(nr, nc, |i, j| (i * nc + j) as f64);
            xx[(1, 2)] = bad;

            let exact = ExactSVD.decompose(&xx, 2).unwrap_err();
            assert!(exact.to_string().contains("row 1, column 2"), "{}", exact);

            let randomized = RandomizedSvdParams::default().decompose(&xx, 2).unwrap_err();
            assert!(randomized.to_string().contains("row 1, column 2"), "{}", randomized);
        }
    }
}

#[test]
fn identity_rsvd() -> anyhow::Result<()> {
    let xx = DMatrix::<f64>::identity(8, 8);
    let (u, s, v) = xx.rsvd(3)?;
    assert_eq!(s.len(), 3);
    assert_abs_diff_eq!(s, DVector::from_element(3, 1.0), epsilon = 1e-10);
    assert_orthonormal_columns(&u, 1e-10);
    assert_orthonormal_columns(&v, 1e-10);
    Ok(())
}
