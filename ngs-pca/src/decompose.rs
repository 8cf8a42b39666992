use crate::coverage::CoverageMatrix;
use log::info;
use matrix_util::dmatrix_rsvd::RandomizedSvdParams;
use matrix_util::dmatrix_svd::ExactSVD;
use matrix_util::traits::{SvdEngine, SvdFactors};

/// Which SVD engine to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvdMethod {
    Exact,
    Randomized(RandomizedSvdParams),
}

impl Default for SvdMethod {
    fn default() -> Self {
        SvdMethod::Randomized(RandomizedSvdParams::default())
    }
}

impl SvdMethod {
    pub fn engine(&self) -> &dyn SvdEngine {
        match self {
            SvdMethod::Exact => &ExactSVD,
            SvdMethod::Randomized(params) => params,
        }
    }
}

///
/// Top singular triples of the (normalized) coverage matrix
///
/// * `data` - matrix with row and column names of matching length
/// * `num_components` - number of components requested
/// * `method` - exact or randomized
///
pub fn decompose(
    data: &CoverageMatrix,
    num_components: usize,
    method: &SvdMethod,
) -> anyhow::Result<SvdFactors> {
    data.check_dimensions()?;

    let (nr, nc) = (data.num_bins(), data.num_samples());
    if nr == 0 || nc == 0 {
        anyhow::bail!("need at least one bin and one sample, found [{} x {}]", nr, nc);
    }

    if let Some(pos) = data.mat.iter().position(|x| !x.is_finite()) {
        let (i, j) = (pos % nr, pos / nr);
        anyhow::bail!(
            "non-finite value {} for bin {} (row {}) of sample {} (column {})",
            data.mat[(i, j)],
            data.rows[i],
            i,
            data.cols[j],
            j
        );
    }

    match method {
        SvdMethod::Exact => info!("Computing exact SVD"),
        SvdMethod::Randomized(params) => {
            info!("Oversampling set to: {}", params.oversample);
            info!("Subspace iterations set to: {}", params.iter);
            info!("Random seed set to: {}", params.seed);
        }
    }

    let factors = method.engine().decompose(&data.mat, num_components)?;

    let expected = num_components.min(nr).min(nc);
    if factors.rank() != expected
        || factors.u.shape() != (nr, expected)
        || factors.v.shape() != (nc, expected)
    {
        anyhow::bail!(
            "expected {} components for [{} x {}], but found U {:?}, s {}, V {:?}",
            expected,
            nr,
            nc,
            factors.u.shape(),
            factors.rank(),
            factors.v.shape()
        );
    }

    info!("Retained {} components", factors.rank());
    Ok(factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::NamedAxis;
    use crate::normalize::Normalizer;
    use nalgebra::DMatrix;

    fn names(prefix: &str, n: usize) -> NamedAxis {
        (0..n).map(|i| format!("{}{}", prefix, i).into_boxed_str()).collect()
    }

    #[test]
    fn normalized_example_two_components() -> anyhow::Result<()> {
        #[rustfmt::skip]
        let mat = DMatrix::from_row_slice(4, 3, &[
            10.0, 20.0, 5.0,
            8.0, 16.0, 4.0,
            12.0, 24.0, 6.0,
            6.0, 12.0, 3.0,
        ]);
        let data = CoverageMatrix::new(names("bin", 4), names("s", 3), mat)?;
        let data = Normalizer::default().normalize(data)?;

        let svd = decompose(&data, 2, &SvdMethod::Exact)?;
        assert_eq!(svd.rank(), 2);
        assert!(svd.s[0] >= svd.s[1]);
        Ok(())
    }

    #[test]
    fn request_beyond_columns_is_reduced() -> anyhow::Result<()> {
        let mat = DMatrix::from_fn(12, 3, |i, j| ((i * 7 + j * 3) % 5) as f64 + (i * j) as f64);
        let data = CoverageMatrix::new(names("bin", 12), names("s", 3), mat)?;

        for method in [SvdMethod::Exact, SvdMethod::default()] {
            let svd = decompose(&data, 10, &method)?;
            assert_eq!(svd.rank(), 3);
            assert_eq!(svd.u.shape(), (12, 3));
            assert_eq!(svd.v.shape(), (3, 3));
        }
        Ok(())
    }

    #[test]
    fn non_finite_input_is_rejected() {
        for bad in [f64::NAN, f64::INFINITY] {
            let mut mat = DMatrix::from_fn(6, 3, |i, j| (i + 2 * j) as f64 + 0.5);
            mat[(4, 1)] = bad;
            let data = CoverageMatrix::new(names("bin", 6), names("s", 3), mat).unwrap();
            for method in [SvdMethod::Exact, SvdMethod::default()] {
                let err = decompose(&data, 2, &method).unwrap_err();
                let msg = err.to_string();
                assert!(msg.contains("bin4") && msg.contains("s1"), "{}", msg);
            }
        }
    }

    #[test]
    fn mismatched_names_fail_before_decomposition() {
        let mut data = CoverageMatrix::new(
            names("bin", 4),
            names("s", 2),
            DMatrix::from_element(4, 2, 1.0),
        )
        .unwrap();
        data.cols.pop();
        let err = decompose(&data, 1, &SvdMethod::Exact).unwrap_err();
        assert!(err.to_string().contains("column"));
    }
}
