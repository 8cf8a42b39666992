use crate::coverage::CoverageMatrix;
use log::info;
use matrix_util::numeric::{nan_mean_sd, nan_median};
use nalgebra::DMatrix;

/// Floor of per-sample median depth and of every depth value before
/// taking a ratio: half of the smallest depth mosdepth reports
pub const MIN_DEPTH: f64 = 0.005;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizationMethod {
    /// log2 fold change from the (floored) column median, then
    /// median-centre every row
    #[default]
    FoldChangeMedian,
    /// log2 fold change from the column median with non-positive
    /// depths set to 0, then median-centre every row
    FoldChangeZeroNonPositive,
    /// centre and scale every column to mean 0 and sd 1
    CenterScaleColumn,
    /// centre and scale every column, then median-centre every row
    CenterScaleColumnMedianRow,
}

/// Takes ownership of the raw matrix and hands back the normalized one
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    method: NormalizationMethod,
}

impl Normalizer {
    pub fn new(method: NormalizationMethod) -> Self {
        Self { method }
    }

    pub fn normalize(&self, mut data: CoverageMatrix) -> anyhow::Result<CoverageMatrix> {
        info!(
            "Normalizing [{} x {}] by {:?}",
            data.num_bins(),
            data.num_samples(),
            self.method
        );

        let mat = &mut data.mat;

        match self.method {
            NormalizationMethod::FoldChangeMedian => {
                fold_change_by_column(mat);
                check_finite(mat)?;
                center_rows_to_median(mat);
            }
            NormalizationMethod::FoldChangeZeroNonPositive => {
                fold_change_by_column_zero_non_positive(mat)?;
                check_finite(mat)?;
                center_rows_to_median(mat);
            }
            NormalizationMethod::CenterScaleColumn => {
                scale_and_center_columns(mat);
            }
            NormalizationMethod::CenterScaleColumnMedianRow => {
                scale_and_center_columns(mat);
                check_finite(mat)?;
                center_rows_to_median(mat);
            }
        }

        check_finite(mat)?;
        Ok(data)
    }
}

/// `max` that lets `NaN` through, so that bad input is caught later
fn floor_depth(x: f64) -> f64 {
    if x.is_nan() {
        x
    } else {
        x.max(MIN_DEPTH)
    }
}

/// `x[i,j] = log2(max(x[i,j], MIN_DEPTH) / max(median(x[,j]), MIN_DEPTH))`
fn fold_change_by_column(mat: &mut DMatrix<f64>) {
    for mut x_j in mat.column_iter_mut() {
        let median = floor_depth(nan_median(x_j.as_slice()));
        x_j.apply(|x| *x = (floor_depth(*x) / median).log2());
    }
}

/// `x[i,j] = log2(x[i,j] / median(x[,j]))` if positive, otherwise 0.
/// A column whose median is not positive has no reference depth.
fn fold_change_by_column_zero_non_positive(mat: &mut DMatrix<f64>) -> anyhow::Result<()> {
    for (j, mut x_j) in mat.column_iter_mut().enumerate() {
        let median = nan_median(x_j.as_slice());
        if median.is_nan() || median <= 0.0 {
            anyhow::bail!(
                "column {} has median depth {}; cannot take fold changes (try --norm fold-change-median)",
                j,
                median
            );
        }
        x_j.apply(|x| {
            *x = if *x > 0.0 { (*x / median).log2() } else { 0.0 };
        });
    }
    Ok(())
}

fn scale_and_center_columns(mat: &mut DMatrix<f64>) {
    for mut x_j in mat.column_iter_mut() {
        let (mean, sd) = nan_mean_sd(x_j.as_slice());
        x_j.apply(|x| *x = (*x - mean) / sd);
    }
}

/// Subtract the median of every row
fn center_rows_to_median(mat: &mut DMatrix<f64>) {
    let mut row = vec![0.0; mat.ncols()];
    for i in 0..mat.nrows() {
        for (r, x) in row.iter_mut().zip(mat.row(i).iter()) {
            *r = *x;
        }
        let median = nan_median(&row);
        mat.row_mut(i).apply(|x| *x -= median);
    }
}

/// `NaN` or `±inf` anywhere is fatal
fn check_finite(mat: &DMatrix<f64>) -> anyhow::Result<()> {
    if let Some(pos) = mat.iter().position(|x| !x.is_finite()) {
        let (i, j) = (pos % mat.nrows(), pos / mat.nrows());
        anyhow::bail!(
            "invalid sample normalized value ({}) detected at row {}, column {}",
            mat[(i, j)],
            i,
            j
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::NamedAxis;
    use approx::assert_abs_diff_eq;

    fn names(prefix: &str, n: usize) -> NamedAxis {
        (0..n).map(|i| format!("{}{}", prefix, i).into_boxed_str()).collect()
    }

    fn coverage(nr: usize, nc: usize, values: &[f64]) -> CoverageMatrix {
        let mat = DMatrix::from_row_slice(nr, nc, values);
        CoverageMatrix::new(names("bin", nr), names("s", nc), mat).unwrap()
    }

    fn row_medians(mat: &DMatrix<f64>) -> Vec<f64> {
        mat.row_iter()
            .map(|r| nan_median(&r.iter().copied().collect::<Vec<_>>()))
            .collect()
    }

    #[test]
    fn fold_change_of_proportional_samples() -> anyhow::Result<()> {
        #[rustfmt::skip]
        let data = coverage(4, 3, &[
            10.0, 20.0, 5.0,
            8.0, 16.0, 4.0,
            12.0, 24.0, 6.0,
            6.0, 12.0, 3.0,
        ]);

        let mut fc = data.mat.clone();
        fold_change_by_column(&mut fc);
        // column medians are 9, 18 and 4.5
        assert_abs_diff_eq!(fc[(0, 0)], (10.0_f64 / 9.0).log2(), epsilon = 1e-12);
        assert_abs_diff_eq!(fc[(3, 1)], (12.0_f64 / 18.0).log2(), epsilon = 1e-12);
        assert_abs_diff_eq!(fc[(2, 2)], (6.0_f64 / 4.5).log2(), epsilon = 1e-12);

        let out = Normalizer::default().normalize(data)?;
        for m in row_medians(&out.mat) {
            assert_eq!(m, 0.0);
        }
        assert!(out.mat.iter().all(|x| !x.is_nan()));
        Ok(())
    }

    #[test]
    fn rows_centered_after_normalization() -> anyhow::Result<()> {
        let values: Vec<f64> = (0..40).map(|x| ((x * 37) % 17) as f64 + 0.5).collect();
        let out = Normalizer::new(NormalizationMethod::FoldChangeMedian)
            .normalize(coverage(10, 4, &values))?;
        for m in row_medians(&out.mat) {
            assert_abs_diff_eq!(m, 0.0, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn zero_depth_is_floored() -> anyhow::Result<()> {
        let data = coverage(3, 2, &[0.0, 0.0, 0.0, 2.0, 0.0, 4.0]);
        let out = Normalizer::default().normalize(data)?;
        assert!(out.mat.iter().all(|x| x.is_finite()));
        Ok(())
    }

    #[test]
    fn legacy_policy_zeroes_non_positive() {
        let mut mat = DMatrix::from_row_slice(3, 1, &[2.0, 0.0, 4.0]);
        fold_change_by_column_zero_non_positive(&mut mat).unwrap();
        assert_abs_diff_eq!(mat[(0, 0)], 0.0);
        assert_eq!(mat[(1, 0)], 0.0);
        assert_abs_diff_eq!(mat[(2, 0)], 1.0);
    }

    #[test]
    fn legacy_policy_rejects_zero_median() -> anyhow::Result<()> {
        #[rustfmt::skip]
        let data = coverage(3, 3, &[
            1.0, 1.0, 2.0,
            0.0, 0.0, 3.0,
            0.0, 0.0, 4.0,
        ]);
        let err = Normalizer::new(NormalizationMethod::FoldChangeZeroNonPositive)
            .normalize(data.clone())
            .unwrap_err();
        assert!(err.to_string().contains("column 0"), "{}", err);

        // the floored policy handles the same matrix
        let out = Normalizer::default().normalize(data)?;
        assert!(out.mat.iter().all(|x| x.is_finite()));
        Ok(())
    }

    #[test]
    fn constant_column_cannot_be_scaled() {
        let data = coverage(3, 2, &[1.0, 5.0, 2.0, 5.0, 3.0, 5.0]);
        for method in [
            NormalizationMethod::CenterScaleColumn,
            NormalizationMethod::CenterScaleColumnMedianRow,
        ] {
            let err = Normalizer::new(method).normalize(data.clone()).unwrap_err();
            assert!(err.to_string().contains("column 1"), "{}", err);
        }
    }

    #[test]
    fn infinite_input_fails() {
        let data = coverage(3, 2, &[1.0, 2.0, f64::INFINITY, 4.0, 5.0, 6.0]);
        for method in [
            NormalizationMethod::FoldChangeMedian,
            NormalizationMethod::FoldChangeZeroNonPositive,
        ] {
            assert!(Normalizer::new(method).normalize(data.clone()).is_err());
        }
    }

    #[test]
    fn nan_input_fails() {
        let data = coverage(2, 2, &[1.0, f64::NAN, 3.0, 4.0]);
        let err = Normalizer::default().normalize(data).unwrap_err();
        assert!(err.to_string().contains("NaN"));
    }

    #[test]
    fn column_scaling() -> anyhow::Result<()> {
        let data = coverage(4, 2, &[1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0]);
        let out = Normalizer::new(NormalizationMethod::CenterScaleColumn).normalize(data)?;
        for x_j in out.mat.column_iter() {
            let (mean, sd) = nan_mean_sd(x_j.as_slice());
            assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(sd, 1.0, epsilon = 1e-12);
        }
        Ok(())
    }
}
