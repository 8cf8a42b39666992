use crate::coverage::CoverageMatrix;
use log::{error, info};
use matrix_util::common_io::write_lines;
use matrix_util::traits::SvdFactors;
use nalgebra::DMatrix;

/// Output files of one run
#[derive(Debug, Clone)]
pub struct ResultFiles {
    pub pcs: Box<str>,
    pub loadings: Box<str>,
    pub singular_values: Box<str>,
    pub bins: Box<str>,
    pub samples: Box<str>,
}

impl ResultFiles {
    /// `svd.*.txt` under `out_dir`
    pub fn in_dir(out_dir: &str) -> Self {
        let file = |name: &str| -> Box<str> {
            std::path::Path::new(out_dir)
                .join(name)
                .to_string_lossy()
                .into_owned()
                .into_boxed_str()
        };
        Self {
            pcs: file("svd.pcs.txt"),
            loadings: file("svd.loadings.txt"),
            singular_values: file("svd.singularvalues.txt"),
            bins: file("svd.bins.txt"),
            samples: file("svd.samples.txt"),
        }
    }
}

/// `PC1, PC2, ...`
pub fn numbered_header(prefix: &str, num: usize) -> Vec<Box<str>> {
    (1..=num)
        .map(|k| format!("{}{}", prefix, k).into_boxed_str())
        .collect()
}

/// `loading[i, k] = x[i,:] · v[:,k] / s[k]`, and 0 where `s[k] = 0`
/// (then `x v[:,k]` is 0 too)
pub fn compute_loadings(mat: &DMatrix<f64>, factors: &SvdFactors) -> DMatrix<f64> {
    let mut loadings = mat * &factors.v;
    for (mut l_k, s_k) in loadings.column_iter_mut().zip(factors.s.iter()) {
        if *s_k > 0.0 {
            l_k /= *s_k;
        } else {
            l_k.fill(0.0);
        }
    }
    loadings
}

fn check_finite(what: &str, xx: &DMatrix<f64>) -> anyhow::Result<()> {
    if let Some((pos, x)) = xx.iter().enumerate().find(|(_, x)| !x.is_finite()) {
        anyhow::bail!(
            "non-finite {} value {} at row {}, column {}",
            what,
            x,
            pos % xx.nrows(),
            pos / xx.nrows()
        );
    }
    Ok(())
}

/// Tab-delimited lines: a header, then one named row per matrix row
fn format_table(
    row_title: &str,
    col_names: &[Box<str>],
    row_names: &[Box<str>],
    mat: &DMatrix<f64>,
) -> Vec<Box<str>> {
    let mut lines = Vec::with_capacity(row_names.len() + 1);

    let header = std::iter::once(row_title)
        .chain(col_names.iter().map(|x| x.as_ref()))
        .collect::<Vec<_>>()
        .join("\t");
    lines.push(header.into_boxed_str());

    for (name, row) in row_names.iter().zip(mat.row_iter()) {
        let line = std::iter::once(name.to_string())
            .chain(row.iter().map(|x| format!("{}", x)))
            .collect::<Vec<_>>()
            .join("\t");
        lines.push(line.into_boxed_str());
    }
    lines
}

/// `SAMPLE, PC1, PC2, ...`: one row per sample
pub fn format_pcs(factors: &SvdFactors, samples: &[Box<str>]) -> Vec<Box<str>> {
    let header = numbered_header("PC", factors.rank());
    format_table("SAMPLE", &header, samples, &factors.v)
}

/// `MARKER, Loading1, Loading2, ...`: one row per bin
pub fn format_loadings(loadings: &DMatrix<f64>, bins: &[Box<str>]) -> Vec<Box<str>> {
    let header = numbered_header("Loading", loadings.ncols());
    format_table("MARKER", &header, bins, loadings)
}

/// `PC, SINGULAR_VALUE`: one row per component, indexed from 0
pub fn format_singular_values(factors: &SvdFactors) -> Vec<Box<str>> {
    std::iter::once("PC\tSINGULAR_VALUE".to_string().into_boxed_str())
        .chain(
            factors
                .s
                .iter()
                .enumerate()
                .map(|(k, s)| format!("{}\t{}", k, s).into_boxed_str()),
        )
        .collect()
}

///
/// Write PCs, loadings, singular values, and the bins and samples used.
///
/// Shapes and values are checked before anything is written:
/// non-finite factors or loadings are fatal, and components with a
/// zero singular value are reported (their loadings are 0). Each file is
/// written on its own: a failure is logged and the remaining files
/// are still attempted, then the run reports every failed file.
///
/// * `files` - output file names
/// * `factors` - decomposition of `data.mat`
/// * `data` - the normalized matrix with its names
///
pub fn write_results(
    files: &ResultFiles,
    factors: &SvdFactors,
    data: &CoverageMatrix,
) -> anyhow::Result<()> {
    data.check_dimensions()?;

    if factors.u.nrows() != data.rows.len() {
        anyhow::bail!(
            "mismatched row lengths: {} rows in U vs. {} bins",
            factors.u.nrows(),
            data.rows.len()
        );
    }
    if factors.v.nrows() != data.cols.len() {
        anyhow::bail!(
            "mismatched column lengths: {} rows in V vs. {} samples",
            factors.v.nrows(),
            data.cols.len()
        );
    }

    check_finite("U", &factors.u)?;
    check_finite("V", &factors.v)?;
    if let Some(k) = factors.s.iter().position(|s| !s.is_finite() || *s < 0.0) {
        anyhow::bail!("invalid singular value {} of component {}", factors.s[k], k);
    }

    for (k, _) in factors.s.iter().enumerate().filter(|(_, s)| **s == 0.0) {
        error!(
            "component {} has a zero singular value: its loadings are set to 0",
            k
        );
    }

    let loadings = compute_loadings(&data.mat, factors);
    check_finite("loading", &loadings)?;

    let outputs: Vec<(&str, Vec<Box<str>>)> = vec![
        (&files.pcs, format_pcs(factors, &data.cols)),
        (&files.loadings, format_loadings(&loadings, &data.rows)),
        (&files.singular_values, format_singular_values(factors)),
        (&files.bins, data.rows.clone()),
        (&files.samples, data.cols.clone()),
    ];

    let mut failed = vec![];
    for (file, lines) in outputs {
        info!("Writing to {}", file);
        if let Err(e) = write_lines(&lines, file) {
            error!("unable to write to file {}: {}", file, e);
            failed.push(file.to_string());
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("failed to write: {}", failed.join(", "));
    }
    Ok(())
}
