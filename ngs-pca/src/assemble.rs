use crate::coverage::{CoverageMatrix, NamedAxis};
use anyhow::Context;
use indicatif::ParallelProgressIterator;
use log::info;
use matrix_util::numeric::{parse_value, ParsePolicy};
use nalgebra::DMatrix;
use rayon::prelude::*;

/// One sample's coverage, aligned 1:1 with the bins of the run
pub trait CoverageSource: Sync {
    fn sample_name(&self) -> &str;

    /// Produce one value per bin. May read files; called once per
    /// sample from a worker thread.
    fn load_coverage(&self) -> anyhow::Result<Vec<f64>>;
}

/// Coverage values that are already in memory
pub struct SampleCoverage {
    pub name: Box<str>,
    pub values: Vec<f64>,
}

impl CoverageSource for SampleCoverage {
    fn sample_name(&self) -> &str {
        &self.name
    }

    fn load_coverage(&self) -> anyhow::Result<Vec<f64>> {
        Ok(self.values.clone())
    }
}

/// Coverage values still in text form, parsed under `policy`
pub struct TextCoverage {
    pub name: Box<str>,
    pub source: Box<str>,
    pub cells: Vec<Box<str>>,
    pub policy: ParsePolicy,
}

impl CoverageSource for TextCoverage {
    fn sample_name(&self) -> &str {
        &self.name
    }

    fn load_coverage(&self) -> anyhow::Result<Vec<f64>> {
        self.cells
            .iter()
            .enumerate()
            .map(|(row, x)| parse_value(x, self.policy, &self.source, row))
            .collect()
    }
}

/// Builds the `bins x samples` matrix, one worker per sample column
pub struct MatrixAssembler {
    num_threads: usize,
}

impl MatrixAssembler {
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
        }
    }

    ///
    /// Place the coverage of `sources[j]` into column `j`.
    ///
    /// Columns are loaded concurrently on a pool of `num_threads`
    /// workers; each worker writes only its own column. The matrix is
    /// returned after every worker has finished, and the first failed
    /// sample fails the whole assembly.
    ///
    /// * `rows` - bin names, fixing the row order
    /// * `sources` - samples in column order
    ///
    pub fn assemble<S: CoverageSource>(
        &self,
        rows: NamedAxis,
        sources: &[S],
    ) -> anyhow::Result<CoverageMatrix> {
        let nbins = rows.len();
        let nsamples = sources.len();

        if nsamples == 0 {
            anyhow::bail!("no samples to assemble");
        }
        if nbins == 0 {
            anyhow::bail!("no bins to assemble");
        }

        info!(
            "Initializing matrix to {} rows and {} columns",
            nbins, nsamples
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()?;

        // column-major storage: column `j` is one contiguous chunk
        let mut mat = DMatrix::<f64>::zeros(nbins, nsamples);

        info!(
            "Loading {} samples with {} threads",
            nsamples, self.num_threads
        );

        pool.install(|| {
            mat.as_mut_slice()
                .par_chunks_mut(nbins)
                .zip(sources.par_iter())
                .enumerate()
                .progress_count(nsamples as u64)
                .try_for_each(|(j, (column, src))| -> anyhow::Result<()> {
                    let values = src
                        .load_coverage()
                        .with_context(|| format!("failed to load sample {}", src.sample_name()))?;

                    if values.len() != nbins {
                        anyhow::bail!(
                            "sample {} (column {}) has {} values, but {} bins were expected",
                            src.sample_name(),
                            j,
                            values.len(),
                            nbins
                        );
                    }

                    column.copy_from_slice(&values);
                    Ok(())
                })
        })?;

        let cols = sources
            .iter()
            .map(|s| s.sample_name().to_string().into_boxed_str())
            .collect();

        CoverageMatrix::new(rows, cols, mat)
    }
}
