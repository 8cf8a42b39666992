use crate::coverage::CoverageMatrix;
use crate::decompose::{decompose, SvdMethod};
use crate::normalize::{NormalizationMethod, Normalizer};
use crate::write_results::{write_results, ResultFiles};
use log::info;
use matrix_util::traits::SvdFactors;

/// What to do with an assembled matrix
#[derive(Debug, Clone, Copy)]
pub struct PcaConfig {
    pub num_components: usize,
    pub method: SvdMethod,
    /// `None` leaves the matrix as is
    pub normalization: Option<NormalizationMethod>,
}

impl Default for PcaConfig {
    fn default() -> Self {
        Self {
            num_components: 200,
            method: SvdMethod::default(),
            normalization: Some(NormalizationMethod::default()),
        }
    }
}

///
/// Normalize, decompose and write the results
///
/// * `data` - raw `bins x samples` coverage
/// * `config` - normalization and SVD settings
/// * `files` - where to write
///
pub fn run_pca(
    data: CoverageMatrix,
    config: &PcaConfig,
    files: &ResultFiles,
) -> anyhow::Result<SvdFactors> {
    let data = match config.normalization {
        Some(method) => Normalizer::new(method).normalize(data)?,
        None => {
            info!("Skipping normalization");
            data
        }
    };

    info!(
        "Computing {} components of [{} x {}]",
        config.num_components,
        data.num_bins(),
        data.num_samples()
    );
    let factors = decompose(&data, config.num_components, &config.method)?;

    write_results(files, &factors, &data)?;
    Ok(factors)
}
