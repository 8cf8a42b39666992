#![allow(unused)]

pub use matrix_util::common_io as io;
pub use matrix_util::dmatrix_rsvd::{
    RandomizedSvdParams, DEFAULT_OVERSAMPLES, DEFAULT_POWER_ITERATIONS, DEFAULT_RANDOM_SEED,
};

pub use ngs_pca::assemble::*;
pub use ngs_pca::coverage::*;
pub use ngs_pca::decompose::SvdMethod;
pub use ngs_pca::normalize::NormalizationMethod;
pub use ngs_pca::pipeline::*;
pub use ngs_pca::write_results::ResultFiles;

pub use clap::{Args, Parser, Subcommand};
pub use env_logger;
pub use log::{info, warn};

/// Decomposition and output settings shared by every input mode
#[derive(Args, Debug)]
pub struct PcaArgs {
    /// number of principal components to keep
    #[arg(short = 'k', long, default_value_t = 200)]
    pub num_pcs: usize,

    /// number of subspace (power) iterations of the randomized SVD
    #[arg(long, default_value_t = DEFAULT_POWER_ITERATIONS)]
    pub iters: usize,

    /// number of extra random directions of the randomized SVD
    #[arg(long, default_value_t = DEFAULT_OVERSAMPLES)]
    pub oversample: usize,

    /// random seed of the randomized SVD
    #[arg(long, default_value_t = DEFAULT_RANDOM_SEED)]
    pub seed: u64,

    /// run the exact SVD instead (small matrices only)
    #[arg(long, default_value_t = false)]
    pub exact: bool,

    /// normalization method
    #[arg(long, value_enum, default_value = "fold-change-median")]
    pub norm: NormalizationMethod,

    /// number of threads for loading samples
    #[arg(short = 't', long, default_value_t = num_cpus::get())]
    pub threads: usize,

    /// output directory for `svd.*.txt` files
    #[arg(short, long, required = true)]
    pub out: Box<str>,

    /// verbosity
    #[arg(
        long,
        short,
        help = "verbosity",
        long_help = "Enable verbose output `RUST_LOG=info`"
    )]
    pub verbose: bool,
}

impl PcaArgs {
    pub fn svd_method(&self) -> SvdMethod {
        if self.exact {
            SvdMethod::Exact
        } else {
            SvdMethod::Randomized(RandomizedSvdParams {
                iter: self.iters,
                oversample: self.oversample,
                seed: self.seed,
            })
        }
    }

    pub fn config(&self, normalization: Option<NormalizationMethod>) -> PcaConfig {
        PcaConfig {
            num_components: self.num_pcs,
            method: self.svd_method(),
            normalization,
        }
    }

    /// Create the output directory and name the files in it
    pub fn result_files(&self) -> anyhow::Result<ResultFiles> {
        io::mkdir(&self.out)?;
        Ok(ResultFiles::in_dir(&self.out))
    }
}
