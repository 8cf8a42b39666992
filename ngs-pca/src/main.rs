mod common;
mod run_matrix;
mod run_mosdepth;

use crate::common::*;
use run_matrix::*;
use run_mosdepth::*;

#[derive(Parser, Debug)]
#[command(version, about, long_about, term_width = 80)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// PCA of mosdepth `*.regions.bed.gz` coverage (normalized)
    Mosdepth(MosdepthArgs),
    /// PCA of a tab-delimited `bins x samples` matrix
    Matrix(MatrixArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.commands {
        Commands::Mosdepth(args) => {
            run_mosdepth(args)?;
        }
        Commands::Matrix(args) => {
            run_matrix(args)?;
        }
    }

    info!("Done");
    Ok(())
}
