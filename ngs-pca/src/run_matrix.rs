use crate::common::*;
use matrix_util::numeric::ParsePolicy;

#[derive(Args, Debug)]
pub struct MatrixArgs {
    /// tab-delimited `bins x samples` matrix (`.gz` ok); the header
    /// names the samples and the first column names the bins
    #[arg(required = true)]
    input: Box<str>,

    /// stop at the first non-numeric value instead of substituting
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// value substituted for non-numeric cells (unless `--strict`)
    #[arg(long, default_value_t = 0.0)]
    na_value: f64,

    /// normalize the matrix before decomposition (by `--norm`)
    #[arg(long, default_value_t = false)]
    normalize: bool,

    /// keep every n-th bin
    #[arg(long, default_value_t = 1)]
    sample_every: usize,

    #[command(flatten)]
    pca: PcaArgs,
}

/// Principal components of a coverage matrix file
pub fn run_matrix(args: &MatrixArgs) -> anyhow::Result<()> {
    if args.pca.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    info!("Reading {}", args.input);
    let io::ReadLinesOut { lines, header } =
        io::read_lines_of_words_delim(&args.input, "\t", Some(0))?;

    let width = lines.first().map(|x| x.len()).unwrap_or(0);
    if width < 2 {
        anyhow::bail!("need a bin name column and at least one sample in {}", args.input);
    }

    let samples: Vec<Box<str>> = if header.len() == width {
        header[1..].to_vec()
    } else if header.len() + 1 == width {
        header
    } else {
        anyhow::bail!(
            "{} names {} columns in its header, but has {} columns",
            args.input,
            header.len(),
            width
        );
    };

    if let Some(row) = lines.iter().position(|x| x.len() != width) {
        anyhow::bail!(
            "expected {} columns in {} (data row {}), found {}",
            width,
            args.input,
            row,
            lines[row].len()
        );
    }

    let policy = if args.strict {
        ParsePolicy::FailFast
    } else {
        ParsePolicy::Default(args.na_value)
    };

    let rows: NamedAxis = lines.iter().map(|x| x[0].clone()).collect();
    let sources: Vec<TextCoverage> = samples
        .iter()
        .enumerate()
        .map(|(j, name)| TextCoverage {
            name: name.clone(),
            source: args.input.clone(),
            cells: lines.iter().map(|x| x[j + 1].clone()).collect(),
            policy,
        })
        .collect();
    drop(lines);

    let data = MatrixAssembler::new(args.pca.threads)
        .assemble(rows, &sources)?
        .subsample_rows(args.sample_every)?;

    let normalization = args.normalize.then_some(args.pca.norm);
    let files = args.pca.result_files()?;
    run_pca(data, &args.pca.config(normalization), &files)?;

    info!("Wrote results to {}", args.pca.out);
    Ok(())
}
