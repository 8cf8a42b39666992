use crate::common::*;
use ngs_pca::bed::ExclusionRegions;
use ngs_pca::mosdepth::*;

#[derive(Args, Debug)]
pub struct MosdepthArgs {
    /// directory of `*.regions.bed.gz` files, or a file listing them
    #[arg(required = true)]
    input: Box<str>,

    /// BED file of regions to exclude
    #[arg(short = 'x', long)]
    exclude_bed: Option<Box<str>>,

    /// keep every n-th bin after exclusion
    #[arg(long, default_value_t = 1)]
    sample_every: usize,

    #[command(flatten)]
    pca: PcaArgs,
}

/// Principal components of mosdepth region coverage
pub fn run_mosdepth(args: &MosdepthArgs) -> anyhow::Result<()> {
    if args.pca.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let files = discover_inputs(&args.input)?;

    let exclude = match &args.exclude_bed {
        Some(bed_file) => {
            let excl = ExclusionRegions::from_bed_file(bed_file)?;
            info!("Excluding {} regions in {}", excl.num_intervals(), bed_file);
            excl
        }
        None => ExclusionRegions::default(),
    };

    let regions = select_regions(&files[0], &exclude, args.sample_every)?;

    let sources = files
        .iter()
        .map(|f| MosdepthFile::new(f, &regions))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let rows: NamedAxis = regions
        .iter()
        .map(|x| x.to_string().into_boxed_str())
        .collect();

    let data = MatrixAssembler::new(args.pca.threads).assemble(rows, &sources)?;

    let files = args.pca.result_files()?;
    run_pca(data, &args.pca.config(Some(args.pca.norm)), &files)?;

    info!("Wrote results to {}", args.pca.out);
    Ok(())
}
