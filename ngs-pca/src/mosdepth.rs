use crate::assemble::CoverageSource;
use crate::bed::{is_autosome, Bed, ExclusionRegions};
use log::info;
use matrix_util::common_io::{basename_without, list_files_with_suffix, read_lines, read_lines_of_words_delim};
use matrix_util::numeric::{parse_value, ParsePolicy};
use std::path::Path;

/// Per-region output of `mosdepth --by`
pub const MOSDEPTH_BED_EXT: &str = ".regions.bed.gz";

///
/// Find mosdepth region files
///
/// * `input` - either a directory, searched recursively for
///   `*.regions.bed.gz`, or a text file listing one file per line
///
pub fn discover_inputs(input: &str) -> anyhow::Result<Vec<Box<str>>> {
    let files = if Path::new(input).is_dir() {
        info!("Searching {} for *{} files", input, MOSDEPTH_BED_EXT);
        list_files_with_suffix(input, MOSDEPTH_BED_EXT)?
    } else {
        info!("Reading the list of input files from {}", input);
        read_lines(input)?
            .into_iter()
            .map(|x| x.trim().to_string().into_boxed_str())
            .filter(|x| !x.is_empty())
            .collect()
    };

    if files.is_empty() {
        anyhow::bail!("no {} files found in {}", MOSDEPTH_BED_EXT, input);
    }

    info!("Found {} input files", files.len());
    Ok(files)
}

///
/// Choose the bins of the analysis from one region file: autosomes
/// only, without any bin overlapping `exclude`, then every
/// `sample_every`-th of the rest.
///
pub fn select_regions(
    region_file: &str,
    exclude: &ExclusionRegions,
    sample_every: usize,
) -> anyhow::Result<Vec<Bed>> {
    info!("Selecting autosomal regions from {}", region_file);
    if exclude.is_empty() {
        info!("No regions to exclude");
    }

    let lines = read_lines_of_words_delim(region_file, "\t", None)?.lines;

    let mut autosomal = 0;
    let mut regions = vec![];
    for (row, words) in lines.iter().enumerate() {
        let bed = Bed::from_words(words, region_file, row)?;
        if !is_autosome(&bed.chr) {
            continue;
        }
        autosomal += 1;
        if !exclude.overlaps(&bed) {
            regions.push(bed);
        }
    }

    info!(
        "{} autosomal regions, {} after exclusion",
        autosomal,
        regions.len()
    );

    let regions: Vec<Bed> = regions.into_iter().step_by(sample_every.max(1)).collect();

    if regions.is_empty() {
        anyhow::bail!("no regions selected from {}", region_file);
    }

    info!("Using {} regions", regions.len());
    Ok(regions)
}

/// One sample's mosdepth region file, read for the selected bins
pub struct MosdepthFile<'a> {
    pub name: Box<str>,
    pub file: Box<str>,
    pub regions: &'a [Bed],
}

impl<'a> MosdepthFile<'a> {
    /// Sample name is the file name without `.regions.bed.gz`
    pub fn new(file: &str, regions: &'a [Bed]) -> anyhow::Result<Self> {
        Ok(Self {
            name: basename_without(file, MOSDEPTH_BED_EXT)?,
            file: file.into(),
            regions,
        })
    }
}

impl CoverageSource for MosdepthFile<'_> {
    fn sample_name(&self) -> &str {
        &self.name
    }

    /// Walk the file once, taking the 4th column of each selected
    /// region. The selected regions must appear in the same order.
    fn load_coverage(&self) -> anyhow::Result<Vec<f64>> {
        let lines = read_lines_of_words_delim(&self.file, "\t", None)?.lines;

        let mut values = Vec::with_capacity(self.regions.len());
        let mut next = self.regions.iter().peekable();

        for (row, words) in lines.iter().enumerate() {
            let Some(&expected) = next.peek() else {
                break;
            };
            let bed = Bed::from_words(words, &self.file, row)?;
            if bed != *expected {
                continue;
            }
            let cell = words.get(3).ok_or_else(|| {
                anyhow::anyhow!("no coverage column in {} (data row {})", self.file, row)
            })?;
            values.push(parse_value(cell, ParsePolicy::FailFast, &self.file, row)?);
            next.next();
        }

        if let Some(missing) = next.next() {
            anyhow::bail!(
                "sample {}: region {} not found in {} (or out of order); {} of {} regions matched",
                self.name,
                missing,
                self.file,
                values.len(),
                self.regions.len()
            );
        }

        Ok(values)
    }
}
