use coitrees::{COITree, Interval, IntervalTree};
use matrix_util::common_io::read_lines_of_words_delim;
use std::collections::HashMap;

/// A half-open genomic interval `[start, stop)`, as in BED files
#[derive(Debug, Hash, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Bed {
    pub chr: Box<str>,
    pub start: i64,
    pub stop: i64,
}

/// display bin name
impl std::fmt::Display for Bed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.stop)
    }
}

impl Bed {
    /// Take `chr`, `start` and `stop` from the first three words
    pub fn from_words(words: &[Box<str>], source: &str, row: usize) -> anyhow::Result<Self> {
        if words.len() < 3 {
            anyhow::bail!(
                "expected at least 3 columns in {} (data row {}), found {}",
                source,
                row,
                words.len()
            );
        }

        let position = |x: &str| -> anyhow::Result<i64> {
            x.trim().parse::<i64>().map_err(|_| {
                anyhow::anyhow!("invalid position `{}` in {} (data row {})", x, source, row)
            })
        };

        let start = position(&words[1])?;
        let stop = position(&words[2])?;
        if stop < start {
            anyhow::bail!("stop < start in {} (data row {}): {}-{}", source, row, start, stop);
        }

        Ok(Bed {
            chr: words[0].clone(),
            start,
            stop,
        })
    }
}

/// `chr1`..`chr22` or `1`..`22`
pub fn is_autosome(chr: &str) -> bool {
    let num = chr.strip_prefix("chr").unwrap_or(chr);
    !num.starts_with('0') && num.parse::<u8>().is_ok_and(|n| (1..=22).contains(&n))
}

/// Regions to leave out of the analysis, one interval tree per
/// chromosome
#[derive(Default)]
pub struct ExclusionRegions {
    chr_to_tree: HashMap<Box<str>, COITree<(), u32>>,
}

/// `COITree` coordinates are `i32`
fn coord(x: i64) -> i32 {
    x.clamp(0, i32::MAX as i64) as i32
}

impl ExclusionRegions {
    pub fn new<I: IntoIterator<Item = Bed>>(regions: I) -> Self {
        let mut chr_to_intervals: HashMap<Box<str>, Vec<Interval<()>>> = HashMap::new();
        for bed in regions {
            if bed.stop <= bed.start {
                continue;
            }
            // half-open `[start, stop)` to closed `[start, stop - 1]`
            chr_to_intervals
                .entry(bed.chr)
                .or_default()
                .push(Interval::new(coord(bed.start), coord(bed.stop - 1), ()));
        }

        let chr_to_tree = chr_to_intervals
            .iter()
            .map(|(chr, nodes)| (chr.clone(), COITree::new(nodes)))
            .collect();

        Self { chr_to_tree }
    }

    ///
    /// Read exclusion regions from a BED file (gzipped or not).
    /// `track` and `browser` lines are skipped.
    ///
    pub fn from_bed_file(bed_file: &str) -> anyhow::Result<Self> {
        let lines = read_lines_of_words_delim(bed_file, "\t", None)?.lines;

        let mut regions = Vec::with_capacity(lines.len());
        for (row, words) in lines.iter().enumerate() {
            if words
                .first()
                .is_some_and(|w| w.starts_with("track") || w.starts_with("browser"))
            {
                continue;
            }
            regions.push(Bed::from_words(words, bed_file, row)?);
        }

        Ok(Self::new(regions))
    }

    pub fn num_intervals(&self) -> usize {
        self.chr_to_tree.values().map(|tree| tree.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_intervals() == 0
    }

    /// Does `bed` share at least one base with any excluded region?
    pub fn overlaps(&self, bed: &Bed) -> bool {
        if bed.stop <= bed.start {
            return false;
        }
        self.chr_to_tree.get(&bed.chr).is_some_and(|tree| {
            tree.query_count(coord(bed.start), coord(bed.stop - 1)) > 0
        })
    }
}
