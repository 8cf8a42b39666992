use log::warn;

/// How a cell that is not a finite number is handled
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParsePolicy {
    /// Stop with an error naming the source and the row
    #[default]
    FailFast,
    /// Substitute this value and report the substitution
    Default(f64),
}

///
/// Parse a single coverage value
///
/// * `cell` - text to parse
/// * `policy` - what to do if `cell` is not a finite number
/// * `source` - file (or sample) name for messages
/// * `row` - 0-based data row (header not counted) for messages
///
pub fn parse_value(cell: &str, policy: ParsePolicy, source: &str, row: usize) -> anyhow::Result<f64> {
    parse_cell(cell, policy, source, row, None)
}

///
/// Parse a row of text cells into `f64` values
///
/// * `cells` - text cells in column order
/// * `policy` - what to do with non-numeric cells
/// * `source` - file name for messages
/// * `row` - 0-based data row (header not counted) for messages
///
pub fn parse_row<S: AsRef<str>>(
    cells: &[S],
    policy: ParsePolicy,
    source: &str,
    row: usize,
) -> anyhow::Result<Vec<f64>> {
    cells
        .iter()
        .enumerate()
        .map(|(j, x)| parse_cell(x.as_ref(), policy, source, row, Some(j)))
        .collect()
}

fn parse_cell(
    cell: &str,
    policy: ParsePolicy,
    source: &str,
    row: usize,
    column: Option<usize>,
) -> anyhow::Result<f64> {
    // `NaN` and `inf` parse as f64, but are not coverage values
    match cell.trim().parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(x),
        _ => {
            let location = match column {
                Some(j) => format!("{} (data row {}, column {})", source, row, j),
                None => format!("{} (data row {})", source, row),
            };
            match policy {
                ParsePolicy::FailFast => Err(anyhow::anyhow!(
                    "invalid (non-numeric) coverage value `{}` in {}",
                    cell,
                    location
                )),
                ParsePolicy::Default(value) => {
                    warn!(
                        "non-numeric coverage value `{}` in {}, substituted {}",
                        cell, location, value
                    );
                    Ok(value)
                }
            }
        }
    }
}

/// Median ignoring `NaN` entries; `NaN` if nothing is left
pub fn nan_median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    sorted.sort_unstable_by(f64::total_cmp);
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Mean and sample standard deviation ignoring `NaN` entries
pub fn nan_mean_sd(values: &[f64]) -> (f64, f64) {
    let kept: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    let n = kept.len() as f64;
    if kept.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let mean = kept.iter().sum::<f64>() / n;
    if kept.len() < 2 {
        return (mean, f64::NAN);
    }
    let ss = kept.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>();
    (mean, (ss / (n - 1.0)).sqrt())
}
