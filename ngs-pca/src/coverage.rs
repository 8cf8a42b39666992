use nalgebra::DMatrix;

/// Ordered identifiers of one matrix axis (bins or samples)
pub type NamedAxis = Vec<Box<str>>;

/// Dense `bins x samples` read-depth matrix with its axis names
///
/// * `rows` - bin identifiers, e.g., `chr1:0-1000`
/// * `cols` - sample identifiers
/// * `mat` - coverage (raw or normalized)
#[derive(Debug, Clone)]
pub struct CoverageMatrix {
    pub rows: NamedAxis,
    pub cols: NamedAxis,
    pub mat: DMatrix<f64>,
}

impl CoverageMatrix {
    pub fn new(rows: NamedAxis, cols: NamedAxis, mat: DMatrix<f64>) -> anyhow::Result<Self> {
        let ret = Self { rows, cols, mat };
        ret.check_dimensions()?;
        Ok(ret)
    }

    pub fn num_bins(&self) -> usize {
        self.mat.nrows()
    }

    pub fn num_samples(&self) -> usize {
        self.mat.ncols()
    }

    /// Names must match the matrix shape
    pub fn check_dimensions(&self) -> anyhow::Result<()> {
        if self.mat.nrows() != self.rows.len() {
            anyhow::bail!(
                "mismatched row lengths: {} matrix rows vs. {} row names",
                self.mat.nrows(),
                self.rows.len()
            );
        }
        if self.mat.ncols() != self.cols.len() {
            anyhow::bail!(
                "mismatched column lengths: {} matrix columns vs. {} column names",
                self.mat.ncols(),
                self.cols.len()
            );
        }
        Ok(())
    }

    /// Keep every `every`-th bin, starting from the first
    pub fn subsample_rows(self, every: usize) -> anyhow::Result<Self> {
        if every <= 1 {
            return Ok(self);
        }
        let keep: Vec<usize> = (0..self.num_bins()).step_by(every).collect();
        let rows = keep.iter().map(|&i| self.rows[i].clone()).collect();
        let mat = self.mat.select_rows(keep.iter());
        Self::new(rows, self.cols, mat)
    }
}
