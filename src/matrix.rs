use ndarray::{Array2, Axis};

/// Read-by-CpG-site coverage table for one bin.
///
/// Rows are reads, columns are CpG genomic positions. Cells hold the
/// methylation call (1.0 methylated, 0.0 unmethylated) or NaN when the
/// read has no call at that site.
#[derive(Debug, Clone)]
pub struct CoverageMatrix {
    positions: Vec<u64>,
    data: Array2<f64>,
}

impl CoverageMatrix {
    pub fn new(positions: Vec<u64>, data: Array2<f64>) -> Self {
        Self { positions, data }
    }

    /// Number of reads (rows).
    pub fn n_reads(&self) -> usize {
        self.data.nrows()
    }

    /// Number of CpG sites (columns).
    pub fn n_sites(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_reads() == 0
    }

    pub fn positions(&self) -> &[u64] {
        &self.positions
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[[row, col]]
    }

    /// Drop rows with no call at any site.
    pub fn drop_empty_rows(&self) -> Self {
        self.retain_rows(|row| !row.iter().all(|v| v.is_nan()))
    }

    /// Drop rows missing a call at one or more sites; only reads with a
    /// call at every CpG site in the bin survive.
    pub fn drop_incomplete_rows(&self) -> Self {
        self.retain_rows(|row| !row.iter().any(|v| v.is_nan()))
    }

    fn retain_rows<F>(&self, keep: F) -> Self
    where
        F: Fn(ndarray::ArrayView1<f64>) -> bool,
    {
        if self.n_sites() == 0 {
            return self.clone();
        }

        let indices: Vec<usize> = self
            .data
            .axis_iter(Axis(0))
            .enumerate()
            .filter(|(_, row)| keep(row.view()))
            .map(|(i, _)| i)
            .collect();

        Self {
            positions: self.positions.clone(),
            data: self.data.select(Axis(0), &indices),
        }
    }
}
