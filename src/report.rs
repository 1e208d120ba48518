use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::coverage::BinResult;

/// Report file path inside `output_dir`:
/// `CompleteBins.<bam-basename>.<chromosome-or-empty>.csv`.
pub fn report_path(output_dir: &Path, bam_path: &str, individual_chrom: Option<&str>) -> PathBuf {
    let basename = Path::new(bam_path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("input");
    output_dir.join(format!(
        "CompleteBins.{}.{}.csv",
        basename,
        individual_chrom.unwrap_or("")
    ))
}

/// Write one `bin_id,read_count,cpg_count` line per bin with a present
/// result, in the order received. Bins with no result are skipped. The
/// file is overwritten if it exists; no header or summary rows.
///
/// Returns the number of lines written.
pub fn write_report(results: &[Option<BinResult>], path: &Path) -> Result<usize> {
    let file =
        File::create(path).with_context(|| format!("Failed to create report file {:?}", path))?;
    let mut out = BufWriter::new(file);

    let mut written = 0;
    for (bin, matrix) in results.iter().flatten() {
        writeln!(out, "{},{},{}", bin.id(), matrix.n_reads(), matrix.n_sites())
            .with_context(|| format!("Failed to write report file {:?}", path))?;
        written += 1;
    }
    out.flush()
        .with_context(|| format!("Failed to write report file {:?}", path))?;

    info!("Wrote {} bins to {:?}", written, path);
    Ok(written)
}
