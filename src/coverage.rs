use anyhow::Result;
use log::{debug, error, info};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::bam::{BamReadParser, CpgReadSource, ParseError, ParserConfig};
use crate::bins::{generate_bins_list, Bin};
use crate::cli::Cli;
use crate::genome::Genome;
use crate::matrix::CoverageMatrix;

/// Interval between progress log lines while a chromosome batch runs.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(60);

pub type BinResult = (Bin, CoverageMatrix);

/// Compute the coverage matrix for a single bin.
///
/// Returns `None` when the window holds no reads or an unrecoverable
/// per-bin error occurs; a present result with zero rows is valid. When
/// the initial complete-rows matrix is empty, one recovery attempt is
/// made with coordinate-corrected reads.
pub fn calculate_bin_coverage<S: CpgReadSource>(
    source: &mut S,
    bin: &Bin,
    bin_size: u64,
    bins_no_reads: &AtomicUsize,
) -> Option<BinResult> {
    let start = bin.start(bin_size);

    let reads = match source.parse_reads(&bin.chrom, start, bin.end) {
        Ok(reads) => reads,
        Err(ParseError::NoReadsInWindow { .. }) => {
            bins_no_reads.fetch_add(1, Ordering::Relaxed);
            debug!("No reads in bin {}", bin);
            return None;
        }
        Err(e) => {
            error!("Failed to fetch reads for bin {}: {}", bin, e);
            return None;
        }
    };

    let matrix = match source.create_matrix(&reads) {
        Ok(matrix) => matrix,
        Err(e) => {
            error!("Failed to build matrix for bin {}: {}", bin, e);
            return None;
        }
    };

    // Reads with no call at all are dropped first, then any read missing a
    // call at one or more sites.
    let mut matrix = matrix.drop_empty_rows().drop_incomplete_rows();

    // If no read covers every site, attempt to create the matrix with
    // corrected CpG positions before giving up.
    if matrix.is_empty() {
        let original = matrix.clone();
        let corrected = source.correct_cpg_positions(&reads);
        match source.create_matrix(&corrected) {
            Ok(rebuilt) => matrix = rebuilt,
            Err(e @ ParseError::InvalidIndex(_)) => {
                error!("Invalid index error when creating matrices at bin {}", bin);
                debug!("{}", e);
                return Some((bin.clone(), original));
            }
            Err(e) => {
                error!("Matrix concat error at bin {}", bin);
                debug!("{}", e);
            }
        }

        matrix = matrix.drop_incomplete_rows();
        if matrix.is_empty() {
            info!("Correction attempt at bin {}: FAILED", bin);
        } else {
            info!("Correction attempt at bin {}: SUCCESS", bin);
        }
    }

    Some((bin.clone(), matrix))
}

/// Run one chromosome's bins through a fixed-size worker pool.
///
/// Every task opens its own read source via `open_source`; results come
/// back in submission order. A monitor thread logs the remaining task
/// count at a fixed interval until the batch completes; it never affects
/// the completion condition.
pub fn run_chromosome_batch<S, F>(
    chrom: &str,
    bins: &[Bin],
    workers: usize,
    bin_size: u64,
    progress_interval: Duration,
    open_source: F,
    bins_no_reads: &AtomicUsize,
) -> Result<Vec<Option<BinResult>>>
where
    S: CpgReadSource,
    F: Fn() -> Result<S> + Sync,
{
    let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
    let total = bins.len();
    let completed = AtomicUsize::new(0);
    let done = AtomicBool::new(false);

    let results = thread::scope(|scope| {
        scope.spawn(|| {
            let nap = Duration::from_millis(50);
            loop {
                if done.load(Ordering::Relaxed) {
                    break;
                }
                let remaining = total - completed.load(Ordering::Relaxed);
                if remaining > 0 {
                    info!("Tasks remaining on {}: {}", chrom, remaining);
                }
                let mut waited = Duration::ZERO;
                while waited < progress_interval && !done.load(Ordering::Relaxed) {
                    thread::sleep(nap);
                    waited += nap;
                }
            }
        });

        let results: Vec<Option<BinResult>> = pool.install(|| {
            bins.par_iter()
                .map(|bin| {
                    let result = match open_source() {
                        Ok(mut source) => {
                            calculate_bin_coverage(&mut source, bin, bin_size, bins_no_reads)
                        }
                        Err(e) => {
                            error!("Failed to open read source for bin {}: {:#}", bin, e);
                            None
                        }
                    };
                    completed.fetch_add(1, Ordering::Relaxed);
                    result
                })
                .collect()
        });

        done.store(true, Ordering::Relaxed);
        results
    });

    Ok(results)
}

/// Orchestrates the whole analysis: chromosome table, bin enumeration,
/// per-chromosome worker pools, and result aggregation.
pub struct BinCoverageAnalyzer {
    parser_config: ParserConfig,
    bin_size: u64,
    processors: usize,
    bins_no_reads: AtomicUsize,
}

impl BinCoverageAnalyzer {
    pub fn new(cli: &Cli) -> Self {
        Self {
            parser_config: ParserConfig::from_cli(cli),
            bin_size: cli.bin_size,
            processors: cli.processors,
            bins_no_reads: AtomicUsize::new(0),
        }
    }

    /// Bins whose window held no reads, accumulated across all workers.
    pub fn bins_no_reads(&self) -> usize {
        self.bins_no_reads.load(Ordering::Relaxed)
    }

    /// Run the complete analysis, optionally restricted to one chromosome.
    ///
    /// Chromosomes are processed strictly one after another; the bins of
    /// each chromosome run in parallel on a pool of `processors` workers.
    /// The returned sequence preserves chromosome order and
    /// within-chromosome bin order, with `None` entries for bins that
    /// produced no result.
    pub fn analyze_bins(&self, individual_chrom: Option<&str>) -> Result<Vec<Option<BinResult>>> {
        let genome = Genome::from_bam(&self.parser_config.bam_path)?.remove_scaffolds();
        let genome = match individual_chrom {
            Some(chrom) => genome.restrict_to(chrom)?,
            None => genome,
        };

        let bins_to_analyze = generate_bins_list(&genome, self.bin_size);

        let mut final_results = Vec::new();
        for (chrom, bins) in &bins_to_analyze {
            info!("Analyzing {} bins on {}", bins.len(), chrom);
            let results = run_chromosome_batch(
                chrom,
                bins,
                self.processors,
                self.bin_size,
                PROGRESS_INTERVAL,
                || BamReadParser::open(self.parser_config.clone()),
                &self.bins_no_reads,
            )?;
            final_results.extend(results);
        }

        info!("Analysis complete");
        Ok(final_results)
    }
}
