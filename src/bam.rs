use itertools::Itertools;
use ndarray::Array2;
use rust_htslib::bam::{self, Read};
use rust_htslib::faidx;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::cli::Cli;
use crate::matrix::CoverageMatrix;

/// How far a drifted call may sit from a reference CpG site and still be
/// snapped onto it during position correction.
pub const CORRECTION_TOLERANCE: u64 = 2;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no reads found in window {chrom}:{start}-{end}")]
    NoReadsInWindow { chrom: String, start: u64, end: u64 },

    #[error("unknown reference sequence: {0}")]
    UnknownReference(String),

    #[error("invalid index while building matrix: {0}")]
    InvalidIndex(String),

    #[error("matrix shape error: {0}")]
    MatrixShape(String),

    #[error("BAM read error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),
}

/// One read's methylation evidence: a call of 1.0 (methylated) or 0.0
/// (unmethylated) at each CpG position the read covers.
#[derive(Debug, Clone, PartialEq)]
pub struct MethylRead {
    pub name: String,
    pub calls: Vec<(u64, f64)>,
}

/// The read-parsing interface the bin coverage engine consumes. The
/// production implementation is [`BamReadParser`]; tests substitute
/// synthetic sources.
pub trait CpgReadSource {
    fn parse_reads(&mut self, chrom: &str, start: u64, end: u64)
        -> Result<Vec<MethylRead>, ParseError>;

    fn create_matrix(&self, reads: &[MethylRead]) -> Result<CoverageMatrix, ParseError>;

    fn correct_cpg_positions(&self, reads: &[MethylRead]) -> Vec<MethylRead>;
}

/// Per-worker configuration for opening a [`BamReadParser`].
#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub bam_path: String,
    pub fasta_path: String,
    pub min_mapq: u8,
    pub mbias_read1_5: u32,
    pub mbias_read1_3: u32,
    pub mbias_read2_5: u32,
    pub mbias_read2_3: u32,
    pub no_overlap: bool,
}

impl ParserConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            bam_path: cli.bam.clone(),
            fasta_path: cli.fasta.clone(),
            min_mapq: cli.min_mapq,
            mbias_read1_5: cli.mbias_read1_5.unwrap_or(0),
            mbias_read1_3: cli.mbias_read1_3.unwrap_or(0),
            mbias_read2_5: cli.mbias_read2_5.unwrap_or(0),
            mbias_read2_3: cli.mbias_read2_3.unwrap_or(0),
            no_overlap: !cli.allow_overlap,
        }
    }
}

/// Reads methylation calls for a genomic interval from an indexed BAM and
/// its reference FASTA. Each worker task opens its own parser; the
/// underlying file handles are never shared between tasks.
pub struct BamReadParser {
    bam: bam::IndexedReader,
    fasta: faidx::Reader,
    config: ParserConfig,
    last_cpg_sites: Vec<u64>,
}

impl BamReadParser {
    pub fn open(config: ParserConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let bam = bam::IndexedReader::from_path(&config.bam_path)
            .context(format!("Failed to open BAM file: {}", config.bam_path))?;
        let fasta = faidx::Reader::from_path(&config.fasta_path)
            .context(format!("Failed to open FASTA file: {}", config.fasta_path))?;

        Ok(Self {
            bam,
            fasta,
            config,
            last_cpg_sites: Vec::new(),
        })
    }
}

impl CpgReadSource for BamReadParser {
    fn parse_reads(
        &mut self,
        chrom: &str,
        start: u64,
        end: u64,
    ) -> Result<Vec<MethylRead>, ParseError> {
        // One base past the interval end so a CpG whose C sits on the last
        // base still has its G visible; htslib clamps past the chromosome
        // end, which covers the final partial bin.
        let seq = self
            .fasta
            .fetch_seq(chrom, start as usize, end as usize)?
            .to_vec();
        let cpg_sites = cpg_sites_in(&seq, start);
        self.last_cpg_sites = cpg_sites.clone();

        let header = self.bam.header().to_owned();
        let tid = header
            .target_names()
            .iter()
            .position(|name| *name == chrom.as_bytes())
            .ok_or_else(|| ParseError::UnknownReference(chrom.to_string()))?;
        self.bam.fetch((tid as u32, start as i64, end as i64))?;

        let mut claimed: HashMap<String, HashSet<u64>> = HashMap::new();
        let mut reads = Vec::new();

        for result in self.bam.records() {
            let rec = result?;
            if rec.is_unmapped() || rec.is_secondary() || rec.is_supplementary() || rec.is_duplicate()
            {
                continue;
            }
            if rec.mapq() < self.config.min_mapq {
                continue;
            }

            let read_seq = rec.seq().as_bytes();
            let read_len = read_seq.len();
            let reverse = rec.is_reverse();
            let (trim5, trim3) = if rec.is_last_in_template() {
                (self.config.mbias_read2_5, self.config.mbias_read2_3)
            } else {
                (self.config.mbias_read1_5, self.config.mbias_read1_3)
            };

            let cigar = rec.cigar();
            let mut calls = Vec::new();
            for &site in &cpg_sites {
                // Reverse-strand reads carry their evidence on the G of the
                // CpG pair.
                let query = if reverse { site + 1 } else { site };
                let offset = match cigar.read_pos(query as u32, false, false)? {
                    Some(offset) => offset as usize,
                    None => continue,
                };
                if offset >= read_len {
                    continue;
                }
                if !mbias_keep(offset, read_len, reverse, trim5, trim3) {
                    continue;
                }
                if let Some(call) = methylation_call(read_seq[offset], reverse) {
                    calls.push((site, call));
                }
            }

            let name = String::from_utf8_lossy(rec.qname()).into_owned();
            if self.config.no_overlap {
                let seen = claimed.entry(name.clone()).or_default();
                calls.retain(|(pos, _)| seen.insert(*pos));
            }
            if !calls.is_empty() {
                reads.push(MethylRead { name, calls });
            }
        }

        if reads.is_empty() {
            return Err(ParseError::NoReadsInWindow {
                chrom: chrom.to_string(),
                start,
                end,
            });
        }

        Ok(reads)
    }

    fn create_matrix(&self, reads: &[MethylRead]) -> Result<CoverageMatrix, ParseError> {
        build_matrix(reads)
    }

    fn correct_cpg_positions(&self, reads: &[MethylRead]) -> Vec<MethylRead> {
        snap_positions(reads, &self.last_cpg_sites, CORRECTION_TOLERANCE)
    }
}

/// Genomic positions of every CpG dinucleotide in `seq`, where `seq`
/// starts at genomic position `offset`. The returned position is that of
/// the C.
pub fn cpg_sites_in(seq: &[u8], offset: u64) -> Vec<u64> {
    seq.windows(2)
        .enumerate()
        .filter(|(_, pair)| {
            pair[0].eq_ignore_ascii_case(&b'C') && pair[1].eq_ignore_ascii_case(&b'G')
        })
        .map(|(i, _)| offset + i as u64)
        .collect()
}

/// Bisulfite methylation call from the read base at a CpG. Forward-strand
/// reads report C (methylated) or T (converted); reverse-strand reads
/// report G or A at the complementary position.
pub fn methylation_call(base: u8, reverse: bool) -> Option<f64> {
    match (base.to_ascii_uppercase(), reverse) {
        (b'C', false) | (b'G', true) => Some(1.0),
        (b'T', false) | (b'A', true) => Some(0.0),
        _ => None,
    }
}

/// Whether a call at `offset` survives positional-bias trimming. `trim5`
/// and `trim3` count bases from the read's 5' and 3' ends; for
/// reverse-strand reads the stored sequence runs 3' to 5'.
pub fn mbias_keep(offset: usize, read_len: usize, reverse: bool, trim5: u32, trim3: u32) -> bool {
    let from_five_prime = if reverse {
        read_len - 1 - offset
    } else {
        offset
    };
    from_five_prime >= trim5 as usize && from_five_prime < read_len.saturating_sub(trim3 as usize)
}

/// Assemble the read x CpG-site matrix. Columns are the sorted union of
/// call positions across all reads; cells without a call are NaN.
pub fn build_matrix(reads: &[MethylRead]) -> Result<CoverageMatrix, ParseError> {
    if reads.is_empty() {
        return Err(ParseError::MatrixShape(
            "no reads to concatenate".to_string(),
        ));
    }

    let positions: Vec<u64> = reads
        .iter()
        .flat_map(|read| read.calls.iter().map(|(pos, _)| *pos))
        .sorted()
        .dedup()
        .collect();

    if positions.is_empty() {
        return Err(ParseError::MatrixShape(
            "reads carry no CpG calls".to_string(),
        ));
    }

    let mut data = Array2::from_elem((reads.len(), positions.len()), f64::NAN);
    for (i, read) in reads.iter().enumerate() {
        for (pos, call) in &read.calls {
            let j = positions
                .binary_search(pos)
                .map_err(|_| ParseError::InvalidIndex(format!("position {} not indexed", pos)))?;
            let cell = data[[i, j]];
            if !cell.is_nan() && cell != *call {
                return Err(ParseError::InvalidIndex(format!(
                    "conflicting calls for read {} at position {}",
                    read.name, pos
                )));
            }
            data[[i, j]] = *call;
        }
    }

    Ok(CoverageMatrix::new(positions, data))
}

/// Remap drifted call positions onto the reference CpG sites. A position
/// already on a site is kept; otherwise it is snapped to the nearest site
/// within `tolerance` bp, or kept unchanged when none is close enough.
pub fn snap_positions(reads: &[MethylRead], sites: &[u64], tolerance: u64) -> Vec<MethylRead> {
    reads
        .iter()
        .map(|read| {
            let calls = read
                .calls
                .iter()
                .map(|&(pos, call)| {
                    if sites.binary_search(&pos).is_ok() {
                        return (pos, call);
                    }
                    let nearest = sites
                        .iter()
                        .min_by_key(|&&site| site.abs_diff(pos))
                        .copied();
                    match nearest {
                        Some(site) if site.abs_diff(pos) <= tolerance => (site, call),
                        _ => (pos, call),
                    }
                })
                .collect();
            MethylRead {
                name: read.name.clone(),
                calls,
            }
        })
        .collect()
}
