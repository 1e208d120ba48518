use std::fmt;

use crate::genome::Genome;

/// One fixed-size genomic bin, identified by chromosome and end coordinate.
/// The interval it denotes is (end - bin_size, end].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bin {
    pub chrom: String,
    pub end: u64,
}

impl Bin {
    pub fn new(chrom: &str, end: u64) -> Self {
        Self {
            chrom: chrom.to_string(),
            end,
        }
    }

    /// Serialized identifier, ex: "chr19_4343400"
    pub fn id(&self) -> String {
        format!("{}_{}", self.chrom, self.end)
    }

    pub fn start(&self, bin_size: u64) -> u64 {
        self.end.saturating_sub(bin_size)
    }
}

impl fmt::Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.chrom, self.end)
    }
}

/// Enumerate every bin of each chromosome, in header order.
///
/// For a chromosome of length L the bin ends are B, 2B, ... ceil(L/B)*B,
/// so the last bin may overrun the chromosome end by up to B-1 bases.
/// Callers must tolerate that final partial bin.
pub fn generate_bins_list(genome: &Genome, bin_size: u64) -> Vec<(String, Vec<Bin>)> {
    genome
        .seqnames
        .iter()
        .zip(genome.lengths.iter())
        .map(|(chrom, &length)| {
            let count = (length + bin_size - 1) / bin_size;
            let bins = (1..=count)
                .map(|k| Bin::new(chrom, k * bin_size))
                .collect();
            (chrom.clone(), bins)
        })
        .collect()
}
