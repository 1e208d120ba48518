use anyhow::{Context, Result};
use log::info;
use rust_htslib::bam::{self, Read};
use std::path::Path;

/// Reference sequence names and lengths, taken from the BAM header.
pub struct Genome {
    pub seqnames: Vec<String>,
    pub lengths: Vec<u64>,
}

impl Genome {
    pub fn from_bam<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Loading chromosome lengths from BAM header: {:?}", path.as_ref());

        let bam = bam::Reader::from_path(path).context("Failed to open BAM file")?;

        let header = bam.header();
        let target_names = header.target_names();

        let mut seqnames = Vec::new();
        let mut lengths = Vec::new();

        for (i, name) in target_names.iter().enumerate() {
            let chrom = std::str::from_utf8(name)
                .context("Failed to parse chromosome name")?
                .to_string();

            let length = header
                .target_len(i as u32)
                .context(format!("Failed to get length for chromosome {}", chrom))?;

            seqnames.push(chrom);
            lengths.push(length);
        }

        if seqnames.is_empty() {
            anyhow::bail!("No chromosomes found in the BAM header");
        }

        Ok(Self { seqnames, lengths })
    }

    /// Keep only the standard chromosomes whose name starts with "chr".
    /// Scaffolds and other non-canonical contigs are dropped; header order
    /// is preserved.
    pub fn remove_scaffolds(self) -> Self {
        let mut seqnames = Vec::new();
        let mut lengths = Vec::new();

        for (chrom, length) in self.seqnames.into_iter().zip(self.lengths) {
            if chrom.starts_with("chr") {
                seqnames.push(chrom);
                lengths.push(length);
            }
        }

        Self { seqnames, lengths }
    }

    /// Restrict the genome to a single chromosome. A request for a
    /// chromosome that is not in the table fails the run.
    pub fn restrict_to(self, chrom: &str) -> Result<Self> {
        let idx = self
            .seqnames
            .iter()
            .position(|name| name == chrom)
            .with_context(|| format!("Chromosome {} not found in BAM header", chrom))?;

        Ok(Self {
            seqnames: vec![self.seqnames[idx].clone()],
            lengths: vec![self.lengths[idx]],
        })
    }

    pub fn len(&self) -> usize {
        self.seqnames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqnames.is_empty()
    }
}
