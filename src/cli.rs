use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Indexed BAM file with aligned bisulfite reads
    #[arg(short = 'b', long)]
    pub bam: String,

    /// Indexed reference FASTA the reads were aligned to
    #[arg(short = 'f', long)]
    pub fasta: String,

    /// Size of the genomic bins in bp
    #[arg(short = 's', long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    pub bin_size: u64,

    /// Number of worker threads per chromosome batch
    #[arg(short = 'p', long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub processors: usize,

    /// Restrict the analysis to a single chromosome, ie "chr7"
    #[arg(short = 'c', long)]
    pub chrom: Option<String>,

    /// Directory the coverage report is written to
    #[arg(short = 'o', long, default_value = ".")]
    pub output_dir: String,

    /// Minimum mapping quality for a read to be used
    #[arg(short = 'q', long, default_value_t = 20)]
    pub min_mapq: u8,

    /// Bases to ignore at the 5' end of read 1
    #[arg(long)]
    pub mbias_read1_5: Option<u32>,

    /// Bases to ignore at the 3' end of read 1
    #[arg(long)]
    pub mbias_read1_3: Option<u32>,

    /// Bases to ignore at the 5' end of read 2
    #[arg(long)]
    pub mbias_read2_5: Option<u32>,

    /// Bases to ignore at the 3' end of read 2
    #[arg(long)]
    pub mbias_read2_3: Option<u32>,

    /// Keep overlapping mate calls instead of counting them once
    #[arg(long)]
    pub allow_overlap: bool,

    /// Also write the run metrics to a JSON file
    #[arg(long)]
    pub metrics_file: bool,

    #[arg(long)]
    pub verbose: bool,
}
