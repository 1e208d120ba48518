use clap::Parser;
use log::info;
use std::path::Path;
use std::time::Instant;

use cbcov::{cli, coverage, metrics, report, utils};

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG if --verbose is passed, before env_logger::init()
    let cli = cli::Cli::parse();
    if cli.verbose {
        // Only set if not already set by user
        if std::env::var("RUST_LOG").is_err() {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    let start_time = Instant::now();

    utils::ensure_dir(&cli.output_dir)?;

    let analyzer = coverage::BinCoverageAnalyzer::new(&cli);
    let results = analyzer.analyze_bins(cli.chrom.as_deref())?;

    let output_path = report::report_path(Path::new(&cli.output_dir), &cli.bam, cli.chrom.as_deref());
    let bins_reported = report::write_report(&results, &output_path)?;

    let metrics = metrics::Metrics::new(
        env!("CARGO_PKG_VERSION"),
        &std::env::args().collect::<Vec<String>>().join(" "),
        results.len(),
        bins_reported,
        analyzer.bins_no_reads(),
        start_time.elapsed(),
    );

    info!("{}", serde_json::to_string_pretty(&metrics)?);
    // Write metrics to file if requested
    if cli.metrics_file {
        let bam_stem = utils::file_stem(&cli.bam).unwrap_or_else(|| "metrics".to_string());
        let metrics_path = format!("{}_cbcov.json", bam_stem);
        metrics.write_to_file(&metrics_path)?;
    }

    info!(
        "Analyzed {} bins, reported {}",
        utils::format_with_commas(results.len()),
        utils::format_with_commas(bins_reported)
    );
    info!("Full read coverage analysis complete!");

    Ok(())
}
