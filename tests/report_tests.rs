use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use cbcov::bam::{build_matrix, MethylRead};
use cbcov::bins::Bin;
use cbcov::coverage::BinResult;
use cbcov::report::{report_path, write_report};

fn read(name: &str, calls: &[(u64, f64)]) -> MethylRead {
    MethylRead {
        name: name.to_string(),
        calls: calls.to_vec(),
    }
}

fn complete_result(chrom: &str, end: u64, n_reads: usize) -> Option<BinResult> {
    let reads: Vec<MethylRead> = (0..n_reads)
        .map(|i| read(&format!("r{}", i), &[(end - 50, 1.0), (end - 20, 0.0)]))
        .collect();
    let matrix = build_matrix(&reads).unwrap();
    Some((Bin::new(chrom, end), matrix))
}

fn empty_result(chrom: &str, end: u64) -> Option<BinResult> {
    // Two reads at disjoint positions leave no complete rows
    let reads = vec![
        read("r0", &[(end - 50, 1.0)]),
        read("r1", &[(end - 20, 0.0)]),
    ];
    let matrix = build_matrix(&reads).unwrap().drop_incomplete_rows();
    Some((Bin::new(chrom, end), matrix))
}

#[test]
fn test_report_path_with_chromosome() {
    let path = report_path(Path::new("/tmp/out"), "/data/sample.bam", Some("chr19"));

    assert_eq!(
        path,
        Path::new("/tmp/out/CompleteBins.sample.bam.chr19.csv")
    );
}

#[test]
fn test_report_path_without_chromosome() {
    let path = report_path(Path::new("out"), "sample.bam", None);

    assert_eq!(path, Path::new("out/CompleteBins.sample.bam..csv"));
}

#[test]
fn test_write_report_skips_absent_results() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("report.csv");

    let results = vec![
        complete_result("chr1", 100, 3),
        None,
        empty_result("chr1", 300),
        complete_result("chr1", 400, 1),
        None,
    ];

    let written = write_report(&results, &path)?;

    assert_eq!(written, 3);

    let contents = fs::read_to_string(&path)?;
    let lines: Vec<&str> = contents.lines().collect();

    assert_eq!(lines.len(), 3, "no lines for absent results, no header");
    assert_eq!(lines[0], "chr1_100,3,2");
    assert_eq!(lines[1], "chr1_300,0,2", "empty matrices are still reported");
    assert_eq!(lines[2], "chr1_400,1,2");

    Ok(())
}

#[test]
fn test_write_report_overwrites_existing_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("report.csv");

    write_report(&[complete_result("chr1", 100, 2)], &path)?;
    write_report(&[complete_result("chr2", 200, 5)], &path)?;

    let contents = fs::read_to_string(&path)?;

    assert_eq!(contents, "chr2_200,5,2\n");

    Ok(())
}

#[test]
fn test_write_report_to_missing_directory_fails() {
    let results = vec![complete_result("chr1", 100, 1)];

    let result = write_report(&results, Path::new("/nonexistent-dir/report.csv"));

    assert!(result.is_err());
}
