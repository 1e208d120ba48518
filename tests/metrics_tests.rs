use anyhow::Result;
use cbcov::metrics::Metrics;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_metrics_creation() {
    let version = "0.1.0";
    let command = "cbcov -b test.bam -f ref.fa";
    let elapsed = Duration::from_secs(60);

    let metrics = Metrics::new(version, command, 1000, 750, 120, elapsed);

    assert_eq!(metrics.version, version);
    assert_eq!(metrics.command, command);
    assert_eq!(metrics.bins_analyzed, 1000);
    assert_eq!(metrics.bins_reported, 750);
    assert_eq!(metrics.bins_no_reads, 120);

    assert!(metrics.elapsed.contains("60s"));
}

#[test]
fn test_write_to_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("test_metrics.json");

    let version = "0.1.0";
    let command = "cbcov -b test.bam -f ref.fa";
    let elapsed = Duration::from_secs(60);

    let metrics = Metrics::new(version, command, 1000, 750, 120, elapsed);

    metrics.write_to_file(file_path.to_str().unwrap())?;

    assert!(file_path.exists());

    let contents = fs::read_to_string(file_path)?;

    assert!(contents.contains("\"cbcov_version\""));
    assert!(contents.contains("\"date\""));
    assert!(contents.contains("\"elapsed\""));
    assert!(contents.contains("\"command\""));
    assert!(contents.contains("\"bins_analyzed\""));
    assert!(contents.contains("\"bins_reported\""));
    assert!(contents.contains("\"bins_no_reads\""));

    assert!(contents.contains(&format!("\"cbcov_version\": \"{}\"", version)));
    assert!(contents.contains(&format!("\"command\": \"{}\"", command)));
    assert!(contents.contains("\"bins_analyzed\": 1000"));

    Ok(())
}
