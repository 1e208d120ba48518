use anyhow::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug)]
pub struct Metrics {
    #[serde(rename = "cbcov_version")]
    pub version: String,
    pub date: String,
    pub elapsed: String,
    pub command: String,
    pub bins_analyzed: usize,
    pub bins_reported: usize,
    pub bins_no_reads: usize,
}

impl Metrics {
    pub fn new(
        version: &str,
        command: &str,
        bins_analyzed: usize,
        bins_reported: usize,
        bins_no_reads: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            version: version.to_string(),
            date: Local::now().format("%Y-%m-%d %I:%M:%S %p").to_string(),
            elapsed: format!("{:?}", elapsed),
            command: command.to_string(),
            bins_analyzed,
            bins_reported,
            bins_no_reads,
        }
    }

    pub fn write_to_file(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}
