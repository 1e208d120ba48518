use anyhow::Result;
use std::path::Path;

pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

pub fn file_stem<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .file_stem()
        .and_then(|s| s.to_str())
        .map(String::from)
}

pub fn format_with_commas(num: usize) -> String {
    let mut s = String::new();
    let num_str = num.to_string();
    let len = num_str.len();

    for (i, c) in num_str.chars().enumerate() {
        s.push(c);
        if (len - i - 1) % 3 == 0 && i < len - 1 {
            s.push(',');
        }
    }

    s
}
