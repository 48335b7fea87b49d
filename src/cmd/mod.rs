pub mod assess;
pub mod monitor;
pub mod penalty;
pub mod score;

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read a JSON request from a file, or stdin with "-"
pub fn read_json_request<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    if path.as_os_str() == "-" {
        let stdin = io::stdin();
        let mut reader = BufReader::new(stdin.lock());
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        if buffer.is_empty() {
            anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
        }
        Ok(serde_json::from_slice(&buffer)?)
    } else {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}
