//src/input.rs

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{ProfileError, Result};

/// Opens a profile for line reading; `.gz` files are decompressed on the fly.
pub fn open_profile<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|e| ProfileError::io(path, e))?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };
    Ok(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const PROFILE: &str = "#mpa_vJun23_CHOCOPhlAnSGB_202307\nUNCLASSIFIED\t-1\t5.0\t\n";

    #[test]
    fn reads_plain_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.txt");
        std::fs::write(&path, PROFILE).unwrap();

        let lines: Vec<String> = open_profile(&path).unwrap().lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["#mpa_vJun23_CHOCOPhlAnSGB_202307", "UNCLASSIFIED\t-1\t5.0\t"]);
    }

    #[test]
    fn reads_gzipped_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.txt.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(PROFILE.as_bytes()).unwrap();
        enc.finish().unwrap();

        let lines: Vec<String> = open_profile(&path).unwrap().lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "UNCLASSIFIED\t-1\t5.0\t");
    }

    #[test]
    fn missing_file_names_path() {
        let err = open_profile("/nonexistent/profile_9f8a2.txt").err().unwrap();
        assert!(err.to_string().contains("profile_9f8a2.txt"));
    }
}
