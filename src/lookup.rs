//src/lookup.rs

use ahash::AHashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{ProfileError, Result};

/// Corrected lineage and NCBI taxid path for one Oct22 lineage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub lineage: String,
    pub taxid: String,
}

/// old lineage -> correction
pub type CorrectionTable = AHashMap<String, Correction>;
/// SGB id (e.g. `SGB4933`) -> GTDB lineage
pub type SgbTable = AHashMap<String, String>;

pub const CORRECTION_TABLE_FILE: &str = "oct22_fix_tax.tsv";
pub const SGB2GTDB_SUFFIX: &str = "_SGB2GTDB.tsv";
pub const LATEST_DATABASE_FILE: &str = "mpa_latest";
pub const LATEST_DATABASE: &str = "latest";

fn open_table(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| ProfileError::io(path, e))
}

/// Parses the Oct22 correction table:
/// ```text
/// <old_lineage>\t<new_lineage>\t<new_taxid>
/// ```
/// The first line is a header. Lines with fewer than three fields are skipped.
pub fn parse_correction_table<P: AsRef<Path>>(path: P) -> Result<CorrectionTable> {
    let path = path.as_ref();
    let reader = open_table(path)?;
    let mut table = CorrectionTable::new();

    for (idx, line_result) in reader.lines().enumerate().skip(1) {
        let line = line_result?;
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 3 {
            if !line.trim().is_empty() {
                log::warn!("{}:{}: skipping malformed correction", path.display(), idx + 1);
            }
            continue;
        }
        table.insert(
            parts[0].to_string(),
            Correction {
                lineage: parts[1].to_string(),
                taxid: parts[2].trim().to_string(),
            },
        );
    }
    log::info!("Loaded {} taxonomy corrections from {}", table.len(), path.display());
    Ok(table)
}

/// Parses a two-column `<sgb_id>\t<gtdb_lineage>` table (no header).
pub fn parse_sgb_table<P: AsRef<Path>>(path: P) -> Result<SgbTable> {
    let path = path.as_ref();
    let reader = open_table(path)?;
    let mut table = SgbTable::new();

    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let parts: Vec<&str> = line.trim().split('\t').collect();
        if parts.len() < 2 {
            if !line.trim().is_empty() {
                log::warn!("{}:{}: skipping malformed SGB mapping", path.display(), idx + 1);
            }
            continue;
        }
        table.insert(parts[0].to_string(), parts[1].to_string());
    }
    log::info!("Loaded {} SGB to GTDB mappings from {}", table.len(), path.display());
    Ok(table)
}

/// Resolves the `--database` selector to a database name.
///
/// `latest` is read from the `mpa_latest` file in `tables_dir`; a path to a
/// database file resolves to its file stem; anything else is taken as a name.
pub fn resolve_database_name(tables_dir: &Path, selector: &str) -> Result<String> {
    if selector == LATEST_DATABASE {
        let latest_path = tables_dir.join(LATEST_DATABASE_FILE);
        let content = fs::read_to_string(&latest_path).map_err(|e| ProfileError::io(&latest_path, e))?;
        return content
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ProfileError::Configuration(format!("{} is empty", latest_path.display()))
            });
    }
    let path = Path::new(selector);
    if path.extension().is_some_and(|ext| ext == "pkl") {
        if let Some(stem) = path.file_stem() {
            return Ok(stem.to_string_lossy().into_owned());
        }
    }
    Ok(selector.to_string())
}

pub fn sgb_table_path(tables_dir: &Path, database: &str) -> PathBuf {
    tables_dir.join(format!("{database}{SGB2GTDB_SUFFIX}"))
}

pub fn correction_table_path(tables_dir: &Path) -> PathBuf {
    tables_dir.join(CORRECTION_TABLE_FILE)
}
