//src/profile_loader.rs

use std::io::BufRead;

use crate::aggregate::RankAggregator;
use crate::config::{HeaderPolicy, PipelineConfig, UnclassifiedLine};
use crate::error::{ProfileError, Result};
use crate::label_fixer::{LabelFixer, LeafRow};
use crate::profile_writer::format_values;
use crate::types::{rewrite_header_date, AbundanceCell, CellShape, CladeMeta, Lineage, TaxonEntry};

pub const UNCLASSIFIED: &str = "UNCLASSIFIED";
pub const COLUMN_HEADER_TOKEN: &str = "clade_name";

/// Everything read from one input profile.
#[derive(Debug)]
pub struct LoadedProfile {
    /// Release tag from the header, without the leading `#`.
    pub release: Option<String>,
    /// Header, comment and unclassified lines to write before the taxa.
    pub preamble: Vec<String>,
    pub unclassified: Option<AbundanceCell>,
    pub shape: CellShape,
    pub aggregator: RankAggregator,
    pub leaf_rows: usize,
}

impl LoadedProfile {
    /// Unclassified values, or zeros when the profile had no such row.
    pub fn unclassified_values(&self) -> Vec<f64> {
        self.unclassified
            .as_ref()
            .map(|cell| cell.values().to_vec())
            .unwrap_or_else(|| vec![0.0; self.shape.width()])
    }
}

fn parse_value(field: &str, line_no: usize) -> Result<f64> {
    field.trim().parse::<f64>().map_err(|_| ProfileError::Malformed {
        line: line_no,
        message: format!("invalid abundance {:?}", field.trim()),
    })
}

fn parse_values(fields: &[&str], line_no: usize) -> Result<Vec<f64>> {
    fields.iter().map(|f| parse_value(f, line_no)).collect()
}

/// Single sample: `UNCLASSIFIED\t-1\t<value>`; merged: `UNCLASSIFIED\t<v1>\t<v2>…`.
fn parse_unclassified(line: &str, merged: bool, line_no: usize) -> Result<AbundanceCell> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if merged {
        return Ok(AbundanceCell::Vector(parse_values(&fields[1..], line_no)?));
    }
    let field = fields.get(2).ok_or_else(|| ProfileError::Malformed {
        line: line_no,
        message: "UNCLASSIFIED row has no abundance column".to_string(),
    })?;
    Ok(AbundanceCell::Scalar(parse_value(field, line_no)?))
}

fn parse_leaf(line: &str, merged: bool, line_no: usize) -> Result<LeafRow> {
    let fields: Vec<&str> = line.trim().split('\t').collect();
    if merged {
        return Ok(LeafRow {
            lineage: fields[0].to_string(),
            abundance: AbundanceCell::Vector(parse_values(&fields[1..], line_no)?),
            clade: None,
        });
    }
    if fields.len() < 3 {
        return Err(ProfileError::Malformed {
            line: line_no,
            message: format!("expected at least 3 columns, found {}", fields.len()),
        });
    }
    Ok(LeafRow {
        lineage: fields[0].to_string(),
        abundance: AbundanceCell::Scalar(parse_value(fields[2], line_no)?),
        clade: Some(CladeMeta {
            taxid: fields[1].to_string(),
            additional_species: if fields.len() == 4 {
                fields[3].to_string()
            } else {
                String::new()
            },
        }),
    })
}

/// Reads a profile line by line, relabels its leaf rows with `fixer` and
/// collects them into the deepest rank of a fresh [`RankAggregator`].
pub fn load_profile<R: BufRead>(
    reader: R,
    config: &PipelineConfig,
    fixer: &dyn LabelFixer,
) -> Result<LoadedProfile> {
    let mut aggregator = RankAggregator::new(config.ranks, config.separator);
    let mut release: Option<String> = None;
    let mut preamble = Vec::new();
    let mut unclassified: Option<AbundanceCell> = None;
    let mut ncols: Option<usize> = None;
    let mut leaf_rows = 0;

    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let line_no = idx + 1;

        if line.starts_with(config.header_marker) {
            release = Some(line.trim()[1..].to_string());
            match config.header {
                HeaderPolicy::RewriteDate(date) => preamble.push(rewrite_header_date(&line, date)),
                HeaderPolicy::Verbatim { column_header } => {
                    preamble.push(line.trim_end().to_string());
                    if let Some(columns) = column_header {
                        preamble.push(columns.to_string());
                    }
                }
            }
        } else if line.starts_with('#') || line.starts_with(COLUMN_HEADER_TOKEN) {
            if config.keep_comments {
                preamble.push(line.trim_end_matches('\r').to_string());
            }
        } else if line.starts_with(UNCLASSIFIED) {
            let cell = parse_unclassified(&line, config.merged, line_no)?;
            preamble.push(match config.unclassified_line {
                UnclassifiedLine::Verbatim => line.trim_end_matches('\r').to_string(),
                UnclassifiedLine::Reformat => {
                    format!("{}\t{}", UNCLASSIFIED, format_values(cell.values()))
                }
            });
            unclassified = Some(cell);
        } else if line.contains(fixer.leaf_marker()) {
            let rewritten = fixer.rewrite_line(release.as_deref(), &line)?;
            let leaf = parse_leaf(&rewritten, config.merged, line_no)?;
            let width = leaf.abundance.values().len();
            if config.merged {
                let expected = *ncols.get_or_insert(width);
                if width != expected {
                    return Err(ProfileError::ShapeMismatch {
                        expected,
                        found: width,
                    });
                }
            }
            let leaf = fixer.relabel(release.as_deref(), leaf)?;
            aggregator.insert_leaf(
                Lineage::new(leaf.lineage),
                TaxonEntry {
                    abundance: leaf.abundance,
                    clade: leaf.clade,
                },
            )?;
            leaf_rows += 1;
        }
    }

    let shape = if config.merged {
        let width = ncols
            .or_else(|| unclassified.as_ref().map(|c| c.values().len()))
            .unwrap_or(0);
        CellShape::Vector(width)
    } else {
        CellShape::Scalar
    };
    if let Some(cell) = &unclassified {
        if cell.shape() != shape {
            return Err(ProfileError::ShapeMismatch {
                expected: shape.width(),
                found: cell.values().len(),
            });
        }
    }

    log::info!("Read {} leaf taxa", leaf_rows);
    Ok(LoadedProfile {
        release,
        preamble,
        unclassified,
        shape,
        aggregator,
        leaf_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label_fixer::{ReleaseFixer, SgbRemapper};
    use crate::lookup::{CorrectionTable, SgbTable};
    use std::io::Cursor;

    const LEAF: &str = "d__Bacteria|p__Bacillota|c__C|o__O|f__F|g__G|s__Foo|t__SGB1";

    fn jun23_profile() -> String {
        let leaf_row = format!("{LEAF}\t2|1239|||||12345|\t95.0\t");
        [
            "#mpa_vJun23_CHOCOPhlAnSGB_202307",
            "#/usr/bin/metaphlan sample.fastq",
            "#SampleID\tMetaphlan_Analysis",
            "clade_name\tNCBI_tax_id\trelative_abundance\tadditional_species",
            "UNCLASSIFIED\t-1\t5.0\t",
            "d__Bacteria\t2\t95.0\t",
            leaf_row.as_str(),
            "stray line without markers",
        ]
        .join("\n")
    }

    #[test]
    fn lines_are_classified() {
        let table = CorrectionTable::new();
        let fixer = ReleaseFixer::new(&table);
        let config = PipelineConfig::fix_relab(false);
        let profile = load_profile(Cursor::new(jun23_profile()), &config, &fixer).unwrap();

        assert_eq!(profile.release.as_deref(), Some("mpa_vJun23_CHOCOPhlAnSGB_202307"));
        assert_eq!(
            profile.preamble,
            vec![
                "#mpa_vJun23_CHOCOPhlAnSGB_202403",
                "#/usr/bin/metaphlan sample.fastq",
                "#SampleID\tMetaphlan_Analysis",
                "clade_name\tNCBI_tax_id\trelative_abundance\tadditional_species",
                "UNCLASSIFIED\t-1\t5.0\t",
            ]
        );
        assert_eq!(profile.unclassified, Some(AbundanceCell::Scalar(5.0)));
        assert_eq!(profile.shape, CellShape::Scalar);
        assert_eq!(profile.leaf_rows, 1);

        let leaves = profile.aggregator.table(7);
        let (lineage, entry) = leaves.iter().next().unwrap();
        assert!(lineage.as_str().contains("p__Firmicutes"));
        assert_eq!(entry.abundance, AbundanceCell::Scalar(95.0));
        assert_eq!(entry.clade.as_ref().unwrap().taxid, "2|1239|||||12345|");
        // higher-rank rows of the input are recomputed, never read
        assert!(profile.aggregator.table(0).is_empty());
    }

    #[test]
    fn missing_release_fails_on_first_leaf() {
        let table = CorrectionTable::new();
        let fixer = ReleaseFixer::new(&table);
        let input = format!("UNCLASSIFIED\t-1\t5.0\n{LEAF}\t2|\t95.0\n");
        let err = load_profile(Cursor::new(input), &PipelineConfig::fix_relab(false), &fixer)
            .unwrap_err();
        assert!(matches!(err, ProfileError::UnrecognizedRelease { found: None }));
    }

    #[test]
    fn merged_rows_keep_every_column() {
        let table = CorrectionTable::new();
        let fixer = ReleaseFixer::new(&table);
        let input = format!(
            "#mpa_vJun23_CHOCOPhlAnSGB_202307\nclade_name\tS1\tS2\tS3\nUNCLASSIFIED\t1.0\t2.0\t3.0\n{LEAF}\t10.0\t20.0\t30.0\n"
        );
        let profile = load_profile(Cursor::new(input), &PipelineConfig::fix_relab(true), &fixer).unwrap();
        assert_eq!(profile.shape, CellShape::Vector(3));
        assert_eq!(profile.unclassified_values(), vec![1.0, 2.0, 3.0]);
        let (_, entry) = profile.aggregator.table(7).iter().next().unwrap();
        assert_eq!(entry.abundance, AbundanceCell::Vector(vec![10.0, 20.0, 30.0]));
        assert!(entry.clade.is_none());
    }

    #[test]
    fn merged_column_drift_is_rejected() {
        let table = CorrectionTable::new();
        let fixer = ReleaseFixer::new(&table);
        let input = format!(
            "#mpa_vJun23_CHOCOPhlAnSGB_202307\n{LEAF}\t10.0\t20.0\n{LEAF}2\t10.0\t20.0\t5.0\n"
        );
        let err = load_profile(Cursor::new(input), &PipelineConfig::fix_relab(true), &fixer)
            .unwrap_err();
        assert!(matches!(err, ProfileError::ShapeMismatch { expected: 2, found: 3 }));
    }

    #[test]
    fn merged_without_unclassified_defaults_to_zeros() {
        let table = CorrectionTable::new();
        let fixer = ReleaseFixer::new(&table);
        let input = format!("#mpa_vJun23_CHOCOPhlAnSGB_202307\n{LEAF}\t10.0\t20.0\n");
        let profile = load_profile(Cursor::new(input), &PipelineConfig::fix_relab(true), &fixer).unwrap();
        assert_eq!(profile.unclassified_values(), vec![0.0, 0.0]);
    }

    #[test]
    fn bad_number_reports_line() {
        let table = CorrectionTable::new();
        let fixer = ReleaseFixer::new(&table);
        let input = format!("#mpa_vJun23_CHOCOPhlAnSGB_202307\n{LEAF}\t2|\tlots\n");
        let err = load_profile(Cursor::new(input), &PipelineConfig::fix_relab(false), &fixer)
            .unwrap_err();
        assert!(matches!(err, ProfileError::Malformed { line: 2, .. }));
    }

    #[test]
    fn gtdb_preamble_is_rebuilt() {
        let mut table = SgbTable::new();
        table.insert("SGB1".to_string(), "x1;x2;x3".to_string());
        let remapper = SgbRemapper::new(&table);
        let profile = load_profile(
            Cursor::new(jun23_profile()),
            &PipelineConfig::sgb_to_gtdb(false),
            &remapper,
        )
        .unwrap();

        assert_eq!(
            profile.preamble,
            vec![
                "#mpa_vJun23_CHOCOPhlAnSGB_202307",
                "#clade_name\trelative_abundance",
                "UNCLASSIFIED\t5.0",
            ]
        );
        assert_eq!(profile.aggregator.table(6).get("x1;x2;x3").unwrap().abundance, AbundanceCell::Scalar(95.0));
    }
}
