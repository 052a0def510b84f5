//src/label_fixer.rs

use std::borrow::Cow;

use crate::error::{ProfileError, Result};
use crate::lookup::{CorrectionTable, SgbTable};
use crate::types::{AbundanceCell, CladeMeta, Lineage, Rank, Release, MPA_SEPARATOR};

/// A parsed leaf data row, before it enters the rank tables.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafRow {
    pub lineage: String,
    pub abundance: AbundanceCell,
    /// Only present for single-sample MetaPhlAn profiles.
    pub clade: Option<CladeMeta>,
}

/// Rewrites leaf labels before aggregation.
pub trait LabelFixer {
    /// Substring identifying the leaf rows this fixer consumes.
    fn leaf_marker(&self) -> &str;

    /// Raw-line rewrite, applied before the line is split into fields.
    fn rewrite_line<'a>(&self, _release: Option<&str>, line: &'a str) -> Result<Cow<'a, str>> {
        Ok(Cow::Borrowed(line))
    }

    fn relabel(&self, release: Option<&str>, row: LeafRow) -> Result<LeafRow>;
}

/// Substring renames applied to Jun23 rows; only the first match is applied.
pub const JUN23_RENAMES: [(&str, &str); 2] = [
    ("p__Bacillota", "p__Firmicutes"),
    ("f__Saccharomycetales_unclassified", "f__Debaryomycetaceae"),
];

/// Repairs known taxonomy inconsistencies of the Oct22 and Jun23 releases.
pub struct ReleaseFixer<'t> {
    corrections: &'t CorrectionTable,
}

impl<'t> ReleaseFixer<'t> {
    pub fn new(corrections: &'t CorrectionTable) -> Self {
        Self { corrections }
    }
}

impl LabelFixer for ReleaseFixer<'_> {
    fn leaf_marker(&self) -> &str {
        Rank::Strain.prefix()
    }

    fn rewrite_line<'a>(&self, release: Option<&str>, line: &'a str) -> Result<Cow<'a, str>> {
        match Release::from_tag(release)? {
            Release::Jun23 => Ok(JUN23_RENAMES
                .iter()
                .find(|(from, _)| line.contains(from))
                .map(|(from, to)| Cow::Owned(line.replace(from, to)))
                .unwrap_or(Cow::Borrowed(line))),
            Release::Oct22 => Ok(Cow::Borrowed(line)),
        }
    }

    fn relabel(&self, release: Option<&str>, mut row: LeafRow) -> Result<LeafRow> {
        if Release::from_tag(release)? != Release::Oct22 {
            return Ok(row);
        }
        if let Some(fix) = self.corrections.get(&row.lineage) {
            row.lineage = fix.lineage.clone();
            if let Some(clade) = row.clade.as_mut() {
                clade.taxid = fix.taxid.clone();
            }
        }
        Ok(row)
    }
}

/// Replaces the whole MetaPhlAn lineage of an SGB by its GTDB lineage.
pub struct SgbRemapper<'t> {
    sgb2gtdb: &'t SgbTable,
}

impl<'t> SgbRemapper<'t> {
    pub fn new(sgb2gtdb: &'t SgbTable) -> Self {
        Self { sgb2gtdb }
    }
}

impl LabelFixer for SgbRemapper<'_> {
    fn leaf_marker(&self) -> &str {
        "t__SGB"
    }

    fn relabel(&self, _release: Option<&str>, row: LeafRow) -> Result<LeafRow> {
        let LeafRow { lineage, abundance, .. } = row;
        let lineage = Lineage::new(lineage);
        let leaf = lineage.last_segment(MPA_SEPARATOR);
        let sgb = leaf.strip_prefix(Rank::Strain.prefix()).unwrap_or(leaf);
        let gtdb = self
            .sgb2gtdb
            .get(sgb)
            .ok_or_else(|| ProfileError::LookupMiss {
                key: sgb.to_string(),
                table: "SGB to GTDB table".to_string(),
            })?;
        Ok(LeafRow {
            lineage: gtdb.clone(),
            abundance,
            clade: None,
        })
    }
}
