//src/types.rs

use std::borrow::Borrow;
use std::fmt;

use crate::error::{ProfileError, Result};

/// One level of the fixed taxonomic ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    Domain,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    /// SGB leaf level of MetaPhlAn 4 profiles (`t__SGB…`).
    Strain,
}

impl Rank {
    pub fn name(&self) -> &'static str {
        match self {
            Rank::Domain => "domain",
            Rank::Phylum => "phylum",
            Rank::Class => "class",
            Rank::Order => "order",
            Rank::Family => "family",
            Rank::Genus => "genus",
            Rank::Species => "species",
            Rank::Strain => "strain",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Rank::Domain => "d__",
            Rank::Phylum => "p__",
            Rank::Class => "c__",
            Rank::Order => "o__",
            Rank::Family => "f__",
            Rank::Genus => "g__",
            Rank::Species => "s__",
            Rank::Strain => "t__",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// MetaPhlAn ladder, shallowest first.
pub const MPA_RANKS: [Rank; 8] = [
    Rank::Domain,
    Rank::Phylum,
    Rank::Class,
    Rank::Order,
    Rank::Family,
    Rank::Genus,
    Rank::Species,
    Rank::Strain,
];

/// GTDB ladder, shallowest first.
pub const GTDB_RANKS: [Rank; 7] = [
    Rank::Domain,
    Rank::Phylum,
    Rank::Class,
    Rank::Order,
    Rank::Family,
    Rank::Genus,
    Rank::Species,
];

pub const MPA_SEPARATOR: char = '|';
pub const GTDB_SEPARATOR: char = ';';

/// Full taxonomic path, e.g. `d__Bacteria|p__Firmicutes|…|t__SGB1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lineage(String);

impl Lineage {
    pub fn new(path: impl Into<String>) -> Self {
        Lineage(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The lineage one rank up, or `None` for a single-segment (root) lineage.
    pub fn parent(&self, separator: char) -> Option<Lineage> {
        self.0
            .rfind(separator)
            .map(|idx| Lineage(self.0[..idx].to_string()))
    }

    pub fn last_segment(&self, separator: char) -> &str {
        self.0.rsplit(separator).next().unwrap_or(&self.0)
    }
}

impl Borrow<str> for Lineage {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shape of every abundance cell in a run: one value, or one value per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellShape {
    Scalar,
    Vector(usize),
}

impl CellShape {
    pub fn width(&self) -> usize {
        match self {
            CellShape::Scalar => 1,
            CellShape::Vector(n) => *n,
        }
    }
}

/// Relative abundance in percentage points.
#[derive(Debug, Clone, PartialEq)]
pub enum AbundanceCell {
    Scalar(f64),
    /// Merged profiles: one value per sample column.
    Vector(Vec<f64>),
}

impl AbundanceCell {
    pub fn shape(&self) -> CellShape {
        match self {
            AbundanceCell::Scalar(_) => CellShape::Scalar,
            AbundanceCell::Vector(v) => CellShape::Vector(v.len()),
        }
    }

    pub fn values(&self) -> &[f64] {
        match self {
            AbundanceCell::Scalar(v) => std::slice::from_ref(v),
            AbundanceCell::Vector(v) => v,
        }
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        match self {
            AbundanceCell::Scalar(v) => std::slice::from_mut(v),
            AbundanceCell::Vector(v) => v,
        }
    }

    /// Elementwise `self += other`; both cells must have the same shape.
    pub fn accumulate(&mut self, other: &AbundanceCell) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(ProfileError::ShapeMismatch {
                expected: self.shape().width(),
                found: other.shape().width(),
            });
        }
        for (acc, v) in self.values_mut().iter_mut().zip(other.values()) {
            *acc += *v;
        }
        Ok(())
    }
}

/// Extra MetaPhlAn columns of single-sample profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CladeMeta {
    /// `|`-joined NCBI taxid path.
    pub taxid: String,
    pub additional_species: String,
}

/// One row of a rank table.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonEntry {
    pub abundance: AbundanceCell,
    pub clade: Option<CladeMeta>,
}

impl TaxonEntry {
    pub fn new(abundance: AbundanceCell) -> Self {
        TaxonEntry {
            abundance,
            clade: None,
        }
    }

    /// Entry seeded into a freshly created parent: same abundance, taxid path
    /// truncated by one level, no additional species.
    pub fn for_parent(&self) -> TaxonEntry {
        TaxonEntry {
            abundance: self.abundance.clone(),
            clade: self.clade.as_ref().map(|meta| CladeMeta {
                taxid: meta
                    .taxid
                    .rfind(MPA_SEPARATOR)
                    .map(|idx| meta.taxid[..idx].to_string())
                    .unwrap_or_default(),
                additional_species: String::new(),
            }),
        }
    }
}

/// Database release date tag written into repaired profile headers.
pub const FIXED_RELEASE_DATE: &str = "202403";

/// Releases whose profiles can be repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Oct22,
    Jun23,
}

impl Release {
    pub fn tag(&self) -> &'static str {
        match self {
            Release::Oct22 => "mpa_vOct22_CHOCOPhlAnSGB_202212",
            Release::Jun23 => "mpa_vJun23_CHOCOPhlAnSGB_202307",
        }
    }

    pub fn from_tag(tag: Option<&str>) -> Result<Release> {
        match tag {
            Some(t) if t == Release::Oct22.tag() => Ok(Release::Oct22),
            Some(t) if t == Release::Jun23.tag() => Ok(Release::Jun23),
            other => Err(ProfileError::UnrecognizedRelease {
                found: other.map(str::to_string),
            }),
        }
    }
}

/// `#mpa_vJun23_CHOCOPhlAnSGB_202307` -> `#mpa_vJun23_CHOCOPhlAnSGB_<date>`
pub fn rewrite_header_date(header: &str, date: &str) -> String {
    let header = header.trim_end();
    let stem = header.rfind('_').map(|idx| &header[..idx]).unwrap_or("");
    format!("{}_{}", stem.trim(), date)
}
