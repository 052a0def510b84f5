//src/config.rs

use crate::types::{Rank, GTDB_RANKS, GTDB_SEPARATOR, MPA_RANKS, MPA_SEPARATOR};

/// Order in which rank blocks are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    ShallowestFirst,
    DeepestFirst,
}

/// What is added to each rank's column totals before rescaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denominator {
    IncludeUnclassified,
    RankOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Replace the trailing `_<date>` of the release header.
    RewriteDate(&'static str),
    /// Keep the header, optionally followed by a fixed column-header line.
    Verbatim { column_header: Option<&'static str> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnclassifiedLine {
    Verbatim,
    /// `UNCLASSIFIED\t<value(s)>`
    Reformat,
}

/// Everything that differs between the two profile pipelines.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub ranks: &'static [Rank],
    pub separator: char,
    /// Multi-sample profile from merge_metaphlan_tables.
    pub merged: bool,
    pub header_marker: &'static str,
    pub header: HeaderPolicy,
    pub keep_comments: bool,
    pub unclassified_line: UnclassifiedLine,
    pub denominator: Denominator,
    pub rank_order: RankOrder,
}

pub const GTDB_COLUMN_HEADER: &str = "#clade_name\trelative_abundance";

impl PipelineConfig {
    /// Release repair of MetaPhlAn 4 profiles.
    pub fn fix_relab(merged: bool) -> Self {
        Self {
            ranks: &MPA_RANKS,
            separator: MPA_SEPARATOR,
            merged,
            header_marker: "#mpa_v",
            header: HeaderPolicy::RewriteDate(crate::types::FIXED_RELEASE_DATE),
            keep_comments: true,
            unclassified_line: UnclassifiedLine::Verbatim,
            denominator: Denominator::IncludeUnclassified,
            rank_order: RankOrder::ShallowestFirst,
        }
    }

    /// SGB to GTDB conversion. Merged profiles keep their own column header
    /// since it carries the sample names.
    pub fn sgb_to_gtdb(merged: bool) -> Self {
        Self {
            ranks: &GTDB_RANKS,
            separator: GTDB_SEPARATOR,
            merged,
            header_marker: "#mpa_",
            header: HeaderPolicy::Verbatim {
                column_header: if merged { None } else { Some(GTDB_COLUMN_HEADER) },
            },
            keep_comments: merged,
            unclassified_line: UnclassifiedLine::Reformat,
            denominator: Denominator::RankOnly,
            rank_order: RankOrder::DeepestFirst,
        }
    }
}
