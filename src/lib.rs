// src/lib.rs
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod label_fixer;
pub mod lookup;
pub mod normalize;
pub mod profile_loader;
pub mod profile_writer;
pub mod types;

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use crate::aggregate::RankAggregator;
use crate::config::{Denominator, PipelineConfig, RankOrder};
use crate::error::{ProfileError, Result};
use crate::input::open_profile;
use crate::label_fixer::{LabelFixer, ReleaseFixer, SgbRemapper};
use crate::lookup::{CorrectionTable, SgbTable};
use crate::normalize::{renormalize, RankTotal};
use crate::profile_loader::load_profile;
use crate::profile_writer::write_profile;

/// A fully aggregated and renormalized profile, ready to be written.
pub struct TransformedProfile {
    pub release: Option<String>,
    pub preamble: Vec<String>,
    pub aggregator: RankAggregator,
    /// Per-rank totals the percentages were computed against
    pub rank_totals: Vec<RankTotal>,
    pub leaf_rows: usize,
    pub rank_order: RankOrder,
}

impl TransformedProfile {
    /// Write the profile; returns the number of taxon rows.
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<usize> {
        write_profile(out, &self.preamble, &self.aggregator, self.rank_order)
    }

    /// Renormalized percentages of `lineage`, searched across all ranks.
    pub fn abundance_of(&self, lineage: &str) -> Option<&[f64]> {
        self.aggregator
            .tables()
            .iter()
            .find_map(|t| t.get(lineage))
            .map(|e| e.abundance.values())
    }
}

/// Load → relabel → roll up → renormalize, all in memory.
pub fn transform_profile<R: BufRead>(
    reader: R,
    config: &PipelineConfig,
    fixer: &dyn LabelFixer,
) -> Result<TransformedProfile> {
    let mut profile = load_profile(reader, config, fixer)?;
    profile.aggregator.roll_up()?;

    let offset = match config.denominator {
        Denominator::IncludeUnclassified => profile.unclassified_values(),
        Denominator::RankOnly => vec![0.0; profile.shape.width()],
    };
    let rank_totals = renormalize(&mut profile.aggregator, &offset)?;

    Ok(TransformedProfile {
        release: profile.release,
        preamble: profile.preamble,
        aggregator: profile.aggregator,
        rank_totals,
        leaf_rows: profile.leaf_rows,
        rank_order: config.rank_order,
    })
}

/// Transform `input` into `output`. The output file is only created once the
/// whole profile has been processed.
pub fn process_profile_file(
    input: &Path,
    output: &Path,
    config: &PipelineConfig,
    fixer: &dyn LabelFixer,
) -> Result<TransformedProfile> {
    let reader = open_profile(input)?;
    let profile = transform_profile(reader, config, fixer)?;

    let file = File::create(output).map_err(|e| ProfileError::io(output, e))?;
    let mut writer = BufWriter::new(file);
    let rows = profile
        .write_to(&mut writer)
        .map_err(|e| ProfileError::io(output, e))?;
    log::info!("Wrote {} taxa to {}", rows, output.display());
    Ok(profile)
}

/// Fix Oct22/Jun23 taxonomy inconsistencies and renormalize the profile.
pub fn fix_relab_mpa4(
    input: &Path,
    output: &Path,
    merged: bool,
    corrections: &CorrectionTable,
) -> Result<TransformedProfile> {
    let fixer = ReleaseFixer::new(corrections);
    process_profile_file(input, output, &PipelineConfig::fix_relab(merged), &fixer)
}

/// Convert an SGB-based MetaPhlAn profile to a GTDB profile.
pub fn sgb_to_gtdb_profile(
    input: &Path,
    output: &Path,
    merged: bool,
    sgb2gtdb: &SgbTable,
) -> Result<TransformedProfile> {
    let fixer = SgbRemapper::new(sgb2gtdb);
    process_profile_file(input, output, &PipelineConfig::sgb_to_gtdb(merged), &fixer)
}
