//src/profile_writer.rs

use std::io::{self, Write};

use crate::aggregate::RankAggregator;
use crate::config::RankOrder;
use crate::types::{Lineage, TaxonEntry};

/// Formats an abundance the way MetaPhlAn tools print floats (`100.0`, `0.5`).
/// Values below 1e-4 or from 1e16 up use exponent notation (`1e-05`, `1e+16`).
pub fn format_abundance(value: f64) -> String {
    let magnitude = value.abs();
    if value.is_finite() && value != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let sci = format!("{:e}", value);
        let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

pub fn format_values(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format_abundance(*v))
        .collect::<Vec<_>>()
        .join("\t")
}

/// `lineage\ttaxid\tvalue\tadditional_species` for single-sample MetaPhlAn
/// rows, `lineage\tvalue[\tvalue…]` otherwise.
pub fn format_row(lineage: &Lineage, entry: &TaxonEntry) -> String {
    let values = format_values(entry.abundance.values());
    match &entry.clade {
        Some(meta) => format!(
            "{}\t{}\t{}\t{}",
            lineage, meta.taxid, values, meta.additional_species
        ),
        None => format!("{}\t{}", lineage, values),
    }
}

/// Writes the preamble followed by every rank block. Returns the number of
/// taxon rows written.
pub fn write_profile<W: Write>(
    out: &mut W,
    preamble: &[String],
    aggregator: &RankAggregator,
    order: RankOrder,
) -> io::Result<usize> {
    for line in preamble {
        writeln!(out, "{}", line)?;
    }

    let tables = aggregator.tables();
    let rank_indices: Vec<usize> = match order {
        RankOrder::ShallowestFirst => (0..tables.len()).collect(),
        RankOrder::DeepestFirst => (0..tables.len()).rev().collect(),
    };

    let mut rows = 0;
    for idx in rank_indices {
        for (lineage, entry) in tables[idx].iter() {
            writeln!(out, "{}", format_row(lineage, entry))?;
            rows += 1;
        }
    }
    out.flush()?;
    Ok(rows)
}
