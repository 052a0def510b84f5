//src/normalize.rs

use crate::aggregate::{RankAggregator, RankTable};
use crate::error::{ProfileError, Result};
use crate::types::Rank;

/// Decimal digits kept in renormalized percentages.
pub const PERCENT_DECIMALS: i32 = 5;

/// Pre-normalization total of one rank, per column, including the offset.
#[derive(Debug, Clone, PartialEq)]
pub struct RankTotal {
    pub rank: Rank,
    pub totals: Vec<f64>,
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Column sums of a rank table plus `offset`.
pub fn column_totals(table: &RankTable, offset: &[f64]) -> Result<Vec<f64>> {
    let mut totals = offset.to_vec();
    for (_, entry) in table.iter() {
        let values = entry.abundance.values();
        if values.len() != totals.len() {
            return Err(ProfileError::ShapeMismatch {
                expected: totals.len(),
                found: values.len(),
            });
        }
        for (t, v) in totals.iter_mut().zip(values) {
            *t += *v;
        }
    }
    Ok(totals)
}

/// Rescale one rank so that, per column, entries plus `offset` make 100%.
pub fn renormalize_rank(table: &mut RankTable, rank: Rank, offset: &[f64]) -> Result<Vec<f64>> {
    let totals = column_totals(table, offset)?;
    if table.is_empty() {
        return Ok(totals);
    }
    if let Some(column) = totals.iter().position(|t| *t == 0.0) {
        return Err(ProfileError::DegenerateNormalization {
            rank: rank.name().to_string(),
            column,
        });
    }
    for (_, entry) in table.iter_mut() {
        for (v, total) in entry.abundance.values_mut().iter_mut().zip(&totals) {
            *v = round_to(100.0 * *v / total, PERCENT_DECIMALS);
        }
    }
    Ok(totals)
}

/// Renormalize every rank of `aggregator` independently.
///
/// `offset` is added to each rank's column totals; pass the unclassified
/// fraction to keep it in the denominator, or zeros to normalize each rank
/// against its own total.
pub fn renormalize(aggregator: &mut RankAggregator, offset: &[f64]) -> Result<Vec<RankTotal>> {
    let ranks = aggregator.ranks();
    let mut rank_totals = Vec::with_capacity(ranks.len());
    for (table, &rank) in aggregator.tables_mut().iter_mut().zip(ranks) {
        let totals = renormalize_rank(table, rank, offset)?;
        log::debug!(
            "Level {} total sum including unclassified: {:?}",
            rank,
            totals
        );
        rank_totals.push(RankTotal { rank, totals });
    }
    Ok(rank_totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AbundanceCell, Lineage, TaxonEntry, MPA_RANKS};

    const TOLERANCE: f64 = 1e-4;

    fn table_of(rows: &[(&str, AbundanceCell)]) -> RankTable {
        let mut table = RankTable::new();
        for (lineage, cell) in rows {
            table
                .accumulate(Lineage::new(*lineage), TaxonEntry::new(cell.clone()))
                .unwrap();
        }
        table
    }

    fn column_sum(table: &RankTable, column: usize) -> f64 {
        table
            .iter()
            .map(|(_, e)| e.abundance.values()[column])
            .sum()
    }

    #[test]
    fn rounding_keeps_five_decimals() {
        assert_eq!(round_to(33.333333333, PERCENT_DECIMALS), 33.33333);
        assert_eq!(round_to(66.666666666, PERCENT_DECIMALS), 66.66667);
        assert_eq!(round_to(100.0, PERCENT_DECIMALS), 100.0);
    }

    #[test]
    fn rank_plus_unclassified_sums_to_100() {
        let mut table = table_of(&[
            ("a", AbundanceCell::Scalar(12.0)),
            ("b", AbundanceCell::Scalar(7.0)),
            ("c", AbundanceCell::Scalar(51.5)),
        ]);
        let unclassified = 13.0;
        let totals = renormalize_rank(&mut table, Rank::Genus, &[unclassified]).unwrap();
        assert_eq!(totals, vec![83.5]);

        let unclassified_pct = 100.0 * unclassified / totals[0];
        assert!((column_sum(&table, 0) + unclassified_pct - 100.0).abs() < TOLERANCE);
    }

    #[test]
    fn renormalizing_twice_is_stable() {
        let mut table = table_of(&[
            ("a", AbundanceCell::Scalar(3.0)),
            ("b", AbundanceCell::Scalar(9.0)),
        ]);
        let totals = renormalize_rank(&mut table, Rank::Species, &[4.0]).unwrap();
        let once: Vec<f64> = table.iter().map(|(_, e)| e.abundance.values()[0]).collect();

        let unclassified_pct = 100.0 * 4.0 / totals[0];
        renormalize_rank(&mut table, Rank::Species, &[unclassified_pct]).unwrap();
        let twice: Vec<f64> = table.iter().map(|(_, e)| e.abundance.values()[0]).collect();

        for (a, b) in once.iter().zip(&twice) {
            assert!((a - b).abs() < TOLERANCE);
        }
        assert_eq!(once, vec![18.75, 56.25]);
    }

    #[test]
    fn vector_columns_are_normalized_independently() {
        let mut table = table_of(&[
            ("a", AbundanceCell::Vector(vec![10.0, 0.0, 30.0])),
            ("b", AbundanceCell::Vector(vec![30.0, 50.0, 30.0])),
        ]);
        let unclassified = [10.0, 50.0, 0.0];
        let totals = renormalize_rank(&mut table, Rank::Genus, &unclassified).unwrap();
        assert_eq!(totals, vec![50.0, 100.0, 60.0]);

        for column in 0..3 {
            let unclassified_pct = 100.0 * unclassified[column] / totals[column];
            assert!((column_sum(&table, column) + unclassified_pct - 100.0).abs() < TOLERANCE);
        }
        assert_eq!(
            table.get("a").unwrap().abundance,
            AbundanceCell::Vector(vec![20.0, 0.0, 50.0])
        );
    }

    #[test]
    fn zero_total_is_rejected() {
        let mut table = table_of(&[("a", AbundanceCell::Vector(vec![1.0, 0.0]))]);
        let err = renormalize_rank(&mut table, Rank::Family, &[0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            ProfileError::DegenerateNormalization { ref rank, column: 1 } if rank == "family"
        ));
    }

    #[test]
    fn empty_rank_with_zero_total_is_fine() {
        let mut table = RankTable::new();
        assert_eq!(
            renormalize_rank(&mut table, Rank::Domain, &[0.0]).unwrap(),
            vec![0.0]
        );
    }

    #[test]
    fn width_mismatch_is_reported() {
        let mut table = table_of(&[("a", AbundanceCell::Vector(vec![1.0, 2.0]))]);
        assert!(matches!(
            renormalize_rank(&mut table, Rank::Genus, &[0.0, 0.0, 0.0]),
            Err(ProfileError::ShapeMismatch {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn every_rank_is_normalized() {
        let mut agg = RankAggregator::new(&MPA_RANKS, '|');
        agg.insert_leaf(
            Lineage::new("d__B|p__F|c__C|o__O|f__F|g__G|s__S|t__SGB1"),
            TaxonEntry::new(AbundanceCell::Scalar(60.0)),
        )
        .unwrap();
        agg.insert_leaf(
            Lineage::new("d__B|p__F|c__C|o__O|f__F|g__G|s__S|t__SGB2"),
            TaxonEntry::new(AbundanceCell::Scalar(20.0)),
        )
        .unwrap();
        agg.roll_up().unwrap();
        let totals = renormalize(&mut agg, &[20.0]).unwrap();

        assert_eq!(totals.len(), 8);
        assert!(totals.iter().all(|t| t.totals == vec![100.0]));
        assert_eq!(
            agg.table(0).get("d__B").unwrap().abundance,
            AbundanceCell::Scalar(80.0)
        );
        assert_eq!(
            agg.table(7).get("d__B|p__F|c__C|o__O|f__F|g__G|s__S|t__SGB2").unwrap().abundance,
            AbundanceCell::Scalar(20.0)
        );
    }
}
