//src/aggregate.rs

use ahash::AHashMap;

use crate::error::Result;
use crate::types::{Lineage, Rank, TaxonEntry};

/// Lineage -> entry for a single rank, iterated in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct RankTable {
    index: AHashMap<Lineage, usize>,
    entries: Vec<(Lineage, TaxonEntry)>,
}

impl RankTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new lineage, or add `entry`'s abundance onto the existing one.
    /// Metadata of an existing entry is never overwritten.
    pub fn accumulate(&mut self, lineage: Lineage, entry: TaxonEntry) -> Result<()> {
        match self.index.get(&lineage) {
            Some(&idx) => self.entries[idx].1.abundance.accumulate(&entry.abundance),
            None => {
                self.index.insert(lineage.clone(), self.entries.len());
                self.entries.push((lineage, entry));
                Ok(())
            }
        }
    }

    pub fn get(&self, lineage: &str) -> Option<&TaxonEntry> {
        self.index.get(lineage).map(|&idx| &self.entries[idx].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Lineage, &TaxonEntry)> {
        self.entries.iter().map(|(l, e)| (l, e))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Lineage, &mut TaxonEntry)> {
        self.entries.iter_mut().map(|(l, e)| (&*l, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One [`RankTable`] per rank of a ladder, shallowest first.
///
/// Leaves go into the deepest table; [`RankAggregator::roll_up`] then sums
/// every rank into the one above it.
#[derive(Debug, Clone)]
pub struct RankAggregator {
    ranks: &'static [Rank],
    separator: char,
    tables: Vec<RankTable>,
    rolled_up: bool,
}

impl RankAggregator {
    pub fn new(ranks: &'static [Rank], separator: char) -> Self {
        Self {
            ranks,
            separator,
            tables: vec![RankTable::new(); ranks.len()],
            rolled_up: false,
        }
    }

    pub fn ranks(&self) -> &'static [Rank] {
        self.ranks
    }

    pub fn depth(&self) -> usize {
        self.tables.len()
    }

    pub fn insert_leaf(&mut self, lineage: Lineage, entry: TaxonEntry) -> Result<()> {
        match self.tables.last_mut() {
            Some(leaves) => leaves.accumulate(lineage, entry),
            None => Ok(()),
        }
    }

    pub fn table(&self, rank_idx: usize) -> &RankTable {
        &self.tables[rank_idx]
    }

    pub fn tables(&self) -> &[RankTable] {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut [RankTable] {
        &mut self.tables
    }

    /// Sum every rank into its parent rank, deepest first.
    ///
    /// New parents get a clone of the child's cell; existing parents are
    /// accumulated into. Root lineages (no separator left) have no parent and
    /// stay at their rank. Calling this more than once is a no-op.
    pub fn roll_up(&mut self) -> Result<()> {
        if self.rolled_up {
            return Ok(());
        }
        for child_idx in (1..self.tables.len()).rev() {
            let (upper, lower) = self.tables.split_at_mut(child_idx);
            let parents = &mut upper[child_idx - 1];
            for (lineage, entry) in lower[0].iter() {
                if let Some(parent) = lineage.parent(self.separator) {
                    parents.accumulate(parent, entry.for_parent())?;
                }
            }
            log::debug!(
                "rolled {} {} taxa into {} {} taxa",
                lower[0].len(),
                self.ranks[child_idx],
                parents.len(),
                self.ranks[child_idx - 1]
            );
        }
        self.rolled_up = true;
        Ok(())
    }
}
