//! Post-run coalescent analysis along single-sex lineages.
//!
//! The survivors of a run are split by sex. Each group seeds an ancestry
//! walk that repeatedly takes the youngest queued individual and replaces it
//! with its mother (maternal walk) or father (paternal walk). When that
//! parent is already queued, two lineages have merged, and the walk records
//! the child's birth time against the number of lineages left. The walk stops
//! when one lineage remains or the youngest queued individual is a founder.
//!
//! Parents are always born before their children and the youngest entry is
//! the one replaced, so the recorded birth times never increase. The series
//! is reversed at the end to read forward in time.

use std::collections::HashSet;

use core::cmp::Ordering;

use tracing::debug;

use pedigree_types::{IndividualId, TimeSeries};

use crate::error::SimError;
use crate::individual::{Lineage, Pedigree};
use crate::queue::{Comparator, PriorityQueue};

/// Queue entry of an ancestry walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ancestor {
    /// The individual.
    pub id: IndividualId,
    /// Its birth time, cached for ordering.
    pub birth_time: f64,
}

/// Orders ancestors by descending birth time, so the youngest is on top.
///
/// Equal birth times fall back to the higher identifier first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YoungestFirst;

impl Comparator<Ancestor> for YoungestFirst {
    fn compare(&self, a: &Ancestor, b: &Ancestor) -> Ordering {
        b.birth_time
            .total_cmp(&a.birth_time)
            .then_with(|| b.id.cmp(&a.id))
    }
}

/// Ancestry queue for one lineage.
#[derive(Debug, Clone)]
pub struct AncestryWalk {
    lineage: Lineage,
    queue: PriorityQueue<Ancestor, YoungestFirst>,
    queued: HashSet<IndividualId>,
}

impl AncestryWalk {
    /// Create an empty walk following `lineage`.
    pub fn new(lineage: Lineage) -> Self {
        Self {
            lineage,
            queue: PriorityQueue::with_comparator(YoungestFirst),
            queued: HashSet::new(),
        }
    }

    /// The lineage this walk follows.
    pub const fn lineage(&self) -> Lineage {
        self.lineage
    }

    /// Number of queued lineages.
    pub const fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued.
    pub const fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether `id` is currently queued.
    pub fn is_queued(&self, id: IndividualId) -> bool {
        self.queued.contains(&id)
    }

    /// Queue an individual. Already-queued individuals are ignored.
    pub fn push(&mut self, pedigree: &Pedigree, id: IndividualId) -> Result<(), SimError> {
        let birth_time = pedigree.get(id)?.birth_time();
        if self.queued.insert(id) {
            self.queue.insert(Ancestor { id, birth_time });
        }
        Ok(())
    }

    /// Walk back to the founders and return the coalescence series.
    pub fn run(mut self, pedigree: &Pedigree) -> Result<TimeSeries, SimError> {
        let mut series = TimeSeries::new();

        while self.queue.len() > 1 {
            let youngest = *self.queue.peek_top()?;
            let individual = pedigree.get(youngest.id)?;
            if individual.is_founder() {
                break;
            }
            self.queue.extract_top()?;
            self.queued.remove(&youngest.id);

            let Some(parent) = individual.parent(self.lineage) else {
                continue;
            };
            if self.queued.contains(&parent) {
                series.push(youngest.birth_time, self.queue.len());
            } else {
                self.push(pedigree, parent)?;
            }
        }

        series.reverse();
        debug!(
            lineage = ?self.lineage,
            coalescences = series.len(),
            lineages_left = self.queue.len(),
            "Ancestry walk finished"
        );
        Ok(series)
    }
}

/// Split `survivors` by sex and run the maternal and paternal walks.
///
/// Returns `(female, male)` coalescence series.
pub fn coalescence_series(
    pedigree: &Pedigree,
    survivors: &[IndividualId],
) -> Result<(TimeSeries, TimeSeries), SimError> {
    let mut maternal = AncestryWalk::new(Lineage::Maternal);
    let mut paternal = AncestryWalk::new(Lineage::Paternal);

    for &id in survivors {
        let walk = if pedigree.get(id)?.sex() == maternal.lineage().sex() {
            &mut maternal
        } else {
            &mut paternal
        };
        walk.push(pedigree, id)?;
    }

    Ok((maternal.run(pedigree)?, paternal.run(pedigree)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use pedigree_types::Sex;

    use super::*;

    /// Three generations:
    ///
    /// ```text
    /// founders  f0 (F)  m1 (M)        f2 (F)  m3 (M)
    ///              \   /                 \   /
    /// gen 1        d4 (F, t=20)       d5 (F, t=22)   s6 (M, t=24, of f2/m3)
    ///                 \  m1               \  m3
    /// gen 2        g7 (F, t=40)  g8 (F, t=41)  g9 (F, t=45, of d5/m3)
    /// ```
    fn family() -> (Pedigree, Vec<IndividualId>) {
        let mut p = Pedigree::new();
        let f0 = p.add_founder(Sex::Female);
        let m1 = p.add_founder(Sex::Male);
        let f2 = p.add_founder(Sex::Female);
        let m3 = p.add_founder(Sex::Male);
        let d4 = p.add_offspring(Sex::Female, f0, m1, 20.0).unwrap();
        let d5 = p.add_offspring(Sex::Female, f2, m3, 22.0).unwrap();
        let s6 = p.add_offspring(Sex::Male, f2, m3, 24.0).unwrap();
        let g7 = p.add_offspring(Sex::Female, d4, m1, 40.0).unwrap();
        let g8 = p.add_offspring(Sex::Female, d4, m1, 41.0).unwrap();
        let g9 = p.add_offspring(Sex::Female, d5, m3, 45.0).unwrap();
        (p, vec![f0, m1, f2, m3, d4, d5, s6, g7, g8, g9])
    }

    #[test]
    fn youngest_first_ordering() {
        let older = Ancestor {
            id: IndividualId(0),
            birth_time: 1.0,
        };
        let younger = Ancestor {
            id: IndividualId(1),
            birth_time: 2.0,
        };
        assert_eq!(YoungestFirst.compare(&younger, &older), Ordering::Less);
        assert_eq!(YoungestFirst.compare(&older, &younger), Ordering::Greater);
    }

    #[test]
    fn maternal_walk_records_merges() {
        let (pedigree, ids) = family();
        let mut walk = AncestryWalk::new(Lineage::Maternal);
        for &i in &[7, 8, 9] {
            walk.push(&pedigree, ids[i]).unwrap();
        }

        let series = walk.run(&pedigree).unwrap();

        // g9 -> d5 (new), g8 -> d4 (new), g7 -> d4 queued: merge at t=40
        // leaving {d4, d5}; d5 -> f2 (new), d4 -> f0 (new); {f0, f2} founders.
        assert_eq!(series.len(), 1);
        assert_eq!(series.first().map(|p| (p.time, p.count)), Some((40.0, 2)));
    }

    #[test]
    fn merges_with_surviving_parent() {
        let (pedigree, ids) = family();
        let mut walk = AncestryWalk::new(Lineage::Maternal);
        // A surviving mother and her daughter.
        walk.push(&pedigree, ids[4]).unwrap();
        walk.push(&pedigree, ids[8]).unwrap();

        let series = walk.run(&pedigree).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.last().map(|p| (p.time, p.count)), Some((41.0, 1)));
    }

    #[test]
    fn paternal_walk_follows_fathers() {
        let (pedigree, ids) = family();
        let mut walk = AncestryWalk::new(Lineage::Paternal);
        assert_eq!(walk.lineage(), Lineage::Paternal);
        for &i in &[6, 9] {
            walk.push(&pedigree, ids[i]).unwrap();
        }
        // g9 (t=45) -> m3 (new); s6 (t=24) -> m3 queued: merge.
        let series = walk.run(&pedigree).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.first().map(|p| (p.time, p.count)), Some((24.0, 1)));
    }

    #[test]
    fn founders_only_yield_empty_series() {
        let (pedigree, ids) = family();
        let (female, male) = coalescence_series(&pedigree, &ids[0..4]).unwrap();
        assert!(female.is_empty());
        assert!(male.is_empty());
    }

    #[test]
    fn single_survivor_yields_empty_series() {
        let (pedigree, ids) = family();
        let (female, male) = coalescence_series(&pedigree, &ids[9..]).unwrap();
        assert!(female.is_empty());
        assert!(male.is_empty());
    }

    #[test]
    fn survivors_are_routed_by_lineage_sex() {
        let (pedigree, ids) = family();
        // s6 is male and walks alone; g7 and g8 share their mother d4.
        let (female, male) = coalescence_series(&pedigree, &ids[6..9]).unwrap();
        assert_eq!(female.len(), 1);
        assert_eq!(female.first().map(|p| (p.time, p.count)), Some((40.0, 1)));
        assert!(male.is_empty());
    }

    #[test]
    fn series_are_time_ordered() {
        let (pedigree, ids) = family();
        let (female, male) = coalescence_series(&pedigree, &ids).unwrap();
        assert!(female.is_time_ordered());
        assert!(male.is_time_ordered());
    }

    #[test]
    fn duplicate_push_is_ignored() {
        let (pedigree, ids) = family();
        let mut walk = AncestryWalk::new(Lineage::Maternal);
        walk.push(&pedigree, ids[7]).unwrap();
        walk.push(&pedigree, ids[7]).unwrap();
        assert_eq!(walk.len(), 1);
        assert!(walk.is_queued(ids[7]));
    }

    #[test]
    fn unknown_survivor_is_an_error() {
        let (pedigree, _) = family();
        let result = coalescence_series(&pedigree, &[IndividualId(99)]);
        assert_eq!(result, Err(SimError::UnknownIndividual(IndividualId(99))));
    }
}
