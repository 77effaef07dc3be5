//! Mate selection over the living population.
//!
//! [`MatePool`] is the unordered list of living individuals. A mating round
//! draws uniformly random members out of the list until it finds what it is
//! looking for. Every drawn member is set aside for the rest of the round,
//! whether accepted or rejected, so a member is considered at most once and
//! the round always ends. Set-aside members go back into the list when the
//! round finishes, leaving its composition unchanged.
//!
//! # Rules
//!
//! A female who is already partnered switches with probability
//! `1 - loyalty`: she takes the first compatible candidate drawn, or keeps
//! her mate if there is none.
//!
//! An unpartnered female keeps drawing compatible candidates:
//!
//! - an unpartnered candidate is always accepted;
//! - a partnered candidate is poached with probability `1 - loyalty`;
//! - when the pool runs out she stays unpartnered.
//!
//! A compatible candidate is of the opposite sex and of mating age (which
//! implies alive) at the time of the round.

use rand::Rng;
use tracing::debug;

use pedigree_types::IndividualId;

use crate::error::SimError;
use crate::individual::{MatingAges, Pedigree};

/// How a mating round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatingOutcome {
    /// Already partnered, and loyalty kept the current mate.
    Kept,
    /// Already partnered, tried to switch, but no candidate was available.
    NoAlternative,
    /// Already partnered and switched to a new mate.
    Switched(IndividualId),
    /// Bonded with an unpartnered candidate.
    Bonded(IndividualId),
    /// Took a partnered candidate away from their mate.
    Poached(IndividualId),
    /// The pool ran out without a bond.
    Unpartnered,
}

impl MatingOutcome {
    /// The mate newly bonded in this round, if any.
    pub const fn new_mate(self) -> Option<IndividualId> {
        match self {
            Self::Switched(id) | Self::Bonded(id) | Self::Poached(id) => Some(id),
            Self::Kept | Self::NoAlternative | Self::Unpartnered => None,
        }
    }
}

/// Unordered list of the living population, used as the candidate pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatePool {
    members: Vec<IndividualId>,
}

impl MatePool {
    /// Create an empty pool.
    pub const fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Add a member.
    pub fn insert(&mut self, id: IndividualId) {
        self.members.push(id);
    }

    /// Remove a member. Returns whether it was present.
    pub fn remove(&mut self, id: IndividualId) -> bool {
        match self.members.iter().position(|&member| member == id) {
            Some(position) => {
                self.members.swap_remove(position);
                true
            }
            None => false,
        }
    }

    /// Whether `id` is in the pool.
    pub fn contains(&self, id: IndividualId) -> bool {
        self.members.contains(&id)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in unspecified order.
    pub fn iter(&self) -> core::slice::Iter<'_, IndividualId> {
        self.members.iter()
    }

    /// Run one mating round for `subject` at `time`.
    ///
    /// Bonds are written into `pedigree`. The pool is left with the same
    /// members it started with.
    pub fn choose_mate(
        &mut self,
        pedigree: &mut Pedigree,
        subject: IndividualId,
        time: f64,
        ages: &MatingAges,
        loyalty: f64,
        rng: &mut impl Rng,
    ) -> Result<MatingOutcome, SimError> {
        let mut round = Round {
            pool: &mut self.members,
            set_aside: Vec::new(),
        };
        let outcome = round.run(pedigree, subject, time, ages, loyalty, rng);
        round.restore();
        let outcome = outcome?;

        debug!(
            subject = %subject,
            time,
            outcome = ?outcome,
            "Mating round finished"
        );
        Ok(outcome)
    }
}

/// Working state of one mating round.
struct Round<'a> {
    pool: &'a mut Vec<IndividualId>,
    set_aside: Vec<IndividualId>,
}

impl Round<'_> {
    fn run(
        &mut self,
        pedigree: &mut Pedigree,
        subject: IndividualId,
        time: f64,
        ages: &MatingAges,
        loyalty: f64,
        rng: &mut impl Rng,
    ) -> Result<MatingOutcome, SimError> {
        let switch_probability = 1.0 - loyalty;

        if pedigree.is_partnered(subject, time)? {
            if rng.random::<f64>() >= switch_probability {
                return Ok(MatingOutcome::Kept);
            }
            return match self.draw_compatible(pedigree, subject, time, ages, rng)? {
                Some(candidate) => {
                    pedigree.bond(subject, candidate)?;
                    Ok(MatingOutcome::Switched(candidate))
                }
                None => Ok(MatingOutcome::NoAlternative),
            };
        }

        while let Some(candidate) = self.draw_compatible(pedigree, subject, time, ages, rng)? {
            if !pedigree.is_partnered(candidate, time)? {
                pedigree.bond(subject, candidate)?;
                return Ok(MatingOutcome::Bonded(candidate));
            }
            if rng.random::<f64>() < switch_probability {
                pedigree.bond(subject, candidate)?;
                return Ok(MatingOutcome::Poached(candidate));
            }
        }
        Ok(MatingOutcome::Unpartnered)
    }

    /// Draw members until a compatible one turns up or the pool is empty.
    fn draw_compatible(
        &mut self,
        pedigree: &Pedigree,
        subject: IndividualId,
        time: f64,
        ages: &MatingAges,
        rng: &mut impl Rng,
    ) -> Result<Option<IndividualId>, SimError> {
        let wanted = pedigree.get(subject)?.sex().opposite();
        while !self.pool.is_empty() {
            let index = rng.random_range(0..self.pool.len());
            let candidate = self.pool.swap_remove(index);
            self.set_aside.push(candidate);

            let individual = pedigree.get(candidate)?;
            if individual.sex() == wanted && individual.is_of_mating_age(time, ages) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn restore(self) {
        self.pool.extend(self.set_aside);
    }
}
