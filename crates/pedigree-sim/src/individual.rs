//! Individuals, mating-age bands, and the pedigree arena.
//!
//! The [`Pedigree`] owns every [`Individual`] created during a run. Records
//! are appended once and never removed, so an [`IndividualId`] is simply an
//! index into the arena. Mother, father, and mate links are stored as ids.
//!
//! Mate links are bidirectional by convention only: bonding writes both
//! sides, but a later bond with someone else overwrites just the two new
//! partners. The abandoned partner keeps a stale link, which
//! [`Pedigree::is_partnered`] detects by checking that the mate points back.

use serde::Deserialize;

use pedigree_types::{IndividualId, Sex};

use crate::error::SimError;
use crate::lifespan::ModelError;

// ---------------------------------------------------------------------------
// Mating-age bands
// ---------------------------------------------------------------------------

/// Inclusive age range in which an individual can mate.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AgeBand {
    /// Youngest mating age (years, inclusive).
    pub min: f64,
    /// Oldest mating age (years, inclusive).
    pub max: f64,
}

impl AgeBand {
    /// Create a band. Use [`AgeBand::validate`] before relying on it.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `age` lies in the band, bounds included.
    pub fn contains(&self, age: f64) -> bool {
        (self.min..=self.max).contains(&age)
    }

    /// Require finite bounds with `0 <= min < max`.
    pub fn validate(&self, label: &str) -> Result<(), ModelError> {
        if self.min.is_finite() && self.max.is_finite() && self.min >= 0.0 && self.min < self.max
        {
            Ok(())
        } else {
            Err(ModelError::InvalidConfiguration {
                reason: format!(
                    "{label} mating band must satisfy 0 <= min < max, got {}..{}",
                    self.min, self.max
                ),
            })
        }
    }
}

/// Sex-specific mating-age bands.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MatingAges {
    /// Female band (default: 16--50).
    #[serde(default = "default_female_band")]
    pub female: AgeBand,

    /// Male band (default: 16--73).
    #[serde(default = "default_male_band")]
    pub male: AgeBand,
}

impl Default for MatingAges {
    fn default() -> Self {
        Self {
            female: default_female_band(),
            male: default_male_band(),
        }
    }
}

impl MatingAges {
    /// The band that applies to `sex`.
    pub const fn band(&self, sex: Sex) -> AgeBand {
        match sex {
            Sex::Female => self.female,
            Sex::Male => self.male,
        }
    }

    /// Validate both bands.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.female.validate("female")?;
        self.male.validate("male")
    }
}

const fn default_female_band() -> AgeBand {
    AgeBand::new(16.0, 50.0)
}

const fn default_male_band() -> AgeBand {
    AgeBand::new(16.0, 73.0)
}

// ---------------------------------------------------------------------------
// Lineage
// ---------------------------------------------------------------------------

/// Which parent an ancestry walk follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lineage {
    /// Follow mothers.
    Maternal,
    /// Follow fathers.
    Paternal,
}

impl Lineage {
    /// The sex whose survivors seed this walk.
    pub const fn sex(self) -> Sex {
        match self {
            Self::Maternal => Sex::Female,
            Self::Paternal => Sex::Male,
        }
    }
}

// ---------------------------------------------------------------------------
// Individual
// ---------------------------------------------------------------------------

/// One node of the pedigree.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    id: IndividualId,
    sex: Sex,
    birth_time: f64,
    /// `+inf` until assigned when the Birth event is processed.
    death_time: f64,
    mother: Option<IndividualId>,
    father: Option<IndividualId>,
    mate: Option<IndividualId>,
}

impl Individual {
    /// Arena identifier.
    pub const fn id(&self) -> IndividualId {
        self.id
    }

    /// Sex, fixed at creation.
    pub const fn sex(&self) -> Sex {
        self.sex
    }

    /// Birth time.
    pub const fn birth_time(&self) -> f64 {
        self.birth_time
    }

    /// Death time, `f64::INFINITY` while unassigned.
    pub const fn death_time(&self) -> f64 {
        self.death_time
    }

    /// Whether a death time has been sampled yet.
    pub const fn has_death_time(&self) -> bool {
        self.death_time.is_finite()
    }

    /// Mother, absent for founders.
    pub const fn mother(&self) -> Option<IndividualId> {
        self.mother
    }

    /// Father, absent for founders.
    pub const fn father(&self) -> Option<IndividualId> {
        self.father
    }

    /// The parent followed by `lineage`.
    pub const fn parent(&self, lineage: Lineage) -> Option<IndividualId> {
        match lineage {
            Lineage::Maternal => self.mother,
            Lineage::Paternal => self.father,
        }
    }

    /// Current mate link, which may be stale.
    pub const fn mate(&self) -> Option<IndividualId> {
        self.mate
    }

    /// Whether the individual has no recorded parents.
    pub const fn is_founder(&self) -> bool {
        self.mother.is_none() && self.father.is_none()
    }

    /// Whether the individual is alive at `time`.
    pub const fn is_alive(&self, time: f64) -> bool {
        self.death_time > time
    }

    /// Age at `time`.
    pub const fn age_at(&self, time: f64) -> f64 {
        time - self.birth_time
    }

    /// Alive at `time` and within the sex-specific mating band.
    pub fn is_of_mating_age(&self, time: f64, ages: &MatingAges) -> bool {
        self.is_alive(time) && ages.band(self.sex).contains(self.age_at(time))
    }

    /// `ind.<id>/<sex>`
    fn tag(&self) -> String {
        format!("{}/{}", self.id, self.sex)
    }
}

// ---------------------------------------------------------------------------
// Pedigree
// ---------------------------------------------------------------------------

/// Append-only arena of every individual created in a run.
#[derive(Debug, Clone, Default)]
pub struct Pedigree {
    individuals: Vec<Individual>,
}

impl Pedigree {
    /// Create an empty pedigree.
    pub const fn new() -> Self {
        Self {
            individuals: Vec::new(),
        }
    }

    /// Number of individuals ever created.
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Whether no individual has been created.
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Iterate over individuals in creation order.
    pub fn iter(&self) -> core::slice::Iter<'_, Individual> {
        self.individuals.iter()
    }

    /// Look up an individual.
    pub fn get(&self, id: IndividualId) -> Result<&Individual, SimError> {
        self.individuals
            .get(id.index())
            .ok_or(SimError::UnknownIndividual(id))
    }

    fn get_mut(&mut self, id: IndividualId) -> Result<&mut Individual, SimError> {
        self.individuals
            .get_mut(id.index())
            .ok_or(SimError::UnknownIndividual(id))
    }

    /// Create a founder born at time 0.
    pub fn add_founder(&mut self, sex: Sex) -> IndividualId {
        self.push(sex, 0.0, None, None)
    }

    /// Create an offspring of `mother` and `father` born at `time`.
    pub fn add_offspring(
        &mut self,
        sex: Sex,
        mother: IndividualId,
        father: IndividualId,
        time: f64,
    ) -> Result<IndividualId, SimError> {
        self.get(mother)?;
        self.get(father)?;
        Ok(self.push(sex, time, Some(mother), Some(father)))
    }

    fn push(
        &mut self,
        sex: Sex,
        birth_time: f64,
        mother: Option<IndividualId>,
        father: Option<IndividualId>,
    ) -> IndividualId {
        let id = IndividualId::from_index(self.individuals.len());
        self.individuals.push(Individual {
            id,
            sex,
            birth_time,
            death_time: f64::INFINITY,
            mother,
            father,
            mate: None,
        });
        id
    }

    /// Assign the death time. Allowed once, and only after the birth time.
    pub fn assign_death_time(&mut self, id: IndividualId, death_time: f64) -> Result<(), SimError> {
        let individual = self.get_mut(id)?;
        if individual.has_death_time() {
            return Err(SimError::DeathAlreadyAssigned(id));
        }
        if death_time.is_nan() || death_time <= individual.birth_time {
            return Err(SimError::DeathBeforeBirth {
                id,
                birth_time: individual.birth_time,
                death_time,
            });
        }
        individual.death_time = death_time;
        Ok(())
    }

    /// Point `a` and `b` at each other, overwriting previous links.
    pub fn bond(&mut self, a: IndividualId, b: IndividualId) -> Result<(), SimError> {
        self.get(b)?;
        self.get_mut(a)?.mate = Some(b);
        self.get_mut(b)?.mate = Some(a);
        Ok(())
    }

    /// Whether `id` has a mate who is alive at `time` and links back.
    pub fn is_partnered(&self, id: IndividualId, time: f64) -> Result<bool, SimError> {
        let Some(mate_id) = self.get(id)?.mate else {
            return Ok(false);
        };
        let mate = self.get(mate_id)?;
        Ok(mate.is_alive(time) && mate.mate == Some(id))
    }

    /// Render an individual as
    /// `ind.<id>/<sex> [<birth>..<death>, mate <tag>\tmom <tag>\tdad <tag>]`.
    ///
    /// Missing links render as an empty tag.
    pub fn describe(&self, id: IndividualId) -> Result<String, SimError> {
        let individual = self.get(id)?;
        let tag = |link: Option<IndividualId>| -> Result<String, SimError> {
            link.map_or_else(|| Ok(String::new()), |other| Ok(self.get(other)?.tag()))
        };
        Ok(format!(
            "{} [{}..{}, mate {}\tmom {}\tdad {}]",
            individual.tag(),
            individual.birth_time,
            individual.death_time,
            tag(individual.mate)?,
            tag(individual.mother)?,
            tag(individual.father)?,
        ))
    }
}

impl<'a> IntoIterator for &'a Pedigree {
    type Item = &'a Individual;
    type IntoIter = core::slice::Iter<'a, Individual>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.iter()
    }
}
