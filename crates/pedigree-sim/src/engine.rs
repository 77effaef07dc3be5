//! The discrete-event simulation loop.
//!
//! A [`Simulation`] holds the validated model, the mating bands, and the
//! random number generator. Each call to [`Simulation::run`] builds a fresh
//! per-run state (pedigree, event queue, population queue, mate pool), so
//! nothing leaks between runs and independent simulations can run on
//! separate threads.
//!
//! # Event loop
//!
//! 1. Seed one Birth event per founder at time 0.
//! 2. Pop the earliest event. Stop if it lies beyond the horizon.
//! 3. Drop Birth and Reproduction events whose subject is no longer alive.
//!    This is the only form of cancellation.
//! 4. Dispatch:
//!    - **Birth**: sample a death time and schedule Death; females also get
//!      their first Reproduction. The newborn joins the population.
//!    - **Death**: the individual with the earliest death time leaves the
//!      population.
//!    - **Reproduction**: a female of mating age runs a mating round; if
//!      she ends it partnered, a child is born at once. The next attempt is
//!      scheduled after an exponential wait.
//! 5. Once the loop stops, the survivors feed the coalescent analysis.

use core::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use pedigree_types::{EndReason, IndividualId, RunStats, Sex, SimulationResult, TimeSeries};

use crate::coalescence::coalescence_series;
use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::event::{Event, EventKind, EventQueue};
use crate::individual::{MatingAges, Pedigree};
use crate::lifespan::{AgeModel, ModelError};
use crate::mating::MatePool;
use crate::queue::PriorityQueue;

/// Population queue entry, ordered by death time then identifier.
#[derive(Debug, Clone, Copy)]
struct ByDeathTime {
    death_time: f64,
    id: IndividualId,
}

impl Ord for ByDeathTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.death_time
            .total_cmp(&other.death_time)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for ByDeathTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ByDeathTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ByDeathTime {}

/// Lifespan draws at a birth before falling back to the next instant.
const MAX_LIFESPAN_DRAWS: usize = 16;

/// Everything a run produces, including the full pedigree.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Series and counters.
    pub result: SimulationResult,
    /// Every individual created during the run.
    pub pedigree: Pedigree,
}

/// A configured simulator.
#[derive(Debug, Clone)]
pub struct Simulation<R> {
    model: AgeModel,
    mating: MatingAges,
    sample_interval: f64,
    /// Rate of a fertile female's mating attempts, fixed at construction.
    fertility_rate: f64,
    rng: R,
}

impl Simulation<StdRng> {
    /// Build a simulator from configuration, seeding from `run.seed` when
    /// present and from the operating system otherwise.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SimError> {
        let rng = config
            .run
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self::new(config, rng)
    }
}

impl<R: Rng> Simulation<R> {
    /// Validate `config` and build a simulator around `rng`.
    pub fn new(config: &SimulationConfig, rng: R) -> Result<Self, SimError> {
        config.validate()?;
        let model = AgeModel::new(&config.model)?;
        let female = config.mating.female;
        let fertility_rate = model.fertility_rate(female.min, female.max);
        if !(fertility_rate.is_finite() && fertility_rate > 0.0) {
            return Err(ModelError::InvalidConfiguration {
                reason: format!(
                    "female mating band {}..{} yields fertility rate {fertility_rate}",
                    female.min, female.max
                ),
            }
            .into());
        }

        Ok(Self {
            model,
            mating: config.mating,
            sample_interval: config.sampling.interval,
            fertility_rate,
            rng,
        })
    }

    /// The lifespan model in use.
    pub const fn model(&self) -> &AgeModel {
        &self.model
    }

    /// Mating-attempt rate derived from the female band.
    pub const fn fertility_rate(&self) -> f64 {
        self.fertility_rate
    }

    /// Run from `founders` founders until the horizon or extinction.
    pub fn run(&mut self, founders: usize, horizon: f64) -> Result<SimulationResult, SimError> {
        Ok(self.run_with_pedigree(founders, horizon)?.result)
    }

    /// Like [`Simulation::run`], also returning the pedigree.
    pub fn run_with_pedigree(
        &mut self,
        founders: usize,
        horizon: f64,
    ) -> Result<RunOutput, SimError> {
        if horizon.is_nan() {
            return Err(ModelError::InvalidConfiguration {
                reason: "horizon must be a number".to_owned(),
            }
            .into());
        }

        info!(
            founders,
            horizon,
            fertility_rate = self.fertility_rate,
            model = %self.model,
            "Simulation starting"
        );

        let mut state = RunState::new(self.sample_interval);
        for _ in 0..founders {
            let sex = random_sex(&mut self.rng);
            let id = state.pedigree.add_founder(sex);
            state.events.schedule(EventKind::Birth, id, 0.0);
        }

        state.stats.end_reason = EndReason::EventsExhausted;
        while !state.events.is_empty() {
            let event = state.events.pop()?;
            if event.time > horizon {
                state.stats.end_reason = EndReason::HorizonReached;
                break;
            }
            self.step(&mut state, event)?;
        }

        let output = state.finish()?;
        log_simulation_end(&output.result);
        Ok(output)
    }

    fn step(&mut self, state: &mut RunState, event: Event) -> Result<(), SimError> {
        if event.kind != EventKind::Death
            && !state.pedigree.get(event.subject)?.is_alive(event.time)
        {
            state.stats.stale_events_dropped = state.stats.stale_events_dropped.saturating_add(1);
            return Ok(());
        }

        state.stats.events_processed = state.stats.events_processed.saturating_add(1);
        state.stats.last_event_time = Some(event.time);

        match event.kind {
            EventKind::Birth => self.on_birth(state, event.subject, event.time),
            EventKind::Death => state.on_death(event.subject, event.time),
            EventKind::Reproduction => self.on_reproduction(state, event.subject, event.time),
        }
    }

    fn on_birth(&mut self, state: &mut RunState, id: IndividualId, time: f64) -> Result<(), SimError> {
        let death_time = self.draw_death_time(time);
        state.pedigree.assign_death_time(id, death_time)?;
        state.events.schedule(EventKind::Death, id, death_time);

        if state.pedigree.get(id)?.sex() == Sex::Female {
            let wait = AgeModel::random_waiting_time(&mut self.rng, self.fertility_rate);
            state
                .events
                .schedule(EventKind::Reproduction, id, time + wait);
        }

        state.population.insert(ByDeathTime { death_time, id });
        state.pool.insert(id);
        state.stats.births = state.stats.births.saturating_add(1);
        state.sample_population(time);
        Ok(())
    }

    /// A death time strictly after `birth_time`.
    ///
    /// Zero-length lifespans, or lifespans too short to move a large
    /// `birth_time`, are redrawn a bounded number of times.
    fn draw_death_time(&mut self, birth_time: f64) -> f64 {
        for _ in 0..MAX_LIFESPAN_DRAWS {
            let candidate = birth_time + self.model.random_lifespan(&mut self.rng);
            if candidate > birth_time {
                return candidate;
            }
        }
        just_after(birth_time)
    }

    fn on_reproduction(
        &mut self,
        state: &mut RunState,
        mother: IndividualId,
        time: f64,
    ) -> Result<(), SimError> {
        let subject = state.pedigree.get(mother)?;
        let death_time = subject.death_time();

        if subject.is_of_mating_age(time, &self.mating) {
            state.stats.mating_attempts = state.stats.mating_attempts.saturating_add(1);
            state.pool.choose_mate(
                &mut state.pedigree,
                mother,
                time,
                &self.mating,
                self.model.loyalty_factor(),
                &mut self.rng,
            )?;

            if state.pedigree.is_partnered(mother, time)? {
                let father = state
                    .pedigree
                    .get(mother)?
                    .mate()
                    .ok_or(SimError::UnknownIndividual(mother))?;
                let sex = random_sex(&mut self.rng);
                let child = state.pedigree.add_offspring(sex, mother, father, time)?;
                state.events.schedule(EventKind::Birth, child, time);
                state.stats.offspring_scheduled = state.stats.offspring_scheduled.saturating_add(1);
                debug!(%mother, %father, %child, time, "Offspring conceived");
            }
        }

        let next = time + AgeModel::random_waiting_time(&mut self.rng, self.fertility_rate);
        if next < death_time {
            state.events.schedule(EventKind::Reproduction, mother, next);
        }
        Ok(())
    }
}

/// Run with default parameters and an OS-seeded generator.
pub fn simulate(founders: usize, horizon: f64) -> Result<SimulationResult, SimError> {
    Simulation::from_config(&SimulationConfig::default())?.run(founders, horizon)
}

/// A time strictly after the finite `time`.
fn just_after(time: f64) -> f64 {
    time + f64::EPSILON * time.abs().max(1.0)
}

/// The first sampling boundary strictly after `time`.
fn next_boundary(time: f64, interval: f64) -> f64 {
    let next = ((time / interval).floor() + 1.0) * interval;
    if next > time { next } else { just_after(time) }
}

fn random_sex(rng: &mut impl Rng) -> Sex {
    if rng.random_bool(0.5) {
        Sex::Female
    } else {
        Sex::Male
    }
}

// ---------------------------------------------------------------------------
// Per-run state
// ---------------------------------------------------------------------------

struct RunState {
    pedigree: Pedigree,
    events: EventQueue,
    population: PriorityQueue<ByDeathTime>,
    pool: MatePool,
    population_series: TimeSeries,
    sample_interval: f64,
    next_sample: f64,
    stats: RunStats,
}

impl RunState {
    fn new(sample_interval: f64) -> Self {
        Self {
            pedigree: Pedigree::new(),
            events: EventQueue::new(),
            population: PriorityQueue::new(),
            pool: MatePool::new(),
            population_series: TimeSeries::new(),
            sample_interval,
            next_sample: 0.0,
            stats: RunStats::default(),
        }
    }

    fn on_death(&mut self, id: IndividualId, time: f64) -> Result<(), SimError> {
        let departed = self.population.extract_top()?;
        if departed.id != id {
            warn!(
                expected = %id,
                removed = %departed.id,
                time,
                "Population queue minimum differs from the dying individual"
            );
        }
        self.pool.remove(departed.id);
        self.stats.deaths = self.stats.deaths.saturating_add(1);
        Ok(())
    }

    /// Record the population size at the first birth on or after each
    /// sampling boundary. Further births at that same instant update the
    /// sample in place.
    fn sample_population(&mut self, time: f64) {
        let size = self.population.len();
        if time >= self.next_sample {
            self.population_series.push(time, size);
            self.next_sample = next_boundary(time, self.sample_interval);
        } else if let Some(last) = self.population_series.points.last_mut() {
            if last.time.total_cmp(&time) == Ordering::Equal {
                last.count = size;
            }
        }
    }

    fn finish(mut self) -> Result<RunOutput, SimError> {
        let mut survivors = Vec::with_capacity(self.population.len());
        while !self.population.is_empty() {
            survivors.push(self.population.extract_top()?.id);
        }
        self.stats.survivors = survivors.len();
        self.stats.individuals_created = self.pedigree.len();

        let (female_coalescence, male_coalescence) =
            coalescence_series(&self.pedigree, &survivors)?;

        Ok(RunOutput {
            result: SimulationResult {
                population: self.population_series,
                female_coalescence,
                male_coalescence,
                stats: self.stats,
            },
            pedigree: self.pedigree,
        })
    }
}

/// Log a summary of a finished run.
fn log_simulation_end(result: &SimulationResult) {
    let stats = &result.stats;
    info!(
        reason = ?stats.end_reason,
        events_processed = stats.events_processed,
        stale_events_dropped = stats.stale_events_dropped,
        births = stats.births,
        deaths = stats.deaths,
        offspring = stats.offspring_scheduled,
        survivors = stats.survivors,
        last_event_time = stats.last_event_time,
        female_coalescences = result.female_coalescence.len(),
        male_coalescences = result.male_coalescence.len(),
        "Simulation ended"
    );
    if stats.events_processed == 0 {
        warn!("Simulation ended with no events processed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::rngs::SmallRng;

    use super::*;

    fn seeded(seed: u64) -> Simulation<SmallRng> {
        Simulation::new(&SimulationConfig::default(), SmallRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn death_time_order_breaks_ties_by_id() {
        let a = ByDeathTime {
            death_time: 10.0,
            id: IndividualId(3),
        };
        let b = ByDeathTime {
            death_time: 10.0,
            id: IndividualId(1),
        };
        let c = ByDeathTime {
            death_time: 9.0,
            id: IndividualId(7),
        };
        assert_eq!(b.cmp(&a), Ordering::Less);
        assert_eq!(c.cmp(&b), Ordering::Less);
    }

    #[test]
    fn zero_founders_produce_nothing() {
        let mut sim = seeded(42);
        let result = sim.run(0, 1_000.0).unwrap();
        assert!(result.population.is_empty());
        assert!(result.female_coalescence.is_empty());
        assert!(result.male_coalescence.is_empty());
        assert_eq!(result.stats.events_processed, 0);
        assert_eq!(result.stats.end_reason, EndReason::EventsExhausted);
    }

    #[test]
    fn single_founder_zero_horizon_processes_one_birth() {
        let mut sim = seeded(42);
        let result = sim.run(1, 0.0).unwrap();
        assert_eq!(result.stats.births, 1);
        assert_eq!(result.stats.events_processed, 1);
        assert_eq!(result.stats.survivors, 1);
        assert_eq!(result.stats.end_reason, EndReason::HorizonReached);
        assert!(result.female_coalescence.is_empty());
        assert!(result.male_coalescence.is_empty());
    }

    #[test]
    fn founders_at_time_zero_share_one_sample() {
        let mut sim = seeded(1);
        let result = sim.run(25, 0.0).unwrap();
        assert_eq!(result.population.len(), 1);
        assert_eq!(result.population.first().map(|p| p.count), Some(25));
    }

    #[test]
    fn population_samples_are_spaced_by_interval() {
        let mut sim = seeded(7);
        let result = sim.run(200, 1_000.0).unwrap();
        let series = &result.population;
        assert!(series.is_time_ordered());
        assert!(series.points.windows(2).all(|w| match w {
            [a, b] => (b.time / 100.0).floor() > (a.time / 100.0).floor(),
            _ => true,
        }));
    }

    #[test]
    fn nan_horizon_is_rejected() {
        let mut sim = seeded(42);
        assert!(matches!(
            sim.run(10, f64::NAN),
            Err(SimError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SimulationConfig::default();
        config.model.death_rate = -1.0;
        let result = Simulation::new(&config, SmallRng::seed_from_u64(0));
        assert!(matches!(result, Err(SimError::InvalidConfiguration { .. })));
    }

    #[test]
    fn runs_are_reproducible_with_equal_seeds() {
        let a = seeded(99).run(100, 500.0).unwrap();
        let b = seeded(99).run(100, 500.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn stats_balance() {
        let mut sim = seeded(5);
        let output = sim.run_with_pedigree(150, 800.0).unwrap();
        let stats = output.result.stats;

        assert_eq!(stats.individuals_created, output.pedigree.len());
        let born = usize::try_from(stats.births).unwrap();
        let died = usize::try_from(stats.deaths).unwrap();
        assert_eq!(born.saturating_sub(died), stats.survivors);
        assert!(stats.offspring_scheduled <= stats.mating_attempts);
    }

    #[test]
    fn reproduction_after_death_is_dropped_as_stale() {
        // Mating attempts so rare that every founder dies first.
        let mut config = SimulationConfig::default();
        config.model.avg_lifetime_offspring = 1e-6;
        let mut sim = Simulation::new(&config, SmallRng::seed_from_u64(12)).unwrap();
        let output = sim.run_with_pedigree(20, f64::INFINITY).unwrap();
        let stats = output.result.stats;

        let females = output
            .pedigree
            .iter()
            .filter(|i| i.sex() == Sex::Female)
            .count();
        assert!(females > 0);
        assert_eq!(stats.stale_events_dropped, u64::try_from(females).unwrap());
        assert_eq!(stats.mating_attempts, 0);
        assert_eq!(stats.offspring_scheduled, 0);
        assert_eq!(stats.births, 20);
        assert_eq!(stats.deaths, 20);
        assert_eq!(stats.events_processed, 40);
        assert_eq!(stats.end_reason, EndReason::EventsExhausted);
    }

    #[test]
    fn death_time_follows_birth_at_any_magnitude() {
        let mut sim = seeded(3);
        for birth in [0.0, 1.0, 1e6, 1e17, 1e300] {
            assert!(sim.draw_death_time(birth) > birth, "birth at {birth}");
        }
        assert!(just_after(0.0) > 0.0);
        assert!(just_after(1e300) > 1e300);
    }

    #[test]
    fn sampling_boundaries_are_strictly_ahead() {
        assert!((next_boundary(0.0, 100.0) - 100.0).abs() < f64::EPSILON);
        assert!((next_boundary(250.0, 100.0) - 300.0).abs() < f64::EPSILON);
        assert!((next_boundary(300.0, 100.0) - 400.0).abs() < f64::EPSILON);
        assert!(next_boundary(1e20, 100.0) > 1e20);
        assert!(next_boundary(1e300, 0.5) > 1e300);
    }
}
