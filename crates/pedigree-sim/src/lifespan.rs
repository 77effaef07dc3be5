//! Lifespan and fertility model (Gompertz–Makeham mortality).
//!
//! Mortality combines two competing risks:
//!
//! - an age-independent accident hazard with rate `accident_rate`, and
//! - a senescence hazard growing exponentially with age, parameterised by
//!   `death_rate` and `age_scale`.
//!
//! The survival function is
//!
//! ```text
//! S(a) = exp(-accident_rate * a - death_rate * (exp(a / death_rate) - 1) / F)
//! F    = exp(age_scale / death_rate)
//! ```
//!
//! Fertility is a Poisson point process. Its rate is chosen so that a
//! female surviving through her whole mating band averages
//! `avg_lifetime_offspring` mating attempts. The expected time spent alive
//! inside the band comes from integrating `S` numerically.

use rand::Rng;
use rand::distr::{Distribution, OpenClosed01};
use serde::Deserialize;

/// Maximum number of refinement rounds in [`AgeModel::integrate_survival`].
pub const MAX_SIMPSON_ITERATIONS: u32 = 20;

/// Refinement rounds that always run before convergence is tested.
const MIN_SIMPSON_ITERATIONS: u32 = 5;

/// Relative tolerance between successive Simpson estimates.
const SIMPSON_TOLERANCE: f64 = 1e-7;

/// Offspring per female that keeps a population at replacement level.
pub const REPLACEMENT_OFFSPRING: f64 = 2.0;

/// Errors raised when a model or mating configuration is out of domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A parameter violates its documented domain.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Which parameter was rejected and why.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// ModelParams
// ---------------------------------------------------------------------------

/// Tunable constants for the lifespan/fertility model.
///
/// The defaults are the customary "human" calibration. They are
/// configuration values only; nothing derives them.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ModelParams {
    /// Senescence time constant in years (must be > 0, default: 12.5).
    #[serde(default = "default_death_rate")]
    pub death_rate: f64,

    /// Yearly accident hazard (must be >= 0, default: 0.01).
    #[serde(default = "default_accident_rate")]
    pub accident_rate: f64,

    /// Probability a partnered individual keeps its mate when given the
    /// chance to switch (0--1, default: 0.9).
    #[serde(default = "default_loyalty_factor")]
    pub loyalty_factor: f64,

    /// Mean number of offspring over a fertile female's lifetime
    /// (must be > 0, default: 2.0).
    #[serde(default = "default_avg_lifetime_offspring")]
    pub avg_lifetime_offspring: f64,

    /// Age scale of the senescence hazard (must be > 0, default: 100).
    #[serde(default = "default_age_scale")]
    pub age_scale: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            death_rate: default_death_rate(),
            accident_rate: default_accident_rate(),
            loyalty_factor: default_loyalty_factor(),
            avg_lifetime_offspring: default_avg_lifetime_offspring(),
            age_scale: default_age_scale(),
        }
    }
}

impl ModelParams {
    /// Check every parameter against its domain.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.death_rate.is_finite() && self.death_rate > 0.0) {
            return Err(invalid(format!(
                "death_rate must be a positive finite number, got {}",
                self.death_rate
            )));
        }
        if !(self.accident_rate.is_finite() && self.accident_rate >= 0.0) {
            return Err(invalid(format!(
                "accident_rate must be a non-negative finite number, got {}",
                self.accident_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.loyalty_factor) {
            return Err(invalid(format!(
                "loyalty_factor must lie in [0, 1], got {}",
                self.loyalty_factor
            )));
        }
        if !(self.avg_lifetime_offspring.is_finite() && self.avg_lifetime_offspring > 0.0) {
            return Err(invalid(format!(
                "avg_lifetime_offspring must be a positive finite number, got {}",
                self.avg_lifetime_offspring
            )));
        }
        if !(self.age_scale.is_finite() && self.age_scale > 0.0) {
            return Err(invalid(format!(
                "age_scale must be a positive finite number, got {}",
                self.age_scale
            )));
        }
        if !(self.age_scale / self.death_rate).exp().is_finite() {
            return Err(invalid(format!(
                "age_scale / death_rate = {} overflows the age factor",
                self.age_scale / self.death_rate
            )));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> ModelError {
    ModelError::InvalidConfiguration { reason }
}

const fn default_death_rate() -> f64 {
    12.5
}

const fn default_accident_rate() -> f64 {
    0.01
}

const fn default_loyalty_factor() -> f64 {
    0.9
}

const fn default_avg_lifetime_offspring() -> f64 {
    2.0
}

const fn default_age_scale() -> f64 {
    100.0
}

// ---------------------------------------------------------------------------
// AgeModel
// ---------------------------------------------------------------------------

/// Result of integrating the survival function over an age range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanEstimate {
    /// Final Simpson estimate of the expected time alive in the range.
    pub value: f64,
    /// Refinement rounds performed.
    pub iterations: u32,
    /// Whether the tolerance was met before the iteration cap.
    pub converged: bool,
}

/// Validated Gompertz–Makeham lifespan model with fertility parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeModel {
    death_rate: f64,
    accident_rate: f64,
    /// `exp(age_scale / death_rate)`, fixed at construction.
    age_factor: f64,
    loyalty_factor: f64,
    avg_lifetime_offspring: f64,
}

impl Default for AgeModel {
    fn default() -> Self {
        Self::from_valid(&ModelParams::default())
    }
}

impl AgeModel {
    /// Build a model, rejecting out-of-domain parameters.
    pub fn new(params: &ModelParams) -> Result<Self, ModelError> {
        params.validate()?;
        Ok(Self::from_valid(params))
    }

    fn from_valid(params: &ModelParams) -> Self {
        Self {
            death_rate: params.death_rate,
            accident_rate: params.accident_rate,
            age_factor: (params.age_scale / params.death_rate).exp(),
            loyalty_factor: params.loyalty_factor,
            avg_lifetime_offspring: params.avg_lifetime_offspring,
        }
    }

    /// Senescence time constant.
    pub const fn death_rate(&self) -> f64 {
        self.death_rate
    }

    /// Accident hazard.
    pub const fn accident_rate(&self) -> f64 {
        self.accident_rate
    }

    /// Derived `exp(age_scale / death_rate)`.
    pub const fn age_factor(&self) -> f64 {
        self.age_factor
    }

    /// Probability of keeping a current mate when a switch is possible.
    pub const fn loyalty_factor(&self) -> f64 {
        self.loyalty_factor
    }

    /// Mean lifetime offspring of a fertile female.
    pub const fn avg_lifetime_offspring(&self) -> f64 {
        self.avg_lifetime_offspring
    }

    /// Probability of being alive past `age`.
    pub fn survival_probability(&self, age: f64) -> f64 {
        (-self.accident_rate * age
            - self.death_rate * (age / self.death_rate).exp_m1() / self.age_factor)
            .exp()
    }

    /// Draw an age at death.
    ///
    /// Two independent candidates are drawn, an exponential accident time
    /// and a Gompertz senescence time (inverse transform of a uniform), and
    /// the earlier one wins.
    pub fn random_lifespan<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let accidental = standard_exponential(rng) / self.accident_rate;
        let senescent = self.death_rate
            * (standard_exponential(rng) / self.death_rate * self.age_factor).ln_1p();
        accidental.min(senescent)
    }

    /// Exponential waiting time with the given rate.
    pub fn random_waiting_time<R: Rng + ?Sized>(rng: &mut R, rate: f64) -> f64 {
        standard_exponential(rng) / rate
    }

    /// Integrate the survival function over `[min_age, max_age]`.
    ///
    /// Starts from a single trapezoid and halves the step each round,
    /// combining consecutive trapezoid sums into a Simpson estimate. After
    /// the first five rounds it stops as soon as two successive Simpson
    /// estimates agree to a relative `1e-7` (or are both zero).
    pub fn integrate_survival(&self, min_age: f64, max_age: f64) -> SpanEstimate {
        let mut intervals: u32 = 1;
        let mut step = max_age - min_age;
        let mut trapezoid =
            step * 0.5 * (self.survival_probability(min_age) + self.survival_probability(max_age));
        let mut estimate = 0.0;
        let mut previous = -1.0;
        let mut iterations = 0;

        for iteration in 1..=MAX_SIMPSON_ITERATIONS {
            let first_midpoint = min_age + step * 0.5;
            let midpoint_sum: f64 = (0..intervals)
                .map(|i| self.survival_probability(first_midpoint + f64::from(i) * step))
                .sum();

            let coarser = trapezoid;
            trapezoid = 0.5 * (trapezoid + step * midpoint_sum);
            estimate = (4.0 * trapezoid - coarser) / 3.0;

            intervals = intervals.saturating_mul(2);
            step *= 0.5;
            iterations = iteration;

            if iteration > MIN_SIMPSON_ITERATIONS
                && ((previous - estimate).abs() < SIMPSON_TOLERANCE * previous
                    || (estimate == 0.0 && previous == 0.0))
            {
                return SpanEstimate {
                    value: estimate,
                    iterations,
                    converged: true,
                };
            }
            previous = estimate;
        }

        SpanEstimate {
            value: estimate,
            iterations,
            converged: false,
        }
    }

    /// Expected years alive between `min_age` and `max_age`.
    pub fn expected_fertile_span(&self, min_age: f64, max_age: f64) -> f64 {
        self.integrate_survival(min_age, max_age).value
    }

    /// Rate of the Poisson process driving a fertile female's mating attempts.
    pub fn fertility_rate(&self, min_age: f64, max_age: f64) -> f64 {
        self.avg_lifetime_offspring / self.expected_fertile_span(min_age, max_age)
    }

    /// Draw `samples` lifespans and compare them with the model's CDF.
    ///
    /// The fertile span is evaluated over `[min_age, max_age]`, normally the
    /// female mating band.
    pub fn tabulate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        samples: usize,
        min_age: f64,
        max_age: f64,
    ) -> LifespanTabulation {
        let mut lifespans: Vec<f64> = (0..samples).map(|_| self.random_lifespan(rng)).collect();
        lifespans.sort_by(f64::total_cmp);

        let n = count_as_f64(samples);
        let mean = if samples == 0 {
            0.0
        } else {
            lifespans.iter().sum::<f64>() / n
        };

        let rows = lifespans
            .iter()
            .enumerate()
            .map(|(i, &lifespan)| LifespanRow {
                rank: i.saturating_add(1),
                lifespan,
                expected_rank: n * (1.0 - self.survival_probability(lifespan)),
            })
            .collect();

        let ks = ks_statistic(&lifespans, |age| 1.0 - self.survival_probability(age));
        let fertile_span = self.expected_fertile_span(min_age, max_age);

        LifespanTabulation {
            rows,
            mean,
            fertile_span,
            stable_rate: REPLACEMENT_OFFSPRING / fertile_span,
            ks_statistic: ks,
        }
    }
}

impl core::fmt::Display for AgeModel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "AgeModel[accident {}, death rate {}, age factor {}]",
            self.accident_rate, self.death_rate, self.age_factor
        )
    }
}

/// `-ln(U)` for `U` uniform on `(0, 1]`.
fn standard_exponential<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u: f64 = OpenClosed01.sample(rng);
    -u.ln()
}

// ---------------------------------------------------------------------------
// Tabulation
// ---------------------------------------------------------------------------

/// One sorted lifespan sample next to the rank the model predicts for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifespanRow {
    /// 1-based empirical rank.
    pub rank: usize,
    /// Sampled age at death.
    pub lifespan: f64,
    /// `N * (1 - S(lifespan))`; should track `rank`.
    pub expected_rank: f64,
}

/// Empirical check of the lifespan sampler against the survival function.
#[derive(Debug, Clone, PartialEq)]
pub struct LifespanTabulation {
    /// Sorted samples with expected ranks.
    pub rows: Vec<LifespanRow>,
    /// Sample mean lifespan.
    pub mean: f64,
    /// Expected years alive within the evaluated mating band.
    pub fertile_span: f64,
    /// Fertility rate giving replacement-level offspring.
    pub stable_rate: f64,
    /// Kolmogorov–Smirnov distance between sample and model CDF.
    pub ks_statistic: f64,
}

/// Kolmogorov–Smirnov statistic of an ascending sample against `cdf`.
pub fn ks_statistic<F>(sorted: &[f64], cdf: F) -> f64
where
    F: Fn(f64) -> f64,
{
    let n = count_as_f64(sorted.len());
    sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let expected = cdf(x);
            let below = count_as_f64(i) / n;
            let above = count_as_f64(i.saturating_add(1)) / n;
            (expected - below).max(above - expected)
        })
        .fold(0.0, f64::max)
}

/// Lossless-enough conversion of a sample count for statistics.
fn count_as_f64(count: usize) -> f64 {
    u32::try_from(count).map_or(f64::from(u32::MAX), f64::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    fn configs() -> Vec<ModelParams> {
        vec![
            ModelParams::default(),
            ModelParams {
                accident_rate: 0.0,
                ..ModelParams::default()
            },
            ModelParams {
                death_rate: 5.0,
                accident_rate: 0.2,
                age_scale: 30.0,
                ..ModelParams::default()
            },
            ModelParams {
                death_rate: 40.0,
                accident_rate: 0.001,
                age_scale: 250.0,
                ..ModelParams::default()
            },
        ]
    }

    #[test]
    fn default_params_are_human_calibration() {
        let params = ModelParams::default();
        assert!(close(params.death_rate, 12.5, 0.0));
        assert!(close(params.accident_rate, 0.01, 0.0));
        assert!(close(params.loyalty_factor, 0.9, 0.0));
        assert!(close(params.avg_lifetime_offspring, 2.0, 0.0));
        assert!(close(params.age_scale, 100.0, 0.0));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn survival_is_one_at_birth_and_non_increasing() {
        for params in configs() {
            let model = AgeModel::new(&params).unwrap();

            assert!(close(model.survival_probability(0.0), 1.0, 1e-15));
            let mut previous = 1.0;
            for step in 1..=400 {
                let s = model.survival_probability(f64::from(step) * 0.5);
                assert!(s <= previous, "survival increased at step {step}");
                assert!(s >= 0.0);
                previous = s;
            }
            assert!(model.survival_probability(1_000.0) < 1e-6);
        }
    }

    #[test]
    fn rejects_out_of_domain_parameters() {
        let bad = [
            ModelParams {
                death_rate: 0.0,
                ..ModelParams::default()
            },
            ModelParams {
                death_rate: -1.0,
                ..ModelParams::default()
            },
            ModelParams {
                age_scale: 0.0,
                ..ModelParams::default()
            },
            ModelParams {
                accident_rate: -0.1,
                ..ModelParams::default()
            },
            ModelParams {
                loyalty_factor: 1.5,
                ..ModelParams::default()
            },
            ModelParams {
                loyalty_factor: f64::NAN,
                ..ModelParams::default()
            },
            ModelParams {
                avg_lifetime_offspring: 0.0,
                ..ModelParams::default()
            },
            ModelParams {
                death_rate: 0.01,
                age_scale: 100.0,
                ..ModelParams::default()
            },
        ];
        for params in bad {
            assert!(
                matches!(
                    AgeModel::new(&params),
                    Err(ModelError::InvalidConfiguration { .. })
                ),
                "{params:?} should be rejected"
            );
        }
    }

    #[test]
    fn lifespans_are_non_negative() {
        let mut rng = SmallRng::seed_from_u64(7);
        for params in configs() {
            let model = AgeModel::new(&params).unwrap();
            for _ in 0..5_000 {
                let lifespan = model.random_lifespan(&mut rng);
                assert!(lifespan >= 0.0);
                assert!(!lifespan.is_nan());
            }
        }
    }

    #[test]
    fn lifespan_distribution_tracks_survival_function() {
        let mut rng = SmallRng::seed_from_u64(2021);
        for params in configs() {
            let model = AgeModel::new(&params).unwrap();
            let mut samples: Vec<f64> =
                (0..10_000).map(|_| model.random_lifespan(&mut rng)).collect();
            samples.sort_by(f64::total_cmp);
            let d = ks_statistic(&samples, |age| 1.0 - model.survival_probability(age));
            // Critical value at alpha = 0.001 for n = 10_000 is about 0.0195.
            assert!(d < 0.03, "KS statistic {d} too large for {params:?}");
        }
    }

    #[test]
    fn fertile_span_is_deterministic_and_converges() {
        let model = AgeModel::default();
        let a = model.integrate_survival(16.0, 50.0);
        let b = model.integrate_survival(16.0, 50.0);
        assert_eq!(a, b);
        assert!(a.converged);
        assert!(a.iterations > MIN_SIMPSON_ITERATIONS);
        assert!(a.iterations <= MAX_SIMPSON_ITERATIONS);
        // Bounded by the band width and by the survival at its ends.
        assert!(a.value < 34.0 * model.survival_probability(16.0));
        assert!(a.value > 34.0 * model.survival_probability(50.0));
    }

    #[test]
    fn fertile_span_matches_closed_form_without_senescence() {
        // With a huge age scale the senescence term vanishes over the band,
        // leaving S(a) = exp(-acc * a), integrable in closed form.
        let params = ModelParams {
            death_rate: 50.0,
            accident_rate: 0.05,
            age_scale: 2_000.0,
            ..ModelParams::default()
        };
        let model = AgeModel::new(&params).unwrap();
        let numeric = model.expected_fertile_span(10.0, 40.0);
        let exact = ((-0.05_f64 * 10.0).exp() - (-0.05_f64 * 40.0).exp()) / 0.05;
        assert!(close(numeric, exact, 1e-6 * exact), "{numeric} vs {exact}");
    }

    #[test]
    fn fertility_rate_divides_offspring_by_span() {
        let model = AgeModel::default();
        let span = model.expected_fertile_span(16.0, 50.0);
        let rate = model.fertility_rate(16.0, 50.0);
        assert!(close(rate * span, 2.0, 1e-12));
    }

    #[test]
    fn waiting_times_have_requested_mean() {
        let mut rng = SmallRng::seed_from_u64(11);
        let rate = 0.25;
        let n = 20_000;
        let total: f64 = (0..n)
            .map(|_| AgeModel::random_waiting_time(&mut rng, rate))
            .sum();
        let mean = total / f64::from(n);
        assert!(close(mean, 4.0, 0.15), "mean waiting time {mean}");
    }

    #[test]
    fn zero_accident_rate_still_yields_finite_lifespans() {
        let params = ModelParams {
            accident_rate: 0.0,
            ..ModelParams::default()
        };
        let model = AgeModel::new(&params).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..1_000 {
            assert!(model.random_lifespan(&mut rng).is_finite());
        }
    }

    #[test]
    fn tabulation_reports_sorted_ranks() {
        let model = AgeModel::default();
        let mut rng = SmallRng::seed_from_u64(5);
        let table = model.tabulate(&mut rng, 1_000, 16.0, 50.0);
        assert_eq!(table.rows.len(), 1_000);
        assert!(table.rows.windows(2).all(|w| match w {
            [a, b] => a.lifespan <= b.lifespan && a.rank < b.rank,
            _ => true,
        }));
        assert!(table.mean > 0.0);
        assert!(close(table.stable_rate * table.fertile_span, 2.0, 1e-12));
        assert!(table.ks_statistic < 0.1);
    }

    #[test]
    fn display_names_parameters() {
        let text = AgeModel::default().to_string();
        assert!(text.starts_with("AgeModel[accident 0.01, death rate 12.5"));
    }
}
