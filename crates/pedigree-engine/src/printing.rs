//! Text and JSON reports written to stdout.

use std::io::Write;

use pedigree_sim::AgeModel;
use pedigree_sim::lifespan::LifespanTabulation;
use pedigree_types::{SimulationResult, TimeSeries};

use crate::error::EngineError;

/// Write a human-readable report of a finished run.
pub fn write_report(out: &mut impl Write, result: &SimulationResult) -> std::io::Result<()> {
    write_series(out, "Population size", "population", &result.population)?;
    write_series(
        out,
        "Maternal coalescence",
        "lineages",
        &result.female_coalescence,
    )?;
    write_series(
        out,
        "Paternal coalescence",
        "lineages",
        &result.male_coalescence,
    )?;

    let stats = &result.stats;
    writeln!(out, "\nRun statistics")?;
    writeln!(out, "  end reason:          {:?}", stats.end_reason)?;
    writeln!(out, "  events processed:    {}", stats.events_processed)?;
    writeln!(out, "  stale events:        {}", stats.stale_events_dropped)?;
    writeln!(out, "  births:              {}", stats.births)?;
    writeln!(out, "  deaths:              {}", stats.deaths)?;
    writeln!(out, "  mating attempts:     {}", stats.mating_attempts)?;
    writeln!(out, "  offspring:           {}", stats.offspring_scheduled)?;
    writeln!(out, "  individuals created: {}", stats.individuals_created)?;
    writeln!(out, "  survivors:           {}", stats.survivors)?;
    match stats.last_event_time {
        Some(time) => writeln!(out, "  last event time:     {time:.3}")?,
        None => writeln!(out, "  last event time:     -")?,
    }
    Ok(())
}

fn write_series(
    out: &mut impl Write,
    title: &str,
    label: &str,
    series: &TimeSeries,
) -> std::io::Result<()> {
    writeln!(out, "\n{title} ({} points)", series.len())?;
    if series.is_empty() {
        return writeln!(out, "  (empty)");
    }
    writeln!(out, "  {:>12}\t{label}", "time")?;
    for point in series {
        writeln!(out, "  {:>12.3}\t{}", point.time, point.count)?;
    }
    Ok(())
}

/// Write a finished run as pretty-printed JSON.
pub fn write_json(out: &mut impl Write, result: &SimulationResult) -> Result<(), EngineError> {
    serde_json::to_writer_pretty(&mut *out, result)?;
    writeln!(out)?;
    Ok(())
}

/// Write the lifespan tabulation.
///
/// One row per sample: rank, lifespan, and the rank the survival function
/// predicts. The first and third columns should agree.
pub fn write_lifespans(
    out: &mut impl Write,
    model: &AgeModel,
    table: &LifespanTabulation,
) -> std::io::Result<()> {
    writeln!(out, "# {model}")?;
    writeln!(out, "# rank\tlifespan\texpected rank")?;
    for row in &table.rows {
        writeln!(out, "{}\t{}\t{}", row.rank, row.lifespan, row.expected_rank)?;
    }
    writeln!(
        out,
        "avg\t{}\tmating span (mother): {}\tstable rate {}\t// 1/{}",
        table.mean,
        table.fertile_span,
        table.stable_rate,
        table.fertile_span / 2.0
    )?;
    writeln!(out, "ks\t{}", table.ks_statistic)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn sample_result() -> SimulationResult {
        let mut result = SimulationResult::default();
        result.population.push(0.0, 10);
        result.population.push(100.5, 14);
        result.female_coalescence.push(42.0, 3);
        result.stats.births = 24;
        result.stats.last_event_time = Some(101.25);
        result
    }

    #[test]
    fn text_report_lists_series_and_stats() {
        let mut out = Vec::new();
        write_report(&mut out, &sample_result()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Population size (2 points)"));
        assert!(text.contains("100.500\t14"));
        assert!(text.contains("Maternal coalescence (1 points)"));
        assert!(text.contains("Paternal coalescence (0 points)\n  (empty)"));
        assert!(text.contains("births:              24"));
        assert!(text.contains("last event time:     101.250"));
    }

    #[test]
    fn json_report_round_trips() {
        let mut out = Vec::new();
        write_json(&mut out, &sample_result()).unwrap();
        let parsed: SimulationResult = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, sample_result());
    }

    #[test]
    fn lifespan_table_has_one_row_per_sample() {
        let model = AgeModel::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let table = model.tabulate(&mut rng, 50, 16.0, 50.0);

        let mut out = Vec::new();
        write_lifespans(&mut out, &model, &table).unwrap();
        let text = String::from_utf8(out).unwrap();

        let rows = text
            .lines()
            .filter(|line| line.chars().next().is_some_and(|c| c.is_ascii_digit()))
            .count();
        assert_eq!(rows, 50);
        assert!(text.starts_with("# AgeModel["));
        assert!(text.contains("\nks\t"));
    }
}
