use crate::config::{FarmTables, Settings};
use crate::report;
use anyhow::{Context, Result};
use aquaforge_core::{
    evaluation::ThresholdEvaluator,
    logger::{self, TimeSeriesLogger},
    simulation::batch::BatchGenerator,
};
use aquaforge_schemas::{
    reading::{Parameter, Reading},
    violation::Violation,
};
use chrono::SubsecRound;
use rand::{rngs::StdRng, SeedableRng};
use std::{collections::BTreeMap, path::Path};

/// A seeded generator when a seed is configured, an entropy-seeded one otherwise.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Generates the historical batch and writes it to the telemetry CSV.
pub fn run_batch_generation(settings: &Settings, tables: &FarmTables) -> Result<Vec<Reading>> {
    println!("\n--- [Workflow] Generating {} simulated readings ---", settings.batch.records);

    let generator = BatchGenerator::new(tables.batch.clone())
        .context("Invalid batch simulation profile")?;
    let anchor = chrono::Local::now().naive_local().trunc_subsecs(0);
    let mut rng = make_rng(settings.seed);
    let readings = generator.generate(settings.batch.records, anchor, &mut rng);

    let mut csv = TimeSeriesLogger::new(&settings.batch.output)?;
    csv.log_all(&readings)?;

    println!("{} rows written to '{}'", csv.rows_written(), settings.batch.output);
    Ok(readings)
}

/// Loads the telemetry CSV, evaluates every reading and writes the adjustments workbook.
pub fn run_violation_report(settings: &Settings, tables: &FarmTables) -> Result<Vec<Violation>> {
    println!("\n--- [Workflow] Evaluating '{}' ---", settings.batch.output);

    let readings = logger::load_readings(&settings.batch.output)
        .with_context(|| format!("Failed to load telemetry from {}", settings.batch.output))?;
    let evaluator = ThresholdEvaluator::new(tables.ranges.clone())
        .context("Invalid parameter range table")?;
    let violations = evaluator.evaluate_all(&readings);

    report::write_adjustments_report(
        &settings.report.adjustments_path,
        &violations,
        Some(Path::new(&settings.report.logo_path)),
    )?;

    println!(
        "{} readings checked against {} ranges, {} adjustments recommended. Report: '{}'",
        readings.len(),
        evaluator.table().len(),
        violations.len(),
        settings.report.adjustments_path
    );
    Ok(violations)
}

pub fn run_decision_report(settings: &Settings, tables: &FarmTables) -> Result<()> {
    println!("\n--- [Workflow] Writing parameter decision table ---");
    report::write_decision_report(
        &settings.report.decisions_path,
        &tables.decisions,
        Some(Path::new(&settings.report.logo_path)),
    )?;
    println!("Decision table written to '{}'", settings.report.decisions_path);
    Ok(())
}

/// Reads the adjustments workbook back and prints how often each parameter was flagged.
pub fn show_adjustments(settings: &Settings) -> Result<Vec<Violation>> {
    let path = &settings.report.adjustments_path;
    println!("\n--- [Workflow] Adjustments recorded in '{}' ---", path);
    let violations = report::read_adjustments_report(path)?;

    let mut counts: BTreeMap<Parameter, usize> = BTreeMap::new();
    for v in &violations {
        *counts.entry(v.parameter).or_default() += 1;
    }
    for (parameter, count) in &counts {
        println!("{:<28} {:>6}", parameter.label(), count);
    }
    println!("{:<28} {:>6}", "Total", violations.len());
    Ok(violations)
}

/// Batch generation, evaluation and both workbooks, in that order.
pub fn run_pipeline(settings: &Settings, tables: &FarmTables) -> Result<()> {
    run_batch_generation(settings, tables)?;
    run_violation_report(settings, tables)?;
    run_decision_report(settings, tables)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_in(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        let path = |name: &str| dir.join(name).to_string_lossy().into_owned();
        settings.seed = Some(42);
        settings.batch.records = 50;
        settings.batch.output = path("datos.csv");
        settings.report.adjustments_path = path("ajustes.xlsx");
        settings.report.decisions_path = path("decision.xlsx");
        settings.report.logo_path = path("missing_logo.jpg");
        settings
    }

    #[test]
    fn pipeline_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let tables = FarmTables::default();

        run_pipeline(&settings, &tables).unwrap();

        assert!(Path::new(&settings.batch.output).is_file());
        assert!(Path::new(&settings.report.decisions_path).is_file());
        let expected = ThresholdEvaluator::default()
            .evaluate_all(&logger::load_readings(&settings.batch.output).unwrap());
        let written = show_adjustments(&settings).unwrap();
        assert_eq!(written.len(), expected.len());
        // Uniform draws over ranges wider than the evaluation bands always trip something.
        assert!(!written.is_empty());
    }

    #[test]
    fn same_seed_same_batch_values() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let tables = FarmTables::default();
        let first = run_batch_generation(&settings, &tables).unwrap();
        let second = run_batch_generation(&settings, &tables).unwrap();
        let values = |readings: &[Reading]| {
            readings.iter().map(|r| r.values.clone()).collect::<Vec<_>>()
        };
        assert_eq!(values(&first), values(&second));
    }

    #[test]
    fn evaluating_a_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        assert!(run_violation_report(&settings, &FarmTables::default()).is_err());
    }
}
