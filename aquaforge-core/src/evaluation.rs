use crate::error::AquaforgeError;
use aquaforge_schemas::{
    range::RangeTable,
    reading::Reading,
    violation::Violation,
};

/// Checks readings against a static table of acceptable ranges.
///
/// Parameters are evaluated independently; a parameter is only checked when it is present
/// in both the reading and the table. Output order follows the table.
#[derive(Debug, Clone)]
pub struct ThresholdEvaluator {
    table: RangeTable,
}

impl ThresholdEvaluator {
    /// # Errors
    ///
    /// Returns `AquaforgeError::InvalidRange` for the first range whose target does not
    /// sit inside `[min, max]`, or that has a non-finite bound.
    pub fn new(table: RangeTable) -> Result<Self, AquaforgeError> {
        if let Some(bad) = table.iter().find(|r| !r.is_consistent()) {
            return Err(AquaforgeError::InvalidRange {
                parameter: bad.parameter,
                min: bad.min,
                target: bad.target,
                max: bad.max,
            });
        }
        Ok(Self { table })
    }

    pub fn table(&self) -> &RangeTable {
        &self.table
    }

    pub fn evaluate(&self, reading: &Reading) -> Vec<Violation> {
        self.table
            .iter()
            .filter_map(|range| {
                let value = reading.value(range.parameter)?;
                if value < range.min || value > range.max {
                    Some(Violation {
                        timestamp: reading.timestamp,
                        parameter: range.parameter,
                        current_value: value,
                        target_value: range.target,
                        adjustment: range.adjustment.clone(),
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    /// Evaluates a batch, keeping reading order.
    pub fn evaluate_all<'a, I>(&self, readings: I) -> Vec<Violation>
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        let mut scanned = 0usize;
        let violations: Vec<Violation> = readings
            .into_iter()
            .inspect(|_| scanned += 1)
            .flat_map(|reading| self.evaluate(reading))
            .collect();
        tracing::info!(
            readings = scanned,
            violations = violations.len(),
            "threshold evaluation finished"
        );
        violations
    }
}

impl Default for ThresholdEvaluator {
    fn default() -> Self {
        Self {
            table: RangeTable::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquaforge_schemas::{
        range::ParameterRange,
        reading::Parameter,
    };
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
    }

    fn ph_only() -> ThresholdEvaluator {
        ThresholdEvaluator::new(RangeTable::new(vec![ParameterRange::new(
            Parameter::Ph,
            6.5,
            7.5,
            7.0,
            "Add acid to lower pH, base to increase",
        )]))
        .unwrap()
    }

    #[test]
    fn in_range_ph_produces_nothing() {
        let reading = Reading::new(ts()).with_value(Parameter::Ph, 7.0);
        assert!(ph_only().evaluate(&reading).is_empty());
    }

    #[test]
    fn high_ph_reports_target_and_action() {
        let reading = Reading::new(ts()).with_value(Parameter::Ph, 8.0);
        let violations = ph_only().evaluate(&reading);
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.parameter, Parameter::Ph);
        assert_eq!(v.current_value, 8.0);
        assert_eq!(v.target_value, 7.0);
        assert_eq!(v.timestamp, ts());
        assert_eq!(v.adjustment, "Add acid to lower pH, base to increase");
    }

    #[test]
    fn bounds_are_inclusive() {
        let evaluator = ph_only();
        for ph in [6.5, 7.5] {
            let reading = Reading::new(ts()).with_value(Parameter::Ph, ph);
            assert!(evaluator.evaluate(&reading).is_empty());
        }
    }

    #[test]
    fn parameters_missing_on_either_side_are_skipped() {
        let reading = Reading::new(ts())
            .with_value(Parameter::EnergyConsumption, 500.0)
            .with_value(Parameter::WaterFlow, 0.0);
        let violations = ThresholdEvaluator::default().evaluate(&reading);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].parameter, Parameter::WaterFlow);
    }

    #[test]
    fn nan_is_never_flagged() {
        let reading = Reading::new(ts()).with_value(Parameter::Ph, f64::NAN);
        assert!(ph_only().evaluate(&reading).is_empty());
    }

    #[test]
    fn violations_follow_table_order() {
        let reading = Reading::new(ts())
            .with_value(Parameter::WaterLevel, 95.0)
            .with_value(Parameter::Ph, 5.0)
            .with_value(Parameter::DissolvedOxygen, 2.0);
        let params: Vec<Parameter> = ThresholdEvaluator::default()
            .evaluate(&reading)
            .into_iter()
            .map(|v| v.parameter)
            .collect();
        assert_eq!(
            params,
            vec![Parameter::DissolvedOxygen, Parameter::Ph, Parameter::WaterLevel]
        );
    }

    #[test]
    fn evaluation_is_deterministic() {
        let readings: Vec<Reading> = (0..5)
            .map(|i| {
                Reading::new(ts())
                    .with_value(Parameter::Ph, 6.0 + i as f64 * 0.5)
                    .with_value(Parameter::Nitrite, i as f64 * 0.4)
            })
            .collect();
        let evaluator = ThresholdEvaluator::default();
        assert_eq!(evaluator.evaluate_all(&readings), evaluator.evaluate_all(&readings));
    }

    #[test]
    fn inconsistent_range_is_rejected() {
        let table = RangeTable::new(vec![ParameterRange::new(Parameter::Ph, 6.5, 7.5, 8.0, "")]);
        assert!(matches!(
            ThresholdEvaluator::new(table),
            Err(AquaforgeError::InvalidRange { parameter: Parameter::Ph, .. })
        ));
    }

    #[test]
    fn unbounded_range_is_rejected() {
        let table = RangeTable::new(vec![ParameterRange::new(
            Parameter::Nitrate,
            10.0,
            f64::INFINITY,
            30.0,
            "",
        )]);
        assert!(matches!(
            ThresholdEvaluator::new(table),
            Err(AquaforgeError::InvalidRange { parameter: Parameter::Nitrate, .. })
        ));
    }

    #[test]
    fn table_is_kept_as_given() {
        let evaluator = ph_only();
        assert_eq!(evaluator.table().len(), 1);
        assert_eq!(evaluator.table().get(Parameter::Ph).map(|r| r.target), Some(7.0));
    }
}
