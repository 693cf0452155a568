use tracing::debug;

use super::types::{
    EngineConfig, MONTHS_PER_YEAR, ProjectionInput, ProjectionReport, ProjectionResult, YearSummary,
};
use crate::error::ProjectionError;

/// Runs the month-by-month compounding model.
///
/// Interest is credited on the opening balance of each month and the
/// contribution lands at the end of the month, so month `m` closes at
/// `balance * (1 + r) + contribution`. Balances are kept at full precision;
/// only the yearly profit breakdown is rounded to cents.
pub fn project(input: &ProjectionInput) -> ProjectionResult {
    let months = input.months() as usize;
    let growth = 1.0 + input.monthly_rate();
    let contribution = input.monthly_contribution();

    let mut monthly_balances = Vec::with_capacity(months);
    let mut balance = input.principal();
    for _ in 0..months {
        balance = balance * growth + contribution;
        monthly_balances.push(balance);
    }

    let final_balance = monthly_balances
        .last()
        .copied()
        .unwrap_or(input.principal());
    let total_invested = input.invested_by_year(input.years());
    let yearly_profits = (1..=input.years())
        .map(|year| {
            let closing = monthly_balances[(year * MONTHS_PER_YEAR) as usize - 1];
            round_cents(closing - input.invested_by_year(year))
        })
        .collect();

    ProjectionResult {
        monthly_balances,
        final_balance,
        total_invested,
        total_profit: final_balance - total_invested,
        yearly_profits,
    }
}

/// One row per year: closing balance, cumulative contributions and profit.
pub fn yearly_breakdown(input: &ProjectionInput, result: &ProjectionResult) -> Vec<YearSummary> {
    result
        .yearly_profits
        .iter()
        .enumerate()
        .map(|(idx, &profit)| {
            let year = idx as u32 + 1;
            let closing = result.monthly_balances[(year * MONTHS_PER_YEAR) as usize - 1];
            YearSummary {
                year,
                balance: round_cents(closing),
                invested: round_cents(input.invested_by_year(year)),
                profit,
            }
        })
        .collect()
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A projection engine bound to an explicit configuration.
///
/// Built once at startup and shared by reference; it holds no mutable state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn project(&self, input: &ProjectionInput) -> Result<ProjectionResult, ProjectionError> {
        if input.years() > self.config.max_years {
            return Err(ProjectionError::invalid(
                "years",
                format!("must be <= {}", self.config.max_years),
            ));
        }
        debug!(
            years = input.years(),
            rate = input.annual_rate_percent(),
            "running projection"
        );
        let result = project(input);
        let finite = result.final_balance.is_finite()
            && result.total_invested.is_finite()
            && result.total_profit.is_finite()
            && result.monthly_balances.iter().all(|b| b.is_finite());
        if !finite {
            return Err(ProjectionError::invalid("principal", "projection overflows"));
        }
        Ok(result)
    }

    pub fn report(&self, input: &ProjectionInput) -> Result<ProjectionReport, ProjectionError> {
        let projection = self.project(input)?;
        Ok(ProjectionReport {
            yearly_breakdown: yearly_breakdown(input, &projection),
            projection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_input() -> ProjectionInput {
        ProjectionInput::new(10_000.0, 500.0, 5.0, 10).expect("valid input")
    }

    /// Future value of a lump sum plus an ordinary annuity, compounded monthly.
    fn closed_form_final_balance(input: &ProjectionInput) -> f64 {
        let r = input.monthly_rate();
        let n = input.months() as f64;
        let growth = (1.0 + r).powf(n);
        let annuity = if r == 0.0 {
            n
        } else {
            (growth - 1.0) / r
        };
        input.principal() * growth + input.monthly_contribution() * annuity
    }

    #[test]
    fn sample_projection_matches_closed_form() {
        let input = sample_input();
        let result = project(&input);

        assert_eq!(result.total_invested, 70_000.0);
        assert_approx_tol(result.final_balance, closed_form_final_balance(&input), 1e-6);
        assert_eq!(round_cents(result.final_balance), 94_111.23);
        assert_approx(result.total_profit, result.final_balance - 70_000.0);
        assert_eq!(round_cents(result.total_profit), 24_111.23);
    }

    #[test]
    fn series_lengths_follow_the_term() {
        let result = project(&sample_input());
        assert_eq!(result.monthly_balances.len(), 120);
        assert_eq!(result.yearly_profits.len(), 10);
        assert_eq!(result.final_balance, *result.monthly_balances.last().unwrap());
    }

    #[test]
    fn first_month_credits_interest_before_contribution() {
        let input = ProjectionInput::new(1_000.0, 100.0, 12.0, 1).unwrap();
        let result = project(&input);
        assert_approx(result.monthly_balances[0], 1_000.0 * 1.01 + 100.0);
        assert_approx_tol(result.final_balance, 2_395.075331451667, 1e-9);
    }

    #[test]
    fn zero_inputs_produce_zero_balance_and_profit() {
        for rate in [-50.0, 0.0, 3.5, 250.0] {
            let input = ProjectionInput::new(0.0, 0.0, rate, 1).unwrap();
            let result = project(&input);
            assert_eq!(result.final_balance, 0.0);
            assert_eq!(result.total_profit, 0.0);
            assert!(result.yearly_profits.iter().all(|p| *p == 0.0));
        }
    }

    #[test]
    fn zero_rate_accumulates_contributions_only() {
        let input = ProjectionInput::new(2_500.0, 150.0, 0.0, 3).unwrap();
        let result = project(&input);
        assert_approx(result.final_balance, 2_500.0 + 150.0 * 36.0);
        assert_approx(result.total_profit, 0.0);
        assert_eq!(result.yearly_profits, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn yearly_profits_are_rounded_to_cents() {
        let input = sample_input();
        let result = project(&input);
        for (idx, profit) in result.yearly_profits.iter().enumerate() {
            let year = idx as u32 + 1;
            let closing = result.monthly_balances[(year * 12) as usize - 1];
            let expected = closing - input.invested_by_year(year);
            assert_approx_tol(*profit, expected, 0.005 + EPS);
            assert_eq!(*profit, round_cents(*profit));
        }
        assert_eq!(
            *result.yearly_profits.last().unwrap(),
            round_cents(result.total_profit)
        );
    }

    #[test]
    fn negative_rate_erodes_principal() {
        let input = ProjectionInput::new(10_000.0, 0.0, -12.0, 1).unwrap();
        let result = project(&input);
        assert!(result.final_balance < 10_000.0);
        assert!(result.total_profit < 0.0);
        assert_approx(result.final_balance, 10_000.0 * 0.99_f64.powi(12));
    }

    #[test]
    fn projection_is_bit_identical_across_calls() {
        let input = ProjectionInput::new(1_234.56, 78.9, 6.75, 25).unwrap();
        let first = project(&input);
        let second = project(&input);

        assert_eq!(first.final_balance.to_bits(), second.final_balance.to_bits());
        assert_eq!(first.total_profit.to_bits(), second.total_profit.to_bits());
        let first_bits: Vec<u64> = first.monthly_balances.iter().map(|v| v.to_bits()).collect();
        let second_bits: Vec<u64> = second.monthly_balances.iter().map(|v| v.to_bits()).collect();
        assert_eq!(first_bits, second_bits);
        assert_eq!(first, second);
    }

    #[test]
    fn yearly_breakdown_tracks_profits_and_contributions() {
        let input = sample_input();
        let result = project(&input);
        let rows = yearly_breakdown(&input, &result);

        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].year, 1);
        assert_eq!(rows[0].invested, 16_000.0);
        assert_eq!(rows[9].invested, 70_000.0);
        assert_eq!(rows[9].balance, round_cents(result.final_balance));
        for (row, profit) in rows.iter().zip(&result.yearly_profits) {
            assert_eq!(row.profit, *profit);
        }
    }

    #[test]
    fn engine_enforces_configured_term_limit() {
        let engine = Engine::new(EngineConfig { max_years: 30 });
        let short = ProjectionInput::new(100.0, 10.0, 4.0, 30).unwrap();
        let long = ProjectionInput::new(100.0, 10.0, 4.0, 31).unwrap();

        assert_eq!(engine.project(&short).unwrap(), project(&short));
        let err = engine.project(&long).expect_err("term above limit");
        assert_eq!(err.field(), "years");
    }

    #[test]
    fn engine_rejects_projections_that_overflow() {
        let engine = Engine::default();
        let input = ProjectionInput::new(1e300, 0.0, 3_000.0, 100).unwrap();
        let err = engine.project(&input).expect_err("balance overflows f64");
        assert_eq!(
            err,
            ProjectionError::invalid("principal", "projection overflows")
        );
        assert!(engine.report(&input).is_err());

        let huge_contributions = ProjectionInput::new(f64::MAX, f64::MAX, 0.0, 1).unwrap();
        assert!(engine.project(&huge_contributions).is_err());
    }

    #[test]
    fn report_pairs_projection_with_breakdown() {
        let engine = Engine::default();
        let input = sample_input();
        let report = engine.report(&input).unwrap();
        assert_eq!(report.projection, project(&input));
        assert_eq!(report.yearly_breakdown, yearly_breakdown(&input, &report.projection));
    }

    #[test]
    fn round_cents_rounds_half_away_from_zero() {
        assert_eq!(round_cents(1.005_000_1), 1.01);
        assert_eq!(round_cents(2.344), 2.34);
        assert_eq!(round_cents(-2.346), -2.35);
        assert_eq!(round_cents(0.0), 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_invariants_hold_for_valid_inputs(
            principal_cents in 0u64..100_000_000,
            monthly_cents in 0u64..1_000_000,
            rate_bp in -10_000i32..3_000,
            years in 1u32..60
        ) {
            let principal = principal_cents as f64 / 100.0;
            let monthly = monthly_cents as f64 / 100.0;
            let rate = rate_bp as f64 / 100.0;
            let input = ProjectionInput::new(principal, monthly, rate, years).unwrap();
            let result = project(&input);

            prop_assert_eq!(result.monthly_balances.len(), (years * 12) as usize);
            prop_assert_eq!(result.yearly_profits.len(), years as usize);
            prop_assert_eq!(result.final_balance, *result.monthly_balances.last().unwrap());
            prop_assert_eq!(result.total_invested, principal + monthly * (years * 12) as f64);
            prop_assert_eq!(result.total_profit, result.final_balance - result.total_invested);
            prop_assert!(result.monthly_balances.iter().all(|b| b.is_finite()));
        }

        #[test]
        fn prop_balances_never_decrease_with_non_negative_rate(
            principal_cents in 0u64..50_000_000,
            monthly_cents in 0u64..500_000,
            rate_bp in 0i32..2_500,
            years in 1u32..40
        ) {
            let input = ProjectionInput::new(
                principal_cents as f64 / 100.0,
                monthly_cents as f64 / 100.0,
                rate_bp as f64 / 100.0,
                years,
            )
            .unwrap();
            let result = project(&input);

            let mut previous = input.principal();
            for balance in &result.monthly_balances {
                prop_assert!(*balance >= previous);
                previous = *balance;
            }
        }

        #[test]
        fn prop_iterative_model_agrees_with_closed_form(
            principal_cents in 0u64..10_000_000,
            monthly_cents in 0u64..200_000,
            rate_bp in 0i32..1_500,
            years in 1u32..40
        ) {
            let input = ProjectionInput::new(
                principal_cents as f64 / 100.0,
                monthly_cents as f64 / 100.0,
                rate_bp as f64 / 100.0,
                years,
            )
            .unwrap();
            let result = project(&input);
            let expected = closed_form_final_balance(&input);
            let tolerance = 1e-9 * expected.abs().max(1.0);
            prop_assert!(
                (result.final_balance - expected).abs() <= tolerance,
                "iterative {} vs closed form {}",
                result.final_balance,
                expected
            );
        }
    }
}
