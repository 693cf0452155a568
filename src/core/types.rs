use serde::Serialize;

use crate::error::ProjectionError;

pub const MONTHS_PER_YEAR: u32 = 12;

/// Lowest accepted annual rate. A policy floor: losing more than the whole
/// balance over a year is outside what the calculator models.
pub const MIN_ANNUAL_RATE_PERCENT: f64 = -100.0;

/// Hard ceiling on the term, independent of any engine configuration.
pub const MAX_SUPPORTED_YEARS: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionInput {
    principal: f64,
    monthly_contribution: f64,
    annual_rate_percent: f64,
    years: u32,
}

impl ProjectionInput {
    pub fn new(
        principal: f64,
        monthly_contribution: f64,
        annual_rate_percent: f64,
        years: u32,
    ) -> Result<Self, ProjectionError> {
        if !principal.is_finite() {
            return Err(ProjectionError::invalid("principal", "must be a number"));
        }
        if principal < 0.0 {
            return Err(ProjectionError::invalid("principal", "must be >= 0"));
        }
        if !monthly_contribution.is_finite() {
            return Err(ProjectionError::invalid("monthly", "must be a number"));
        }
        if monthly_contribution < 0.0 {
            return Err(ProjectionError::invalid("monthly", "must be >= 0"));
        }
        if !annual_rate_percent.is_finite() {
            return Err(ProjectionError::invalid("rate", "must be a number"));
        }
        if annual_rate_percent < MIN_ANNUAL_RATE_PERCENT {
            return Err(ProjectionError::invalid("rate", "must be >= -100"));
        }
        if years < 1 {
            return Err(ProjectionError::invalid("years", "must be >= 1"));
        }
        if years > MAX_SUPPORTED_YEARS {
            return Err(ProjectionError::invalid(
                "years",
                format!("must be <= {MAX_SUPPORTED_YEARS}"),
            ));
        }

        Ok(Self {
            principal,
            monthly_contribution,
            annual_rate_percent,
            years,
        })
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn monthly_contribution(&self) -> f64 {
        self.monthly_contribution
    }

    pub fn annual_rate_percent(&self) -> f64 {
        self.annual_rate_percent
    }

    pub fn years(&self) -> u32 {
        self.years
    }

    pub fn months(&self) -> u32 {
        self.years * MONTHS_PER_YEAR
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate_percent / 100.0 / MONTHS_PER_YEAR as f64
    }

    /// Principal plus every contribution made by the end of `year`.
    pub fn invested_by_year(&self, year: u32) -> f64 {
        self.principal + self.monthly_contribution * (MONTHS_PER_YEAR * year) as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub monthly_balances: Vec<f64>,
    pub final_balance: f64,
    pub total_invested: f64,
    pub total_profit: f64,
    pub yearly_profits: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    pub year: u32,
    pub balance: f64,
    pub invested: f64,
    pub profit: f64,
}

/// A projection together with its per-year rows, as served to API clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionReport {
    #[serde(flatten)]
    pub projection: ProjectionResult,
    pub yearly_breakdown: Vec<YearSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_years: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_years: 100 }
    }
}
