use super::types::ProjectionInput;
use crate::error::ProjectionError;

/// Builds a validated input from the raw strings of a form submission.
pub fn parse_projection_input(
    principal: &str,
    monthly: &str,
    rate: &str,
    years: &str,
) -> Result<ProjectionInput, ProjectionError> {
    let principal = parse_number("principal", principal)?;
    let monthly = parse_number("monthly", monthly)?;
    let rate = parse_number("rate", rate)?;
    let years = parse_number("years", years)?;
    projection_input_from_values(principal, monthly, rate, years)
}

/// Same checks as [`parse_projection_input`] for callers that already hold
/// numbers, such as a JSON body. The term may arrive as a float.
pub fn projection_input_from_values(
    principal: f64,
    monthly: f64,
    rate: f64,
    years: f64,
) -> Result<ProjectionInput, ProjectionError> {
    let years = whole_years(years)?;
    ProjectionInput::new(principal, monthly, rate, years)
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, ProjectionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ProjectionError::invalid(field, "is required"));
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| ProjectionError::invalid(field, format!("'{trimmed}' is not a number")))?;
    if !value.is_finite() {
        return Err(ProjectionError::invalid(field, "must be a finite number"));
    }
    Ok(value)
}

// "10" and "10.0" are both a ten-year term; "10.5" is not.
fn whole_years(value: f64) -> Result<u32, ProjectionError> {
    if !value.is_finite() {
        return Err(ProjectionError::invalid("years", "must be a finite number"));
    }
    if value < 1.0 {
        return Err(ProjectionError::invalid("years", "must be >= 1"));
    }
    if value.fract() != 0.0 {
        return Err(ProjectionError::invalid("years", "must be a whole number"));
    }
    if value > u32::MAX as f64 {
        return Err(ProjectionError::invalid("years", "is too large"));
    }
    Ok(value as u32)
}
