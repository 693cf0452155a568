mod engine;
mod parse;
mod types;

pub use engine::{Engine, project, round_cents, yearly_breakdown};
pub use parse::{parse_projection_input, projection_input_from_values};
pub use types::{
    EngineConfig, MAX_SUPPORTED_YEARS, MIN_ANNUAL_RATE_PERCENT, MONTHS_PER_YEAR, ProjectionInput,
    ProjectionReport, ProjectionResult, YearSummary,
};
