use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

impl ProjectionError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidInput { field, .. } => field,
        }
    }
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("cannot chart an empty balance series")]
    EmptySeries,

    #[error("plotting error: {0}")]
    Drawing(String),

    #[error("PNG encoding error: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("configuration validation error: {0}")]
    Invalid(String),
}
