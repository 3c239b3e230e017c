use super::repository::RepositoryError;

/// User-correctable problem with a submitted request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `{field}`")]
    MissingField { field: String },
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field } | Self::InvalidValue { field, .. } => field,
        }
    }
}

/// Unexpected arithmetic failure; no partial result is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculationError {
    #[error("field `{field}` is not numeric")]
    NonNumeric { field: String },
    #[error("arithmetic overflow while computing {step}")]
    Overflow { step: &'static str },
}

impl CalculationError {
    pub fn non_numeric(field: &str) -> Self {
        Self::NonNumeric {
            field: field.to_string(),
        }
    }
}

/// Error raised by the simulation service.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Calculation(#[from] CalculationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
