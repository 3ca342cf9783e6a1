use thiserror::Error;

/// Errors surfaced by the pointing pipeline.
#[derive(Debug, Error)]
pub enum PointingError {
    /// A scalar input outside its physical range (e.g. a non-positive body height)
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    /// Eye and fingertip origins coincide, so no pointing direction exists
    #[error("degenerate pointing geometry: eye and fingertip origins coincide")]
    DegenerateGeometry,

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PointingError>;

/// Validate a strictly positive, finite scalar parameter.
pub(crate) fn require_positive(name: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(PointingError::InvalidParameter { name, value })
    }
}

pub(crate) fn require_finite(name: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PointingError::InvalidParameter { name, value })
    }
}
