//! # Scene Configuration Errors
//!
//! Invalid configuration is rejected at the call that introduces it,
//! never silently repaired. The one documented exception: an out-of-range
//! slider *value* is clamped to the nearest bound rather than rejected.

use thiserror::Error;

/// Errors raised by scene and display configuration calls.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A slider was created or re-ranged with min above max.
    #[error("slider {id} range is inverted: min {min} > max {max}")]
    InvertedSliderRange {
        /// The slider id.
        id: i32,
        /// Requested lower bound.
        min: f64,
        /// Requested upper bound.
        max: f64,
    },

    /// A slider id was used twice.
    #[error("slider id {0} is already registered")]
    DuplicateSlider(i32),

    /// A slider operation referenced an id that was never registered.
    #[error("slider {0} is not registered")]
    UnknownSlider(i32),

    /// Camera clipping planes must satisfy 0 < near < far.
    #[error("invalid clipping planes: near {near}, far {far}")]
    InvalidClippingPlanes {
        /// Requested near plane distance.
        near: f64,
        /// Requested far plane distance.
        far: f64,
    },

    /// Camera field of view must lie strictly between 0 and pi radians.
    #[error("invalid field of view: {0} rad")]
    InvalidFieldOfView(f64),
}

/// Result type for scene configuration operations.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
