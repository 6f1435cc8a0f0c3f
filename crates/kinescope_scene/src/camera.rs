//! Camera parameters and their validation rules.
//!
//! The camera lives on the renderer side; the scheduler only validates
//! requests and forwards them as directives. Our camera frame is
//! right-handed with x to the right, y up and the view direction along
//! -z.

use std::f64::consts::PI;

use crate::error::{ConfigurationError, ConfigurationResult};

/// Default vertical field of view, radians.
pub const DEFAULT_FIELD_OF_VIEW: f64 = PI / 4.0;

/// Default near clipping plane distance.
pub const DEFAULT_NEAR_CLIP: f64 = 0.01;

/// Default far clipping plane distance.
pub const DEFAULT_FAR_CLIP: f64 = 100.0;

/// Checks that clipping planes satisfy `0 < near < far`.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidClippingPlanes`] otherwise.
pub fn validate_clipping_planes(near: f64, far: f64) -> ConfigurationResult<()> {
    if near.is_finite() && far.is_finite() && near > 0.0 && near < far {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidClippingPlanes { near, far })
    }
}

/// Checks that a vertical field of view lies strictly inside (0, pi).
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidFieldOfView`] otherwise.
pub fn validate_field_of_view(fov: f64) -> ConfigurationResult<()> {
    if fov.is_finite() && fov > 0.0 && fov < PI {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidFieldOfView(fov))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clipping_planes_must_be_ordered_and_positive() {
        assert!(validate_clipping_planes(0.1, 100.0).is_ok());
        assert!(validate_clipping_planes(0.0, 100.0).is_err());
        assert!(validate_clipping_planes(5.0, 5.0).is_err());
        assert!(validate_clipping_planes(5.0, 1.0).is_err());
        assert!(validate_clipping_planes(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn field_of_view_bounds() {
        assert!(validate_field_of_view(DEFAULT_FIELD_OF_VIEW).is_ok());
        assert!(validate_field_of_view(0.0).is_err());
        assert!(validate_field_of_view(PI).is_err());
        assert!(validate_field_of_view(f64::INFINITY).is_err());
    }
}
