//! # Scene Directives
//!
//! The wire-level description of every display-option change the
//! scheduler can forward to its renderer. A directive is data, not a
//! call: the core validates a request, builds the directive, and hands
//! it to the render sink, which owns the actual display state.
//!
//! Directives arrive in two ways:
//! - immediately, from the scheduler's configuration surface
//! - batched, from frame controllers via the per-frame view, applied
//!   just before the frame they accompany is rendered

use serde::{Deserialize, Serialize};

use crate::geometry::{Color, Transform, Vec3};
use crate::ui::Menu;

/// Backgrounds the renderer is expected to support.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackgroundType {
    /// A ground plane that can receive shadows, plus a sky.
    #[default]
    GroundAndSky,
    /// A solid color, supplied separately.
    SolidColor,
}

/// A coordinate axis, used to orient the ground plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateAxis {
    /// The +X axis.
    X,
    /// The +Y axis.
    Y,
    /// The +Z axis.
    Z,
}

/// One display-option change, ready for the render sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SceneDirective {
    /// Switch the background style.
    Background(BackgroundType),
    /// Set the solid background color.
    BackgroundColor(Color),
    /// Orient the ground plane perpendicular to `up`, at `height` along it.
    GroundPosition {
        /// Axis the plane is perpendicular to; positive direction is up.
        up: CoordinateAxis,
        /// Plane position along that axis.
        height: f64,
    },
    /// Enable or disable shadow casting.
    ShowShadows(bool),
    /// Retitle the renderer window.
    WindowTitle(String),
    /// Place the camera at a pose.
    CameraPose(Transform),
    /// Set the camera's vertical field of view, radians.
    CameraFieldOfView(f64),
    /// Set the camera near/far clipping planes.
    CameraClippingPlanes {
        /// Near plane distance.
        near: f64,
        /// Far plane distance.
        far: f64,
    },
    /// Rotate the camera to look at a point.
    PointCameraAt {
        /// The point to look at.
        point: Vec3,
        /// Direction that should appear upward.
        up: Vec3,
    },
    /// Move the camera so all geometry is visible.
    ZoomToShowAll,
    /// Define a pull-down menu.
    DefineMenu(Menu),
    /// Define a slider.
    DefineSlider {
        /// Label shown next to the slider.
        title: String,
        /// Unique slider id.
        id: i32,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
        /// Initial value (already clamped into range).
        value: f64,
    },
    /// Move a slider to a value (already clamped into range).
    SliderValue {
        /// Slider id.
        id: i32,
        /// Effective value.
        value: f64,
    },
    /// Change a slider's allowed range.
    SliderRange {
        /// Slider id.
        id: i32,
        /// New lower bound.
        min: f64,
        /// New upper bound.
        max: f64,
    },
}
