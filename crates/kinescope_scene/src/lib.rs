//! # KINESCOPE Scene
//!
//! The display-side vocabulary of the KINESCOPE visualizer: everything
//! that crosses the boundary between the frame scheduler and a renderer,
//! with none of the scheduling behavior.
//!
//! ## Contents
//!
//! 1. **Geometry** - decorative shapes, poses, colors, body attachment
//! 2. **Directives** - data descriptions of display-option changes
//! 3. **UI registry** - menus plus the slider clamp/reject rules
//! 4. **Input** - user events flowing back from the renderer, and the
//!    [`InputSilo`] that queues them without ever blocking delivery

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod camera;
pub mod directive;
pub mod error;
pub mod geometry;
pub mod input;
pub mod ui;

pub use camera::{DEFAULT_FAR_CLIP, DEFAULT_FIELD_OF_VIEW, DEFAULT_NEAR_CLIP};
pub use directive::{BackgroundType, CoordinateAxis, SceneDirective};
pub use error::{ConfigurationError, ConfigurationResult};
pub use geometry::{BodyIndex, Color, Geometry, RubberBandLine, Shape, Transform, Vec3};
pub use input::{InputEvent, InputListener, InputSilo, KeyModifiers};
pub use ui::{Menu, Slider, SliderRegistry};
