//! Decorative geometry shared between the scheduler and the renderer.
//!
//! These are the canonical representations handed across the render
//! boundary. They carry no scheduling behavior: a [`Geometry`] is a shape,
//! a pose and some display modifiers, optionally pinned to a simulated
//! body so the renderer can place it with that body's transform.

use serde::{Deserialize, Serialize};

/// 3D vector - position, direction, station.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vec3 {
    /// Creates a new `Vec3`
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit X vector
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Y vector
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit Z vector
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

/// Rigid pose: a body-fixed rotation followed by a translation.
///
/// The rotation is a body-fixed X-Y-Z Euler sequence in radians. This is
/// the only rotation representation crossing the boundary; renderers
/// convert to whatever their pipeline wants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Body-fixed X-Y-Z Euler rotation, radians.
    pub rotation: Vec3,
    /// Translation applied after the rotation.
    pub position: Vec3,
}

impl Transform {
    /// Identity pose.
    pub const IDENTITY: Self = Self {
        rotation: Vec3::ZERO,
        position: Vec3::ZERO,
    };

    /// Creates a pose from rotation and translation.
    #[must_use]
    pub const fn new(rotation: Vec3, position: Vec3) -> Self {
        Self { rotation, position }
    }

    /// Creates a pure translation.
    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self {
            rotation: Vec3::ZERO,
            position,
        }
    }
}

/// RGB color with components in 0..=1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red component, 0..=1.
    pub r: f64,
    /// Green component, 0..=1.
    pub g: f64,
    /// Blue component, 0..=1.
    pub b: f64,
}

impl Color {
    /// Creates a color, clamping each component into 0..=1.
    #[must_use]
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// Opaque white.
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    /// Black.
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Mid gray, the default decoration color.
    pub const GRAY: Self = Self {
        r: 0.5,
        g: 0.5,
        b: 0.5,
    };
}

impl Default for Color {
    fn default() -> Self {
        Self::GRAY
    }
}

/// Index of a simulated body that geometry can be attached to.
///
/// Index 0 is reserved for the ground frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyIndex(pub u32);

impl BodyIndex {
    /// The ground frame.
    pub const GROUND: Self = Self(0);
}

/// Shape of a piece of decorative geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// A single point.
    Point,
    /// A line segment between two stations (in the geometry's frame).
    Line {
        /// Start of the segment.
        from: Vec3,
        /// End of the segment.
        to: Vec3,
    },
    /// A sphere centered at the geometry origin.
    Sphere {
        /// Sphere radius.
        radius: f64,
    },
    /// An axis-aligned box.
    Cuboid {
        /// Half extents along each axis.
        half_extents: Vec3,
    },
    /// A cylinder along the geometry's Y axis.
    Cylinder {
        /// Cylinder radius.
        radius: f64,
        /// Half the cylinder height.
        half_height: f64,
    },
    /// A coordinate-frame marker (three axis lines).
    FrameAxes {
        /// Length of each drawn axis.
        axis_length: f64,
    },
    /// Billboard text.
    Text {
        /// The string to display.
        text: String,
    },
}

/// One piece of decorative geometry.
///
/// Built with [`Geometry::new`] plus the `with_*` modifiers:
///
/// ```
/// use kinescope_scene::{BodyIndex, Color, Geometry, Shape, Transform, Vec3};
///
/// let marker = Geometry::new(Shape::Sphere { radius: 0.05 })
///     .with_transform(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)))
///     .with_color(Color::new(1.0, 0.0, 0.0))
///     .attached_to(BodyIndex(3));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// The shape to draw.
    pub shape: Shape,
    /// Pose of the shape relative to its body (or ground if unattached).
    pub transform: Transform,
    /// Display color.
    pub color: Color,
    /// Opacity, 0 (invisible) ..= 1 (opaque).
    pub opacity: f64,
    /// Uniform scale modifier.
    pub scale: f64,
    /// Body the geometry rides on; `None` means fixed in ground.
    pub body: Option<BodyIndex>,
}

impl Geometry {
    /// Creates geometry with the default pose and display modifiers.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            transform: Transform::IDENTITY,
            color: Color::GRAY,
            opacity: 1.0,
            scale: 1.0,
            body: None,
        }
    }

    /// Sets the pose.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the color.
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the opacity, clamped into 0..=1.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Sets the uniform scale.
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Attaches the geometry to a body.
    #[must_use]
    pub fn attached_to(mut self, body: BodyIndex) -> Self {
        self.body = Some(body);
        self
    }
}

/// An always-present line whose endpoints track two body stations.
///
/// The renderer resolves the two stations to world space every frame, so
/// the line stretches and follows the bodies it connects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RubberBandLine {
    /// Body carrying the first endpoint.
    pub from_body: BodyIndex,
    /// Station of the first endpoint in its body frame.
    pub from_station: Vec3,
    /// Body carrying the second endpoint.
    pub to_body: BodyIndex,
    /// Station of the second endpoint in its body frame.
    pub to_station: Vec3,
    /// Line color.
    pub color: Color,
    /// Line thickness in display units.
    pub thickness: f64,
}

impl RubberBandLine {
    /// Creates a rubber-band line with default styling.
    #[must_use]
    pub fn new(
        from_body: BodyIndex,
        from_station: Vec3,
        to_body: BodyIndex,
        to_station: Vec3,
    ) -> Self {
        Self {
            from_body,
            from_station,
            to_body,
            to_station,
            color: Color::GRAY,
            thickness: 1.0,
        }
    }

    /// Sets the color.
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the thickness.
    #[must_use]
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_components_are_clamped() {
        let c = Color::new(-0.5, 0.5, 1.5);
        assert_eq!(c, Color { r: 0.0, g: 0.5, b: 1.0 });
    }

    #[test]
    fn geometry_builder_applies_modifiers() {
        let g = Geometry::new(Shape::Sphere { radius: 1.0 })
            .with_opacity(2.0)
            .with_scale(0.5)
            .attached_to(BodyIndex(7));
        assert_eq!(g.opacity, 1.0);
        assert_eq!(g.scale, 0.5);
        assert_eq!(g.body, Some(BodyIndex(7)));
    }
}
