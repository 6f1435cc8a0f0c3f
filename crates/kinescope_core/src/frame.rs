//! # Frames and the Render Boundary
//!
//! A [`Frame`] pairs a simulated timestamp with an owned snapshot of the
//! simulation state. Snapshots are opaque to the scheduler: it never
//! inspects them beyond the timestamp, it only retains a clone while a
//! frame waits in the buffer.
//!
//! [`RenderSink`] is the process boundary. It is a synchronous sink:
//! its call latency directly affects real-time fidelity, and the
//! scheduler treats a slow sink like a slow renderer (backpressure).

use std::error::Error;

use kinescope_scene::{Geometry, RubberBandLine, SceneDirective};

/// Errors produced by render sinks and frame callbacks.
///
/// The dispatcher stringifies these into a
/// [`DispatchError`](crate::error::DispatchError) carrying the failing
/// callback's registration index.
pub type CallbackError = Box<dyn Error + Send + Sync>;

/// A read-only view of simulation state that can be scheduled.
///
/// The snapshot owns whatever the renderer needs to draw one frame; the
/// scheduler clones it when a frame has to outlive the `report` call
/// that submitted it.
pub trait Snapshot: Clone + Send + 'static {
    /// The simulated time this snapshot was taken at.
    fn sim_time(&self) -> f64;
}

/// The trivial snapshot: a bare timestamp with no state attached.
///
/// Handy for tests and for callers whose sink resolves state elsewhere.
impl Snapshot for f64 {
    fn sim_time(&self) -> f64 {
        *self
    }
}

/// One pending frame: an immutable (simulated time, snapshot) pair.
#[derive(Clone, Debug)]
pub struct Frame<S> {
    /// Simulated timestamp of the snapshot.
    pub sim_time: f64,
    /// The retained snapshot.
    pub snapshot: S,
}

impl<S: Snapshot> Frame<S> {
    /// Captures a frame from a caller-owned snapshot.
    #[must_use]
    pub fn capture(snapshot: &S) -> Self {
        Self {
            sim_time: snapshot.sim_time(),
            snapshot: snapshot.clone(),
        }
    }
}

/// A frame composed for rendering: the snapshot plus every piece of
/// geometry contributed for it, in contribution order (permanent
/// decorations first, then per-frame additions).
#[derive(Debug)]
pub struct RenderedFrame<'a, S> {
    /// Simulated timestamp of the frame.
    pub sim_time: f64,
    /// The snapshot being displayed.
    pub snapshot: &'a S,
    /// Composed geometry list.
    pub geometry: &'a [Geometry],
    /// Permanent rubber-band lines tracked by the renderer.
    pub rubber_bands: &'a [RubberBandLine],
}

/// The rendering collaborator.
///
/// Receives composed frames and display-option directives, and is
/// responsible for producing pixels. Implementations should return
/// quickly; the scheduler blocks on every call.
pub trait RenderSink<S>: Send {
    /// Renders one composed frame.
    ///
    /// # Errors
    ///
    /// A sink failure abandons the frame; the scheduler's timing state
    /// is unaffected.
    fn render(&mut self, frame: RenderedFrame<'_, S>) -> Result<(), CallbackError>;

    /// Applies one display-option change.
    ///
    /// # Errors
    ///
    /// A failure is reported to the caller that issued the directive.
    fn apply(&mut self, directive: &SceneDirective) -> Result<(), CallbackError>;
}
