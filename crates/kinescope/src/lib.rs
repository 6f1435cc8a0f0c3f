//! # KINESCOPE
//!
//! Frame-delivery scheduling for interactive visualization: a
//! simulation reports state snapshots at whatever rate it produces
//! them, and the scheduler decides when each one reaches the renderer.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           KINESCOPE                              │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  ┌──────────────┐    report     ┌──────────────────────────┐    │
//! │  │  Simulation  │──────────────>│  Scheduler               │    │
//! │  │  (any rate)  │<──backpressure│  • PassThrough/Sampling/ │    │
//! │  └──────────────┘               │    RealTime policies     │    │
//! │                                 │  • bounded frame buffer  │    │
//! │                                 │  • statistics            │    │
//! │                                 └────────────┬─────────────┘    │
//! │                                              │ dispatch          │
//! │  ┌──────────────┐   directives  ┌────────────▼─────────────┐    │
//! │  │  Scene       │──────────────>│  RenderSink              │    │
//! │  │  vocabulary  │   + input     │  (your renderer)         │    │
//! │  └──────────────┘<──────────────└──────────────────────────┘    │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crates
//!
//! - `kinescope_core`: modes, buffer, dispatch, statistics
//! - `kinescope_scene`: geometry, display directives, UI and input

pub use kinescope_core::{
    CallbackError, Clock, DecorationGenerator, DispatchError, Frame, FrameController, ManualClock,
    Mode, RealClock, RenderSink, RenderedFrame, ScheduleInfo, Scheduler, SchedulerConfig,
    SchedulerError, SchedulerResult, SchedulerView, Snapshot, StatsReport,
};
pub use kinescope_scene::{
    BackgroundType, BodyIndex, Color, CoordinateAxis, Geometry, InputEvent, InputListener,
    InputSilo, KeyModifiers, Menu, RubberBandLine, SceneDirective, Shape, Transform, Vec3,
};
