//! # KINESCOPE Scheduler Core
//!
//! Frame-delivery scheduling between a simulation producing state
//! snapshots at irregular rates and a renderer consuming them at a
//! steady pace:
//! - Three delivery policies: pass-through, sampling, real-time
//! - Bounded frame buffer with blocking backpressure, never dropping
//!   in real-time mode
//! - Frame dispatch through user controllers and decoration generators
//!
//! ## Architecture Rules
//!
//! 1. **The producer never observes rendering latency** - buffered
//!    delivery decouples simulation stepping from display pacing
//! 2. **One decision per frame** - every reported frame maps to exactly
//!    one of render, drop, or enqueue
//! 3. **Callbacks cannot deadlock the scheduler** - frame callbacks see
//!    a read-only view and defer scene changes
//!
//! ## Example
//!
//! ```rust,ignore
//! use kinescope_core::{Mode, Scheduler};
//!
//! let mut scheduler = Scheduler::new(Box::new(my_sink));
//! scheduler.set_mode(Mode::RealTime);
//! loop {
//!     let state = simulation.step();
//!     scheduler.report(&state)?; // blocks only to pace delivery
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffer;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod policy;
pub mod scheduler;
pub mod stats;

pub use buffer::FrameBuffer;
pub use clock::{Clock, ManualClock, RealClock, SharedClock};
pub use config::SchedulerConfig;
pub use dispatch::{DecorationGenerator, FrameController, FrameDispatcher, SchedulerView};
pub use error::{DispatchError, SchedulerError, SchedulerResult};
pub use frame::{CallbackError, Frame, RenderSink, RenderedFrame, Snapshot};
pub use policy::{
    Action, Mode, ScheduleInfo, ScheduleState, DEFAULT_BUFFER_SECONDS, DEFAULT_FRAME_RATE,
};
pub use scheduler::Scheduler;
pub use stats::{RenderPath, StatsCollector, StatsReport};
