//! # Scheduler Error Types
//!
//! The taxonomy mirrors the contract:
//! - configuration errors are rejected at the call that introduces them
//! - dispatch errors abandon one frame and leave timing state untouched
//! - a full buffer is *not* an error - that is ordinary backpressure
//! - `ShuttingDown` is the terminal indication blocked producers receive
//!   during teardown

use thiserror::Error;

pub use kinescope_scene::error::ConfigurationError;

/// A frame controller, decoration generator or render sink failed while
/// a frame was being dispatched.
///
/// Fatal to the frame, not to the scheduler: the frame is abandoned and
/// the next one proceeds normally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// A frame controller returned an error.
    #[error("frame controller {index} failed: {reason}")]
    Controller {
        /// Registration index of the controller.
        index: usize,
        /// The controller's error, stringified.
        reason: String,
    },

    /// A decoration generator returned an error.
    #[error("decoration generator {index} failed: {reason}")]
    Generator {
        /// Registration index of the generator.
        index: usize,
        /// The generator's error, stringified.
        reason: String,
    },

    /// The render sink rejected the composed frame.
    #[error("render sink rejected the frame: {reason}")]
    Sink {
        /// The sink's error, stringified.
        reason: String,
    },

    /// The render sink rejected a scene directive.
    #[error("render sink rejected a directive: {reason}")]
    Directive {
        /// The sink's error, stringified.
        reason: String,
    },
}

/// Errors surfaced by the scheduler's public contract.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// An invalid configuration request was rejected.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A frame was abandoned during dispatch.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A configuration file could not be parsed.
    #[error("configuration file rejected: {0}")]
    ConfigFile(#[from] toml::de::Error),

    /// The scheduler is tearing down; no more frames are accepted.
    #[error("scheduler is shutting down")]
    ShuttingDown,
}

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
