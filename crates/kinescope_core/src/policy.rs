//! # Mode Policy
//!
//! The three operating policies deciding what happens to each reported
//! frame, expressed as one tagged decision over the mutable
//! [`ScheduleState`]:
//!
//! - **PassThrough** - render every frame, blocking the producer when a
//!   frame rate is set; no simulated-time/real-time correspondence
//! - **Sampling** - render at most one frame per interval, drop the
//!   rest without blocking
//! - **RealTime** - map simulated time to real time through the scale
//!   factor and an anchor pair, buffering frames to smooth delivery
//!
//! Each decision is a pure function of (schedule state, incoming frame,
//! clock reading) -> [`Action`]; the scheduler engine performs the
//! blocking, queuing and dispatching the decision calls for, and
//! commits the timing consequences through
//! [`ScheduleState::note_render`] only once a frame actually reached
//! the sink. A frame abandoned by a dispatch failure therefore leaves
//! the sample slot and the anchor untouched.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Default frame rate for Sampling and RealTime modes, frames/sec.
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Default RealTime buffer length, seconds. Just under human perception
/// time, so buffering stays invisible while smoothing variable steps.
pub const DEFAULT_BUFFER_SECONDS: f64 = 0.150;

/// The operating modes for frame delivery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Render every reported frame, pacing the producer if a frame rate
    /// is set (default mode).
    #[default]
    PassThrough,
    /// Sample reported frames at fixed real-time intervals; drop the
    /// rest without blocking.
    Sampling,
    /// Synchronize displayed frames with simulated time.
    RealTime,
}

/// What to do with one reported frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Render on the calling thread.
    Render {
        /// Earliest instant the render may start; `None` means now.
        not_before: Option<Instant>,
        /// Whether the frame arrived late and reset the anchor.
        late: bool,
    },
    /// Discard the frame and return immediately.
    Drop,
    /// Queue the frame for the paced dispatch thread.
    Enqueue,
}

/// The (real time, simulated time) reference pair RealTime mode uses to
/// project target display times.
#[derive(Clone, Copy, Debug)]
pub struct TimeAnchor {
    /// Real time at the anchor.
    pub real: Instant,
    /// Simulated time at the anchor.
    pub sim: f64,
}

/// A copy of the schedule settings handed to frame callbacks.
#[derive(Clone, Copy, Debug)]
pub struct ScheduleInfo {
    /// Current operating mode.
    pub mode: Mode,
    /// Requested frame rate, `None` meaning the mode default.
    pub desired_frame_rate: Option<f64>,
    /// Simulated seconds per real second.
    pub real_time_scale: f64,
    /// Actual buffer capacity, frames.
    pub buffer_frames: usize,
    /// Actual buffer length, seconds.
    pub buffer_seconds: f64,
}

/// Mutable per-scheduler timing state.
///
/// Holds the mode, the requested rates and lengths, and the anchors the
/// policies project from. Configuration mutators reset the derived
/// fields they invalidate; switching mode resets all timing anchors so
/// pacing restarts cleanly.
#[derive(Clone, Debug)]
pub struct ScheduleState {
    mode: Mode,
    desired_frame_rate: Option<f64>,
    real_time_scale: f64,
    desired_buffer_seconds: Option<f64>,
    buffer_frames: usize,
    next_sample_due: Option<Instant>,
    last_render: Option<Instant>,
    anchor: Option<TimeAnchor>,
}

impl ScheduleState {
    /// Creates the default schedule: PassThrough, unbounded rate, scale
    /// 1.0, default buffer length.
    #[must_use]
    pub fn new() -> Self {
        let mut state = Self {
            mode: Mode::PassThrough,
            desired_frame_rate: None,
            real_time_scale: 1.0,
            desired_buffer_seconds: None,
            buffer_frames: 0,
            next_sample_due: None,
            last_render: None,
            anchor: None,
        };
        state.recompute_buffer();
        state
    }

    /// Current operating mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switches mode and resets every timing anchor.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.reset_timing();
    }

    /// Requested frame rate; `None` means the mode default (unbounded
    /// for PassThrough, 30/sec otherwise).
    #[must_use]
    pub fn desired_frame_rate(&self) -> Option<f64> {
        self.desired_frame_rate
    }

    /// Sets the requested frame rate. Zero, negative or non-finite
    /// restores the default.
    pub fn set_desired_frame_rate(&mut self, frames_per_sec: f64) {
        self.desired_frame_rate = if frames_per_sec.is_finite() && frames_per_sec > 0.0 {
            Some(frames_per_sec)
        } else {
            None
        };
        self.recompute_buffer();
    }

    /// Simulated seconds displayed per real second.
    #[must_use]
    pub fn real_time_scale(&self) -> f64 {
        self.real_time_scale
    }

    /// Sets the time scale. Zero, negative or non-finite restores 1:1.
    pub fn set_real_time_scale(&mut self, sim_time_per_real_second: f64) {
        self.real_time_scale =
            if sim_time_per_real_second.is_finite() && sim_time_per_real_second > 0.0 {
                sim_time_per_real_second
            } else {
                1.0
            };
    }

    /// Requested buffer length in seconds, or the default if none was
    /// requested.
    #[must_use]
    pub fn desired_buffer_seconds(&self) -> f64 {
        self.desired_buffer_seconds
            .unwrap_or(DEFAULT_BUFFER_SECONDS)
    }

    /// Sets the requested buffer length. Negative restores the default;
    /// zero requests no buffering at all.
    pub fn set_desired_buffer_seconds(&mut self, seconds: f64) {
        self.desired_buffer_seconds = if seconds.is_finite() && seconds >= 0.0 {
            Some(seconds)
        } else {
            None
        };
        self.recompute_buffer();
    }

    /// Actual buffer capacity in frames.
    #[must_use]
    pub fn actual_buffer_frames(&self) -> usize {
        self.buffer_frames
    }

    /// Actual buffer length in seconds (frame count times interval).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn actual_buffer_seconds(&self) -> f64 {
        self.buffer_frames as f64 / self.paced_rate()
    }

    /// Copies the settings callbacks are allowed to see.
    #[must_use]
    pub fn info(&self) -> ScheduleInfo {
        ScheduleInfo {
            mode: self.mode,
            desired_frame_rate: self.desired_frame_rate,
            real_time_scale: self.real_time_scale,
            buffer_frames: self.buffer_frames,
            buffer_seconds: self.actual_buffer_seconds(),
        }
    }

    /// Decides what happens to a frame reported at `sim_time`, observed
    /// at real time `now`. Reads the timing state without changing it;
    /// [`ScheduleState::note_render`] commits the decision's effects
    /// after the render succeeds.
    #[must_use]
    pub fn decide(&self, sim_time: f64, now: Instant) -> Action {
        match self.mode {
            Mode::PassThrough => {
                // Pace only when a rate was requested; the default is
                // unbounded.
                let not_before = match (self.desired_interval(), self.last_render) {
                    (Some(interval), Some(last)) => Some(last + interval),
                    _ => None,
                };
                Action::Render {
                    not_before,
                    late: false,
                }
            }
            Mode::Sampling => {
                if self.next_sample_due.is_some_and(|due| now < due) {
                    Action::Drop
                } else {
                    Action::Render {
                        not_before: None,
                        late: false,
                    }
                }
            }
            Mode::RealTime => {
                if self.buffer_frames > 0 {
                    Action::Enqueue
                } else {
                    // Unbuffered: the producer thread itself waits out
                    // the target time and renders synchronously.
                    let (target, late) = self.project_target(sim_time, now);
                    Action::Render {
                        not_before: Some(target),
                        late,
                    }
                }
            }
        }
    }

    /// Projects the target display time for a frame at `sim_time`.
    ///
    /// With no anchor the frame displays immediately and the eventual
    /// [`ScheduleState::note_render`] establishes the anchor. A frame
    /// more than one interval behind its target displays at `now`
    /// instead, and the returned flag reports that correction; the
    /// commit then re-anchors so subsequent frames resynchronize
    /// instead of compressing to catch up.
    #[must_use]
    pub fn project_target(&self, sim_time: f64, now: Instant) -> (Instant, bool) {
        match self.anchor {
            None => (now, false),
            Some(anchor) => {
                let elapsed_sim = (sim_time - anchor.sim).max(0.0);
                let target =
                    anchor.real + Duration::from_secs_f64(elapsed_sim / self.real_time_scale);
                // "In the past" ties count as ready; late means more
                // than one whole interval behind.
                if now > target + self.paced_interval() {
                    (now, true)
                } else {
                    (target, false)
                }
            }
        }
    }

    /// Records a completed render, committing every timing effect the
    /// decision implied: the PassThrough pacing anchor, the Sampling
    /// interval slot, and the RealTime anchor (established on first
    /// render, re-anchored after a late one).
    pub fn note_render(&mut self, sim_time: f64, now: Instant) {
        self.last_render = Some(now);
        match self.mode {
            Mode::PassThrough => {}
            Mode::Sampling => {
                self.next_sample_due = Some(now + self.paced_interval());
            }
            Mode::RealTime => {
                let late = self.project_target(sim_time, now).1;
                if self.anchor.is_none() || late {
                    self.anchor = Some(TimeAnchor {
                        real: now,
                        sim: sim_time,
                    });
                }
            }
        }
    }

    /// Forgets the RealTime anchor; the next frame re-anchors at the
    /// current real time. Called when the buffer drains.
    pub fn invalidate_anchor(&mut self) {
        self.anchor = None;
    }

    /// Effective paced frame rate (Sampling/RealTime default applies).
    #[must_use]
    pub fn paced_rate(&self) -> f64 {
        self.desired_frame_rate.unwrap_or(DEFAULT_FRAME_RATE)
    }

    /// Interval between paced frames.
    #[must_use]
    pub fn paced_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.paced_rate())
    }

    /// Interval requested for PassThrough, if any.
    fn desired_interval(&self) -> Option<Duration> {
        self.desired_frame_rate
            .map(|rate| Duration::from_secs_f64(1.0 / rate))
    }

    fn reset_timing(&mut self) {
        self.next_sample_due = None;
        self.last_render = None;
        self.anchor = None;
    }

    /// Rederives the buffer capacity: the whole number of frames whose
    /// frame times come closest to the requested length, at least one
    /// frame whenever buffering was requested at all.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn recompute_buffer(&mut self) {
        let seconds = self.desired_buffer_seconds();
        self.buffer_frames = if seconds > 0.0 {
            let frames = (seconds * self.paced_rate()).round() as usize;
            frames.max(1)
        } else {
            0
        };
    }
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};

    #[test]
    fn default_buffer_is_150ms_at_30fps() {
        let state = ScheduleState::new();
        // 0.15s * 30fps = 4.5 frames -> nearest whole frame count.
        assert!(
            (4..=5).contains(&state.actual_buffer_frames()),
            "expected 4 or 5 frames, got {}",
            state.actual_buffer_frames()
        );
    }

    #[test]
    fn buffer_sizing_follows_rate_and_request() {
        let mut state = ScheduleState::new();
        state.set_desired_frame_rate(60.0);
        state.set_desired_buffer_seconds(0.15);
        assert_eq!(state.actual_buffer_frames(), 9);

        state.set_desired_buffer_seconds(0.0);
        assert_eq!(state.actual_buffer_frames(), 0);

        // Tiny but non-zero request still buffers one frame.
        state.set_desired_buffer_seconds(0.001);
        assert_eq!(state.actual_buffer_frames(), 1);

        // Negative restores the default.
        state.set_desired_buffer_seconds(-1.0);
        assert_eq!(state.desired_buffer_seconds(), DEFAULT_BUFFER_SECONDS);
    }

    #[test]
    fn pass_through_unbounded_renders_immediately() {
        let clock = ManualClock::new();
        let state = ScheduleState::new();
        assert_eq!(
            state.decide(0.0, clock.now()),
            Action::Render {
                not_before: None,
                late: false
            }
        );
    }

    #[test]
    fn pass_through_paces_from_last_render() {
        let clock = ManualClock::new();
        let mut state = ScheduleState::new();
        state.set_desired_frame_rate(10.0);

        let t0 = clock.now();
        assert!(matches!(
            state.decide(0.0, t0),
            Action::Render {
                not_before: None,
                ..
            }
        ));
        state.note_render(0.0, t0);

        let Action::Render {
            not_before: Some(next),
            ..
        } = state.decide(0.1, t0)
        else {
            panic!("expected paced render");
        };
        assert_eq!(next, t0 + Duration::from_millis(100));
    }

    #[test]
    fn sampling_drops_inside_the_interval() {
        let clock = ManualClock::new();
        let mut state = ScheduleState::new();
        state.set_mode(Mode::Sampling);
        state.set_desired_frame_rate(10.0);

        assert!(matches!(
            state.decide(0.0, clock.now()),
            Action::Render { .. }
        ));
        state.note_render(0.0, clock.now());
        clock.advance(Duration::from_millis(50));
        assert_eq!(state.decide(0.05, clock.now()), Action::Drop);
        clock.advance(Duration::from_millis(60));
        assert!(matches!(
            state.decide(0.11, clock.now()),
            Action::Render { .. }
        ));
    }

    #[test]
    fn sampling_slot_is_consumed_only_by_a_completed_render() {
        let clock = ManualClock::new();
        let mut state = ScheduleState::new();
        state.set_mode(Mode::Sampling);
        state.set_desired_frame_rate(10.0);

        // A decision the caller never completes (the sink failed, say)
        // leaves the slot open for the next frame.
        assert!(matches!(
            state.decide(0.0, clock.now()),
            Action::Render { .. }
        ));
        clock.advance(Duration::from_millis(1));
        assert!(matches!(
            state.decide(0.001, clock.now()),
            Action::Render { .. }
        ));

        state.note_render(0.001, clock.now());
        clock.advance(Duration::from_millis(1));
        assert_eq!(state.decide(0.002, clock.now()), Action::Drop);
    }

    #[test]
    fn realtime_buffered_always_enqueues() {
        let clock = ManualClock::new();
        let mut state = ScheduleState::new();
        state.set_mode(Mode::RealTime);
        assert!(state.actual_buffer_frames() > 0);
        assert_eq!(state.decide(0.0, clock.now()), Action::Enqueue);
    }

    #[test]
    fn realtime_unbuffered_targets_track_sim_time() {
        let clock = ManualClock::new();
        let mut state = ScheduleState::new();
        state.set_mode(Mode::RealTime);
        state.set_desired_buffer_seconds(0.0);

        let t0 = clock.now();
        let (first, late) = match state.decide(0.0, t0) {
            Action::Render {
                not_before: Some(at),
                late,
            } => (at, late),
            other => panic!("expected render, got {other:?}"),
        };
        assert_eq!(first, t0);
        assert!(!late);
        state.note_render(0.0, t0);

        // One simulated second at scale 1.0 lands one real second out.
        let Action::Render {
            not_before: Some(second),
            late: false,
        } = state.decide(1.0, t0)
        else {
            panic!("expected on-time render");
        };
        assert_eq!(second, t0 + Duration::from_secs(1));
    }

    #[test]
    fn realtime_scale_compresses_targets() {
        let clock = ManualClock::new();
        let mut state = ScheduleState::new();
        state.set_mode(Mode::RealTime);
        state.set_desired_buffer_seconds(0.0);
        state.set_real_time_scale(2.0);

        let t0 = clock.now();
        let _ = state.decide(0.0, t0);
        state.note_render(0.0, t0);
        let Action::Render {
            not_before: Some(at),
            ..
        } = state.decide(1.0, t0)
        else {
            panic!("expected render");
        };
        // Two sim-seconds per real second: one sim-second shows 500ms out.
        assert_eq!(at, t0 + Duration::from_millis(500));
    }

    #[test]
    fn late_frame_resets_the_anchor() {
        let clock = ManualClock::new();
        let mut state = ScheduleState::new();
        state.set_mode(Mode::RealTime);
        state.set_desired_buffer_seconds(0.0);

        let _ = state.decide(0.0, clock.now());
        state.note_render(0.0, clock.now());
        // Arrive a full second after the frame's target.
        clock.advance(Duration::from_millis(1100));
        let now = clock.now();
        let (at, late) = match state.decide(0.1, now) {
            Action::Render {
                not_before: Some(at),
                late,
            } => (at, late),
            other => panic!("expected render, got {other:?}"),
        };
        assert!(late);
        assert_eq!(at, now);
        state.note_render(0.1, now);

        // Pacing resumes from the new anchor, not the old one.
        let (next, late) = state.project_target(0.6, now);
        assert!(!late);
        assert_eq!(next, now + Duration::from_millis(500));
    }

    #[test]
    fn abandoned_realtime_frame_leaves_the_anchor_unset() {
        let clock = ManualClock::new();
        let mut state = ScheduleState::new();
        state.set_mode(Mode::RealTime);
        state.set_desired_buffer_seconds(0.0);

        // First frame decided but never rendered: no anchor committed.
        let _ = state.decide(0.0, clock.now());
        clock.advance(Duration::from_secs(1));

        // The next frame starts the schedule fresh at its own instant.
        let now = clock.now();
        let (at, late) = state.project_target(1.0, now);
        assert_eq!(at, now);
        assert!(!late);
    }

    #[test]
    fn mode_switch_resets_anchors() {
        let clock = ManualClock::new();
        let mut state = ScheduleState::new();
        state.set_mode(Mode::RealTime);
        state.set_desired_buffer_seconds(0.0);
        let _ = state.decide(5.0, clock.now());
        state.note_render(5.0, clock.now());

        state.set_mode(Mode::RealTime);
        clock.advance(Duration::from_secs(10));
        // A fresh anchor: the old sim time 5.0 no longer matters.
        let (at, late) = state.project_target(100.0, clock.now());
        assert_eq!(at, clock.now());
        assert!(!late);
    }
}
