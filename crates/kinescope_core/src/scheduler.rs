//! # Scheduler Core
//!
//! The top-level engine wiring clock, buffer, policy and dispatcher
//! together behind the producer-facing contract.
//!
//! ```text
//! simulation thread                      dispatch thread
//! ─────────────────                      ───────────────
//! report(snapshot)
//!   └─ policy decides ──┬─ Render ─ dispatch here, paced by sleeping
//!                       ├─ Drop ─── return immediately
//!                       └─ Enqueue ─ frame buffer ──► wake at target
//!                                    (blocks when full)   │
//!                                                         ▼
//!                                                  dispatch + sink
//! ```
//!
//! Two roles touch the scheduler: the producer calling [`Scheduler::report`],
//! and the dispatch thread draining the buffer at target times. Only
//! RealTime mode with a non-zero buffer uses the dispatch thread; the
//! other modes dispatch synchronously on the producer.
//!
//! Teardown is orderly: stop accepting frames, wake blocked producers
//! with a terminal error, discard what is still queued, join the
//! dispatch thread, then drop controllers/generators/listeners.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use kinescope_scene::camera::{validate_clipping_planes, validate_field_of_view};
use kinescope_scene::{
    BackgroundType, BodyIndex, Color, CoordinateAxis, Geometry, InputEvent, InputListener, Menu,
    RubberBandLine, SceneDirective, Transform, Vec3,
};

use crate::buffer::FrameBuffer;
use crate::clock::{RealClock, SharedClock};
use crate::dispatch::{DecorationGenerator, FrameController, FrameDispatcher};
use crate::error::{DispatchError, SchedulerResult};
use crate::frame::{Frame, RenderSink, Snapshot};
use crate::policy::{Action, Mode, ScheduleState};
use crate::stats::{RenderPath, StatsCollector, StatsReport};

/// Shared state between the producer-facing handle and the dispatch
/// thread. Each concern has its own lock: the buffer monitor, the
/// dispatcher, the schedule state, statistics.
struct Shared<S: Snapshot> {
    clock: SharedClock,
    state: Mutex<ScheduleState>,
    buffer: FrameBuffer<S>,
    dispatcher: Mutex<FrameDispatcher<S>>,
    stats: StatsCollector,
    listeners: Mutex<Vec<Box<dyn InputListener>>>,
    /// A dispatch failure raised on the dispatch thread, surfaced from
    /// the next `report`/`flush_frames` call.
    pending_error: Mutex<Option<DispatchError>>,
}

/// The frame-delivery scheduler.
///
/// Reconciles the irregular, variable-rate production of frames by a
/// simulation with the fixed-rate consumption of a renderer, according
/// to the current [`Mode`]. Owns the render sink and every registered
/// callback; all of them are dropped with the scheduler.
pub struct Scheduler<S: Snapshot> {
    shared: Arc<Shared<S>>,
    dispatch_thread: Option<JoinHandle<()>>,
}

impl<S: Snapshot> Scheduler<S> {
    /// Creates a scheduler feeding the given sink, using the system
    /// monotonic clock.
    #[must_use]
    pub fn new(sink: Box<dyn RenderSink<S>>) -> Self {
        Self::with_clock(sink, Arc::new(RealClock))
    }

    /// Creates a scheduler with an explicit clock source.
    #[must_use]
    pub fn with_clock(sink: Box<dyn RenderSink<S>>, clock: SharedClock) -> Self {
        let state = ScheduleState::new();
        let shared = Arc::new(Shared {
            clock,
            buffer: FrameBuffer::new(state.actual_buffer_frames()),
            state: Mutex::new(state),
            dispatcher: Mutex::new(FrameDispatcher::new(sink)),
            stats: StatsCollector::new(),
            listeners: Mutex::new(Vec::new()),
            pending_error: Mutex::new(None),
        });
        let dispatch_thread = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("kinescope-dispatch".to_owned())
                .spawn(move || run_dispatch_thread(&shared))
                // Thread spawning fails only on resource exhaustion.
                .expect("failed to spawn dispatch thread")
        };
        Self {
            shared,
            dispatch_thread: Some(dispatch_thread),
        }
    }

    // ========================================================================
    // FRAME DRAWING
    // ========================================================================

    /// Reports that a new simulation frame is available for rendering.
    ///
    /// - **PassThrough**: every frame renders; blocks the caller when a
    ///   frame rate is set and the interval has not elapsed
    /// - **Sampling**: renders if the next sample time was reached,
    ///   otherwise drops the frame and returns immediately
    /// - **RealTime**: queues the frame, blocking on a full buffer;
    ///   never drops
    ///
    /// # Errors
    ///
    /// A dispatch failure for this frame, or, in buffered RealTime, a
    /// failure parked by the dispatch thread for an earlier frame (the
    /// frame reported here was still scheduled normally);
    /// [`SchedulerError::ShuttingDown`](crate::error::SchedulerError::ShuttingDown)
    /// when teardown interrupts a blocked enqueue.
    pub fn report(&self, snapshot: &S) -> SchedulerResult<()> {
        self.shared.stats.record_received();
        let sim_time = snapshot.sim_time();
        let now = self.shared.clock.now();
        let action = self.shared.state.lock().decide(sim_time, now);
        match action {
            Action::Drop => {
                self.shared.stats.record_dropped();
                tracing::trace!(sim_time, "frame dropped by sampling rule");
            }
            Action::Render { not_before, late } => {
                if late {
                    self.shared.stats.record_late();
                    tracing::debug!(sim_time, "late frame, anchor reset");
                }
                if let Some(at) = not_before {
                    let now = self.shared.clock.now();
                    if at > now {
                        let wait = at - now;
                        self.shared.clock.sleep(wait);
                        self.shared.stats.record_rate_limit_wait(wait);
                    }
                }
                self.render_on_caller(snapshot, sim_time)?;
            }
            Action::Enqueue => {
                let (blocked, occupancy) =
                    self.shared.buffer.enqueue(Frame::capture(snapshot))?;
                self.shared.stats.record_producer_block(blocked);
                self.shared.stats.record_occupancy(occupancy);
            }
        }
        // Only after this frame is on its way: a parked failure belongs
        // to an earlier frame and must not cost this one its slot.
        if let Some(parked) = self.shared.pending_error.lock().take() {
            return Err(parked.into());
        }
        Ok(())
    }

    /// Draws a frame unconditionally: no queuing, no rate check, no
    /// effect on timing anchors. Counted in the rendered statistics.
    ///
    /// # Errors
    ///
    /// A dispatch failure for this frame.
    pub fn draw_frame_now(&self, snapshot: &S) -> SchedulerResult<()> {
        let sim_time = snapshot.sim_time();
        let info = self.shared.state.lock().info();
        let result = self
            .shared
            .dispatcher
            .lock()
            .dispatch(&info, snapshot, sim_time);
        match result {
            Ok(()) => {
                self.shared.stats.record_rendered(RenderPath::Direct);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, sim_time, "frame abandoned");
                Err(error.into())
            }
        }
    }

    /// Waits for the RealTime buffer to drain at its scheduled pace.
    ///
    /// Returns immediately when not in RealTime mode, when there is no
    /// buffer, or when it is already empty.
    ///
    /// # Errors
    ///
    /// Teardown while waiting, or a dispatch failure parked by the
    /// dispatch thread while draining.
    pub fn flush_frames(&self) -> SchedulerResult<()> {
        let realtime = self.shared.state.lock().mode() == Mode::RealTime;
        if realtime {
            self.shared.buffer.wait_empty()?;
        }
        if let Some(parked) = self.shared.pending_error.lock().take() {
            return Err(parked.into());
        }
        Ok(())
    }

    fn render_on_caller(&self, snapshot: &S, sim_time: f64) -> SchedulerResult<()> {
        let info = self.shared.state.lock().info();
        let result = self
            .shared
            .dispatcher
            .lock()
            .dispatch(&info, snapshot, sim_time);
        match result {
            Ok(()) => {
                self.shared.stats.record_rendered(RenderPath::Immediate);
                self.shared
                    .state
                    .lock()
                    .note_render(sim_time, self.shared.clock.now());
                Ok(())
            }
            Err(error) => {
                // Fatal to the frame, not to the scheduler: timing
                // state stays as it was.
                tracing::warn!(%error, sim_time, "frame abandoned");
                Err(error.into())
            }
        }
    }

    // ========================================================================
    // SCHEDULE CONFIGURATION
    // ========================================================================

    /// Current operating mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.shared.state.lock().mode()
    }

    /// Switches the operating mode. Timing anchors reset so pacing
    /// restarts cleanly from the next `report`.
    pub fn set_mode(&self, mode: Mode) {
        self.shared.state.lock().set_mode(mode);
        tracing::info!(?mode, "mode switched");
    }

    /// Requested frame rate; `None` means the mode default (unbounded
    /// for PassThrough, 30/sec for Sampling and RealTime).
    #[must_use]
    pub fn desired_frame_rate(&self) -> Option<f64> {
        self.shared.state.lock().desired_frame_rate()
    }

    /// Sets the frame rate to aim for. Zero or negative restores the
    /// default. Takes effect from the next `report`.
    pub fn set_desired_frame_rate(&self, frames_per_sec: f64) {
        let mut state = self.shared.state.lock();
        state.set_desired_frame_rate(frames_per_sec);
        self.shared.buffer.set_capacity(state.actual_buffer_frames());
    }

    /// Simulated seconds displayed per real second.
    #[must_use]
    pub fn real_time_scale(&self) -> f64 {
        self.shared.state.lock().real_time_scale()
    }

    /// Sets the RealTime scale factor. Zero or negative restores 1:1.
    pub fn set_real_time_scale(&self, sim_time_per_real_second: f64) {
        self.shared
            .state
            .lock()
            .set_real_time_scale(sim_time_per_real_second);
    }

    /// Requested buffer length in seconds (or the default if none was
    /// requested).
    #[must_use]
    pub fn desired_buffer_length_in_sec(&self) -> f64 {
        self.shared.state.lock().desired_buffer_seconds()
    }

    /// Sets the target buffer length in seconds. Zero disables
    /// buffering, negative restores the default; the actual length is
    /// the nearest whole number of frames.
    pub fn set_desired_buffer_length_in_sec(&self, seconds: f64) {
        let mut state = self.shared.state.lock();
        state.set_desired_buffer_seconds(seconds);
        self.shared.buffer.set_capacity(state.actual_buffer_frames());
    }

    /// Actual buffer length in seconds, frame-rounded.
    #[must_use]
    pub fn actual_buffer_length_in_sec(&self) -> f64 {
        self.shared.state.lock().actual_buffer_seconds()
    }

    /// Actual buffer length in frames.
    #[must_use]
    pub fn actual_buffer_length_in_frames(&self) -> usize {
        self.shared.state.lock().actual_buffer_frames()
    }

    // ========================================================================
    // STATISTICS
    // ========================================================================

    /// Copies the current statistics.
    #[must_use]
    pub fn dump_stats(&self) -> StatsReport {
        self.shared.stats.report()
    }

    /// Resets all statistics to zero. No effect on scheduling.
    pub fn clear_stats(&self) {
        self.shared.stats.clear();
    }

    // ========================================================================
    // SCENE BUILDING (exclusive access; illegal from frame callbacks)
    // ========================================================================

    /// Registers a frame controller, invoked once per dispatched frame
    /// in registration order. The scheduler owns it until teardown.
    pub fn add_frame_controller(&mut self, controller: Box<dyn FrameController<S>>) {
        self.shared.dispatcher.lock().add_controller(controller);
    }

    /// Registers a decoration generator, invoked once per dispatched
    /// frame in registration order. The scheduler owns it until
    /// teardown.
    pub fn add_decoration_generator(&mut self, generator: Box<dyn DecorationGenerator<S>>) {
        self.shared.dispatcher.lock().add_generator(generator);
    }

    /// Adds an always-present piece of geometry riding on `body`; its
    /// own transform is the pose in the body frame.
    pub fn add_decoration(&mut self, body: BodyIndex, geometry: Geometry) {
        self.shared.dispatcher.lock().add_decoration(body, geometry);
    }

    /// Adds an always-present rubber-band line tracking two body
    /// stations.
    pub fn add_rubber_band_line(&mut self, line: RubberBandLine) {
        self.shared.dispatcher.lock().add_rubber_band(line);
    }

    /// Adds a pull-down menu to the renderer's display.
    ///
    /// # Errors
    ///
    /// Sink rejection of the menu directive.
    pub fn add_menu(&mut self, menu: Menu) -> SchedulerResult<()> {
        self.shared.dispatcher.lock().define_menu(menu)
    }

    /// Adds a slider to the renderer's display. The initial value is
    /// clamped into range; the clamped value is returned.
    ///
    /// # Errors
    ///
    /// Inverted range, duplicate id, or sink rejection.
    pub fn add_slider(
        &mut self,
        title: &str,
        id: i32,
        min: f64,
        max: f64,
        value: f64,
    ) -> SchedulerResult<f64> {
        self.shared
            .dispatcher
            .lock()
            .define_slider(title, id, min, max, value)
    }

    /// Registers an input listener; events are offered to listeners in
    /// registration order until one consumes them. The scheduler owns
    /// it until teardown.
    pub fn add_input_listener(&mut self, listener: Box<dyn InputListener>) {
        self.shared.listeners.lock().push(listener);
    }

    /// Delivers one user event from the renderer side of the boundary.
    /// Never blocks. Returns whether any listener consumed the event.
    pub fn deliver_input(&self, event: &InputEvent) -> bool {
        let mut listeners = self.shared.listeners.lock();
        listeners.iter_mut().any(|listener| listener.handle(event))
    }

    // ========================================================================
    // DISPLAY OPTIONS (forwarded to the sink as directives)
    // ========================================================================

    /// Switches the background style.
    ///
    /// # Errors
    ///
    /// Sink rejection of the directive.
    pub fn set_background_type(&self, background: BackgroundType) -> SchedulerResult<()> {
        self.forward(SceneDirective::Background(background))
    }

    /// Sets the solid background color.
    ///
    /// # Errors
    ///
    /// Sink rejection of the directive.
    pub fn set_background_color(&self, color: Color) -> SchedulerResult<()> {
        self.forward(SceneDirective::BackgroundColor(color))
    }

    /// Positions the ground plane perpendicular to `up` at `height`.
    ///
    /// # Errors
    ///
    /// Sink rejection of the directive.
    pub fn set_ground_position(&self, up: CoordinateAxis, height: f64) -> SchedulerResult<()> {
        self.forward(SceneDirective::GroundPosition { up, height })
    }

    /// Enables or disables shadow casting.
    ///
    /// # Errors
    ///
    /// Sink rejection of the directive.
    pub fn set_show_shadows(&self, show: bool) -> SchedulerResult<()> {
        self.forward(SceneDirective::ShowShadows(show))
    }

    /// Changes the renderer window title.
    ///
    /// # Errors
    ///
    /// Sink rejection of the directive.
    pub fn set_window_title(&self, title: &str) -> SchedulerResult<()> {
        self.forward(SceneDirective::WindowTitle(title.to_owned()))
    }

    /// Positions the camera.
    ///
    /// # Errors
    ///
    /// Sink rejection of the directive.
    pub fn set_camera_pose(&self, pose: Transform) -> SchedulerResult<()> {
        self.forward(SceneDirective::CameraPose(pose))
    }

    /// Sets the camera's vertical field of view, radians.
    ///
    /// # Errors
    ///
    /// Values outside (0, pi), or sink rejection.
    pub fn set_camera_field_of_view(&self, fov: f64) -> SchedulerResult<()> {
        validate_field_of_view(fov)?;
        self.forward(SceneDirective::CameraFieldOfView(fov))
    }

    /// Sets the camera clipping planes.
    ///
    /// # Errors
    ///
    /// Planes violating `0 < near < far`, or sink rejection.
    pub fn set_camera_clipping_planes(&self, near: f64, far: f64) -> SchedulerResult<()> {
        validate_clipping_planes(near, far)?;
        self.forward(SceneDirective::CameraClippingPlanes { near, far })
    }

    /// Rotates the camera to look at a point.
    ///
    /// # Errors
    ///
    /// Sink rejection of the directive.
    pub fn point_camera_at(&self, point: Vec3, up: Vec3) -> SchedulerResult<()> {
        self.forward(SceneDirective::PointCameraAt { point, up })
    }

    /// Moves the camera so all geometry is visible.
    ///
    /// # Errors
    ///
    /// Sink rejection of the directive.
    pub fn zoom_camera_to_show_all_geometry(&self) -> SchedulerResult<()> {
        self.forward(SceneDirective::ZoomToShowAll)
    }

    /// Moves a slider, clamping the value into its registered range.
    /// Returns the effective value.
    ///
    /// # Errors
    ///
    /// Unknown slider id, or sink rejection.
    pub fn set_slider_value(&self, id: i32, value: f64) -> SchedulerResult<f64> {
        self.shared.dispatcher.lock().set_slider_value(id, value)
    }

    /// Changes a slider's range; the current value moves to the
    /// nearest limit if it no longer fits. Returns the resulting value.
    ///
    /// # Errors
    ///
    /// Inverted range, unknown id, or sink rejection.
    pub fn set_slider_range(&self, id: i32, min: f64, max: f64) -> SchedulerResult<f64> {
        self.shared.dispatcher.lock().set_slider_range(id, min, max)
    }

    /// Looks up a slider's current (clamped) value.
    #[must_use]
    pub fn slider_value(&self, id: i32) -> Option<f64> {
        self.shared.dispatcher.lock().slider_value(id)
    }

    fn forward(&self, directive: SceneDirective) -> SchedulerResult<()> {
        self.shared.dispatcher.lock().apply(&directive)?;
        Ok(())
    }
}

impl<S: Snapshot> Drop for Scheduler<S> {
    fn drop(&mut self) {
        // Stop accepting frames and wake every blocked producer and
        // flusher with the terminal indication.
        self.shared.buffer.shutdown();
        if let Some(handle) = self.dispatch_thread.take() {
            let _ = handle.join();
        }
        let discarded = self.shared.buffer.drain();
        if discarded > 0 {
            tracing::info!(discarded, "queued frames discarded at teardown");
        }
    }
}

/// Body of the dispatch thread: wake at each head frame's target time,
/// dequeue, dispatch. Parked on the buffer whenever it is empty, so
/// PassThrough and Sampling cost nothing here.
fn run_dispatch_thread<S: Snapshot>(shared: &Shared<S>) {
    loop {
        let Some(head_sim_time) = shared.buffer.wait_ready() else {
            tracing::debug!("dispatch thread stopping");
            return;
        };

        let now = shared.clock.now();
        let (target, late) = shared.state.lock().project_target(head_sim_time, now);
        if late {
            shared.stats.record_late();
            tracing::debug!(sim_time = head_sim_time, "late frame, anchor reset");
        } else if target > now && !shared.buffer.wait_until_due(shared.clock.as_ref(), target) {
            return;
        }

        let Some((frame, remaining)) = shared.buffer.pop() else {
            continue;
        };
        shared.stats.record_occupancy(remaining);

        let info = shared.state.lock().info();
        let result = shared
            .dispatcher
            .lock()
            .dispatch(&info, &frame.snapshot, frame.sim_time);
        match result {
            Ok(()) => {
                shared.stats.record_rendered(RenderPath::Buffered);
                shared
                    .state
                    .lock()
                    .note_render(frame.sim_time, shared.clock.now());
            }
            Err(error) => {
                // Surfaced from the producer's next report/flush call.
                tracing::warn!(%error, sim_time = frame.sim_time, "frame abandoned");
                *shared.pending_error.lock() = Some(error);
            }
        }
        if remaining == 0 {
            // Buffer drained: the next frame re-anchors real time.
            shared.state.lock().invalidate_anchor();
        }
        // Flush callers may return only now that the frame reached (or
        // was abandoned by) the sink.
        shared.buffer.dispatch_complete();
    }
}
