//! # Frame Dispatcher
//!
//! Turns a frame selected for rendering into a render-sink call:
//!
//! 1. invoke each registered [`FrameController`] in order, letting it
//!    append per-frame geometry and issue camera/slider directives
//!    through the read-only [`SchedulerView`]
//! 2. invoke each [`DecorationGenerator`] in order
//! 3. apply the directives the callbacks deferred
//! 4. compose permanent decorations + per-frame additions and hand the
//!    bundle to the sink
//!
//! Any callback failure aborts the frame: geometry appended so far is
//! discarded, the error propagates, and the scheduler's timing state is
//! untouched. Fatal to the frame, never to the scheduler.

use std::cell::RefCell;

use kinescope_scene::camera::{validate_clipping_planes, validate_field_of_view};
use kinescope_scene::ui::SliderRegistry;
use kinescope_scene::{
    ConfigurationResult, Geometry, Menu, RubberBandLine, SceneDirective, Transform, Vec3,
};

use crate::error::{DispatchError, SchedulerResult};
use crate::frame::{CallbackError, RenderSink, RenderedFrame};
use crate::policy::{Mode, ScheduleInfo};

/// Simulation-controlled per-frame effects.
///
/// Invoked just prior to rendering each frame, typically for camera
/// positioning. Controllers see the scheduler read-only; scene-mutation
/// calls (adding decorations, menus, sliders) need exclusive access to
/// the scheduler and therefore cannot be made from here.
pub trait FrameController<S>: Send {
    /// Contributes controls and geometry for the frame about to render.
    ///
    /// # Errors
    ///
    /// Any error abandons the frame.
    fn generate_controls(
        &mut self,
        scheduler: &SchedulerView<'_>,
        snapshot: &S,
        geometry: &mut Vec<Geometry>,
    ) -> Result<(), CallbackError>;
}

/// Produces dynamically generated geometry for every dispatched frame.
///
/// Pure with respect to scheduling: generators see only the snapshot.
pub trait DecorationGenerator<S>: Send {
    /// Appends geometry for the frame about to render.
    ///
    /// # Errors
    ///
    /// Any error abandons the frame.
    fn generate_decorations(
        &mut self,
        snapshot: &S,
        geometry: &mut Vec<Geometry>,
    ) -> Result<(), CallbackError>;
}

/// The read-only scheduler handle passed to frame controllers.
///
/// Exposes the schedule settings and the runtime (camera, slider-value)
/// controls. Controls are deferred: they collect into a directive batch
/// the dispatcher applies after every callback has run, just before the
/// frame itself.
#[derive(Debug)]
pub struct SchedulerView<'a> {
    info: &'a ScheduleInfo,
    directives: RefCell<Vec<SceneDirective>>,
}

impl<'a> SchedulerView<'a> {
    pub(crate) fn new(info: &'a ScheduleInfo) -> Self {
        Self {
            info,
            directives: RefCell::new(Vec::new()),
        }
    }

    /// Current operating mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.info.mode
    }

    /// Requested frame rate, `None` meaning the mode default.
    #[must_use]
    pub fn desired_frame_rate(&self) -> Option<f64> {
        self.info.desired_frame_rate
    }

    /// Simulated seconds displayed per real second.
    #[must_use]
    pub fn real_time_scale(&self) -> f64 {
        self.info.real_time_scale
    }

    /// Actual buffer capacity, frames.
    #[must_use]
    pub fn buffer_frames(&self) -> usize {
        self.info.buffer_frames
    }

    /// Actual buffer length, seconds.
    #[must_use]
    pub fn buffer_seconds(&self) -> f64 {
        self.info.buffer_seconds
    }

    /// Positions the camera for this frame.
    pub fn set_camera_pose(&self, pose: Transform) {
        self.push(SceneDirective::CameraPose(pose));
    }

    /// Sets the camera's vertical field of view, radians.
    ///
    /// # Errors
    ///
    /// Rejects values outside (0, pi).
    pub fn set_camera_field_of_view(&self, fov: f64) -> ConfigurationResult<()> {
        validate_field_of_view(fov)?;
        self.push(SceneDirective::CameraFieldOfView(fov));
        Ok(())
    }

    /// Sets the camera clipping planes.
    ///
    /// # Errors
    ///
    /// Rejects planes violating `0 < near < far`.
    pub fn set_camera_clipping_planes(&self, near: f64, far: f64) -> ConfigurationResult<()> {
        validate_clipping_planes(near, far)?;
        self.push(SceneDirective::CameraClippingPlanes { near, far });
        Ok(())
    }

    /// Rotates the camera to look at a point.
    pub fn point_camera_at(&self, point: Vec3, up: Vec3) {
        self.push(SceneDirective::PointCameraAt { point, up });
    }

    /// Moves the camera so all geometry is visible.
    pub fn zoom_camera_to_show_all_geometry(&self) {
        self.push(SceneDirective::ZoomToShowAll);
    }

    /// Moves a slider. The value is clamped into the slider's range
    /// when the directive batch is applied.
    pub fn set_slider_value(&self, id: i32, value: f64) {
        self.push(SceneDirective::SliderValue { id, value });
    }

    /// Retitles the renderer window.
    pub fn set_window_title(&self, title: &str) {
        self.push(SceneDirective::WindowTitle(title.to_owned()));
    }

    fn push(&self, directive: SceneDirective) {
        self.directives.borrow_mut().push(directive);
    }

    fn take_directives(&self) -> Vec<SceneDirective> {
        self.directives.take()
    }
}

/// Owns the render sink, the registered callbacks and the permanent
/// scene. One per scheduler, always behind the scheduler's dispatcher
/// lock.
pub struct FrameDispatcher<S> {
    sink: Box<dyn RenderSink<S>>,
    controllers: Vec<Box<dyn FrameController<S>>>,
    generators: Vec<Box<dyn DecorationGenerator<S>>>,
    decorations: Vec<Geometry>,
    rubber_bands: Vec<RubberBandLine>,
    sliders: SliderRegistry,
    menus: Vec<Menu>,
}

impl<S> FrameDispatcher<S> {
    /// Creates a dispatcher feeding the given sink.
    #[must_use]
    pub fn new(sink: Box<dyn RenderSink<S>>) -> Self {
        Self {
            sink,
            controllers: Vec::new(),
            generators: Vec::new(),
            decorations: Vec::new(),
            rubber_bands: Vec::new(),
            sliders: SliderRegistry::new(),
            menus: Vec::new(),
        }
    }

    /// Registers a frame controller; invoked in registration order.
    pub fn add_controller(&mut self, controller: Box<dyn FrameController<S>>) {
        self.controllers.push(controller);
    }

    /// Registers a decoration generator; invoked in registration order.
    pub fn add_generator(&mut self, generator: Box<dyn DecorationGenerator<S>>) {
        self.generators.push(generator);
    }

    /// Adds a permanent decoration riding on `body`. The geometry's own
    /// transform is its pose in the body frame.
    pub fn add_decoration(&mut self, body: kinescope_scene::BodyIndex, geometry: Geometry) {
        self.decorations.push(geometry.attached_to(body));
    }

    /// Adds a permanent rubber-band line.
    pub fn add_rubber_band(&mut self, line: RubberBandLine) {
        self.rubber_bands.push(line);
    }

    /// Defines a pull-down menu and forwards it to the sink.
    ///
    /// # Errors
    ///
    /// Surfaces sink rejection as a dispatch error.
    pub fn define_menu(&mut self, menu: Menu) -> SchedulerResult<()> {
        self.apply(&SceneDirective::DefineMenu(menu.clone()))?;
        self.menus.push(menu);
        Ok(())
    }

    /// Defines a slider, clamping the initial value into range.
    ///
    /// # Errors
    ///
    /// Rejects inverted ranges and duplicate ids; surfaces sink
    /// rejection.
    pub fn define_slider(
        &mut self,
        title: &str,
        id: i32,
        min: f64,
        max: f64,
        value: f64,
    ) -> SchedulerResult<f64> {
        let value = self.sliders.register(title, id, min, max, value)?;
        self.apply(&SceneDirective::DefineSlider {
            title: title.to_owned(),
            id,
            min,
            max,
            value,
        })?;
        Ok(value)
    }

    /// Moves a slider, clamping into its registered range. Returns the
    /// effective value.
    ///
    /// # Errors
    ///
    /// Rejects unknown ids; surfaces sink rejection.
    pub fn set_slider_value(&mut self, id: i32, value: f64) -> SchedulerResult<f64> {
        let value = self.sliders.set_value(id, value)?;
        self.apply(&SceneDirective::SliderValue { id, value })?;
        Ok(value)
    }

    /// Changes a slider's range, re-clamping its current value.
    /// Returns the resulting value.
    ///
    /// # Errors
    ///
    /// Rejects inverted ranges and unknown ids; surfaces sink
    /// rejection.
    pub fn set_slider_range(&mut self, id: i32, min: f64, max: f64) -> SchedulerResult<f64> {
        let value = self.sliders.set_range(id, min, max)?;
        self.apply(&SceneDirective::SliderRange { id, min, max })?;
        self.apply(&SceneDirective::SliderValue { id, value })?;
        Ok(value)
    }

    /// Looks up a slider's current (clamped) value.
    #[must_use]
    pub fn slider_value(&self, id: i32) -> Option<f64> {
        self.sliders.get(id).map(|slider| slider.value)
    }

    /// The menus defined so far, in definition order.
    #[must_use]
    pub fn menus(&self) -> &[Menu] {
        &self.menus
    }

    /// Forwards one directive straight to the sink.
    ///
    /// # Errors
    ///
    /// Wraps sink rejection as [`DispatchError::Directive`].
    pub fn apply(&mut self, directive: &SceneDirective) -> Result<(), DispatchError> {
        self.sink
            .apply(directive)
            .map_err(|source| DispatchError::Directive {
                reason: source.to_string(),
            })
    }

    /// Runs the full dispatch sequence for one frame.
    ///
    /// # Errors
    ///
    /// The first callback or sink failure aborts the frame; geometry
    /// accumulated so far is discarded.
    pub fn dispatch(
        &mut self,
        info: &ScheduleInfo,
        snapshot: &S,
        sim_time: f64,
    ) -> Result<(), DispatchError> {
        let view = SchedulerView::new(info);
        let mut per_frame = Vec::new();

        for (index, controller) in self.controllers.iter_mut().enumerate() {
            controller
                .generate_controls(&view, snapshot, &mut per_frame)
                .map_err(|source| DispatchError::Controller {
                    index,
                    reason: source.to_string(),
                })?;
        }
        for (index, generator) in self.generators.iter_mut().enumerate() {
            generator
                .generate_decorations(snapshot, &mut per_frame)
                .map_err(|source| DispatchError::Generator {
                    index,
                    reason: source.to_string(),
                })?;
        }

        for directive in view.take_directives() {
            self.apply_deferred(directive)?;
        }

        let mut geometry = self.decorations.clone();
        geometry.append(&mut per_frame);
        let frame = RenderedFrame {
            sim_time,
            snapshot,
            geometry: &geometry,
            rubber_bands: &self.rubber_bands,
        };
        self.sink
            .render(frame)
            .map_err(|source| DispatchError::Sink {
                reason: source.to_string(),
            })
    }

    /// Applies one directive deferred by a callback. Slider values pass
    /// through the registry clamp; a directive naming an unregistered
    /// slider is logged and skipped rather than killing the frame.
    fn apply_deferred(&mut self, directive: SceneDirective) -> Result<(), DispatchError> {
        match directive {
            SceneDirective::SliderValue { id, value } => match self.sliders.set_value(id, value) {
                Ok(clamped) => self.apply(&SceneDirective::SliderValue { id, value: clamped }),
                Err(rejected) => {
                    tracing::warn!(slider = id, %rejected, "ignoring slider directive");
                    Ok(())
                }
            },
            other => self.apply(&other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RenderSink;
    use kinescope_scene::{BodyIndex, Shape};
    use std::sync::{Arc, Mutex};

    /// Records everything it is handed.
    #[derive(Clone, Default)]
    struct RecordingSink {
        rendered: Arc<Mutex<Vec<(f64, usize)>>>,
        directives: Arc<Mutex<Vec<SceneDirective>>>,
    }

    impl RenderSink<f64> for RecordingSink {
        fn render(&mut self, frame: RenderedFrame<'_, f64>) -> Result<(), CallbackError> {
            self.rendered
                .lock()
                .unwrap()
                .push((frame.sim_time, frame.geometry.len()));
            Ok(())
        }

        fn apply(&mut self, directive: &SceneDirective) -> Result<(), CallbackError> {
            self.directives.lock().unwrap().push(directive.clone());
            Ok(())
        }
    }

    struct MarkerController(f64);

    impl FrameController<f64> for MarkerController {
        fn generate_controls(
            &mut self,
            _scheduler: &SchedulerView<'_>,
            _snapshot: &f64,
            geometry: &mut Vec<Geometry>,
        ) -> Result<(), CallbackError> {
            geometry.push(Geometry::new(Shape::Sphere { radius: self.0 }));
            Ok(())
        }
    }

    struct FailingController;

    impl FrameController<f64> for FailingController {
        fn generate_controls(
            &mut self,
            _scheduler: &SchedulerView<'_>,
            _snapshot: &f64,
            _geometry: &mut Vec<Geometry>,
        ) -> Result<(), CallbackError> {
            Err("camera solver diverged".into())
        }
    }

    fn info() -> ScheduleInfo {
        ScheduleInfo {
            mode: Mode::PassThrough,
            desired_frame_rate: None,
            real_time_scale: 1.0,
            buffer_frames: 0,
            buffer_seconds: 0.0,
        }
    }

    #[test]
    fn composes_permanent_then_per_frame_geometry() {
        let sink = RecordingSink::default();
        let rendered = Arc::clone(&sink.rendered);
        let mut dispatcher = FrameDispatcher::new(Box::new(sink));
        dispatcher.add_decoration(
            BodyIndex::GROUND,
            Geometry::new(Shape::Cuboid {
                half_extents: kinescope_scene::Vec3::new(1.0, 0.1, 1.0),
            }),
        );
        dispatcher.add_controller(Box::new(MarkerController(0.1)));
        dispatcher.add_controller(Box::new(MarkerController(0.2)));

        dispatcher.dispatch(&info(), &2.5, 2.5).unwrap();

        let calls = rendered.lock().unwrap();
        assert_eq!(calls.len(), 1);
        // One permanent decoration plus two controller spheres.
        assert_eq!(calls[0], (2.5, 3));
    }

    #[test]
    fn controller_failure_aborts_before_the_sink() {
        let sink = RecordingSink::default();
        let rendered = Arc::clone(&sink.rendered);
        let mut dispatcher = FrameDispatcher::new(Box::new(sink));
        dispatcher.add_controller(Box::new(MarkerController(0.1)));
        dispatcher.add_controller(Box::new(FailingController));

        let error = dispatcher.dispatch(&info(), &0.0, 0.0).unwrap_err();
        assert_eq!(
            error,
            DispatchError::Controller {
                index: 1,
                reason: "camera solver diverged".to_owned()
            }
        );
        assert!(rendered.lock().unwrap().is_empty());
    }

    #[test]
    fn deferred_slider_directive_is_clamped() {
        struct SliderController;
        impl FrameController<f64> for SliderController {
            fn generate_controls(
                &mut self,
                scheduler: &SchedulerView<'_>,
                _snapshot: &f64,
                _geometry: &mut Vec<Geometry>,
            ) -> Result<(), CallbackError> {
                scheduler.set_slider_value(7, 99.0);
                Ok(())
            }
        }

        let sink = RecordingSink::default();
        let directives = Arc::clone(&sink.directives);
        let mut dispatcher = FrameDispatcher::new(Box::new(sink));
        dispatcher.define_slider("gain", 7, 0.0, 10.0, 5.0).unwrap();
        dispatcher.add_controller(Box::new(SliderController));

        dispatcher.dispatch(&info(), &0.0, 0.0).unwrap();

        assert_eq!(dispatcher.slider_value(7), Some(10.0));
        let seen = directives.lock().unwrap();
        assert!(seen.contains(&SceneDirective::SliderValue { id: 7, value: 10.0 }));
    }

    #[test]
    fn slider_range_change_emits_updated_value() {
        let sink = RecordingSink::default();
        let directives = Arc::clone(&sink.directives);
        let mut dispatcher: FrameDispatcher<f64> = FrameDispatcher::new(Box::new(sink));
        dispatcher.define_slider("gain", 1, 0.0, 100.0, 80.0).unwrap();

        let value = dispatcher.set_slider_range(1, 0.0, 10.0).unwrap();
        assert_eq!(value, 10.0);

        let seen = directives.lock().unwrap();
        assert!(seen.contains(&SceneDirective::SliderRange {
            id: 1,
            min: 0.0,
            max: 10.0
        }));
        assert!(seen.contains(&SceneDirective::SliderValue { id: 1, value: 10.0 }));
    }
}
