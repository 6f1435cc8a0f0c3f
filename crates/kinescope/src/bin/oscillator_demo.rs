//! # Damped Oscillator Demo
//!
//! A mass on a spring, integrated with a variable step and displayed
//! in RealTime mode: the simulation runs as fast as it can, the
//! scheduler holds every frame back to its wall-clock moment, and the
//! "renderer" is a line of terminal output per frame.
//!
//! Run with: `cargo run --bin oscillator_demo`

use kinescope::{
    BodyIndex, CallbackError, Color, Geometry, Mode, RenderSink, RenderedFrame, SceneDirective,
    Scheduler, SchedulerResult, Shape, Snapshot, Transform, Vec3,
};

/// Spring stiffness over mass, (rad/s)^2.
const STIFFNESS: f64 = 40.0;
/// Damping coefficient over mass, 1/s.
const DAMPING: f64 = 0.6;
/// Simulated seconds to run.
const DURATION: f64 = 6.0;

/// One snapshot of the oscillator.
#[derive(Clone, Copy, Debug)]
struct OscillatorState {
    time: f64,
    position: f64,
    velocity: f64,
}

impl Snapshot for OscillatorState {
    fn sim_time(&self) -> f64 {
        self.time
    }
}

/// Renders each frame as a one-line bar chart on stdout.
struct ConsoleSink;

impl RenderSink<OscillatorState> for ConsoleSink {
    fn render(&mut self, frame: RenderedFrame<'_, OscillatorState>) -> Result<(), CallbackError> {
        let column = (frame.snapshot.position * 30.0).round() as i64 + 32;
        let column = usize::try_from(column.max(0)).unwrap_or(0);
        println!(
            "t={:6.3}  |{:>width$}  ({} decorations)",
            frame.sim_time,
            "o",
            frame.geometry.len(),
            width = column
        );
        Ok(())
    }

    fn apply(&mut self, directive: &SceneDirective) -> Result<(), CallbackError> {
        println!("[display] {directive:?}");
        Ok(())
    }
}

fn step(state: &mut OscillatorState, dt: f64) {
    // Semi-implicit Euler keeps the oscillation stable at coarse steps.
    state.velocity -= (STIFFNESS * state.position + DAMPING * state.velocity) * dt;
    state.position += state.velocity * dt;
    state.time += dt;
}

fn run() -> SchedulerResult<()> {
    let mut scheduler = Scheduler::new(Box::new(ConsoleSink));
    scheduler.set_mode(Mode::RealTime);
    scheduler.set_desired_frame_rate(30.0);
    scheduler.set_window_title("damped oscillator")?;
    scheduler.add_decoration(
        BodyIndex::GROUND,
        Geometry::new(Shape::Sphere { radius: 0.05 })
            .with_color(Color::new(0.9, 0.3, 0.2))
            .with_transform(Transform::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0))),
    );

    let mut state = OscillatorState {
        time: 0.0,
        position: 1.0,
        velocity: 0.0,
    };

    // Variable step sizes, like an error-controlled integrator.
    let mut toggle = false;
    while state.time < DURATION {
        let dt = if toggle { 0.003 } else { 0.007 };
        toggle = !toggle;
        step(&mut state, dt);
        scheduler.report(&state)?;
    }

    scheduler.flush_frames()?;
    println!("{}", scheduler.dump_stats());
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("oscillator demo failed: {error}");
        std::process::exit(1);
    }
}
