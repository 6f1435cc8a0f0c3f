//! # Statistics Collector
//!
//! Counters for everything the scheduler decides: frames received,
//! rendered (split by path), dropped, late, buffer occupancy extremes
//! and time spent blocked. The collector has its own lock because it is
//! touched on both hot paths (render and drop) and must never contend
//! with the buffer monitor.
//!
//! Lifecycle: created with the scheduler, zeroed only by an explicit
//! [`StatsCollector::clear`], never implicitly.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;

/// Which path a rendered frame took through the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPath {
    /// Rendered on the producer thread by `report` (PassThrough,
    /// Sampling, unbuffered RealTime).
    Immediate,
    /// Drained from the frame buffer by the dispatch thread.
    Buffered,
    /// Forced through `draw_frame_now`, bypassing all policy.
    Direct,
}

/// A point-in-time copy of every counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsReport {
    /// Frames submitted via `report`.
    pub frames_received: u64,
    /// Frames rendered synchronously by `report`.
    pub rendered_immediate: u64,
    /// Frames rendered by the buffered dispatch path.
    pub rendered_buffered: u64,
    /// Frames rendered unconditionally by `draw_frame_now`.
    pub rendered_direct: u64,
    /// Frames dropped by the Sampling interval rule.
    pub frames_dropped: u64,
    /// Frames that arrived more than one interval late and forced an
    /// anchor reset.
    pub late_frames: u64,
    /// Highest buffer occupancy observed.
    pub buffer_high_water: usize,
    /// Lowest buffer occupancy observed after the first enqueue.
    pub buffer_low_water: usize,
    /// Total time producers spent blocked on a full buffer.
    pub producer_block: Duration,
    /// Total time `report` spent sleeping for rate limiting.
    pub rate_limit_wait: Duration,
}

impl StatsReport {
    /// Total frames rendered across all paths.
    #[must_use]
    pub const fn frames_rendered(&self) -> u64 {
        self.rendered_immediate + self.rendered_buffered + self.rendered_direct
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---- kinescope scheduler statistics ----")?;
        writeln!(f, "frames received:      {}", self.frames_received)?;
        writeln!(f, "frames rendered:      {}", self.frames_rendered())?;
        writeln!(f, "  immediate:          {}", self.rendered_immediate)?;
        writeln!(f, "  buffered:           {}", self.rendered_buffered)?;
        writeln!(f, "  direct:             {}", self.rendered_direct)?;
        writeln!(f, "frames dropped:       {}", self.frames_dropped)?;
        writeln!(f, "late frames:          {}", self.late_frames)?;
        writeln!(f, "buffer high water:    {}", self.buffer_high_water)?;
        writeln!(f, "buffer low water:     {}", self.buffer_low_water)?;
        writeln!(
            f,
            "producer blocked:     {:.3}s",
            self.producer_block.as_secs_f64()
        )?;
        writeln!(
            f,
            "rate-limit waits:     {:.3}s",
            self.rate_limit_wait.as_secs_f64()
        )
    }
}

/// Internal counter state. Low water uses a sentinel until the first
/// occupancy sample arrives.
#[derive(Clone, Copy, Debug)]
struct Counters {
    report: StatsReport,
    low_water_seen: bool,
}

impl Counters {
    const fn zeroed() -> Self {
        Self {
            report: StatsReport {
                frames_received: 0,
                rendered_immediate: 0,
                rendered_buffered: 0,
                rendered_direct: 0,
                frames_dropped: 0,
                late_frames: 0,
                buffer_high_water: 0,
                buffer_low_water: 0,
                producer_block: Duration::ZERO,
                rate_limit_wait: Duration::ZERO,
            },
            low_water_seen: false,
        }
    }
}

/// Thread-safe accumulator for scheduler statistics.
#[derive(Debug)]
pub struct StatsCollector {
    counters: Mutex<Counters>,
}

impl StatsCollector {
    /// Creates a collector with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counters: Mutex::new(Counters::zeroed()),
        }
    }

    /// Counts one submitted frame.
    pub fn record_received(&self) {
        self.counters.lock().report.frames_received += 1;
    }

    /// Counts one rendered frame on the given path.
    pub fn record_rendered(&self, path: RenderPath) {
        let mut c = self.counters.lock();
        match path {
            RenderPath::Immediate => c.report.rendered_immediate += 1,
            RenderPath::Buffered => c.report.rendered_buffered += 1,
            RenderPath::Direct => c.report.rendered_direct += 1,
        }
    }

    /// Counts one frame dropped by the Sampling rule.
    pub fn record_dropped(&self) {
        self.counters.lock().report.frames_dropped += 1;
    }

    /// Counts one late frame (anchor reset).
    pub fn record_late(&self) {
        self.counters.lock().report.late_frames += 1;
    }

    /// Samples the buffer occupancy after an enqueue or dequeue.
    pub fn record_occupancy(&self, occupancy: usize) {
        let mut c = self.counters.lock();
        c.report.buffer_high_water = c.report.buffer_high_water.max(occupancy);
        if c.low_water_seen {
            c.report.buffer_low_water = c.report.buffer_low_water.min(occupancy);
        } else {
            c.report.buffer_low_water = occupancy;
            c.low_water_seen = true;
        }
    }

    /// Accumulates time a producer spent blocked on a full buffer.
    pub fn record_producer_block(&self, blocked: Duration) {
        if !blocked.is_zero() {
            self.counters.lock().report.producer_block += blocked;
        }
    }

    /// Accumulates time spent sleeping for rate limiting.
    pub fn record_rate_limit_wait(&self, waited: Duration) {
        if !waited.is_zero() {
            self.counters.lock().report.rate_limit_wait += waited;
        }
    }

    /// Returns a copy of every counter.
    #[must_use]
    pub fn report(&self) -> StatsReport {
        self.counters.lock().report
    }

    /// Resets every counter to zero.
    pub fn clear(&self) {
        *self.counters.lock() = Counters::zeroed();
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_zeroes_everything() {
        let stats = StatsCollector::new();
        stats.record_received();
        stats.record_rendered(RenderPath::Immediate);
        stats.record_dropped();
        stats.record_occupancy(3);
        stats.clear();
        assert_eq!(stats.report(), StatsReport::default());
    }

    #[test]
    fn rendered_paths_are_counted_separately() {
        let stats = StatsCollector::new();
        stats.record_rendered(RenderPath::Immediate);
        stats.record_rendered(RenderPath::Buffered);
        stats.record_rendered(RenderPath::Buffered);
        stats.record_rendered(RenderPath::Direct);
        let report = stats.report();
        assert_eq!(report.rendered_immediate, 1);
        assert_eq!(report.rendered_buffered, 2);
        assert_eq!(report.rendered_direct, 1);
        assert_eq!(report.frames_rendered(), 4);
    }

    #[test]
    fn water_marks_track_extremes() {
        let stats = StatsCollector::new();
        stats.record_occupancy(2);
        stats.record_occupancy(5);
        stats.record_occupancy(1);
        let report = stats.report();
        assert_eq!(report.buffer_high_water, 5);
        assert_eq!(report.buffer_low_water, 1);
    }

    #[test]
    fn display_names_every_counter() {
        let text = StatsReport::default().to_string();
        assert!(text.contains("frames received"));
        assert!(text.contains("buffer high water"));
        assert!(text.contains("rate-limit waits"));
    }
}
