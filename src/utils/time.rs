/// Frame timing driven by host timestamps (milliseconds, monotonic).
///
/// The first tick after creation or [`reset`](Self::reset) reports a zero
/// delta, so a long pause between frames never produces a jump.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    start_ms: Option<f64>,
    last_ms: Option<f64>,
    /// Time since the previous tick, in milliseconds.
    pub delta_ms: f64,
    /// Time since the first tick, in milliseconds.
    pub elapsed_ms: f64,
    /// Total number of ticks
    pub frame_count: u64,
}

impl FrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances to `now_ms`. Timestamps going backwards count as zero delta.
    pub fn tick(&mut self, now_ms: f64) {
        let start = *self.start_ms.get_or_insert(now_ms);
        self.delta_ms = self.last_ms.map_or(0.0, |last| (now_ms - last).max(0.0));
        self.elapsed_ms = (now_ms - start).max(0.0);
        self.last_ms = Some(now_ms);
        self.frame_count += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        (self.delta_ms / 1000.0) as f32
    }
}
