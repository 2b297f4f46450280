/// Frames-per-second over one-second windows of host timestamps.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    window_start_ms: Option<f64>,
    frame_count: u32,
    pub current_fps: f32,
}

impl FpsCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one frame at `now_ms`. Returns the new rate whenever a window closes.
    pub fn update(&mut self, now_ms: f64) -> Option<f32> {
        let start = *self.window_start_ms.get_or_insert(now_ms);
        self.frame_count += 1;
        let accumulated_ms = now_ms - start;

        if accumulated_ms >= 1000.0 {
            self.current_fps = (f64::from(self.frame_count) * 1000.0 / accumulated_ms) as f32;
            self.window_start_ms = Some(now_ms);
            self.frame_count = 0;
            return Some(self.current_fps);
        }

        None
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
