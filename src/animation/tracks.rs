use crate::animation::values::Interpolatable;

const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the last segment so forward playback samples in O(1).
#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// Linearly interpolated keyframes over ascending `times`.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    /// Track whose keys are evenly spaced over `[0, 1]`.
    #[must_use]
    pub fn evenly_spaced(values: Vec<T>) -> Self {
        let last = values.len().saturating_sub(1).max(1) as f32;
        let times = (0..values.len()).map(|i| i as f32 / last).collect();
        Self { times, values }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Segment containing `time` and the local progress inside it.
    ///
    /// The index is clamped to `len - 2`, so the final key reports the last
    /// segment with local progress 1. `None` for tracks with fewer than two keys.
    #[must_use]
    pub fn segment_at(&self, time: f32) -> Option<(usize, f32)> {
        let len = self.times.len();
        if len < 2 {
            return None;
        }
        let next_idx = self.times.partition_point(|&t| t <= time);
        let index = next_idx.saturating_sub(1).min(len - 2);
        Some((index, self.local_t(index, time)))
    }

    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        if self.times.is_empty() {
            return None;
        }
        let next_idx = self.times.partition_point(|&t| t <= time);
        Some(self.sample_at_frame(next_idx.saturating_sub(1), time))
    }

    /// Same as [`sample`](Self::sample), scanning forward from the cursor first.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Option<T> {
        let len = self.times.len();
        match len {
            0 => return None,
            1 => return Some(self.values[0]),
            _ => {}
        }

        let i = cursor.last_index.min(len - 1);
        let found = if time >= self.times[i] {
            (0..=MAX_SCAN_OFFSET)
                .map(|offset| i + offset)
                .take_while(|&idx| idx < len)
                .find(|&idx| idx == len - 1 || time < self.times[idx + 1])
        } else {
            None
        };

        let index = found.unwrap_or_else(|| {
            self.times
                .partition_point(|&t| t <= time)
                .saturating_sub(1)
        });
        cursor.last_index = index;
        Some(self.sample_at_frame(index, time))
    }

    fn local_t(&self, index: usize, time: f32) -> f32 {
        let t0 = self.times[index];
        let t1 = self.times[index + 1];
        let dt = t1 - t0;
        let t = if dt > 1e-6 { (time - t0) / dt } else { 0.0 };
        t.clamp(0.0, 1.0)
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> T {
        let len = self.times.len();
        if index >= len - 1 {
            return self.values[len - 1];
        }
        let t = self.local_t(index, time);
        T::interpolate_linear(self.values[index], self.values[index + 1], t)
    }
}
