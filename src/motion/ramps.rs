use rustc_hash::FxHashMap;

/// Linear opacity change of one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpacityRamp {
    pub from: f32,
    pub to: f32,
    pub duration_ms: f64,
    /// Latched on the first advance after the ramp was started.
    pub started_at: Option<f64>,
}

impl OpacityRamp {
    #[must_use]
    pub fn new(from: f32, to: f32, duration_ms: f64) -> Self {
        Self {
            from: from.clamp(0.0, 1.0),
            to: to.clamp(0.0, 1.0),
            duration_ms,
            started_at: None,
        }
    }

    /// Opacity at `now_ms` and whether the ramp is complete.
    pub fn advance(&mut self, now_ms: f64) -> (f32, bool) {
        let started_at = *self.started_at.get_or_insert(now_ms);
        let t = if self.duration_ms > 0.0 {
            ((now_ms - started_at) / self.duration_ms).clamp(0.0, 1.0) as f32
        } else {
            1.0
        };
        if t >= 1.0 {
            (self.to, true)
        } else {
            (self.from + (self.to - self.from) * t, false)
        }
    }
}

/// Active ramps keyed by object name. At most one per object.
#[derive(Debug, Clone, Default)]
pub struct OpacityRamps {
    ramps: FxHashMap<String, OpacityRamp>,
}

impl OpacityRamps {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a ramp for `name`, cancelling the one already running.
    pub fn start(&mut self, name: impl Into<String>, ramp: OpacityRamp) {
        self.ramps.insert(name.into(), ramp);
    }

    pub fn cancel(&mut self, name: &str) -> bool {
        self.ramps.remove(name).is_some()
    }

    pub fn clear(&mut self) {
        self.ramps.clear();
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.ramps.contains_key(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ramps.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ramps.is_empty()
    }

    /// Advances every ramp to `now_ms` and returns the new opacities.
    /// Completed ramps are dropped after reporting their final value.
    pub fn advance(&mut self, now_ms: f64) -> Vec<(String, f32)> {
        let mut out = Vec::with_capacity(self.ramps.len());
        self.ramps.retain(|name, ramp| {
            let (opacity, done) = ramp.advance(now_ms);
            out.push((name.clone(), opacity));
            !done
        });
        out
    }
}
