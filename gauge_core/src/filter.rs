//! Fixed-point exponential moving average over millivolt readings.

/// EMA weight scale (Q8 fixed point).
pub const EMA_SCALE: i64 = 256;
/// New-sample weight, roughly 30% of scale.
pub const EMA_ALPHA: i64 = 77;

/// Stateful smoother. The first sample after construction or `reset` seeds
/// the filter directly; later samples blend with integer rounding:
///
/// `ema = (alpha*raw + (scale-alpha)*ema + scale/2) / scale`
#[derive(Debug, Clone, Copy, Default)]
pub struct EmaFilter {
    state: Option<u16>,
}

impl EmaFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, raw_mv: u16) -> u16 {
        let next = match self.state {
            None => raw_mv,
            Some(prev) => {
                let raw = i64::from(raw_mv);
                let prev = i64::from(prev);
                let blended = (EMA_ALPHA * raw + (EMA_SCALE - EMA_ALPHA) * prev + EMA_SCALE / 2)
                    / EMA_SCALE;
                // Inputs are u16 so the blend stays within u16 range.
                blended as u16
            }
        };
        self.state = Some(next);
        next
    }

    pub fn value(&self) -> Option<u16> {
        self.state
    }

    /// Drop all state; the next sample reseeds instead of blending. Called
    /// when the battery goes absent so stale voltage never leaks into a
    /// reconnection.
    pub fn reset(&mut self) {
        self.state = None;
    }
}
