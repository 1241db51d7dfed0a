//! Fixed-capacity sliding window of (timestamp, percentage) samples.

pub const WINDOW_CAPACITY: usize = 64;

/// Allocation-free ring buffer with oldest-overwrite semantics. Never
/// cleared; readers bound their queries by timestamp so entries from before
/// a reset simply age out of scope.
#[derive(Debug, Clone)]
pub struct PercentWindow {
    entries: [(u64, u8); WINDOW_CAPACITY],
    len: usize,
    head: usize,
}

impl Default for PercentWindow {
    fn default() -> Self {
        Self {
            entries: [(0, 0); WINDOW_CAPACITY],
            len: 0,
            head: 0,
        }
    }
}

impl PercentWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at_ms: u64, percent: u8) {
        self.entries[self.head] = (at_ms, percent);
        self.head = (self.head + 1) % WINDOW_CAPACITY;
        if self.len < WINDOW_CAPACITY {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Min and max percentage among samples stamped at or after `cutoff_ms`.
    /// `None` when no sample is that recent.
    pub fn min_max_since(&self, cutoff_ms: u64) -> Option<(u8, u8)> {
        let mut span: Option<(u8, u8)> = None;
        for &(at, p) in &self.entries[..self.len] {
            if at >= cutoff_ms {
                span = Some(match span {
                    None => (p, p),
                    Some((lo, hi)) => (lo.min(p), hi.max(p)),
                });
            }
        }
        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_has_no_span() {
        assert_eq!(PercentWindow::new().min_max_since(0), None);
    }

    #[test]
    fn min_max_respects_cutoff() {
        let mut w = PercentWindow::new();
        w.push(1_000, 50);
        w.push(2_000, 40);
        w.push(3_000, 60);
        assert_eq!(w.min_max_since(0), Some((40, 60)));
        assert_eq!(w.min_max_since(2_000), Some((40, 60)));
        assert_eq!(w.min_max_since(2_500), Some((60, 60)));
        assert_eq!(w.min_max_since(3_500), None);
    }

    #[test]
    fn overwrites_oldest_when_full() {
        let mut w = PercentWindow::new();
        for i in 0..WINDOW_CAPACITY as u64 + 10 {
            w.push(i * 100, (i % 100) as u8);
        }
        assert_eq!(w.len(), WINDOW_CAPACITY);
        // Sample 0 was overwritten; the oldest surviving stamp is 10*100.
        let (lo, _hi) = w.min_max_since(0).unwrap();
        assert_eq!(lo, 10);
    }
}
