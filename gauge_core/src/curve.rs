//! Piecewise-linear voltage-to-percentage discharge curve.

/// Breakpoint table sorted by strictly descending voltage. Voltages above
/// the first breakpoint clamp to its percentage, below the last likewise;
/// in between the bracketing pair is interpolated linearly in integer math.
#[derive(Debug, Clone)]
pub struct DischargeCurve {
    points: Vec<(u16, u8)>,
}

impl Default for DischargeCurve {
    fn default() -> Self {
        // Typical single-cell Li-ion resting curve.
        Self {
            points: vec![
                (4200, 100),
                (4100, 95),
                (4000, 90),
                (3900, 80),
                (3800, 70),
                (3700, 55),
                (3600, 35),
                (3400, 10),
                (3000, 0),
            ],
        }
    }
}

impl DischargeCurve {
    /// Build from parallel tables. Mismatched lengths are tolerated by
    /// truncating to the shorter table (warned); a table unusable after
    /// truncation (fewer than 2 points or not strictly descending) falls
    /// back to the default curve.
    pub fn from_tables(mv: &[u16], percent: &[u8]) -> Self {
        if mv.len() != percent.len() {
            tracing::warn!(
                mv_len = mv.len(),
                percent_len = percent.len(),
                "curve table length mismatch, truncating to shorter"
            );
        }
        let n = mv.len().min(percent.len());
        let points: Vec<(u16, u8)> = mv[..n]
            .iter()
            .copied()
            .zip(percent[..n].iter().copied())
            .collect();
        // Voltage strictly descending, percentage non-increasing along it.
        let descending = points.windows(2).all(|w| w[0].0 > w[1].0 && w[0].1 >= w[1].1);
        if points.len() < 2 || !descending || points.iter().any(|&(_, p)| p > 100) {
            tracing::warn!("unusable curve table, using default curve");
            return Self::default();
        }
        Self { points }
    }

    pub fn percent(&self, voltage_mv: u16) -> u8 {
        debug_assert!(self.points.len() >= 2);
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if voltage_mv >= first.0 {
            return first.1;
        }
        if voltage_mv <= last.0 {
            return last.1;
        }
        // Find the bracketing pair: hi has the larger voltage, lo the smaller.
        for pair in self.points.windows(2) {
            let (hi_mv, hi_pct) = pair[0];
            let (lo_mv, lo_pct) = pair[1];
            if voltage_mv >= lo_mv {
                let span = u32::from(hi_mv - lo_mv);
                let off = u32::from(voltage_mv - lo_mv);
                let rise = u32::from(hi_pct) - u32::from(lo_pct);
                // Truncating division floors the interpolated value.
                return (u32::from(lo_pct) + off * rise / span) as u8;
            }
        }
        last.1
    }
}
