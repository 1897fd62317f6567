use std::time::{Duration, Instant};

/// Length of a bar height transition
pub const TRANSITION: Duration = Duration::from_millis(500);

/// Cubic ease-in-out over t in [0, 1]
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

#[derive(Clone, Debug)]
struct AnimatedBar {
    city: String,
    from: f64,
    to: u32,
}

/// A bar as it should be drawn right now
#[derive(Clone, Debug, PartialEq)]
pub struct BarSnapshot {
    pub city: String,
    pub value: f64,
    pub target: u32,
}

/// Top-cities bar chart keyed by city: bars that enter grow from zero,
/// bars that stay move from where they are, bars that exit vanish.
#[derive(Clone, Debug, Default)]
pub struct BarChartState {
    bars: Vec<AnimatedBar>,
    started: Option<Instant>,
}

impl BarChartState {
    pub fn new() -> Self {
        Self::default()
    }

    fn progress(&self, now: Instant) -> f64 {
        match self.started {
            Some(start) => {
                let elapsed = now.saturating_duration_since(start).as_secs_f64();
                ease_cubic_in_out(elapsed / TRANSITION.as_secs_f64())
            }
            None => 1.0,
        }
    }

    /// Retarget the chart to a new ranking
    pub fn update<'a>(&mut self, top: impl IntoIterator<Item = (&'a str, u32)>, now: Instant) {
        let current = self.snapshot(now);
        self.bars = top
            .into_iter()
            .map(|(city, to)| AnimatedBar {
                city: city.to_string(),
                from: current.iter().find(|b| b.city == city).map(|b| b.value).unwrap_or(0.0),
                to,
            })
            .collect();
        self.started = Some(now);
    }

    /// Interpolated bar values at `now`, in ranking order
    pub fn snapshot(&self, now: Instant) -> Vec<BarSnapshot> {
        let p = self.progress(now);
        self.bars
            .iter()
            .map(|bar| BarSnapshot {
                city: bar.city.clone(),
                value: bar.from + (bar.to as f64 - bar.from) * p,
                target: bar.to,
            })
            .collect()
    }

    /// Largest target value, the chart's y domain
    pub fn domain_max(&self) -> u32 {
        self.bars.iter().map(|b| b.to).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(0.5), 0.5);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert!(ease_cubic_in_out(0.25) < 0.25);
    }

    #[test]
    fn test_entering_bars_grow_from_zero() {
        let t0 = Instant::now();
        let mut chart = BarChartState::new();
        chart.update([("Paris", 10), ("Rome", 4)], t0);
        assert!(chart.snapshot(t0).iter().all(|b| b.value == 0.0));
        let done = chart.snapshot(t0 + TRANSITION);
        assert_eq!(done[0].value, 10.0);
        assert_eq!(done[1].value, 4.0);
        assert_eq!(chart.domain_max(), 10);
    }

    #[test]
    fn test_existing_bars_continue_from_current_height() {
        let t0 = Instant::now();
        let mut chart = BarChartState::new();
        chart.update([("Paris", 10)], t0);
        let t1 = t0 + TRANSITION / 2;
        chart.update([("Paris", 20), ("Lyon", 5)], t1);
        let start = chart.snapshot(t1);
        assert!((start[0].value - 5.0).abs() < 1e-9);
        assert_eq!(start[1].value, 0.0);
        assert_eq!(chart.snapshot(t1 + TRANSITION)[0].value, 20.0);
    }

    #[test]
    fn test_exiting_bars_removed() {
        let t0 = Instant::now();
        let mut chart = BarChartState::new();
        chart.update([("Paris", 10), ("Rome", 4)], t0);
        chart.update([("Rome", 6)], t0 + TRANSITION);
        let bars = chart.snapshot(t0 + TRANSITION * 2);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].city, "Rome");
        assert_eq!(bars[0].value, 6.0);
    }
}
