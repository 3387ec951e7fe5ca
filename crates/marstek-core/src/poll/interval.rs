// Adaptive poll interval.
//
// Batteries idle for hours at a time; when consecutive polls return
// identical data the interval widens geometrically (base * 1.5^n,
// clamped), and snaps back to base the moment data changes.

use std::time::Duration;

#[derive(Debug)]
pub struct AdaptiveInterval {
    base: Duration,
    min: Duration,
    max: Duration,
    current: Duration,
    unchanged_count: u32,
}

impl AdaptiveInterval {
    pub fn new(base: Duration, min: Duration, max: Duration) -> Self {
        Self {
            base,
            min,
            max,
            current: base.clamp(min, max),
            unchanged_count: 0,
        }
    }

    /// The delay before the next scheduled poll.
    pub fn next_interval(&self) -> Duration {
        self.current
    }

    pub fn unchanged_count(&self) -> u32 {
        self.unchanged_count
    }

    /// Feed in the outcome of a fetch: `changed` means the snapshot's
    /// content hash differed from the previous one.
    pub fn on_fetch_result(&mut self, changed: bool) {
        if changed {
            self.unchanged_count = 0;
        } else {
            self.unchanged_count = self.unchanged_count.saturating_add(1);
        }

        let exponent = i32::try_from(self.unchanged_count).unwrap_or(i32::MAX);
        let scaled = self.base.as_secs_f64() * 1.5_f64.powi(exponent);
        let widened = if scaled.is_finite() {
            Duration::from_secs_f64(scaled.min(self.max.as_secs_f64()))
        } else {
            self.max
        };
        self.current = widened.clamp(self.min, self.max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: Duration = Duration::from_secs(60);
    const MAX: Duration = Duration::from_secs(300);

    #[test]
    fn widens_geometrically_on_unchanged_data() {
        let mut interval = AdaptiveInterval::new(Duration::from_secs(60), MIN, MAX);

        interval.on_fetch_result(false);
        assert_eq!(interval.next_interval(), Duration::from_secs(90));

        interval.on_fetch_result(false);
        assert_eq!(interval.next_interval(), Duration::from_secs(135));

        interval.on_fetch_result(false);
        assert_eq!(interval.next_interval(), Duration::from_secs_f64(202.5));
    }

    #[test]
    fn clamps_at_max() {
        let mut interval = AdaptiveInterval::new(Duration::from_secs(60), MIN, MAX);
        for _ in 0..10 {
            interval.on_fetch_result(false);
        }
        assert_eq!(interval.next_interval(), MAX);
        assert_eq!(interval.unchanged_count(), 10);
    }

    #[test]
    fn snaps_back_to_base_on_change() {
        let mut interval = AdaptiveInterval::new(Duration::from_secs(60), MIN, MAX);
        for _ in 0..5 {
            interval.on_fetch_result(false);
        }

        interval.on_fetch_result(true);
        assert_eq!(interval.next_interval(), Duration::from_secs(60));
        assert_eq!(interval.unchanged_count(), 0);
    }

    #[test]
    fn base_below_floor_is_clamped() {
        let mut interval = AdaptiveInterval::new(Duration::from_secs(10), MIN, MAX);
        assert_eq!(interval.next_interval(), MIN);

        interval.on_fetch_result(true);
        assert_eq!(interval.next_interval(), MIN);
    }
}
