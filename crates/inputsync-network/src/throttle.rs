//! Fixed-cadence limiter for periodic snapshot sends

use std::time::{Duration, Instant};

/// Minimum spacing between two Move sends (about 30 Hz)
pub const MOVE_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug, Clone)]
pub struct SendThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl Default for SendThrottle {
    fn default() -> Self {
        Self::new(MOVE_INTERVAL)
    }
}

impl SendThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Claim a send slot at `now`. Returns false if the previous claim was
    /// less than one interval ago.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.interval {
                return false;
            }
        }
        self.last = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_most_one_send_per_interval() {
        let mut throttle = SendThrottle::default();
        let start = Instant::now();
        assert!(throttle.try_acquire(start));
        assert!(!throttle.try_acquire(start + Duration::from_millis(32)));
        assert!(throttle.try_acquire(start + Duration::from_millis(33)));
    }

    #[test]
    fn sixty_hz_ticks_stay_under_cap() {
        let mut throttle = SendThrottle::default();
        let start = Instant::now();
        let sent = (0..60)
            .map(|tick| start + Duration::from_micros(tick * 16_667))
            .filter(|now| throttle.try_acquire(*now))
            .count();
        assert!(sent <= 31, "sent {sent}");
        assert!(sent >= 20);
    }
}
