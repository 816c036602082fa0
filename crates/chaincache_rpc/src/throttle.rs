//! Request rate limiting.

use parking_lot::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing::trace;

/// Spaces requests at least `interval` apart.
///
/// Callers queue rather than fail: each call reserves the next free slot
/// under the lock and then sleeps outside it until that slot arrives.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    /// Creates a throttle allowing one request per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Creates a throttle allowing `per_second` requests per second. Zero
    /// means unlimited.
    pub fn per_second(per_second: u32) -> Self {
        match per_second {
            0 => Self::new(Duration::ZERO),
            n => Self::new(Duration::from_secs(1) / n),
        }
    }

    /// Minimum spacing between requests.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks until the caller may send a request.
    pub fn acquire(&self) {
        let wait = self.reserve(Instant::now());
        if !wait.is_zero() {
            trace!(wait_ms = wait.as_millis() as u64, "throttling request");
            thread::sleep(wait);
        }
    }

    /// Reserves the next slot at or after `now` and returns how long to wait.
    fn reserve(&self, now: Instant) -> Duration {
        if self.interval.is_zero() {
            return Duration::ZERO;
        }
        let mut next = self.next_slot.lock();
        let slot = match *next {
            Some(next) if next > now => next,
            _ => now,
        };
        *next = Some(slot + self.interval);
        slot - now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn unlimited_never_waits() {
        let throttle = Throttle::per_second(0);
        let now = Instant::now();
        for _ in 0..10 {
            assert_eq!(throttle.reserve(now), Duration::ZERO);
        }
    }

    #[test]
    fn slots_are_spaced_by_interval() {
        let throttle = Throttle::new(Duration::from_millis(100));
        let now = Instant::now();
        assert_eq!(throttle.reserve(now), Duration::ZERO);
        assert_eq!(throttle.reserve(now), Duration::from_millis(100));
        assert_eq!(throttle.reserve(now), Duration::from_millis(200));
    }

    #[test]
    fn idle_time_is_not_banked() {
        let throttle = Throttle::new(Duration::from_millis(100));
        let start = Instant::now();
        throttle.reserve(start);
        let later = start + Duration::from_secs(5);
        assert_eq!(throttle.reserve(later), Duration::ZERO);
        assert_eq!(throttle.reserve(later), Duration::from_millis(100));
    }

    #[test]
    fn per_second_interval() {
        assert_eq!(Throttle::per_second(50).interval(), Duration::from_millis(20));
    }

    #[test]
    fn concurrent_callers_are_spaced() {
        let throttle = Arc::new(Throttle::new(Duration::from_millis(10)));
        let start = Instant::now();
        let handles: Vec<_> = (0..5)
            .map(|_| {
                let throttle = Arc::clone(&throttle);
                std::thread::spawn(move || throttle.acquire())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
