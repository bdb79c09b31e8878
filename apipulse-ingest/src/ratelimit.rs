use dashmap::DashMap;
use std::time::{Duration, Instant};

struct WindowState {
    count: u32,
    window_start: Instant,
}

/// Per-API-key admission control — fixed window counter.
///
/// One `admit` call per incoming batch, before any per-event work is spent.
/// Counters live in a concurrent map keyed by API key; entry updates hold a
/// shard lock, so concurrent batches for the same key are counted exactly.
/// Key growth is bounded by [`RateLimiter::sweep`], which the server runs on
/// a background interval.
pub struct RateLimiter {
    max_per_window: u32,
    window: Duration,
    counters: DashMap<String, WindowState>,
}

impl RateLimiter {
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        Self {
            max_per_window,
            window,
            counters: DashMap::new(),
        }
    }

    /// Admit or refuse one batch for `api_key`. Refusal means the whole
    /// batch; there is no partial admission.
    pub fn admit(&self, api_key: &str) -> bool {
        let now = Instant::now();
        let mut state = self
            .counters
            .entry(api_key.to_owned())
            .or_insert_with(|| WindowState {
                count: 0,
                window_start: now,
            });

        // Reset window if expired
        if now.duration_since(state.window_start) >= self.window {
            state.count = 0;
            state.window_start = now;
        }

        state.count += 1;
        state.count <= self.max_per_window
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Drop counters whose window expired at least one full window ago.
    /// Keys that stay quiet for two windows cost no memory.
    pub fn sweep(&self) {
        let now = Instant::now();
        let horizon = self.window.saturating_mul(2);
        self.counters
            .retain(|_, state| now.duration_since(state.window_start) < horizon);
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.counters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(count: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(count, Duration::from_secs(window_secs))
    }

    // ── Within limit ─────────────────────────────────────────────

    #[test]
    fn batches_within_limit_are_admitted() {
        let limiter = limiter(5, 60);
        for _ in 0..5 {
            assert!(limiter.admit("k1"));
        }
    }

    // ── Exceeding limit ──────────────────────────────────────────

    #[test]
    fn batch_beyond_ceiling_is_refused_within_window() {
        let limiter = limiter(3, 60);
        for _ in 0..3 {
            assert!(limiter.admit("k1"));
        }
        assert!(!limiter.admit("k1"));
    }

    #[test]
    fn zero_limit_refuses_every_batch() {
        let limiter = limiter(0, 60);
        assert!(!limiter.admit("k1"));
    }

    // ── Keys are independent ─────────────────────────────────────

    #[test]
    fn keys_have_independent_counters() {
        let limiter = limiter(1, 60);
        assert!(limiter.admit("k1"));
        assert!(!limiter.admit("k1"));
        assert!(limiter.admit("k2"));
    }

    // ── Window reset ─────────────────────────────────────────────

    #[test]
    fn expired_window_resets_counter() {
        let limiter = RateLimiter::new(1, Duration::from_nanos(1));
        assert!(limiter.admit("k1"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(limiter.admit("k1"));
    }

    // ── Concurrent access ────────────────────────────────────────

    #[test]
    fn concurrent_admission_is_counted_exactly() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicU32, Ordering};

        let limiter = Arc::new(RateLimiter::new(200, Duration::from_secs(60)));
        let admitted = Arc::new(AtomicU32::new(0));

        let mut handles = vec![];
        for _ in 0..4 {
            let limiter = Arc::clone(&limiter);
            let admitted = Arc::clone(&admitted);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    if limiter.admit("shared-key") {
                        admitted.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        // 400 attempts against a ceiling of 200: exactly 200 admitted
        assert_eq!(admitted.load(Ordering::Relaxed), 200);
    }

    // ── Sweep ────────────────────────────────────────────────────

    #[test]
    fn sweep_drops_stale_keys() {
        let limiter = RateLimiter::new(10, Duration::from_nanos(1));
        limiter.admit("stale");
        assert_eq!(limiter.tracked_keys(), 1);
        std::thread::sleep(Duration::from_millis(5));
        limiter.sweep();
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn sweep_keeps_keys_inside_the_horizon() {
        let limiter = limiter(10, 60);
        limiter.admit("active");
        limiter.sweep();
        assert_eq!(limiter.tracked_keys(), 1);
    }
}
