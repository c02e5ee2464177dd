use chrono::{DateTime, Duration, Utc};

/// Token bucket limiting how fast one player can fire guesses.
#[derive(Debug, Clone)]
pub struct GuessRateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_every: Duration,
    last_refill: DateTime<Utc>,
}

impl GuessRateLimiter {
    pub fn new(max_tokens: u32, refill_every: Duration, now: DateTime<Utc>) -> Self {
        Self {
            tokens: max_tokens, // Start with full bucket
            max_tokens,
            refill_every,
            last_refill: now,
        }
    }

    pub fn try_acquire(&mut self, now: DateTime<Utc>) -> bool {
        self.refill_tokens(now);

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill_tokens(&mut self, now: DateTime<Utc>) {
        let refill_ms = self.refill_every.num_milliseconds();
        if refill_ms <= 0 {
            self.tokens = self.max_tokens;
            self.last_refill = now;
            return;
        }

        let elapsed_ms = (now - self.last_refill).num_milliseconds();
        if elapsed_ms < refill_ms {
            return;
        }

        let intervals = elapsed_ms / refill_ms;
        let tokens_to_add = intervals.min(self.max_tokens as i64) as u32;
        self.tokens = (self.tokens + tokens_to_add).min(self.max_tokens);

        if self.tokens == self.max_tokens {
            self.last_refill = now;
        } else {
            // Keep the partial interval so slow trickles still earn tokens
            self.last_refill += Duration::milliseconds(intervals * refill_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Guesses a copy of `limiter` could still make at `now`.
    fn available(limiter: &GuessRateLimiter, now: DateTime<Utc>) -> u32 {
        let mut limiter = limiter.clone();
        let mut count = 0;
        while limiter.try_acquire(now) {
            count += 1;
        }
        count
    }

    #[test]
    fn test_burst_then_reject() {
        let start = Utc::now();
        let mut limiter = GuessRateLimiter::new(3, Duration::seconds(2), start);

        assert!(limiter.try_acquire(start));
        assert!(limiter.try_acquire(start));
        assert!(limiter.try_acquire(start));
        assert!(!limiter.try_acquire(start));
        assert_eq!(available(&limiter, start), 0);
    }

    #[test]
    fn test_refill_over_time() {
        let start = Utc::now();
        let mut limiter = GuessRateLimiter::new(3, Duration::seconds(2), start);
        for _ in 0..3 {
            limiter.try_acquire(start);
        }

        assert_eq!(available(&limiter, start + Duration::milliseconds(1999)), 0);
        assert_eq!(available(&limiter, start + Duration::seconds(2)), 1);
        assert_eq!(available(&limiter, start + Duration::seconds(5)), 2);
        assert_eq!(available(&limiter, start + Duration::minutes(10)), 3);
    }

    #[test]
    fn test_partial_intervals_are_not_lost() {
        let start = Utc::now();
        let mut limiter = GuessRateLimiter::new(2, Duration::seconds(2), start);
        limiter.try_acquire(start);
        limiter.try_acquire(start);

        // 3s: one token, 1s carried over
        assert!(limiter.try_acquire(start + Duration::seconds(3)));
        // 4s: the carried second completes another interval
        assert!(limiter.try_acquire(start + Duration::seconds(4)));
        assert!(!limiter.try_acquire(start + Duration::seconds(4)));
    }
}
