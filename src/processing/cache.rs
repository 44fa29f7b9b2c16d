use std::time::Duration;

use tokio::time::Instant;

/// A cached value together with the moment it was stored
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
}

impl<T> CacheEntry<T> {
    /// Store `value` stamped with the current time
    pub fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }

    /// Whether the entry is younger than `ttl`
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }

    /// The value if still fresh, otherwise `None`
    pub fn fresh_value(&self, ttl: Duration) -> Option<&T> {
        self.is_fresh(ttl).then_some(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let entry = CacheEntry::new(42.0_f64);
        let ttl = Duration::from_secs(30);

        assert!(entry.is_fresh(ttl));
        assert_eq!(entry.fresh_value(ttl), Some(&42.0));

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(entry.is_fresh(ttl));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!entry.is_fresh(ttl));
        assert_eq!(entry.fresh_value(ttl), None);
        assert!(entry.age() >= Duration::from_secs(31));
    }
}
