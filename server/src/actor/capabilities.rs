use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use rand::Rng;

/// Source of wall-clock time for move timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of board seeds. Seeds handed out are recorded in the journal, so
/// a game never needs the same source again to be rebuilt.
pub trait SeedSource: Send + Sync {
    fn next_seed(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EntropySeeds;

impl SeedSource for EntropySeeds {
    fn next_seed(&self) -> u64 {
        rand::rng().random()
    }
}

/// Hands out `start`, `start + 1`, ...
#[derive(Debug)]
pub struct FixedSeeds {
    next: AtomicU64,
}

impl FixedSeeds {
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl SeedSource for FixedSeeds {
    fn next_seed(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_seeds_count_up() {
        let seeds = FixedSeeds::new(7);
        assert_eq!(seeds.next_seed(), 7);
        assert_eq!(seeds.next_seed(), 8);
    }
}
