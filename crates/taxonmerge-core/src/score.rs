//! Memoized scores.
//!
//! Scores are computed lazily from `&Taxonomy` inside parallel phases, so the
//! cell is a plain atomic. Two threads racing on the same cell compute the
//! same value, so whichever store lands last is fine. Repair phases reset the
//! cell when status or links change.

use crate::{MAX_SCORE, MIN_SCORE};
use std::sync::atomic::{AtomicI64, Ordering};

const UNSET: i64 = i64::MIN;

#[derive(Debug)]
pub struct ScoreCell(AtomicI64);

impl ScoreCell {
    pub fn new() -> Self {
        Self(AtomicI64::new(UNSET))
    }

    pub fn get(&self) -> Option<i32> {
        match self.0.load(Ordering::Acquire) {
            UNSET => None,
            v => Some(v as i32),
        }
    }

    pub fn set(&self, score: i32) {
        self.0.store(score as i64, Ordering::Release);
    }

    pub fn reset(&self) {
        self.0.store(UNSET, Ordering::Release);
    }

    pub fn get_or_init(&self, compute: impl FnOnce() -> i32) -> i32 {
        if let Some(v) = self.get() {
            return v;
        }
        let v = compute();
        self.set(v);
        v
    }
}

impl Default for ScoreCell {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ScoreCell {
    fn clone(&self) -> Self {
        Self(AtomicI64::new(self.0.load(Ordering::Acquire)))
    }
}

/// Clamp into `[MIN_SCORE, MAX_SCORE]`.
pub fn clamp_score(score: i64) -> i32 {
    score.clamp(MIN_SCORE as i64, MAX_SCORE as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_memoizes_until_reset() {
        let cell = ScoreCell::new();
        assert_eq!(cell.get(), None);
        assert_eq!(cell.get_or_init(|| 42), 42);
        assert_eq!(cell.get_or_init(|| 7), 42);
        cell.reset();
        assert_eq!(cell.get_or_init(|| 7), 7);
    }

    #[test]
    fn clamps_to_bounds() {
        assert_eq!(clamp_score(i64::MAX), MAX_SCORE);
        assert_eq!(clamp_score(-5_000_000), MIN_SCORE);
        assert_eq!(clamp_score(12), 12);
    }
}
