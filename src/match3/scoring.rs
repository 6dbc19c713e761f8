use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::get_combo_multiplier;

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    now as u64
}

pub(super) fn apply_multiplier(base_points: u64, multiplier: f32) -> u64 {
    (base_points as f64 * multiplier as f64).floor() as u64
}

#[derive(Clone, Debug)]
pub(super) struct ComboTracker {
    timeout_ms: u64,
    combo: u32,
    max_combo: u32,
    last_match_at: Option<u64>,
}

impl ComboTracker {
    pub(super) fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            combo: 0,
            max_combo: 0,
            last_match_at: None,
        }
    }

    pub(super) fn register(&mut self, now_ms: u64) -> u32 {
        let within_window = self
            .last_match_at
            .map(|last| now_ms.saturating_sub(last) < self.timeout_ms)
            .unwrap_or(false);
        self.combo = if within_window { self.combo + 1 } else { 1 };
        self.max_combo = self.max_combo.max(self.combo);
        self.last_match_at = Some(now_ms);
        self.combo
    }

    pub(super) fn combo(&self) -> u32 {
        self.combo
    }

    pub(super) fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub(super) fn multiplier(&self) -> f32 {
        get_combo_multiplier(self.combo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combo_grows_inside_window_and_resets_outside() {
        let mut tracker = ComboTracker::new(2_000);
        assert_eq!(tracker.register(10_000), 1);
        assert_eq!(tracker.register(11_999), 2);
        assert_eq!(tracker.register(13_000), 3);
        assert_eq!(tracker.register(15_000), 1);
        assert_eq!(tracker.max_combo(), 3);
        assert_eq!(tracker.combo(), 1);
    }

    #[test]
    fn first_resolution_starts_at_one_regardless_of_clock() {
        let mut tracker = ComboTracker::new(2_000);
        assert_eq!(tracker.register(5), 1);
        assert_eq!(tracker.max_combo(), 1);
    }

    #[test]
    fn multiplier_follows_combo() {
        let mut tracker = ComboTracker::new(2_000);
        for step in 0..8u64 {
            tracker.register(step * 100);
        }
        assert_eq!(tracker.combo(), 8);
        assert_eq!(tracker.multiplier(), 2.0);
    }

    #[test]
    fn wall_clock_is_epoch_millis() {
        let first = now_ms();
        assert!(first > 1_600_000_000_000);
        assert!(now_ms() >= first);
    }

    #[test]
    fn points_are_floored() {
        assert_eq!(apply_multiplier(30, 1.0), 30);
        assert_eq!(apply_multiplier(30, 1.2), 36);
        assert_eq!(apply_multiplier(50, 1.2), 60);
        assert_eq!(apply_multiplier(30, 1.5), 45);
        assert_eq!(apply_multiplier(70, 1.5), 105);
        assert_eq!(apply_multiplier(90, 2.0), 180);
        assert_eq!(apply_multiplier(10, 1.25), 12);
    }
}
