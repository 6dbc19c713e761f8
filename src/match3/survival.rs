use log::{debug, info};
use serde::Serialize;

use super::Match3Engine;
use crate::constants::{get_corruption_wave_size, MAX_THREAT, SURVIVAL_INTERVAL_SECS, THREAT_PER_WAVE};
use crate::rng::RandomSource;
use crate::types::GridPos;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SurvivalTick {
    pub added: Vec<GridPos>,
    #[serde(rename = "threatLevel")]
    pub threat_level: u32,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
}

#[derive(Clone, Debug)]
pub struct SurvivalMode {
    level: u32,
    threat_level: u32,
    corrupted_added: usize,
    interval_secs: u64,
}

impl SurvivalMode {
    pub fn new(level: u32) -> Self {
        Self {
            level: level.max(1),
            threat_level: 0,
            corrupted_added: 0,
            interval_secs: SURVIVAL_INTERVAL_SECS,
        }
    }

    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs.max(1);
        self
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn set_level(&mut self, level: u32) {
        self.level = level.max(1);
    }

    pub fn threat_level(&self) -> u32 {
        self.threat_level
    }

    pub fn corrupted_added(&self) -> usize {
        self.corrupted_added
    }

    pub fn is_over(&self) -> bool {
        self.threat_level >= MAX_THREAT
    }

    pub fn wave_size(&self) -> usize {
        get_corruption_wave_size(self.level)
    }

    /// Called with the total seconds played. Only multiples of the interval
    /// (never second 0) trigger a wave; nothing happens once the game is over.
    pub fn on_second<R: RandomSource>(
        &mut self,
        total_secs: u64,
        engine: &mut Match3Engine<R>,
    ) -> Option<SurvivalTick> {
        if total_secs == 0 || total_secs % self.interval_secs != 0 || self.is_over() {
            return None;
        }

        let added = engine.add_corrupted_blocks(self.wave_size());
        self.corrupted_added += added.len();
        self.threat_level = (self.threat_level + THREAT_PER_WAVE).min(MAX_THREAT);
        let game_over = self.is_over();
        debug!(
            "survival wave at {}s: corrupted={} threat={}",
            total_secs,
            added.len(),
            self.threat_level
        );
        if game_over {
            info!(
                "survival over at {}s after {} corrupted blocks",
                total_secs, self.corrupted_added
            );
        }

        Some(SurvivalTick {
            added,
            threat_level: self.threat_level,
            game_over,
        })
    }
}

impl Default for SurvivalMode {
    fn default() -> Self {
        Self::new(1)
    }
}
