use crate::types::{ComboTier, Difficulty, DifficultyPreset, LevelConfig};

pub const MIN_MAZE_SIDE: usize = 5;
pub const LOOP_DENSITY_DIVISOR: usize = 30;
pub const LOOP_ATTEMPTS_PER_LOOP: usize = 10;
/// Minimum solution length as a fraction of `width + height` (4/5).
pub const MIN_PATH_RATIO: (usize, usize) = (4, 5);
pub const MAX_GENERATION_ATTEMPTS: usize = 20;

pub const DEFAULT_GRID_SIZE: usize = 8;
pub const DEFAULT_COLOR_COUNT: usize = 6;
pub const PALETTE: [&str; 6] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD",
];
pub const MIN_RUN_LENGTH: usize = 3;
pub const MIN_CLUSTER_SIZE: usize = 5;
pub const BASE_TILE_POINTS: u64 = 10;
pub const CORRUPTED_CLEAR_BONUS: u64 = 50;
pub const COMBO_TIMEOUT_MS: u64 = 2_000;
pub const CORRUPTION_MAX_ATTEMPTS: usize = 100;
pub const MAX_SHUFFLE_ATTEMPTS: usize = 10;
pub const MAX_CASCADE_STEPS: usize = 64;

pub const SURVIVAL_INTERVAL_SECS: u64 = 10;
pub const THREAT_PER_WAVE: u32 = 10;
pub const MAX_THREAT: u32 = 100;

/// (width, height, time limit in seconds) for the level progression.
const LEVELS: [(usize, usize, u32); 20] = [
    (11, 11, 45),
    (11, 13, 50),
    (13, 13, 60),
    (13, 15, 70),
    (15, 15, 80),
    (15, 17, 90),
    (17, 17, 100),
    (17, 19, 120),
    (19, 19, 140),
    (19, 21, 160),
    (21, 21, 180),
    (21, 23, 200),
    (23, 23, 220),
    (23, 25, 250),
    (25, 25, 280),
    (25, 27, 300),
    (27, 27, 330),
    (27, 29, 360),
    (29, 29, 400),
    (29, 31, 440),
];

pub fn level_count() -> usize {
    LEVELS.len()
}

pub fn get_level_config(level: usize) -> LevelConfig {
    let level = level.clamp(1, LEVELS.len());
    let (width, height, time_limit) = LEVELS[level - 1];
    LevelConfig {
        level,
        width,
        height,
        time_limit_secs: Some(time_limit),
    }
}

pub fn get_difficulty_preset(difficulty: Difficulty) -> DifficultyPreset {
    let (size, time_bonus) = match difficulty {
        Difficulty::Easy => (11, 1_000),
        Difficulty::Medium => (15, 2_000),
        Difficulty::Hard => (21, 3_000),
    };
    DifficultyPreset {
        difficulty,
        size,
        time_bonus,
    }
}

pub fn get_combo_tier(combo: u32) -> ComboTier {
    if combo >= 8 {
        return ComboTier::Burst;
    }
    if combo >= 5 {
        return ComboTier::Frenzy;
    }
    if combo >= 3 {
        return ComboTier::Hot;
    }
    ComboTier::None
}

pub fn get_combo_multiplier(combo: u32) -> f32 {
    get_combo_tier(combo).multiplier()
}

pub fn get_corruption_wave_size(survival_level: u32) -> usize {
    ((survival_level / 2 + 1) as usize).min(3)
}
