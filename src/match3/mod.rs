use std::collections::HashSet;

use log::{debug, warn};
use rand::rngs::StdRng;
use serde::Serialize;

use crate::constants::{
    get_combo_tier, BASE_TILE_POINTS, COMBO_TIMEOUT_MS, CORRUPTED_CLEAR_BONUS,
    CORRUPTION_MAX_ATTEMPTS, DEFAULT_COLOR_COUNT, DEFAULT_GRID_SIZE, MAX_CASCADE_STEPS,
    MAX_SHUFFLE_ATTEMPTS, MIN_RUN_LENGTH, PALETTE,
};
use crate::rng::{default_source, RandomSource, Rng};
use crate::types::{ComboTier, GridPos, Match3Snapshot, RemoveOutcome, Tile, TileKind};

mod matcher;
mod scoring;
mod survival;

pub use self::scoring::now_ms;
pub use self::survival::{SurvivalMode, SurvivalTick};

use self::matcher::{completes_cluster, completes_run, find_all_matches, has_any_match, neighbors, Board};
use self::scoring::{apply_multiplier, ComboTracker};

#[derive(Clone, Debug)]
pub struct Match3Options {
    pub grid_size: usize,
    pub color_count: usize,
    pub combo_timeout_ms: u64,
    pub max_shuffle_attempts: usize,
}

impl Default for Match3Options {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            color_count: DEFAULT_COLOR_COUNT,
            combo_timeout_ms: COMBO_TIMEOUT_MS,
            max_shuffle_attempts: MAX_SHUFFLE_ATTEMPTS,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SettleReport {
    pub steps: Vec<RemoveOutcome>,
    pub reshuffles: usize,
    pub playable: bool,
}

impl SettleReport {
    pub fn total_points(&self) -> u64 {
        self.steps
            .iter()
            .map(|step| step.points + step.bonus_points)
            .sum()
    }
}

#[derive(Clone, Debug)]
pub struct Match3Engine<R = StdRng> {
    rng: R,
    options: Match3Options,
    size: usize,
    color_count: usize,
    grid: Board,
    score: u64,
    combo: ComboTracker,
}

impl Match3Engine<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(default_source())
    }
}

impl Default for Match3Engine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl Match3Engine<Rng> {
    pub fn with_seed(seed: u32) -> Self {
        Self::with_rng(Rng::new(seed))
    }
}

impl<R: RandomSource> Match3Engine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self::with_options(rng, Match3Options::default())
    }

    pub fn with_options(rng: R, options: Match3Options) -> Self {
        let combo = ComboTracker::new(options.combo_timeout_ms);
        Self {
            rng,
            options,
            size: 0,
            color_count: 0,
            grid: Vec::new(),
            score: 0,
            combo,
        }
    }

    pub fn init(&mut self) {
        self.init_grid(self.options.grid_size, self.options.color_count);
    }

    pub fn init_grid(&mut self, size: usize, color_count: usize) {
        let size = size.max(MIN_RUN_LENGTH);
        let color_count = color_count.clamp(MIN_RUN_LENGTH, PALETTE.len());
        self.size = size;
        self.color_count = color_count;
        self.grid = vec![vec![None; size]; size];
        self.score = 0;
        self.combo = ComboTracker::new(self.options.combo_timeout_ms);

        for row in 0..size {
            for col in 0..size {
                let allowed: Vec<u8> = (0..color_count as u8)
                    .filter(|color| {
                        !completes_run(&self.grid, row, col, *color)
                            && !completes_cluster(&self.grid, row, col, *color)
                    })
                    .collect();
                let color = match allowed.len() {
                    0 => self.random_color(),
                    len => allowed[self.rng.pick_index(len)],
                };
                self.grid[row][col] = Some(Tile::normal(color));
            }
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn color_count(&self) -> usize {
        self.color_count
    }

    pub fn grid(&self) -> &[Vec<Option<Tile>>] {
        &self.grid
    }

    pub fn tile(&self, pos: GridPos) -> Option<Tile> {
        self.grid.get(pos.row)?.get(pos.col).copied().flatten()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo.combo()
    }

    pub fn max_combo(&self) -> u32 {
        self.combo.max_combo()
    }

    pub fn combo_tier(&self) -> ComboTier {
        get_combo_tier(self.combo.combo())
    }

    pub fn snapshot(&self) -> Match3Snapshot {
        Match3Snapshot {
            grid: self.grid.clone(),
            score: self.score,
            combo: self.combo(),
            max_combo: self.max_combo(),
            combo_tier: self.combo_tier(),
            has_valid_moves: self.has_valid_moves(),
        }
    }

    fn in_bounds(&self, pos: GridPos) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    fn random_color(&mut self) -> u8 {
        self.rng.pick_index(self.color_count.max(1)) as u8
    }

    /// Swaps two orthogonally adjacent cells and keeps the swap only if the
    /// board then holds a match. Any other request leaves the board as it was.
    pub fn swap(&mut self, r1: usize, c1: usize, r2: usize, c2: usize) -> bool {
        let a = GridPos::new(r1, c1);
        let b = GridPos::new(r2, c2);
        if !self.in_bounds(a) || !self.in_bounds(b) || !a.is_adjacent(b) {
            return false;
        }
        swap_cells(&mut self.grid, a, b);
        if has_any_match(&self.grid) {
            return true;
        }
        swap_cells(&mut self.grid, a, b);
        false
    }

    pub fn find_all_matches(&self) -> Vec<GridPos> {
        find_all_matches(&self.grid)
    }

    pub fn remove_matches(&mut self, matches: &[GridPos]) -> RemoveOutcome {
        self.remove_matches_at(matches, now_ms())
    }

    /// Clears the given cells and any corrupted tile next to them, scores
    /// the removal and advances the combo as of `now_ms`.
    ///
    /// Holes, corrupted cells, out-of-range and repeated coordinates in
    /// `matches` are ignored. If nothing is left to remove the call changes
    /// nothing, including the combo clock.
    pub fn remove_matches_at(&mut self, matches: &[GridPos], now_ms: u64) -> RemoveOutcome {
        let mut seen = HashSet::new();
        let removed: Vec<GridPos> = matches
            .iter()
            .copied()
            .filter(|pos| {
                self.tile(*pos).is_some_and(|tile| !tile.is_corrupted()) && seen.insert(*pos)
            })
            .collect();
        if removed.is_empty() {
            return RemoveOutcome {
                combo: self.combo.combo(),
                combo_multiplier: self.combo.multiplier(),
                ..RemoveOutcome::default()
            };
        }

        let mut cleansed = HashSet::new();
        let corrupted: Vec<GridPos> = removed
            .iter()
            .flat_map(|pos| neighbors(*pos))
            .filter(|pos| {
                self.tile(*pos).is_some_and(|tile| tile.is_corrupted()) && cleansed.insert(*pos)
            })
            .collect();

        let combo = self.combo.register(now_ms);
        let combo_multiplier = self.combo.multiplier();
        let points = apply_multiplier(removed.len() as u64 * BASE_TILE_POINTS, combo_multiplier);
        let bonus_points = corrupted.len() as u64 * CORRUPTED_CLEAR_BONUS;
        self.score += points + bonus_points;

        for pos in removed.iter().chain(corrupted.iter()) {
            self.grid[pos.row][pos.col] = None;
        }

        RemoveOutcome {
            points,
            removed_count: removed.len(),
            combo,
            combo_multiplier,
            corrupted_cleared: corrupted.len(),
            bonus_points,
        }
    }

    pub fn drop_blocks(&mut self) -> bool {
        let mut changed = false;
        for col in 0..self.size {
            let tiles: Vec<Tile> = (0..self.size)
                .rev()
                .filter_map(|row| self.grid[row][col])
                .collect();
            for (offset, row) in (0..self.size).rev().enumerate() {
                let next = tiles.get(offset).copied();
                if self.grid[row][col] != next {
                    self.grid[row][col] = next;
                    changed = true;
                }
            }
        }
        changed
    }

    pub fn fill_empty(&mut self) -> bool {
        let mut changed = false;
        for row in 0..self.size {
            for col in 0..self.size {
                if self.grid[row][col].is_none() {
                    let color = self.random_color();
                    self.grid[row][col] = Some(Tile::normal(color));
                    changed = true;
                }
            }
        }
        changed
    }

    pub fn has_valid_moves(&self) -> bool {
        let mut scratch = self.grid.clone();
        for row in 0..self.size {
            for col in 0..self.size {
                let here = GridPos::new(row, col);
                for other in [GridPos::new(row, col + 1), GridPos::new(row + 1, col)] {
                    if !self.in_bounds(other) {
                        continue;
                    }
                    swap_cells(&mut scratch, here, other);
                    let found = has_any_match(&scratch);
                    swap_cells(&mut scratch, here, other);
                    if found {
                        return true;
                    }
                }
            }
        }
        false
    }

    pub fn shuffle(&mut self) {
        let cells: Vec<GridPos> = (0..self.size)
            .flat_map(|row| (0..self.size).map(move |col| GridPos::new(row, col)))
            .filter(|pos| self.tile(*pos).is_some_and(|tile| !tile.is_corrupted()))
            .collect();
        let mut tiles: Vec<Option<Tile>> = cells.iter().map(|pos| self.grid[pos.row][pos.col]).collect();
        self.rng.shuffle(&mut tiles);
        for (pos, tile) in cells.iter().zip(tiles) {
            self.grid[pos.row][pos.col] = tile;
        }
    }

    pub fn shuffle_until_playable(&mut self, max_attempts: usize) -> bool {
        if self.has_valid_moves() {
            return true;
        }
        for attempt in 1..=max_attempts {
            self.shuffle();
            if self.has_valid_moves() {
                debug!("board playable after {attempt} shuffles");
                return true;
            }
        }
        warn!("board still deadlocked after {max_attempts} shuffles");
        false
    }

    pub fn add_corrupted_blocks(&mut self, count: usize) -> Vec<GridPos> {
        let mut added = Vec::new();
        if self.size == 0 {
            return added;
        }
        let mut attempts = 0;
        while added.len() < count && attempts < CORRUPTION_MAX_ATTEMPTS {
            attempts += 1;
            let pos = GridPos::new(self.rng.pick_index(self.size), self.rng.pick_index(self.size));
            if let Some(tile) = self.grid[pos.row][pos.col].as_mut() {
                if !tile.is_corrupted() {
                    tile.kind = TileKind::Corrupted;
                    added.push(pos);
                }
            }
        }
        added
    }

    pub fn settle(&mut self) -> SettleReport {
        self.settle_at(now_ms())
    }

    /// Runs the cascade to rest: drop and refill, then resolve matches and
    /// refill again until none are left. A deadlocked resting board is
    /// reshuffled (and cascaded again) up to `max_shuffle_attempts` times.
    /// Every step is stamped `now_ms`, so a cascade extends the combo. A
    /// cascade that runs out of steps with matches left reports unplayable.
    pub fn settle_at(&mut self, now_ms: u64) -> SettleReport {
        let mut report = SettleReport::default();
        loop {
            if !self.cascade(&mut report, now_ms) {
                break;
            }
            if self.has_valid_moves() {
                report.playable = true;
                break;
            }
            if report.reshuffles >= self.options.max_shuffle_attempts {
                warn!(
                    "board deadlocked after {} reshuffles; score={}",
                    report.reshuffles, self.score
                );
                break;
            }
            self.shuffle();
            report.reshuffles += 1;
        }
        report
    }

    fn cascade(&mut self, report: &mut SettleReport, now_ms: u64) -> bool {
        self.drop_blocks();
        self.fill_empty();
        for step in 1..=MAX_CASCADE_STEPS {
            let matches = self.find_all_matches();
            if matches.is_empty() {
                return true;
            }
            let outcome = self.remove_matches_at(&matches, now_ms);
            debug!(
                "cascade step {}: removed={} combo={} points={}",
                step,
                outcome.removed_count,
                outcome.combo,
                outcome.points + outcome.bonus_points
            );
            report.steps.push(outcome);
            self.drop_blocks();
            self.fill_empty();
        }
        if has_any_match(&self.grid) {
            warn!("cascade stopped after {MAX_CASCADE_STEPS} steps with matches left");
            return false;
        }
        true
    }
}

fn swap_cells(grid: &mut Board, a: GridPos, b: GridPos) {
    let held = grid[a.row][a.col];
    grid[a.row][a.col] = grid[b.row][b.col];
    grid[b.row][b.col] = held;
}
