use log::{debug, warn};
use rand::rngs::StdRng;
use serde::Serialize;

use crate::constants::{MAX_GENERATION_ATTEMPTS, MIN_MAZE_SIDE};
use crate::rng::{default_source, RandomSource, Rng};
use crate::types::{CellKind, MazeSnapshot, Vec2};

mod carve;
mod difficulty;
mod run;
mod solver;

pub use self::run::{MazeRun, MoveOutcome};

use self::carve::{carve_passages, create_loops};
use self::difficulty::meets_difficulty;
use self::solver::{cell_at, is_passable, shortest_path};

#[derive(Clone, Debug)]
pub struct MazeOptions {
    pub max_attempts: usize,
}

impl Default for MazeOptions {
    fn default() -> Self {
        Self {
            max_attempts: MAX_GENERATION_ATTEMPTS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub attempts: usize,
    pub satisfied: bool,
    #[serde(rename = "solutionLength")]
    pub solution_length: usize,
    pub loops: usize,
}

#[derive(Clone, Debug)]
pub struct MazeEngine<R = StdRng> {
    rng: R,
    options: MazeOptions,
    width: usize,
    height: usize,
    grid: Vec<Vec<CellKind>>,
}

impl MazeEngine<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(default_source())
    }
}

impl Default for MazeEngine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl MazeEngine<Rng> {
    pub fn with_seed(seed: u32) -> Self {
        Self::with_rng(Rng::new(seed))
    }
}

impl<R: RandomSource> MazeEngine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self::with_options(rng, MazeOptions::default())
    }

    pub fn with_options(rng: R, options: MazeOptions) -> Self {
        Self {
            rng,
            options,
            width: 0,
            height: 0,
            grid: Vec::new(),
        }
    }

    pub fn generate(&mut self, width: usize, height: usize) -> &[Vec<CellKind>] {
        self.build(width, height);
        &self.grid
    }

    /// Rejection-samples mazes until one has a long enough solution and no
    /// wall-free interior row or column. Gives up after `max_attempts` and
    /// keeps the last candidate.
    pub fn generate_validated(&mut self, width: usize, height: usize) -> GenerationReport {
        let max_attempts = self.options.max_attempts.max(1);
        let mut report = GenerationReport {
            attempts: 0,
            satisfied: false,
            solution_length: 0,
            loops: 0,
        };

        while report.attempts < max_attempts {
            report.attempts += 1;
            report.loops = self.build(width, height);
            report.solution_length = self.find_solution().map(|path| path.len()).unwrap_or(0);
            if meets_difficulty(&self.grid, self.width, self.height, report.solution_length) {
                report.satisfied = true;
                break;
            }
            debug!(
                "maze {}x{} attempt {} rejected: solution={} cells",
                self.width, self.height, report.attempts, report.solution_length
            );
        }

        if !report.satisfied {
            warn!(
                "maze {}x{} kept after {} attempts without meeting difficulty",
                self.width, self.height, report.attempts
            );
        }
        report
    }

    fn build(&mut self, width: usize, height: usize) -> usize {
        let width = normalize_side(width);
        let height = normalize_side(height);
        let mut grid = vec![vec![CellKind::Wall; width]; height];

        carve_passages(&mut grid, width, height, &mut self.rng);
        let loops = create_loops(&mut grid, width, height, &mut self.rng);
        grid[1][1] = CellKind::Start;
        grid[height - 2][width - 2] = CellKind::Goal;

        self.width = width;
        self.height = height;
        self.grid = grid;
        loops
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn grid(&self) -> &[Vec<CellKind>] {
        &self.grid
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<CellKind> {
        cell_at(&self.grid, x, y)
    }

    pub fn find_cell(&self, kind: CellKind) -> Option<Vec2> {
        self.grid.iter().enumerate().find_map(|(y, row)| {
            row.iter()
                .position(|cell| *cell == kind)
                .map(|x| Vec2::new(x as i32, y as i32))
        })
    }

    pub fn start(&self) -> Option<Vec2> {
        self.find_cell(CellKind::Start)
    }

    pub fn goal(&self) -> Option<Vec2> {
        self.find_cell(CellKind::Goal)
    }

    pub fn is_valid_move(&self, x: i32, y: i32) -> bool {
        is_passable(&self.grid, x, y)
    }

    pub fn is_goal(&self, x: i32, y: i32) -> bool {
        self.cell(x, y) == Some(CellKind::Goal)
    }

    pub fn find_solution(&self) -> Option<Vec<Vec2>> {
        let start = self.start()?;
        let goal = self.goal()?;
        shortest_path(&self.grid, start, goal)
    }

    pub fn find_path(&self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> Option<Vec<Vec2>> {
        shortest_path(&self.grid, Vec2::new(from_x, from_y), Vec2::new(to_x, to_y))
    }

    pub fn render(&self) -> Vec<String> {
        self.grid
            .iter()
            .map(|row| row.iter().map(|cell| cell.glyph()).collect())
            .collect()
    }

    pub fn snapshot(&self) -> MazeSnapshot {
        MazeSnapshot {
            width: self.width,
            height: self.height,
            start: self.start().unwrap_or(Vec2::new(1, 1)),
            goal: self
                .goal()
                .unwrap_or(Vec2::new(self.width as i32 - 2, self.height as i32 - 2)),
            tiles: self.render(),
        }
    }
}

fn normalize_side(side: usize) -> usize {
    let side = side.max(MIN_MAZE_SIDE);
    if side % 2 == 0 {
        side + 1
    } else {
        side
    }
}
