use std::collections::HashSet;

use serde::Serialize;

use super::MazeEngine;
use crate::rng::RandomSource;
use crate::types::{Direction, LevelConfig, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOutcome {
    Moved,
    Blocked,
    ReachedGoal,
    Finished,
}

#[derive(Clone, Debug)]
pub struct MazeRun {
    position: Vec2,
    steps: u32,
    visited: Vec<Vec2>,
    visited_set: HashSet<Vec2>,
    won: bool,
    time_limit_secs: Option<u32>,
}

impl MazeRun {
    pub fn new<R: RandomSource>(maze: &MazeEngine<R>) -> Option<Self> {
        let start = maze.start()?;
        Some(Self {
            position: start,
            steps: 0,
            visited: vec![start],
            visited_set: HashSet::from([start]),
            won: false,
            time_limit_secs: None,
        })
    }

    pub fn with_level(mut self, level: &LevelConfig) -> Self {
        self.time_limit_secs = level.time_limit_secs;
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn visited(&self) -> &[Vec2] {
        &self.visited
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit_secs
    }

    pub fn is_timed_out(&self, elapsed_secs: u64) -> bool {
        !self.won
            && self
                .time_limit_secs
                .map(|limit| elapsed_secs >= u64::from(limit))
                .unwrap_or(false)
    }

    pub fn try_move<R: RandomSource>(&mut self, maze: &MazeEngine<R>, dir: Direction) -> MoveOutcome {
        if self.won {
            return MoveOutcome::Finished;
        }
        let next = self.position.step(dir);
        if !maze.is_valid_move(next.x, next.y) {
            return MoveOutcome::Blocked;
        }
        self.position = next;
        self.steps += 1;
        if self.visited_set.insert(next) {
            self.visited.push(next);
        }
        if maze.is_goal(next.x, next.y) {
            self.won = true;
            return MoveOutcome::ReachedGoal;
        }
        MoveOutcome::Moved
    }

    pub fn path_to<R: RandomSource>(&self, maze: &MazeEngine<R>, x: i32, y: i32) -> Option<Vec<Vec2>> {
        if self.position == Vec2::new(x, y) {
            return None;
        }
        maze.find_path(self.position.x, self.position.y, x, y)
    }

    /// Replays a path one step at a time, stopping at the first step that
    /// does not simply move. `None` when the path holds no step to take.
    pub fn follow<R: RandomSource>(&mut self, maze: &MazeEngine<R>, path: &[Vec2]) -> Option<MoveOutcome> {
        let steps = match path.first() {
            Some(first) if *first == self.position => &path[1..],
            _ => path,
        };
        let mut last = None;
        for target in steps {
            let Some(dir) = Direction::between(self.position, *target) else {
                return Some(MoveOutcome::Blocked);
            };
            let outcome = self.try_move(maze, dir);
            last = Some(outcome);
            if outcome != MoveOutcome::Moved {
                break;
            }
        }
        last
    }
}
