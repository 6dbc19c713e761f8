use crate::constants::{LOOP_ATTEMPTS_PER_LOOP, LOOP_DENSITY_DIVISOR};
use crate::rng::RandomSource;
use crate::types::{CellKind, Direction};

struct Frame {
    x: usize,
    y: usize,
    dirs: [Direction; 4],
    next: usize,
}

impl Frame {
    fn enter<R: RandomSource>(x: usize, y: usize, rng: &mut R) -> Self {
        let mut dirs = Direction::ALL;
        rng.shuffle(&mut dirs);
        Self { x, y, dirs, next: 0 }
    }

    fn next_dir(&mut self) -> Option<Direction> {
        let dir = self.dirs.get(self.next).copied()?;
        self.next += 1;
        Some(dir)
    }
}

pub(super) fn carve_passages<R: RandomSource>(
    grid: &mut [Vec<CellKind>],
    width: usize,
    height: usize,
    rng: &mut R,
) {
    grid[1][1] = CellKind::Path;
    let mut stack = vec![Frame::enter(1, 1, rng)];

    while let Some(frame) = stack.last_mut() {
        let Some(dir) = frame.next_dir() else {
            stack.pop();
            continue;
        };
        let (dx, dy) = dir.offset();
        let nx = frame.x as i32 + dx * 2;
        let ny = frame.y as i32 + dy * 2;
        if !is_room_in_bounds(nx, ny, width, height) {
            continue;
        }
        let (nx, ny) = (nx as usize, ny as usize);
        if grid[ny][nx] != CellKind::Wall {
            continue;
        }
        let wall_x = (frame.x as i32 + dx) as usize;
        let wall_y = (frame.y as i32 + dy) as usize;
        grid[wall_y][wall_x] = CellKind::Path;
        grid[ny][nx] = CellKind::Path;
        stack.push(Frame::enter(nx, ny, rng));
    }
}

pub(super) fn create_loops<R: RandomSource>(
    grid: &mut [Vec<CellKind>],
    width: usize,
    height: usize,
    rng: &mut R,
) -> usize {
    let target = width * height / LOOP_DENSITY_DIVISOR;
    let max_attempts = target * LOOP_ATTEMPTS_PER_LOOP;
    let mut created = 0;
    let mut attempts = 0;

    while created < target && attempts < max_attempts {
        attempts += 1;
        let x = rng.int(1, width as i32 - 2) as usize;
        let y = rng.int(1, height as i32 - 2) as usize;
        if (x % 2 == 0) == (y % 2 == 0) {
            continue;
        }
        if grid[y][x] == CellKind::Wall && passable_neighbors(grid, x, y) == 2 {
            grid[y][x] = CellKind::Path;
            created += 1;
        }
    }
    created
}

fn is_room_in_bounds(x: i32, y: i32, width: usize, height: usize) -> bool {
    x > 0 && y > 0 && x < width as i32 - 1 && y < height as i32 - 1
}

fn passable_neighbors(grid: &[Vec<CellKind>], x: usize, y: usize) -> usize {
    Direction::ALL
        .into_iter()
        .filter(|dir| {
            let (dx, dy) = dir.offset();
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 {
                return false;
            }
            grid.get(ny as usize)
                .and_then(|row| row.get(nx as usize))
                .map(|cell| cell.is_passable())
                .unwrap_or(false)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};

    use super::*;
    use crate::rng::Rng;

    fn blank(width: usize, height: usize) -> Vec<Vec<CellKind>> {
        vec![vec![CellKind::Wall; width]; height]
    }

    fn open_cells(grid: &[Vec<CellKind>]) -> usize {
        grid.iter()
            .flatten()
            .filter(|cell| cell.is_passable())
            .count()
    }

    #[test]
    fn carving_visits_every_room() {
        for seed in 0..50u32 {
            let (width, height) = (15, 11);
            let mut grid = blank(width, height);
            carve_passages(&mut grid, width, height, &mut Rng::new(seed));
            for y in (1..height).step_by(2) {
                for x in (1..width).step_by(2) {
                    assert_eq!(grid[y][x], CellKind::Path, "seed={seed} room ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn carving_produces_a_spanning_tree() {
        for seed in 0..50u32 {
            let (width, height) = (21, 17);
            let mut grid = blank(width, height);
            carve_passages(&mut grid, width, height, &mut Rng::new(seed));
            let rooms = (width / 2) * (height / 2);
            // a tree over n rooms has n - 1 connecting cells
            assert_eq!(open_cells(&grid), rooms + rooms - 1);

            let mut seen = HashSet::new();
            let mut queue = VecDeque::from([(1usize, 1usize)]);
            seen.insert((1, 1));
            while let Some((x, y)) = queue.pop_front() {
                for dir in Direction::ALL {
                    let (dx, dy) = dir.offset();
                    let nx = (x as i32 + dx) as usize;
                    let ny = (y as i32 + dy) as usize;
                    if grid[ny][nx].is_passable() && seen.insert((nx, ny)) {
                        queue.push_back((nx, ny));
                    }
                }
            }
            assert_eq!(seen.len(), open_cells(&grid));
        }
    }

    #[test]
    fn border_stays_walled() {
        let (width, height) = (13, 13);
        let mut grid = blank(width, height);
        let mut rng = Rng::new(8);
        carve_passages(&mut grid, width, height, &mut rng);
        create_loops(&mut grid, width, height, &mut rng);
        for x in 0..width {
            assert_eq!(grid[0][x], CellKind::Wall);
            assert_eq!(grid[height - 1][x], CellKind::Wall);
        }
        for row in &grid {
            assert_eq!(row[0], CellKind::Wall);
            assert_eq!(row[width - 1], CellKind::Wall);
        }
    }

    #[test]
    fn loops_only_open_walls_between_rooms() {
        for seed in 0..30u32 {
            let (width, height) = (21, 21);
            let mut grid = blank(width, height);
            let mut rng = Rng::new(seed);
            carve_passages(&mut grid, width, height, &mut rng);
            let before = grid.clone();
            let created = create_loops(&mut grid, width, height, &mut rng);
            assert!(created <= width * height / LOOP_DENSITY_DIVISOR);
            assert_eq!(open_cells(&grid), open_cells(&before) + created);
            for y in 0..height {
                for x in 0..width {
                    if before[y][x] != grid[y][x] {
                        assert_ne!(x % 2 == 0, y % 2 == 0);
                    }
                }
            }
        }
    }

    #[test]
    fn large_grids_do_not_overflow_the_stack() {
        let (width, height) = (401, 401);
        let mut grid = blank(width, height);
        carve_passages(&mut grid, width, height, &mut Rng::new(3));
        assert_eq!(grid[height - 2][width - 2], CellKind::Path);
    }
}
