use std::collections::VecDeque;

use crate::types::{CellKind, Direction, Vec2};

pub(super) fn cell_at(grid: &[Vec<CellKind>], x: i32, y: i32) -> Option<CellKind> {
    if x < 0 || y < 0 {
        return None;
    }
    grid.get(y as usize)
        .and_then(|row| row.get(x as usize))
        .copied()
}

pub(super) fn is_passable(grid: &[Vec<CellKind>], x: i32, y: i32) -> bool {
    cell_at(grid, x, y)
        .map(|cell| cell.is_passable())
        .unwrap_or(false)
}

/// Breadth-first shortest path from `from` to `to`, both inclusive.
pub(super) fn shortest_path(grid: &[Vec<CellKind>], from: Vec2, to: Vec2) -> Option<Vec<Vec2>> {
    if !is_passable(grid, from.x, from.y) || !is_passable(grid, to.x, to.y) {
        return None;
    }
    if from == to {
        return Some(vec![from]);
    }

    let height = grid.len();
    let width = grid.first().map(|row| row.len()).unwrap_or(0);
    let index = |pos: Vec2| pos.y as usize * width + pos.x as usize;
    let mut parent: Vec<Option<Vec2>> = vec![None; width * height];
    let mut visited = vec![false; width * height];
    let mut queue = VecDeque::new();

    visited[index(from)] = true;
    queue.push_back(from);

    while let Some(pos) = queue.pop_front() {
        if pos == to {
            return Some(rebuild_path(&parent, index, from, to));
        }
        for dir in Direction::ALL {
            let next = pos.step(dir);
            if !is_passable(grid, next.x, next.y) || visited[index(next)] {
                continue;
            }
            visited[index(next)] = true;
            parent[index(next)] = Some(pos);
            queue.push_back(next);
        }
    }
    None
}

fn rebuild_path(
    parent: &[Option<Vec2>],
    index: impl Fn(Vec2) -> usize,
    from: Vec2,
    to: Vec2,
) -> Vec<Vec2> {
    let mut out = vec![to];
    let mut cursor = to;
    while cursor != from {
        match parent[index(cursor)] {
            Some(prev) => {
                out.push(prev);
                cursor = prev;
            }
            None => break,
        }
    }
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(rows: &[&str]) -> Vec<Vec<CellKind>> {
        rows.iter()
            .map(|row| {
                row.chars()
                    .map(|c| match c {
                        '#' => CellKind::Wall,
                        'S' => CellKind::Start,
                        'G' => CellKind::Goal,
                        _ => CellKind::Path,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn finds_shortest_route_through_open_room() {
        let grid = parse(&[
            "#######", //
            "#S....#", //
            "#.###.#", //
            "#.....#", //
            "#####G#", //
            "#######",
        ]);
        let path = shortest_path(&grid, Vec2::new(1, 1), Vec2::new(5, 4)).expect("reachable");
        assert_eq!(path.first(), Some(&Vec2::new(1, 1)));
        assert_eq!(path.last(), Some(&Vec2::new(5, 4)));
        assert_eq!(path.len(), 8);
        for pair in path.windows(2) {
            assert!(Direction::between(pair[0], pair[1]).is_some());
        }
    }

    #[test]
    fn ties_prefer_up_then_right() {
        let grid = parse(&[
            "#####", //
            "#...#", //
            "#...#", //
            "#...#", //
            "#####",
        ]);
        let path = shortest_path(&grid, Vec2::new(1, 3), Vec2::new(3, 1)).expect("reachable");
        assert_eq!(
            path,
            vec![
                Vec2::new(1, 3),
                Vec2::new(1, 2),
                Vec2::new(1, 1),
                Vec2::new(2, 1),
                Vec2::new(3, 1),
            ]
        );
    }

    #[test]
    fn unreachable_target_is_none() {
        let grid = parse(&[
            "#####", //
            "#S#.#", //
            "#.#.#", //
            "###G#", //
            "#####",
        ]);
        assert!(shortest_path(&grid, Vec2::new(1, 1), Vec2::new(3, 3)).is_none());
    }

    #[test]
    fn walls_and_out_of_bounds_endpoints_are_none() {
        let grid = parse(&["###", "#.#", "###"]);
        assert!(shortest_path(&grid, Vec2::new(0, 0), Vec2::new(1, 1)).is_none());
        assert!(shortest_path(&grid, Vec2::new(1, 1), Vec2::new(-1, 1)).is_none());
        assert!(shortest_path(&grid, Vec2::new(1, 1), Vec2::new(1, 9)).is_none());
        assert_eq!(
            shortest_path(&grid, Vec2::new(1, 1), Vec2::new(1, 1)),
            Some(vec![Vec2::new(1, 1)])
        );
    }
}
