use std::collections::HashSet;

use crate::constants::{MIN_CLUSTER_SIZE, MIN_RUN_LENGTH};
use crate::types::{GridPos, Tile};

pub(super) type Board = Vec<Vec<Option<Tile>>>;

fn match_color(grid: &[Vec<Option<Tile>>], row: usize, col: usize) -> Option<u8> {
    grid.get(row)
        .and_then(|cells| cells.get(col))
        .copied()
        .flatten()
        .and_then(|tile| tile.match_color())
}

pub(super) fn find_all_matches(grid: &[Vec<Option<Tile>>]) -> Vec<GridPos> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut push = |pos: GridPos| {
        if seen.insert(pos) {
            out.push(pos);
        }
    };

    for pos in horizontal_runs(grid) {
        push(pos);
    }
    for pos in vertical_runs(grid) {
        push(pos);
    }
    for pos in clusters(grid) {
        push(pos);
    }
    out
}

pub(super) fn has_any_match(grid: &[Vec<Option<Tile>>]) -> bool {
    !horizontal_runs(grid).is_empty()
        || !vertical_runs(grid).is_empty()
        || !clusters(grid).is_empty()
}

fn horizontal_runs(grid: &[Vec<Option<Tile>>]) -> Vec<GridPos> {
    let mut out = Vec::new();
    for (row, cells) in grid.iter().enumerate() {
        let mut col = 0;
        while col < cells.len() {
            let Some(color) = match_color(grid, row, col) else {
                col += 1;
                continue;
            };
            let mut end = col + 1;
            while end < cells.len() && match_color(grid, row, end) == Some(color) {
                end += 1;
            }
            if end - col >= MIN_RUN_LENGTH {
                out.extend((col..end).map(|c| GridPos::new(row, c)));
            }
            col = end;
        }
    }
    out
}

fn vertical_runs(grid: &[Vec<Option<Tile>>]) -> Vec<GridPos> {
    let mut out = Vec::new();
    let height = grid.len();
    let width = grid.first().map(|cells| cells.len()).unwrap_or(0);
    for col in 0..width {
        let mut row = 0;
        while row < height {
            let Some(color) = match_color(grid, row, col) else {
                row += 1;
                continue;
            };
            let mut end = row + 1;
            while end < height && match_color(grid, end, col) == Some(color) {
                end += 1;
            }
            if end - row >= MIN_RUN_LENGTH {
                out.extend((row..end).map(|r| GridPos::new(r, col)));
            }
            row = end;
        }
    }
    out
}

fn clusters(grid: &[Vec<Option<Tile>>]) -> Vec<GridPos> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();

    for (row, cells) in grid.iter().enumerate() {
        for col in 0..cells.len() {
            let origin = GridPos::new(row, col);
            let Some(color) = match_color(grid, row, col) else {
                continue;
            };
            if visited.contains(&origin) {
                continue;
            }

            let mut region = Vec::new();
            let mut stack = vec![origin];
            visited.insert(origin);
            while let Some(pos) = stack.pop() {
                region.push(pos);
                for next in neighbors(pos) {
                    if match_color(grid, next.row, next.col) == Some(color)
                        && visited.insert(next)
                    {
                        stack.push(next);
                    }
                }
            }
            if region.len() >= MIN_CLUSTER_SIZE {
                out.extend(region);
            }
        }
    }
    out
}

pub(super) fn neighbors(pos: GridPos) -> impl Iterator<Item = GridPos> {
    let GridPos { row, col } = pos;
    [
        row.checked_sub(1).map(|r| GridPos::new(r, col)),
        Some(GridPos::new(row + 1, col)),
        col.checked_sub(1).map(|c| GridPos::new(row, c)),
        Some(GridPos::new(row, col + 1)),
    ]
    .into_iter()
    .flatten()
}

pub(super) fn completes_run(grid: &[Vec<Option<Tile>>], row: usize, col: usize, color: u8) -> bool {
    let left = col >= 2
        && match_color(grid, row, col - 1) == Some(color)
        && match_color(grid, row, col - 2) == Some(color);
    let up = row >= 2
        && match_color(grid, row - 1, col) == Some(color)
        && match_color(grid, row - 2, col) == Some(color);
    left || up
}

pub(super) fn completes_cluster(grid: &[Vec<Option<Tile>>], row: usize, col: usize, color: u8) -> bool {
    let origin = GridPos::new(row, col);
    let mut visited = HashSet::from([origin]);
    let mut stack = vec![origin];
    while let Some(pos) = stack.pop() {
        for next in neighbors(pos) {
            if match_color(grid, next.row, next.col) == Some(color) && visited.insert(next) {
                if visited.len() >= MIN_CLUSTER_SIZE {
                    return true;
                }
                stack.push(next);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TileKind;

    /// Digits are colours, `x` is corrupted, `_` is a hole.
    fn board(rows: &[&str]) -> Board {
        rows.iter()
            .map(|row| {
                row.chars()
                    .map(|c| match c {
                        '_' => None,
                        'x' => Some(Tile {
                            color: 0,
                            kind: TileKind::Corrupted,
                        }),
                        d => Some(Tile::normal(d.to_digit(10).expect("digit") as u8)),
                    })
                    .collect()
            })
            .collect()
    }

    fn sorted(mut values: Vec<GridPos>) -> Vec<GridPos> {
        values.sort();
        values
    }

    #[test]
    fn finds_horizontal_and_vertical_runs() {
        let grid = board(&[
            "11102", //
            "20312", //
            "30412", //
            "45123",
        ]);
        let matches = sorted(find_all_matches(&grid));
        assert_eq!(
            matches,
            vec![
                GridPos::new(0, 0),
                GridPos::new(0, 1),
                GridPos::new(0, 2),
                GridPos::new(0, 4),
                GridPos::new(1, 4),
                GridPos::new(2, 4),
            ]
        );
    }

    #[test]
    fn run_of_two_is_not_a_match() {
        let grid = board(&["1123", "2311", "3123"]);
        assert!(find_all_matches(&grid).is_empty());
        assert!(!has_any_match(&grid));
    }

    #[test]
    fn corrupted_tile_breaks_a_run() {
        let grid = board(&["11x11", "23456", "34562"]);
        assert!(find_all_matches(&grid).is_empty());
    }

    #[test]
    fn corrupted_tiles_never_match_each_other() {
        let grid = board(&["xxx2", "x343", "x565", "1212"]);
        assert!(find_all_matches(&grid).is_empty());
    }

    #[test]
    fn cluster_of_five_without_a_run_matches() {
        let grid = board(&[
            "11234", //
            "21134", //
            "23142", //
            "32323",
        ]);
        let matches = find_all_matches(&grid);
        for pos in [
            GridPos::new(0, 0),
            GridPos::new(0, 1),
            GridPos::new(1, 1),
            GridPos::new(1, 2),
            GridPos::new(2, 2),
        ] {
            assert!(matches.contains(&pos), "missing {pos:?}");
        }
        assert_eq!(matches.len(), 5);
    }

    #[test]
    fn cluster_of_four_does_not_match() {
        let grid = board(&["1123", "2113", "3232"]);
        assert!(find_all_matches(&grid).is_empty());
    }

    #[test]
    fn overlapping_detections_are_reported_once() {
        let grid = board(&[
            "11123", //
            "14234", //
            "15345",
        ]);
        let matches = find_all_matches(&grid);
        let unique: HashSet<GridPos> = matches.iter().copied().collect();
        assert_eq!(unique.len(), matches.len());
        assert_eq!(matches.len(), 5);
    }

    #[test]
    fn holes_do_not_match() {
        let grid = board(&["1_11", "2345", "3452"]);
        assert!(find_all_matches(&grid).is_empty());
    }

    #[test]
    fn completes_run_checks_left_and_up() {
        let grid = board(&["11_", "2__", "2__"]);
        assert!(completes_run(&grid, 0, 2, 1));
        assert!(!completes_run(&grid, 0, 2, 2));
        let grid = board(&["2__", "2__", "___"]);
        assert!(completes_run(&grid, 2, 0, 2));
        assert!(!completes_run(&grid, 2, 0, 3));
    }

    #[test]
    fn completes_cluster_counts_the_joined_region() {
        let grid = board(&[
            "11_", //
            "21_", //
            "___",
        ]);
        // (1,2) would join three 1s: region of four
        assert!(!completes_cluster(&grid, 1, 2, 1));
        let grid = board(&[
            "112", //
            "31_", //
            "_1_",
        ]);
        assert!(completes_cluster(&grid, 1, 2, 1));
        assert!(!completes_cluster(&grid, 1, 2, 2));
    }
}
