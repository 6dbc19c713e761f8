use crate::constants::MIN_PATH_RATIO;
use crate::types::CellKind;

pub(super) fn min_solution_cells(width: usize, height: usize) -> usize {
    let (num, den) = MIN_PATH_RATIO;
    ((width + height) * num).div_ceil(den)
}

pub(super) fn has_straight_corridor(grid: &[Vec<CellKind>], width: usize, height: usize) -> bool {
    if width < 3 || height < 3 {
        return false;
    }
    let open_row = (1..height - 1).any(|y| (1..width - 1).all(|x| grid[y][x].is_passable()));
    let open_col = (1..width - 1).any(|x| (1..height - 1).all(|y| grid[y][x].is_passable()));
    open_row || open_col
}

pub(super) fn meets_difficulty(
    grid: &[Vec<CellKind>],
    width: usize,
    height: usize,
    solution_cells: usize,
) -> bool {
    solution_cells >= min_solution_cells(width, height)
        && !has_straight_corridor(grid, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from(rows: &[&str]) -> Vec<Vec<CellKind>> {
        rows.iter()
            .map(|row| {
                row.chars()
                    .map(|c| {
                        if c == '#' {
                            CellKind::Wall
                        } else {
                            CellKind::Path
                        }
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn min_solution_rounds_up() {
        assert_eq!(min_solution_cells(11, 11), 18);
        assert_eq!(min_solution_cells(5, 5), 8);
        assert_eq!(min_solution_cells(29, 31), 48);
    }

    #[test]
    fn detects_open_row_and_column() {
        let open_row = grid_from(&["#####", "#...#", "#.#.#", "#.#.#", "#####"]);
        assert!(has_straight_corridor(&open_row, 5, 5));

        let open_col = grid_from(&["#####", "#.#.#", "#.#.#", "#...#", "#####"]);
        assert!(has_straight_corridor(&open_col, 5, 5));

        let middle_row = grid_from(&["#####", "#.#.#", "#...#", "###.#", "#####"]);
        assert!(has_straight_corridor(&middle_row, 5, 5));

        let winding = grid_from(&["#####", "#..##", "##..#", "#.#.#", "#####"]);
        assert!(!has_straight_corridor(&winding, 5, 5));
    }

    #[test]
    fn short_solution_fails_gate() {
        let winding = grid_from(&["#####", "#..##", "##..#", "#.#.#", "#####"]);
        assert!(!meets_difficulty(&winding, 5, 5, 7));
        assert!(meets_difficulty(&winding, 5, 5, 8));
    }
}
