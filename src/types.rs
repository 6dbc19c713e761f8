use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::PuzzleError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn is_adjacent(self, other: GridPos) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Wall,
    Path,
    Start,
    Goal,
}

impl CellKind {
    pub fn is_passable(self) -> bool {
        !matches!(self, Self::Wall)
    }

    pub fn glyph(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Path => '.',
            Self::Start => 'S',
            Self::Goal => 'G',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "right" => Some(Self::Right),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            _ => None,
        }
    }

    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }

    pub fn between(from: Vec2, to: Vec2) -> Option<Self> {
        Self::ALL.into_iter().find(|dir| from.step(*dir) == to)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Normal,
    Corrupted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub color: u8,
    pub kind: TileKind,
}

impl Tile {
    pub fn normal(color: u8) -> Self {
        Self {
            color,
            kind: TileKind::Normal,
        }
    }

    pub fn is_corrupted(&self) -> bool {
        self.kind == TileKind::Corrupted
    }

    /// Colour used for matching. Corrupted tiles never match anything.
    pub fn match_color(&self) -> Option<u8> {
        match self.kind {
            TileKind::Normal => Some(self.color),
            TileKind::Corrupted => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RemoveOutcome {
    pub points: u64,
    #[serde(rename = "removedCount")]
    pub removed_count: usize,
    pub combo: u32,
    #[serde(rename = "comboMultiplier")]
    pub combo_multiplier: f32,
    #[serde(rename = "corruptedCleared")]
    pub corrupted_cleared: usize,
    #[serde(rename = "bonusPoints")]
    pub bonus_points: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboTier {
    None,
    Hot,
    Frenzy,
    Burst,
}

impl ComboTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Hot => "hot streak",
            Self::Frenzy => "frenzy",
            Self::Burst => "super burst",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Hot => "#FFA500",
            Self::Frenzy => "#FF6B6B",
            Self::Burst => "#FF0000",
        }
    }

    pub fn multiplier(self) -> f32 {
        match self {
            Self::None => 1.0,
            Self::Hot => 1.2,
            Self::Frenzy => 1.5,
            Self::Burst => 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = PuzzleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| PuzzleError::UnknownDifficulty(value.to_string()))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Classic,
    Survival,
}

impl GameMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "classic" => Some(Self::Classic),
            "survival" => Some(Self::Survival),
            _ => None,
        }
    }
}

impl FromStr for GameMode {
    type Err = PuzzleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| PuzzleError::UnknownMode(value.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DifficultyPreset {
    pub difficulty: Difficulty,
    pub size: usize,
    #[serde(rename = "timeBonus")]
    pub time_bonus: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LevelConfig {
    pub level: usize,
    pub width: usize,
    pub height: usize,
    #[serde(rename = "timeLimitSecs")]
    pub time_limit_secs: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MazeSnapshot {
    pub width: usize,
    pub height: usize,
    pub start: Vec2,
    pub goal: Vec2,
    pub tiles: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Match3Snapshot {
    pub grid: Vec<Vec<Option<Tile>>>,
    pub score: u64,
    pub combo: u32,
    #[serde(rename = "maxCombo")]
    pub max_combo: u32,
    #[serde(rename = "comboTier")]
    pub combo_tier: ComboTier,
    #[serde(rename = "hasValidMoves")]
    pub has_valid_moves: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_offsets_are_inverse_pairs() {
        let origin = Vec2::new(5, 5);
        assert_eq!(origin.step(Direction::Up), Vec2::new(5, 4));
        assert_eq!(origin.step(Direction::Right), Vec2::new(6, 5));
        assert_eq!(origin.step(Direction::Down), Vec2::new(5, 6));
        assert_eq!(origin.step(Direction::Left), Vec2::new(4, 5));
        assert_eq!(
            Direction::between(origin, Vec2::new(4, 5)),
            Some(Direction::Left)
        );
        assert_eq!(Direction::between(origin, Vec2::new(4, 4)), None);
    }

    #[test]
    fn adjacency_is_orthogonal_only() {
        let pos = GridPos::new(3, 3);
        assert!(pos.is_adjacent(GridPos::new(2, 3)));
        assert!(pos.is_adjacent(GridPos::new(3, 4)));
        assert!(!pos.is_adjacent(GridPos::new(4, 4)));
        assert!(!pos.is_adjacent(pos));
        assert!(!pos.is_adjacent(GridPos::new(3, 5)));
    }

    #[test]
    fn corrupted_tiles_have_no_match_color() {
        let tile = Tile {
            color: 2,
            kind: TileKind::Corrupted,
        };
        assert_eq!(tile.match_color(), None);
        assert_eq!(Tile::normal(2).match_color(), Some(2));
    }

    #[test]
    fn parses_difficulty_and_mode() {
        assert_eq!("hard".parse::<Difficulty>().ok(), Some(Difficulty::Hard));
        assert!(matches!(
            "extreme".parse::<Difficulty>(),
            Err(PuzzleError::UnknownDifficulty(_))
        ));
        assert_eq!(GameMode::parse("survival"), Some(GameMode::Survival));
        assert!("arcade".parse::<GameMode>().is_err());
    }

    #[test]
    fn parses_directions_and_steps_with_them() {
        let origin = Vec2::new(3, 3);
        for (name, dir, expected) in [
            ("up", Direction::Up, Vec2::new(3, 2)),
            ("right", Direction::Right, Vec2::new(4, 3)),
            ("down", Direction::Down, Vec2::new(3, 4)),
            ("left", Direction::Left, Vec2::new(2, 3)),
        ] {
            assert_eq!(Direction::parse(name), Some(dir));
            assert_eq!(origin.step(dir), expected);
            assert_eq!(Direction::between(origin, expected), Some(dir));
        }
        assert_eq!(Direction::parse("Up"), None);
        assert_eq!(Direction::parse("north"), None);
    }
}
