use chrono::{SecondsFormat, Utc};
use clap::Parser;
use puzzle_core::constants::{
    get_difficulty_preset, get_level_config, DEFAULT_COLOR_COUNT, DEFAULT_GRID_SIZE,
    MAX_SHUFFLE_ATTEMPTS,
};
use puzzle_core::types::{Difficulty, GameMode, GridPos};
use puzzle_core::{
    now_ms, Match3Engine, MazeEngine, MazeRun, MoveOutcome, PuzzleError, Rng, SurvivalMode,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

const MOVE_INTERVAL_MS: u64 = 1_500;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// maze, match3 or all
    #[arg(long)]
    game: Option<String>,
    #[arg(long)]
    runs: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    level: Option<usize>,
    #[arg(long)]
    difficulty: Option<String>,
    /// classic or survival
    #[arg(long)]
    mode: Option<String>,
    #[arg(long)]
    moves: Option<u32>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum GameKind {
    Maze,
    Match3,
}

impl GameKind {
    fn key(self) -> &'static str {
        match self {
            Self::Maze => "maze",
            Self::Match3 => "match3",
        }
    }
}

fn parse_games(value: &str) -> puzzle_core::Result<Vec<GameKind>> {
    match value {
        "maze" => Ok(vec![GameKind::Maze]),
        "match3" => Ok(vec![GameKind::Match3]),
        "all" => Ok(vec![GameKind::Maze, GameKind::Match3]),
        other => Err(PuzzleError::UnknownGame(other.to_string())),
    }
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    game: GameKind,
    seed: u32,
    level: Option<usize>,
    difficulty: Difficulty,
    mode: GameMode,
    moves: u32,
}

#[derive(Clone, Debug, Serialize)]
struct MazeStats {
    width: usize,
    height: usize,
    attempts: usize,
    satisfied: bool,
    #[serde(rename = "solutionLength")]
    solution_length: usize,
    loops: usize,
    steps: u32,
    #[serde(rename = "timeLimitSecs")]
    time_limit_secs: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
struct Match3Stats {
    mode: GameMode,
    #[serde(rename = "movesPlayed")]
    moves_played: u32,
    score: u64,
    #[serde(rename = "maxCombo")]
    max_combo: u32,
    #[serde(rename = "cascadeSteps")]
    cascade_steps: usize,
    reshuffles: usize,
    #[serde(rename = "corruptedAdded")]
    corrupted_added: usize,
    #[serde(rename = "threatLevel")]
    threat_level: u32,
    #[serde(rename = "gameOver")]
    game_over: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "game", rename_all = "snake_case")]
enum GameStats {
    Maze(MazeStats),
    Match3(Match3Stats),
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    #[serde(flatten)]
    stats: GameStats,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    step: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_step: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "gameCounts")]
    game_counts: BTreeMap<String, usize>,
    #[serde(rename = "unsatisfiedMazes")]
    unsatisfied_mazes: usize,
    #[serde(rename = "averageMatch3Score")]
    average_match3_score: u64,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<u64>,
    details: Value,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let started_at = iso_now();
    let run_started_at_ms = now_ms();
    let scenarios = match resolve_scenarios(&cli) {
        Ok(scenarios) => scenarios,
        Err(error) => {
            let run_id = cli.run_id.clone().unwrap_or_else(|| default_run_id(0, run_started_at_ms));
            emit_log(
                "error",
                "invalid_arguments",
                &run_id,
                None,
                None,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "game": scenario.game,
                "level": scenario.level,
                "difficulty": scenario.difficulty,
                "mode": scenario.mode,
                "moves": scenario.moves,
            }),
        );
        let scenario_run = run_scenario(&scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.step),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_step),
            json!({
                "durationMs": scenario_run.result.duration_ms,
                "stats": scenario_run.result.stats,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                "error",
                "result_serialize_failed",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                None,
                json!({ "error": error.to_string() }),
            ),
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(run_id.clone(), started_at, iso_now(), scenario_results, total_anomalies);

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "gameCounts": summary.game_counts,
            "unsatisfiedMazes": summary.unsatisfied_mazes,
            "averageMatch3Score": summary.average_match3_score,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let started = now_ms();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut push = |step: u64, message: String| {
        push_anomaly(&mut anomalies, &mut anomaly_records, &mut anomaly_seen, step, message)
    };

    let (stats, finished_step) = match scenario.game {
        GameKind::Maze => run_maze(scenario, &mut push),
        GameKind::Match3 => run_match3(scenario, &mut push),
    };

    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            duration_ms: now_ms().saturating_sub(started),
            stats,
            anomalies,
        },
        anomaly_records,
        finished_step,
    }
}

fn maze_dimensions(scenario: &Scenario) -> (usize, usize, Option<u32>) {
    match scenario.level {
        Some(level) => {
            let config = get_level_config(level);
            (config.width, config.height, config.time_limit_secs)
        }
        None => {
            let preset = get_difficulty_preset(scenario.difficulty);
            (preset.size, preset.size, None)
        }
    }
}

fn run_maze(scenario: &Scenario, push: &mut impl FnMut(u64, String)) -> (GameStats, u64) {
    let (width, height, time_limit_secs) = maze_dimensions(scenario);
    let mut maze = MazeEngine::with_seed(scenario.seed);
    let report = maze.generate_validated(width, height);

    let mut steps = 0;
    match (MazeRun::new(&maze), maze.find_solution()) {
        (Some(mut run), Some(solution)) => {
            let outcome = run.follow(&maze, &solution);
            steps = run.steps();
            if outcome != Some(MoveOutcome::ReachedGoal) {
                push(
                    u64::from(steps),
                    format!("solution walk ended with {outcome:?} at {:?}", run.position()),
                );
            }
            if steps as usize + 1 != solution.len() {
                push(
                    u64::from(steps),
                    format!("walked {steps} steps for a {}-cell solution", solution.len()),
                );
            }
        }
        _ => push(0, "generated maze has no start-to-goal route".to_string()),
    }

    let stats = MazeStats {
        width: maze.width(),
        height: maze.height(),
        attempts: report.attempts,
        satisfied: report.satisfied,
        solution_length: report.solution_length,
        loops: report.loops,
        steps,
        time_limit_secs,
    };
    (GameStats::Maze(stats), u64::from(steps))
}

fn play_first_valid_swap(engine: &mut Match3Engine<Rng>) -> Option<(GridPos, GridPos)> {
    let size = engine.size();
    for row in 0..size {
        for col in 0..size {
            if col + 1 < size && engine.swap(row, col, row, col + 1) {
                return Some((GridPos::new(row, col), GridPos::new(row, col + 1)));
            }
            if row + 1 < size && engine.swap(row, col, row + 1, col) {
                return Some((GridPos::new(row, col), GridPos::new(row + 1, col)));
            }
        }
    }
    None
}

fn collect_board_anomalies(engine: &Match3Engine<Rng>) -> Vec<String> {
    let mut anomalies = Vec::new();
    let holes = engine
        .grid()
        .iter()
        .flatten()
        .filter(|cell| cell.is_none())
        .count();
    if holes > 0 {
        anomalies.push(format!("settled board has {holes} holes"));
    }
    let matches = engine.find_all_matches();
    if !matches.is_empty() {
        anomalies.push(format!("settled board still has {} matched cells", matches.len()));
    }
    anomalies
}

fn run_match3(scenario: &Scenario, push: &mut impl FnMut(u64, String)) -> (GameStats, u64) {
    let mut engine = Match3Engine::with_seed(scenario.seed);
    engine.init_grid(DEFAULT_GRID_SIZE, DEFAULT_COLOR_COUNT);
    for message in collect_board_anomalies(&engine) {
        push(0, message);
    }

    let mut survival = match scenario.mode {
        GameMode::Survival => Some(SurvivalMode::new(scenario.level.unwrap_or(1) as u32)),
        GameMode::Classic => None,
    };
    let mut clock_ms = 0u64;
    let mut moves_played = 0u32;
    let mut cascade_steps = 0usize;
    let mut reshuffles = 0usize;
    let mut game_over = false;

    while moves_played < scenario.moves && !game_over {
        if play_first_valid_swap(&mut engine).is_none() {
            if engine.shuffle_until_playable(MAX_SHUFFLE_ATTEMPTS) {
                reshuffles += 1;
                continue;
            }
            break;
        }
        moves_played += 1;
        let previous_secs = clock_ms / 1_000;
        clock_ms += MOVE_INTERVAL_MS;

        let score_before = engine.score();
        let report = engine.settle_at(clock_ms);
        cascade_steps += report.steps.len();
        reshuffles += report.reshuffles;
        if report.steps.is_empty() {
            push(u64::from(moves_played), "accepted swap resolved no match".to_string());
        }
        if engine.score() != score_before + report.total_points() {
            push(u64::from(moves_played), "score drifted from settle report".to_string());
        }
        for message in collect_board_anomalies(&engine) {
            push(u64::from(moves_played), message);
        }

        if let Some(survival) = survival.as_mut() {
            for second in previous_secs + 1..=clock_ms / 1_000 {
                if let Some(tick) = survival.on_second(second, &mut engine) {
                    game_over = tick.game_over;
                }
            }
        }
    }

    let stats = Match3Stats {
        mode: scenario.mode,
        moves_played,
        score: engine.score(),
        max_combo: engine.max_combo(),
        cascade_steps,
        reshuffles,
        corrupted_added: survival.as_ref().map(|s| s.corrupted_added()).unwrap_or(0),
        threat_level: survival.as_ref().map(|s| s.threat_level()).unwrap_or(0),
        game_over,
    };
    (GameStats::Match3(stats), u64::from(moves_played))
}

fn resolve_scenarios(cli: &Cli) -> puzzle_core::Result<Vec<Scenario>> {
    let seed = cli.seed.unwrap_or_else(now_ms);
    let games = parse_games(cli.game.as_deref().unwrap_or("all"))?;
    let difficulty = match cli.difficulty.as_deref() {
        Some(value) => value.parse::<Difficulty>()?,
        None => Difficulty::Medium,
    };
    let mode = match cli.mode.as_deref() {
        Some(value) => value.parse::<GameMode>()?,
        None => GameMode::Classic,
    };
    let runs = cli.runs.unwrap_or(3).clamp(1, 1_000);
    let moves = cli.moves.unwrap_or(30).clamp(1, 10_000);

    let mut scenarios = Vec::new();
    for index in 0..runs {
        let run_seed = normalize_seed(seed.wrapping_add(u64::from(index)));
        for game in &games {
            scenarios.push(Scenario {
                name: format!("{}-{}", game.key(), index + 1),
                game: *game,
                seed: run_seed,
                level: cli.level,
                difficulty,
                mode,
                moves,
            });
        }
    }
    Ok(scenarios)
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    step: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        step,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at: String,
    finished_at: String,
    scenarios: Vec<ScenarioResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let mut game_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut unsatisfied_mazes = 0;
    let mut match3_runs = 0u64;
    let mut match3_score = 0u64;
    for scenario in &scenarios {
        match &scenario.stats {
            GameStats::Maze(stats) => {
                *game_counts.entry("maze".to_string()).or_insert(0) += 1;
                if !stats.satisfied {
                    unsatisfied_mazes += 1;
                }
            }
            GameStats::Match3(stats) => {
                *game_counts.entry("match3".to_string()).or_insert(0) += 1;
                match3_runs += 1;
                match3_score += stats.score;
            }
        }
    }
    let average_match3_score = if match3_runs == 0 {
        0
    } else {
        match3_score / match3_runs
    };
    RunSummary {
        run_id,
        started_at,
        finished_at,
        scenario_count: scenarios.len(),
        anomaly_count,
        game_counts,
        unsatisfied_mazes,
        average_match3_score,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    step: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        step,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => eprintln!("{line}"),
        Err(error) => log::error!("structured log dropped: {error}"),
    }
}

fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> puzzle_core::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)?;
    Ok(())
}
