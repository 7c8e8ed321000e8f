use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::maze::Difficulty;
use crate::word_grid::{Alphabet, PlacerConfig, DEFAULT_MAX_ATTEMPTS};

const DEFAULT_MAZE_ROWS: usize = 21;
const DEFAULT_MAZE_COLS: usize = 31;
const DEFAULT_WORD_ROWS: usize = 12;
const DEFAULT_WORD_COLS: usize = 12;
const DEFAULT_RENDER_FPS: u64 = 60;
const DEFAULT_STORE_PATH: &str = ".ilm-games.json";

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub maze_rows: usize,
    pub maze_cols: usize,
    pub difficulty: Difficulty,
    pub word_rows: usize,
    pub word_cols: usize,
    pub placer: PlacerConfig,
    /// Fixed seed for reproducible puzzles; fresh entropy when unset.
    pub seed: Option<u64>,
    pub time_limit: Option<Duration>,
    pub render_fps: u64,
    pub store_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            maze_rows: DEFAULT_MAZE_ROWS,
            maze_cols: DEFAULT_MAZE_COLS,
            difficulty: Difficulty::default(),
            word_rows: DEFAULT_WORD_ROWS,
            word_cols: DEFAULT_WORD_COLS,
            placer: PlacerConfig::default(),
            seed: None,
            time_limit: None,
            render_fps: DEFAULT_RENDER_FPS,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset or unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Settings::default();
        let placer = PlacerConfig {
            max_attempts: parse_positive(&lookup, "ILM_WORD_ATTEMPTS")
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            alphabet: parse::<Alphabet>(&lookup, "ILM_ALPHABET").unwrap_or_default(),
            ..PlacerConfig::default()
        };
        Settings {
            maze_rows: parse_at_least(&lookup, "ILM_MAZE_ROWS", 2).unwrap_or(defaults.maze_rows),
            maze_cols: parse_at_least(&lookup, "ILM_MAZE_COLS", 2).unwrap_or(defaults.maze_cols),
            difficulty: parse(&lookup, "ILM_DIFFICULTY").unwrap_or(defaults.difficulty),
            word_rows: parse_positive(&lookup, "ILM_WORD_ROWS").unwrap_or(defaults.word_rows),
            word_cols: parse_positive(&lookup, "ILM_WORD_COLS").unwrap_or(defaults.word_cols),
            placer,
            seed: parse(&lookup, "ILM_SEED"),
            time_limit: parse_positive(&lookup, "ILM_TIME_LIMIT_SECS")
                .map(Duration::from_secs),
            render_fps: parse_positive(&lookup, "ILM_FPS").unwrap_or(defaults.render_fps),
            store_path: lookup("ILM_STORE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
        }
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse::<T>().ok())
}

fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    parse::<T>(lookup, key).filter(|v| *v > T::default())
}

fn parse_at_least(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    min: usize,
) -> Option<usize> {
    parse::<usize>(lookup, key).filter(|v| *v >= min)
}
