use std::str::FromStr;

use log::debug;
use thiserror::Error;

use crate::grid::{Grid, Pos};
use crate::random::RandomSource;

pub const DEFAULT_MAX_ATTEMPTS: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    Left,
    Down,
    Up,
    DownRight,
    UpLeft,
    DownLeft,
    UpRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
        Direction::DownRight,
        Direction::UpLeft,
        Direction::DownLeft,
        Direction::UpRight,
    ];

    /// `(d_row, d_col)`
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Right => (0, 1),
            Direction::Left => (0, -1),
            Direction::Down => (1, 0),
            Direction::Up => (-1, 0),
            Direction::DownRight => (1, 1),
            Direction::UpLeft => (-1, -1),
            Direction::DownLeft => (1, -1),
            Direction::UpRight => (-1, 1),
        }
    }

    /// Direction of the straight line from `from` to `to`, if there is one.
    pub fn between(from: Pos, to: Pos) -> Option<Direction> {
        let dr = to.row as isize - from.row as isize;
        let dc = to.col as isize - from.col as isize;
        if (dr, dc) == (0, 0) || (dr != 0 && dc != 0 && dr.abs() != dc.abs()) {
            return None;
        }
        let unit = (dr.signum(), dc.signum());
        Direction::ALL.into_iter().find(|d| d.delta() == unit)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DirectionSet {
    /// Left-to-right and top-to-bottom only.
    Forward,
    Orthogonal,
    #[default]
    All,
}

impl DirectionSet {
    pub fn directions(self) -> &'static [Direction] {
        match self {
            DirectionSet::Forward => &[Direction::Right, Direction::Down],
            DirectionSet::Orthogonal => &[
                Direction::Right,
                Direction::Left,
                Direction::Down,
                Direction::Up,
            ],
            DirectionSet::All => &Direction::ALL,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alphabet(Vec<char>);

impl Alphabet {
    pub fn new(letters: impl IntoIterator<Item = char>) -> Self {
        Self(letters.into_iter().collect())
    }

    pub fn latin() -> Self {
        Self::new('A'..='Z')
    }

    /// The 28 base letters of the Arabic alphabet.
    pub fn arabic() -> Self {
        Self::new("ابتثجحخدذرزسشصضطظعغفقكلمنهوي".chars())
    }

    pub fn letters(&self) -> &[char] {
        &self.0
    }

    pub fn contains(&self, ch: char) -> bool {
        self.0.contains(&ch)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::latin()
    }
}

impl FromStr for Alphabet {
    type Err = PlacerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latin" => Ok(Alphabet::latin()),
            "arabic" => Ok(Alphabet::arabic()),
            _ => Err(PlacerError::UnknownAlphabet(s.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacerError {
    #[error("word grid needs positive dimensions, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("filler alphabet is empty")]
    EmptyAlphabet,
    #[error("no placement directions configured")]
    NoDirections,
    #[error("unknown alphabet: {0}")]
    UnknownAlphabet(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacerConfig {
    /// Tries per word before it is given up on.
    pub max_attempts: usize,
    pub directions: DirectionSet,
    pub alphabet: Alphabet,
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            directions: DirectionSet::default(),
            alphabet: Alphabet::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedWord {
    pub text: String,
    pub start: Pos,
    pub direction: Direction,
    pub cells: Vec<Pos>,
}

impl PlacedWord {
    pub fn end(&self) -> Pos {
        self.cells.last().copied().unwrap_or(self.start)
    }

    /// True when `a` and `b` are this word's endpoints, in either order.
    pub fn spans(&self, a: Pos, b: Pos) -> bool {
        let (first, last) = (self.start, self.end());
        (first == a && last == b) || (first == b && last == a)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordSearch {
    grid: Grid<char>,
    placed: Vec<PlacedWord>,
    unplaced: Vec<String>,
}

/// Uppercases and drops whitespace so "Al Fatiha" and "ALFATIHA" place alike.
pub fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Pre-shuffle helper for callers that want a random placement order.
pub fn shuffle_words<S: Clone>(words: &[S], rng: &mut impl RandomSource) -> Vec<S> {
    let mut out = words.to_vec();
    rng.shuffle(&mut out);
    out
}

/// Greedily places `words` in order, then fills the gaps with alphabet noise.
///
/// A word that finds no fitting line within `max_attempts` tries lands in
/// [`WordSearch::unplaced`]; earlier placements are never revisited.
pub fn place_words<S: AsRef<str>>(
    words: &[S],
    rows: usize,
    cols: usize,
    config: &PlacerConfig,
    rng: &mut impl RandomSource,
) -> Result<WordSearch, PlacerError> {
    if rows == 0 || cols == 0 {
        return Err(PlacerError::EmptyGrid { rows, cols });
    }
    let letters = config.alphabet.letters();
    if letters.is_empty() {
        return Err(PlacerError::EmptyAlphabet);
    }
    let directions = config.directions.directions();
    if directions.is_empty() {
        return Err(PlacerError::NoDirections);
    }

    let mut slots: Grid<Option<char>> = Grid::filled(rows, cols, None);
    let mut placed = Vec::new();
    let mut unplaced = Vec::new();

    for word in words {
        let text = normalize_word(word.as_ref());
        match try_place(&mut slots, &text, directions, config.max_attempts, rng) {
            Some((start, direction, cells)) => placed.push(PlacedWord {
                text,
                start,
                direction,
                cells,
            }),
            None => {
                debug!(
                    "could not place {:?} in {}x{} after {} attempts",
                    text, rows, cols, config.max_attempts
                );
                unplaced.push(text);
            }
        }
    }

    let grid = slots.map(|slot| slot.unwrap_or_else(|| letters[rng.pick_index(letters.len())]));
    debug!(
        "word grid {}x{}: placed {}, skipped {}",
        rows,
        cols,
        placed.len(),
        unplaced.len()
    );
    Ok(WordSearch {
        grid,
        placed,
        unplaced,
    })
}

fn try_place(
    slots: &mut Grid<Option<char>>,
    text: &str,
    directions: &[Direction],
    max_attempts: usize,
    rng: &mut impl RandomSource,
) -> Option<(Pos, Direction, Vec<Pos>)> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return None;
    }
    for _ in 0..max_attempts {
        let direction = directions[rng.pick_index(directions.len())];
        let start = Pos::new(rng.pick_index(slots.rows()), rng.pick_index(slots.cols()));
        if let Some(cells) = fits(slots, &chars, start, direction) {
            for (pos, ch) in cells.iter().zip(&chars) {
                if let Some(slot) = slots.get_mut(*pos) {
                    *slot = Some(*ch);
                }
            }
            return Some((start, direction, cells));
        }
    }
    None
}

fn fits(
    slots: &Grid<Option<char>>,
    chars: &[char],
    start: Pos,
    direction: Direction,
) -> Option<Vec<Pos>> {
    let mut cells = Vec::with_capacity(chars.len());
    for (i, ch) in chars.iter().enumerate() {
        let pos = start.offset(direction.delta(), i)?;
        match slots.get(pos)? {
            Some(existing) if existing != ch => return None,
            _ => cells.push(pos),
        }
    }
    Some(cells)
}

impl WordSearch {
    pub fn grid(&self) -> &Grid<char> {
        &self.grid
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub fn placed(&self) -> &[PlacedWord] {
        &self.placed
    }

    pub fn unplaced(&self) -> &[String] {
        &self.unplaced
    }

    pub fn letter_at(&self, pos: Pos) -> Option<char> {
        self.grid.get(pos).copied()
    }

    /// Reads `len` letters from `start` along `direction`. `None` if the line
    /// runs off the grid.
    pub fn scan(&self, start: Pos, direction: Direction, len: usize) -> Option<String> {
        (0..len)
            .map(|i| {
                start
                    .offset(direction.delta(), i)
                    .and_then(|pos| self.letter_at(pos))
            })
            .collect()
    }

    /// The placed word whose endpoints are `start` and `end`, read either way.
    pub fn match_selection(&self, start: Pos, end: Pos) -> Option<&PlacedWord> {
        self.placed.iter().find(|word| word.spans(start, end))
    }

    pub fn render_rows(&self) -> Vec<String> {
        (0..self.rows())
            .map(|row| self.grid.row(row).iter().collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::UnitFn;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn normalize_strips_spaces_and_uppercases() {
        assert_eq!(normalize_word("al fatiha"), "ALFATIHA");
        assert_eq!(normalize_word("صبر"), "صبر");
    }

    #[test]
    fn direction_between_straight_lines_only() {
        let a = Pos::new(2, 2);
        assert_eq!(Direction::between(a, Pos::new(2, 5)), Some(Direction::Right));
        assert_eq!(Direction::between(a, Pos::new(0, 0)), Some(Direction::UpLeft));
        assert_eq!(Direction::between(a, Pos::new(4, 0)), Some(Direction::DownLeft));
        assert_eq!(Direction::between(a, Pos::new(3, 5)), None);
        assert_eq!(Direction::between(a, a), None);
    }

    #[test]
    fn forward_set_only_places_right_or_down() {
        let config = PlacerConfig {
            directions: DirectionSet::Forward,
            ..PlacerConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let puzzle = place_words(&["SALAH", "ZAKAH", "SAWM"], 8, 8, &config, &mut rng).unwrap();
        for word in puzzle.placed() {
            assert!(matches!(word.direction, Direction::Right | Direction::Down));
        }
    }

    #[test]
    fn constant_source_places_word_at_origin() {
        // Every draw is 0: first direction, start (0, 0).
        let mut src = UnitFn(|| 0.0);
        let config = PlacerConfig {
            directions: DirectionSet::Forward,
            ..PlacerConfig::default()
        };
        let puzzle = place_words(&["NUR"], 3, 5, &config, &mut src).unwrap();
        assert_eq!(puzzle.placed()[0].start, Pos::new(0, 0));
        assert_eq!(puzzle.render_rows()[0], "NURAA");
        assert_eq!(puzzle.render_rows()[2], "AAAAA");
    }

    #[test]
    fn second_word_blocked_by_first_is_skipped() {
        // 1x3 grid holding "ABC" leaves no room for "XYZ".
        let mut src = UnitFn(|| 0.0);
        let config = PlacerConfig {
            directions: DirectionSet::Forward,
            max_attempts: 5,
            ..PlacerConfig::default()
        };
        let puzzle = place_words(&["ABC", "XYZ"], 1, 3, &config, &mut src).unwrap();
        assert_eq!(puzzle.placed().len(), 1);
        assert_eq!(puzzle.unplaced(), &["XYZ".to_string()]);
    }

    #[test]
    fn empty_word_is_reported_unplaced() {
        let mut rng = StdRng::seed_from_u64(0);
        let puzzle = place_words(&["  "], 3, 3, &PlacerConfig::default(), &mut rng).unwrap();
        assert!(puzzle.placed().is_empty());
        assert_eq!(puzzle.unplaced().len(), 1);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            place_words(&["A"], 0, 4, &PlacerConfig::default(), &mut rng),
            Err(PlacerError::EmptyGrid { rows: 0, cols: 4 })
        );
        let config = PlacerConfig {
            alphabet: Alphabet::new(std::iter::empty::<char>()),
            ..PlacerConfig::default()
        };
        assert_eq!(
            place_words(&["A"], 2, 2, &config, &mut rng),
            Err(PlacerError::EmptyAlphabet)
        );
    }

    #[test]
    fn arabic_filler_uses_arabic_letters() {
        let config = PlacerConfig {
            alphabet: Alphabet::arabic(),
            ..PlacerConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let puzzle = place_words(&["رحمة"], 6, 6, &config, &mut rng).unwrap();
        assert_eq!(config.alphabet.letters().len(), 28);
        let placed: Vec<Pos> = puzzle.placed().iter().flat_map(|w| w.cells.clone()).collect();
        for (pos, ch) in puzzle.grid().iter() {
            if !placed.contains(&pos) {
                assert!(config.alphabet.contains(*ch));
            }
        }
    }

    #[test]
    fn selection_matches_in_both_orientations() {
        let mut rng = StdRng::seed_from_u64(2);
        let puzzle = place_words(&["IMAN"], 6, 6, &PlacerConfig::default(), &mut rng).unwrap();
        let word = &puzzle.placed()[0];
        assert_eq!(puzzle.match_selection(word.start, word.end()), Some(word));
        assert_eq!(puzzle.match_selection(word.end(), word.start), Some(word));
        assert_eq!(puzzle.match_selection(word.start, word.start), None);
    }
}
