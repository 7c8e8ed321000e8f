use std::collections::HashMap;

use ilm_games::maze::{self, Difficulty};
use ilm_games::word_grid::{place_words, Alphabet, DirectionSet, PlacerConfig, WordSearch};
use ilm_games::{Pos, UnitFn};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const DIFFICULTIES: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

fn assert_consistent(puzzle: &WordSearch, alphabet: &Alphabet) {
    let mut claimed: HashMap<Pos, char> = HashMap::new();
    for word in puzzle.placed() {
        let len = word.text.chars().count();
        assert_eq!(
            puzzle.scan(word.start, word.direction, len).as_deref(),
            Some(word.text.as_str())
        );
        for (pos, ch) in word.cells.iter().zip(word.text.chars()) {
            if let Some(prev) = claimed.insert(*pos, ch) {
                assert_eq!(prev, ch, "conflicting letters at {pos}");
            }
        }
    }
    for (pos, ch) in puzzle.grid().iter() {
        if !claimed.contains_key(&pos) {
            assert!(alphabet.contains(*ch), "filler {ch:?} at {pos} not in alphabet");
        }
    }
}

#[test]
fn small_seeded_maze_is_reproducible_and_solvable() {
    let a = maze::generate(5, 5, Difficulty::Medium, &mut StdRng::seed_from_u64(1)).unwrap();
    let b = maze::generate(5, 5, Difficulty::Medium, &mut StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.render_ascii(), b.render_ascii());
    assert!(!a.is_wall(Pos::new(0, 0)));
    assert!(!a.is_wall(Pos::new(4, 4)));
    assert!(a.path_exists());
}

#[test]
fn cat_and_dog_fit_a_six_by_six_grid() {
    let config = PlacerConfig::default();
    let mut rng = StdRng::seed_from_u64(6);
    let puzzle = place_words(&["CAT", "DOG"], 6, 6, &config, &mut rng).unwrap();
    assert_eq!(puzzle.placed().len(), 2);
    assert!(puzzle.unplaced().is_empty());
    assert_consistent(&puzzle, &config.alphabet);
    assert!(puzzle.grid().iter().all(|(_, ch)| ch.is_ascii_uppercase()));
}

#[test]
fn oversized_word_is_left_out() {
    let mut rng = StdRng::seed_from_u64(8);
    let puzzle = place_words(&["ELEPHANT"], 4, 4, &PlacerConfig::default(), &mut rng).unwrap();
    assert!(puzzle.placed().is_empty());
    assert_eq!(puzzle.unplaced(), &["ELEPHANT".to_string()]);
    assert_eq!(puzzle.grid().len(), 16);
}

#[test]
fn crossing_words_share_their_first_letter() {
    // CAT: Right from (0, 0). CAR: Down from (0, 0). Then filler.
    let mut draws = vec![0.0, 0.0, 0.0, 0.75, 0.0, 0.0].into_iter();
    let mut src = UnitFn(move || draws.next().unwrap_or(0.5));
    let config = PlacerConfig {
        directions: DirectionSet::Forward,
        ..PlacerConfig::default()
    };
    let puzzle = place_words(&["CAT", "CAR"], 3, 3, &config, &mut src).unwrap();
    assert_eq!(puzzle.placed().len(), 2);
    let cat = &puzzle.placed()[0];
    let car = &puzzle.placed()[1];
    assert_eq!(cat.cells[0], car.cells[0]);
    assert_eq!(puzzle.letter_at(Pos::new(0, 0)), Some('C'));
    assert_consistent(&puzzle, &config.alphabet);
}

#[test]
fn crowded_grids_never_conflict() {
    let words = ["SALAH", "ZAKAH", "SAWM", "HAJJ", "IMAN", "IHSAN", "SABR", "SHUKR", "DUA"];
    let config = PlacerConfig::default();
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let puzzle = place_words(&words, 7, 7, &config, &mut rng).unwrap();
        assert_eq!(puzzle.placed().len() + puzzle.unplaced().len(), words.len());
        assert_consistent(&puzzle, &config.alphabet);
    }
}

proptest! {
    #[test]
    fn maze_always_links_start_and_goal(
        rows in 2usize..40,
        cols in 2usize..40,
        seed in any::<u64>(),
        level in 0usize..3,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let maze = maze::generate(rows, cols, DIFFICULTIES[level], &mut rng).unwrap();
        prop_assert!(!maze.is_wall(maze.start()));
        prop_assert!(!maze.is_wall(maze.goal()));
        prop_assert!(maze.path_exists());
    }

    #[test]
    fn more_openings_never_close_cells(
        rows in 2usize..30,
        cols in 2usize..30,
        seed in any::<u64>(),
        low in 0.0f64..=1.0,
        high in 0.0f64..=1.0,
    ) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let sparse = maze::generate_with_fraction(rows, cols, low, &mut StdRng::seed_from_u64(seed)).unwrap();
        let dense = maze::generate_with_fraction(rows, cols, high, &mut StdRng::seed_from_u64(seed)).unwrap();
        prop_assert!(sparse.open_cells() <= dense.open_cells());
        for (pos, cell) in sparse.grid().iter() {
            if !cell.is_wall {
                prop_assert!(!dense.is_wall(pos));
            }
        }
    }

    #[test]
    fn placer_output_is_consistent(
        words in prop::collection::vec("[A-Z]{1,9}", 0..12),
        rows in 1usize..12,
        cols in 1usize..12,
        seed in any::<u64>(),
    ) {
        let config = PlacerConfig { max_attempts: 20, ..PlacerConfig::default() };
        let mut rng = StdRng::seed_from_u64(seed);
        let puzzle = place_words(&words, rows, cols, &config, &mut rng).unwrap();
        prop_assert_eq!(puzzle.placed().len() + puzzle.unplaced().len(), words.len());
        prop_assert_eq!(puzzle.grid().len(), rows * cols);
        assert_consistent(&puzzle, &config.alphabet);
    }
}
