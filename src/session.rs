use std::time::{Duration, Instant};

use log::debug;

use crate::grid::Pos;
use crate::maze::{Dir, Maze};
use crate::word_grid::WordSearch;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Playing,
    Complete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect,
    /// The session was not playing when the interaction arrived.
    Ignored,
}

/// Lifecycle shared by every puzzle: answers loop inside `Playing` until the
/// puzzle is solved or the optional time limit runs out.
#[derive(Clone, Debug)]
pub struct Session {
    phase: Phase,
    time_limit: Option<Duration>,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    correct: u32,
    incorrect: u32,
    last: Option<Feedback>,
    timed_out: bool,
}

impl Session {
    pub fn new(time_limit: Option<Duration>) -> Self {
        Self {
            phase: Phase::NotStarted,
            time_limit,
            started_at: None,
            finished_at: None,
            correct: 0,
            incorrect: 0,
            last: None,
            timed_out: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn start(&mut self, now: Instant) {
        if self.phase == Phase::NotStarted {
            self.phase = Phase::Playing;
            self.started_at = Some(now);
        }
    }

    /// Applies the time limit. Returns the phase after the check.
    pub fn tick(&mut self, now: Instant) -> Phase {
        if self.phase != Phase::Playing {
            return self.phase;
        }
        if let (Some(limit), Some(started)) = (self.time_limit, self.started_at) {
            if now.saturating_duration_since(started) >= limit {
                self.phase = Phase::Complete;
                self.finished_at = Some(started + limit);
                self.timed_out = true;
                debug!("session timed out after {:?}", limit);
            }
        }
        self.phase
    }

    pub fn record(&mut self, correct: bool, now: Instant) -> Feedback {
        if self.tick(now) != Phase::Playing {
            return Feedback::Ignored;
        }
        let feedback = if correct {
            self.correct += 1;
            Feedback::Correct
        } else {
            self.incorrect += 1;
            Feedback::Incorrect
        };
        self.last = Some(feedback);
        feedback
    }

    pub fn complete(&mut self, now: Instant) {
        if self.phase == Phase::Playing {
            self.phase = Phase::Complete;
            self.finished_at = Some(now);
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(started) => self.finished_at.unwrap_or(now).saturating_duration_since(started),
            None => Duration::ZERO,
        }
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.time_limit
            .map(|limit| limit.saturating_sub(self.elapsed(now)))
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    pub fn last_feedback(&self) -> Option<Feedback> {
        self.last
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }
}

/// A player walking a generated maze from start to goal.
#[derive(Clone, Debug)]
pub struct MazeRun {
    maze: Maze,
    player: Pos,
    moves: u32,
    session: Session,
}

impl MazeRun {
    pub fn new(maze: Maze, time_limit: Option<Duration>) -> Self {
        let player = maze.start();
        Self {
            maze,
            player,
            moves: 0,
            session: Session::new(time_limit),
        }
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn player(&self) -> Pos {
        self.player
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn tick(&mut self, now: Instant) -> Phase {
        self.session.tick(now)
    }

    /// First move starts the clock. Blocked moves count as incorrect.
    pub fn step(&mut self, dir: Dir, now: Instant) -> Feedback {
        self.session.start(now);
        let next = self.maze.step(self.player, dir);
        let feedback = self.session.record(next.is_some(), now);
        if feedback == Feedback::Correct {
            if let Some(next) = next {
                self.player = next;
                self.moves += 1;
            }
            if self.player == self.maze.goal() {
                self.session.complete(now);
            }
        }
        feedback
    }
}

/// Finding placed words by selecting their two end cells.
#[derive(Clone, Debug)]
pub struct WordHunt {
    puzzle: WordSearch,
    found: Vec<bool>,
    session: Session,
}

impl WordHunt {
    pub fn new(puzzle: WordSearch, time_limit: Option<Duration>) -> Self {
        let found = vec![false; puzzle.placed().len()];
        Self {
            puzzle,
            found,
            session: Session::new(time_limit),
        }
    }

    pub fn puzzle(&self) -> &WordSearch {
        &self.puzzle
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn start(&mut self, now: Instant) {
        self.session.start(now);
        if self.found.iter().all(|f| *f) {
            self.session.complete(now);
        }
    }

    pub fn tick(&mut self, now: Instant) -> Phase {
        self.session.tick(now)
    }

    /// Whether the placed word at `idx` in [`WordSearch::placed`] was found.
    pub fn is_found(&self, idx: usize) -> bool {
        self.found.get(idx).copied().unwrap_or(false)
    }

    pub fn found_count(&self) -> usize {
        self.found.iter().filter(|f| **f).count()
    }

    pub fn select(&mut self, start: Pos, end: Pos, now: Instant) -> Feedback {
        self.start(now);
        // Copies of a word laid over the same cells are found one at a time.
        let hit = self
            .puzzle
            .placed()
            .iter()
            .enumerate()
            .position(|(idx, word)| !self.found[idx] && word.spans(start, end));
        let feedback = self.session.record(hit.is_some(), now);
        if feedback == Feedback::Correct {
            if let Some(idx) = hit {
                self.found[idx] = true;
            }
            if self.found.iter().all(|f| *f) {
                self.session.complete(now);
            }
        }
        feedback
    }
}
