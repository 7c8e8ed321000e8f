use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use log::debug;
use thiserror::Error;

use crate::grid::{Grid, Pos};
use crate::random::RandomSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    /// `(d_row, d_col)`
    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (-1, 0),
            Dir::Down => (1, 0),
            Dir::Left => (0, -1),
            Dir::Right => (0, 1),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Share of all cells punched open after carving.
    pub fn opening_fraction(self) -> f64 {
        match self {
            Difficulty::Easy => 0.20,
            Difficulty::Medium => 0.10,
            Difficulty::Hard => 0.05,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = MazeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(MazeError::UnknownDifficulty(s.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum MazeError {
    #[error("maze must be at least 2x2, got {rows}x{cols}")]
    TooSmall { rows: usize, cols: usize },
    #[error("opening fraction must be within [0, 1], got {0}")]
    InvalidFraction(f64),
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MazeCell {
    pub is_wall: bool,
    pub is_visited: bool,
}

impl MazeCell {
    const WALL: MazeCell = MazeCell {
        is_wall: true,
        is_visited: false,
    };
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    grid: Grid<MazeCell>,
}

/// Generates a maze whose extra openings follow `difficulty`.
pub fn generate(
    rows: usize,
    cols: usize,
    difficulty: Difficulty,
    rng: &mut impl RandomSource,
) -> Result<Maze, MazeError> {
    generate_with_fraction(rows, cols, difficulty.opening_fraction(), rng)
}

/// Carves a perfect maze from `(0, 0)`, links the goal corner into it and then
/// forces open `floor(fraction * rows * cols)` randomly drawn cells.
pub fn generate_with_fraction(
    rows: usize,
    cols: usize,
    fraction: f64,
    rng: &mut impl RandomSource,
) -> Result<Maze, MazeError> {
    if rows < 2 || cols < 2 {
        return Err(MazeError::TooSmall { rows, cols });
    }
    if !(0.0..=1.0).contains(&fraction) {
        return Err(MazeError::InvalidFraction(fraction));
    }

    let mut grid = Grid::filled(rows, cols, MazeCell::WALL);
    carve(&mut grid, rng);
    link_goal(&mut grid);
    let openings = (fraction * (rows * cols) as f64).floor() as usize;
    let opened = perforate(&mut grid, openings, rng);
    debug!(
        "generated {}x{} maze: {} of {} perforations opened a wall",
        rows, cols, opened, openings
    );
    Ok(Maze { grid })
}

struct Frame {
    pos: Pos,
    dirs: [Dir; 4],
    next: usize,
}

impl Frame {
    fn new(pos: Pos, rng: &mut impl RandomSource) -> Self {
        let mut dirs = Dir::ALL;
        rng.shuffle(&mut dirs);
        Self { pos, dirs, next: 0 }
    }
}

// Depth-first carve with 2-cell jumps. Each frame keeps its own shuffled
// direction list so draws happen in the same order as the recursive version.
fn carve(grid: &mut Grid<MazeCell>, rng: &mut impl RandomSource) {
    let start = Pos::new(0, 0);
    open_cell(grid, start, true);
    let mut stack = vec![Frame::new(start, rng)];

    while let Some(frame) = stack.last_mut() {
        if frame.next == frame.dirs.len() {
            stack.pop();
            continue;
        }
        let dir = frame.dirs[frame.next];
        frame.next += 1;
        let pos = frame.pos;

        let Some(dest) = pos.offset(dir.delta(), 2) else {
            continue;
        };
        match grid.get(dest) {
            Some(cell) if !cell.is_visited => {}
            _ => continue,
        }
        if let Some(between) = pos.offset(dir.delta(), 1) {
            open_cell(grid, between, true);
        }
        open_cell(grid, dest, true);
        stack.push(Frame::new(dest, rng));
    }
}

// The carve only lands on even coordinates. An odd last row or column leaves
// the goal off that lattice, so open an L from the nearest lattice cell.
fn link_goal(grid: &mut Grid<MazeCell>) {
    let goal = Pos::new(grid.rows() - 1, grid.cols() - 1);
    let anchor = Pos::new(goal.row & !1, goal.col & !1);
    for row in anchor.row..=goal.row {
        open_cell(grid, Pos::new(row, anchor.col), false);
    }
    for col in anchor.col..=goal.col {
        open_cell(grid, Pos::new(goal.row, col), false);
    }
}

fn perforate(grid: &mut Grid<MazeCell>, openings: usize, rng: &mut impl RandomSource) -> usize {
    let start = Pos::new(0, 0);
    let goal = Pos::new(grid.rows() - 1, grid.cols() - 1);
    let mut opened = 0;
    for _ in 0..openings {
        let pos = Pos::new(rng.pick_index(grid.rows()), rng.pick_index(grid.cols()));
        if pos == start || pos == goal {
            continue;
        }
        if let Some(cell) = grid.get_mut(pos) {
            if cell.is_wall {
                cell.is_wall = false;
                opened += 1;
            }
        }
    }
    opened
}

fn open_cell(grid: &mut Grid<MazeCell>, pos: Pos, visited: bool) {
    if let Some(cell) = grid.get_mut(pos) {
        cell.is_wall = false;
        cell.is_visited |= visited;
    }
}

impl Maze {
    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub fn start(&self) -> Pos {
        Pos::new(0, 0)
    }

    pub fn goal(&self) -> Pos {
        Pos::new(self.rows() - 1, self.cols() - 1)
    }

    pub fn cell(&self, pos: Pos) -> Option<MazeCell> {
        self.grid.get(pos).copied()
    }

    pub fn grid(&self) -> &Grid<MazeCell> {
        &self.grid
    }

    /// Anything outside the grid counts as wall.
    pub fn is_wall(&self, pos: Pos) -> bool {
        self.grid.get(pos).map_or(true, |cell| cell.is_wall)
    }

    pub fn open_cells(&self) -> usize {
        self.grid.iter().filter(|(_, cell)| !cell.is_wall).count()
    }

    /// Position reached by stepping once in `dir`, if that cell is open.
    pub fn step(&self, pos: Pos, dir: Dir) -> Option<Pos> {
        let next = pos.offset(dir.delta(), 1)?;
        if self.is_wall(next) {
            None
        } else {
            Some(next)
        }
    }

    pub fn neighbors(&self, pos: Pos) -> Vec<Pos> {
        Dir::ALL
            .iter()
            .filter_map(|dir| self.step(pos, *dir))
            .collect()
    }

    /// Breadth-first shortest route from start to goal, both ends included.
    pub fn shortest_path(&self) -> Option<Vec<Pos>> {
        let start = self.start();
        let goal = self.goal();
        let mut came_from: Grid<Option<Pos>> = Grid::filled(self.rows(), self.cols(), None);
        let mut seen = Grid::filled(self.rows(), self.cols(), false);
        let mut q = VecDeque::new();
        if let Some(flag) = seen.get_mut(start) {
            *flag = true;
        }
        q.push_back(start);

        while let Some(pos) = q.pop_front() {
            if pos == goal {
                let mut path = vec![goal];
                let mut cur = goal;
                while let Some(Some(prev)) = came_from.get(cur) {
                    path.push(*prev);
                    cur = *prev;
                }
                path.reverse();
                return Some(path);
            }
            for next in self.neighbors(pos) {
                if let Some(flag) = seen.get_mut(next) {
                    if !*flag {
                        *flag = true;
                        if let Some(slot) = came_from.get_mut(next) {
                            *slot = Some(pos);
                        }
                        q.push_back(next);
                    }
                }
            }
        }
        None
    }

    pub fn path_exists(&self) -> bool {
        self.shortest_path().is_some()
    }

    /// `#` walls, `S` start, `G` goal, spaces elsewhere; one line per row.
    pub fn render_ascii(&self) -> String {
        let mut out = String::with_capacity(self.rows() * (self.cols() + 1));
        for row in 0..self.rows() {
            for col in 0..self.cols() {
                let pos = Pos::new(row, col);
                let ch = if pos == self.start() {
                    'S'
                } else if pos == self.goal() {
                    'G'
                } else if self.is_wall(pos) {
                    '#'
                } else {
                    ' '
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }

    #[cfg(test)]
    pub(crate) fn from_ascii(rows: &[&str]) -> Maze {
        let cols = rows.first().map_or(0, |r| r.chars().count());
        let mut grid = Grid::filled(rows.len(), cols, MazeCell::WALL);
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                if ch != '#' {
                    open_cell(&mut grid, Pos::new(r, c), false);
                }
            }
        }
        Maze { grid }
    }
}
