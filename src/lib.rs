pub mod config;
pub mod grid;
pub mod maze;
pub mod random;
pub mod session;
pub mod store;
pub mod word_grid;

use thiserror::Error;

pub use grid::{Grid, Pos};
pub use maze::{Difficulty, Maze, MazeError};
pub use random::{RandomSource, UnitFn};
pub use word_grid::{PlacedWord, PlacerConfig, PlacerError, WordSearch};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Maze(#[from] maze::MazeError),
    #[error(transparent)]
    Placer(#[from] word_grid::PlacerError),
    #[error(transparent)]
    Store(#[from] store::StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;
