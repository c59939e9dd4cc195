//! Tsumego-Rust: Go problem sessions over SGF game trees.
//!
//! This crate loads tsumego (Go life-and-death problems) from SGF, lets a
//! player work through the recorded variations on a board that may be
//! rotated, mirrored and color-swapped, and labels problem files with
//! correct/incorrect hints.
//!
//! ## Modules
//!
//! - [`constants`] - Board limits, hint labels and timing defaults
//! - [`board`] - Go rules engine trait and the bundled board
//! - [`coord`] - SGF points, human coordinates and board ranges
//! - [`transform`] - Rotation, reflection and color inversion
//! - [`sgf`] - SGF parsing and serialization
//! - [`tree`] - Immutable game tree with stable node ids
//! - [`session`] - Cursor and navigation over a puzzle tree
//! - [`game`] - Board projection, player moves and opponent replies
//! - [`annotate`] - Offline correct/incorrect hint labelling
//! - [`library`] - Problem files and load bookkeeping
//! - [`config`] - User settings
//! - [`repl`] - Text console for playing a problem
//!
//! ## Example
//!
//! ```
//! use tsumego_rust::board::Sign;
//! use tsumego_rust::config::Settings;
//! use tsumego_rust::coord::Vertex;
//! use tsumego_rust::game::Game;
//! use tsumego_rust::tree::GameTree;
//!
//! let tree = GameTree::parse("(;SZ[9]AB[ba]AW[aa](;B[ab]C[Correct])(;B[cc]))").unwrap();
//! let mut game = Game::new(tree, &Settings::default());
//!
//! // Capture the corner stone
//! assert!(game.place_stone(Vertex::new(0, 1)));
//! assert_eq!(game.original_board().captures(Sign::Black), 1);
//! assert!(game.is_solved());
//! ```

pub mod annotate;
pub mod board;
pub mod config;
pub mod constants;
pub mod coord;
pub mod error;
pub mod game;
pub mod library;
pub mod repl;
pub mod session;
pub mod sgf;
pub mod transform;
pub mod tree;
