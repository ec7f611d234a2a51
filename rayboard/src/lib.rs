//! # rayboard
//!
//! A chess position engine built on little-endian bitboards and explicit ray
//! geometry tables. It provides board representation, FEN parsing, legal move
//! generation with exact undo, attack and pin probes, and perft.
//!
//! ```
//! use rayboard::{Board, movegen};
//!
//! let b = Board::initial();
//! assert_eq!(movegen::legal::gen_all(&b).len(), 20);
//! ```

pub mod board;
pub mod castling;
pub mod generic;
pub mod movegen;
pub mod moves;
pub mod pawns;
pub mod rays;
pub mod safety;

pub use rayboard_base::{bitboard, geometry, masks, types};

pub use bitboard::Bitboard;
pub use board::{Board, RawBoard, Status};
pub use movegen::MoveList;
pub use moves::{Move, MoveKind, PromotePiece, RawUndo};
pub use rays::{Ray, Rays};
pub use types::{CastlingRights, CastlingSide, Cell, Color, File, Piece, Rank, Square};
