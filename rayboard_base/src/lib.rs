//! # Base types for rayboard
//!
//! This is an auxiliary crate for `rayboard`, which contains the core value
//! types: squares, pieces, cells and bitboards.
//!
//! Normally you don't want to use this crate directly. Use `rayboard` instead.

pub mod bitboard;
pub mod geometry;
pub mod masks;
pub mod types;
