//! Board and related things

use crate::bitboard::Bitboard;
use crate::movegen::{self, MoveList};
use crate::moves::{self, Move, RawUndo};
use crate::rays::Rays;
use crate::types::{
    self, CastlingRights, CastlingSide, Cell, Color, File, Piece, Rank, Square,
};
use crate::{geometry, safety};

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

/// Board validation error
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ValidateError {
    /// The en passant target square is on an invalid rank
    #[error("invalid en passant target {0}")]
    InvalidEnpassant(Square),
    /// More than 16 pieces of one color
    #[error("too many pieces of color {0:?}")]
    TooManyPieces(Color),
    /// One of the sides doesn't have a king
    #[error("no king of color {0:?}")]
    NoKing(Color),
    /// One of the sides has more than one king
    #[error("more than one king of color {0:?}")]
    TooManyKings(Color),
    /// There is a pawn on the 1st or the 8th rank
    #[error("invalid pawn position {0}")]
    InvalidPawn(Square),
    /// The king of the side which just moved is under attack
    #[error("opponent's king is attacked")]
    OpponentKingAttacked,
}

/// Error parsing the piece placement part of FEN
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum CellsParseError {
    /// Rank is too large
    #[error("too many items in rank {0}")]
    RankOverflow(Rank),
    /// Rank is too small
    #[error("not enough items in rank {0}")]
    RankUnderflow(Rank),
    /// Too many ranks
    #[error("too many ranks")]
    Overflow,
    /// Not enough ranks
    #[error("not enough ranks")]
    Underflow,
    /// Unexpected character
    #[error("unexpected char {0:?}")]
    UnexpectedChar(char),
}

/// Error parsing [`RawBoard`] from FEN
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum RawFenParseError {
    /// FEN contains non-ASCII characters
    #[error("non-ASCII data in FEN")]
    NonAscii,
    /// FEN doesn't have board part
    #[error("board not specified")]
    NoBoard,
    /// Error parsing board from FEN
    #[error("bad board: {0}")]
    Board(#[from] CellsParseError),
    /// FEN doesn't have move side part
    #[error("no move side")]
    NoMoveSide,
    /// Error parsing move side from FEN
    #[error("bad move side: {0}")]
    MoveSide(#[from] types::ColorParseError),
    /// FEN doesn't have castling rights part
    #[error("no castling rights")]
    NoCastling,
    /// Error parsing castling rights from FEN
    #[error("bad castling rights: {0}")]
    Castling(#[from] types::CastlingRightsParseError),
    /// FEN doesn't have en passant part
    #[error("no enpassant")]
    NoEnpassant,
    /// Error parsing en passant square from FEN
    #[error("bad enpassant: {0}")]
    Enpassant(#[from] types::SquareParseError),
    /// En passant target rank is invalid
    #[error("invalid enpassant rank {0}")]
    InvalidEnpassantRank(Rank),
    /// Error parsing halfmove clock
    #[error("bad halfmove clock: {0}")]
    HalfmoveClock(ParseIntError),
    /// Error parsing move number
    #[error("bad move number: {0}")]
    MoveNumber(ParseIntError),
    /// FEN contains extra data
    #[error("extra data in FEN")]
    ExtraData,
}

/// Error parsing [`Board`] from FEN
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum FenParseError {
    /// Board cannot be parsed
    #[error("cannot parse fen: {0}")]
    Fen(#[from] RawFenParseError),
    /// Board was parsed, but it's invalid
    #[error("invalid position: {0}")]
    Valid(#[from] ValidateError),
}

/// Game status from the point of view of the side to move
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Status {
    /// The side to move has at least one legal move
    Ongoing,
    /// The side to move is checkmated
    Checkmate {
        /// The side which delivered the mate
        winner: Color,
    },
    /// The side to move has no legal moves and is not in check
    Stalemate,
}

/// Raw chess board
///
/// Raw board contains all the necessary information about the position, but, unlike
/// [`Board`], it is not validated and may be in an inconsistent state. It can be used
/// to build or edit a position programmatically; convert it to [`Board`] afterwards
/// via [`Board::try_from()`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RawBoard {
    /// Contents of the board, indexed by square index
    pub cells: [Cell; 64],
    /// Side to move
    pub side: Color,
    /// Castling rights
    pub castling: CastlingRights,
    /// En passant target square
    ///
    /// `None` if no en passant capture is allowed. Otherwise, it holds the square a
    /// capturing pawn would land on, exactly as written in FEN. The pawn to be captured
    /// stands one step behind the target, see [`RawBoard::ep_victim()`].
    pub ep_target: Option<Square>,
    /// Number of half-moves since the last capture or pawn move
    pub halfmove_clock: u16,
    /// Move number, incremented after each move by Black
    pub move_number: u16,
}

impl RawBoard {
    /// Returns an empty `RawBoard`
    #[inline]
    pub const fn empty() -> RawBoard {
        RawBoard {
            cells: [Cell::EMPTY; 64],
            side: Color::White,
            castling: CastlingRights::EMPTY,
            ep_target: None,
            halfmove_clock: 0,
            move_number: 1,
        }
    }

    /// Returns a board with the initial position
    pub fn initial() -> RawBoard {
        let mut res = RawBoard {
            cells: [Cell::EMPTY; 64],
            side: Color::White,
            castling: CastlingRights::FULL,
            ep_target: None,
            halfmove_clock: 0,
            move_number: 1,
        };
        for file in File::iter() {
            res.put2(file, Rank::R2, Cell::from_parts(Color::White, Piece::Pawn));
            res.put2(file, Rank::R7, Cell::from_parts(Color::Black, Piece::Pawn));
        }
        for (color, rank) in [(Color::White, Rank::R1), (Color::Black, Rank::R8)] {
            res.put2(File::A, rank, Cell::from_parts(color, Piece::Rook));
            res.put2(File::B, rank, Cell::from_parts(color, Piece::Knight));
            res.put2(File::C, rank, Cell::from_parts(color, Piece::Bishop));
            res.put2(File::D, rank, Cell::from_parts(color, Piece::Queen));
            res.put2(File::E, rank, Cell::from_parts(color, Piece::King));
            res.put2(File::F, rank, Cell::from_parts(color, Piece::Bishop));
            res.put2(File::G, rank, Cell::from_parts(color, Piece::Knight));
            res.put2(File::H, rank, Cell::from_parts(color, Piece::Rook));
        }
        res
    }

    /// Parses a board from FEN
    #[inline]
    pub fn from_fen(fen: &str) -> Result<RawBoard, RawFenParseError> {
        RawBoard::from_str(fen)
    }

    /// Returns the contents of the square `sq`
    #[inline]
    pub fn get(&self, sq: Square) -> Cell {
        unsafe { *self.cells.get_unchecked(sq.index()) }
    }

    /// Returns the contents of the square with file `file` and rank `rank`
    #[inline]
    pub fn get2(&self, file: File, rank: Rank) -> Cell {
        self.get(Square::from_parts(file, rank))
    }

    /// Puts `cell` onto the square `sq`
    #[inline]
    pub fn put(&mut self, sq: Square, cell: Cell) {
        unsafe {
            *self.cells.get_unchecked_mut(sq.index()) = cell;
        }
    }

    /// Puts `cell` onto the square with file `file` and rank `rank`
    #[inline]
    pub fn put2(&mut self, file: File, rank: Rank, cell: Cell) {
        self.put(Square::from_parts(file, rank), cell);
    }

    /// Returns the square of the pawn which can be captured en passant, or `None`
    /// if no en passant capture is allowed
    #[inline]
    pub fn ep_victim(&self) -> Option<Square> {
        let target = self.ep_target?;
        Some(target.add(-geometry::pawn_forward_delta(self.side)))
    }

    /// Wraps the board to allow pretty-printing
    ///
    /// The resulting wrapper implements [`fmt::Display`], so it can be used with
    /// `write!()`, `println!()`, or `ToString::to_string`.
    ///
    /// # Example
    ///
    /// ```
    /// # use rayboard::RawBoard;
    /// #
    /// let r = RawBoard::initial();
    ///
    /// let res = r#"
    /// 8|rnbqkbnr
    /// 7|pppppppp
    /// 6|........
    /// 5|........
    /// 4|........
    /// 3|........
    /// 2|PPPPPPPP
    /// 1|RNBQKBNR
    /// -+--------
    /// W|abcdefgh
    /// "#;
    /// assert_eq!(r.pretty().to_string().trim(), res.trim());
    /// ```
    #[inline]
    pub fn pretty(&self) -> Pretty<'_> {
        Pretty { raw: self }
    }

    /// Converts the board into a FEN string
    #[inline]
    pub fn as_fen(&self) -> String {
        self.to_string()
    }
}

impl Default for RawBoard {
    #[inline]
    fn default() -> RawBoard {
        RawBoard::empty()
    }
}

/// Board that contains a valid position
///
/// This board always contains a valid chess position and is the entry point for every
/// chess operation: move generation, making and validating moves, verifying for check
/// and checkmate.
///
/// It holds a [`RawBoard`] alongside auxiliary structures (piece bitboards, king
/// positions and shared [`Rays`] geometry) which make these operations fast.
///
/// # Safety
///
/// The board must always stay valid (i.e. `Board::from_raw(b.raw().clone(), ...)` must
/// succeed and produce an equal board). The only allowed exception is attack on the
/// opponent's king after making a semi-legal move via the unchecked API. In this case,
/// you must call [`Board::is_opponent_king_attacked()`] and undo the offending move
/// before doing anything else, or just drop the board.
#[derive(Clone)]
pub struct Board {
    pub(crate) r: RawBoard,
    pub(crate) white: Bitboard,
    pub(crate) black: Bitboard,
    pub(crate) all: Bitboard,
    pub(crate) pieces: [Bitboard; Cell::MAX_INDEX],
    pub(crate) kings: [Square; 2],
    pub(crate) rays: Arc<Rays>,
}

impl Board {
    /// Returns a board with the initial position
    pub fn initial() -> Board {
        match Board::from_raw(RawBoard::initial(), Rays::standard()) {
            Ok(b) => b,
            Err(_) => unreachable!(),
        }
    }

    /// Parses a board from FEN, using the shared [`Rays::standard()`] geometry
    pub fn from_fen(fen: &str) -> Result<Board, FenParseError> {
        Board::from_str(fen)
    }

    /// Parses a board from FEN with an explicit geometry value
    pub fn from_fen_with(fen: &str, rays: Arc<Rays>) -> Result<Board, FenParseError> {
        Ok(Board::from_raw(RawBoard::from_str(fen)?, rays)?)
    }

    /// Validates `raw` and builds a board over the given geometry
    ///
    /// Unfixable problems are reported as errors. Two kinds of issues are repaired
    /// silently instead: castling rights without the king or the corresponding rook on
    /// their home squares are dropped, and an en passant target without a capturable
    /// pawn behind it is reset to `None`.
    pub fn from_raw(mut raw: RawBoard, rays: Arc<Rays>) -> Result<Board, ValidateError> {
        // Check enpassant
        if let Some(target) = raw.ep_target {
            if target.rank() != geometry::enpassant_dst_rank(raw.side) {
                return Err(ValidateError::InvalidEnpassant(target));
            }

            // Reset enpassant if there is no pawn to capture or the target square is occupied
            let victim = target.add(-geometry::pawn_forward_delta(raw.side));
            if raw.get(victim) != Cell::from_parts(raw.side.inv(), Piece::Pawn)
                || raw.get(target) != Cell::EMPTY
            {
                raw.ep_target = None;
            }
        }

        // Reset bad castling flags
        for color in [Color::White, Color::Black] {
            let rank = geometry::castling_rank(color);
            if raw.get2(File::E, rank) != Cell::from_parts(color, Piece::King) {
                raw.castling.unset(color, CastlingSide::Queen);
                raw.castling.unset(color, CastlingSide::King);
            }
            if raw.get2(File::A, rank) != Cell::from_parts(color, Piece::Rook) {
                raw.castling.unset(color, CastlingSide::Queen);
            }
            if raw.get2(File::H, rank) != Cell::from_parts(color, Piece::Rook) {
                raw.castling.unset(color, CastlingSide::King);
            }
        }

        // Calculate bitboards
        let mut white = Bitboard::EMPTY;
        let mut black = Bitboard::EMPTY;
        let mut pieces = [Bitboard::EMPTY; Cell::MAX_INDEX];
        for (idx, cell) in raw.cells.iter().enumerate() {
            let sq = Square::from_index(idx);
            if let Some(color) = cell.color() {
                match color {
                    Color::White => white.set(sq),
                    Color::Black => black.set(sq),
                };
                pieces[cell.index()].set(sq);
            }
        }

        // Check TooManyPieces, NoKing, TooManyKings
        if white.popcount() > 16 {
            return Err(ValidateError::TooManyPieces(Color::White));
        }
        if black.popcount() > 16 {
            return Err(ValidateError::TooManyPieces(Color::Black));
        }
        let mut kings = [Square::from_index(0); 2];
        for color in [Color::White, Color::Black] {
            let king = pieces[Cell::from_parts(color, Piece::King).index()];
            if king.popcount() > 1 {
                return Err(ValidateError::TooManyKings(color));
            }
            kings[color.index()] = match king.first() {
                Some(sq) => sq,
                None => return Err(ValidateError::NoKing(color)),
            };
        }

        // Check InvalidPawn
        let pawns = pieces[Cell::from_parts(Color::White, Piece::Pawn).index()]
            | pieces[Cell::from_parts(Color::Black, Piece::Pawn).index()];
        const BAD_PAWN_POSES: Bitboard = Bitboard::from_raw(0xff000000000000ff);
        let bad_pawns = pawns & BAD_PAWN_POSES;
        if let Some(sq) = bad_pawns.first() {
            return Err(ValidateError::InvalidPawn(sq));
        }

        // Check OpponentKingAttacked
        let res = Board {
            r: raw,
            white,
            black,
            all: white | black,
            pieces,
            kings,
            rays,
        };
        if res.is_opponent_king_attacked() {
            return Err(ValidateError::OpponentKingAttacked);
        }

        Ok(res)
    }

    /// Returns a view over the raw board
    #[inline]
    pub fn raw(&self) -> &RawBoard {
        &self.r
    }

    /// Returns the geometry tables this board was built over
    #[inline]
    pub fn rays(&self) -> &Rays {
        &self.rays
    }

    /// Returns the contents of the square `sq`
    #[inline]
    pub fn get(&self, sq: Square) -> Cell {
        self.r.get(sq)
    }

    /// Returns the contents of the square with file `file` and rank `rank`
    #[inline]
    pub fn get2(&self, file: File, rank: Rank) -> Cell {
        self.r.get2(file, rank)
    }

    /// Returns the color and kind of the piece on `sq`, or `None` if the square is empty
    #[inline]
    pub fn occupant_at(&self, sq: Square) -> Option<(Color, Piece)> {
        let cell = self.get(sq);
        Some((cell.color()?, cell.piece()?))
    }

    /// Returns side to move
    #[inline]
    pub fn side(&self) -> Color {
        self.r.side
    }

    /// Returns the bitboard over all the pieces with color `c`
    #[inline]
    pub fn color(&self, c: Color) -> Bitboard {
        if c == Color::White {
            self.white
        } else {
            self.black
        }
    }

    #[inline]
    pub(crate) fn color_mut(&mut self, c: Color) -> &mut Bitboard {
        if c == Color::White {
            &mut self.white
        } else {
            &mut self.black
        }
    }

    /// Returns the bitboard over all the occupied squares
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.all
    }

    /// Returns the bitboard over all the cells equal to `c`
    ///
    /// **Note**: when `c` is an empty cell, the function just returns an empty bitboard,
    /// not the bitboard over all the empty squares.
    #[inline]
    pub fn piece(&self, c: Cell) -> Bitboard {
        unsafe { *self.pieces.get_unchecked(c.index()) }
    }

    /// Returns the bitboard over all the pieces of color `c` and kind `p`
    #[inline]
    pub fn piece2(&self, c: Color, p: Piece) -> Bitboard {
        self.piece(Cell::from_parts(c, p))
    }

    #[inline]
    pub(crate) fn piece_diag(&self, c: Color) -> Bitboard {
        self.piece2(c, Piece::Bishop) | self.piece2(c, Piece::Queen)
    }

    #[inline]
    pub(crate) fn piece_line(&self, c: Color) -> Bitboard {
        self.piece2(c, Piece::Rook) | self.piece2(c, Piece::Queen)
    }

    #[inline]
    pub(crate) fn piece_mut(&mut self, c: Cell) -> &mut Bitboard {
        unsafe { self.pieces.get_unchecked_mut(c.index()) }
    }

    /// Returns the position of the king of color `c`
    #[inline]
    pub fn king_pos(&self, c: Color) -> Square {
        unsafe { *self.kings.get_unchecked(c.index()) }
    }

    /// Validates `mv` and applies it, returning the resulting board
    ///
    /// The current board is left untouched. See [`Board::try_apply()`] for the in-place
    /// counterpart.
    pub fn make_move(&self, mv: Move) -> Result<Board, moves::ValidateError> {
        moves::make_move(self, mv)
    }

    /// Validates `mv` and applies it in place, returning the undo token
    ///
    /// Either the move is fully applied, or the board is left untouched: on error no
    /// field of the board changes. Pass the token to [`Board::unmake_move()`] to restore
    /// the exact previous state.
    pub fn try_apply(&mut self, mv: Move) -> Result<RawUndo, moves::ValidateError> {
        moves::try_apply(self, mv)
    }

    /// Undoes a move applied by [`Board::try_apply()`]
    ///
    /// # Safety
    ///
    /// `mv` must be the last move applied to the board, and `undo` must be the token
    /// returned when it was applied.
    pub unsafe fn unmake_move(&mut self, mv: Move, undo: RawUndo) {
        moves::unmake_move_unchecked(self, mv, undo)
    }

    /// Returns `true` if the opponent's king is under attack
    ///
    /// If it is under attack, the board is not valid; undo the offending move before
    /// doing anything else. See docs for [`Board`] for more details.
    #[inline]
    pub fn is_opponent_king_attacked(&self) -> bool {
        let c = self.r.side;
        safety::is_attacked(self, self.king_pos(c.inv()), c)
    }

    /// Returns `true` if the current side has at least one legal move
    #[inline]
    pub fn has_legal_moves(&self) -> bool {
        movegen::has_legal_moves(self)
    }

    /// Returns all the legal moves for the side to move
    #[inline]
    pub fn legal_moves(&self) -> MoveList {
        movegen::legal::gen_all(self)
    }

    /// Returns `true` if the current side is in check
    #[inline]
    pub fn is_check(&self) -> bool {
        let c = self.r.side;
        safety::is_attacked(self, self.king_pos(c), c.inv())
    }

    /// Returns all the pieces currently giving check
    #[inline]
    pub fn checkers(&self) -> Bitboard {
        safety::checkers(self, self.r.side)
    }

    /// Calculates the game status for the side to move
    ///
    /// This function can be computationally expensive, as it calls
    /// [`Board::has_legal_moves()`].
    pub fn status(&self) -> Status {
        if self.has_legal_moves() {
            return Status::Ongoing;
        }
        if self.is_check() {
            Status::Checkmate {
                winner: self.r.side.inv(),
            }
        } else {
            Status::Stalemate
        }
    }

    /// Wraps the board to allow pretty-printing
    ///
    /// See docs for [`RawBoard::pretty()`] for usage details.
    #[inline]
    pub fn pretty(&self) -> Pretty<'_> {
        self.r.pretty()
    }

    /// Converts the board into a FEN string
    #[inline]
    pub fn as_fen(&self) -> String {
        self.to_string()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Board({:?})", self.as_fen())
    }
}

impl PartialEq for Board {
    #[inline]
    fn eq(&self, other: &Board) -> bool {
        self.r == other.r
    }
}

impl Eq for Board {}

impl Hash for Board {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.r.hash(state)
    }
}

impl TryFrom<RawBoard> for Board {
    type Error = ValidateError;

    #[inline]
    fn try_from(raw: RawBoard) -> Result<Board, ValidateError> {
        Board::from_raw(raw, Rays::standard())
    }
}

impl TryFrom<&RawBoard> for Board {
    type Error = ValidateError;

    #[inline]
    fn try_from(raw: &RawBoard) -> Result<Board, ValidateError> {
        (*raw).try_into()
    }
}

/// Wrapper to pretty-print the board
///
/// See docs for [`RawBoard::pretty()`] for more details.
pub struct Pretty<'a> {
    raw: &'a RawBoard,
}

fn parse_cells(s: &str) -> Result<[Cell; 64], CellsParseError> {
    type Error = CellsParseError;

    let mut file = 0_usize;
    let mut row = 0_usize;
    let mut cells = [Cell::EMPTY; 64];
    // FEN lists ranks from the top, so row 0 is rank 8
    for b in s.bytes() {
        match b {
            b'1'..=b'8' => {
                let add = (b - b'0') as usize;
                if file + add > 8 {
                    return Err(Error::RankOverflow(Rank::from_index(7 - row)));
                }
                file += add;
            }
            b'/' => {
                if file < 8 {
                    return Err(Error::RankUnderflow(Rank::from_index(7 - row)));
                }
                row += 1;
                file = 0;
                if row >= 8 {
                    return Err(Error::Overflow);
                }
            }
            _ => {
                if file >= 8 {
                    return Err(Error::RankOverflow(Rank::from_index(7 - row)));
                }
                cells[(7 - row) * 8 + file] =
                    Cell::from_char(b as char).ok_or(Error::UnexpectedChar(b as char))?;
                file += 1;
            }
        };
    }

    if file < 8 {
        return Err(Error::RankUnderflow(Rank::from_index(7 - row)));
    }
    if row < 7 {
        return Err(Error::Underflow);
    }

    Ok(cells)
}

fn parse_ep_target(s: &str, side: Color) -> Result<Option<Square>, RawFenParseError> {
    if s == "-" {
        return Ok(None);
    }
    let target = Square::from_str(s)?;
    if target.rank() != geometry::enpassant_dst_rank(side) {
        return Err(RawFenParseError::InvalidEnpassantRank(target.rank()));
    }
    Ok(Some(target))
}

impl FromStr for RawBoard {
    type Err = RawFenParseError;

    fn from_str(s: &str) -> Result<RawBoard, Self::Err> {
        type Error = RawFenParseError;

        if !s.is_ascii() {
            return Err(Error::NonAscii);
        }
        let mut iter = s.split(' ').fuse();

        let cells = parse_cells(iter.next().ok_or(Error::NoBoard)?)?;
        let side = Color::from_str(iter.next().ok_or(Error::NoMoveSide)?)?;
        let castling = CastlingRights::from_str(iter.next().ok_or(Error::NoCastling)?)?;
        let ep_target = parse_ep_target(iter.next().ok_or(Error::NoEnpassant)?, side)?;
        let halfmove_clock = match iter.next() {
            Some(s) => u16::from_str(s).map_err(Error::HalfmoveClock)?,
            None => 0,
        };
        let move_number = match iter.next() {
            Some(s) => u16::from_str(s).map_err(Error::MoveNumber)?,
            None => 1,
        };

        if iter.next().is_some() {
            return Err(Error::ExtraData);
        }

        Ok(RawBoard {
            cells,
            side,
            castling,
            ep_target,
            halfmove_clock,
            move_number,
        })
    }
}

impl FromStr for Board {
    type Err = FenParseError;

    fn from_str(s: &str) -> Result<Board, Self::Err> {
        Ok(Board::from_raw(RawBoard::from_str(s)?, Rays::standard())?)
    }
}

fn format_cells(cells: &[Cell; 64], f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
    for rank in Rank::iter().rev() {
        if rank != Rank::R8 {
            write!(f, "/")?;
        }
        let mut empty = 0;
        for file in File::iter() {
            let cell = cells[Square::from_parts(file, rank).index()];
            if cell.is_empty() {
                empty += 1;
                continue;
            }
            if empty != 0 {
                write!(f, "{}", (b'0' + empty) as char)?;
                empty = 0;
            }
            write!(f, "{}", cell)?;
        }
        if empty != 0 {
            write!(f, "{}", (b'0' + empty) as char)?;
        }
    }
    Ok(())
}

impl Display for RawBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        format_cells(&self.cells, f)?;
        write!(f, " {} {}", self.side, self.castling)?;
        match self.ep_target {
            Some(p) => write!(f, " {}", p)?,
            None => write!(f, " -")?,
        };
        write!(f, " {} {}", self.halfmove_clock, self.move_number)?;
        Ok(())
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        self.r.fmt(f)
    }
}

impl<'a> Display for Pretty<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let r = self.raw;
        for rank in Rank::iter().rev() {
            write!(f, "{}|", rank)?;
            for file in File::iter() {
                write!(f, "{}", r.get2(file, rank))?;
            }
            writeln!(f)?;
        }
        writeln!(f, "-+--------")?;
        let indicator = match r.side {
            Color::White => 'W',
            Color::Black => 'B',
        };
        write!(f, "{}|", indicator)?;
        for file in File::iter() {
            write!(f, "{}", file)?;
        }
        writeln!(f)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn test_size() {
        assert_eq!(mem::size_of::<RawBoard>(), 72);
    }

    #[test]
    fn test_initial() {
        const INI_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

        assert_eq!(RawBoard::initial().to_string(), INI_FEN);
        assert_eq!(Board::initial().to_string(), INI_FEN);
        assert_eq!(RawBoard::from_str(INI_FEN), Ok(RawBoard::initial()));
        assert_eq!(Board::from_str(INI_FEN).unwrap(), Board::initial());
    }

    #[test]
    fn test_midgame() {
        const FEN: &str = "1rq1r1k1/1p3ppp/pB3n2/3ppP2/Pbb1P3/1PN2B2/2P2QPP/R1R4K w - - 1 21";

        let board = Board::from_fen(FEN).unwrap();
        assert_eq!(board.as_fen(), FEN);
        assert_eq!(
            board.get2(File::B, Rank::R4),
            Cell::from_parts(Color::Black, Piece::Bishop)
        );
        assert_eq!(
            board.get2(File::F, Rank::R2),
            Cell::from_parts(Color::White, Piece::Queen)
        );
        assert_eq!(
            board.king_pos(Color::White),
            Square::from_parts(File::H, Rank::R1)
        );
        assert_eq!(
            board.king_pos(Color::Black),
            Square::from_parts(File::G, Rank::R8)
        );
        assert_eq!(
            board.occupant_at(Square::from_parts(File::B, Rank::R6)),
            Some((Color::White, Piece::Bishop))
        );
        assert_eq!(
            board.occupant_at(Square::from_parts(File::A, Rank::R1)),
            Some((Color::White, Piece::Rook))
        );
        assert_eq!(
            board.occupant_at(Square::from_parts(File::D, Rank::R1)),
            None
        );
        assert_eq!(board.raw().side, Color::White);
        assert_eq!(board.raw().castling, CastlingRights::EMPTY);
        assert_eq!(board.raw().ep_target, None);
        assert_eq!(board.raw().halfmove_clock, 1);
        assert_eq!(board.raw().move_number, 21);
    }

    #[test]
    fn test_fixes() {
        const FEN: &str = "r1bq1b1r/ppppkppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK1R1 w KQkq c6 6 5";

        let raw = RawBoard::from_fen(FEN).unwrap();
        assert_eq!(raw.castling, CastlingRights::FULL);
        assert_eq!(raw.ep_target, Some(Square::from_parts(File::C, Rank::R6)));
        assert_eq!(raw.ep_victim(), Some(Square::from_parts(File::C, Rank::R5)));
        assert_eq!(raw.as_fen(), FEN);

        let board: Board = raw.try_into().unwrap();
        assert_eq!(
            board.raw().castling,
            CastlingRights::EMPTY.with(Color::White, CastlingSide::Queen)
        );
        assert_eq!(board.raw().ep_target, None);
        assert_eq!(
            board.as_fen(),
            "r1bq1b1r/ppppkppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK1R1 w Q - 6 5"
        );
    }

    #[test]
    fn test_ep_kept() {
        // Pawn on d5 can actually be captured en passant, so the target survives
        const FEN: &str = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3";

        let board = Board::from_fen(FEN).unwrap();
        assert_eq!(
            board.raw().ep_target,
            Some(Square::from_parts(File::D, Rank::R6))
        );
        assert_eq!(
            board.raw().ep_victim(),
            Some(Square::from_parts(File::D, Rank::R5))
        );
        assert_eq!(board.as_fen(), FEN);
    }

    #[test]
    fn test_bad_ep_rank() {
        assert_eq!(
            RawBoard::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1"),
            Err(RawFenParseError::InvalidEnpassantRank(Rank::R4))
        );
    }

    #[test]
    fn test_incomplete() {
        assert_eq!(
            RawBoard::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"),
            Err(RawFenParseError::NoMoveSide)
        );

        assert_eq!(
            RawBoard::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"),
            Err(RawFenParseError::NoCastling)
        );

        assert_eq!(
            RawBoard::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq"),
            Err(RawFenParseError::NoEnpassant)
        );

        let raw =
            RawBoard::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").unwrap();
        assert_eq!(raw.halfmove_clock, 0);
        assert_eq!(raw.move_number, 1);

        let raw =
            RawBoard::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 10").unwrap();
        assert_eq!(raw.halfmove_clock, 10);
        assert_eq!(raw.move_number, 1);
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            Board::from_fen("8/8/8/3k4/8/8/8/8 w - - 0 1"),
            Err(FenParseError::Valid(ValidateError::NoKing(Color::White)))
        );
        assert_eq!(
            Board::from_fen("8/8/8/3k4/8/8/1K2K3/8 w - - 0 1"),
            Err(FenParseError::Valid(ValidateError::TooManyKings(
                Color::White
            )))
        );
        assert_eq!(
            Board::from_fen("P7/8/8/3k4/8/8/1K6/8 w - - 0 1"),
            Err(FenParseError::Valid(ValidateError::InvalidPawn(
                Square::from_parts(File::A, Rank::R8)
            )))
        );
        // White to move, but the black king is already attacked
        assert_eq!(
            Board::from_fen("8/8/8/3k4/3R4/8/1K6/8 w - - 0 1"),
            Err(FenParseError::Valid(ValidateError::OpponentKingAttacked))
        );
    }

    #[test]
    fn test_status() {
        let b = Board::initial();
        assert_eq!(b.status(), Status::Ongoing);
        assert!(!b.is_check());

        let b = Board::from_fen("rn1q1bnr/ppp1kB1p/3p2p1/3NN3/4P3/8/PPPP1PPP/R1BbK2R b KQ - 2 7")
            .unwrap();
        assert!(!b.has_legal_moves());
        assert!(b.is_check());
        assert_eq!(
            b.status(),
            Status::Checkmate {
                winner: Color::White
            }
        );

        let b = Board::from_fen("7K/8/5n2/5n2/8/8/7k/8 w - - 0 1").unwrap();
        assert!(!b.has_legal_moves());
        assert!(!b.is_check());
        assert_eq!(b.status(), Status::Stalemate);
    }
}
