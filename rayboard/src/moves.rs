//! Moves, their validation, application and undo.

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::safety::Checker;
use crate::types::{
    CastlingRights, CastlingSide, Cell, Color, File, Piece, Rank, Square, SquareParseError,
};
use crate::{castling, generic, geometry, safety};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Move kind
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveKind {
    /// Non-pawn move or capture (except castling)
    Simple = 0,
    /// Kingside castling
    CastlingKingside = 1,
    /// Queenside castling
    CastlingQueenside = 2,
    /// Single pawn move (either non-capture or capture)
    PawnSimple = 3,
    /// Double pawn move
    PawnDouble = 4,
    /// En passant capture
    Enpassant = 5,
    /// Pawn promote to knight (either non-capture or capture)
    PromoteKnight = 6,
    /// Pawn promote to bishop (either non-capture or capture)
    PromoteBishop = 7,
    /// Pawn promote to rook (either non-capture or capture)
    PromoteRook = 8,
    /// Pawn promote to queen (either non-capture or capture)
    PromoteQueen = 9,
}

/// Target piece for promotion
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PromotePiece {
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl From<PromotePiece> for Piece {
    #[inline]
    fn from(p: PromotePiece) -> Self {
        match p {
            PromotePiece::Knight => Piece::Knight,
            PromotePiece::Bishop => Piece::Bishop,
            PromotePiece::Rook => Piece::Rook,
            PromotePiece::Queen => Piece::Queen,
        }
    }
}

impl TryFrom<Piece> for PromotePiece {
    type Error = ();

    #[inline]
    fn try_from(p: Piece) -> Result<Self, Self::Error> {
        match p {
            Piece::Knight => Ok(PromotePiece::Knight),
            Piece::Bishop => Ok(PromotePiece::Bishop),
            Piece::Rook => Ok(PromotePiece::Rook),
            Piece::Queen => Ok(PromotePiece::Queen),
            _ => Err(()),
        }
    }
}

impl From<CastlingSide> for MoveKind {
    #[inline]
    fn from(side: CastlingSide) -> Self {
        match side {
            CastlingSide::King => Self::CastlingKingside,
            CastlingSide::Queen => Self::CastlingQueenside,
        }
    }
}

impl TryFrom<MoveKind> for CastlingSide {
    type Error = ();

    #[inline]
    fn try_from(kind: MoveKind) -> Result<Self, Self::Error> {
        match kind {
            MoveKind::CastlingKingside => Ok(Self::King),
            MoveKind::CastlingQueenside => Ok(Self::Queen),
            _ => Err(()),
        }
    }
}

impl From<PromotePiece> for MoveKind {
    #[inline]
    fn from(kind: PromotePiece) -> Self {
        match kind {
            PromotePiece::Knight => Self::PromoteKnight,
            PromotePiece::Bishop => Self::PromoteBishop,
            PromotePiece::Rook => Self::PromoteRook,
            PromotePiece::Queen => Self::PromoteQueen,
        }
    }
}

impl TryFrom<MoveKind> for PromotePiece {
    type Error = ();

    #[inline]
    fn try_from(kind: MoveKind) -> Result<Self, Self::Error> {
        match kind {
            MoveKind::PromoteKnight => Ok(Self::Knight),
            MoveKind::PromoteBishop => Ok(Self::Bishop),
            MoveKind::PromoteRook => Ok(Self::Rook),
            MoveKind::PromoteQueen => Ok(Self::Queen),
            _ => Err(()),
        }
    }
}

impl MoveKind {
    /// Returns the piece after promotion if this move kind represents a promote
    ///
    /// Otherwise, returns `None`.
    #[inline]
    pub fn promote(self) -> Option<Piece> {
        let piece: PromotePiece = self.try_into().ok()?;
        Some(piece.into())
    }
}

/// Chess move
///
/// Moves have different degrees of validity:
///
/// - _Well-formed_. There exists a position in which a move of this shape is semi-legal.
///   All moves created through the safe constructors are well-formed; it is verified by
///   [`Move::is_well_formed()`].
///
/// - _Semi-legal_. The move is valid by the rules of chess, except that the king may
///   remain under attack after it.
///
/// - _Legal_. The move is semi-legal and the king doesn't remain under attack.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    kind: MoveKind,
    src: Square,
    dst: Square,
    side: Color,
}

/// Error indicating that move is invalid
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ValidateError {
    /// Move is not semi-legal
    #[error("move is not semi-legal")]
    NotSemiLegal,
    /// Move is not legal
    #[error("move is not legal")]
    NotLegal,
}

/// Error creating move
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum CreateError {
    /// Move is not well-formed
    #[error("move is not well-formed")]
    NotWellFormed,
}

/// Error parsing a move from UCI notation
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum UciParseError {
    /// String length doesn't match any UCI move
    #[error("invalid string length")]
    BadLength,
    /// Bad source square
    #[error("bad source square: {0}")]
    BadSrc(SquareParseError),
    /// Bad destination square
    #[error("bad destination square: {0}")]
    BadDst(SquareParseError),
    /// Bad promote character
    #[error("bad promote char {0:?}")]
    BadPromote(char),
    /// The parsed move is not well-formed
    #[error("cannot create move: {0}")]
    Create(#[from] CreateError),
}

/// Error parsing a move from UCI notation with validation
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum UciValidateError {
    /// Parse failed
    #[error("cannot parse move: {0}")]
    Parse(#[from] UciParseError),
    /// Parsed move is invalid
    #[error("invalid move: {0}")]
    Valid(#[from] ValidateError),
}

impl Move {
    /// Creates a castling move made by `color` with side `side`
    #[inline]
    pub fn from_castling(color: Color, side: CastlingSide) -> Move {
        let rank = geometry::castling_rank(color);
        let src = Square::from_parts(File::E, rank);
        let dst = match side {
            CastlingSide::King => Square::from_parts(File::G, rank),
            CastlingSide::Queen => Square::from_parts(File::C, rank),
        };
        Move {
            kind: MoveKind::from(side),
            src,
            dst,
            side: color,
        }
    }

    /// Creates a new move from its raw parts
    ///
    /// # Safety
    ///
    /// If the created move is not well-formed, it is undefined behavior to do anything
    /// with it other than checking it via [`Move::is_well_formed()`] or examining its
    /// fields via getters.
    #[inline]
    pub const unsafe fn new_unchecked(
        kind: MoveKind,
        src: Square,
        dst: Square,
        side: Color,
    ) -> Move {
        Move {
            kind,
            src,
            dst,
            side,
        }
    }

    /// Creates a new move from its raw parts and validates it for well-formedness
    pub fn new(kind: MoveKind, src: Square, dst: Square, side: Color) -> Result<Move, CreateError> {
        let mv = Move {
            kind,
            src,
            dst,
            side,
        };
        mv.is_well_formed()
            .then_some(mv)
            .ok_or(CreateError::NotWellFormed)
    }

    /// Creates a move from the UCI string `s` if `b` is the position preceding this move
    ///
    /// The move kind which UCI notation leaves implicit (castling, double pawn moves,
    /// en passant) is inferred from the board. The returned move is **not** guaranteed
    /// to be semi-legal.
    pub fn from_uci(s: &str, b: &Board) -> Result<Move, UciParseError> {
        if s.len() != 4 && s.len() != 5 {
            return Err(UciParseError::BadLength);
        }
        let src = Square::from_str(&s[0..2]).map_err(UciParseError::BadSrc)?;
        let dst = Square::from_str(&s[2..4]).map_err(UciParseError::BadDst)?;
        let promote = match s.as_bytes().get(4) {
            Some(b'n') => Some(PromotePiece::Knight),
            Some(b'b') => Some(PromotePiece::Bishop),
            Some(b'r') => Some(PromotePiece::Rook),
            Some(b'q') => Some(PromotePiece::Queen),
            Some(&c) => return Err(UciParseError::BadPromote(c as char)),
            None => None,
        };

        let kind = match promote {
            Some(p) => MoveKind::from(p),
            None => match b.get(src).piece() {
                Some(Piece::King)
                    if src.file() == File::E
                        && src.rank() == dst.rank()
                        && dst.file() == File::G =>
                {
                    MoveKind::CastlingKingside
                }
                Some(Piece::King)
                    if src.file() == File::E
                        && src.rank() == dst.rank()
                        && dst.file() == File::C =>
                {
                    MoveKind::CastlingQueenside
                }
                Some(Piece::Pawn) => {
                    if src.rank().index().abs_diff(dst.rank().index()) == 2 {
                        MoveKind::PawnDouble
                    } else if src.file() != dst.file() && b.get(dst).is_empty() {
                        MoveKind::Enpassant
                    } else {
                        MoveKind::PawnSimple
                    }
                }
                _ => MoveKind::Simple,
            },
        };

        Ok(Move::new(kind, src, dst, b.side())?)
    }

    /// Same as [`Move::from_uci()`], but the returned move is guaranteed to be legal
    pub fn from_uci_legal(s: &str, b: &Board) -> Result<Move, UciValidateError> {
        let res = Move::from_uci(s, b)?;
        res.validate(b)?;
        Ok(res)
    }

    /// Returns `true` if the move is semi-legal in position `b`
    pub fn is_semilegal(&self, b: &Board) -> bool {
        match b.r.side {
            Color::White => do_is_move_semilegal::<generic::White>(b, *self),
            Color::Black => do_is_move_semilegal::<generic::Black>(b, *self),
        }
    }

    /// Returns `true` if the move is legal
    ///
    /// # Safety
    ///
    /// The move must be semi-legal, otherwise the behavior is undefined.
    pub unsafe fn is_legal_unchecked(&self, b: &Board) -> bool {
        Checker::new(b).is_legal(*self)
    }

    /// Validates whether this move is semi-legal in position `b`
    #[inline]
    pub fn semi_validate(&self, b: &Board) -> Result<(), ValidateError> {
        if !self.is_semilegal(b) {
            return Err(ValidateError::NotSemiLegal);
        }
        Ok(())
    }

    /// Validates whether this move is legal in position `b`
    #[inline]
    pub fn validate(&self, b: &Board) -> Result<(), ValidateError> {
        self.semi_validate(b)?;
        match unsafe { self.is_legal_unchecked(b) } {
            true => Ok(()),
            false => Err(ValidateError::NotLegal),
        }
    }

    /// Returns `true` if the move is well-formed
    ///
    /// If the move is not well-formed, you can only call getters and this function on
    /// it, other uses are undefined behavior.
    pub fn is_well_formed(&self) -> bool {
        let side = self.side;
        match self.kind {
            MoveKind::Simple => {
                // No additional checks needed
            }
            MoveKind::CastlingKingside => {
                let rank = geometry::castling_rank(side);
                if self.src != Square::from_parts(File::E, rank)
                    || self.dst != Square::from_parts(File::G, rank)
                {
                    return false;
                }
            }
            MoveKind::CastlingQueenside => {
                let rank = geometry::castling_rank(side);
                if self.src != Square::from_parts(File::E, rank)
                    || self.dst != Square::from_parts(File::C, rank)
                {
                    return false;
                }
            }
            MoveKind::PawnSimple => {
                if self.src.file().index().abs_diff(self.dst.file().index()) > 1
                    || matches!(self.src.rank(), Rank::R1 | Rank::R8)
                    || matches!(self.dst.rank(), Rank::R1 | Rank::R8)
                {
                    return false;
                }
                match side {
                    Color::White => {
                        if self.src.rank().index() + 1 != self.dst.rank().index() {
                            return false;
                        }
                    }
                    Color::Black => {
                        if self.src.rank().index() != self.dst.rank().index() + 1 {
                            return false;
                        }
                    }
                };
            }
            MoveKind::PawnDouble => {
                if self.src.file() != self.dst.file()
                    || self.src.rank() != geometry::double_move_src_rank(side)
                    || self.dst.rank() != geometry::double_move_dst_rank(side)
                {
                    return false;
                }
            }
            MoveKind::Enpassant => {
                if self.src.rank() != geometry::enpassant_src_rank(side)
                    || self.dst.rank() != geometry::enpassant_dst_rank(side)
                    || self.src.file().index().abs_diff(self.dst.file().index()) != 1
                {
                    return false;
                }
            }
            MoveKind::PromoteKnight
            | MoveKind::PromoteBishop
            | MoveKind::PromoteRook
            | MoveKind::PromoteQueen => {
                if self.src.rank() != geometry::promote_src_rank(side)
                    || self.dst.rank() != geometry::promote_dst_rank(side)
                    || self.src.file().index().abs_diff(self.dst.file().index()) > 1
                {
                    return false;
                }
            }
        };

        true
    }

    /// Returns the move kind
    #[inline]
    pub const fn kind(&self) -> MoveKind {
        self.kind
    }

    /// Returns the move source square
    #[inline]
    pub const fn src(&self) -> Square {
        self.src
    }

    /// Returns the move destination square
    #[inline]
    pub const fn dst(&self) -> Square {
        self.dst
    }

    /// Returns the side which makes this move
    #[inline]
    pub const fn side(&self) -> Color {
        self.side
    }
}

impl fmt::Display for Move {
    /// Formats the move in UCI notation
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}{}", self.src, self.dst)?;
        if let Ok(p) = PromotePiece::try_from(self.kind) {
            let ch = match p {
                PromotePiece::Knight => 'n',
                PromotePiece::Bishop => 'b',
                PromotePiece::Rook => 'r',
                PromotePiece::Queen => 'q',
            };
            write!(f, "{}", ch)?;
        }
        Ok(())
    }
}

/// Metadata necessary to undo an applied move
#[derive(Debug, Copy, Clone)]
pub struct RawUndo {
    dst_cell: Cell,
    castling: CastlingRights,
    ep_target: Option<Square>,
    halfmove_clock: u16,
}

fn update_castling(b: &mut Board, change: Bitboard) {
    if (change & castling::ALL_SRCS).is_empty() {
        return;
    }

    for (c, s) in [
        (Color::White, CastlingSide::Queen),
        (Color::White, CastlingSide::King),
        (Color::Black, CastlingSide::Queen),
        (Color::Black, CastlingSide::King),
    ] {
        if (change & castling::srcs(c, s)).is_nonempty() {
            b.r.castling.unset(c, s);
        }
    }
}

#[inline]
fn do_make_pawn_double<C: generic::Color>(b: &mut Board, mv: Move, change: Bitboard, inv: bool) {
    let pawn = Cell::from_parts(C::COLOR, Piece::Pawn);
    if inv {
        b.r.put(mv.src, pawn);
        b.r.put(mv.dst, Cell::EMPTY);
    } else {
        b.r.put(mv.src, Cell::EMPTY);
        b.r.put(mv.dst, pawn);
    }
    *b.color_mut(C::COLOR) ^= change;
    *b.piece_mut(pawn) ^= change;
    if !inv {
        // The skipped square becomes the en passant target
        b.r.ep_target = Some(unsafe {
            mv.src.add_unchecked(geometry::pawn_forward_delta(C::COLOR))
        });
    }
}

#[inline]
fn do_make_enpassant<C: generic::Color>(b: &mut Board, mv: Move, change: Bitboard, inv: bool) {
    let taken_pos = unsafe {
        mv.dst
            .add_unchecked(-geometry::pawn_forward_delta(C::COLOR))
    };
    let taken = Bitboard::from_square(taken_pos);
    let our_pawn = Cell::from_parts(C::COLOR, Piece::Pawn);
    let their_pawn = Cell::from_parts(C::COLOR.inv(), Piece::Pawn);
    if inv {
        b.r.put(mv.src, our_pawn);
        b.r.put(mv.dst, Cell::EMPTY);
        b.r.put(taken_pos, their_pawn);
    } else {
        b.r.put(mv.src, Cell::EMPTY);
        b.r.put(mv.dst, our_pawn);
        b.r.put(taken_pos, Cell::EMPTY);
    }
    *b.color_mut(C::COLOR) ^= change;
    *b.piece_mut(our_pawn) ^= change;
    *b.color_mut(C::COLOR.inv()) ^= taken;
    *b.piece_mut(their_pawn) ^= taken;
}

#[inline]
fn do_make_castling_kingside<C: generic::Color>(b: &mut Board, inv: bool) {
    let king = Cell::from_parts(C::COLOR, Piece::King);
    let rook = Cell::from_parts(C::COLOR, Piece::Rook);
    let rank = geometry::castling_rank(C::COLOR);
    if inv {
        b.r.put2(File::E, rank, king);
        b.r.put2(File::F, rank, Cell::EMPTY);
        b.r.put2(File::G, rank, Cell::EMPTY);
        b.r.put2(File::H, rank, rook);
        b.kings[C::COLOR.index()] = Square::from_parts(File::E, rank);
    } else {
        b.r.put2(File::E, rank, Cell::EMPTY);
        b.r.put2(File::F, rank, rook);
        b.r.put2(File::G, rank, king);
        b.r.put2(File::H, rank, Cell::EMPTY);
        b.kings[C::COLOR.index()] = Square::from_parts(File::G, rank);
    }
    *b.color_mut(C::COLOR) ^= Bitboard::from_raw(0xf0 << C::CASTLING_OFFSET);
    *b.piece_mut(rook) ^= Bitboard::from_raw(0xa0 << C::CASTLING_OFFSET);
    *b.piece_mut(king) ^= Bitboard::from_raw(0x50 << C::CASTLING_OFFSET);
    if !inv {
        b.r.castling.unset_color(C::COLOR);
    }
}

#[inline]
fn do_make_castling_queenside<C: generic::Color>(b: &mut Board, inv: bool) {
    let king = Cell::from_parts(C::COLOR, Piece::King);
    let rook = Cell::from_parts(C::COLOR, Piece::Rook);
    let rank = geometry::castling_rank(C::COLOR);
    if inv {
        b.r.put2(File::A, rank, rook);
        b.r.put2(File::C, rank, Cell::EMPTY);
        b.r.put2(File::D, rank, Cell::EMPTY);
        b.r.put2(File::E, rank, king);
        b.kings[C::COLOR.index()] = Square::from_parts(File::E, rank);
    } else {
        b.r.put2(File::A, rank, Cell::EMPTY);
        b.r.put2(File::C, rank, king);
        b.r.put2(File::D, rank, rook);
        b.r.put2(File::E, rank, Cell::EMPTY);
        b.kings[C::COLOR.index()] = Square::from_parts(File::C, rank);
    }
    *b.color_mut(C::COLOR) ^= Bitboard::from_raw(0x1d << C::CASTLING_OFFSET);
    *b.piece_mut(rook) ^= Bitboard::from_raw(0x09 << C::CASTLING_OFFSET);
    *b.piece_mut(king) ^= Bitboard::from_raw(0x14 << C::CASTLING_OFFSET);
    if !inv {
        b.r.castling.unset_color(C::COLOR);
    }
}

fn do_make_move<C: generic::Color>(b: &mut Board, mv: Move) -> RawUndo {
    let src_cell = b.get(mv.src);
    let dst_cell = b.get(mv.dst);
    debug_assert_ne!(dst_cell.piece(), Some(Piece::King), "king cannot be captured");
    let undo = RawUndo {
        dst_cell,
        castling: b.r.castling,
        ep_target: b.r.ep_target,
        halfmove_clock: b.r.halfmove_clock,
    };
    let src = Bitboard::from_square(mv.src);
    let dst = Bitboard::from_square(mv.dst);
    let change = src | dst;
    b.r.ep_target = None;
    match mv.kind {
        MoveKind::Simple | MoveKind::PawnSimple => {
            b.r.put(mv.src, Cell::EMPTY);
            b.r.put(mv.dst, src_cell);
            *b.color_mut(C::COLOR) ^= change;
            *b.piece_mut(src_cell) ^= change;
            *b.color_mut(C::COLOR.inv()) &= !dst;
            *b.piece_mut(dst_cell) &= !dst;
            if mv.kind == MoveKind::Simple {
                if src_cell == Cell::from_parts(C::COLOR, Piece::King) {
                    b.kings[C::COLOR.index()] = mv.dst;
                }
                update_castling(b, change);
            }
        }
        MoveKind::PawnDouble => {
            do_make_pawn_double::<C>(b, mv, change, false);
        }
        MoveKind::PromoteKnight
        | MoveKind::PromoteBishop
        | MoveKind::PromoteRook
        | MoveKind::PromoteQueen => {
            let promote = match mv.kind.promote() {
                Some(p) => Cell::from_parts(C::COLOR, p),
                None => unreachable!(),
            };
            let pawn = Cell::from_parts(C::COLOR, Piece::Pawn);
            b.r.put(mv.src, Cell::EMPTY);
            b.r.put(mv.dst, promote);
            *b.color_mut(C::COLOR) ^= change;
            *b.piece_mut(pawn) ^= src;
            *b.piece_mut(promote) ^= dst;
            *b.color_mut(C::COLOR.inv()) &= !dst;
            *b.piece_mut(dst_cell) &= !dst;
            update_castling(b, change);
        }
        MoveKind::CastlingKingside => {
            do_make_castling_kingside::<C>(b, false);
        }
        MoveKind::CastlingQueenside => {
            do_make_castling_queenside::<C>(b, false);
        }
        MoveKind::Enpassant => {
            do_make_enpassant::<C>(b, mv, change, false);
        }
    }

    if dst_cell != Cell::EMPTY || src_cell == Cell::from_parts(C::COLOR, Piece::Pawn) {
        b.r.halfmove_clock = 0;
    } else {
        b.r.halfmove_clock += 1;
    }
    b.r.side = C::COLOR.inv();
    if C::COLOR == Color::Black {
        b.r.move_number += 1;
    }
    b.all = b.white | b.black;

    undo
}

fn do_unmake_move<C: generic::Color>(b: &mut Board, mv: Move, u: RawUndo) {
    let src = Bitboard::from_square(mv.src);
    let dst = Bitboard::from_square(mv.dst);
    let change = src | dst;
    let src_cell = b.get(mv.dst);
    let dst_cell = u.dst_cell;

    match mv.kind {
        MoveKind::Simple | MoveKind::PawnSimple => {
            b.r.put(mv.src, src_cell);
            b.r.put(mv.dst, dst_cell);
            *b.color_mut(C::COLOR) ^= change;
            *b.piece_mut(src_cell) ^= change;
            if dst_cell.is_occupied() {
                *b.color_mut(C::COLOR.inv()) |= dst;
                *b.piece_mut(dst_cell) |= dst;
            }
            if src_cell == Cell::from_parts(C::COLOR, Piece::King) {
                b.kings[C::COLOR.index()] = mv.src;
            }
        }
        MoveKind::PawnDouble => {
            do_make_pawn_double::<C>(b, mv, change, true);
        }
        MoveKind::PromoteKnight
        | MoveKind::PromoteBishop
        | MoveKind::PromoteRook
        | MoveKind::PromoteQueen => {
            let pawn = Cell::from_parts(C::COLOR, Piece::Pawn);
            b.r.put(mv.src, pawn);
            b.r.put(mv.dst, dst_cell);
            *b.color_mut(C::COLOR) ^= change;
            *b.piece_mut(pawn) ^= src;
            *b.piece_mut(src_cell) ^= dst;
            if dst_cell.is_occupied() {
                *b.color_mut(C::COLOR.inv()) |= dst;
                *b.piece_mut(dst_cell) |= dst;
            }
        }
        MoveKind::CastlingKingside => {
            do_make_castling_kingside::<C>(b, true);
        }
        MoveKind::CastlingQueenside => {
            do_make_castling_queenside::<C>(b, true);
        }
        MoveKind::Enpassant => {
            do_make_enpassant::<C>(b, mv, change, true);
        }
    }

    b.r.castling = u.castling;
    b.r.ep_target = u.ep_target;
    b.r.halfmove_clock = u.halfmove_clock;
    b.r.side = C::COLOR;
    if C::COLOR == Color::Black {
        b.r.move_number -= 1;
    }
    b.all = b.white | b.black;
}

/// Makes the move `mv` on the board `b`
///
/// To allow unmaking the move, a [`RawUndo`] instance is returned. See
/// [`unmake_move_unchecked()`] for the details on how to unmake a move.
///
/// # Safety
///
/// The move must be semi-legal, otherwise the behavior is undefined.
///
/// If the king is under attack after the move (i.e. the board becomes invalid), it must
/// be immediately rolled back via [`unmake_move_unchecked()`]. Doing anything else with
/// the board before that, except calling [`Board::is_opponent_king_attacked()`], is
/// undefined behavior.
pub unsafe fn make_move_unchecked(b: &mut Board, mv: Move) -> RawUndo {
    match b.r.side {
        Color::White => do_make_move::<generic::White>(b, mv),
        Color::Black => do_make_move::<generic::Black>(b, mv),
    }
}

/// Unmakes the move `mv` on the board `b`
///
/// # Safety
///
/// You may invoke this function only with the position obtained after the corresponding
/// call to [`make_move_unchecked()`], with the move and undo token from that call.
///
/// Note that `b` may be an invalid position here, so an illegal move can be rolled back.
pub unsafe fn unmake_move_unchecked(b: &mut Board, mv: Move, u: RawUndo) {
    match b.r.side {
        Color::White => do_unmake_move::<generic::Black>(b, mv, u),
        Color::Black => do_unmake_move::<generic::White>(b, mv, u),
    }
}

/// Validates `mv` and applies it to a copy of `b`
pub fn make_move(b: &Board, mv: Move) -> Result<Board, ValidateError> {
    mv.validate(b)?;
    let mut res = b.clone();
    unsafe {
        make_move_unchecked(&mut res, mv);
    }
    Ok(res)
}

/// Validates `mv` and applies it to `b` in place
///
/// On error the board is left untouched.
pub fn try_apply(b: &mut Board, mv: Move) -> Result<RawUndo, ValidateError> {
    mv.validate(b)?;
    Ok(unsafe { make_move_unchecked(b, mv) })
}

fn is_diag_semilegal(b: &Board, src: Square, dst: Square) -> bool {
    match b.rays().ray_between(src, dst) {
        Some(ray) => ray.is_diagonal() && (b.rays().between(src, dst) & b.all).is_empty(),
        None => false,
    }
}

fn is_line_semilegal(b: &Board, src: Square, dst: Square) -> bool {
    match b.rays().ray_between(src, dst) {
        Some(ray) => !ray.is_diagonal() && (b.rays().between(src, dst) & b.all).is_empty(),
        None => false,
    }
}

fn do_is_move_semilegal<C: generic::Color>(b: &Board, mv: Move) -> bool {
    if mv.side != C::COLOR {
        return false;
    }
    let src_cell = b.get(mv.src);
    let pawn = Cell::from_parts(C::COLOR, Piece::Pawn);
    match mv.kind {
        MoveKind::Simple => {
            let dst = Bitboard::from_square(mv.dst);
            if src_cell.color() != Some(C::COLOR) || (dst & b.color(C::COLOR)).is_nonempty() {
                return false;
            }
            match src_cell.piece() {
                Some(Piece::Bishop) => is_diag_semilegal(b, mv.src, mv.dst),
                Some(Piece::Rook) => is_line_semilegal(b, mv.src, mv.dst),
                Some(Piece::Queen) => {
                    is_diag_semilegal(b, mv.src, mv.dst) || is_line_semilegal(b, mv.src, mv.dst)
                }
                Some(Piece::Knight) => (b.rays().knight(mv.src) & dst).is_nonempty(),
                Some(Piece::King) => (b.rays().king(mv.src) & dst).is_nonempty(),
                Some(Piece::Pawn) => false,
                None => unreachable!(),
            }
        }
        MoveKind::PawnSimple
        | MoveKind::PromoteKnight
        | MoveKind::PromoteBishop
        | MoveKind::PromoteRook
        | MoveKind::PromoteQueen => {
            if src_cell != pawn {
                return false;
            }
            let dst_cell = b.r.get(mv.dst);
            if let Some(c) = dst_cell.color() {
                c == C::COLOR.inv() && mv.dst.file() != mv.src.file()
            } else {
                mv.dst.file() == mv.src.file()
            }
        }
        MoveKind::PawnDouble => {
            let must_empty = match C::COLOR {
                Color::White => Bitboard::from_raw(0x010100 << mv.src.index()),
                Color::Black => Bitboard::from_raw(0x0101 << (mv.src.index() - 16)),
            };
            src_cell == pawn && (b.all & must_empty).is_empty()
        }
        MoveKind::CastlingKingside => {
            b.r.castling.has(C::COLOR, CastlingSide::King)
                && (b.all & castling::pass(C::COLOR, CastlingSide::King)).is_empty()
                && !safety::is_attacked(b, mv.src, C::COLOR.inv())
                && !safety::is_attacked(b, unsafe { mv.src.add_unchecked(1) }, C::COLOR.inv())
        }
        MoveKind::CastlingQueenside => {
            b.r.castling.has(C::COLOR, CastlingSide::Queen)
                && (b.all & castling::pass(C::COLOR, CastlingSide::Queen)).is_empty()
                && !safety::is_attacked(b, mv.src, C::COLOR.inv())
                && !safety::is_attacked(b, unsafe { mv.src.add_unchecked(-1) }, C::COLOR.inv())
        }
        MoveKind::Enpassant => src_cell == pawn && b.r.ep_target == Some(mv.dst),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use std::mem;

    #[test]
    fn test_size() {
        assert_eq!(mem::size_of::<Move>(), 4);
    }

    #[test]
    fn test_uci_str() {
        let b = Board::initial();
        let mv = Move::from_uci("g1f3", &b).unwrap();
        assert_eq!(mv.kind(), MoveKind::Simple);
        assert_eq!(mv.to_string(), "g1f3");

        let b = Board::from_fen("1b1b1K2/2P5/8/8/7k/8/8/8 w - - 0 1").unwrap();
        let mv = Move::from_uci("c7b8n", &b).unwrap();
        assert_eq!(mv.kind(), MoveKind::PromoteKnight);
        assert_eq!(mv.to_string(), "c7b8n");

        assert_eq!(Move::from_uci("c7b9q", &b), Err(UciParseError::BadDst(
            SquareParseError::UnexpectedRankChar('9')
        )));
        assert_eq!(Move::from_uci("c7", &b), Err(UciParseError::BadLength));
        assert_eq!(
            Move::from_uci("c7c8x", &b),
            Err(UciParseError::BadPromote('x'))
        );
    }

    #[test]
    fn test_simple() {
        let mut b = Board::initial();
        for (mv_str, fen_str) in [
            (
                "e2e4",
                "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            ),
            (
                "b8c6",
                "r1bqkbnr/pppppppp/2n5/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 1 2",
            ),
            (
                "g1f3",
                "r1bqkbnr/pppppppp/2n5/8/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 2 2",
            ),
            (
                "e7e5",
                "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq e6 0 3",
            ),
            (
                "f1b5",
                "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 1 3",
            ),
            (
                "g8f6",
                "r1bqkb1r/pppp1ppp/2n2n2/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 2 4",
            ),
            (
                "e1g1",
                "r1bqkb1r/pppp1ppp/2n2n2/1B2p3/4P3/5N2/PPPP1PPP/RNBQ1RK1 b kq - 3 4",
            ),
            (
                "f6e4",
                "r1bqkb1r/pppp1ppp/2n5/1B2p3/4n3/5N2/PPPP1PPP/RNBQ1RK1 w kq - 0 5",
            ),
        ] {
            let m = Move::from_uci(mv_str, &b).unwrap();
            b = b.make_move(m).unwrap();
            assert_eq!(b.as_fen(), fen_str);
            assert_eq!(b.raw().try_into(), Ok(b.clone()));
        }
    }

    #[test]
    fn test_promote() {
        let mut b = Board::from_fen("1b1b1K2/2P5/8/8/7k/8/8/8 w - - 0 1").unwrap();
        let b_copy = b.clone();

        for (mv_str, fen_str) in [
            ("c7c8q", "1bQb1K2/8/8/8/7k/8/8/8 b - - 0 1"),
            ("c7b8n", "1N1b1K2/8/8/8/7k/8/8/8 b - - 0 1"),
            ("c7d8r", "1b1R1K2/8/8/8/7k/8/8/8 b - - 0 1"),
        ] {
            let m = Move::from_uci(mv_str, &b).unwrap();
            let u = b.try_apply(m).unwrap();
            assert_eq!(b.as_fen(), fen_str);
            assert_eq!(b.raw().try_into(), Ok(b.clone()));
            unsafe { b.unmake_move(m, u) };
            assert_eq!(b, b_copy);
        }
    }

    #[test]
    fn test_undo() {
        let mut b =
            Board::from_fen("r1bqk2r/ppp2ppp/2np1n2/1Bb1p3/4P3/2PP1N2/PP3PPP/RNBQK2R w KQkq - 0 6")
                .unwrap();
        let b_copy = b.clone();

        for (mv_str, fen_str) in [
            (
                "e1g1",
                "r1bqk2r/ppp2ppp/2np1n2/1Bb1p3/4P3/2PP1N2/PP3PPP/RNBQ1RK1 b kq - 1 6",
            ),
            (
                "f3e5",
                "r1bqk2r/ppp2ppp/2np1n2/1Bb1N3/4P3/2PP4/PP3PPP/RNBQK2R b KQkq - 0 6",
            ),
            (
                "b2b4",
                "r1bqk2r/ppp2ppp/2np1n2/1Bb1p3/1P2P3/2PP1N2/P4PPP/RNBQK2R b KQkq b3 0 6",
            ),
            (
                "c3c4",
                "r1bqk2r/ppp2ppp/2np1n2/1Bb1p3/2P1P3/3P1N2/PP3PPP/RNBQK2R b KQkq - 0 6",
            ),
        ] {
            let m = Move::from_uci(mv_str, &b).unwrap();
            let u = b.try_apply(m).unwrap();
            assert_eq!(b.as_fen(), fen_str);
            assert_eq!(b.raw().try_into(), Ok(b.clone()));
            unsafe { b.unmake_move(m, u) };
            assert_eq!(b, b_copy);
        }
    }

    #[test]
    fn test_pawns() {
        let mut b = Board::from_fen("3K4/3p4/8/3PpP2/8/5p2/6P1/2k5 w - e6 0 1").unwrap();
        let b_copy = b.clone();

        for (mv_str, fen_str) in [
            ("g2g3", "3K4/3p4/8/3PpP2/8/5pP1/8/2k5 b - - 0 1"),
            ("g2g4", "3K4/3p4/8/3PpP2/6P1/5p2/8/2k5 b - g3 0 1"),
            ("g2f3", "3K4/3p4/8/3PpP2/8/5P2/8/2k5 b - - 0 1"),
            ("d5e6", "3K4/3p4/4P3/5P2/8/5p2/6P1/2k5 b - - 0 1"),
            ("f5e6", "3K4/3p4/4P3/3P4/8/5p2/6P1/2k5 b - - 0 1"),
        ] {
            let m = Move::from_uci(mv_str, &b).unwrap();
            let u = b.try_apply(m).unwrap();
            assert_eq!(b.as_fen(), fen_str);
            assert_eq!(b.raw().try_into(), Ok(b.clone()));
            unsafe { b.unmake_move(m, u) };
            assert_eq!(b, b_copy);
        }
    }

    #[test]
    fn test_legal() {
        let b =
            Board::from_fen("r1bqk2r/ppp2ppp/2np1n2/1Bb1p3/4P3/2PP1N2/PP3PPP/RNBQK2R w KQkq - 0 6")
                .unwrap();

        // Queenside castling is not possible, the squares between are occupied
        let m = Move::from_uci("e1c1", &b).unwrap();
        assert!(!m.is_semilegal(&b));
        assert_eq!(m.semi_validate(&b), Err(ValidateError::NotSemiLegal));

        // Bishop's path to e8 is blocked
        let m = Move::from_uci("b5e8", &b).unwrap();
        assert!(!m.is_semilegal(&b));
        assert_eq!(m.semi_validate(&b), Err(ValidateError::NotSemiLegal));

        // No piece on a3
        let m = Move::from_uci("a3a4", &b).unwrap();
        assert!(!m.is_semilegal(&b));
        assert_eq!(m.semi_validate(&b), Err(ValidateError::NotSemiLegal));

        // d1 is occupied by our own queen
        let m = Move::from_uci("e1d1", &b).unwrap();
        assert!(!m.is_semilegal(&b));
        assert_eq!(m.semi_validate(&b), Err(ValidateError::NotSemiLegal));

        // Pawns don't move two squares from the third rank
        assert_eq!(
            Move::from_uci("c3c5", &b),
            Err(UciParseError::Create(CreateError::NotWellFormed))
        );
    }

    #[test]
    fn test_not_legal() {
        // The pawn on c6 is pinned by the bishop on b5; capturing on d5 would
        // expose the king on e8
        let b = Board::from_fen("rnbqkbnr/pp2pppp/2p5/1B1P4/8/8/PPPP1PPP/RNBQK1NR b KQkq - 0 3")
            .unwrap();
        let m = Move::from_uci("c6d5", &b).unwrap();
        assert!(m.is_semilegal(&b));
        assert_eq!(m.validate(&b), Err(ValidateError::NotLegal));
        assert_eq!(b.make_move(m), Err(ValidateError::NotLegal));

        // Capturing the pinner itself stays legal
        let m = Move::from_uci("c6b5", &b).unwrap();
        assert_eq!(m.validate(&b), Ok(()));
    }
}
