//! Move generation.

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::moves::{self, Move, MoveKind};
use crate::safety::Checker;
use crate::types::{CastlingSide, Cell, Color, File, Piece, Square};
use crate::{castling, generic, geometry, masks, pawns};

use std::convert::Infallible;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::slice;

use arrayvec::ArrayVec;

trait MaybeMovePush {
    type Err;

    fn push(&mut self, m: Move) -> Result<(), Self::Err>;
}

/// List of moves on the stack
///
/// 256 slots are enough for any legal chess position.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct MoveList(ArrayVec<Move, 256>);

impl Deref for MoveList {
    type Target = ArrayVec<Move, 256>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for MoveList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a mut MoveList {
    type Item = &'a mut Move;
    type IntoIter = slice::IterMut<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter_mut()
    }
}

impl IntoIterator for MoveList {
    type Item = Move;
    type IntoIter = arrayvec::IntoIter<Move, 256>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl MoveList {
    pub fn new() -> MoveList {
        MoveList(ArrayVec::new())
    }
}

/// Sink for generated moves
pub trait MovePush {
    fn push(&mut self, m: Move);
}

impl<const N: usize> MovePush for ArrayVec<Move, N> {
    fn push(&mut self, m: Move) {
        self.push(m);
    }
}

impl MovePush for MoveList {
    fn push(&mut self, m: Move) {
        self.0.push(m);
    }
}

impl MovePush for Vec<Move> {
    fn push(&mut self, m: Move) {
        self.push(m);
    }
}

impl<T: MovePush> MaybeMovePush for T {
    type Err = Infallible;

    fn push(&mut self, m: Move) -> Result<(), Self::Err> {
        <Self as MovePush>::push(self, m);
        Ok(())
    }
}

struct UnsafeMoveList(MoveList);

impl UnsafeMoveList {
    // Safety: the caller must not push more than 256 moves
    unsafe fn new() -> UnsafeMoveList {
        UnsafeMoveList(MoveList::new())
    }
}

impl MovePush for UnsafeMoveList {
    fn push(&mut self, m: Move) {
        unsafe {
            self.0.push_unchecked(m);
        }
    }
}

struct LegalFilter<'a, P> {
    checker: Checker<'a>,
    inner: &'a mut P,
}

impl<'a, P: MaybeMovePush> LegalFilter<'a, P> {
    // Safety: pushed moves must be semi-legal on the checker's board
    unsafe fn new(board: &'a Board, inner: &'a mut P) -> Self {
        Self {
            checker: Checker::new(board),
            inner,
        }
    }
}

impl<'a, P: MaybeMovePush> MaybeMovePush for LegalFilter<'a, P> {
    type Err = P::Err;

    fn push(&mut self, mv: Move) -> Result<(), Self::Err> {
        match self.checker.is_legal(mv) {
            true => self.inner.push(mv),
            false => Ok(()),
        }
    }
}

struct MoveGenImpl<'a, P, C> {
    board: &'a Board,
    dst: &'a mut P,
    _c: PhantomData<C>,
}

impl<'a, P: MaybeMovePush, C: generic::Color> MoveGenImpl<'a, P, C> {
    fn new(board: &'a Board, dst: &'a mut P, _c: C) -> Self {
        MoveGenImpl {
            board,
            dst,
            _c: PhantomData,
        }
    }

    unsafe fn add_move(&mut self, kind: MoveKind, src: Square, dst: Square) -> Result<(), P::Err> {
        self.dst.push(Move::new_unchecked(kind, src, dst, C::COLOR))
    }

    unsafe fn add_pawn_with_promote<const IS_PROMOTE: bool>(
        &mut self,
        src: Square,
        dst: Square,
    ) -> Result<(), P::Err> {
        if IS_PROMOTE {
            self.add_move(MoveKind::PromoteKnight, src, dst)?;
            self.add_move(MoveKind::PromoteBishop, src, dst)?;
            self.add_move(MoveKind::PromoteRook, src, dst)?;
            self.add_move(MoveKind::PromoteQueen, src, dst)?;
        } else {
            self.add_move(MoveKind::PawnSimple, src, dst)?;
        }
        Ok(())
    }

    unsafe fn do_gen_pawn_single<const IS_PROMOTE: bool>(
        &mut self,
        pawns: Bitboard,
    ) -> Result<(), P::Err> {
        for dst in pawns::advance_forward(C::COLOR, pawns) & !self.board.all {
            self.add_pawn_with_promote::<IS_PROMOTE>(
                dst.add_unchecked(-geometry::pawn_forward_delta(C::COLOR)),
                dst,
            )?;
        }
        Ok(())
    }

    unsafe fn do_gen_pawn_double(&mut self, pawns: Bitboard) -> Result<(), P::Err> {
        let tmp = pawns::advance_forward(C::COLOR, pawns) & !self.board.all;
        for dst in pawns::advance_forward(C::COLOR, tmp) & !self.board.all {
            let src = dst.add_unchecked(-2 * geometry::pawn_forward_delta(C::COLOR));
            self.add_move(MoveKind::PawnDouble, src, dst)?;
        }
        Ok(())
    }

    unsafe fn do_gen_pawn_capture<const IS_PROMOTE: bool>(
        &mut self,
        pawns: Bitboard,
    ) -> Result<(), P::Err> {
        let allowed = self.board.color(C::COLOR.inv());
        let left_delta = geometry::pawn_left_delta(C::COLOR);
        for dst in pawns::advance_left(C::COLOR, pawns) & allowed {
            self.add_pawn_with_promote::<IS_PROMOTE>(dst.add_unchecked(-left_delta), dst)?;
        }
        let right_delta = geometry::pawn_right_delta(C::COLOR);
        for dst in pawns::advance_right(C::COLOR, pawns) & allowed {
            self.add_pawn_with_promote::<IS_PROMOTE>(dst.add_unchecked(-right_delta), dst)?;
        }
        Ok(())
    }

    fn gen_pawn_simple<const NON_PROMOTE: bool, const PROMOTE: bool>(
        &mut self,
    ) -> Result<(), P::Err> {
        let promote_mask = masks::rank(geometry::promote_src_rank(C::COLOR));
        let double_mask = masks::rank(geometry::double_move_src_rank(C::COLOR));
        let pawns = self.board.piece2(C::COLOR, Piece::Pawn);
        if NON_PROMOTE {
            unsafe {
                self.do_gen_pawn_single::<false>(pawns & !promote_mask)?;
                self.do_gen_pawn_double(pawns & double_mask)?;
            }
        }
        if PROMOTE {
            unsafe {
                self.do_gen_pawn_single::<true>(pawns & promote_mask)?;
            }
        }
        Ok(())
    }

    fn gen_pawn_capture(&mut self) -> Result<(), P::Err> {
        let promote_mask = masks::rank(geometry::promote_src_rank(C::COLOR));
        let pawns = self.board.piece2(C::COLOR, Piece::Pawn);
        unsafe {
            self.do_gen_pawn_capture::<false>(pawns & !promote_mask)?;
            self.do_gen_pawn_capture::<true>(pawns & promote_mask)?;
        }
        Ok(())
    }

    fn gen_pawn_enpassant(&mut self) -> Result<(), P::Err> {
        if let Some(target) = self.board.r.ep_target {
            // Capturing pawns stand beside the victim, one step behind the target
            let victim = unsafe { target.add_unchecked(-geometry::pawn_forward_delta(C::COLOR)) };
            let file = victim.file();
            let pawn = Cell::from_parts(C::COLOR, Piece::Pawn);
            let (left_pawn, right_pawn) =
                unsafe { (victim.add_unchecked(-1), victim.add_unchecked(1)) };
            if file != File::A && self.board.get(left_pawn) == pawn {
                unsafe {
                    self.add_move(MoveKind::Enpassant, left_pawn, target)?;
                }
            }
            if file != File::H && self.board.get(right_pawn) == pawn {
                unsafe {
                    self.add_move(MoveKind::Enpassant, right_pawn, target)?;
                }
            }
        }
        Ok(())
    }

    fn allowed_mask<const SIMPLE: bool, const CAPTURE: bool>(&self) -> Bitboard {
        match (SIMPLE, CAPTURE) {
            (true, true) => !self.board.color(C::COLOR),
            (true, false) => !self.board.all,
            (false, true) => self.board.color(C::COLOR.inv()),
            (false, false) => Bitboard::EMPTY,
        }
    }

    #[inline]
    fn do_gen_kn<const SIMPLE: bool, const CAPTURE: bool>(
        &mut self,
        p: Piece,
    ) -> Result<(), P::Err> {
        let allowed = self.allowed_mask::<SIMPLE, CAPTURE>();
        for src in self.board.piece2(C::COLOR, p) {
            let attack = match p {
                Piece::Knight => self.board.rays().knight(src),
                Piece::King => self.board.rays().king(src),
                _ => unreachable!(),
            };
            for dst in attack & allowed {
                unsafe {
                    self.add_move(MoveKind::Simple, src, dst)?;
                }
            }
        }
        Ok(())
    }

    fn gen_knight<const SIMPLE: bool, const CAPTURE: bool>(&mut self) -> Result<(), P::Err> {
        self.do_gen_kn::<SIMPLE, CAPTURE>(Piece::Knight)
    }

    fn gen_king<const SIMPLE: bool, const CAPTURE: bool>(&mut self) -> Result<(), P::Err> {
        self.do_gen_kn::<SIMPLE, CAPTURE>(Piece::King)
    }

    #[inline]
    fn do_gen_brq<const SIMPLE: bool, const CAPTURE: bool, const IS_DIAG: bool>(
        &mut self,
        b: Bitboard,
    ) -> Result<(), P::Err> {
        let allowed = self.allowed_mask::<SIMPLE, CAPTURE>();
        for src in b {
            let attack = match IS_DIAG {
                true => self.board.rays().diag_attacks(src, self.board.all),
                false => self.board.rays().line_attacks(src, self.board.all),
            };
            for dst in attack & allowed {
                unsafe {
                    self.add_move(MoveKind::Simple, src, dst)?;
                }
            }
        }
        Ok(())
    }

    fn gen_brq<const SIMPLE: bool, const CAPTURE: bool>(&mut self) -> Result<(), P::Err> {
        self.do_gen_brq::<SIMPLE, CAPTURE, true>(self.board.piece_diag(C::COLOR))?;
        self.do_gen_brq::<SIMPLE, CAPTURE, false>(self.board.piece_line(C::COLOR))?;
        Ok(())
    }

    fn gen_castling(&mut self) -> Result<(), P::Err> {
        let rank = geometry::castling_rank(C::COLOR);
        if self.board.r.castling.has(C::COLOR, CastlingSide::King) {
            let pass = castling::pass(C::COLOR, CastlingSide::King);
            let src = Square::from_parts(File::E, rank);
            let tmp = Square::from_parts(File::F, rank);
            let dst = Square::from_parts(File::G, rank);
            if (pass & self.board.all).is_empty()
                && !crate::safety::is_attacked(self.board, src, C::COLOR.inv())
                && !crate::safety::is_attacked(self.board, tmp, C::COLOR.inv())
            {
                unsafe {
                    self.add_move(MoveKind::CastlingKingside, src, dst)?;
                }
            }
        }
        if self.board.r.castling.has(C::COLOR, CastlingSide::Queen) {
            let pass = castling::pass(C::COLOR, CastlingSide::Queen);
            let src = Square::from_parts(File::E, rank);
            let tmp = Square::from_parts(File::D, rank);
            let dst = Square::from_parts(File::C, rank);
            if (pass & self.board.all).is_empty()
                && !crate::safety::is_attacked(self.board, src, C::COLOR.inv())
                && !crate::safety::is_attacked(self.board, tmp, C::COLOR.inv())
            {
                unsafe {
                    self.add_move(MoveKind::CastlingQueenside, src, dst)?;
                }
            }
        }
        Ok(())
    }

    fn gen<const SIMPLE: bool, const CAPTURE: bool, const SIMPLE_PROMOTE: bool, const CASTLING: bool>(
        &mut self,
    ) -> Result<(), P::Err> {
        if SIMPLE || SIMPLE_PROMOTE {
            self.gen_pawn_simple::<SIMPLE, SIMPLE_PROMOTE>()?;
        }
        if CAPTURE {
            self.gen_pawn_capture()?;
            self.gen_pawn_enpassant()?;
        }
        self.gen_knight::<SIMPLE, CAPTURE>()?;
        self.gen_king::<SIMPLE, CAPTURE>()?;
        self.gen_brq::<SIMPLE, CAPTURE>()?;
        if CASTLING {
            self.gen_castling()?;
        }
        Ok(())
    }

    fn gen_all_for_detect(&mut self) -> Result<(), P::Err> {
        self.gen_king::<true, true>()?;
        self.gen_brq::<true, true>()?;
        self.gen_knight::<true, true>()?;
        self.gen_pawn_simple::<true, true>()?;
        self.gen_pawn_capture()?;
        self.gen_pawn_enpassant()?;
        // Castlings are intentionally skipped here, as there is no position
        // where castling is the only legal move
        Ok(())
    }

    fn gen_all(&mut self) -> Result<(), P::Err> {
        self.gen::<true, true, true, true>()
    }

    fn gen_capture(&mut self) -> Result<(), P::Err> {
        self.gen::<false, true, false, false>()
    }
}

/// Semi-legal move generation
///
/// The generated moves are valid by the rules of chess, except that the king may be
/// left under attack. Filter them through [`legal`] or validate each one before use.
pub mod semilegal {
    use super::{MoveGenImpl, MoveList, MovePush, UnsafeMoveList};
    use crate::{board::Board, generic, types::Color};

    macro_rules! do_impl {
        ($($(#[$attr:meta])* $name:ident; $(#[$attr_into:meta])* $name_into:ident;)*) => {
            $(
                $(#[$attr_into])*
                pub fn $name_into<P: MovePush>(b: &Board, dst: &mut P) {
                    let _ = match b.r.side {
                        Color::White => MoveGenImpl::new(b, dst, generic::White).$name(),
                        Color::Black => MoveGenImpl::new(b, dst, generic::Black).$name(),
                    };
                }

                $(#[$attr])*
                pub fn $name(b: &Board) -> MoveList {
                    let mut res = unsafe { UnsafeMoveList::new() };
                    $name_into(b, &mut res);
                    res.0
                }
            )*
        }
    }

    do_impl! {
        /// Generates all the semi-legal moves
        gen_all;
        /// Generates all the semi-legal moves into `dst`
        gen_all_into;

        /// Generates the semi-legal captures, including en passant
        gen_capture;
        /// Generates the semi-legal captures into `dst`
        gen_capture_into;
    }
}

/// Legal move generation
pub mod legal {
    use super::MoveList;
    use crate::board::Board;
    use crate::safety::Checker;

    macro_rules! do_impl {
        ($($(#[$attr:meta])* $name:ident;)*) => {
            $(
                $(#[$attr])*
                pub fn $name(b: &Board) -> MoveList {
                    let mut res = super::semilegal::$name(b);
                    let checker = Checker::new(b);
                    res.retain(|&mut mv| checker.is_legal(mv));
                    res
                }
            )*
        }
    }

    do_impl! {
        /// Generates all the legal moves
        gen_all;
        /// Generates the legal captures, including en passant
        gen_capture;
    }
}

struct ErrOnFirst;

impl MaybeMovePush for ErrOnFirst {
    type Err = ();

    fn push(&mut self, _mv: Move) -> Result<(), ()> {
        Err(())
    }
}

/// Returns `true` if the side to move has at least one legal move
pub fn has_legal_moves(b: &Board) -> bool {
    let mut err_on_first = ErrOnFirst;
    let mut p = unsafe { LegalFilter::new(b, &mut err_on_first) };
    (match b.r.side {
        Color::White => MoveGenImpl::new(b, &mut p, generic::White).gen_all_for_detect(),
        Color::Black => MoveGenImpl::new(b, &mut p, generic::Black).gen_all_for_detect(),
    })
    .is_err()
}

/// Counts the leaf nodes of the move tree of the given depth
///
/// Every node is reached by applying a semi-legal move and verifying that the king was
/// not left under attack, so perft exercises generation, application and undo at once.
pub fn perft(b: &mut Board, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }
    let list = semilegal::gen_all(b);
    let mut total = 0;
    for &mv in &list {
        let u = unsafe { moves::make_move_unchecked(b, mv) };
        if !b.is_opponent_king_attacked() {
            total += match depth {
                1 => 1,
                _ => perft(b, depth - 1),
            };
        }
        unsafe { moves::unmake_move_unchecked(b, mv, u) };
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use std::collections::BTreeSet;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn test_initial_moves() {
        let b = Board::initial();
        let moves = legal::gen_all(&b);
        assert_eq!(moves.len(), 20);
        assert_eq!(legal::gen_capture(&b).len(), 0);
        assert!(has_legal_moves(&b));

        // The list iterates both by reference and by value
        let owned: Vec<_> = legal::gen_all(&b).into_iter().collect();
        assert_eq!(owned.len(), moves.len());
    }

    #[test]
    fn test_kiwipete_moves() {
        let b = Board::from_fen(KIWIPETE).unwrap();
        let moves = legal::gen_all(&b);
        assert_eq!(moves.len(), 48);
        assert_eq!(legal::gen_capture(&b).len(), 8);

        let checks = moves
            .iter()
            .filter(|&&mv| b.make_move(mv).unwrap().is_check())
            .count();
        assert_eq!(checks, 0);

        let strs = moves.iter().map(ToString::to_string).collect::<BTreeSet<_>>();
        assert!(strs.contains("e1g1"));
        assert!(strs.contains("e1c1"));
        assert!(strs.contains("d5e6"));
        assert!(!strs.contains("e1e2"));
    }

    #[test]
    fn test_enpassant_gen() {
        let b = Board::from_fen("3K4/3p4/8/3PpP2/8/5p2/6P1/2k5 w - e6 0 1").unwrap();
        let moves = legal::gen_all(&b);
        let strs = moves.iter().map(ToString::to_string).collect::<BTreeSet<_>>();
        // Both the d5 and the f5 pawn may capture on e6
        assert!(strs.contains("d5e6"));
        assert!(strs.contains("f5e6"));
    }

    #[test]
    fn test_no_moves() {
        let b = Board::from_fen("7K/8/5n2/5n2/8/8/7k/8 w - - 0 1").unwrap();
        assert!(!has_legal_moves(&b));
        assert!(legal::gen_all(&b).is_empty());
    }

    #[test]
    fn test_semilegal_vs_legal() {
        // The rook on e2 is pinned, its moves along the second rank are
        // semi-legal but not legal
        let b = Board::from_fen("4r2k/8/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        let semi = semilegal::gen_all(&b);
        let legal = legal::gen_all(&b);
        assert!(legal.len() < semi.len());
        for mv in &legal {
            assert!(semi.contains(mv));
        }
        let strs = legal.iter().map(ToString::to_string).collect::<BTreeSet<_>>();
        assert!(strs.contains("e2e5"));
        // Capturing the pinner is still a move along the pin ray
        assert!(strs.contains("e2e8"));
        assert!(!strs.contains("e2d2"));
        assert!(!strs.contains("e2a2"));
    }

    #[test]
    fn test_perft_initial() {
        let mut b = Board::initial();
        assert_eq!(perft(&mut b, 1), 20);
        assert_eq!(perft(&mut b, 2), 400);
        assert_eq!(perft(&mut b, 3), 8902);
        assert_eq!(perft(&mut b, 4), 197_281);
    }

    #[test]
    fn test_perft_kiwipete() {
        let mut b = Board::from_fen(KIWIPETE).unwrap();
        assert_eq!(perft(&mut b, 1), 48);
        assert_eq!(perft(&mut b, 2), 2039);
        assert_eq!(perft(&mut b, 3), 97_862);
    }

    #[test]
    fn test_perft_endgame() {
        let mut b = Board::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
        assert_eq!(perft(&mut b, 1), 14);
        assert_eq!(perft(&mut b, 2), 191);
        assert_eq!(perft(&mut b, 3), 2812);
        assert_eq!(perft(&mut b, 4), 43_238);
    }

    #[test]
    fn test_perft_promotions() {
        let mut b =
            Board::from_fen("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1")
                .unwrap();
        assert_eq!(perft(&mut b, 1), 6);
        assert_eq!(perft(&mut b, 2), 264);
        assert_eq!(perft(&mut b, 3), 9467);
    }

    #[test]
    fn test_perft_talkchess() {
        let mut b =
            Board::from_fen("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8").unwrap();
        assert_eq!(perft(&mut b, 1), 44);
        assert_eq!(perft(&mut b, 2), 1486);
        assert_eq!(perft(&mut b, 3), 62_379);
    }

    #[test]
    fn test_perft_midgame() {
        let mut b =
            Board::from_fen("r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10")
                .unwrap();
        assert_eq!(perft(&mut b, 1), 46);
        assert_eq!(perft(&mut b, 2), 2079);
        assert_eq!(perft(&mut b, 3), 89_890);
    }
}
