//! Attack probes, check and pin detection.

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::geometry;
use crate::moves::{Move, MoveKind};
use crate::rays::Ray;
use crate::types::{Color, Piece, Square};

use arrayvec::ArrayVec;

/// Attack probe with an explicit occupancy, so callers can ask "would `sq` be
/// attacked if the pieces stood like this" without touching the board.
///
/// Pieces standing on squares outside `occupied` still count as attackers; mask
/// them out of the probe explicitly if they are supposed to be captured.
fn attacked_with(b: &Board, sq: Square, by: Color, occupied: Bitboard) -> bool {
    let rays = b.rays();

    // Near attacks first: they only need a table lookup
    if (rays.pawn(by.inv(), sq) & b.piece2(by, Piece::Pawn)).is_nonempty()
        || (rays.king(sq) & b.piece2(by, Piece::King)).is_nonempty()
        || (rays.knight(sq) & b.piece2(by, Piece::Knight)).is_nonempty()
    {
        return true;
    }

    // Far attacks: cast rays from the probed square
    (rays.diag_attacks(sq, occupied) & b.piece_diag(by)).is_nonempty()
        || (rays.line_attacks(sq, occupied) & b.piece_line(by)).is_nonempty()
}

/// Returns `true` if the square `sq` is attacked by any piece of color `by`
#[inline]
pub fn is_attacked(b: &Board, sq: Square, by: Color) -> bool {
    attacked_with(b, sq, by, b.all)
}

/// Returns all the pieces of color `by` which attack the square `sq`
pub fn attackers(b: &Board, sq: Square, by: Color) -> Bitboard {
    let rays = b.rays();
    (rays.pawn(by.inv(), sq) & b.piece2(by, Piece::Pawn))
        | (rays.king(sq) & b.piece2(by, Piece::King))
        | (rays.knight(sq) & b.piece2(by, Piece::Knight))
        | (rays.diag_attacks(sq, b.all) & b.piece_diag(by))
        | (rays.line_attacks(sq, b.all) & b.piece_line(by))
}

/// Returns all the pieces which give check to the king of color `c`
#[inline]
pub fn checkers(b: &Board, c: Color) -> Bitboard {
    attackers(b, b.king_pos(c), c.inv())
}

/// Returns the pieces of color `c` pinned to their king, along with the ray
/// from the king towards the pinning piece
///
/// A piece is pinned if it is the only one standing between its king and an
/// opposing slider moving along the ray. At most eight pieces can be pinned
/// at once, one per ray.
pub fn pinned(b: &Board, c: Color) -> ArrayVec<(Square, Ray), 8> {
    let rays = b.rays();
    let king = b.king_pos(c);
    let ours = b.color(c);
    let opp = c.inv();
    let mut res = ArrayVec::new();
    for ray in Ray::iter() {
        let sliders = if ray.is_diagonal() {
            b.piece_diag(opp)
        } else {
            b.piece_line(opp)
        };
        if (rays.ray_attacks(king, ray) & sliders).is_empty() {
            continue;
        }
        let Some(blocker) = rays.cast(king, ray, b.all) else {
            continue;
        };
        if !ours.has(blocker) {
            continue;
        }
        if let Some(attacker) = rays.cast(king, ray, b.all.without(blocker)) {
            if sliders.has(attacker) {
                res.push((blocker, ray));
            }
        }
    }
    res
}

/// Legality filter for semi-legal moves.
///
/// Built once per position, then asked about each candidate move. Moves which
/// cannot possibly expose the king are accepted via a collinearity fast path;
/// everything else goes through a full attack scan over the would-be occupancy.
pub(crate) struct Checker<'a> {
    b: &'a Board,
    king: Square,
    in_check: bool,
}

impl<'a> Checker<'a> {
    pub fn new(b: &'a Board) -> Self {
        let king = b.king_pos(b.side());
        Checker {
            b,
            king,
            in_check: is_attacked(b, king, b.side().inv()),
        }
    }

    /// Returns `true` if the semi-legal move `mv` leaves the king safe
    pub fn is_legal(&self, mv: Move) -> bool {
        let b = self.b;

        if mv.src() == self.king {
            // King moves, including castling: probe the destination with the
            // king lifted off its square. The transit squares for castling are
            // verified during semi-legality checks.
            let occupied = b.all ^ Bitboard::from_square(self.king);
            return !attacked_with(b, mv.dst(), b.side().inv(), occupied);
        }

        // A piece which is not aligned with its king cannot expose it by
        // moving, unless the position is already a check. En passant also
        // removes the victim pawn, so it never takes the fast path.
        if !self.in_check
            && mv.kind() != MoveKind::Enpassant
            && b.rays().ray_between(self.king, mv.src()).is_none()
        {
            return true;
        }

        self.is_legal_slow(mv)
    }

    fn is_legal_slow(&self, mv: Move) -> bool {
        let b = self.b;
        let rays = b.rays();
        let side = b.side();
        let opp = side.inv();

        let src_bb = Bitboard::from_square(mv.src());
        let dst_bb = Bitboard::from_square(mv.dst());
        let mut occupied = (b.all ^ src_bb) | dst_bb;
        let mut captured = dst_bb;
        if mv.kind() == MoveKind::Enpassant {
            let victim =
                Bitboard::from_square(mv.dst().add(-geometry::pawn_forward_delta(side)));
            occupied ^= victim;
            captured |= victim;
        }

        if (rays.pawn(side, self.king) & b.piece2(opp, Piece::Pawn) & !captured).is_nonempty()
            || (rays.knight(self.king) & b.piece2(opp, Piece::Knight) & !captured).is_nonempty()
        {
            return false;
        }
        (rays.diag_attacks(self.king, occupied) & b.piece_diag(opp) & !captured).is_empty()
            && (rays.line_attacks(self.king, occupied) & b.piece_line(opp) & !captured).is_empty()
    }
}
