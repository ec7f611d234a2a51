//! Precomputed ray geometry.
//!
//! [`Rays`] is a plain value holding every table the rest of the crate needs
//! to reason about lines of attack: the squares along each of the eight rays
//! from each origin, attack masks for knights, kings and pawns, and the
//! direction/between tables for any pair of squares. Boards hold the tables
//! behind an [`Arc`], so cloning a board never rebuilds them.

use crate::bitboard::Bitboard;
use crate::types::{Color, Square};

use std::array;
use std::sync::{Arc, OnceLock};

use arrayvec::ArrayVec;

/// One of the eight ray directions, named from White's point of view.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Ray {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Ray {
    pub const COUNT: usize = 8;

    const ALL: [Ray; 8] = [
        Ray::North,
        Ray::NorthEast,
        Ray::East,
        Ray::SouthEast,
        Ray::South,
        Ray::SouthWest,
        Ray::West,
        Ray::NorthWest,
    ];

    pub const DIAGONAL: [Ray; 4] = [
        Ray::NorthEast,
        Ray::SouthEast,
        Ray::SouthWest,
        Ray::NorthWest,
    ];

    pub const ORTHOGONAL: [Ray; 4] = [Ray::North, Ray::East, Ray::South, Ray::West];

    pub const fn index(&self) -> usize {
        *self as u8 as usize
    }

    /// Square index delta of one step along the ray.
    pub const fn offset(&self) -> isize {
        match *self {
            Ray::North => 8,
            Ray::NorthEast => 9,
            Ray::East => 1,
            Ray::SouthEast => -7,
            Ray::South => -8,
            Ray::SouthWest => -9,
            Ray::West => -1,
            Ray::NorthWest => 7,
        }
    }

    /// One step along the ray as `(file delta, rank delta)`.
    pub const fn step(&self) -> (isize, isize) {
        match *self {
            Ray::North => (0, 1),
            Ray::NorthEast => (1, 1),
            Ray::East => (1, 0),
            Ray::SouthEast => (1, -1),
            Ray::South => (0, -1),
            Ray::SouthWest => (-1, -1),
            Ray::West => (-1, 0),
            Ray::NorthWest => (-1, 1),
        }
    }

    pub const fn is_diagonal(&self) -> bool {
        matches!(
            *self,
            Ray::NorthEast | Ray::SouthEast | Ray::SouthWest | Ray::NorthWest
        )
    }

    /// `true` if square indices grow along the ray.
    pub const fn is_positive(&self) -> bool {
        self.offset() > 0
    }

    pub const fn opposite(&self) -> Ray {
        match *self {
            Ray::North => Ray::South,
            Ray::NorthEast => Ray::SouthWest,
            Ray::East => Ray::West,
            Ray::SouthEast => Ray::NorthWest,
            Ray::South => Ray::North,
            Ray::SouthWest => Ray::NorthEast,
            Ray::West => Ray::East,
            Ray::NorthWest => Ray::SouthEast,
        }
    }

    pub fn iter() -> impl Iterator<Item = Ray> {
        Self::ALL.into_iter()
    }
}

/// Who owns the piece found by [`Rays::first_occupied`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    Ours,
    Theirs,
}

/// First occupied square along a ray.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RayHit {
    pub square: Square,
    pub owner: Owner,
    /// Number of steps from the origin, at least 1.
    pub distance: usize,
}

/// Immutable geometry tables. Build once with [`Rays::new`] or share the
/// process-wide copy via [`Rays::standard`].
pub struct Rays {
    lists: Box<[[ArrayVec<Square, 7>; Ray::COUNT]; 64]>,
    attacks: Box<[[Bitboard; Ray::COUNT]; 64]>,
    dir: Box<[[Option<Ray>; 64]; 64]>,
    between: Box<[[Bitboard; 64]; 64]>,
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    pawn: [[Bitboard; 64]; 2],
}

fn near_attacks(deltas: &[(isize, isize)]) -> [Bitboard; 64] {
    array::from_fn(|idx| {
        let origin = Square::from_index(idx);
        let mut bb = Bitboard::EMPTY;
        for &(df, dr) in deltas {
            if let Some(sq) = origin.try_shift(df, dr) {
                bb.set(sq);
            }
        }
        bb
    })
}

impl Rays {
    pub fn new() -> Rays {
        let mut lists: Box<[[ArrayVec<Square, 7>; Ray::COUNT]; 64]> =
            Box::new(array::from_fn(|_| array::from_fn(|_| ArrayVec::new())));
        let mut attacks = Box::new([[Bitboard::EMPTY; Ray::COUNT]; 64]);
        let mut dir = Box::new([[None; 64]; 64]);
        let mut between = Box::new([[Bitboard::EMPTY; 64]; 64]);

        for idx in 0..64 {
            let origin = Square::from_index(idx);
            for ray in Ray::iter() {
                let (df, dr) = ray.step();
                let mut cur = origin;
                let mut passed = Bitboard::EMPTY;
                while let Some(next) = cur.try_shift(df, dr) {
                    lists[idx][ray.index()].push(next);
                    attacks[idx][ray.index()].set(next);
                    dir[idx][next.index()] = Some(ray);
                    between[idx][next.index()] = passed;
                    passed.set(next);
                    cur = next;
                }
            }
        }

        const KNIGHT_DELTAS: [(isize, isize); 8] = [
            (-2, -1),
            (-2, 1),
            (-1, -2),
            (-1, 2),
            (1, -2),
            (1, 2),
            (2, -1),
            (2, 1),
        ];
        const KING_DELTAS: [(isize, isize); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];

        Rays {
            lists,
            attacks,
            dir,
            between,
            knight: near_attacks(&KNIGHT_DELTAS),
            king: near_attacks(&KING_DELTAS),
            pawn: [
                near_attacks(&[(-1, 1), (1, 1)]),
                near_attacks(&[(-1, -1), (1, -1)]),
            ],
        }
    }

    /// Process-wide shared instance for the standard 8x8 geometry.
    pub fn standard() -> Arc<Rays> {
        static INSTANCE: OnceLock<Arc<Rays>> = OnceLock::new();
        INSTANCE.get_or_init(|| Arc::new(Rays::new())).clone()
    }

    /// Squares along `ray` from `origin` in walking order, origin excluded.
    #[inline]
    pub fn squares_along(&self, origin: Square, ray: Ray) -> &[Square] {
        &self.lists[origin.index()][ray.index()]
    }

    /// All squares along `ray` from `origin` as a bitboard.
    #[inline]
    pub fn ray_attacks(&self, origin: Square, ray: Ray) -> Bitboard {
        unsafe {
            *self
                .attacks
                .get_unchecked(origin.index())
                .get_unchecked(ray.index())
        }
    }

    /// First occupied square along `ray` from `origin`, without walking:
    /// intersect the ray mask with the occupancy and pick the bit nearest
    /// to the origin.
    #[inline]
    pub fn cast(&self, origin: Square, ray: Ray, occupied: Bitboard) -> Option<Square> {
        let hits = self.ray_attacks(origin, ray) & occupied;
        if ray.is_positive() {
            hits.first()
        } else {
            hits.last()
        }
    }

    /// Like [`Rays::cast`], but also classifies the hit against `ours` and
    /// reports the distance from the origin.
    pub fn first_occupied(
        &self,
        origin: Square,
        ray: Ray,
        occupied: Bitboard,
        ours: Bitboard,
    ) -> Option<RayHit> {
        let square = self.cast(origin, ray, occupied)?;
        let owner = if ours.has(square) {
            Owner::Ours
        } else {
            Owner::Theirs
        };
        let distance = origin
            .file()
            .index()
            .abs_diff(square.file().index())
            .max(origin.rank().index().abs_diff(square.rank().index()));
        Some(RayHit {
            square,
            owner,
            distance,
        })
    }

    /// Direction from `src` to `dst`, or `None` if the squares are not on a
    /// common rank, file or diagonal (or are equal).
    #[inline]
    pub fn ray_between(&self, src: Square, dst: Square) -> Option<Ray> {
        unsafe {
            *self
                .dir
                .get_unchecked(src.index())
                .get_unchecked(dst.index())
        }
    }

    /// Squares strictly between `src` and `dst`; empty if the squares are
    /// not aligned.
    #[inline]
    pub fn between(&self, src: Square, dst: Square) -> Bitboard {
        unsafe {
            *self
                .between
                .get_unchecked(src.index())
                .get_unchecked(dst.index())
        }
    }

    /// Bishop-style attacks from `sq` with the given occupancy.
    pub fn diag_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.slider_attacks(sq, occupied, &Ray::DIAGONAL)
    }

    /// Rook-style attacks from `sq` with the given occupancy.
    pub fn line_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.slider_attacks(sq, occupied, &Ray::ORTHOGONAL)
    }

    fn slider_attacks(&self, sq: Square, occupied: Bitboard, rays: &[Ray; 4]) -> Bitboard {
        let mut res = Bitboard::EMPTY;
        for &ray in rays {
            let mut att = self.ray_attacks(sq, ray);
            if let Some(blocker) = self.cast(sq, ray, occupied) {
                // The blocker ray is a subset of the origin ray, so xor
                // strips everything beyond the blocker.
                att ^= self.ray_attacks(blocker, ray);
            }
            res |= att;
        }
        res
    }

    #[inline]
    pub fn knight(&self, sq: Square) -> Bitboard {
        unsafe { *self.knight.get_unchecked(sq.index()) }
    }

    #[inline]
    pub fn king(&self, sq: Square) -> Bitboard {
        unsafe { *self.king.get_unchecked(sq.index()) }
    }

    /// Squares attacked by a pawn of color `c` standing on `sq`.
    #[inline]
    pub fn pawn(&self, c: Color, sq: Square) -> Bitboard {
        unsafe { *self.pawn.get_unchecked(c.index()).get_unchecked(sq.index()) }
    }
}

impl Default for Rays {
    fn default() -> Rays {
        Rays::new()
    }
}
