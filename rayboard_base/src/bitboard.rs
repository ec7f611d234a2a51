use crate::types::Square;
use derive_more::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};
use std::fmt;
use std::iter::IntoIterator;

const FILE_A: u64 = 0x0101010101010101;
const FILE_H: u64 = 0x8080808080808080;

/// Set of squares, one bit per square. Bit `i` corresponds to the square with
/// index `i`, so the low byte is the first rank. Plain `Copy` value, so a
/// speculative "what happens if I clear this square" scan never touches the
/// set it started from.
#[derive(
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    BitAnd,
    BitAndAssign,
    BitOr,
    BitOrAssign,
    BitXor,
    BitXorAssign,
    Not,
)]
pub struct Bitboard(u64);

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);

    pub const fn from_raw(val: u64) -> Bitboard {
        Bitboard(val)
    }

    pub const fn from_square(sq: Square) -> Bitboard {
        Bitboard(1_u64 << sq.index())
    }

    pub const fn with(self, sq: Square) -> Bitboard {
        Bitboard(self.0 | (1_u64 << sq.index()))
    }

    pub const fn without(self, sq: Square) -> Bitboard {
        Bitboard(self.0 & !(1_u64 << sq.index()))
    }

    pub const fn shl(self, by: usize) -> Bitboard {
        Bitboard(self.0 << by)
    }

    pub const fn shr(self, by: usize) -> Bitboard {
        Bitboard(self.0 >> by)
    }

    /// One square towards the eighth rank.
    pub const fn north(self) -> Bitboard {
        Bitboard(self.0 << 8)
    }

    /// One square towards the first rank.
    pub const fn south(self) -> Bitboard {
        Bitboard(self.0 >> 8)
    }

    /// One square towards the `h` file; squares on the `h` file fall off.
    pub const fn east(self) -> Bitboard {
        Bitboard((self.0 & !FILE_H) << 1)
    }

    /// One square towards the `a` file; squares on the `a` file fall off.
    pub const fn west(self) -> Bitboard {
        Bitboard((self.0 & !FILE_A) >> 1)
    }

    pub const fn north_east(self) -> Bitboard {
        Bitboard((self.0 & !FILE_H) << 9)
    }

    pub const fn north_west(self) -> Bitboard {
        Bitboard((self.0 & !FILE_A) << 7)
    }

    pub const fn south_east(self) -> Bitboard {
        Bitboard((self.0 & !FILE_H) >> 7)
    }

    pub const fn south_west(self) -> Bitboard {
        Bitboard((self.0 & !FILE_A) >> 9)
    }

    pub fn set(&mut self, sq: Square) {
        *self = self.with(sq);
    }

    pub fn unset(&mut self, sq: Square) {
        *self = self.without(sq);
    }

    pub const fn has(&self, sq: Square) -> bool {
        ((self.0 >> sq.index()) & 1) != 0
    }

    pub const fn as_raw(&self) -> u64 {
        self.0
    }

    pub const fn popcount(&self) -> u32 {
        self.0.count_ones()
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_nonempty(&self) -> bool {
        self.0 != 0
    }

    /// Lowest-index square in the set, if any.
    pub const fn first(&self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }
        Some(unsafe { Square::from_index_unchecked(self.0.trailing_zeros() as usize) })
    }

    /// Highest-index square in the set, if any.
    pub const fn last(&self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }
        Some(unsafe { Square::from_index_unchecked(63 - self.0.leading_zeros() as usize) })
    }
}

impl From<Bitboard> for u64 {
    fn from(b: Bitboard) -> u64 {
        b.0
    }
}

impl From<u64> for Bitboard {
    fn from(u: u64) -> Bitboard {
        Bitboard(u)
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Bitboard({})", self)
    }
}

impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        // Eighth rank first, `a` file leftmost in each group.
        let v = self.0.reverse_bits();
        write!(
            f,
            "{:08b}/{:08b}/{:08b}/{:08b}/{:08b}/{:08b}/{:08b}/{:08b}",
            v & 0xff,
            (v >> 8) & 0xff,
            (v >> 16) & 0xff,
            (v >> 24) & 0xff,
            (v >> 32) & 0xff,
            (v >> 40) & 0xff,
            (v >> 48) & 0xff,
            (v >> 56) & 0xff,
        )
    }
}

pub struct Iter(u64);

impl Iterator for Iter {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros();
        self.0 &= self.0.wrapping_sub(1_u64);
        unsafe { Some(Square::from_index_unchecked(bit as usize)) }
    }
}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        Iter(self.0)
    }
}
