//! Bitmask tools for working with patterns of channels
//!
//! Bits are dense channel indices (see `chan::ChannelMap`), not external
//! channel numbers: bit 0 is the first configured channel.

use bit_iter::BitIter;
use num_traits::{PrimInt, Unsigned};
use std::ops::{BitAndAssign, BitOrAssign, BitXorAssign};

/// Convert channel indices into a bitmask
pub fn indices_to_mask(idxs: &[usize]) -> u32 {
    let mut m = 0u32;
    for &i in idxs {
        m.set(i);
    }
    m
}

/// Returns all channel indices in mask
pub fn mask_to_indices(m: u32) -> Vec<usize> {
    BitIter::from(m).collect()
}

/// Coincidence order of a pattern: the number of channels that co-fired
#[inline(always)]
pub fn order(m: u32) -> usize {
    m.count_ones() as usize
}

/// Binary label of a pattern over `n` channels, highest index first,
/// e.g. `0101` for indices 0 and 2 of four channels.
pub fn pattern_label(m: u32, n: usize) -> String {
    format!("{:0width$b}", m, width = n)
}

/// Labels of all `2^n` patterns, in bucket order
pub fn pattern_labels(n: usize) -> Vec<String> {
    (0..1u64 << n).map(|m| pattern_label(m as u32, n)).collect()
}

/// Bitwise set/clear/toggle/check operations on unsigned masks
pub trait BitOps: PrimInt + BitAndAssign + BitOrAssign + BitXorAssign + Unsigned {
    fn set(&mut self, b: usize);
    fn clear(&mut self, b: usize);
    fn toggle(&mut self, b: usize);
    fn check(self, b: usize) -> bool;
}

macro_rules! impl_bit_ops {
    ($($t:ty),*) => {$(
        impl BitOps for $t {
            #[inline]
            fn set(&mut self, b: usize) {
                *self |= 1 << b;
            }

            #[inline]
            fn clear(&mut self, b: usize) {
                *self &= !(1 << b);
            }

            #[inline]
            fn toggle(&mut self, b: usize) {
                *self ^= 1 << b;
            }

            #[inline]
            fn check(self, b: usize) -> bool {
                self >> b & 1 == 1
            }
        }
    )*};
}

impl_bit_ops!(u16, u32, u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_masks() {
        assert_eq!(0b01, indices_to_mask(&[0]));
        assert_eq!(0b10, indices_to_mask(&[1]));
        assert_eq!(0b11, indices_to_mask(&[0, 1]));
        assert_eq!(0x8000_0000, indices_to_mask(&[31]));
    }

    #[test]
    fn bijective_index_masks() {
        // Exhaustively check all 16-bit patterns
        for pat in 0u32..=0xFFFF {
            let idxs = mask_to_indices(pat);
            assert_eq!(pat, indices_to_mask(&idxs));
            assert_eq!(order(pat), idxs.len());
        }
    }

    #[test]
    fn labels() {
        assert_eq!("0101", pattern_label(0b0101, 4));
        assert_eq!("000", pattern_label(0, 3));
        let all = pattern_labels(2);
        assert_eq!(all, vec!["00", "01", "10", "11"]);
    }

    #[test]
    fn bit_ops() {
        for &i in [u32::MIN, 1u32, 1337u32, u32::MAX].iter() {
            for b in 0..32 {
                let mut x = i;
                let i_set = i | 1 << b;
                let i_clr = i & !(1 << b);

                assert_eq!(i.check(b), i >> b & 1 == 1);
                x.set(b);
                assert_eq!(x, i_set);
                x.clear(b);
                assert_eq!(x, i_clr);
                x.toggle(b);
                assert_eq!(x, i_set);
            }
        }
    }
}
