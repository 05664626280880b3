//! Ring positions.

use crate::hash::hash64;
use std::fmt;

/// A 64-bit position on the hash ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Token(pub u64);

impl Token {
    /// Position of arbitrary key material on the ring.
    #[inline]
    pub fn of(material: impl AsRef<[u8]>) -> Self {
        Token(hash64(material))
    }

    /// Clockwise distance from `self` to `other`, wrapping past `u64::MAX`.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> u64 {
        other.0.wrapping_sub(self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_forward() {
        assert_eq!(Token(100).distance_to(&Token(200)), 100);
    }

    #[test]
    fn test_distance_wraps() {
        assert_eq!(Token(u64::MAX).distance_to(&Token(0)), 1);
        assert_eq!(Token(200).distance_to(&Token(100)), u64::MAX - 99);
    }

    #[test]
    fn test_display_is_fixed_width_hex() {
        assert_eq!(Token(255).to_string(), "00000000000000ff");
    }
}
