//! Flag types for rurex operations.
//!
//! Flag values are the engine's own bits (see [`crate::ffi`]), so
//! translation to the engine bitmask is the identity on `bits()`.

use bitflags::bitflags;

use crate::ffi;

bitflags! {
    /// Bitflags controlling how a pattern is compiled.
    ///
    /// [`Flags::DEFAULT`] (just [`Flags::UNICODE`]) is what every constructor
    /// uses unless flags are given explicitly. Explicit flags are taken as-is:
    /// leaving out `UNICODE` really does switch the engine to byte semantics.
    ///
    /// # Example
    ///
    /// ```
    /// use rurex::Flags;
    ///
    /// let flags = Flags::DEFAULT | Flags::CASEI | Flags::MULTI;
    /// assert!(flags.contains(Flags::UNICODE));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Case insensitive matching.
        const CASEI = ffi::RURE_FLAG_CASEI;

        /// `^` and `$` match at line boundaries.
        const MULTI = ffi::RURE_FLAG_MULTI;

        /// `.` matches `\n`.
        const DOTNL = ffi::RURE_FLAG_DOTNL;

        /// Swaps the meaning of greedy and lazy repetition.
        const SWAP_GREED = ffi::RURE_FLAG_SWAP_GREED;

        /// Extended mode: whitespace is ignored and `#` starts a comment.
        const SPACE = ffi::RURE_FLAG_SPACE;

        /// Unicode mode. Without it, classes like `.` and `\w` match bytes.
        const UNICODE = ffi::RURE_FLAG_UNICODE;

        /// Flags used when none are given.
        const DEFAULT = ffi::RURE_DEFAULT_FLAGS;
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::DEFAULT
    }
}

impl Flags {
    /// Returns the bitmask handed to the engine's compile entry points.
    #[inline]
    pub fn to_engine(self) -> u32 {
        self.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values_match_engine() {
        assert_eq!(Flags::CASEI.bits(), 1 << 0);
        assert_eq!(Flags::MULTI.bits(), 1 << 1);
        assert_eq!(Flags::DOTNL.bits(), 1 << 2);
        assert_eq!(Flags::SWAP_GREED.bits(), 1 << 3);
        assert_eq!(Flags::SPACE.bits(), 1 << 4);
        assert_eq!(Flags::UNICODE.bits(), 1 << 5);
    }

    #[test]
    fn test_default_is_unicode_only() {
        assert_eq!(Flags::default(), Flags::UNICODE);
        assert_eq!(Flags::DEFAULT.to_engine(), ffi::RURE_DEFAULT_FLAGS);
    }

    #[test]
    fn test_explicit_flags_are_taken_verbatim() {
        let flags = Flags::CASEI;
        assert!(!flags.contains(Flags::UNICODE));
        assert_eq!(flags.to_engine(), 1);
        assert_eq!(Flags::empty().to_engine(), 0);
    }
}
