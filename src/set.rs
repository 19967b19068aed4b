//! Matching many patterns in one pass.

use crate::error::Result;
use crate::ffi::EngineTable;
use crate::flags::Flags;
use crate::handle::SetProgram;
use crate::options::Options;
use std::fmt;

/// Patterns compiled jointly under one flag set.
///
/// A set answers which of its patterns match a haystack, scanning it once.
/// It never reports where they match.
///
/// # Example
///
/// ```
/// use rurex::RegexSet;
///
/// let set = RegexSet::new(["baz", "bar", "foo"])?;
/// assert!(set.is_match(b"foobar"));
/// assert_eq!(set.matches(b"foobar"), vec![false, true, true]);
/// # Ok::<(), rurex::Error>(())
/// ```
pub struct RegexSet {
    program: SetProgram,
    patterns: Vec<Vec<u8>>,
    flags: Flags,
}

impl RegexSet {
    /// Compiles `patterns` with [`Flags::DEFAULT`] and default options.
    ///
    /// Fails with [`Error::EmptySet`](crate::Error::EmptySet) if there are no
    /// patterns.
    pub fn new<I, P>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        Self::with_options(patterns, Flags::DEFAULT, &Options::default())
    }

    pub fn with_flags<I, P>(patterns: I, flags: Flags) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        Self::with_options(patterns, flags, &Options::default())
    }

    pub fn with_options<I, P>(patterns: I, flags: Flags, options: &Options) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        Self::with_engine(EngineTable::builtin(), patterns, flags, options)
    }

    /// Compiles `patterns` through an explicit engine table.
    pub fn with_engine<I, P>(engine: &'static EngineTable, patterns: I, flags: Flags, options: &Options) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let patterns: Vec<Vec<u8>> = patterns.into_iter().map(|p| p.as_ref().to_vec()).collect();
        let program = SetProgram::compile(engine, patterns.as_slice(), flags, options)?;
        Ok(RegexSet {
            program,
            patterns,
            flags,
        })
    }

    /// Number of patterns in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.program.len()
    }

    /// Always `false`: empty sets cannot be built.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn patterns(&self) -> &[Vec<u8>] {
        &self.patterns
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Returns `true` if any pattern matches `haystack`.
    pub fn is_match(&self, haystack: &[u8]) -> bool {
        self.is_match_at(haystack, 0)
    }

    pub fn is_match_at(&self, haystack: &[u8], start: usize) -> bool {
        self.program.is_match(haystack, start)
    }

    /// One flag per pattern, in the order the patterns were given, telling
    /// whether it matches `haystack`.
    pub fn matches(&self, haystack: &[u8]) -> Vec<bool> {
        self.matches_at(haystack, 0)
    }

    /// Like [`RegexSet::matches`], searching from byte offset `start`.
    ///
    /// A `start` past the end of `haystack` yields all `false`.
    pub fn matches_at(&self, haystack: &[u8], start: usize) -> Vec<bool> {
        self.program.matches(haystack, start)
    }

    /// Indices of the patterns that match `haystack`.
    pub fn matching(&self, haystack: &[u8]) -> impl Iterator<Item = usize> {
        self.matches(haystack)
            .into_iter()
            .enumerate()
            .filter_map(|(i, hit)| hit.then_some(i))
    }
}

impl fmt::Debug for RegexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<_> = self.patterns.iter().map(|p| String::from_utf8_lossy(p)).collect();
        f.debug_struct("RegexSet")
            .field("patterns", &patterns)
            .field("flags", &self.flags)
            .finish()
    }
}
