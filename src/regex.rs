//! The bytes-level program: spans, capture sets and match iterators.

use crate::error::Result;
use crate::ffi::{self, EngineTable};
use crate::flags::Flags;
use crate::handle::{CaptureBuffer, IterHandle, Program};
use crate::names::CaptureNames;
use crate::options::Options;
use std::fmt;
use std::ops::{Index, Range};
use std::str::FromStr;
use std::sync::Arc;

/// Byte range of a match or of one capture group.
///
/// Offsets are byte offsets into the haystack, never character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<ffi::rure_match> for Span {
    fn from(m: ffi::rure_match) -> Self {
        Span {
            start: m.start,
            end: m.end,
        }
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.range()
    }
}

/// Group spans of one match, copied out of the engine's capture buffer.
///
/// Entry 0 is the whole match; an entry is `None` when its group did not
/// take part in the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSet {
    spans: Vec<Option<Span>>,
    names: Arc<CaptureNames>,
}

impl CaptureSet {
    pub(crate) fn new(spans: Vec<Option<Span>>, names: Arc<CaptureNames>) -> Self {
        CaptureSet { spans, names }
    }

    /// Number of groups, including group 0.
    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Span of group `index`, or `None` if it did not participate or does not exist.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Span> {
        self.spans.get(index).copied().flatten()
    }

    /// Span of the group called `name`.
    pub fn name(&self, name: &str) -> Option<Span> {
        self.get(self.names.index_of(name)?)
    }

    /// Span of the whole match.
    pub fn whole(&self) -> Option<Span> {
        self.get(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<Span>> + '_ {
        self.spans.iter().copied()
    }

    pub fn names(&self) -> &CaptureNames {
        &self.names
    }
}

impl Index<usize> for CaptureSet {
    type Output = Option<Span>;

    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    fn index(&self, index: usize) -> &Self::Output {
        &self.spans[index]
    }
}

/// A compiled pattern over byte haystacks.
///
/// Owns one engine program, released when the `Regex` is dropped. All
/// positions taken and returned are byte offsets; in unicode mode every
/// returned offset falls on a UTF-8 boundary.
///
/// # Example
///
/// ```
/// use rurex::Regex;
///
/// let re = Regex::new(r"\p{So}$")?;
/// let span = re.find("snowman: \u{2603}".as_bytes()).unwrap();
/// assert_eq!((span.start, span.end), (9, 12));
/// # Ok::<(), rurex::Error>(())
/// ```
pub struct Regex {
    program: Program,
    pattern: Vec<u8>,
    flags: Flags,
    options: Options,
}

impl Regex {
    /// Compiles `pattern` with [`Flags::DEFAULT`] and default options.
    pub fn new(pattern: impl AsRef<[u8]>) -> Result<Self> {
        Self::with_options(pattern, Flags::DEFAULT, &Options::default())
    }

    pub fn with_flags(pattern: impl AsRef<[u8]>, flags: Flags) -> Result<Self> {
        Self::with_options(pattern, flags, &Options::default())
    }

    pub fn with_options(pattern: impl AsRef<[u8]>, flags: Flags, options: &Options) -> Result<Self> {
        Self::with_engine(EngineTable::builtin(), pattern, flags, options)
    }

    /// Compiles `pattern` through an explicit engine table.
    pub fn with_engine(
        engine: &'static EngineTable,
        pattern: impl AsRef<[u8]>,
        flags: Flags,
        options: &Options,
    ) -> Result<Self> {
        let pattern = pattern.as_ref();
        let program = Program::compile(engine, pattern, flags, options)?;
        Ok(Regex {
            program,
            pattern: pattern.to_vec(),
            flags,
            options: options.clone(),
        })
    }

    pub(crate) fn engine(&self) -> &'static EngineTable {
        self.program.engine()
    }

    /// The pattern source this regex was compiled from.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pattern
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Names of all capture groups in index order; group 0 is always unnamed.
    pub fn capture_names(&self) -> &CaptureNames {
        self.program.names()
    }

    /// Index of the group called `name`, or `None` if there is none.
    ///
    /// Never returns `Some(0)`, since group 0 is always the unnamed whole match.
    pub fn capture_name_index(&self, name: &str) -> Option<usize> {
        self.program.names().index_of(name)
    }

    /// Number of groups, including group 0.
    pub fn captures_len(&self) -> usize {
        self.program.names().len()
    }

    /// Returns `true` if the pattern matches anywhere in `haystack`.
    ///
    /// Prefer this over [`Regex::find`] when only existence matters.
    pub fn is_match(&self, haystack: &[u8]) -> bool {
        self.is_match_at(haystack, 0)
    }

    /// Like [`Regex::is_match`], searching from byte offset `start`.
    ///
    /// A `start` past the end of `haystack` never matches.
    pub fn is_match_at(&self, haystack: &[u8], start: usize) -> bool {
        self.program.is_match(haystack, start)
    }

    /// Leftmost-first match in `haystack`.
    pub fn find(&self, haystack: &[u8]) -> Option<Span> {
        self.find_at(haystack, 0)
    }

    pub fn find_at(&self, haystack: &[u8], start: usize) -> Option<Span> {
        self.program.find(haystack, start)
    }

    /// Every group of the leftmost-first match in `haystack`.
    ///
    /// `Ok(None)` means there is no match. An error means the engine could
    /// not hand out a capture buffer.
    pub fn captures(&self, haystack: &[u8]) -> Result<Option<CaptureSet>> {
        self.captures_at(haystack, 0)
    }

    pub fn captures_at(&self, haystack: &[u8], start: usize) -> Result<Option<CaptureSet>> {
        self.program.captures(haystack, start)
    }

    /// End of the earliest point at which a match is certain.
    ///
    /// This may lie before the end of the match [`Regex::find`] reports.
    pub fn shortest_match(&self, haystack: &[u8]) -> Option<usize> {
        self.shortest_match_at(haystack, 0)
    }

    pub fn shortest_match_at(&self, haystack: &[u8], start: usize) -> Option<usize> {
        self.program.shortest_match(haystack, start)
    }

    /// Iterates over successive non-overlapping matches.
    ///
    /// Every call starts a fresh, independent sequence.
    pub fn find_iter<'r, 'h>(&'r self, haystack: &'h [u8]) -> Matches<'r, 'h> {
        let cursor = IterHandle::new(&self.program)
            .map_err(|err| log::error!("cannot start match iteration: {err}"))
            .ok();
        Matches { cursor, haystack }
    }

    /// Iterates over the groups of successive non-overlapping matches.
    ///
    /// The sequence has its own engine cursor; advancing it never moves a
    /// [`Matches`] sequence over the same haystack, and vice versa.
    pub fn captures_iter<'r, 'h>(&'r self, haystack: &'h [u8]) -> CaptureMatches<'r, 'h> {
        let state = IterHandle::new(&self.program)
            .and_then(|cursor| Ok((cursor, CaptureBuffer::new(&self.program)?)))
            .map_err(|err| log::error!("cannot start capture iteration: {err}"))
            .ok();
        CaptureMatches {
            state,
            haystack,
            names: self.program.names(),
        }
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Regex")
            .field("pattern", &String::from_utf8_lossy(&self.pattern))
            .field("flags", &self.flags)
            .finish()
    }
}

impl FromStr for Regex {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Regex::new(s)
    }
}

/// Iterator over successive whole-match spans, from [`Regex::find_iter`].
///
/// The engine cursor is released as soon as the sequence is exhausted, or
/// when the iterator is dropped part-way.
pub struct Matches<'r, 'h> {
    cursor: Option<IterHandle<'r>>,
    haystack: &'h [u8],
}

impl Iterator for Matches<'_, '_> {
    type Item = Span;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.cursor.as_mut()?.next_match(self.haystack);
        if next.is_none() {
            self.cursor = None;
        }
        next
    }
}

impl std::iter::FusedIterator for Matches<'_, '_> {}

/// Iterator over the groups of successive matches, from [`Regex::captures_iter`].
pub struct CaptureMatches<'r, 'h> {
    state: Option<(IterHandle<'r>, CaptureBuffer<'r>)>,
    haystack: &'h [u8],
    names: &'r Arc<CaptureNames>,
}

impl Iterator for CaptureMatches<'_, '_> {
    type Item = CaptureSet;

    fn next(&mut self) -> Option<Self::Item> {
        let (cursor, buffer) = self.state.as_mut()?;
        if cursor.next_captures(self.haystack, buffer) {
            // the buffer is overwritten by the next step, so copy it out now
            Some(buffer.snapshot(self.names))
        } else {
            self.state = None;
            None
        }
    }
}

impl std::iter::FusedIterator for CaptureMatches<'_, '_> {}
