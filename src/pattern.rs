//! Text patterns, anchored matching and the one-shot helpers.

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::ffi::EngineTable;
use crate::flags::Flags;
use crate::matched::{Match, Pending};
use crate::names::CaptureNames;
use crate::options::Options;
use crate::regex::{CaptureMatches, Matches, Regex, Span};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::str::FromStr;
use std::sync::Arc;

/// A compiled text pattern.
///
/// Wraps the program compiled from the pattern as written and, once an
/// anchored match at offset 0 has been requested, a second program with a
/// start-of-input anchor injected. Cloning is cheap and clones share both
/// programs; they are released when the last clone is dropped.
///
/// # Example
///
/// ```
/// use rurex::Pattern;
///
/// let date = Pattern::new(r"(?P<y>\d{4})-(?P<m>\d{2})")?;
/// let m = date.search("released 2024-03").unwrap();
/// assert_eq!(m.group("y")?, Some("2024"));
/// assert_eq!(m.span(0)?, (9, 16));
///
/// assert!(date.anchored_match("released 2024-03")?.is_none());
/// # Ok::<(), rurex::Error>(())
/// ```
#[derive(Clone)]
pub struct Pattern {
    inner: Arc<Inner>,
}

struct Inner {
    source: String,
    literal: Arc<Regex>,
    anchored: Mutex<Option<Anchored>>,
}

/// Cached program for anchored matching.
///
/// `injected` tells whether `regex` carries the injected `\A`; otherwise it
/// is the literal program, searched from an offset.
struct Anchored {
    injected: bool,
    regex: Arc<Regex>,
}

impl Pattern {
    /// Compiles `pattern` with [`Flags::DEFAULT`] and default options.
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_options(pattern, Flags::DEFAULT, &Options::default())
    }

    pub fn with_flags(pattern: &str, flags: Flags) -> Result<Self> {
        Self::with_options(pattern, flags, &Options::default())
    }

    pub fn with_options(pattern: &str, flags: Flags, options: &Options) -> Result<Self> {
        Self::with_engine(EngineTable::builtin(), pattern, flags, options)
    }

    /// Compiles a pattern given as bytes.
    ///
    /// Fails with [`Error::TypeMismatch`] before reaching the engine when
    /// `pattern` is not valid UTF-8; use [`Regex`] for byte patterns.
    pub fn from_bytes(pattern: &[u8], flags: Flags, options: &Options) -> Result<Self> {
        let pattern = std::str::from_utf8(pattern).map_err(|err| {
            Error::TypeMismatch(format!("pattern is not valid UTF-8 text: {err}"))
        })?;
        Self::with_options(pattern, flags, options)
    }

    /// Compiles `pattern` through an explicit engine table.
    pub fn with_engine(
        engine: &'static EngineTable,
        pattern: &str,
        flags: Flags,
        options: &Options,
    ) -> Result<Self> {
        let literal = Regex::with_engine(engine, pattern, flags, options)?;
        Ok(Pattern {
            inner: Arc::new(Inner {
                source: pattern.to_string(),
                literal: Arc::new(literal),
                anchored: Mutex::new(None),
            }),
        })
    }

    /// The pattern source text.
    pub fn pattern(&self) -> &str {
        &self.inner.source
    }

    pub fn flags(&self) -> Flags {
        self.inner.literal.flags()
    }

    pub fn options(&self) -> &Options {
        self.inner.literal.options()
    }

    /// Number of capture groups, not counting group 0.
    pub fn groups(&self) -> usize {
        self.inner.literal.captures_len().saturating_sub(1)
    }

    /// Maps every group name to its index.
    pub fn groupindex(&self) -> HashMap<&str, usize> {
        self.capture_names().named().map(|(index, name)| (name, index)).collect()
    }

    pub fn capture_names(&self) -> &CaptureNames {
        self.inner.literal.capture_names()
    }

    /// The underlying bytes-level program.
    pub fn as_regex(&self) -> &Regex {
        &self.inner.literal
    }

    /// Returns `true` if the pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.is_match_in(text, ..)
    }

    /// Like [`Pattern::is_match`], over the byte window `range` of `text`.
    ///
    /// The text is cut at the window end and the search starts at the window
    /// start. A window end that splits a character never matches.
    pub fn is_match_in(&self, text: &str, range: impl RangeBounds<usize>) -> bool {
        match window(text, range) {
            Some((haystack, pos)) => self.inner.literal.is_match_at(haystack.as_bytes(), pos),
            None => false,
        }
    }

    /// End of the earliest point in `text` at which a match is certain.
    pub fn shortest_match(&self, text: &str) -> Option<usize> {
        self.inner.literal.shortest_match(text.as_bytes())
    }

    /// Leftmost-first match anywhere in `text`.
    pub fn search<'h>(&self, text: &'h str) -> Option<Match<'h>> {
        self.search_in(text, ..)
    }

    /// Like [`Pattern::search`], over the byte window `range` of `text`.
    pub fn search_in<'h>(&self, text: &'h str, range: impl RangeBounds<usize>) -> Option<Match<'h>> {
        let (haystack, pos) = window(text, range)?;
        self.locate(&self.inner.literal, haystack, pos, pos, |_| true)
    }

    /// Match that begins exactly at the start of `text`.
    ///
    /// Fails only if the anchored program has to be compiled and the engine
    /// rejects it, for instance because it exceeds the size limit.
    pub fn anchored_match<'h>(&self, text: &'h str) -> Result<Option<Match<'h>>> {
        self.anchored_match_in(text, ..)
    }

    /// Match that begins exactly at the start of the byte window `range`.
    ///
    /// At offset 0 this runs a copy of the pattern with `\A` injected, which
    /// is compiled on first use and kept. At any other offset the pattern
    /// itself is searched from that offset and only a match starting there
    /// is accepted, since `\A` cannot match past the start of the input.
    pub fn anchored_match_in<'h>(
        &self,
        text: &'h str,
        range: impl RangeBounds<usize>,
    ) -> Result<Option<Match<'h>>> {
        let Some((haystack, pos)) = window(text, range) else {
            return Ok(None);
        };
        let regex = self.anchored_regex(pos == 0)?;
        Ok(self.locate(&regex, haystack, pos, pos, |span| span.start == pos))
    }

    /// Iterates over successive non-overlapping matches in `text`.
    pub fn finditer<'p, 'h>(&'p self, text: &'h str) -> FindIter<'p, 'h> {
        self.finditer_in(text, ..)
    }

    /// Like [`Pattern::finditer`], over the byte window `range` of `text`.
    ///
    /// Every [`Match`] reports the window through [`Match::pos`] and
    /// [`Match::endpos`]. An invalid window yields nothing.
    pub fn finditer_in<'p, 'h>(&'p self, text: &'h str, range: impl RangeBounds<usize>) -> FindIter<'p, 'h> {
        let Some((haystack, pos)) = window(text, range) else {
            return FindIter {
                pattern: self,
                haystack: "",
                pos: 0,
                steps: Steps::Done,
                ordinal: 0,
            };
        };
        let literal = &self.inner.literal;
        let steps = if pos > 0 {
            // engine cursors always start at offset 0
            Steps::From { at: pos, last_match: None }
        } else if self.options().get_submatches() {
            Steps::Captures(literal.captures_iter(haystack.as_bytes()))
        } else {
            Steps::Spans(literal.find_iter(haystack.as_bytes()))
        };
        FindIter {
            pattern: self,
            haystack,
            pos,
            steps,
            ordinal: 0,
        }
    }

    /// Texts of every match in `text`.
    ///
    /// Each entry holds the texts of groups 1 and up, `None` for a group
    /// that did not participate. When the pattern has no groups each entry
    /// holds the whole match instead.
    ///
    /// # Example
    ///
    /// ```
    /// let pairs = rurex::Pattern::new(r"(\w)=(\d)?")?;
    /// assert_eq!(pairs.findall("a=1 b=")?, vec![vec![Some("a"), Some("1")], vec![Some("b"), None]]);
    ///
    /// let words = rurex::Pattern::new(r"\w+")?;
    /// assert_eq!(words.findall("hi there")?, vec![vec![Some("hi")], vec![Some("there")]]);
    /// # Ok::<(), rurex::Error>(())
    /// ```
    pub fn findall<'h>(&self, text: &'h str) -> Result<Vec<Vec<Option<&'h str>>>> {
        self.findall_in(text, ..)
    }

    /// Like [`Pattern::findall`], over the byte window `range` of `text`.
    pub fn findall_in<'h>(&self, text: &'h str, range: impl RangeBounds<usize>) -> Result<Vec<Vec<Option<&'h str>>>> {
        let whole_only = self.groups() == 0;
        self.finditer_in(text, range)
            .map(|m| {
                if whole_only {
                    Ok(vec![Some(m.as_str()?)])
                } else {
                    m.groups()
                }
            })
            .collect()
    }

    /// Runs `regex` from `start` and wraps an accepted match of the window
    /// that begins at `pos`.
    ///
    /// Without a capture buffer an eager search degrades to a lazy one.
    fn locate<'h>(
        &self,
        regex: &Arc<Regex>,
        haystack: &'h str,
        pos: usize,
        start: usize,
        accept: impl Fn(Span) -> bool,
    ) -> Option<Match<'h>> {
        let bytes = haystack.as_bytes();
        let endpos = haystack.len();
        if self.options().get_submatches() {
            match regex.captures_at(bytes, start) {
                Ok(found) => {
                    let captures = found.filter(|captures| captures.whole().is_some_and(&accept))?;
                    return Match::resolved(self.clone(), Arc::clone(regex), haystack, pos, endpos, captures);
                }
                Err(err) => log::warn!("eager submatches unavailable, groups will be resolved on demand: {err}"),
            }
        }
        let whole = regex.find_at(bytes, start).filter(|span| accept(*span))?;
        Some(Match::new(
            self.clone(),
            Arc::clone(regex),
            haystack,
            pos,
            endpos,
            whole,
            Pending::Search { start },
        ))
    }

    /// Returns the program for anchored matching, rebuilding the cache when
    /// the requested mode differs from the cached one.
    fn anchored_regex(&self, injected: bool) -> Result<Arc<Regex>> {
        let mut cache = self.inner.anchored.lock();
        if let Some(cached) = cache.as_ref().filter(|cached| cached.injected == injected) {
            return Ok(Arc::clone(&cached.regex));
        }

        let regex = if injected {
            Arc::new(compile_anchored(&self.inner.literal, &self.inner.source)?)
        } else {
            log::debug!("anchored matching of {:?} switched to offset mode", self.inner.source);
            Arc::clone(&self.inner.literal)
        };
        *cache = Some(Anchored {
            injected,
            regex: Arc::clone(&regex),
        });
        Ok(regex)
    }
}

/// Compiles `source` behind a start-of-input anchor, with the flags and
/// options of `literal`.
///
/// Only a syntax error triggers the second attempt. `source` itself compiled,
/// so the wrapper broke it: the pattern ends inside an extended-mode `#`
/// comment that swallowed the closing parenthesis.
fn compile_anchored(literal: &Regex, source: &str) -> Result<Regex> {
    let compile = |anchored: String| {
        log::debug!("compiling anchored variant {anchored:?}");
        Regex::with_engine(literal.engine(), &anchored, literal.flags(), literal.options())
    };
    match compile(format!(r"\A(?:{source})")) {
        Err(Error::Syntax(_)) => compile(format!("\\A(?:{source}\n)")),
        compiled => compiled,
    }
}

/// Byte offset of the position after an empty match at `at`.
///
/// In unicode mode this skips the whole character at `at`.
fn after_empty(haystack: &str, at: usize, unicode: bool) -> usize {
    let width = haystack
        .get(at..)
        .filter(|_| unicode)
        .and_then(|rest| rest.chars().next())
        .map_or(1, char::len_utf8);
    at + width
}

/// Cuts `text` to the byte window `range`, returning the cut text and the
/// offset to search from.
///
/// The window end is clamped to the text length. Returns `None` when the
/// end splits a character or the start lies past the end.
fn window(text: &str, range: impl RangeBounds<usize>) -> Option<(&str, usize)> {
    let pos = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.checked_add(1)?,
        Bound::Unbounded => 0,
    };
    let endpos = match range.end_bound() {
        Bound::Included(&end) => end.saturating_add(1),
        Bound::Excluded(&end) => end,
        Bound::Unbounded => text.len(),
    }
    .min(text.len());
    let haystack = text.get(..endpos)?;
    (pos <= endpos).then_some((haystack, pos))
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("pattern", &self.inner.source)
            .field("flags", &self.flags())
            .finish()
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Pattern::new(s)
    }
}

enum Steps<'p, 'h> {
    Spans(Matches<'p, 'h>),
    Captures(CaptureMatches<'p, 'h>),
    /// Repeated searches from inside the haystack.
    From { at: usize, last_match: Option<usize> },
    Done,
}

/// Iterator over the matches of a [`Pattern`], from [`Pattern::finditer`].
///
/// Unless the pattern was compiled with [`Options::submatches`], only the
/// span of each match is taken from the engine; groups are resolved when a
/// [`Match`] is first asked for one.
pub struct FindIter<'p, 'h> {
    pattern: &'p Pattern,
    haystack: &'h str,
    pos: usize,
    steps: Steps<'p, 'h>,
    ordinal: usize,
}

impl<'h> FindIter<'_, 'h> {
    /// Next match of a search that resumes at `at`, stepping past empty
    /// matches the same way engine cursors do.
    fn resume(&self, at: &mut usize, last_match: &mut Option<usize>) -> Option<Match<'h>> {
        let owner = self.pattern;
        let unicode = owner.flags().contains(Flags::UNICODE);
        while *at <= self.haystack.len() {
            let m = owner.locate(&owner.inner.literal, self.haystack, self.pos, *at, |_| true)?;
            let span = m.range();
            if span.is_empty() {
                *at = after_empty(self.haystack, span.end, unicode);
                if *last_match == Some(span.end) {
                    continue;
                }
            } else {
                *at = span.end;
            }
            *last_match = Some(span.end);
            return Some(m);
        }
        None
    }
}

impl<'h> Iterator for FindIter<'_, 'h> {
    type Item = Match<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        let owner = self.pattern;
        let handles = || (owner.clone(), Arc::clone(&owner.inner.literal));
        let endpos = self.haystack.len();
        let found = match &mut self.steps {
            Steps::Spans(spans) => {
                let whole = spans.next()?;
                let (pattern, source) = handles();
                Some(Match::new(
                    pattern,
                    source,
                    self.haystack,
                    self.pos,
                    endpos,
                    whole,
                    Pending::Iteration { ordinal: self.ordinal },
                ))
            }
            Steps::Captures(captures) => {
                let captures = captures.next()?;
                let (pattern, source) = handles();
                Match::resolved(pattern, source, self.haystack, self.pos, endpos, captures)
            }
            Steps::From { at, last_match } => {
                let (mut at, mut last_match) = (*at, *last_match);
                let found = self.resume(&mut at, &mut last_match);
                self.steps = match found {
                    Some(_) => Steps::From { at, last_match },
                    None => Steps::Done,
                };
                found
            }
            Steps::Done => None,
        };
        self.ordinal += 1;
        found
    }
}

impl std::iter::FusedIterator for FindIter<'_, '_> {}

/// Compiles `pattern`.
pub fn compile(pattern: &str, flags: Flags, options: &Options) -> Result<Pattern> {
    Pattern::with_options(pattern, flags, options)
}

/// Compiles `pattern` and returns its leftmost-first match in `text`.
pub fn search<'h>(pattern: &str, text: &'h str, flags: Flags, options: &Options) -> Result<Option<Match<'h>>> {
    Ok(compile(pattern, flags, options)?.search(text))
}

/// Compiles `pattern` and tests whether it matches anywhere in `text`.
pub fn is_match(pattern: &str, text: &str, flags: Flags, options: &Options) -> Result<bool> {
    Ok(compile(pattern, flags, options)?.is_match(text))
}

/// Compiles `pattern` and matches it at the start of `text`.
pub fn anchored_match<'h>(
    pattern: &str,
    text: &'h str,
    flags: Flags,
    options: &Options,
) -> Result<Option<Match<'h>>> {
    compile(pattern, flags, options)?.anchored_match(text)
}

/// Compiles `pattern` and collects the texts of all its matches, see [`Pattern::findall`].
pub fn findall<'h>(pattern: &str, text: &'h str, flags: Flags, options: &Options) -> Result<Vec<Vec<Option<&'h str>>>> {
    compile(pattern, flags, options)?.findall(text)
}

/// Compiles `pattern` and collects all its matches in `text`.
///
/// Each [`Match`] keeps the compiled pattern alive, so the matches outlive
/// this call.
pub fn finditer<'h>(pattern: &str, text: &'h str, flags: Flags, options: &Options) -> Result<Vec<Match<'h>>> {
    Ok(compile(pattern, flags, options)?.finditer(text).collect())
}
