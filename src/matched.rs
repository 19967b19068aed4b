//! Text-level match objects.

use once_cell::unsync::OnceCell;

use crate::error::{Error, Result};
use crate::pattern::Pattern;
use crate::regex::{CaptureSet, Regex, Span};
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Selects a capture group by index or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group<'a> {
    Index(usize),
    Name(&'a str),
}

/// Anything that can select a capture group: an index, a name or a [`Group`].
pub trait GroupKey<'a> {
    fn into_group(self) -> Group<'a>;
}

impl<'a> GroupKey<'a> for usize {
    fn into_group(self) -> Group<'a> {
        Group::Index(self)
    }
}

impl<'a> GroupKey<'a> for &'a str {
    fn into_group(self) -> Group<'a> {
        Group::Name(self)
    }
}

impl<'a> GroupKey<'a> for Group<'a> {
    fn into_group(self) -> Group<'a> {
        self
    }
}

/// How the group spans of a match are obtained when first needed.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Pending {
    /// Spans were copied out when the match was made.
    Resolved,
    /// Re-run a capturing search from `start`.
    Search { start: usize },
    /// Take the `ordinal`-th element of a fresh capture iteration.
    Iteration { ordinal: usize },
}

/// One successful match of a [`Pattern`] against a text window.
///
/// Group spans are resolved lazily: a match produced without submatches
/// only knows its overall span until a group is asked for, at which point
/// the engine is queried once and the result kept.
///
/// Every offset exposed here (`start`, `end`, `span`, [`Match::range`]) is a
/// **byte** offset into the haystack, not a character offset. Slice the
/// haystack with it rather than counting `chars()`.
pub struct Match<'h> {
    pattern: Pattern,
    source: Arc<Regex>,
    haystack: &'h str,
    pos: usize,
    endpos: usize,
    whole: Span,
    pending: Pending,
    captures: OnceCell<CaptureSet>,
}

#[allow(clippy::len_without_is_empty)]
impl<'h> Match<'h> {
    pub(crate) fn new(
        pattern: Pattern,
        source: Arc<Regex>,
        haystack: &'h str,
        pos: usize,
        endpos: usize,
        whole: Span,
        pending: Pending,
    ) -> Self {
        Match {
            pattern,
            source,
            haystack,
            pos,
            endpos,
            whole,
            pending,
            captures: OnceCell::new(),
        }
    }

    pub(crate) fn resolved(
        pattern: Pattern,
        source: Arc<Regex>,
        haystack: &'h str,
        pos: usize,
        endpos: usize,
        captures: CaptureSet,
    ) -> Option<Self> {
        let whole = captures.whole()?;
        let m = Match::new(pattern, source, haystack, pos, endpos, whole, Pending::Resolved);
        let _ = m.captures.set(captures);
        Some(m)
    }

    /// The pattern that produced this match.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The searched text, already cut at `endpos`.
    pub fn haystack(&self) -> &'h str {
        self.haystack
    }

    /// Byte offset the search started from.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Byte offset the haystack was cut at.
    pub fn endpos(&self) -> usize {
        self.endpos
    }

    /// Byte range of the whole match.
    pub fn range(&self) -> Range<usize> {
        self.whole.range()
    }

    /// Number of groups, including group 0.
    pub fn len(&self) -> usize {
        self.source.captures_len()
    }

    /// Text of the whole match.
    pub fn as_str(&self) -> Result<&'h str> {
        self.decode(self.whole)
    }

    pub fn as_bytes(&self) -> &'h [u8] {
        &self.haystack.as_bytes()[self.whole.range()]
    }

    /// All group spans, resolving them on first use.
    ///
    /// Fails with [`Error::Engine`] if the engine cannot reproduce this
    /// match. A failed resolution is retried on the next call.
    pub fn captures(&self) -> Result<&CaptureSet> {
        self.captures.get_or_try_init(|| self.resolve())
    }

    fn resolve(&self) -> Result<CaptureSet> {
        let haystack = self.haystack.as_bytes();
        let found = match self.pending {
            Pending::Resolved => None,
            Pending::Search { start } => self.source.captures_at(haystack, start)?,
            Pending::Iteration { ordinal } => self.source.captures_iter(haystack).nth(ordinal),
        };
        match found {
            Some(captures) if captures.whole() == Some(self.whole) => Ok(captures),
            _ => {
                log::error!("could not resolve the groups of match {:?}", self.whole);
                Err(Error::Engine(format!(
                    "engine did not reproduce the match at {}..{}",
                    self.whole.start, self.whole.end
                )))
            }
        }
    }

    fn index(&self, group: Group<'_>) -> Result<usize> {
        match group {
            Group::Index(index) if index < self.len() => Ok(index),
            Group::Index(index) => Err(Error::NoSuchGroup(index.to_string())),
            Group::Name(name) => self
                .source
                .capture_name_index(name)
                .ok_or_else(|| Error::NoSuchGroup(name.to_string())),
        }
    }

    fn span_of(&self, index: usize) -> Result<Option<Span>> {
        if index == 0 {
            Ok(Some(self.whole))
        } else {
            Ok(self.captures()?.get(index))
        }
    }

    fn decode(&self, span: Span) -> Result<&'h str> {
        if span.is_empty() {
            return Ok("");
        }
        self.haystack.get(span.range()).ok_or_else(|| {
            Error::TypeMismatch(format!(
                "bytes {}..{} do not fall on character boundaries",
                span.start, span.end
            ))
        })
    }

    /// Byte span of a group, or `None` if it did not participate.
    pub fn get<'g>(&self, group: impl GroupKey<'g>) -> Result<Option<Span>> {
        let index = self.index(group.into_group())?;
        self.span_of(index)
    }

    /// Text of a group, or `None` if it did not participate.
    ///
    /// # Example
    ///
    /// ```
    /// let m = rurex::search(r"(?P<first>\w+) (?P<last>\w+)", "Malcolm Reynolds", rurex::Flags::DEFAULT, &Default::default())?
    ///     .unwrap();
    /// assert_eq!(m.group(0)?, Some("Malcolm Reynolds"));
    /// assert_eq!(m.group("last")?, Some("Reynolds"));
    /// # Ok::<(), rurex::Error>(())
    /// ```
    pub fn group<'g>(&self, group: impl GroupKey<'g>) -> Result<Option<&'h str>> {
        self.get(group)?.map(|span| self.decode(span)).transpose()
    }

    /// Raw bytes of a group, or `None` if it did not participate.
    pub fn group_bytes<'g>(&self, group: impl GroupKey<'g>) -> Result<Option<&'h [u8]>> {
        let span = self.get(group)?;
        Ok(span.map(|span| &self.haystack.as_bytes()[span.range()]))
    }

    /// Text of every group except group 0, in index order.
    pub fn groups(&self) -> Result<Vec<Option<&'h str>>> {
        (1..self.len()).map(|i| self.group(i)).collect()
    }

    /// Text of each selected group, in the order given.
    ///
    /// Fails on the first key that names no group.
    pub fn groups_of<'g>(&self, keys: &[Group<'g>]) -> Result<Vec<Option<&'h str>>> {
        keys.iter().map(|&key| self.group(key)).collect()
    }

    /// Like [`Match::groups`], substituting `default` for groups that did not participate.
    pub fn groups_or<'a>(&self, default: &'a str) -> Result<Vec<&'a str>>
    where
        'h: 'a,
    {
        Ok(self
            .groups()?
            .into_iter()
            .map(|text| text.unwrap_or(default))
            .collect())
    }

    /// Text of every named group, keyed by name.
    pub fn groupdict(&self) -> Result<HashMap<&str, Option<&'h str>>> {
        self.source
            .capture_names()
            .named()
            .map(|(index, name)| Ok((name, self.group(index)?)))
            .collect()
    }

    /// Like [`Match::groupdict`], substituting `default` for groups that did not participate.
    pub fn groupdict_or<'a>(&'a self, default: &'a str) -> Result<HashMap<&'a str, &'a str>>
    where
        'h: 'a,
    {
        Ok(self
            .groupdict()?
            .into_iter()
            .map(|(name, text)| (name, text.unwrap_or(default)))
            .collect())
    }

    /// Byte offset where a group starts, or `-1` if it did not participate.
    ///
    /// This is a byte offset, not a character offset.
    pub fn start<'g>(&self, group: impl GroupKey<'g>) -> Result<isize> {
        Ok(self.span(group)?.0)
    }

    /// Byte offset where a group ends, or `-1` if it did not participate.
    ///
    /// This is a byte offset, not a character offset.
    pub fn end<'g>(&self, group: impl GroupKey<'g>) -> Result<isize> {
        Ok(self.span(group)?.1)
    }

    /// `(start, end)` byte offsets of a group, or `(-1, -1)` if it did not participate.
    pub fn span<'g>(&self, group: impl GroupKey<'g>) -> Result<(isize, isize)> {
        Ok(match self.get(group)? {
            Some(span) => (span.start as isize, span.end as isize),
            None => (-1, -1),
        })
    }

    /// Highest-numbered group (other than group 0) that participated.
    ///
    /// This is the group with the highest index, not the one that closed
    /// last in the text.
    pub fn lastindex(&self) -> Result<Option<usize>> {
        Ok(self
            .captures()?
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, span)| span.is_some())
            .map(|(index, _)| index)
            .last())
    }

    /// Name of the [`Match::lastindex`] group, if it is named.
    pub fn lastgroup(&self) -> Result<Option<&str>> {
        Ok(self
            .lastindex()?
            .and_then(|index| self.source.capture_names().name(index)))
    }
}

impl fmt::Debug for Match<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("span", &self.whole.range())
            .field("text", &String::from_utf8_lossy(self.as_bytes()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, COUNTING, FAILING_CAPTURES};
    use crate::{Flags, Options};

    fn search<'h>(pattern: &str, text: &'h str) -> Match<'h> {
        Pattern::new(pattern).unwrap().search(text).unwrap()
    }

    #[test]
    fn test_group() {
        let m = Pattern::new(r"(\w+) (\w+)")
            .unwrap()
            .anchored_match("Isaac Newton, physicist")
            .unwrap()
            .unwrap();
        assert_eq!(m.group(0).unwrap(), Some("Isaac Newton"));
        assert_eq!(m.group(1).unwrap(), Some("Isaac"));
        assert_eq!(m.group(2).unwrap(), Some("Newton"));
        assert_eq!(m.group(3), Err(Error::NoSuchGroup("3".to_string())));
    }

    #[test]
    fn test_named_group() {
        let m = search(r"(?P<first_name>\w+) (?P<last_name>\w+)", "Malcolm Reynolds");
        assert_eq!(m.group("first_name").unwrap(), Some("Malcolm"));
        assert_eq!(m.group("last_name").unwrap(), Some("Reynolds"));
        assert_eq!(m.group(1).unwrap(), Some("Malcolm"));
        assert_eq!(m.group("middle_name"), Err(Error::NoSuchGroup("middle_name".to_string())));
    }

    #[test]
    fn test_repeated_group_keeps_last_iteration() {
        let m = search(r"(..)+", "a1b2c3");
        assert_eq!(m.group(1).unwrap(), Some("c3"));
    }

    #[test]
    fn test_groups() {
        let m = search(r"(\d+)\.(\d+)", "24.1632");
        assert_eq!(m.groups().unwrap(), vec![Some("24"), Some("1632")]);
    }

    #[test]
    fn test_groups_optional() {
        let m = search(r"(\d+)\.?(\d+)?", "24");
        assert_eq!(m.groups().unwrap(), vec![Some("24"), None]);
        assert_eq!(m.groups_or("0").unwrap(), vec!["24", "0"]);
    }

    #[test]
    fn test_groupdict() {
        let m = search(r"(?P<first_name>\w+) (?P<last_name>\w+)( jr)?", "Malcolm Reynolds");
        let dict = m.groupdict().unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict["first_name"], Some("Malcolm"));
        assert_eq!(dict["last_name"], Some("Reynolds"));

        let m = search(r"(?P<a>x)|(?P<b>y)", "y");
        let dict = m.groupdict_or("-").unwrap();
        assert_eq!(dict["a"], "-");
        assert_eq!(dict["b"], "y");
    }

    #[test]
    fn test_start_end() {
        let text = "tony@tiremove_thisger.net";
        let m = search("remove_this", text);
        let (start, end) = (m.start(0).unwrap() as usize, m.end(0).unwrap() as usize);
        assert_eq!(format!("{}{}", &text[..start], &text[end..]), "tony@tiger.net");
    }

    #[test]
    fn test_offsets_are_bytes() {
        let m = search("b", "\u{2603}b");
        assert_eq!(m.span(0).unwrap(), (3, 4));
        assert_eq!(m.range(), 3..4);
    }

    #[test]
    fn test_nonparticipating_group_span_is_minus_one() {
        let m = search(r"(a)|(b)", "b");
        assert_eq!(m.span(1).unwrap(), (-1, -1));
        assert_eq!(m.start(1).unwrap(), -1);
        assert_eq!(m.end(2).unwrap(), 1);
    }

    #[test]
    fn test_lastindex_is_highest_index() {
        // group 2 closes before group 1 but has the higher index
        let m = search(r"(a(b))", "ab");
        assert_eq!(m.lastindex(), Ok(Some(2)));

        let m = search(r"(?P<x>a)(?P<y>b)?", "a");
        assert_eq!(m.lastindex(), Ok(Some(1)));
        assert_eq!(m.lastgroup(), Ok(Some("x")));

        let m = search(r"(?P<x>a)(b)", "ab");
        assert_eq!(m.lastindex(), Ok(Some(2)));
        assert_eq!(m.lastgroup(), Ok(None));

        let m = search("abc", "abc");
        assert_eq!(m.lastindex(), Ok(None));
    }

    #[test]
    fn test_split_character_is_type_mismatch() {
        // without unicode mode `.` can match half of a character
        let pattern = Pattern::with_options(".", Flags::empty(), &Options::new()).unwrap();
        let m = pattern.search("\u{e9}").unwrap();
        assert_eq!(m.as_bytes(), b"\xC3");
        assert!(matches!(m.as_str(), Err(Error::TypeMismatch(_))));
        assert_eq!(m.group_bytes(0).unwrap(), Some(&b"\xC3"[..]));
    }

    #[test]
    fn test_groups_of() {
        let m = search(r"(?P<key>\w+)=(?P<value>\w+)?", "retries=");
        let keys = [Group::Name("value"), Group::Index(1), Group::Index(0)];
        assert_eq!(m.groups_of(&keys).unwrap(), vec![None, Some("retries"), Some("retries=")]);
        assert_eq!(m.groups_of(&[]).unwrap(), Vec::<Option<&str>>::new());
        assert_eq!(
            m.groups_of(&[Group::Index(1), Group::Name("nope")]),
            Err(Error::NoSuchGroup("nope".to_string()))
        );
    }

    #[test]
    fn test_empty_match_after_multibyte_char_decodes() {
        let m = search(r"\d*$", "\u{e9}");
        assert_eq!(m.range(), 2..2);
        assert_eq!(m.as_str().unwrap(), "");

        // an empty match can only split a character when unicode mode is off
        let pattern = Pattern::with_options(r"\d*", Flags::empty(), &Options::new()).unwrap();
        let texts: Vec<&str> = pattern.finditer("\u{e9}").map(|m| m.as_str().unwrap()).collect();
        assert_eq!(texts, vec!["", "", ""]);
    }

    #[test]
    fn test_unresolvable_groups_are_errors() {
        let pattern = Pattern::with_engine(&FAILING_CAPTURES, r"(\w)(\w)?", Flags::DEFAULT, &Options::new()).unwrap();
        let m = pattern.search("ab").unwrap();
        assert_eq!(m.group(0).unwrap(), Some("ab"));
        assert!(matches!(m.group(1), Err(Error::Engine(_))));
        assert!(matches!(m.groups(), Err(Error::Engine(_))));
        assert!(matches!(m.lastindex(), Err(Error::Engine(_))));
        assert!(matches!(m.span(2), Err(Error::Engine(_))));
        // a failure is not cached as an empty result
        assert!(matches!(m.captures(), Err(Error::Engine(_))));
    }

    #[test]
    fn test_deferred_resolution_is_idempotent() {
        let pattern = Pattern::with_engine(&COUNTING, r"(\w)\w*", Flags::DEFAULT, &Options::new()).unwrap();
        let matches: Vec<Match<'_>> = pattern.finditer("ab cd ef").collect();
        let before = testing::capture_calls();

        assert_eq!(matches[1].group(1).unwrap(), Some("c"));
        let after_first = testing::capture_calls();
        assert!(after_first > before);

        assert_eq!(matches[1].group(1).unwrap(), Some("c"));
        assert_eq!(matches[1].groups().unwrap(), vec![Some("c")]);
        assert_eq!(testing::capture_calls(), after_first);

        // group 0 never needs the engine
        assert_eq!(matches[2].group(0).unwrap(), Some("ef"));
        assert_eq!(testing::capture_calls(), after_first);
    }

    #[test]
    fn test_eager_submatches_skip_resolution() {
        let options = Options::new().submatches(true);
        let pattern = Pattern::with_engine(&COUNTING, r"(\w)\w*", Flags::DEFAULT, &options).unwrap();
        let m = pattern.search("xy").unwrap();
        let calls = testing::capture_calls();
        assert_eq!(m.group(1).unwrap(), Some("x"));
        assert_eq!(testing::capture_calls(), calls);
    }
}
