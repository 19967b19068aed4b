//! Capture group names of one compiled program.

use std::collections::HashMap;

/// Ordered registry of capture group names.
///
/// Entry `i` is the name of group `i`, or `None` if the group is unnamed.
/// Group 0 is the whole match and is never named. The registry is filled
/// once from the engine's name stream when a program is compiled and is
/// immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureNames {
    names: Vec<Option<String>>,
    index: HashMap<String, usize>,
}

impl CaptureNames {
    /// Drains an engine name stream.
    ///
    /// A name on group 0 is dropped. If a name repeats, lookups resolve to
    /// its first occurrence.
    pub(crate) fn from_engine<I>(stream: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut names = Vec::new();
        let mut index = HashMap::new();
        for (i, name) in stream.into_iter().enumerate() {
            let name = name.filter(|_| i > 0);
            if let Some(name) = &name {
                if index.contains_key(name) {
                    log::warn!("capture group name {name:?} repeats at index {i}; keeping the first");
                } else {
                    index.insert(name.clone(), i);
                }
            }
            names.push(name);
        }
        CaptureNames { names, index }
    }

    /// Number of groups, including group 0.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the name of group `index`, if it has one.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index)?.as_deref()
    }

    /// Returns the index of the group called `name`.
    ///
    /// Never returns `Some(0)`: group 0 cannot be named.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Iterates over all group names in index order, `None` for unnamed groups.
    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.names.iter().map(|name| name.as_deref())
    }

    /// Iterates over `(index, name)` for named groups only, in index order.
    pub fn named(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| Some((i, name.as_deref()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(names: &[Option<&str>]) -> CaptureNames {
        CaptureNames::from_engine(names.iter().map(|n| n.map(str::to_string)))
    }

    #[test]
    fn test_lookup_both_ways() {
        let names = stream(&[None, Some("year"), None, Some("day")]);
        assert_eq!(names.len(), 4);
        assert_eq!(names.index_of("year"), Some(1));
        assert_eq!(names.index_of("day"), Some(3));
        assert_eq!(names.index_of("month"), None);
        assert_eq!(names.name(1), Some("year"));
        assert_eq!(names.name(2), None);
        assert_eq!(names.name(9), None);
        assert_eq!(names.named().collect::<Vec<_>>(), vec![(1, "year"), (3, "day")]);
    }

    #[test]
    fn test_group_zero_is_never_named() {
        let names = stream(&[Some("whole"), Some("part")]);
        assert_eq!(names.name(0), None);
        assert_eq!(names.index_of("whole"), None);
        assert_eq!(names.index_of("part"), Some(1));
    }

    #[test]
    fn test_repeated_name_keeps_first() {
        let names = stream(&[None, Some("x"), Some("x")]);
        assert_eq!(names.index_of("x"), Some(1));
        assert_eq!(names.name(2), Some("x"));
    }
}
