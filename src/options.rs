//! Compile-time options.

/// Options recognized when compiling a pattern or a set.
///
/// Limits left as `None` fall back to the engine defaults.
///
/// # Example
///
/// ```
/// use rurex::Options;
///
/// let options = Options::new().size_limit(1 << 20).submatches(true);
/// assert_eq!(options.get_size_limit(), Some(1 << 20));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Options {
    size_limit: Option<usize>,
    dfa_size_limit: Option<usize>,
    submatches: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the total size of the compiled program, in bytes.
    pub fn size_limit(mut self, limit: usize) -> Self {
        self.size_limit = Some(limit);
        self
    }

    /// Caps the lazy DFA cache, in bytes.
    pub fn dfa_size_limit(mut self, limit: usize) -> Self {
        self.dfa_size_limit = Some(limit);
        self
    }

    /// When set, `search`, `findall` and `finditer` resolve every capture
    /// group eagerly instead of on first group access.
    pub fn submatches(mut self, yes: bool) -> Self {
        self.submatches = yes;
        self
    }

    pub fn get_size_limit(&self) -> Option<usize> {
        self.size_limit
    }

    pub fn get_dfa_size_limit(&self) -> Option<usize> {
        self.dfa_size_limit
    }

    pub fn get_submatches(&self) -> bool {
        self.submatches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_defer_to_engine() {
        let options = Options::default();
        assert_eq!(options.get_size_limit(), None);
        assert_eq!(options.get_dfa_size_limit(), None);
        assert!(!options.get_submatches());
    }

    #[test]
    fn test_setters_chain() {
        let options = Options::new().size_limit(0).dfa_size_limit(4096).submatches(true);
        assert_eq!(options.get_size_limit(), Some(0));
        assert_eq!(options.get_dfa_size_limit(), Some(4096));
        assert!(options.get_submatches());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_partial() {
        let options: Options = serde_json::from_str(r#"{"size_limit": 1024}"#).unwrap();
        assert_eq!(options, Options::new().size_limit(1024));
    }
}
