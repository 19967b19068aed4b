//! # rurex
//!
//! A safe, stateful regex API over a flat C-style regex engine table.
//!
//! The engine is reached only through an [`EngineTable`] of `extern "C"`
//! entry points working on byte buffers and opaque handles. rurex owns every
//! handle it obtains and releases each exactly once, turns engine
//! diagnostics into typed [`Error`]s, and layers a text API with lazy match
//! objects on top. The crate ships an in-process table backed by the
//! `regex` crate ([`EngineTable::builtin`]), which every constructor uses
//! unless a table is passed explicitly.
//!
//! ## Text patterns
//!
//! ```
//! use rurex::Pattern;
//!
//! let pattern = Pattern::new(r"(?P<key>\w+)=(?P<value>\w+)")?;
//!
//! let m = pattern.search("set retries=3").unwrap();
//! assert_eq!(m.group("key")?, Some("retries"));
//! assert_eq!(m.group(2)?, Some("3"));
//! assert_eq!(m.span(0)?, (4, 13));
//!
//! // anchored matching only accepts a match at the very start
//! assert!(pattern.anchored_match("set retries=3")?.is_none());
//! assert!(pattern.anchored_match("retries=3")?.is_some());
//!
//! for m in pattern.finditer("a=1 b=2") {
//!     println!("{:?}", m.groupdict()?);
//! }
//! # Ok::<(), rurex::Error>(())
//! ```
//!
//! All offsets are **byte** offsets into the text, never character counts.
//!
//! ## Bytes and sets
//!
//! [`Regex`] is the bytes-level program underneath [`Pattern`]; it matches
//! arbitrary byte haystacks and returns plain [`Span`]s and [`CaptureSet`]s.
//! [`RegexSet`] tests many patterns in one pass:
//!
//! ```
//! use rurex::{Flags, Regex, RegexSet};
//!
//! // without unicode mode `.` matches any byte
//! let re = Regex::with_flags(".", Flags::empty())?;
//! assert!(re.is_match(b"\xFF"));
//!
//! let set = RegexSet::new(["baz", "bar", "foo"])?;
//! assert_eq!(set.matches(b"foobar"), vec![false, true, true]);
//! # Ok::<(), rurex::Error>(())
//! ```
//!
//! ## Options
//!
//! [`Options`] caps the compiled program and DFA cache sizes and can make
//! matches resolve their groups eagerly:
//!
//! ```
//! use rurex::{Error, Flags, Options, Pattern};
//!
//! let options = Options::new().size_limit(0);
//! match Pattern::with_options(r"\w{100}", Flags::DEFAULT, &options) {
//!     Err(Error::SizeLimitExceeded(msg)) => println!("too big: {msg}"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! ## Error Handling
//!
//! Compile operations return `Result<_, Error>`. Finding no match is never an
//! error: searches return `Option`. Asking a match for a group the pattern
//! does not define returns [`Error::NoSuchGroup`].
//!
//! ## Logging
//!
//! rurex logs through the [`log`] facade: a warning for each ignored
//! [`compat`] flag, debug records when programs are compiled, and trace
//! records when engine handles are released. No logger is installed.

pub mod compat;
mod engine;
mod error;
pub mod ffi;
mod flags;
mod handle;
mod matched;
mod names;
mod options;
mod pattern;
mod regex;
mod set;

#[cfg(test)]
mod testing;

pub use error::*;
pub use ffi::EngineTable;
pub use flags::*;
pub use matched::*;
pub use names::*;
pub use options::*;
pub use pattern::*;
pub use self::regex::*;
pub use set::*;
