//! Flags in the vocabulary of the classic `re`-style text regex API.
//!
//! Code ported from that API can keep its flag constants and hand them to
//! [`compile`]. Each external flag is looked up in a fixed table; flags with
//! no engine equivalent are reported through `log::warn!` and in the
//! returned [`Translation`], then ignored.

use bitflags::bitflags;

use crate::error::Result;
use crate::flags::Flags;
use crate::options::Options;
use crate::pattern::Pattern;

bitflags! {
    /// External flag vocabulary, with its conventional bit values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ReFlags: u32 {
        const IGNORECASE = 2;
        const LOCALE = 4;
        const MULTILINE = 8;
        const DOTALL = 16;
        const UNICODE = 32;
        const VERBOSE = 64;
        const ASCII = 256;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Set(Flags),
    Clear(Flags),
    Unsupported,
}

const FLAG_MAP: [(ReFlags, &str, Effect); 7] = [
    (ReFlags::IGNORECASE, "IGNORECASE", Effect::Set(Flags::CASEI)),
    (ReFlags::LOCALE, "LOCALE", Effect::Unsupported),
    (ReFlags::MULTILINE, "MULTILINE", Effect::Set(Flags::MULTI)),
    (ReFlags::DOTALL, "DOTALL", Effect::Set(Flags::DOTNL)),
    (ReFlags::UNICODE, "UNICODE", Effect::Set(Flags::UNICODE)),
    (ReFlags::VERBOSE, "VERBOSE", Effect::Set(Flags::SPACE)),
    (ReFlags::ASCII, "ASCII", Effect::Clear(Flags::UNICODE)),
];

/// Result of mapping external flags onto engine flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Engine flags to compile with.
    pub flags: Flags,
    /// Names of the external flags that were dropped.
    pub unsupported: Vec<&'static str>,
}

/// Maps external flags onto engine flags.
///
/// Unicode mode is on unless `ASCII` is given.
///
/// # Example
///
/// ```
/// use rurex::compat::{translate, ReFlags};
/// use rurex::Flags;
///
/// let t = translate(ReFlags::IGNORECASE | ReFlags::LOCALE);
/// assert_eq!(t.flags, Flags::CASEI | Flags::UNICODE);
/// assert_eq!(t.unsupported, vec!["LOCALE"]);
/// ```
pub fn translate(flags: ReFlags) -> Translation {
    let mut set = Flags::UNICODE;
    let mut cleared = Flags::empty();
    let mut unsupported = Vec::new();
    for (flag, name, effect) in FLAG_MAP {
        if !flags.contains(flag) {
            continue;
        }
        match effect {
            Effect::Set(engine) => set |= engine,
            Effect::Clear(engine) => cleared |= engine,
            Effect::Unsupported => {
                log::warn!("flag {name} is not supported by the engine and is ignored");
                unsupported.push(name);
            }
        }
    }
    Translation {
        flags: set - cleared,
        unsupported,
    }
}

/// Compiles a text pattern with external flags.
pub fn compile(pattern: &str, flags: ReFlags, options: &Options) -> Result<Pattern> {
    Pattern::with_options(pattern, translate(flags).flags, options)
}
