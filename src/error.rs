//! Error types for rurex operations.

use crate::ffi;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

const SYNTAX_PREFIXES: [&str; 2] = ["regex parse error", "Error parsing regex"];
const SIZE_LIMIT_PREFIX: &str = "Compiled regex exceeds size limit";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Error {
    /// The pattern text is malformed.
    Syntax(String),

    /// The compiled program or automaton cache would exceed a configured cap.
    ///
    /// Retrying with a larger `size_limit` / `dfa_size_limit` may succeed.
    SizeLimitExceeded(String),

    /// Any other failure reported by the engine, verbatim.
    Engine(String),

    /// Bytes were supplied where text was required.
    TypeMismatch(String),

    /// A group name or index that the pattern does not define.
    NoSuchGroup(String),

    /// A pattern set was built from zero patterns.
    EmptySet,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax(msg) => write!(f, "{msg}"),
            Error::SizeLimitExceeded(msg) => write!(f, "{msg}"),
            Error::Engine(msg) => write!(f, "engine error: {msg}"),
            Error::TypeMismatch(msg) => write!(f, "type mismatch: {msg}"),
            Error::NoSuchGroup(group) => write!(f, "no such group: {group}"),
            Error::EmptySet => write!(f, "a regex set needs at least one pattern"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Classifies a diagnostic read from an engine error slot.
    ///
    /// Returns `Ok(())` for the engine's "no error" sentinel. The engine only
    /// reports failures as free-form text, so the message prefix is the sole
    /// discriminator.
    pub fn classify(message: &str) -> Result<()> {
        if message == ffi::RURE_NO_ERROR {
            Ok(())
        } else if SYNTAX_PREFIXES.iter().any(|p| message.starts_with(p)) {
            Err(Error::Syntax(message.to_string()))
        } else if message.starts_with(SIZE_LIMIT_PREFIX) {
            Err(Error::SizeLimitExceeded(message.to_string()))
        } else {
            Err(Error::Engine(message.to_string()))
        }
    }

    /// Returns the diagnostic text carried by this error.
    pub fn message(&self) -> String {
        match self {
            Error::Syntax(msg) | Error::SizeLimitExceeded(msg) | Error::Engine(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
