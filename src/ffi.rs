//! Raw engine ABI: opaque handle types, the match record and the flat
//! operation table the facade drives.
//!
//! These are low-level bindings and should not be used directly.
//! Use the safe wrappers in the parent module instead.

use std::ffi::c_char;

/// Declares an opaque handle type that can only be used behind a pointer.
macro_rules! opaque {
    ($($name:ident),* $(,)?) => {
        $(
            #[repr(C)]
            #[allow(non_camel_case_types)]
            pub struct $name {
                _private: [u8; 0],
            }
        )*
    };
}

opaque!(
    rure,
    rure_set,
    rure_options,
    rure_error,
    rure_captures,
    rure_iter,
    rure_iter_capture_names,
);

/// Byte span of a single match.
///
/// This matches the engine's `rure_match` structure exactly.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub struct rure_match {
    pub start: usize,
    pub end: usize,
}

pub const RURE_FLAG_CASEI: u32 = 1 << 0;
pub const RURE_FLAG_MULTI: u32 = 1 << 1;
pub const RURE_FLAG_DOTNL: u32 = 1 << 2;
pub const RURE_FLAG_SWAP_GREED: u32 = 1 << 3;
pub const RURE_FLAG_SPACE: u32 = 1 << 4;
pub const RURE_FLAG_UNICODE: u32 = 1 << 5;
pub const RURE_DEFAULT_FLAGS: u32 = RURE_FLAG_UNICODE;

/// Compiled program size cap used when no `size_limit` is configured.
pub const RURE_DEFAULT_SIZE_LIMIT: usize = 10 * (1 << 20);
/// Lazy DFA cache cap used when no `dfa_size_limit` is configured.
pub const RURE_DEFAULT_DFA_SIZE_LIMIT: usize = 2 * (1 << 20);

/// Message an error slot carries while no failure has been recorded.
pub const RURE_NO_ERROR: &str = "no error";

/// The engine's operation table.
///
/// Every entry is a plain C function; handles returned by `*_new` and
/// `compile*` must be handed back to the matching `*_free` exactly once.
#[derive(Clone, Copy)]
pub struct EngineTable {
    pub compile: unsafe extern "C" fn(
        pattern: *const u8,
        length: usize,
        flags: u32,
        options: *const rure_options,
        error: *mut rure_error,
    ) -> *mut rure,
    pub free: unsafe extern "C" fn(re: *mut rure),
    pub is_match:
        unsafe extern "C" fn(re: *const rure, haystack: *const u8, length: usize, start: usize) -> bool,
    pub find: unsafe extern "C" fn(
        re: *const rure,
        haystack: *const u8,
        length: usize,
        start: usize,
        matched: *mut rure_match,
    ) -> bool,
    pub find_captures: unsafe extern "C" fn(
        re: *const rure,
        haystack: *const u8,
        length: usize,
        start: usize,
        captures: *mut rure_captures,
    ) -> bool,
    pub shortest_match: unsafe extern "C" fn(
        re: *const rure,
        haystack: *const u8,
        length: usize,
        start: usize,
        end: *mut usize,
    ) -> bool,

    pub iter_capture_names_new: unsafe extern "C" fn(re: *const rure) -> *mut rure_iter_capture_names,
    pub iter_capture_names_next:
        unsafe extern "C" fn(it: *mut rure_iter_capture_names, name: *mut *const c_char) -> bool,
    pub iter_capture_names_free: unsafe extern "C" fn(it: *mut rure_iter_capture_names),

    pub iter_new: unsafe extern "C" fn(re: *const rure) -> *mut rure_iter,
    pub iter_next: unsafe extern "C" fn(
        it: *mut rure_iter,
        haystack: *const u8,
        length: usize,
        matched: *mut rure_match,
    ) -> bool,
    pub iter_next_captures: unsafe extern "C" fn(
        it: *mut rure_iter,
        haystack: *const u8,
        length: usize,
        captures: *mut rure_captures,
    ) -> bool,
    pub iter_free: unsafe extern "C" fn(it: *mut rure_iter),

    pub captures_new: unsafe extern "C" fn(re: *const rure) -> *mut rure_captures,
    pub captures_at:
        unsafe extern "C" fn(captures: *const rure_captures, i: usize, matched: *mut rure_match) -> bool,
    pub captures_len: unsafe extern "C" fn(captures: *const rure_captures) -> usize,
    pub captures_free: unsafe extern "C" fn(captures: *mut rure_captures),

    pub options_new: unsafe extern "C" fn() -> *mut rure_options,
    pub options_size_limit: unsafe extern "C" fn(options: *mut rure_options, limit: usize),
    pub options_dfa_size_limit: unsafe extern "C" fn(options: *mut rure_options, limit: usize),
    pub options_free: unsafe extern "C" fn(options: *mut rure_options),

    pub compile_set: unsafe extern "C" fn(
        patterns: *const *const u8,
        patterns_lengths: *const usize,
        patterns_count: usize,
        flags: u32,
        options: *const rure_options,
        error: *mut rure_error,
    ) -> *mut rure_set,
    pub set_free: unsafe extern "C" fn(set: *mut rure_set),
    pub set_is_match:
        unsafe extern "C" fn(set: *const rure_set, haystack: *const u8, length: usize, start: usize) -> bool,
    pub set_matches: unsafe extern "C" fn(
        set: *const rure_set,
        haystack: *const u8,
        length: usize,
        start: usize,
        matches: *mut bool,
    ) -> bool,
    pub set_len: unsafe extern "C" fn(set: *const rure_set) -> usize,

    pub error_new: unsafe extern "C" fn() -> *mut rure_error,
    pub error_message: unsafe extern "C" fn(error: *const rure_error) -> *const c_char,
    pub error_free: unsafe extern "C" fn(error: *mut rure_error),
}

impl std::fmt::Debug for EngineTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineTable")
            .field("compile", &(self.compile as *const ()))
            .finish_non_exhaustive()
    }
}
