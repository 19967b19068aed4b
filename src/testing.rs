//! Engine table that records every handle it hands out, per test thread.
//!
//! Each entry point forwards to the built-in engine. Allocations are
//! remembered by address; a release of an address that is not live is kept
//! as a violation, which catches double frees and frees of foreign pointers.

use crate::engine::TABLE;
use crate::ffi::{self, EngineTable};
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static LIVE: RefCell<HashMap<usize, &'static str>> = RefCell::new(HashMap::new());
    static VIOLATIONS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn acquire<T>(ptr: *mut T, kind: &'static str) -> *mut T {
    if !ptr.is_null() {
        LIVE.with(|live| live.borrow_mut().insert(ptr as usize, kind));
    }
    ptr
}

fn release<T>(ptr: *mut T, kind: &'static str) {
    let known = LIVE.with(|live| live.borrow_mut().remove(&(ptr as usize)));
    if known != Some(kind) {
        VIOLATIONS.with(|v| v.borrow_mut().push(format!("{kind} {ptr:p} released while not live")));
    }
}

pub(crate) fn reset() {
    LIVE.with(|live| live.borrow_mut().clear());
    VIOLATIONS.with(|v| v.borrow_mut().clear());
}

/// Number of handles currently held by the caller.
pub(crate) fn live() -> usize {
    LIVE.with(|live| live.borrow().len())
}

/// Number of live handles of one kind (`"program"`, `"iter"`, ...).
pub(crate) fn live_of(kind: &str) -> usize {
    LIVE.with(|live| live.borrow().values().filter(|k| **k == kind).count())
}

pub(crate) fn assert_clean() {
    let violations = VIOLATIONS.with(|v| v.borrow().clone());
    assert!(violations.is_empty(), "release violations: {violations:?}");
    let leaked: Vec<&str> = LIVE.with(|live| live.borrow().values().copied().collect());
    assert!(leaked.is_empty(), "leaked handles: {leaked:?}");
}

unsafe extern "C" fn compile(
    pattern: *const u8,
    length: usize,
    flags: u32,
    options: *const ffi::rure_options,
    error: *mut ffi::rure_error,
) -> *mut ffi::rure {
    acquire((TABLE.compile)(pattern, length, flags, options, error), "program")
}

unsafe extern "C" fn free(re: *mut ffi::rure) {
    release(re, "program");
    (TABLE.free)(re)
}

unsafe extern "C" fn iter_capture_names_new(re: *const ffi::rure) -> *mut ffi::rure_iter_capture_names {
    acquire((TABLE.iter_capture_names_new)(re), "names")
}

unsafe extern "C" fn iter_capture_names_free(it: *mut ffi::rure_iter_capture_names) {
    release(it, "names");
    (TABLE.iter_capture_names_free)(it)
}

unsafe extern "C" fn iter_new(re: *const ffi::rure) -> *mut ffi::rure_iter {
    acquire((TABLE.iter_new)(re), "iter")
}

unsafe extern "C" fn iter_free(it: *mut ffi::rure_iter) {
    release(it, "iter");
    (TABLE.iter_free)(it)
}

unsafe extern "C" fn captures_new(re: *const ffi::rure) -> *mut ffi::rure_captures {
    acquire((TABLE.captures_new)(re), "captures")
}

unsafe extern "C" fn captures_free(captures: *mut ffi::rure_captures) {
    release(captures, "captures");
    (TABLE.captures_free)(captures)
}

unsafe extern "C" fn options_new() -> *mut ffi::rure_options {
    acquire((TABLE.options_new)(), "options")
}

unsafe extern "C" fn options_free(options: *mut ffi::rure_options) {
    release(options, "options");
    (TABLE.options_free)(options)
}

unsafe extern "C" fn compile_set(
    patterns: *const *const u8,
    patterns_lengths: *const usize,
    patterns_count: usize,
    flags: u32,
    options: *const ffi::rure_options,
    error: *mut ffi::rure_error,
) -> *mut ffi::rure_set {
    acquire(
        (TABLE.compile_set)(patterns, patterns_lengths, patterns_count, flags, options, error),
        "set",
    )
}

unsafe extern "C" fn set_free(set: *mut ffi::rure_set) {
    release(set, "set");
    (TABLE.set_free)(set)
}

unsafe extern "C" fn error_new() -> *mut ffi::rure_error {
    acquire((TABLE.error_new)(), "error")
}

unsafe extern "C" fn error_free(error: *mut ffi::rure_error) {
    release(error, "error");
    (TABLE.error_free)(error)
}

unsafe extern "C" fn find_captures(
    re: *const ffi::rure,
    haystack: *const u8,
    length: usize,
    start: usize,
    captures: *mut ffi::rure_captures,
) -> bool {
    CAPTURE_CALLS.with(|n| *n.borrow_mut() += 1);
    (TABLE.find_captures)(re, haystack, length, start, captures)
}

unsafe extern "C" fn iter_next_captures(
    it: *mut ffi::rure_iter,
    haystack: *const u8,
    length: usize,
    captures: *mut ffi::rure_captures,
) -> bool {
    CAPTURE_CALLS.with(|n| *n.borrow_mut() += 1);
    (TABLE.iter_next_captures)(it, haystack, length, captures)
}

thread_local! {
    static CAPTURE_CALLS: RefCell<usize> = const { RefCell::new(0) };
}

/// Number of engine calls on this thread that filled a capture buffer.
pub(crate) fn capture_calls() -> usize {
    CAPTURE_CALLS.with(|n| *n.borrow())
}

pub(crate) static COUNTING: EngineTable = EngineTable {
    compile,
    free,
    find_captures,
    iter_capture_names_new,
    iter_capture_names_free,
    iter_new,
    iter_next_captures,
    iter_free,
    captures_new,
    captures_free,
    options_new,
    options_free,
    compile_set,
    set_free,
    error_new,
    error_free,
    ..TABLE
};

unsafe extern "C" fn captures_unavailable(_re: *const ffi::rure) -> *mut ffi::rure_captures {
    std::ptr::null_mut()
}

/// Built-in engine whose capture buffers can never be allocated.
pub(crate) static FAILING_CAPTURES: EngineTable = EngineTable {
    captures_new: captures_unavailable,
    ..TABLE
};
