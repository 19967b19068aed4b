//! In-process engine behind [`EngineTable::builtin`].
//!
//! Every entry point follows the C contract of the table: handles are
//! heap boxes handed out as opaque pointers, failures are written to an
//! error slot as text, and nothing here panics across the boundary. The
//! matching itself is delegated to the `regex` crate's byte-oriented API.

use ::regex::bytes::{CaptureLocations, Regex, RegexBuilder, RegexSet, RegexSetBuilder};

use crate::ffi::{self, rure_match, EngineTable};
use std::ffi::{c_char, CString};
use std::{ptr, slice, str};

pub(crate) const TABLE: EngineTable = EngineTable {
    compile,
    free,
    is_match,
    find,
    find_captures,
    shortest_match,
    iter_capture_names_new,
    iter_capture_names_next,
    iter_capture_names_free,
    iter_new,
    iter_next,
    iter_next_captures,
    iter_free,
    captures_new,
    captures_at,
    captures_len,
    captures_free,
    options_new,
    options_size_limit,
    options_dfa_size_limit,
    options_free,
    compile_set,
    set_free,
    set_is_match,
    set_matches,
    set_len,
    error_new,
    error_message,
    error_free,
};

static BUILTIN: EngineTable = TABLE;

impl EngineTable {
    /// Returns the engine table compiled into this crate.
    pub fn builtin() -> &'static EngineTable {
        &BUILTIN
    }
}

#[derive(Clone, Copy)]
struct Options {
    size_limit: usize,
    dfa_size_limit: usize,
}

struct ErrorSlot {
    message: CString,
}

/// A compiled program plus the one flag the iterators need.
struct Compiled {
    regex: Regex,
    unicode: bool,
}

struct Iter {
    re: *const Compiled,
    last_end: usize,
    last_match: Option<usize>,
}

struct CaptureNames {
    names: Vec<CString>,
    pos: usize,
}

macro_rules! configure {
    ($builder:expr, $flags:expr, $options:expr) => {{
        let flags = $flags;
        $builder
            .case_insensitive(flags & ffi::RURE_FLAG_CASEI != 0)
            .multi_line(flags & ffi::RURE_FLAG_MULTI != 0)
            .dot_matches_new_line(flags & ffi::RURE_FLAG_DOTNL != 0)
            .swap_greed(flags & ffi::RURE_FLAG_SWAP_GREED != 0)
            .ignore_whitespace(flags & ffi::RURE_FLAG_SPACE != 0)
            .unicode(flags & ffi::RURE_FLAG_UNICODE != 0)
            .size_limit($options.size_limit)
            .dfa_size_limit($options.dfa_size_limit)
    }};
}

unsafe fn haystack<'a>(haystack: *const u8, length: usize) -> &'a [u8] {
    slice::from_raw_parts(haystack, length)
}

unsafe fn program<'a>(re: *const ffi::rure) -> &'a Compiled {
    &*(re as *const Compiled)
}

/// Whether `at` does not fall inside a UTF-8 sequence of `hay`.
fn is_char_boundary(hay: &[u8], at: usize) -> bool {
    hay.get(at).map_or(true, |&byte| byte & 0xC0 != 0x80)
}

/// First char boundary after `at` in unicode mode, `at + 1` otherwise.
fn step(compiled: &Compiled, hay: &[u8], at: usize) -> usize {
    let mut next = at + 1;
    if compiled.unicode {
        while next < hay.len() && !is_char_boundary(hay, next) {
            next += 1;
        }
    }
    next
}

/// Runs `search` from `start`, skipping empty matches that would split a
/// UTF-8 sequence when the program is in unicode mode.
fn aligned<F>(compiled: &Compiled, hay: &[u8], start: usize, mut search: F) -> Option<(usize, usize)>
where
    F: FnMut(&Regex, &[u8], usize) -> Option<(usize, usize)>,
{
    let mut at = start;
    loop {
        let (start, end) = search(&compiled.regex, hay, at)?;
        if !compiled.unicode || start != end || is_char_boundary(hay, start) {
            return Some((start, end));
        }
        at = step(compiled, hay, start);
        if at > hay.len() {
            return None;
        }
    }
}

unsafe fn options_or_default(options: *const ffi::rure_options) -> Options {
    match (options as *const Options).as_ref() {
        Some(options) => *options,
        None => Options {
            size_limit: ffi::RURE_DEFAULT_SIZE_LIMIT,
            dfa_size_limit: ffi::RURE_DEFAULT_DFA_SIZE_LIMIT,
        },
    }
}

unsafe fn record(error: *mut ffi::rure_error, message: impl ToString) {
    if let Some(slot) = (error as *mut ErrorSlot).as_mut() {
        slot.message = CString::new(message.to_string().replace('\0', "")).unwrap_or_default();
    }
}

fn boxed<T, H>(value: T) -> *mut H {
    Box::into_raw(Box::new(value)).cast()
}

unsafe fn release<T, H>(handle: *mut H) {
    if !handle.is_null() {
        drop(Box::from_raw(handle as *mut T));
    }
}

unsafe extern "C" fn compile(
    pattern: *const u8,
    length: usize,
    flags: u32,
    options: *const ffi::rure_options,
    error: *mut ffi::rure_error,
) -> *mut ffi::rure {
    let pattern = match str::from_utf8(slice::from_raw_parts(pattern, length)) {
        Ok(pattern) => pattern,
        Err(err) => {
            record(error, err);
            return ptr::null_mut();
        }
    };
    let options = options_or_default(options);
    match configure!(RegexBuilder::new(pattern), flags, options).build() {
        Ok(regex) => {
            record(error, ffi::RURE_NO_ERROR);
            boxed(Compiled {
                regex,
                unicode: flags & ffi::RURE_FLAG_UNICODE != 0,
            })
        }
        Err(err) => {
            record(error, err);
            ptr::null_mut()
        }
    }
}

unsafe extern "C" fn free(re: *mut ffi::rure) {
    release::<Compiled, _>(re);
}

unsafe extern "C" fn is_match(re: *const ffi::rure, hay: *const u8, length: usize, start: usize) -> bool {
    let compiled = program(re);
    let hay = haystack(hay, length);
    if start > length || !compiled.regex.is_match_at(hay, start) {
        return false;
    }
    // the only match may be an empty one inside a character
    !compiled.unicode
        || aligned(compiled, hay, start, |re, hay, at| {
            re.find_at(hay, at).map(|m| (m.start(), m.end()))
        })
        .is_some()
}

unsafe extern "C" fn find(
    re: *const ffi::rure,
    hay: *const u8,
    length: usize,
    start: usize,
    matched: *mut rure_match,
) -> bool {
    if start > length {
        return false;
    }
    let found = aligned(program(re), haystack(hay, length), start, |re, hay, at| {
        re.find_at(hay, at).map(|m| (m.start(), m.end()))
    });
    match found {
        Some((start, end)) => {
            if let Some(out) = matched.as_mut() {
                *out = rure_match { start, end };
            }
            true
        }
        None => false,
    }
}

unsafe extern "C" fn find_captures(
    re: *const ffi::rure,
    hay: *const u8,
    length: usize,
    start: usize,
    captures: *mut ffi::rure_captures,
) -> bool {
    let locs = &mut *(captures as *mut CaptureLocations);
    start <= length
        && aligned(program(re), haystack(hay, length), start, |re, hay, at| {
            re.captures_read_at(locs, hay, at).map(|m| (m.start(), m.end()))
        })
        .is_some()
}

unsafe extern "C" fn shortest_match(
    re: *const ffi::rure,
    hay: *const u8,
    length: usize,
    start: usize,
    end: *mut usize,
) -> bool {
    let re = &program(re).regex;
    if start > length {
        return false;
    }
    match re.shortest_match_at(haystack(hay, length), start) {
        Some(e) => {
            if let Some(out) = end.as_mut() {
                *out = e;
            }
            true
        }
        None => false,
    }
}

unsafe extern "C" fn iter_capture_names_new(re: *const ffi::rure) -> *mut ffi::rure_iter_capture_names {
    let names = program(re)
        .regex
        .capture_names()
        .map(|name| CString::new(name.unwrap_or("")).unwrap_or_default())
        .collect();
    boxed(CaptureNames { names, pos: 0 })
}

unsafe extern "C" fn iter_capture_names_next(
    it: *mut ffi::rure_iter_capture_names,
    name: *mut *const c_char,
) -> bool {
    let it = &mut *(it as *mut CaptureNames);
    match it.names.get(it.pos) {
        Some(next) => {
            *name = next.as_ptr();
            it.pos += 1;
            true
        }
        None => false,
    }
}

unsafe extern "C" fn iter_capture_names_free(it: *mut ffi::rure_iter_capture_names) {
    release::<CaptureNames, _>(it);
}

unsafe extern "C" fn iter_new(re: *const ffi::rure) -> *mut ffi::rure_iter {
    boxed(Iter {
        re: re as *const Compiled,
        last_end: 0,
        last_match: None,
    })
}

/// Advances `it` to the next non-overlapping match, stepping past empty
/// matches so the sequence always terminates.
unsafe fn advance<F>(it: &mut Iter, hay: &[u8], mut search: F) -> Option<(usize, usize)>
where
    F: FnMut(&Regex, &[u8], usize) -> Option<(usize, usize)>,
{
    let compiled = &*it.re;
    loop {
        if it.last_end > hay.len() {
            return None;
        }
        let (start, end) = aligned(compiled, hay, it.last_end, &mut search)?;
        if start == end {
            it.last_end = step(compiled, hay, end);
            if it.last_match == Some(end) {
                continue;
            }
        } else {
            it.last_end = end;
        }
        it.last_match = Some(end);
        return Some((start, end));
    }
}

unsafe extern "C" fn iter_next(
    it: *mut ffi::rure_iter,
    hay: *const u8,
    length: usize,
    matched: *mut rure_match,
) -> bool {
    let it = &mut *(it as *mut Iter);
    let found = advance(it, haystack(hay, length), |re, hay, at| {
        re.find_at(hay, at).map(|m| (m.start(), m.end()))
    });
    match found {
        Some((start, end)) => {
            if let Some(out) = matched.as_mut() {
                *out = rure_match { start, end };
            }
            true
        }
        None => false,
    }
}

unsafe extern "C" fn iter_next_captures(
    it: *mut ffi::rure_iter,
    hay: *const u8,
    length: usize,
    captures: *mut ffi::rure_captures,
) -> bool {
    let it = &mut *(it as *mut Iter);
    let locs = &mut *(captures as *mut CaptureLocations);
    advance(it, haystack(hay, length), |re, hay, at| {
        re.captures_read_at(locs, hay, at).map(|m| (m.start(), m.end()))
    })
    .is_some()
}

unsafe extern "C" fn iter_free(it: *mut ffi::rure_iter) {
    release::<Iter, _>(it);
}

unsafe extern "C" fn captures_new(re: *const ffi::rure) -> *mut ffi::rure_captures {
    boxed(program(re).regex.capture_locations())
}

unsafe extern "C" fn captures_at(captures: *const ffi::rure_captures, i: usize, matched: *mut rure_match) -> bool {
    let locs = &*(captures as *const CaptureLocations);
    match locs.get(i) {
        Some((start, end)) => {
            if let Some(out) = matched.as_mut() {
                *out = rure_match { start, end };
            }
            true
        }
        None => false,
    }
}

unsafe extern "C" fn captures_len(captures: *const ffi::rure_captures) -> usize {
    (*(captures as *const CaptureLocations)).len()
}

unsafe extern "C" fn captures_free(captures: *mut ffi::rure_captures) {
    release::<CaptureLocations, _>(captures);
}

unsafe extern "C" fn options_new() -> *mut ffi::rure_options {
    boxed(Options {
        size_limit: ffi::RURE_DEFAULT_SIZE_LIMIT,
        dfa_size_limit: ffi::RURE_DEFAULT_DFA_SIZE_LIMIT,
    })
}

unsafe extern "C" fn options_size_limit(options: *mut ffi::rure_options, limit: usize) {
    if let Some(options) = (options as *mut Options).as_mut() {
        options.size_limit = limit;
    }
}

unsafe extern "C" fn options_dfa_size_limit(options: *mut ffi::rure_options, limit: usize) {
    if let Some(options) = (options as *mut Options).as_mut() {
        options.dfa_size_limit = limit;
    }
}

unsafe extern "C" fn options_free(options: *mut ffi::rure_options) {
    release::<Options, _>(options);
}

unsafe extern "C" fn compile_set(
    patterns: *const *const u8,
    patterns_lengths: *const usize,
    patterns_count: usize,
    flags: u32,
    options: *const ffi::rure_options,
    error: *mut ffi::rure_error,
) -> *mut ffi::rure_set {
    let pointers = slice::from_raw_parts(patterns, patterns_count);
    let lengths = slice::from_raw_parts(patterns_lengths, patterns_count);
    let mut texts = Vec::with_capacity(patterns_count);
    for (&pattern, &length) in pointers.iter().zip(lengths) {
        match str::from_utf8(slice::from_raw_parts(pattern, length)) {
            Ok(text) => texts.push(text),
            Err(err) => {
                record(error, err);
                return ptr::null_mut();
            }
        }
    }
    let options = options_or_default(options);
    match configure!(RegexSetBuilder::new(texts), flags, options).build() {
        Ok(set) => {
            record(error, ffi::RURE_NO_ERROR);
            boxed(set)
        }
        Err(err) => {
            record(error, err);
            ptr::null_mut()
        }
    }
}

unsafe extern "C" fn set_free(set: *mut ffi::rure_set) {
    release::<RegexSet, _>(set);
}

unsafe extern "C" fn set_is_match(set: *const ffi::rure_set, hay: *const u8, length: usize, start: usize) -> bool {
    let set = &*(set as *const RegexSet);
    start <= length && set.is_match_at(haystack(hay, length), start)
}

unsafe extern "C" fn set_matches(
    set: *const ffi::rure_set,
    hay: *const u8,
    length: usize,
    start: usize,
    matches: *mut bool,
) -> bool {
    let set = &*(set as *const RegexSet);
    let out = slice::from_raw_parts_mut(matches, set.len());
    out.fill(false);
    if start > length {
        return false;
    }
    let found = set.matches_at(haystack(hay, length), start);
    for index in found.iter() {
        out[index] = true;
    }
    found.matched_any()
}

unsafe extern "C" fn set_len(set: *const ffi::rure_set) -> usize {
    (*(set as *const RegexSet)).len()
}

unsafe extern "C" fn error_new() -> *mut ffi::rure_error {
    boxed(ErrorSlot {
        message: CString::new(ffi::RURE_NO_ERROR).unwrap_or_default(),
    })
}

unsafe extern "C" fn error_message(error: *const ffi::rure_error) -> *const c_char {
    (*(error as *const ErrorSlot)).message.as_ptr()
}

unsafe extern "C" fn error_free(error: *mut ffi::rure_error) {
    release::<ErrorSlot, _>(error);
}
