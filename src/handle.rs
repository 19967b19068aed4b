//! Exclusive owners for every handle the engine hands out.
//!
//! Each wrapper holds exactly one non-null engine pointer and gives it back
//! to the matching `*_free` entry point in `Drop`. Raw pointers never leave
//! this module except as arguments to engine calls.

use crate::error::{Error, Result};
use crate::ffi::{self, EngineTable};
use crate::flags::Flags;
use crate::names::CaptureNames;
use crate::options::Options;
use crate::regex::{CaptureSet, Span};
use std::ffi::{c_char, CStr};
use std::ptr::{self, NonNull};
use std::sync::Arc;

pub(crate) type Engine = &'static EngineTable;

fn allocated<T>(raw: *mut T, what: &str) -> Result<NonNull<T>> {
    NonNull::new(raw).ok_or_else(|| Error::Engine(format!("engine failed to allocate {what}")))
}

/// Engine error slot, read once after the call it was passed to.
struct ErrorSlot {
    engine: Engine,
    ptr: NonNull<ffi::rure_error>,
}

impl ErrorSlot {
    fn new(engine: Engine) -> Result<Self> {
        let ptr = allocated(unsafe { (engine.error_new)() }, "an error slot")?;
        Ok(ErrorSlot { engine, ptr })
    }

    fn as_ptr(&self) -> *mut ffi::rure_error {
        self.ptr.as_ptr()
    }

    /// Routes the slot's message through [`Error::classify`].
    fn check(&self) -> Result<()> {
        let message = unsafe { (self.engine.error_message)(self.ptr.as_ptr()) };
        if message.is_null() {
            return Err(Error::Engine("engine returned no diagnostic".to_string()));
        }
        // SAFETY: the message is a NUL-terminated string owned by the slot,
        // valid until the slot is freed or written again.
        let message = unsafe { CStr::from_ptr(message) }.to_string_lossy();
        Error::classify(&message)
    }
}

impl Drop for ErrorSlot {
    fn drop(&mut self) {
        unsafe { (self.engine.error_free)(self.ptr.as_ptr()) }
    }
}

/// Engine option block configured from [`Options`].
struct OptionBlock {
    engine: Engine,
    ptr: NonNull<ffi::rure_options>,
}

impl OptionBlock {
    fn new(engine: Engine, options: &Options) -> Result<Self> {
        let ptr = allocated(unsafe { (engine.options_new)() }, "an option block")?;
        let block = OptionBlock { engine, ptr };
        if let Some(limit) = options.get_size_limit() {
            unsafe { (engine.options_size_limit)(block.ptr.as_ptr(), limit) }
        }
        if let Some(limit) = options.get_dfa_size_limit() {
            unsafe { (engine.options_dfa_size_limit)(block.ptr.as_ptr(), limit) }
        }
        Ok(block)
    }

    fn as_ptr(&self) -> *const ffi::rure_options {
        self.ptr.as_ptr()
    }
}

impl Drop for OptionBlock {
    fn drop(&mut self) {
        unsafe { (self.engine.options_free)(self.ptr.as_ptr()) }
    }
}

/// Takes ownership of what a compile call produced, or reports why it failed.
///
/// A handle returned together with a failure message is released before the
/// error is returned, so callers never see a half-built value.
fn checked<T>(raw: *mut T, error: &ErrorSlot, free: unsafe extern "C" fn(*mut T)) -> Result<NonNull<T>> {
    let handle = NonNull::new(raw);
    if let Err(err) = error.check() {
        if let Some(handle) = handle {
            unsafe { free(handle.as_ptr()) }
        }
        return Err(err);
    }
    handle.ok_or_else(|| Error::Engine("engine returned no handle and no diagnostic".to_string()))
}

/// One compiled pattern.
pub(crate) struct Program {
    engine: Engine,
    ptr: NonNull<ffi::rure>,
    names: Arc<CaptureNames>,
}

impl Program {
    pub(crate) fn compile(engine: Engine, pattern: &[u8], flags: Flags, options: &Options) -> Result<Self> {
        let error = ErrorSlot::new(engine)?;
        let block = OptionBlock::new(engine, options)?;
        let raw = unsafe {
            (engine.compile)(
                pattern.as_ptr(),
                pattern.len(),
                flags.to_engine(),
                block.as_ptr(),
                error.as_ptr(),
            )
        };
        let ptr = checked(raw, &error, engine.free)?;
        let mut program = Program {
            engine,
            ptr,
            names: Arc::new(CaptureNames::default()),
        };
        let names = CaptureNames::from_engine(NameIter::new(&program)?);
        program.names = Arc::new(names);
        log::debug!(
            "compiled {:?} with flags {:?} ({} groups)",
            String::from_utf8_lossy(pattern),
            flags,
            program.names.len()
        );
        Ok(program)
    }

    pub(crate) fn names(&self) -> &Arc<CaptureNames> {
        &self.names
    }

    pub(crate) fn engine(&self) -> Engine {
        self.engine
    }

    fn as_ptr(&self) -> *const ffi::rure {
        self.ptr.as_ptr()
    }

    pub(crate) fn is_match(&self, haystack: &[u8], start: usize) -> bool {
        if start > haystack.len() {
            return false;
        }
        unsafe { (self.engine.is_match)(self.as_ptr(), haystack.as_ptr(), haystack.len(), start) }
    }

    pub(crate) fn find(&self, haystack: &[u8], start: usize) -> Option<Span> {
        if start > haystack.len() {
            return None;
        }
        let mut matched = ffi::rure_match::default();
        let found = unsafe {
            (self.engine.find)(self.as_ptr(), haystack.as_ptr(), haystack.len(), start, &mut matched)
        };
        found.then(|| Span::from(matched))
    }

    pub(crate) fn captures(&self, haystack: &[u8], start: usize) -> Result<Option<CaptureSet>> {
        if start > haystack.len() {
            return Ok(None);
        }
        let buffer = CaptureBuffer::new(self)?;
        let found = unsafe {
            (self.engine.find_captures)(
                self.as_ptr(),
                haystack.as_ptr(),
                haystack.len(),
                start,
                buffer.as_ptr(),
            )
        };
        Ok(found.then(|| buffer.snapshot(&self.names)))
    }

    pub(crate) fn shortest_match(&self, haystack: &[u8], start: usize) -> Option<usize> {
        if start > haystack.len() {
            return None;
        }
        let mut end = 0;
        let found = unsafe {
            (self.engine.shortest_match)(self.as_ptr(), haystack.as_ptr(), haystack.len(), start, &mut end)
        };
        found.then_some(end)
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        log::trace!("releasing compiled program {:p}", self.ptr);
        unsafe { (self.engine.free)(self.ptr.as_ptr()) }
    }
}

// SAFETY: a compiled program is immutable after construction and the engine
// allows concurrent read-only use; all per-call state lives in separately
// owned iterator and capture-buffer handles.
unsafe impl Send for Program {}
// SAFETY: see above.
unsafe impl Sync for Program {}

/// Name stream of one compiled program.
pub(crate) struct NameIter<'p> {
    program: &'p Program,
    ptr: NonNull<ffi::rure_iter_capture_names>,
}

impl<'p> NameIter<'p> {
    fn new(program: &'p Program) -> Result<Self> {
        let raw = unsafe { (program.engine.iter_capture_names_new)(program.as_ptr()) };
        Ok(NameIter {
            program,
            ptr: allocated(raw, "a capture name iterator")?,
        })
    }
}

impl Iterator for NameIter<'_> {
    /// `None` marks an unnamed group.
    type Item = Option<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut name: *const c_char = ptr::null();
        let more = unsafe { (self.program.engine.iter_capture_names_next)(self.ptr.as_ptr(), &mut name) };
        if !more {
            return None;
        }
        if name.is_null() {
            return Some(None);
        }
        // SAFETY: the name is owned by the iterator handle, which is still live.
        let name = unsafe { CStr::from_ptr(name) }.to_string_lossy();
        Some((!name.is_empty()).then(|| name.into_owned()))
    }
}

impl Drop for NameIter<'_> {
    fn drop(&mut self) {
        unsafe { (self.program.engine.iter_capture_names_free)(self.ptr.as_ptr()) }
    }
}

/// Reusable engine buffer that receives one match's group offsets.
pub(crate) struct CaptureBuffer<'p> {
    program: &'p Program,
    ptr: NonNull<ffi::rure_captures>,
}

impl<'p> CaptureBuffer<'p> {
    pub(crate) fn new(program: &'p Program) -> Result<Self> {
        let raw = unsafe { (program.engine.captures_new)(program.as_ptr()) };
        Ok(CaptureBuffer {
            program,
            ptr: allocated(raw, "a capture buffer")?,
        })
    }

    fn as_ptr(&self) -> *mut ffi::rure_captures {
        self.ptr.as_ptr()
    }

    /// Copies the buffer's current contents out before the next engine call
    /// overwrites them.
    pub(crate) fn snapshot(&self, names: &Arc<CaptureNames>) -> CaptureSet {
        let engine = self.program.engine;
        let len = unsafe { (engine.captures_len)(self.as_ptr()) };
        let spans = (0..len)
            .map(|i| {
                let mut matched = ffi::rure_match::default();
                let present = unsafe { (engine.captures_at)(self.as_ptr(), i, &mut matched) };
                present.then(|| Span::from(matched))
            })
            .collect();
        CaptureSet::new(spans, Arc::clone(names))
    }
}

impl Drop for CaptureBuffer<'_> {
    fn drop(&mut self) {
        unsafe { (self.program.engine.captures_free)(self.ptr.as_ptr()) }
    }
}

/// Engine-side cursor of one iteration sequence.
pub(crate) struct IterHandle<'p> {
    program: &'p Program,
    ptr: NonNull<ffi::rure_iter>,
}

impl<'p> IterHandle<'p> {
    pub(crate) fn new(program: &'p Program) -> Result<Self> {
        let raw = unsafe { (program.engine.iter_new)(program.as_ptr()) };
        Ok(IterHandle {
            program,
            ptr: allocated(raw, "an iterator")?,
        })
    }

    pub(crate) fn next_match(&mut self, haystack: &[u8]) -> Option<Span> {
        let mut matched = ffi::rure_match::default();
        let found = unsafe {
            (self.program.engine.iter_next)(self.ptr.as_ptr(), haystack.as_ptr(), haystack.len(), &mut matched)
        };
        found.then(|| Span::from(matched))
    }

    pub(crate) fn next_captures(&mut self, haystack: &[u8], buffer: &CaptureBuffer<'_>) -> bool {
        unsafe {
            (self.program.engine.iter_next_captures)(
                self.ptr.as_ptr(),
                haystack.as_ptr(),
                haystack.len(),
                buffer.as_ptr(),
            )
        }
    }
}

impl Drop for IterHandle<'_> {
    fn drop(&mut self) {
        unsafe { (self.program.engine.iter_free)(self.ptr.as_ptr()) }
    }
}

/// One compiled pattern set.
pub(crate) struct SetProgram {
    engine: Engine,
    ptr: NonNull<ffi::rure_set>,
}

impl SetProgram {
    pub(crate) fn compile<P: AsRef<[u8]>>(
        engine: Engine,
        patterns: &[P],
        flags: Flags,
        options: &Options,
    ) -> Result<Self> {
        if patterns.is_empty() {
            return Err(Error::EmptySet);
        }
        let pointers: Vec<*const u8> = patterns.iter().map(|p| p.as_ref().as_ptr()).collect();
        let lengths: Vec<usize> = patterns.iter().map(|p| p.as_ref().len()).collect();

        let error = ErrorSlot::new(engine)?;
        let block = OptionBlock::new(engine, options)?;
        let raw = unsafe {
            (engine.compile_set)(
                pointers.as_ptr(),
                lengths.as_ptr(),
                patterns.len(),
                flags.to_engine(),
                block.as_ptr(),
                error.as_ptr(),
            )
        };
        let ptr = checked(raw, &error, engine.set_free)?;
        log::debug!("compiled set of {} patterns with flags {:?}", patterns.len(), flags);
        Ok(SetProgram { engine, ptr })
    }

    pub(crate) fn len(&self) -> usize {
        unsafe { (self.engine.set_len)(self.ptr.as_ptr()) }
    }

    pub(crate) fn is_match(&self, haystack: &[u8], start: usize) -> bool {
        if start > haystack.len() {
            return false;
        }
        unsafe { (self.engine.set_is_match)(self.ptr.as_ptr(), haystack.as_ptr(), haystack.len(), start) }
    }

    pub(crate) fn matches(&self, haystack: &[u8], start: usize) -> Vec<bool> {
        let mut matches = vec![false; self.len()];
        if start > haystack.len() {
            return matches;
        }
        unsafe {
            (self.engine.set_matches)(
                self.ptr.as_ptr(),
                haystack.as_ptr(),
                haystack.len(),
                start,
                matches.as_mut_ptr(),
            );
        }
        matches
    }
}

impl Drop for SetProgram {
    fn drop(&mut self) {
        log::trace!("releasing compiled set {:p}", self.ptr);
        unsafe { (self.engine.set_free)(self.ptr.as_ptr()) }
    }
}

// SAFETY: same reasoning as `Program`: immutable after construction.
unsafe impl Send for SetProgram {}
// SAFETY: see above.
unsafe impl Sync for SetProgram {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, COUNTING};

    #[test]
    fn test_compile_releases_scratch_handles() {
        testing::reset();
        let program = Program::compile(&COUNTING, b"(?P<year>\\d{4})", Flags::DEFAULT, &Options::new()).unwrap();
        // only the compiled program itself outlives construction
        assert_eq!(testing::live(), 1);
        assert_eq!(program.names().len(), 2);
        drop(program);
        testing::assert_clean();
    }

    #[test]
    fn test_failed_compile_leaks_nothing() {
        testing::reset();
        let err = Program::compile(&COUNTING, b"(", Flags::DEFAULT, &Options::new()).err();
        assert!(matches!(err, Some(Error::Syntax(_))));
        testing::assert_clean();

        let err = Program::compile(&COUNTING, b"\\w{100}", Flags::DEFAULT, &Options::new().size_limit(0)).err();
        assert!(matches!(err, Some(Error::SizeLimitExceeded(_))));
        testing::assert_clean();
    }

    #[test]
    fn test_abandoned_iteration_releases_cursor() {
        testing::reset();
        let program = Program::compile(&COUNTING, b"\\w+", Flags::DEFAULT, &Options::new()).unwrap();
        {
            let mut cursor = IterHandle::new(&program).unwrap();
            let buffer = CaptureBuffer::new(&program).unwrap();
            assert!(cursor.next_captures(b"abc xyz", &buffer));
            assert_eq!(testing::live(), 3);
        }
        assert_eq!(testing::live(), 1);
        drop(program);
        testing::assert_clean();
    }

    #[test]
    fn test_start_past_end_is_no_match() {
        let program = Program::compile(EngineTable::builtin(), b"a*", Flags::DEFAULT, &Options::new()).unwrap();
        assert!(program.is_match(b"aaa", 3));
        assert!(!program.is_match(b"aaa", 4));
        assert_eq!(program.find(b"aaa", 4), None);
        assert_eq!(program.captures(b"aaa", 4), Ok(None));
        assert_eq!(program.shortest_match(b"aaa", 4), None);
    }

    #[test]
    fn test_set_compile_and_release() {
        testing::reset();
        let set = SetProgram::compile(&COUNTING, &[b"baz", b"bar", b"foo"], Flags::DEFAULT, &Options::new()).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.matches(b"foobar", 0), vec![false, true, true]);
        drop(set);
        testing::assert_clean();

        let empty: [&[u8]; 0] = [];
        let err = SetProgram::compile(&COUNTING, &empty, Flags::DEFAULT, &Options::new()).err();
        assert_eq!(err, Some(Error::EmptySet));
        testing::assert_clean();
    }
}
