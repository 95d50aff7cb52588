//! Stack safety for the recursive passes.
//!
//! Parsing, resolving and evaluating all recurse on the host stack, once per
//! nesting level of the source and once per Lox call.  Wrapping those
//! recursion points in [`ensure_sufficient_stack`] grows the stack on demand
//! instead of overflowing it.  Source nesting is capped by the parser and
//! runaway Lox recursion by the interpreter’s call-depth limit.

/// Grow when less than this much stack remains (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
