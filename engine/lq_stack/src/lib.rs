//! Stack growth for the interpreter.
//!
//! Action bodies are compiled into nested closures, so evaluating a deeply
//! nested expression or a chain of action calls recurses on the native
//! stack. The interpreter bounds call depth itself (see its call stack
//! limit); this crate makes sure that bound is reached as a clean error and
//! not as a native stack overflow.
//!
//! On native targets the stack is grown on demand with `stacker`. On WASM
//! the closure is called directly.

/// Grow the stack when less than this much remains (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment (2MB).
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if the remaining space is below the
/// red zone.
///
/// Wrap every recursion point of the evaluator with this: statement
/// execution, expression evaluation, and action invocation.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Remaining native stack in bytes, when the platform can tell.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn remaining_stack() -> Option<usize> {
    stacker::remaining_stack()
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn remaining_stack() -> Option<usize> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_result_through() {
        let result: Result<i64, &str> = ensure_sufficient_stack(|| Ok(7));
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn test_nested_closures() {
        // Mirrors the shape of compiled action bodies: each level is a boxed
        // closure that calls the next.
        fn nest(depth: u32) -> Box<dyn Fn() -> u32> {
            if depth == 0 {
                return Box::new(|| 0);
            }
            let inner = nest(depth - 1);
            Box::new(move || ensure_sufficient_stack(|| inner() + 1))
        }

        assert_eq!(nest(1_000)(), 1_000);
    }

    #[test]
    fn test_deep_recursion() {
        fn count_down(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { count_down(n - 1) + 1 })
        }

        assert_eq!(count_down(100_000), 100_000);
    }

    #[test]
    #[cfg(not(target_arch = "wasm32"))]
    fn test_remaining_stack_is_known() {
        assert!(remaining_stack().is_some_and(|bytes| bytes > 0));
    }
}
