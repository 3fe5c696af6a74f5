//! Call-frame tracking.
//!
//! Every action invocation pushes a [`CallFrame`]; the depth check lives in
//! [`CallStack::push`], so an action that recurses without a base case fails
//! with [`ExecErrorKind::CallDepthExceeded`](crate::ExecErrorKind) long before
//! the native stack or memory run out.

use crate::errors::{call_depth_exceeded, CallTrace, ExecError};

/// Frames kept in a captured trace. Deep recursion reports its innermost
/// calls only.
const MAX_TRACE_FRAMES: usize = 32;

/// One action invocation in the live call stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    pub namespace: String,
    pub action: String,
}

impl CallFrame {
    pub fn new(namespace: impl Into<String>, action: impl Into<String>) -> Self {
        CallFrame {
            namespace: namespace.into(),
            action: action.into(),
        }
    }
}

/// Live call stack of one top-level call.
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: usize,
}

impl CallStack {
    pub fn new(max_depth: usize) -> Self {
        CallStack {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame, failing when the depth limit is reached. The frame is
    /// not pushed on failure.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), ExecError> {
        if self.frames.len() >= self.max_depth {
            return Err(call_depth_exceeded(self.max_depth));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        debug_assert!(!self.frames.is_empty(), "CallStack::pop() on an empty stack");
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn current(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Snapshot of the stack, innermost call first.
    pub fn capture(&self) -> CallTrace {
        CallTrace::new(
            self.frames
                .iter()
                .rev()
                .take(MAX_TRACE_FRAMES)
                .map(|frame| format!("{}.{}", frame.namespace, frame.action))
                .collect(),
        )
    }

    /// Attach the current trace to `err` unless it already carries one.
    pub fn attach(&self, err: ExecError) -> ExecError {
        if self.frames.is_empty() {
            return err;
        }
        err.with_trace(self.capture())
    }
}
