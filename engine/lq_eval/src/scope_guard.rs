//! RAII scope swapping for the execution context.
//!
//! [`ScopeSwap`] installs a scope on an [`ExecutionContext`] and puts the
//! previous one back when dropped, including during unwinding. Blocks swap
//! in a child of the current scope; action calls swap in a fresh root.
//!
//! The guard holds `&mut ExecutionContext` and implements `Deref`/`DerefMut`,
//! so the body runs against the guard exactly as it would against the
//! context.

use std::ops::{Deref, DerefMut};

use crate::context::ExecutionContext;
use crate::environment::{LocalScope, Scope};

pub struct ScopeSwap<'guard, 'ctx> {
    ctx: &'guard mut ExecutionContext<'ctx>,
    saved: Option<LocalScope<Scope>>,
}

impl<'guard, 'ctx> ScopeSwap<'guard, 'ctx> {
    /// Make `scope` current until the guard drops.
    pub fn enter(ctx: &'guard mut ExecutionContext<'ctx>, scope: Scope) -> Self {
        let saved = std::mem::replace(&mut ctx.scope, LocalScope::new(scope));
        ScopeSwap {
            ctx,
            saved: Some(saved),
        }
    }

    /// Enter a block scope under the current one.
    pub fn block(ctx: &'guard mut ExecutionContext<'ctx>) -> Self {
        let child = Scope::child(&ctx.scope);
        ScopeSwap::enter(ctx, child)
    }
}

impl Drop for ScopeSwap<'_, '_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.ctx.scope = saved;
        }
    }
}

impl<'ctx> Deref for ScopeSwap<'_, 'ctx> {
    type Target = ExecutionContext<'ctx>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for ScopeSwap<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}
