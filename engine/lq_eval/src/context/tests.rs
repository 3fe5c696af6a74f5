use super::*;
use crate::access::AccessController;
use crate::diagnostics::CallFrame;
use crate::test_helpers::Harness;
use crate::ExecErrorKind;
use pretty_assertions::assert_eq;

/// A harness whose caller is `alice` and whose default role has lost Call.
fn without_call() -> Harness {
    let mut harness = Harness::read_only();
    harness.tx = TxContext::new("alice");
    harness
        .access
        .revoke_privileges("default", &[Privilege::Call], None)
        .unwrap();
    harness
}

fn view(public: bool) -> ActionModifiers {
    if public {
        ActionModifiers::PUBLIC | ActionModifiers::VIEW
    } else {
        ActionModifiers::VIEW
    }
}

fn denied(namespace: &str) -> ExecErrorKind {
    ExecErrorKind::PermissionDenied {
        privilege: Privilege::Call,
        namespace: Some(namespace.to_string()),
    }
}

#[test]
fn top_level_call_needs_call_privilege() {
    let mut harness = without_call();
    let ctx = harness.ctx();
    let err = ctx.can_execute("main", "outer", view(true)).unwrap_err();
    assert_eq!(err.kind, denied("main"));
}

#[test]
fn call_within_the_namespace_skips_call_privilege() {
    let mut harness = without_call();
    let mut ctx = harness.ctx();
    ctx.call_stack.push(CallFrame::new("main", "outer")).unwrap();
    ctx.can_execute("main", "inner", view(false)).unwrap();
    ctx.can_execute("main", "inner", view(true)).unwrap();
}

#[test]
fn call_into_another_namespace_needs_call_privilege() {
    let mut harness = without_call();
    let mut ctx = harness.ctx();
    ctx.call_stack.push(CallFrame::new("main", "outer")).unwrap();
    let err = ctx.can_execute("lib", "helper", view(true)).unwrap_err();
    assert_eq!(err.kind, denied("lib"));
}

#[test]
fn private_check_precedes_privilege_check() {
    let mut harness = without_call();
    let mut ctx = harness.ctx();
    ctx.call_stack.push(CallFrame::new("main", "outer")).unwrap();
    let err = ctx.can_execute("lib", "helper", view(false)).unwrap_err();
    assert_eq!(
        err.kind,
        ExecErrorKind::ActionPrivate {
            name: "helper".to_string()
        }
    );
}
