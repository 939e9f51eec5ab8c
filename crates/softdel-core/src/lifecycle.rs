//! Lifecycle hooks and intent-based dispatch.
//!
//! Models implement [`LifecycleHooks`] and override only the hooks they
//! need. The engine never calls hook methods directly: it calls
//! [`dispatch_before`] before issuing a statement and [`dispatch_after`]
//! once the affected-row count is known. Which hooks run is decided by
//! [`hook_plan`] from the statement kind and the deletion intent carried
//! on the [`OperationContext`].
//!
//! | operation | intent     | hooks (before / after)              |
//! |-----------|------------|-------------------------------------|
//! | update    | SoftDelete | soft-delete, then generic delete    |
//! | update    | Undelete   | undelete only                       |
//! | update    | None       | generic update                      |
//! | delete    | None       | hard-delete, then generic delete    |
//! | delete    | SoftDelete | generic delete only                 |
//! | insert    | any        | generic insert                      |

use std::fmt;

use crate::context::{DeletionIntent, Operation, OperationContext, Stage};
use crate::error::{Result, SoftDeleteError};

/// Before or after the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before,
    After,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

/// A single hook method of [`LifecycleHooks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    BeforeInsert,
    AfterInsert,
    BeforeUpdate,
    AfterUpdate,
    BeforeDelete,
    AfterDelete,
    BeforeSoftDelete,
    AfterSoftDelete,
    BeforeHardDelete,
    AfterHardDelete,
    BeforeUndelete,
    AfterUndelete,
}

impl HookPoint {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeforeInsert => "before_insert",
            Self::AfterInsert => "after_insert",
            Self::BeforeUpdate => "before_update",
            Self::AfterUpdate => "after_update",
            Self::BeforeDelete => "before_delete",
            Self::AfterDelete => "after_delete",
            Self::BeforeSoftDelete => "before_soft_delete",
            Self::AfterSoftDelete => "after_soft_delete",
            Self::BeforeHardDelete => "before_hard_delete",
            Self::AfterHardDelete => "after_hard_delete",
            Self::BeforeUndelete => "before_undelete",
            Self::AfterUndelete => "after_undelete",
        }
    }

    /// Whether this is one of the six soft-delete specific hooks.
    #[must_use]
    pub const fn is_specialized(self) -> bool {
        matches!(
            self,
            Self::BeforeSoftDelete
                | Self::AfterSoftDelete
                | Self::BeforeHardDelete
                | Self::AfterHardDelete
                | Self::BeforeUndelete
                | Self::AfterUndelete
        )
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hook methods a model may override. All default to no-ops.
///
/// Returning an error aborts the operation: a failing before-hook prevents
/// the statement from being issued, a failing after-hook is reported after
/// the statement has already run.
#[allow(unused_variables)]
pub trait LifecycleHooks {
    fn before_insert(&self, ctx: &OperationContext) -> Result<()> {
        Ok(())
    }

    fn after_insert(&self, ctx: &OperationContext) -> Result<()> {
        Ok(())
    }

    fn before_update(&self, ctx: &OperationContext) -> Result<()> {
        Ok(())
    }

    fn after_update(&self, ctx: &OperationContext) -> Result<()> {
        Ok(())
    }

    /// Runs for every kind of deletion, soft or hard.
    fn before_delete(&self, ctx: &OperationContext) -> Result<()> {
        Ok(())
    }

    /// Runs for every kind of deletion, soft or hard.
    fn after_delete(&self, ctx: &OperationContext) -> Result<()> {
        Ok(())
    }

    fn before_soft_delete(&self, ctx: &OperationContext) -> Result<()> {
        Ok(())
    }

    fn after_soft_delete(&self, ctx: &OperationContext) -> Result<()> {
        Ok(())
    }

    fn before_hard_delete(&self, ctx: &OperationContext) -> Result<()> {
        Ok(())
    }

    fn after_hard_delete(&self, ctx: &OperationContext) -> Result<()> {
        Ok(())
    }

    fn before_undelete(&self, ctx: &OperationContext) -> Result<()> {
        Ok(())
    }

    fn after_undelete(&self, ctx: &OperationContext) -> Result<()> {
        Ok(())
    }
}

/// Hooks to run, in order, for one phase of an operation.
#[must_use]
pub const fn hook_plan(
    operation: Operation,
    intent: DeletionIntent,
    phase: Phase,
) -> &'static [HookPoint] {
    use HookPoint as H;

    match (operation, intent, phase) {
        (Operation::Insert, _, Phase::Before) => &[H::BeforeInsert],
        (Operation::Insert, _, Phase::After) => &[H::AfterInsert],

        (Operation::Update, DeletionIntent::SoftDelete, Phase::Before) => {
            &[H::BeforeSoftDelete, H::BeforeDelete]
        }
        (Operation::Update, DeletionIntent::SoftDelete, Phase::After) => {
            &[H::AfterSoftDelete, H::AfterDelete]
        }
        (Operation::Update, DeletionIntent::Undelete, Phase::Before) => &[H::BeforeUndelete],
        (Operation::Update, DeletionIntent::Undelete, Phase::After) => &[H::AfterUndelete],
        (Operation::Update, DeletionIntent::None, Phase::Before) => &[H::BeforeUpdate],
        (Operation::Update, DeletionIntent::None, Phase::After) => &[H::AfterUpdate],

        (Operation::Delete, DeletionIntent::SoftDelete, Phase::Before) => &[H::BeforeDelete],
        (Operation::Delete, DeletionIntent::SoftDelete, Phase::After) => &[H::AfterDelete],
        (Operation::Delete, _, Phase::Before) => &[H::BeforeHardDelete, H::BeforeDelete],
        (Operation::Delete, _, Phase::After) => &[H::AfterHardDelete, H::AfterDelete],
    }
}

fn invoke<H: LifecycleHooks + ?Sized>(
    hooks: &H,
    point: HookPoint,
    ctx: &OperationContext,
) -> Result<()> {
    match point {
        HookPoint::BeforeInsert => hooks.before_insert(ctx),
        HookPoint::AfterInsert => hooks.after_insert(ctx),
        HookPoint::BeforeUpdate => hooks.before_update(ctx),
        HookPoint::AfterUpdate => hooks.after_update(ctx),
        HookPoint::BeforeDelete => hooks.before_delete(ctx),
        HookPoint::AfterDelete => hooks.after_delete(ctx),
        HookPoint::BeforeSoftDelete => hooks.before_soft_delete(ctx),
        HookPoint::AfterSoftDelete => hooks.after_soft_delete(ctx),
        HookPoint::BeforeHardDelete => hooks.before_hard_delete(ctx),
        HookPoint::AfterHardDelete => hooks.after_hard_delete(ctx),
        HookPoint::BeforeUndelete => hooks.before_undelete(ctx),
        HookPoint::AfterUndelete => hooks.after_undelete(ctx),
    }
}

fn run_plan<H: LifecycleHooks + ?Sized>(
    hooks: &H,
    ctx: &OperationContext,
    phase: Phase,
) -> Result<()> {
    for &point in hook_plan(ctx.operation(), ctx.intent(), phase) {
        tracing::debug!(
            table = ctx.table(),
            hook = %point,
            intent = %ctx.intent(),
            "dispatching lifecycle hook"
        );
        if let Err(err) = invoke(hooks, point, ctx) {
            tracing::warn!(table = ctx.table(), hook = %point, error = %err, "lifecycle hook failed");
            return Err(err);
        }
    }
    Ok(())
}

/// Run the before-hooks for `ctx` and move it to [`Stage::Dispatching`].
///
/// # Errors
///
/// Returns `DispatchState` if `ctx` is not idle, or the first hook error.
pub fn dispatch_before<H: LifecycleHooks + ?Sized>(
    hooks: &H,
    ctx: &mut OperationContext,
) -> Result<()> {
    if ctx.stage != Stage::Idle {
        return Err(SoftDeleteError::DispatchState {
            phase: Phase::Before.as_str(),
            stage: ctx.stage,
        });
    }
    ctx.stage = Stage::Dispatching;
    run_plan(hooks, ctx, Phase::Before)
}

/// Record the statement result, run the after-hooks and consume the intent.
///
/// # Errors
///
/// Returns `DispatchState` if [`dispatch_before`] has not run for `ctx`,
/// or the first hook error.
pub fn dispatch_after<H: LifecycleHooks + ?Sized>(
    hooks: &H,
    ctx: &mut OperationContext,
    affected: usize,
) -> Result<()> {
    if ctx.stage != Stage::Dispatching {
        return Err(SoftDeleteError::DispatchState {
            phase: Phase::After.as_str(),
            stage: ctx.stage,
        });
    }
    ctx.affected = Some(affected);
    let result = run_plan(hooks, ctx, Phase::After);
    ctx.intent = DeletionIntent::None;
    ctx.stage = Stage::Done;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<HookPoint>>,
        fail_on: Option<HookPoint>,
    }

    impl Recorder {
        fn record(&self, point: HookPoint) -> Result<()> {
            self.calls.borrow_mut().push(point);
            if self.fail_on == Some(point) {
                return Err(SoftDeleteError::hook(format!("{point} refused")));
            }
            Ok(())
        }
    }

    impl LifecycleHooks for Recorder {
        fn before_update(&self, _ctx: &OperationContext) -> Result<()> {
            self.record(HookPoint::BeforeUpdate)
        }
        fn after_update(&self, _ctx: &OperationContext) -> Result<()> {
            self.record(HookPoint::AfterUpdate)
        }
        fn before_delete(&self, _ctx: &OperationContext) -> Result<()> {
            self.record(HookPoint::BeforeDelete)
        }
        fn after_delete(&self, _ctx: &OperationContext) -> Result<()> {
            self.record(HookPoint::AfterDelete)
        }
        fn before_soft_delete(&self, _ctx: &OperationContext) -> Result<()> {
            self.record(HookPoint::BeforeSoftDelete)
        }
        fn after_soft_delete(&self, _ctx: &OperationContext) -> Result<()> {
            self.record(HookPoint::AfterSoftDelete)
        }
        fn before_hard_delete(&self, _ctx: &OperationContext) -> Result<()> {
            self.record(HookPoint::BeforeHardDelete)
        }
        fn after_hard_delete(&self, _ctx: &OperationContext) -> Result<()> {
            self.record(HookPoint::AfterHardDelete)
        }
        fn before_undelete(&self, _ctx: &OperationContext) -> Result<()> {
            self.record(HookPoint::BeforeUndelete)
        }
        fn after_undelete(&self, _ctx: &OperationContext) -> Result<()> {
            self.record(HookPoint::AfterUndelete)
        }
    }

    fn run(recorder: &Recorder, operation: Operation, intent: DeletionIntent) -> Vec<HookPoint> {
        let mut ctx = OperationContext::new("Items", operation).with_intent(intent);
        dispatch_before(recorder, &mut ctx).unwrap();
        dispatch_after(recorder, &mut ctx, 1).unwrap();
        recorder.calls.borrow().clone()
    }

    #[test]
    fn test_soft_delete_runs_soft_and_generic_delete_hooks() {
        let calls = run(
            &Recorder::default(),
            Operation::Update,
            DeletionIntent::SoftDelete,
        );
        assert_eq!(
            calls,
            vec![
                HookPoint::BeforeSoftDelete,
                HookPoint::BeforeDelete,
                HookPoint::AfterSoftDelete,
                HookPoint::AfterDelete,
            ]
        );
    }

    #[test]
    fn test_undelete_runs_only_undelete_hooks() {
        let calls = run(
            &Recorder::default(),
            Operation::Update,
            DeletionIntent::Undelete,
        );
        assert_eq!(
            calls,
            vec![HookPoint::BeforeUndelete, HookPoint::AfterUndelete]
        );
    }

    #[test]
    fn test_plain_update_runs_generic_update_hooks() {
        let calls = run(&Recorder::default(), Operation::Update, DeletionIntent::None);
        assert_eq!(calls, vec![HookPoint::BeforeUpdate, HookPoint::AfterUpdate]);
        assert!(!calls.iter().any(|p| p.is_specialized()));
    }

    #[test]
    fn test_hard_delete_runs_hard_and_generic_delete_hooks() {
        let calls = run(&Recorder::default(), Operation::Delete, DeletionIntent::None);
        assert_eq!(
            calls,
            vec![
                HookPoint::BeforeHardDelete,
                HookPoint::BeforeDelete,
                HookPoint::AfterHardDelete,
                HookPoint::AfterDelete,
            ]
        );
    }

    #[test]
    fn test_tagged_delete_skips_hard_delete_hooks() {
        let calls = run(
            &Recorder::default(),
            Operation::Delete,
            DeletionIntent::SoftDelete,
        );
        assert_eq!(calls, vec![HookPoint::BeforeDelete, HookPoint::AfterDelete]);
    }

    #[test]
    fn test_update_hooks_exclusive_with_specialized() {
        for intent in [DeletionIntent::SoftDelete, DeletionIntent::Undelete] {
            for phase in [Phase::Before, Phase::After] {
                let plan = hook_plan(Operation::Update, intent, phase);
                assert!(!plan.contains(&HookPoint::BeforeUpdate));
                assert!(!plan.contains(&HookPoint::AfterUpdate));
            }
        }
    }

    #[test]
    fn test_after_consumes_intent() {
        let recorder = Recorder::default();
        let mut ctx =
            OperationContext::new("Items", Operation::Update).with_intent(DeletionIntent::Undelete);
        dispatch_before(&recorder, &mut ctx).unwrap();
        assert_eq!(ctx.stage(), Stage::Dispatching);
        assert_eq!(ctx.affected(), None);
        dispatch_after(&recorder, &mut ctx, 3).unwrap();
        assert_eq!(ctx.stage(), Stage::Done);
        assert_eq!(ctx.intent(), DeletionIntent::None);
        assert_eq!(ctx.affected(), Some(3));
    }

    #[test]
    fn test_dispatch_out_of_order_rejected() {
        let recorder = Recorder::default();
        let mut ctx = OperationContext::new("Items", Operation::Update);
        assert!(matches!(
            dispatch_after(&recorder, &mut ctx, 0),
            Err(SoftDeleteError::DispatchState { .. })
        ));
        dispatch_before(&recorder, &mut ctx).unwrap();
        assert!(matches!(
            dispatch_before(&recorder, &mut ctx),
            Err(SoftDeleteError::DispatchState { .. })
        ));
    }

    #[test]
    fn test_failing_hook_stops_plan() {
        let recorder = Recorder {
            fail_on: Some(HookPoint::BeforeSoftDelete),
            ..Recorder::default()
        };
        let mut ctx = OperationContext::new("Items", Operation::Update)
            .with_intent(DeletionIntent::SoftDelete);
        let err = dispatch_before(&recorder, &mut ctx).unwrap_err();
        assert!(err.is_hook_failure());
        assert_eq!(*recorder.calls.borrow(), vec![HookPoint::BeforeSoftDelete]);
    }
}
