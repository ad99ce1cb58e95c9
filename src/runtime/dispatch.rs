//! The dispatch loop driving compiled generator bodies.
//!
//! Every protocol call against a [`Generator`](crate::Generator) funnels into
//! [`run`]: the request is translated into starting state on the
//! [`Context`], then the loop alternates between resolving pending abrupt
//! completions against the exception table and invoking the compiled step
//! function, until the body yields, completes, or faults. While a delegate is
//! active the request is forwarded into the inner iterable instead of
//! stepping the outer body.
//!
//! # Execution Limits
//!
//! A compiled body that never suspends would spin this loop forever. The
//! optional per-resume step budget in [`DispatchLimits`] bounds the number of
//! step invocations one protocol call may consume; exceeding it completes
//! the instance with [`Error::StepLimitExceeded`].

use crate::{
    runtime::{
        context::Context,
        delegate::{forward, DelegateState, Forwarded},
        flow::{Completion, Flow, IterResult},
        table::ExceptionTable,
        unwind::{resolve, sync_try_stack, Resolution},
    },
    Error,
};

/// One protocol call, in the form the dispatcher consumes.
#[derive(Debug)]
pub(crate) enum Request<V> {
    /// Resume normally, feeding `sent` into the suspended position.
    Next(Option<V>),
    /// Inject an error at the suspended position.
    Throw(V),
    /// Request early completion with an optional final value.
    Finish(Option<V>),
}

/// Execution limits for one generator instance.
///
/// Use the builder method for fluent configuration:
///
/// ```rust
/// use genrun::DispatchLimits;
///
/// let limits = DispatchLimits::new().with_max_steps(1_000_000);
/// ```
///
/// # Default Values
///
/// | Limit | Default Value |
/// |-------|---------------|
/// | `max_steps` | 0 (unlimited) |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchLimits {
    /// Maximum step invocations per resume.
    ///
    /// Set to 0 for unlimited execution. When exceeded, the instance
    /// completes with a step limit error.
    pub max_steps: u64,
}

impl DispatchLimits {
    /// Creates limits with the default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum step invocations per resume.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }
}

impl Default for DispatchLimits {
    fn default() -> Self {
        DispatchLimits { max_steps: 0 }
    }
}

/// Counters accumulated over the lifetime of one generator instance.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    /// Total step invocations of the compiled body.
    pub steps: u64,
    /// Protocol calls that drove the instance.
    pub resumes: u64,
    /// Abrupt completions resolved against the exception table.
    pub unwinds: u64,
}

/// Drives one protocol call to its boundary event.
///
/// Returns when the body yields or the instance completes. On any escape,
/// fault, or exhausted budget the context is marked done first, so a failed
/// instance never resumes.
///
/// # Errors
///
/// - [`Error::AlreadyDone`] for a throw request on a finished instance
/// - [`Error::Uncaught`] when a throw completion escapes every region
/// - [`Error::StepLimitExceeded`] when the per-resume budget is exhausted
/// - [`Error::Malformed`] when the compiled body breaks the runtime contract
pub(crate) fn run<V>(
    step: &mut dyn FnMut(&mut Context<V>) -> Flow<V>,
    table: &ExceptionTable,
    limits: &DispatchLimits,
    stats: &mut DispatchStats,
    ctx: &mut Context<V>,
    request: Request<V>,
) -> crate::Result<IterResult<V>, V> {
    if ctx.is_done() {
        return match request {
            Request::Next(_) => Ok(IterResult::finished(None)),
            Request::Throw(_) => Err(Error::AlreadyDone),
            Request::Finish(value) => Ok(IterResult::finished(value)),
        };
    }
    stats.resumes += 1;

    if ctx.is_delegating() {
        if let Some(result) = pump_delegate(ctx, request)? {
            return Ok(result);
        }
    } else {
        match request {
            Request::Next(sent) => ctx.sent = sent,
            Request::Throw(error) => ctx.pending = Some(Completion::Throw(error)),
            Request::Finish(value) => ctx.pending = Some(Completion::Return(value)),
        }
    }

    let mut executed: u64 = 0;
    loop {
        sync_try_stack(ctx, table);

        if let Some(completion) = ctx.pending.take() {
            stats.unwinds += 1;
            match resolve(table, ctx, completion) {
                Resolution::Resume { label, sent } => {
                    ctx.set_position(label);
                    ctx.sent = sent;
                    sync_try_stack(ctx, table);
                }
                Resolution::Escape(Completion::Return(value)) => {
                    ctx.complete();
                    return Ok(IterResult::finished(value));
                }
                Resolution::Escape(Completion::Throw(error)) => {
                    ctx.complete();
                    return Err(Error::Uncaught(error));
                }
                Resolution::Escape(Completion::Leave(target)) => {
                    ctx.complete();
                    return Err(malformed_error!(
                        "leave completion escaped the generator (target label {})",
                        target
                    ));
                }
            }
        }

        executed += 1;
        stats.steps += 1;
        if limits.max_steps > 0 && executed > limits.max_steps {
            ctx.complete();
            return Err(Error::StepLimitExceeded {
                executed,
                limit: limits.max_steps,
            });
        }

        match step(ctx) {
            Flow::Yield(value) => return Ok(IterResult::yielded(value)),
            Flow::Return(value) => ctx.pending = Some(Completion::Return(value)),
            Flow::Raise(error) => ctx.pending = Some(Completion::Throw(error)),
            Flow::Leave(target) => ctx.pending = Some(Completion::Leave(target)),
            Flow::EndFinally => end_finally(table, ctx)?,
            Flow::Delegate { iter, resume } => {
                ctx.delegate = Some(DelegateState { iter, resume });
                if let Some(result) = pump_delegate(ctx, Request::Next(None))? {
                    return Ok(result);
                }
            }
        }
    }
}

/// Forwards one request into the active delegate and applies the outcome.
///
/// `Ok(Some(_))` is a boundary event to hand outward; `Ok(None)` means the
/// delegation ended and the outer loop continues at the stored resume label.
fn pump_delegate<V>(
    ctx: &mut Context<V>,
    request: Request<V>,
) -> crate::Result<Option<IterResult<V>>, V> {
    let mut state = match ctx.delegate.take() {
        Some(state) => state,
        None => {
            ctx.complete();
            return Err(malformed_error!("delegate pump without an active delegate"));
        }
    };
    match forward(&mut state, request) {
        Ok(Forwarded::Yield(value)) => {
            ctx.delegate = Some(state);
            Ok(Some(IterResult { value, done: false }))
        }
        Ok(Forwarded::Resume(value)) => {
            ctx.set_position(state.resume);
            ctx.sent = value;
            Ok(None)
        }
        Ok(Forwarded::Abrupt(completion)) => {
            ctx.set_position(state.resume);
            ctx.pending = Some(completion);
            Ok(None)
        }
        Err(fault) => {
            ctx.complete();
            Err(fault)
        }
    }
}

/// Ends the innermost in-flight finally body and re-delivers its suspended
/// completion as the new pending completion.
fn end_finally<V>(table: &ExceptionTable, ctx: &mut Context<V>) -> crate::Result<(), V> {
    let record = match ctx.finally_records.pop() {
        Some(record) => record,
        None => {
            ctx.complete();
            return Err(malformed_error!(
                "end-of-finally signal with no finally in flight"
            ));
        }
    };
    let entry = table.entry(record.entry);
    if entry.finally_end != Some(ctx.position) {
        ctx.complete();
        return Err(malformed_error!(
            "end-of-finally signal at label {} outside the finally body ending at {:?}",
            ctx.position,
            entry.finally_end
        ));
    }
    ctx.pending = Some(record.suspended);
    Ok(())
}
