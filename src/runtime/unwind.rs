//! Abrupt-completion resolution against the exception table.
//!
//! Native nested `try/catch/finally` needs host non-local control transfer;
//! here it is re-expressed as a flat, statically ordered table of label
//! ranges resolved by innermost-first containment lookup. Given the current
//! position and a pending [`Completion`], the unwinder answers one question:
//! where does control resume, and with what bookkeeping?
//!
//! - A throw resumes at the nearest enclosing catch, with the error bound as
//!   the resumed sent value.
//! - A return (and a structural leave) enters every finally it passes
//!   through, innermost to outermost. Each entered finally parks the
//!   in-flight completion in a [`FinallyRecord`]; the body's `EndFinally`
//!   signal re-delivers it later.
//! - A completion produced inside a finally body whose destination crosses
//!   out of that body overrides (discards) the suspended completion, which
//!   is how an explicit `return` inside `finally` wins over the original
//!   completion.
//! - A completion with no matching region escapes the generator.

use crate::runtime::{
    context::{Context, FinallyRecord},
    flow::Completion,
    table::{ExceptionTable, Label},
};

/// Where an abrupt completion landed.
#[derive(Debug, PartialEq)]
pub(crate) enum Resolution<V> {
    /// Control resumes inside the compiled body.
    Resume {
        /// Label the dispatcher re-invokes the step function at.
        label: Label,
        /// Value to bind as the resumed sent value (the caught error).
        sent: Option<V>,
    },
    /// The completion propagates out of the generator entirely.
    Escape(Completion<V>),
}

/// The handler selected by the innermost-first search.
enum Picked {
    /// Resume at a catch handler.
    Catch(Label),
    /// Enter a finally body, suspending the in-flight completion.
    Finally(usize, Label),
    /// No enclosing region handles this completion.
    Nothing,
}

/// Rebuilds the context's active-region stack for its current position.
///
/// The stack holds the indices of every region whose range contains the
/// position, outermost first, so its reverse walk is the innermost-first
/// handler search order.
pub(crate) fn sync_try_stack<V>(ctx: &mut Context<V>, table: &ExceptionTable) {
    ctx.try_stack = table.enclosing(ctx.position);
}

/// Resolves `completion` against the regions active at the context's
/// position.
///
/// The context's `try_stack` must be in sync (see [`sync_try_stack`]) before
/// calling. On a resume into a finally body the in-flight completion is
/// pushed onto the context's finally records; suspended completions of any
/// finally bodies the destination crosses out of are discarded.
pub(crate) fn resolve<V>(
    table: &ExceptionTable,
    ctx: &mut Context<V>,
    completion: Completion<V>,
) -> Resolution<V> {
    let mut picked = Picked::Nothing;
    for &idx in ctx.try_stack.iter().rev() {
        let entry = table.entry(idx);
        match &completion {
            Completion::Throw(_) => {
                if let Some(label) = entry.catch_label {
                    picked = Picked::Catch(label);
                    break;
                }
                if let Some(label) = entry.finally_label {
                    picked = Picked::Finally(idx, label);
                    break;
                }
            }
            Completion::Return(_) => {
                if let Some(label) = entry.finally_label {
                    picked = Picked::Finally(idx, label);
                    break;
                }
            }
            Completion::Leave(target) => {
                if entry.contains(*target) {
                    // The target stays inside this region, so every outer
                    // region keeps containing it as well. Nothing to run.
                    break;
                }
                if let Some(label) = entry.finally_label {
                    picked = Picked::Finally(idx, label);
                    break;
                }
            }
        }
    }

    match (picked, completion) {
        (Picked::Catch(label), Completion::Throw(error)) => {
            discard_crossed(table, ctx, Some(label));
            Resolution::Resume {
                label,
                sent: Some(error),
            }
        }
        (Picked::Finally(entry, label), completion) => {
            discard_crossed(table, ctx, Some(label));
            ctx.finally_records.push(FinallyRecord {
                entry,
                suspended: completion,
            });
            Resolution::Resume { label, sent: None }
        }
        (Picked::Catch(_) | Picked::Nothing, Completion::Leave(target)) => {
            discard_crossed(table, ctx, Some(target));
            Resolution::Resume {
                label: target,
                sent: None,
            }
        }
        (Picked::Catch(_) | Picked::Nothing, completion) => {
            discard_crossed(table, ctx, None);
            Resolution::Escape(completion)
        }
    }
}

/// Discards suspended completions of finally bodies the destination leaves.
///
/// Records are popped LIFO while the destination label falls outside the
/// record's finally-body span; the walk stops at the first record whose body
/// still contains the destination. A `None` destination (an escaping
/// completion) crosses everything.
fn discard_crossed<V>(table: &ExceptionTable, ctx: &mut Context<V>, destination: Option<Label>) {
    match destination {
        Some(label) => {
            while let Some(record) = ctx.finally_records.last() {
                if table.entry(record.entry).finally_span_contains(label) {
                    break;
                }
                ctx.finally_records.pop();
            }
        }
        None => ctx.finally_records.clear(),
    }
}
