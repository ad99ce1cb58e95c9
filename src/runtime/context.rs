//! Per-activation suspend state for one generator instance.
//!
//! Each running generator owns exactly one [`Context`]. Between protocol
//! calls the context is the only place state lives: the resume position, the
//! value to feed into the body on the next resume, the pending abrupt
//! completion, the stack of active protected regions, the completions parked
//! by entered finally bodies, and the active delegate, if any.
//!
//! # Lifecycle
//!
//! 1. Create with [`new()`](Context::new) at the compiled body's start label
//! 2. The dispatcher mutates position, pending completion, and bookkeeping
//!    fields as it drives the body
//! 3. The compiled body reads its resume point via [`position()`](Context::position),
//!    advances it via [`set_position()`](Context::set_position), and consumes
//!    the resumed value via [`take_sent()`](Context::take_sent)
//! 4. Once the instance completes, [`is_done()`](Context::is_done) stays true
//!    and the remaining fields are never read again
//!
//! # Thread Safety
//!
//! A context belongs to a single generator activation and is driven
//! synchronously; instances never share state.

use std::fmt;

use crate::runtime::{
    delegate::DelegateState,
    flow::{Completion, CompletionKind},
    table::Label,
};

/// A suspended completion belonging to an entered finally body.
///
/// Pushed when an abrupt completion is routed into a finally handler and
/// popped when the body signals `Flow::EndFinally` (re-delivery) or when a
/// new abrupt completion crosses out of the body (override).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FinallyRecord<V> {
    /// Index of the region whose finally body is running.
    pub entry: usize,
    /// The completion to re-deliver once the body finishes.
    pub suspended: Completion<V>,
}

/// The mutable suspend-state record carried across every step of one
/// generator instance.
///
/// The context has no behavior of its own beyond initialization and
/// [`reset()`](Self::reset); all side effects are field mutations observed by
/// the dispatcher. The compiled body's contract surface is limited to
/// [`position()`](Self::position), [`set_position()`](Self::set_position) and
/// [`take_sent()`](Self::take_sent).
pub struct Context<V> {
    /// The compiled body's distinguished start label, kept for `reset`.
    start: Label,

    /// Current resume label; mutated by the dispatcher after every step.
    pub(crate) position: Label,

    /// Value passed into the generator on the next resume, consumed exactly
    /// once then cleared.
    pub(crate) sent: Option<V>,

    /// The live abrupt completion, if any. At most one at a time; cleared
    /// once dispatched to a handler or propagated out.
    pub(crate) pending: Option<Completion<V>>,

    /// Indices of the regions whose range contains `position`, outermost
    /// first. Re-synced by the dispatcher before every resolution and step.
    pub(crate) try_stack: Vec<usize>,

    /// Suspended completions of entered finally bodies, LIFO.
    pub(crate) finally_records: Vec<FinallyRecord<V>>,

    /// Inner iterable currently receiving forwarded protocol calls.
    pub(crate) delegate: Option<DelegateState<V>>,

    /// Terminal flag; once set, all further protocol calls are inert or
    /// rejected and no other field is read again.
    pub(crate) done: bool,
}

impl<V> Context<V> {
    /// Creates a fresh context positioned at the compiled body's start label.
    #[must_use]
    pub fn new(start: Label) -> Self {
        Context {
            start,
            position: start,
            sent: None,
            pending: None,
            try_stack: Vec::new(),
            finally_records: Vec::new(),
            delegate: None,
            done: false,
        }
    }

    /// Returns the current resume label.
    #[must_use]
    pub fn position(&self) -> Label {
        self.position
    }

    /// Sets the label at which the next step resumes.
    ///
    /// Part of the compiled-form contract: the step function calls this
    /// before returning any [`Flow`](crate::Flow) signal.
    pub fn set_position(&mut self, label: Label) {
        self.position = label;
    }

    /// Takes the value sent into this resume, leaving `None`.
    ///
    /// The sent value is consumed exactly once per resume. After a caught
    /// throw it carries the caught error, bound by the unwinder when it
    /// resumed the catch handler.
    pub fn take_sent(&mut self) -> Option<V> {
        self.sent.take()
    }

    /// Checks whether the instance has completed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Returns the kind of the pending abrupt completion, if one is live.
    #[must_use]
    pub fn pending_kind(&self) -> Option<CompletionKind> {
        self.pending.as_ref().map(Completion::kind)
    }

    /// Checks whether an inner iterable is currently receiving forwarded
    /// protocol calls.
    #[must_use]
    pub fn is_delegating(&self) -> bool {
        self.delegate.is_some()
    }

    /// Restores the initial state for generator-function re-invocation.
    ///
    /// Resets the position to the start label and clears every transient
    /// field. Only meaningful when paired with a fresh compiled body, since
    /// step closures own their captured locals; [`GeneratorFn`](crate::GeneratorFn)
    /// rebuilds both together.
    pub fn reset(&mut self) {
        self.position = self.start;
        self.sent = None;
        self.pending = None;
        self.try_stack.clear();
        self.finally_records.clear();
        self.delegate = None;
        self.done = false;
    }

    /// Marks the instance terminal and drops all transient state.
    ///
    /// Called by the dispatcher when a completion escapes the generator.
    pub(crate) fn complete(&mut self) {
        self.done = true;
        self.sent = None;
        self.pending = None;
        self.try_stack.clear();
        self.finally_records.clear();
        self.delegate = None;
    }
}

impl<V: fmt::Debug> fmt::Debug for Context<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("position", &self.position)
            .field("sent", &self.sent)
            .field("pending", &self.pending)
            .field("try_stack", &self.try_stack)
            .field("finally_records", &self.finally_records)
            .field("delegate", &self.delegate.as_ref().map(|d| d.resume))
            .field("done", &self.done)
            .finish()
    }
}
