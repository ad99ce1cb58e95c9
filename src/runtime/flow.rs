//! Completion and step-signal types exchanged between the compiled body and
//! the dispatcher.
//!
//! A compiled step function reports one [`Flow`] per invocation; abrupt
//! control transfers travel as [`Completion`] values until they are resolved
//! against the exception table or escape the generator.

use std::fmt;

use strum::Display;

use crate::runtime::{delegate::Iterable, table::Label};

/// The result of one protocol call: the standard iterator-result pair.
///
/// `value` is the yielded value while `done` is `false`; once `done` is
/// `true` it carries the generator's final return value, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterResult<V> {
    /// The yielded or returned value.
    pub value: Option<V>,
    /// Whether the generator has completed.
    pub done: bool,
}

impl<V> IterResult<V> {
    /// Creates a not-done result carrying a yielded value.
    #[must_use]
    pub fn yielded(value: V) -> Self {
        IterResult {
            value: Some(value),
            done: false,
        }
    }

    /// Creates a done result carrying the final return value.
    #[must_use]
    pub fn finished(value: Option<V>) -> Self {
        IterResult { value, done: true }
    }
}

/// An abrupt completion: a non-normal exit that may need to cross protected
/// regions before reaching its destination.
///
/// At most one completion is pending on a [`Context`](crate::runtime::Context)
/// at any time. Completions suspended by an entered finally body are parked
/// in the context's finally records until the body signals
/// [`Flow::EndFinally`].
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<V> {
    /// Return from the generator with an optional value, running every
    /// enclosing finally on the way out.
    Return(Option<V>),
    /// A thrown value looking for the nearest enclosing catch handler.
    Throw(V),
    /// A structural exit to `target` that must run the finally of every
    /// region it leaves. Breaks, continues, and normal try exits all travel
    /// in this form.
    Leave(Label),
}

impl<V> Completion<V> {
    /// Returns the kind tag of this completion.
    #[must_use]
    pub fn kind(&self) -> CompletionKind {
        match self {
            Completion::Return(_) => CompletionKind::Return,
            Completion::Throw(_) => CompletionKind::Throw,
            Completion::Leave(_) => CompletionKind::Leave,
        }
    }
}

/// Kind tag for [`Completion`], used in diagnostics.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum CompletionKind {
    /// A return completion.
    Return,
    /// A throw completion.
    Throw,
    /// A structural leave completion.
    Leave,
}

/// What one invocation of the compiled step function reports back to the
/// dispatcher.
///
/// The step function runs forward from the context's current position and,
/// before returning any of these, sets the position to the label where the
/// next step resumes (for [`Flow::EndFinally`], the region's finally-end
/// label itself).
pub enum Flow<V> {
    /// Suspend, handing `value` outward as the result of this resume.
    Yield(V),
    /// Normal completion with the function's return value. Still subject to
    /// enclosing finally regions.
    Return(Option<V>),
    /// The body raised a value; resolved like a thrown error injected from
    /// outside.
    Raise(V),
    /// Structural exit to `target`, running intervening finally bodies first.
    Leave(Label),
    /// The innermost in-flight finally body finished; the dispatcher
    /// re-delivers its suspended completion.
    EndFinally,
    /// Begin delegating the protocol to `iter`; when it completes, the outer
    /// body resumes at `resume` with the delegate's final value as the sent
    /// value.
    Delegate {
        /// The inner iterable receiving forwarded protocol calls.
        iter: Box<dyn Iterable<V>>,
        /// Outer label to resume at once the delegate completes.
        resume: Label,
    },
}

impl<V: fmt::Debug> fmt::Debug for Flow<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Yield(value) => f.debug_tuple("Yield").field(value).finish(),
            Flow::Return(value) => f.debug_tuple("Return").field(value).finish(),
            Flow::Raise(value) => f.debug_tuple("Raise").field(value).finish(),
            Flow::Leave(target) => f.debug_tuple("Leave").field(target).finish(),
            Flow::EndFinally => f.write_str("EndFinally"),
            Flow::Delegate { resume, .. } => f
                .debug_struct("Delegate")
                .field("resume", resume)
                .finish_non_exhaustive(),
        }
    }
}
