//! Protocol forwarding to inner iterables (`yield*` delegation).
//!
//! While a delegate is active, protocol calls against the outer generator are
//! forwarded into the inner iterable instead of stepping the outer body.
//! Delegation is a distinct mode of the dispatcher rather than structural
//! recursion, because the inner iterable may itself suspend independently
//! between host turns.

use crate::{
    runtime::{
        dispatch::Request,
        flow::{Completion, IterResult},
        table::Label,
    },
    Error,
};

/// Result of forwarding one protocol call into an iterable.
///
/// `Err(Error::Uncaught(value))` is how an inner iterable raises: the value
/// becomes a throw completion at the forwarding site. Any other error is an
/// engine fault and propagates unchanged.
pub type DelegateResult<V> = crate::Result<IterResult<V>, V>;

/// The iterator protocol expected of delegation targets.
///
/// `next` is mandatory; `throw` and `finish` have defaults matching an
/// iterable that exposes neither: an injected error runs `finish` for
/// cleanup and then re-raises, and a finish request completes immediately
/// with the requested value.
///
/// [`Generator`](crate::Generator) implements this trait, so generators can
/// delegate to generators with full completion semantics; [`IterDelegate`]
/// adapts any plain [`Iterator`].
pub trait Iterable<V> {
    /// Advances the iterable, feeding `sent` into its suspended position.
    ///
    /// # Errors
    ///
    /// `Error::Uncaught` when the iterable raises; other variants are engine
    /// faults from a nested runtime.
    fn next(&mut self, sent: Option<V>) -> DelegateResult<V>;

    /// Injects `error` at the iterable's suspended position.
    ///
    /// The default, for iterables with no throw handling, runs return-side
    /// cleanup and re-raises the error at the forwarding site.
    ///
    /// # Errors
    ///
    /// `Error::Uncaught` when the error is not handled internally; a raise
    /// from the cleanup pass replaces the injected error.
    fn throw(&mut self, error: V) -> DelegateResult<V> {
        self.finish(None)?;
        Err(Error::Uncaught(error))
    }

    /// Requests early completion with `value`.
    ///
    /// The default, for iterables with nothing to clean up, reports done
    /// immediately so the outer return proceeds with the requested value.
    ///
    /// # Errors
    ///
    /// `Error::Uncaught` when cleanup raises.
    fn finish(&mut self, value: Option<V>) -> DelegateResult<V> {
        Ok(IterResult::finished(value))
    }
}

/// Adapts a plain [`Iterator`] into a delegation target.
///
/// Sent values are discarded and completion carries no value, matching how a
/// host iterable without suspend semantics behaves under delegation.
pub struct IterDelegate<I>(
    /// The wrapped iterator.
    pub I,
);

impl<I: Iterator> Iterable<I::Item> for IterDelegate<I> {
    fn next(&mut self, _sent: Option<I::Item>) -> DelegateResult<I::Item> {
        Ok(match self.0.next() {
            Some(value) => IterResult::yielded(value),
            None => IterResult::finished(None),
        })
    }
}

/// An active delegation: the inner iterable plus the outer resume label.
pub(crate) struct DelegateState<V> {
    /// The inner iterable receiving forwarded protocol calls.
    pub iter: Box<dyn Iterable<V>>,
    /// Outer label to resume at once the delegate completes.
    pub resume: Label,
}

/// Outcome of forwarding one protocol call through an active delegate.
pub(crate) enum Forwarded<V> {
    /// The inner yielded; its value goes outward and delegation stays active.
    Yield(Option<V>),
    /// The inner completed under a next/throw request; the outer body resumes
    /// with its final value as the sent value.
    Resume(Option<V>),
    /// Delegation is over and the outer level must process this completion.
    Abrupt(Completion<V>),
}

/// Forwards `request` into the delegate per the delegation contract.
///
/// A not-done inner result always surfaces as an outward yield. A done result
/// resumes the outer body, except under a finish request, where the inner's
/// completion value becomes an outer return completion still subject to outer
/// finally regions. An inner raise becomes an outer throw completion.
///
/// # Errors
///
/// Engine faults from a nested runtime propagate unchanged.
pub(crate) fn forward<V>(
    delegate: &mut DelegateState<V>,
    request: Request<V>,
) -> crate::Result<Forwarded<V>, V> {
    let finishing = matches!(request, Request::Finish(_));
    let result = match request {
        Request::Next(sent) => delegate.iter.next(sent),
        Request::Throw(error) => delegate.iter.throw(error),
        Request::Finish(value) => delegate.iter.finish(value),
    };
    match result {
        Err(Error::Uncaught(error)) => Ok(Forwarded::Abrupt(Completion::Throw(error))),
        Err(fault) => Err(fault),
        Ok(inner) if !inner.done => Ok(Forwarded::Yield(inner.value)),
        Ok(inner) if finishing => Ok(Forwarded::Abrupt(Completion::Return(inner.value))),
        Ok(inner) => Ok(Forwarded::Resume(inner.value)),
    }
}
