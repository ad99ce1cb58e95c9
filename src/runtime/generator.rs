//! Generator instances and the functions that produce them.
//!
//! A [`CompiledBody`] is the external compiler's output: a start label, an
//! exception table, and a step closure over the body's locals. [`wrap`]
//! validates the table and turns the body into a live [`Generator`] exposing
//! the three protocol calls `next`, `throw` and `finish`. [`mark`] lifts a
//! body factory into a reusable [`GeneratorFn`], mirroring how a generator
//! function produces a fresh instance per invocation.
//!
//! # Examples
//!
//! ```rust
//! use genrun::{wrap, CompiledBody, ExceptionTable, Flow, IterResult};
//!
//! // yield 1; yield 2; return 3;
//! let body = CompiledBody::new(0, ExceptionTable::empty(), |ctx| match ctx.position() {
//!     0 => {
//!         ctx.set_position(1);
//!         Flow::Yield(1)
//!     }
//!     1 => {
//!         ctx.set_position(2);
//!         Flow::Yield(2)
//!     }
//!     _ => Flow::Return(Some(3)),
//! });
//!
//! let mut generator = wrap(body)?;
//! assert_eq!(generator.next(None)?, IterResult::yielded(1));
//! assert_eq!(generator.next(None)?, IterResult::yielded(2));
//! assert_eq!(generator.next(None)?, IterResult::finished(Some(3)));
//! # Ok::<(), genrun::Error<i32>>(())
//! ```

use crate::runtime::{
    context::Context,
    delegate::{DelegateResult, Iterable},
    dispatch::{run, DispatchLimits, DispatchStats, Request},
    flow::{Flow, IterResult},
    table::{ExceptionTable, Label},
};

/// The step closure of a compiled body.
///
/// Invoked with the instance's [`Context`]; reads the resume point via
/// [`Context::position`], consumes the resumed value via
/// [`Context::take_sent`], and reports one [`Flow`] signal per invocation.
pub type StepFn<V> = Box<dyn FnMut(&mut Context<V>) -> Flow<V>>;

/// A compiled, flattened generator body as produced by an external compiler.
///
/// Carries no per-activation state beyond the step closure's captured
/// locals; all suspend state lives in the [`Context`] the runtime pairs it
/// with.
pub struct CompiledBody<V> {
    /// Label the first resume starts at.
    start: Label,
    /// The body's protected regions.
    table: ExceptionTable,
    /// The label-dispatching step closure.
    step: StepFn<V>,
}

impl<V> CompiledBody<V> {
    /// Packages a start label, exception table and step closure.
    ///
    /// The table is not validated here; [`wrap`] validates it when the body
    /// becomes a live instance.
    pub fn new(
        start: Label,
        table: ExceptionTable,
        step: impl FnMut(&mut Context<V>) -> Flow<V> + 'static,
    ) -> Self {
        CompiledBody {
            start,
            table,
            step: Box::new(step),
        }
    }
}

/// Turns a compiled body into a live generator instance.
///
/// # Errors
///
/// [`Error::Malformed`](crate::Error::Malformed) when the body's exception
/// table violates the structural rules (empty ranges, missing handlers,
/// partially overlapping regions).
pub fn wrap<V>(body: CompiledBody<V>) -> crate::Result<Generator<V>, V> {
    wrap_with_limits(body, DispatchLimits::default())
}

/// Like [`wrap`], with explicit execution limits.
///
/// # Errors
///
/// [`Error::Malformed`](crate::Error::Malformed) when the body's exception
/// table is structurally invalid.
pub fn wrap_with_limits<V>(
    body: CompiledBody<V>,
    limits: DispatchLimits,
) -> crate::Result<Generator<V>, V> {
    body.table.validate()?;
    let ctx = Context::new(body.start);
    Ok(Generator {
        body,
        ctx,
        limits,
        stats: DispatchStats::default(),
    })
}

/// A live generator instance: one compiled body paired with its suspend
/// state.
///
/// All three protocol calls take `&mut self`, so re-entrant resumption of a
/// running instance is ruled out at compile time. Every call drives the body
/// to its next boundary event: a yield, completion, or an error. Once the
/// instance is done, `next` is inert, `throw` is rejected, and `finish`
/// reflects its argument back.
pub struct Generator<V> {
    body: CompiledBody<V>,
    ctx: Context<V>,
    limits: DispatchLimits,
    stats: DispatchStats,
}

impl<V> Generator<V> {
    /// Resumes the body, feeding `sent` into the suspended position.
    ///
    /// On the first call the body starts from its start label and `sent`
    /// should be `None`; a suspended yield expression evaluates to the sent
    /// value on subsequent calls.
    ///
    /// # Errors
    ///
    /// - [`Error::Uncaught`](crate::Error::Uncaught) when the body raises
    ///   without a handler
    /// - [`Error::StepLimitExceeded`](crate::Error::StepLimitExceeded) when
    ///   the per-resume budget is exhausted
    /// - [`Error::Malformed`](crate::Error::Malformed) when the body breaks
    ///   the runtime contract
    pub fn next(&mut self, sent: Option<V>) -> crate::Result<IterResult<V>, V> {
        self.dispatch(Request::Next(sent))
    }

    /// Injects `error` at the suspended position, as if the suspended yield
    /// expression had thrown it.
    ///
    /// The error is resolved against the exception table exactly like a
    /// raise from inside the body: the nearest enclosing catch receives it,
    /// intervening finally bodies run, and without a handler it escapes as
    /// [`Error::Uncaught`](crate::Error::Uncaught).
    ///
    /// # Errors
    ///
    /// - [`Error::Uncaught`](crate::Error::Uncaught) when no handler takes it
    /// - [`Error::AlreadyDone`](crate::Error::AlreadyDone) when the instance
    ///   has already completed
    pub fn throw(&mut self, error: V) -> crate::Result<IterResult<V>, V> {
        self.dispatch(Request::Throw(error))
    }

    /// Requests early completion with `value`, as if the suspended position
    /// had returned it.
    ///
    /// Enclosing finally bodies still run, and may override the completion
    /// by returning or raising themselves. On an already-done instance the
    /// value is reflected back.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`next`](Self::next), raised by finally bodies
    /// run during the wind-down.
    pub fn finish(&mut self, value: Option<V>) -> crate::Result<IterResult<V>, V> {
        self.dispatch(Request::Finish(value))
    }

    /// Checks whether the instance has completed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.ctx.is_done()
    }

    /// Checks whether an inner iterable is currently receiving forwarded
    /// protocol calls.
    #[must_use]
    pub fn is_delegating(&self) -> bool {
        self.ctx.is_delegating()
    }

    /// Returns the counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Borrowing iterator over the remaining yields.
    ///
    /// See [`IterMut`] for the item protocol.
    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut { generator: self }
    }

    fn dispatch(&mut self, request: Request<V>) -> crate::Result<IterResult<V>, V> {
        run(
            &mut self.body.step,
            &self.body.table,
            &self.limits,
            &mut self.stats,
            &mut self.ctx,
            request,
        )
    }
}

/// Generators are themselves delegation targets, so a body may delegate to
/// another generator with full completion semantics: an injected error meets
/// the inner instance's own catch and finally regions before re-raising.
impl<V> Iterable<V> for Generator<V> {
    fn next(&mut self, sent: Option<V>) -> DelegateResult<V> {
        Generator::next(self, sent)
    }

    fn throw(&mut self, error: V) -> DelegateResult<V> {
        Generator::throw(self, error)
    }

    fn finish(&mut self, value: Option<V>) -> DelegateResult<V> {
        Generator::finish(self, value)
    }
}

/// A generator function: a factory producing a fresh instance per call.
///
/// The step closure owns its captured locals, so re-invocation cannot reuse
/// a spent body; the factory rebuilds body and suspend state together.
pub struct GeneratorFn<V> {
    factory: Box<dyn Fn() -> CompiledBody<V>>,
    limits: DispatchLimits,
}

/// Lifts a compiled-body factory into a [`GeneratorFn`].
pub fn mark<V>(factory: impl Fn() -> CompiledBody<V> + 'static) -> GeneratorFn<V> {
    GeneratorFn {
        factory: Box::new(factory),
        limits: DispatchLimits::default(),
    }
}

impl<V> GeneratorFn<V> {
    /// Sets the execution limits applied to every produced instance.
    #[must_use]
    pub fn with_limits(mut self, limits: DispatchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Produces a fresh generator instance.
    ///
    /// # Errors
    ///
    /// [`Error::Malformed`](crate::Error::Malformed) when the factory's
    /// exception table is structurally invalid.
    pub fn call(&self) -> crate::Result<Generator<V>, V> {
        wrap_with_limits((self.factory)(), self.limits)
    }
}

/// Drives the generator one boundary event forward for the iterator
/// adapters.
///
/// Valueless yields (possible only through a delegate) carry nothing a Rust
/// iterator item could hold, so the pump skips past them.
fn pump<V>(generator: &mut Generator<V>) -> Option<crate::Result<V, V>> {
    loop {
        if generator.is_done() {
            return None;
        }
        match generator.next(None) {
            Ok(IterResult { done: true, .. }) => return None,
            Ok(IterResult {
                value: Some(value), ..
            }) => return Some(Ok(value)),
            Ok(IterResult { value: None, .. }) => continue,
            Err(error) => return Some(Err(error)),
        }
    }
}

/// Borrowing iterator over a generator's yields.
///
/// Each item is a yielded value or the error that completed the instance;
/// the generator's final return value is not an item, matching for-of
/// iteration semantics.
pub struct IterMut<'a, V> {
    generator: &'a mut Generator<V>,
}

impl<V> Iterator for IterMut<'_, V> {
    type Item = crate::Result<V, V>;

    fn next(&mut self) -> Option<Self::Item> {
        pump(self.generator)
    }
}

/// Owning iterator over a generator's yields.
pub struct IntoIter<V> {
    generator: Generator<V>,
}

impl<V> Iterator for IntoIter<V> {
    type Item = crate::Result<V, V>;

    fn next(&mut self) -> Option<Self::Item> {
        pump(&mut self.generator)
    }
}

impl<V> IntoIterator for Generator<V> {
    type Item = crate::Result<V, V>;
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> IntoIter<V> {
        IntoIter { generator: self }
    }
}

impl<'a, V> IntoIterator for &'a mut Generator<V> {
    type Item = crate::Result<V, V>;
    type IntoIter = IterMut<'a, V>;

    fn into_iter(self) -> IterMut<'a, V> {
        self.iter_mut()
    }
}
