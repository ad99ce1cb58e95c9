use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers every failure mode of the generator runtime: an uncaught value thrown
/// through the generator, protocol misuse on a finished instance, a malformed compiled form,
/// and an exhausted step budget. The type parameter `V` is the value type carried by the
/// generator, since an uncaught throw surfaces the thrown value itself.
///
/// # Error Categories
///
/// ## Completion Errors
/// - [`Error::Uncaught`] - A throw completion escaped every protected region
///
/// ## Protocol Errors
/// - [`Error::AlreadyDone`] - `throw` was invoked on an instance that already completed
///
/// ## Compiled-Form Errors
/// - [`Error::Malformed`] - The compiled form violated the runtime contract
///
/// ## Limit Errors
/// - [`Error::StepLimitExceeded`] - The per-resume step budget was exhausted
///
/// # Examples
///
/// ```rust
/// use genrun::{wrap, CompiledBody, ExceptionTable, Error, Flow};
///
/// let body = CompiledBody::new(0, ExceptionTable::empty(), |_ctx| Flow::Raise("boom"));
/// let mut generator = wrap(body)?;
///
/// match generator.next(None) {
///     Err(Error::Uncaught(value)) => assert_eq!(value, "boom"),
///     other => panic!("expected an uncaught throw, got {:?}", other),
/// }
/// # Ok::<(), genrun::Error<&'static str>>(())
/// ```
#[derive(Error, Debug)]
pub enum Error<V> {
    /// A throw completion escaped the generator entirely.
    ///
    /// Raised when neither the compiled form's exception table nor an active
    /// delegate provides a handler for a thrown value. The instance is marked
    /// done before this error is surfaced; the payload is the thrown value.
    #[error("uncaught throw completion: {0:?}")]
    Uncaught(V),

    /// A protocol method was invoked on an instance that already completed.
    ///
    /// Only `throw` is rejected this way: `next` on a finished instance is an
    /// inert `{value: None, done: true}` and `finish` reflects its argument
    /// back, matching the iterator protocol.
    #[error("protocol call on a generator that is already done")]
    AlreadyDone,

    /// The compiled form violated the runtime contract.
    ///
    /// This indicates that the external compiler produced an invalid program:
    /// an exception-table entry with no handler, an inverted or partially
    /// overlapping label range, a finally without its end label, or an
    /// end-of-finally signal with no finally in flight. Not recoverable.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The per-resume step budget was exhausted.
    ///
    /// A compiled body that never suspends would otherwise spin the dispatch
    /// loop forever; the budget is configured through
    /// [`DispatchLimits`](crate::runtime::DispatchLimits) and is unbounded by
    /// default.
    #[error("step limit exceeded - executed {executed} of {limit} allowed steps")]
    StepLimitExceeded {
        /// Number of step invocations executed in this resume
        executed: u64,
        /// The configured budget that was exceeded
        limit: u64,
    },
}
