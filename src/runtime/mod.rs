//! Generator execution runtime for compiled, flattened state machines.
//!
//! This module provides the execution environment for generator bodies that
//! an external compiler has flattened into label-dispatching step functions.
//! The runtime supplies everything the flattening removed: suspend state
//! between protocol calls, try/catch/finally semantics over a static
//! exception table, and protocol forwarding to delegated inner iterables.
//!
//! # Architecture
//!
//! The runtime is organized into several sub-modules:
//!
//! - Static protected-region tables describing try/catch/finally layout
//! - Per-activation suspend state carried across protocol calls
//! - Completion and step-signal types exchanged with the compiled body
//! - The abrupt-completion resolver walking regions innermost-first
//! - The dispatch loop driving one protocol call to its boundary event
//! - Delegation forwarding for `yield*`-style composition
//!
//! # Key Components
//!
//! ## Compiled Form
//! - [`crate::runtime::CompiledBody`] - A compiler-produced body: start label, table, step closure
//! - [`crate::runtime::ExceptionTable`] - The body's protected regions, validated at wrap time
//! - [`crate::runtime::TryEntry`] - One protected region with its catch/finally handlers
//! - [`crate::runtime::Flow`] - What one step invocation reports back
//!
//! ## Instances
//! - [`crate::runtime::Generator`] - A live instance exposing `next`/`throw`/`finish`
//! - [`crate::runtime::GeneratorFn`] - A factory producing a fresh instance per call
//! - [`crate::runtime::Context`] - The suspend state one instance carries
//! - [`crate::runtime::IterResult`] - The standard iterator-result pair
//!
//! ## Delegation
//! - [`crate::runtime::Iterable`] - The protocol expected of delegation targets
//! - [`crate::runtime::IterDelegate`] - Adapts any plain [`Iterator`] into a target
//!
//! ## Execution Control
//! - [`crate::runtime::DispatchLimits`] - Per-resume step budget
//! - [`crate::runtime::DispatchStats`] - Counters accumulated per instance
//!
//! # Usage Examples
//!
//! ```rust
//! use genrun::{wrap, CompiledBody, ExceptionTable, Flow};
//!
//! // yield 1; return 2;
//! let body = CompiledBody::new(0, ExceptionTable::empty(), |ctx| match ctx.position() {
//!     0 => {
//!         ctx.set_position(1);
//!         Flow::Yield(1)
//!     }
//!     _ => Flow::Return(Some(2)),
//! });
//! let mut generator = wrap(body)?;
//!
//! assert_eq!(generator.next(None)?.value, Some(1));
//! let last = generator.next(None)?;
//! assert!(last.done);
//! assert_eq!(last.value, Some(2));
//! # Ok::<(), genrun::Error<i32>>(())
//! ```

mod context;
mod delegate;
mod dispatch;
mod flow;
mod generator;
mod table;
mod unwind;

pub use context::Context;
pub use delegate::{DelegateResult, IterDelegate, Iterable};
pub use dispatch::{DispatchLimits, DispatchStats};
pub use flow::{Completion, CompletionKind, Flow, IterResult};
pub use generator::{
    mark, wrap, wrap_with_limits, CompiledBody, Generator, GeneratorFn, IntoIter, IterMut, StepFn,
};
pub use table::{ExceptionTable, HandlerFlags, Label, TryEntry};
