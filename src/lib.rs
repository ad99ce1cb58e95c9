// Copyright 2025 genrun contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # genrun
//!
//! An execution runtime for compiled, flattened generator state machines.
//! `genrun` supplies everything a generator-flattening compiler strips out of
//! its output: suspend state between resumptions, try/catch/finally semantics
//! driven by a static exception table, and delegation to inner iterables.
//!
//! ## Features
//!
//! - **Full generator protocol** - `next`, `throw` and `finish` with correct
//!   abrupt-completion semantics
//! - **Exception-table interpretation** - flat tables of protected label
//!   ranges resolved innermost-first, no host unwinding involved
//! - **Finally done right** - suspended completions, override on a new
//!   completion crossing out of a finally body, re-delivery at end-of-finally
//! - **Delegation** - `yield*`-style forwarding to any [`Iterable`],
//!   including other generators and plain [`Iterator`]s
//! - **Execution limits** - optional per-resume step budgets for untrusted
//!   compiled bodies
//! - **Generic over the value type** - the runtime never inspects yielded or
//!   thrown values
//!
//! ## Quick Start
//!
//! Add `genrun` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! genrun = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust
//! use genrun::prelude::*;
//!
//! // yield 1; yield 2; (implicit return)
//! let body = CompiledBody::new(0, ExceptionTable::empty(), |ctx| match ctx.position() {
//!     0 => {
//!         ctx.set_position(1);
//!         Flow::Yield(1)
//!     }
//!     1 => {
//!         ctx.set_position(2);
//!         Flow::Yield(2)
//!     }
//!     _ => Flow::Return(None),
//! });
//!
//! let generator = wrap(body)?;
//! let values: Vec<i32> = generator.into_iter().collect::<Result<_, _>>()?;
//! assert_eq!(values, vec![1, 2]);
//! # Ok::<(), genrun::Error<i32>>(())
//! ```
//!
//! ## The Compiled Form
//!
//! A compiled body is a step closure dispatching on an opaque label space.
//! Every suspend point gets a label; the closure reads its resume point from
//! the [`Context`], advances it, and reports one [`Flow`] signal per
//! invocation. Try/catch/finally never appears in the closure itself: the
//! compiler emits a flat [`ExceptionTable`] of protected label ranges
//! instead, and the runtime routes abrupt completions through it.
//!
//! ## Error Handling
//!
//! All protocol calls return [`Result`], with [`Error`] distinguishing an
//! uncaught thrown value, protocol misuse on a finished instance, a malformed
//! compiled form, and an exhausted step budget. A failed instance is done:
//! it never resumes again.
//!
//! ## Testing
//!
//! ```bash
//! cargo test
//! cargo bench  # dispatch loop benchmarks
//! ```

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the genrun library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust
/// use genrun::prelude::*;
///
/// let body = CompiledBody::new(0, ExceptionTable::empty(), |_ctx| Flow::Return(Some(1)));
/// let mut generator = wrap(body)?;
/// assert!(generator.next(None)?.done);
/// # Ok::<(), genrun::Error<i32>>(())
/// ```
pub mod prelude;

/// The generator execution runtime
///
/// This module contains the complete execution environment for compiled
/// generator bodies: the exception-table types, per-activation suspend state,
/// the dispatch loop, the abrupt-completion resolver, and delegation
/// forwarding. See the module documentation for the architecture.
pub mod runtime;

/// A specialized [`std::result::Result`] type for generator runtime
/// operations.
///
/// The second parameter is the generator's value type, carried so that an
/// uncaught thrown value can travel inside [`Error::Uncaught`].
pub type Result<T, V> = std::result::Result<T, Error<V>>;

pub use error::Error;
pub use runtime::{
    mark, wrap, wrap_with_limits, CompiledBody, Context, DispatchLimits, DispatchStats,
    ExceptionTable, Flow, Generator, GeneratorFn, IterDelegate, IterResult, Iterable, Label,
    TryEntry,
};
