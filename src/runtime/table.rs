//! Static protected-region tables for compiled generator bodies.
//!
//! This module provides the types describing try/catch/finally regions in a
//! compiled state machine: the label space, individual [`TryEntry`] records,
//! and the validated [`ExceptionTable`] the dispatcher queries when an abrupt
//! completion must cross protected regions.

use bitflags::bitflags;

/// A resume point in the compiled body's label space.
///
/// Labels are opaque to the runtime apart from their total order. The
/// compiled body designates a start label and sets the label for the next
/// step before every return; the runtime never computes labels itself.
pub type Label = u32;

bitflags! {
    /// Handler kinds a protected region provides.
    ///
    /// Every valid [`TryEntry`] carries at least one of these; an entry with
    /// an empty handler set is rejected during validation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HandlerFlags: u8 {
        /// The region has a catch handler able to accept throw completions.
        const CATCH = 0x01;

        /// The region has a finally handler that runs on every exit,
        /// normal or abrupt.
        const FINALLY = 0x02;
    }
}

/// A protected region of the compiled label space.
///
/// The half-open range `[try_start, try_end)` is the protected region;
/// handler labels lie outside it. Regions may nest, encoded purely by range
/// containment; there are no parent pointers.
///
/// # Layout in the compiled form
///
/// ```text
/// try {
///     // try_start .. try_end
///     // suspend points and body labels
/// }
/// catch {
///     // catch_label ..
/// }
/// finally {
///     // finally_label ..= finally_end
///     // the body signals Flow::EndFinally at finally_end
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryEntry {
    /// First label of the protected range.
    pub try_start: Label,
    /// One past the last label of the protected range.
    pub try_end: Label,
    /// Where control resumes when this region catches a throw completion.
    pub catch_label: Option<Label>,
    /// First label of the finally body, entered on any exit crossing this region.
    pub finally_label: Option<Label>,
    /// Label at which the finally body signals completion back to the dispatcher.
    pub finally_end: Option<Label>,
}

impl TryEntry {
    /// Creates a region with a catch handler and no finally.
    #[must_use]
    pub fn with_catch(try_start: Label, try_end: Label, catch_label: Label) -> Self {
        TryEntry {
            try_start,
            try_end,
            catch_label: Some(catch_label),
            finally_label: None,
            finally_end: None,
        }
    }

    /// Creates a region with a finally handler and no catch.
    #[must_use]
    pub fn with_finally(
        try_start: Label,
        try_end: Label,
        finally_label: Label,
        finally_end: Label,
    ) -> Self {
        TryEntry {
            try_start,
            try_end,
            catch_label: None,
            finally_label: Some(finally_label),
            finally_end: Some(finally_end),
        }
    }

    /// Creates a region with both a catch and a finally handler.
    #[must_use]
    pub fn with_catch_and_finally(
        try_start: Label,
        try_end: Label,
        catch_label: Label,
        finally_label: Label,
        finally_end: Label,
    ) -> Self {
        TryEntry {
            try_start,
            try_end,
            catch_label: Some(catch_label),
            finally_label: Some(finally_label),
            finally_end: Some(finally_end),
        }
    }

    /// Checks whether `label` lies inside the protected range.
    #[must_use]
    pub fn contains(&self, label: Label) -> bool {
        self.try_start <= label && label < self.try_end
    }

    /// Returns the handler kinds this region provides.
    #[must_use]
    pub fn handlers(&self) -> HandlerFlags {
        let mut flags = HandlerFlags::empty();
        if self.catch_label.is_some() {
            flags |= HandlerFlags::CATCH;
        }
        if self.finally_label.is_some() {
            flags |= HandlerFlags::FINALLY;
        }
        flags
    }

    /// Width of the protected range, used for innermost-first ordering.
    pub(crate) fn span(&self) -> u32 {
        self.try_end - self.try_start
    }

    /// Checks whether `label` lies inside the finally body, end label included.
    ///
    /// Used to decide whether a completion destination stays within an
    /// entered finally (its suspended completion survives) or crosses out of
    /// it (the suspended completion is overridden).
    pub(crate) fn finally_span_contains(&self, label: Label) -> bool {
        match (self.finally_label, self.finally_end) {
            (Some(start), Some(end)) => start <= label && label <= end,
            _ => false,
        }
    }
}

/// The static table of protected regions for one compiled body.
///
/// The table is immutable for the lifetime of the compiled function. It is
/// queried by the dispatcher to keep [`Context::try_stack`] in sync with the
/// current position and by the unwinder to resolve abrupt completions.
///
/// Validation happens once, when [`wrap`](crate::wrap) consumes the compiled
/// body; a malformed table is an unrecoverable contract violation by the
/// external compiler (see [`Error::Malformed`](crate::Error::Malformed)).
///
/// [`Context::try_stack`]: crate::runtime::Context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionTable {
    entries: Vec<TryEntry>,
}

impl ExceptionTable {
    /// Creates a table from the compiled form's region entries.
    ///
    /// The entries are taken as-is; structural validation runs when the table
    /// is consumed by [`wrap`](crate::wrap) or explicitly via [`Self::validate`].
    #[must_use]
    pub fn new(entries: Vec<TryEntry>) -> Self {
        ExceptionTable { entries }
    }

    /// Creates a table with no protected regions.
    #[must_use]
    pub fn empty() -> Self {
        ExceptionTable::default()
    }

    /// Returns all region entries in compiled-form order.
    #[must_use]
    pub fn entries(&self) -> &[TryEntry] {
        &self.entries
    }

    /// Returns the number of protected regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the table has no protected regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the region entry at `index`.
    ///
    /// Indices come from [`Self::enclosing`] and from finally records held by
    /// the context; both only ever hold indices this table produced.
    pub(crate) fn entry(&self, index: usize) -> &TryEntry {
        &self.entries[index]
    }

    /// Returns the indices of all regions whose range contains `label`,
    /// ordered outermost first.
    ///
    /// Nesting is encoded by range containment, so "outermost first" is
    /// simply descending range width; entries with identical ranges keep
    /// their compiled-form order, which makes the innermost-first walk (the
    /// reverse of this list) visit later entries first, matching the
    /// reverse-table-order tie-break of the contract.
    pub(crate) fn enclosing(&self, label: Label) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.entries.len())
            .filter(|&idx| self.entries[idx].contains(label))
            .collect();
        indices.sort_by(|&a, &b| self.entries[b].span().cmp(&self.entries[a].span()));
        indices
    }

    /// Validates the structural invariants the runtime relies on.
    ///
    /// Checked per entry: the protected range is non-empty, at least one
    /// handler kind is present, a finally label is paired with its end label
    /// (in order), and the entry's own handler labels lie outside its
    /// protected range. Checked pairwise: ranges are properly nested: two
    /// ranges are either disjoint or one contains the other.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`](crate::Error::Malformed) naming the first
    /// violated invariant.
    pub fn validate<V>(&self) -> crate::Result<(), V> {
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.try_start >= entry.try_end {
                return Err(malformed_error!(
                    "region {} has an empty protected range [{}, {})",
                    idx,
                    entry.try_start,
                    entry.try_end
                ));
            }
            if entry.handlers().is_empty() {
                return Err(malformed_error!("region {} provides no handler", idx));
            }
            match (entry.finally_label, entry.finally_end) {
                (Some(start), Some(end)) if start > end => {
                    return Err(malformed_error!(
                        "region {} has finally body [{}, {}] out of order",
                        idx,
                        start,
                        end
                    ));
                }
                (Some(_), None) | (None, Some(_)) => {
                    return Err(malformed_error!(
                        "region {} pairs a finally label with no end label",
                        idx
                    ));
                }
                _ => {}
            }
            for handler in [entry.catch_label, entry.finally_label, entry.finally_end]
                .into_iter()
                .flatten()
            {
                if entry.contains(handler) {
                    return Err(malformed_error!(
                        "region {} places handler label {} inside its own protected range",
                        idx,
                        handler
                    ));
                }
            }
        }
        for (idx, a) in self.entries.iter().enumerate() {
            for (jdx, b) in self.entries.iter().enumerate().skip(idx + 1) {
                let disjoint = a.try_end <= b.try_start || b.try_end <= a.try_start;
                let a_in_b = b.try_start <= a.try_start && a.try_end <= b.try_end;
                let b_in_a = a.try_start <= b.try_start && b.try_end <= a.try_end;
                if !(disjoint || a_in_b || b_in_a) {
                    return Err(malformed_error!(
                        "regions {} and {} overlap without nesting",
                        idx,
                        jdx
                    ));
                }
            }
        }
        Ok(())
    }
}
