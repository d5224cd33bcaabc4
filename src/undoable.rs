//! Snapshot based undo/redo around an ordinary reducer.
//!
//! [`wrap`] takes a base reducer and an "is this action undoable"
//! classifier and returns an [`Undoable`] reducer over [`History`]. Only the
//! part of the state described by an [`UndoSlice`] is recorded, so selection
//! and drag state never come back on undo.

use std::ops::Deref;

/// The part of a state that participates in history.
///
/// `capture` must produce an owned deep copy: later mutation of the state
/// must not alter a captured slice.
pub trait UndoSlice<S>: Clone {
    fn capture(state: &S) -> Self;
    fn restore(self, state: &mut S);
}

/// Actions understood by the wrapped reducer.
#[derive(Clone, Debug, PartialEq)]
pub enum HistoryAction<A> {
    Undo,
    Redo,
    /// Replace the slice with the empty baseline, as an undoable step.
    Reset,
    Apply(A),
}

pub fn undo<A>() -> HistoryAction<A> {
    HistoryAction::Undo
}

pub fn redo<A>() -> HistoryAction<A> {
    HistoryAction::Redo
}

pub fn reset<A>() -> HistoryAction<A> {
    HistoryAction::Reset
}

impl<A> From<A> for HistoryAction<A> {
    fn from(action: A) -> Self {
        HistoryAction::Apply(action)
    }
}

/// Live state plus its past and future slices. Both stacks keep the most
/// recent entry last.
#[derive(Clone, Debug)]
pub struct History<S, L> {
    present: S,
    past: Vec<L>,
    future: Vec<L>,
}

impl<S, L> History<S, L> {
    pub fn new(present: S) -> Self {
        Self {
            present,
            past: Vec::new(),
            future: Vec::new(),
        }
    }

    pub fn present(&self) -> &S {
        &self.present
    }

    /// Mutable access for state that is outside the slice. Changes made
    /// through here are not recorded.
    pub fn present_mut(&mut self) -> &mut S {
        &mut self.present
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.past.len()
    }

    pub fn redo_count(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl<S, L> Deref for History<S, L> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.present
    }
}

pub struct Undoable<S, A, L, R, C>
where
    R: Fn(&mut S, &A),
    C: Fn(&A) -> bool,
{
    reducer: R,
    is_undoable: C,
    empty: L,
    limit: Option<usize>,
    _marker: std::marker::PhantomData<fn(&mut S, &A)>,
}

/// Wraps `reducer` so that every action accepted by `is_undoable` records
/// the pre-action slice. `empty` is the baseline restored by
/// [`HistoryAction::Reset`].
pub fn wrap<S, A, L, R, C>(reducer: R, is_undoable: C, empty: L) -> Undoable<S, A, L, R, C>
where
    L: UndoSlice<S>,
    R: Fn(&mut S, &A),
    C: Fn(&A) -> bool,
{
    Undoable {
        reducer,
        is_undoable,
        empty,
        limit: None,
        _marker: std::marker::PhantomData,
    }
}

impl<S, A, L, R, C> Undoable<S, A, L, R, C>
where
    L: UndoSlice<S>,
    R: Fn(&mut S, &A),
    C: Fn(&A) -> bool,
{
    /// Bounds `past`; the oldest snapshots are dropped first. Unbounded
    /// unless set.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn is_undoable(&self, action: &A) -> bool {
        (self.is_undoable)(action)
    }

    pub fn reduce(&self, history: &mut History<S, L>, action: impl Into<HistoryAction<A>>) {
        match action.into() {
            HistoryAction::Undo => {
                let Some(previous) = history.past.pop() else {
                    return;
                };
                history.future.push(L::capture(&history.present));
                previous.restore(&mut history.present);
            }
            HistoryAction::Redo => {
                let Some(next) = history.future.pop() else {
                    return;
                };
                history.past.push(L::capture(&history.present));
                next.restore(&mut history.present);
            }
            HistoryAction::Reset => {
                self.record(history);
                self.empty.clone().restore(&mut history.present);
            }
            HistoryAction::Apply(action) => {
                if (self.is_undoable)(&action) {
                    self.record(history);
                }
                (self.reducer)(&mut history.present, &action);
            }
        }
    }

    fn record(&self, history: &mut History<S, L>) {
        history.past.push(L::capture(&history.present));
        if let Some(limit) = self.limit {
            if history.past.len() > limit {
                let overflow = history.past.len() - limit;
                history.past.drain(0..overflow);
            }
        }
        history.future.clear();
    }
}
