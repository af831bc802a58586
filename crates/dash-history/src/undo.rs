//! Undo/redo over full snapshots
//!
//! One instance per editing session. `past` holds older states oldest
//! first, `future` holds undone states with the most recently undone on
//! top. Any new state discards the redo branch.

use std::collections::VecDeque;

/// Past entries kept unless configured otherwise
pub const DEFAULT_UNDO_CAPACITY: usize = 50;

/// Two-stack snapshot history
#[derive(Debug, Clone)]
pub struct UndoHistory<T> {
    past: VecDeque<T>,
    present: Option<T>,
    future: Vec<T>,
    capacity: usize,
}

impl<T: Clone + PartialEq> UndoHistory<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_UNDO_CAPACITY)
    }

    /// History keeping at most `capacity` past states, at least one
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: None,
            future: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Reset to `state` with no undo or redo available
    pub fn initialize(&mut self, state: T) {
        self.past.clear();
        self.future.clear();
        self.present = Some(state);
    }

    /// Record a new current state
    ///
    /// Returns `false` without touching the history when `state` equals
    /// the current one.
    pub fn push_state(&mut self, state: T) -> bool {
        if self.present.as_ref() == Some(&state) {
            return false;
        }
        if let Some(previous) = self.present.replace(state) {
            if self.past.len() == self.capacity {
                self.past.pop_front();
            }
            self.past.push_back(previous);
        }
        self.future.clear();
        true
    }

    /// Step back; `None` when there is nothing to undo
    pub fn undo(&mut self) -> Option<&T> {
        let previous = self.past.pop_back()?;
        if let Some(current) = self.present.replace(previous) {
            self.future.push(current);
        }
        self.present.as_ref()
    }

    /// Step forward; `None` when there is nothing to redo
    pub fn redo(&mut self) -> Option<&T> {
        let next = self.future.pop()?;
        if let Some(current) = self.present.replace(next) {
            self.past.push_back(current);
        }
        self.present.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn present(&self) -> Option<&T> {
        self.present.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    #[inline]
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }
}

impl<T: Clone + PartialEq> Default for UndoHistory<T> {
    fn default() -> Self {
        Self::new()
    }
}
