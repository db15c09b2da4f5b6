//! Cons-cell view over VERM child lists.
//!
//! A `VOptionList` owns a single growable sequence. `car` and `cdr` never copy:
//! they return a [`TreeCursor`] that remembers the owning sequence and a base
//! offset, so writing through a cdr view mutates the list it was taken from.

use crate::VOption;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    #[error("cursor is not in car state, cannot get as item")]
    NotAnItem,

    #[error("cannot assign a list through a car cursor")]
    NotAList,

    #[error("car of an empty list")]
    Empty,
}

/// Ordered child list of a VERM node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VOptionList(Vec<VOption>);

impl VOptionList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// An empty list is nil.
    pub fn is_nil(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VOption> {
        self.0.get(index)
    }

    pub fn push(&mut self, opt: VOption) {
        self.0.push(opt);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VOption> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[VOption] {
        &self.0
    }

    /// First element, read-only.
    pub fn first(&self) -> Option<&VOption> {
        self.0.first()
    }

    /// Everything after the first element, as a borrowed view.
    pub fn rest(&self) -> &[VOption] {
        self.0.get(1..).unwrap_or(&[])
    }

    /// Writable cursor on the first element.
    pub fn car(&mut self) -> TreeCursor<'_> {
        TreeCursor {
            list: &mut self.0,
            base: 0,
            state: CursorState::Car,
        }
    }

    /// Writable cursor on the remainder of the list.
    pub fn cdr(&mut self) -> TreeCursor<'_> {
        TreeCursor {
            list: &mut self.0,
            base: 1,
            state: CursorState::Rest,
        }
    }
}

impl From<Vec<VOption>> for VOptionList {
    fn from(value: Vec<VOption>) -> Self {
        Self(value)
    }
}

impl<'a> IntoIterator for &'a VOptionList {
    type Item = &'a VOption;
    type IntoIter = std::slice::Iter<'a, VOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Whether a cursor designates a single element or the tail from its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Car,
    Rest,
}

/// Position cursor into a borrowed child list.
#[derive(Debug)]
pub struct TreeCursor<'a> {
    list: &'a mut Vec<VOption>,
    base: usize,
    state: CursorState,
}

impl<'a> TreeCursor<'a> {
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Number of elements visible from this cursor.
    pub fn len(&self) -> usize {
        self.list.len().saturating_sub(self.base)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element under a car cursor.
    pub fn item(&self) -> Result<&VOption, TreeError> {
        match self.state {
            CursorState::Car => self.list.get(self.base).ok_or(TreeError::Empty),
            CursorState::Rest => Err(TreeError::NotAnItem),
        }
    }

    pub fn item_mut(&mut self) -> Result<&mut VOption, TreeError> {
        match self.state {
            CursorState::Car => self.list.get_mut(self.base).ok_or(TreeError::Empty),
            CursorState::Rest => Err(TreeError::NotAnItem),
        }
    }

    /// The `i`-th element counted from the cursor's base.
    pub fn get(&self, i: usize) -> Option<&VOption> {
        self.list.get(self.base + i)
    }

    /// Cursor on the first visible element.
    pub fn car(self) -> TreeCursor<'a> {
        TreeCursor {
            state: CursorState::Car,
            ..self
        }
    }

    /// Cursor on the tail after the first visible element.
    pub fn cdr(self) -> TreeCursor<'a> {
        TreeCursor {
            list: self.list,
            base: self.base + 1,
            state: CursorState::Rest,
        }
    }

    /// Assigns through the cursor.
    ///
    /// A car cursor replaces (or appends) the element at its base; a rest
    /// cursor makes `opt` the only element from its base onwards.
    pub fn set(self, opt: VOption) {
        match self.state {
            CursorState::Car => {
                if self.list.len() <= self.base {
                    self.list.push(opt);
                } else {
                    self.list[self.base] = opt;
                }
            }
            CursorState::Rest => {
                self.list.truncate(self.base);
                self.list.push(opt);
            }
        }
    }

    /// Replaces the tail from the cursor's base with `opts`.
    pub fn set_list(self, opts: impl IntoIterator<Item = VOption>) -> Result<(), TreeError> {
        match self.state {
            CursorState::Car => Err(TreeError::NotAList),
            CursorState::Rest => {
                self.list.truncate(self.base);
                self.list.extend(opts);
                Ok(())
            }
        }
    }

    /// Copies the visible elements into a new list.
    pub fn to_list(&self) -> VOptionList {
        VOptionList(self.list.get(self.base..).unwrap_or(&[]).to_vec())
    }
}
