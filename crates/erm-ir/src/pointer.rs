//! Stable handles to parsed lines.

use serde::Serialize;
use std::cmp::Ordering;

/// Position-based handle to a line of one parsed script.
///
/// Equality and ordering consider only the script length and the zero-based
/// position; the source line number is carried for diagnostics.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LinePointer {
    line_count: usize,
    index: usize,
    real_line: usize,
}

impl LinePointer {
    pub fn new(line_count: usize, index: usize, real_line: usize) -> Self {
        Self {
            line_count,
            index,
            real_line,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based line number in the original source.
    pub fn real_line(&self) -> usize {
        self.real_line
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn is_valid(&self) -> bool {
        self.index < self.line_count
    }
}

impl PartialEq for LinePointer {
    fn eq(&self, other: &Self) -> bool {
        self.line_count == other.line_count && self.index == other.index
    }
}

impl Eq for LinePointer {}

impl PartialOrd for LinePointer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LinePointer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index
            .cmp(&other.index)
            .then(self.line_count.cmp(&other.line_count))
    }
}

impl std::hash::Hash for LinePointer {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.line_count.hash(state);
        self.index.hash(state);
    }
}
