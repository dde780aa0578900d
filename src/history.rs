// src/history.rs
use std::collections::VecDeque;

use crate::line::Line;

/// Bounded scrollback ring.
///
/// Lines evicted from the top of the primary grid are pushed here; at
/// capacity the oldest entry is dropped. Nothing else ever removes
/// entries; erase commands never reach into history.
#[derive(Debug)]
pub struct History {
    lines: VecDeque<Line>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Take ownership of a line scrolled off the grid, evicting the
    /// oldest entry at capacity. Returns false when the line was dropped
    /// outright (history disabled with a zero limit).
    pub fn push(&mut self, line: Line) -> bool {
        if self.limit == 0 {
            return false;
        }
        if self.lines.len() >= self.limit {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
        true
    }

    /// Index 0 is the oldest retained line.
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    pub(crate) fn take_lines(&mut self) -> Vec<Line> {
        self.lines.drain(..).collect()
    }

    pub(crate) fn replace_lines(&mut self, lines: Vec<Line>) {
        self.lines = lines.into();
        while self.lines.len() > self.limit {
            self.lines.pop_front();
        }
    }
}
