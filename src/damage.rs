// src/damage.rs
use crate::cursor::Cursor;

/// Change record appended after each mutating operation.
///
/// A renderer drains these via [`Screen::drain_damage`](crate::Screen::drain_damage)
/// and may coalesce overlapping ranges; the core itself never drops one.
/// All row/column values are inclusive.
#[derive(Clone, Debug, PartialEq)]
pub enum DamageEvent {
    /// Everything needs redrawing (resize, reset, buffer switch, DECSCNM).
    ScreenDirty,
    /// Rows `first..=last` changed.
    LineRangeDirty { first: usize, last: usize },
    /// Columns `first..=last` of `row` changed.
    CellRangeDirty {
        row: usize,
        first: usize,
        last: usize,
    },
    /// Cursor position or presentation changed; carries the new state.
    CursorChanged(Cursor),
    /// `count` lines were appended to the scrollback history.
    HistoryGrew(usize),
}

#[derive(Debug, Default)]
pub(crate) struct DamageLog {
    events: Vec<DamageEvent>,
}

impl DamageLog {
    pub fn screen(&mut self) {
        self.events.push(DamageEvent::ScreenDirty);
    }

    pub fn lines(&mut self, first: usize, last: usize) {
        self.events.push(DamageEvent::LineRangeDirty { first, last });
    }

    pub fn cells(&mut self, row: usize, first: usize, last: usize) {
        self.events.push(DamageEvent::CellRangeDirty { row, first, last });
    }

    pub fn cursor(&mut self, cursor: &Cursor) {
        self.events.push(DamageEvent::CursorChanged(*cursor));
    }

    pub fn history(&mut self, count: usize) {
        if count > 0 {
            self.events.push(DamageEvent::HistoryGrew(count));
        }
    }

    pub fn drain(&mut self) -> Vec<DamageEvent> {
        std::mem::take(&mut self.events)
    }
}
