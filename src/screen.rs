// src/screen.rs
//! The screen state machine.
//!
//! `Screen` owns two grids (primary and alternate), the scrolling
//! margins, the mode set, tab stops, charset selection, the cursor and
//! one savepoint stack per buffer. Every control operation the decoded
//! input stream can produce is dispatched through the methods here;
//! mutations append [`DamageEvent`] records a renderer drains with
//! [`Screen::drain_damage`].
//!
//! No operation panics on remote input: malformed parameters are
//! clamped or ignored, and invariant-threatening requests keep the
//! previous state.

use tracing::{debug, warn};
use unicode_width::UnicodeWidthChar;

use crate::cell::Cell;
use crate::charset::{Charset, CharsetSlot};
use crate::color::Color;
use crate::config::ScreenConfig;
use crate::constants::TAB_INTERVAL;
use crate::cursor::{Cursor, CursorShape};
use crate::damage::{DamageEvent, DamageLog};
use crate::error::ScreenError;
use crate::history::History;
use crate::line::Line;
use crate::reflow::rewrap;

/// Which of the two grids is live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferSelector {
    Primary,
    Alternate,
}

/// Togglable screen modes. Mapping CSI numbers onto these is the
/// escape-sequence parser's business; the screen only sees the result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// IRM: drawing shifts existing cells right instead of overwriting.
    Insert,
    /// LNM: linefeed implies carriage return.
    LinefeedNewline,
    /// DECOM: cursor addressing is relative to the margin band.
    Origin,
    /// DECAWM: writing past the last column wraps to a new row.
    Autowrap,
    /// DECTCEM: the cursor is shown.
    CursorVisible,
    /// DECSCNM: the whole screen renders reverse-video.
    ReverseVideo,
    /// Swap to/from the alternate grid.
    AlternateScreen,
}

#[derive(Clone, Debug)]
struct Modes {
    insert: bool,
    linefeed_newline: bool,
    origin: bool,
    autowrap: bool,
    cursor_visible: bool,
    reverse_video: bool,
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            insert: false,
            linefeed_newline: false,
            origin: false,
            autowrap: true,
            cursor_visible: true,
            reverse_video: false,
        }
    }
}

/// Cursor and charset snapshot pushed by DECSC, popped by DECRC.
#[derive(Clone, Debug)]
struct Savepoint {
    cursor: Cursor,
    g0_charset: Charset,
    g1_charset: Charset,
    active_charset: CharsetSlot,
    use_utf8: bool,
    origin: bool,
    autowrap: bool,
}

// One grid plus its private savepoint stack. The primary and alternate
// screens each own one, so switching buffers cannot corrupt the other
// buffer's saved state.
#[derive(Debug)]
struct BufferState {
    grid: Vec<Line>,
    savepoints: Vec<Savepoint>,
}

impl BufferState {
    fn new(lines: usize, columns: usize) -> Self {
        Self {
            grid: (0..lines).map(|_| Line::new(columns)).collect(),
            savepoints: Vec::new(),
        }
    }
}

/// Per-buffer memory accounting.
#[derive(Clone, Debug)]
pub struct MemoryInfo {
    pub primary_buffer_bytes: usize,
    pub alternate_buffer_bytes: usize,
    pub history_buffer_bytes: usize,
    pub total_bytes: usize,
}

/// The authoritative model of what is on screen.
pub struct Screen {
    lines: usize,
    columns: usize,
    primary: BufferState,
    alternate: BufferState,
    active: BufferSelector,
    cursor: Cursor,
    margin_top: usize,
    margin_bottom: usize,
    modes: Modes,
    tabstops: Vec<bool>,
    g0_charset: Charset,
    g1_charset: Charset,
    active_charset: CharsetSlot,
    use_utf8: bool,
    history: History,
    damage: DamageLog,
}

impl Screen {
    /// Construct at the configured geometry. Fails only on zero
    /// dimensions.
    pub fn new(config: ScreenConfig) -> Result<Self, ScreenError> {
        config.validate()?;
        let ScreenConfig {
            lines,
            columns,
            history_limit,
        } = config;
        debug!(lines, columns, history_limit, "creating screen");
        Ok(Self {
            lines,
            columns,
            primary: BufferState::new(lines, columns),
            alternate: BufferState::new(lines, columns),
            active: BufferSelector::Primary,
            cursor: Cursor::default(),
            margin_top: 0,
            margin_bottom: lines - 1,
            modes: Modes::default(),
            tabstops: default_tabstops(columns),
            g0_charset: Charset::default(),
            g1_charset: Charset::default(),
            active_charset: CharsetSlot::G0,
            use_utf8: true,
            history: History::new(history_limit),
            damage: DamageLog::default(),
        })
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn active_buffer(&self) -> BufferSelector {
        self.active
    }

    /// Inclusive scroll margin bounds, 0-based.
    pub fn margins(&self) -> (usize, usize) {
        (self.margin_top, self.margin_bottom)
    }

    pub fn mode_enabled(&self, mode: Mode) -> bool {
        match mode {
            Mode::Insert => self.modes.insert,
            Mode::LinefeedNewline => self.modes.linefeed_newline,
            Mode::Origin => self.modes.origin,
            Mode::Autowrap => self.modes.autowrap,
            Mode::CursorVisible => self.modes.cursor_visible,
            Mode::ReverseVideo => self.modes.reverse_video,
            Mode::AlternateScreen => self.active == BufferSelector::Alternate,
        }
    }

    /// Row `index` of the active grid. `index` must be below
    /// [`Self::lines`].
    pub fn line(&self, index: usize) -> &Line {
        &self.active_buffer_ref().grid[index]
    }

    /// Scrollback row; index 0 is the oldest retained line.
    pub fn history_line(&self, index: usize) -> Option<&Line> {
        self.history.line(index)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Plain-text rendering of the active grid, one string per row.
    pub fn display(&self) -> Vec<String> {
        self.active_buffer_ref().grid.iter().map(Line::text).collect()
    }

    /// Hand the accumulated change records to the renderer.
    pub fn drain_damage(&mut self) -> Vec<DamageEvent> {
        self.damage.drain()
    }

    /// Approximate buffer memory usage.
    pub fn memory_usage(&self) -> MemoryInfo {
        let cell = std::mem::size_of::<Cell>();
        let primary_buffer_bytes = self.primary.grid.len() * self.columns * cell;
        let alternate_buffer_bytes = self.alternate.grid.len() * self.columns * cell;
        let history_buffer_bytes = self.history.len() * self.columns * cell;
        MemoryInfo {
            primary_buffer_bytes,
            alternate_buffer_bytes,
            history_buffer_bytes,
            total_bytes: primary_buffer_bytes + alternate_buffer_bytes + history_buffer_bytes,
        }
    }

    // ---------- text ----------

    /// Write decoded text at the cursor.
    ///
    /// Plain single-width runs take a contiguous fast path; anything
    /// containing wide or zero-width characters, or drawn under insert
    /// mode or a translating charset, goes character by character.
    pub fn draw(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.simple_text(text) {
            self.draw_simple(text);
        } else {
            for ch in text.chars() {
                self.draw_char(ch);
            }
        }
        if !self.modes.autowrap && self.cursor.x >= self.columns {
            self.cursor.x = self.columns - 1;
        }
        self.damage.cursor(&self.cursor);
    }

    fn simple_text(&self, text: &str) -> bool {
        !self.modes.insert
            && self.active_translation() == Charset::Ascii
            && text.bytes().all(|b| (0x20..0x7f).contains(&b))
    }

    fn draw_simple(&mut self, text: &str) {
        // ASCII-only here, so bytes and chars coincide
        let total = text.len();
        let mut offset = 0;
        while offset < total {
            if self.cursor.x >= self.columns {
                if self.modes.autowrap {
                    self.wrap_line();
                } else {
                    self.cursor.x = self.columns - 1;
                }
            }
            let take = (self.columns - self.cursor.x).min(total - offset);
            let cursor = self.cursor;
            let y = cursor.y;
            self.line_mut(y).set_text(text, offset, take, &cursor);
            self.damage.cells(y, cursor.x, cursor.x + take - 1);
            self.cursor.x += take;
            offset += take;
        }
    }

    fn draw_char(&mut self, ch: char) {
        let ch = self.active_translation().translate(ch);
        let Some(width) = UnicodeWidthChar::width(ch) else {
            // control characters never reach the screen; the parser
            // dispatches them as operations
            return;
        };
        if width == 0 {
            self.draw_combining(ch);
            return;
        }
        let width = width.min(2);
        if width > self.columns {
            return;
        }
        if self.cursor.x + width > self.columns {
            if self.modes.autowrap {
                self.wrap_line();
            } else {
                self.cursor.x = self.columns - width;
            }
        }
        if self.modes.insert {
            self.insert_characters(width);
        }
        let cursor = self.cursor;
        let y = cursor.y;
        let last = (cursor.x + width - 1).min(self.columns - 1);
        self.line_mut(y).set_char(cursor.x, ch, width as u8, Some(&cursor));
        self.damage.cells(y, cursor.x, last);
        self.cursor.x += width;
    }

    // A combining mark attaches to the previous occupied cell: on this
    // line when the cursor is past column 0, otherwise on the last
    // column of the line above.
    fn draw_combining(&mut self, mark: char) {
        let (y, col) = if self.cursor.x > 0 {
            (self.cursor.y, self.cursor.x.min(self.columns) - 1)
        } else if self.cursor.y > 0 {
            (self.cursor.y - 1, self.columns - 1)
        } else {
            return;
        };
        let base = {
            let line = &self.active_buffer_ref().grid[y];
            let base = if line.cell(col).width == 0 && col > 0 {
                col - 1
            } else {
                col
            };
            if line.cell(base).is_empty() {
                return;
            }
            base
        };
        self.line_mut(y).add_combining_char(base, mark);
        self.damage.cells(y, base, base);
    }

    fn wrap_line(&mut self) {
        let y = self.cursor.y;
        self.line_mut(y).continued = true;
        self.index();
        self.cursor.x = 0;
    }

    /// LF. Moves down one row (scrolling at the bottom margin); LNM adds
    /// an implicit carriage return.
    pub fn linefeed(&mut self) {
        self.index();
        if self.modes.linefeed_newline {
            self.cursor.x = 0;
        }
        self.damage.cursor(&self.cursor);
    }

    pub fn carriage_return(&mut self) {
        self.cursor.x = 0;
        self.damage.cursor(&self.cursor);
    }

    pub fn backspace(&mut self) {
        self.cursor.x = self.cursor.x.min(self.columns - 1);
        self.cursor.x = self.cursor.x.saturating_sub(1);
        self.damage.cursor(&self.cursor);
    }

    /// HT. Advance to the next tab stop, or the last column when no
    /// stops remain.
    pub fn tab(&mut self) {
        let x = self.cursor.x.min(self.columns - 1);
        let next = (x + 1..self.columns).find(|&col| self.tabstops[col]);
        self.cursor.x = next.unwrap_or(self.columns - 1);
        self.damage.cursor(&self.cursor);
    }

    // ---------- cursor movement ----------

    /// IND. Move down one row; at the bottom margin, scroll the band up
    /// instead. The evicted row goes to history only when the band's top
    /// is the top of the primary grid.
    pub fn index(&mut self) {
        if self.cursor.y == self.margin_bottom {
            self.scroll_up_band(1, true);
        } else if self.cursor.y + 1 < self.lines {
            self.cursor.y += 1;
            self.damage.cursor(&self.cursor);
        }
    }

    /// RI. Move up one row; at the top margin, scroll the band down.
    /// Never writes to history.
    pub fn reverse_index(&mut self) {
        if self.cursor.y == self.margin_top {
            self.scroll_down_band(1);
        } else if self.cursor.y > 0 {
            self.cursor.y -= 1;
            self.damage.cursor(&self.cursor);
        }
    }

    pub fn cursor_up(&mut self, n: usize) {
        self.cursor.y = self.cursor.y.saturating_sub(n);
        self.damage.cursor(&self.cursor);
    }

    pub fn cursor_down(&mut self, n: usize) {
        self.cursor.y = (self.cursor.y + n).min(self.lines - 1);
        self.damage.cursor(&self.cursor);
    }

    pub fn cursor_forward(&mut self, n: usize) {
        self.cursor.x = (self.cursor.x + n).min(self.columns - 1);
        self.damage.cursor(&self.cursor);
    }

    pub fn cursor_back(&mut self, n: usize) {
        self.cursor.x = self.cursor.x.min(self.columns - 1);
        self.cursor.x = self.cursor.x.saturating_sub(n);
        self.damage.cursor(&self.cursor);
    }

    /// CUP / HVP with 1-based coordinates, honoring origin mode.
    pub fn cursor_position(&mut self, line: usize, column: usize) {
        let line = line.saturating_sub(1);
        let column = column.saturating_sub(1);
        let (base, limit) = self.vertical_bounds();
        self.cursor.y = (base + line).min(limit);
        self.cursor.x = column.min(self.columns - 1);
        self.damage.cursor(&self.cursor);
    }

    /// CHA, 1-based.
    pub fn cursor_to_column(&mut self, column: usize) {
        self.cursor.x = column.saturating_sub(1).min(self.columns - 1);
        self.damage.cursor(&self.cursor);
    }

    /// VPA, 1-based, honoring origin mode.
    pub fn cursor_to_line(&mut self, line: usize) {
        let line = line.saturating_sub(1);
        let (base, limit) = self.vertical_bounds();
        self.cursor.y = (base + line).min(limit);
        self.damage.cursor(&self.cursor);
    }

    fn vertical_bounds(&self) -> (usize, usize) {
        if self.modes.origin {
            (self.margin_top, self.margin_bottom)
        } else {
            (0, self.lines - 1)
        }
    }

    // ---------- editing ----------

    /// IL. Insert `n` blank lines at the cursor row, pushing the rest of
    /// the margin band down; rows pushed past the bottom margin are
    /// discarded. No effect outside the margins, never touches history.
    pub fn insert_lines(&mut self, n: usize) {
        if n == 0 || self.cursor.y < self.margin_top || self.cursor.y > self.margin_bottom {
            return;
        }
        let y = self.cursor.y;
        let bottom = self.margin_bottom;
        let n = n.min(bottom - y + 1);
        let columns = self.columns;
        {
            let grid = &mut self.active_buffer_mut().grid;
            for _ in 0..n {
                grid.remove(bottom);
                grid.insert(y, Line::new(columns));
            }
        }
        self.cursor.x = 0;
        self.damage.lines(y, bottom);
        self.damage.cursor(&self.cursor);
    }

    /// DL. Delete `n` lines at the cursor row, pulling the rest of the
    /// band up and back-filling blanks at the bottom margin.
    pub fn delete_lines(&mut self, n: usize) {
        if n == 0 || self.cursor.y < self.margin_top || self.cursor.y > self.margin_bottom {
            return;
        }
        let y = self.cursor.y;
        let bottom = self.margin_bottom;
        let n = n.min(bottom - y + 1);
        let columns = self.columns;
        {
            let grid = &mut self.active_buffer_mut().grid;
            for _ in 0..n {
                grid.remove(y);
                grid.insert(bottom, Line::new(columns));
            }
        }
        self.cursor.x = 0;
        self.damage.lines(y, bottom);
        self.damage.cursor(&self.cursor);
    }

    /// SU. Scroll the margin band up without moving the cursor. Unlike
    /// `index`, evicted rows never reach history.
    pub fn scroll_up(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.scroll_up_band(n, false);
    }

    /// SD.
    pub fn scroll_down(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.scroll_down_band(n);
    }

    /// ICH. Shift the tail of the row right and blank the gap with the
    /// current pen.
    pub fn insert_characters(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let x = self.cursor.x.min(self.columns - 1);
        let n = n.min(self.columns - x);
        let cursor = self.cursor;
        let y = cursor.y;
        let columns = self.columns;
        let line = self.line_mut(y);
        line.right_shift(x, n);
        line.apply_cursor(&cursor, x, n, true);
        self.damage.cells(y, x, columns - 1);
    }

    /// DCH. Pull the tail of the row left; the vacated tail takes the
    /// current pen.
    pub fn delete_characters(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let x = self.cursor.x.min(self.columns - 1);
        let n = n.min(self.columns - x);
        let cursor = self.cursor;
        let y = cursor.y;
        let columns = self.columns;
        let line = self.line_mut(y);
        line.left_shift(x, n);
        line.apply_cursor(&cursor, columns - n, n, true);
        self.damage.cells(y, x, columns - 1);
    }

    /// ECH. Blank `n` cells from the cursor, restriping them with the
    /// current pen rather than their prior attributes.
    pub fn erase_characters(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let x = self.cursor.x.min(self.columns - 1);
        let n = n.min(self.columns - x);
        let cursor = self.cursor;
        let y = cursor.y;
        self.line_mut(y).apply_cursor(&cursor, x, n, true);
        self.damage.cells(y, x, x + n - 1);
    }

    /// EL / DECSEL. `how`: 0 cursor→end, 1 start→cursor, 2 whole row.
    /// The private variant clears glyphs but leaves attributes alone;
    /// the ANSI variant restripes with the current pen.
    pub fn erase_in_line(&mut self, how: u16, private: bool) {
        let x = self.cursor.x.min(self.columns - 1);
        let (start, count) = match how {
            0 => (x, self.columns - x),
            1 => (0, x + 1),
            2 => (0, self.columns),
            _ => {
                warn!(how, "ignoring erase_in_line with unknown parameter");
                return;
            }
        };
        let cursor = self.cursor;
        let y = cursor.y;
        let line = self.line_mut(y);
        if private {
            line.clear_text(start, count);
        } else {
            line.apply_cursor(&cursor, start, count, true);
        }
        if how != 1 {
            // the soft-wrap marker lives at the erased line end
            line.continued = false;
        }
        self.damage.cells(y, start, start + count - 1);
    }

    /// ED / DECSED. `how`: 0 cursor→end of screen, 1 start→cursor,
    /// 2 whole screen. History is never touched.
    pub fn erase_in_display(&mut self, how: u16, private: bool) {
        let y = self.cursor.y;
        let rows = match how {
            0 => y + 1..self.lines,
            1 => 0..y,
            2 => 0..self.lines,
            _ => {
                warn!(how, "ignoring erase_in_display with unknown parameter");
                return;
            }
        };
        if how == 0 {
            self.erase_in_line(0, private);
        } else if how == 1 {
            self.erase_in_line(1, private);
        }
        let cursor = self.cursor;
        let columns = self.columns;
        for row in rows.clone() {
            let line = &mut self.active_buffer_mut().grid[row];
            if private {
                line.clear_text(0, columns);
            } else {
                line.apply_cursor(&cursor, 0, columns, true);
            }
            line.continued = false;
        }
        if how == 2 {
            self.damage.screen();
        } else if rows.start < rows.end {
            self.damage.lines(rows.start, rows.end - 1);
        }
    }

    // ---------- modes, margins, tab stops ----------

    pub fn set_mode(&mut self, mode: Mode) {
        self.update_mode(mode, true);
    }

    pub fn reset_mode(&mut self, mode: Mode) {
        self.update_mode(mode, false);
    }

    fn update_mode(&mut self, mode: Mode, value: bool) {
        match mode {
            Mode::Insert => self.modes.insert = value,
            Mode::LinefeedNewline => self.modes.linefeed_newline = value,
            Mode::Origin => {
                self.modes.origin = value;
                self.home_cursor();
            }
            Mode::Autowrap => {
                self.modes.autowrap = value;
                self.home_cursor();
            }
            Mode::CursorVisible => {
                self.modes.cursor_visible = value;
                self.cursor.hidden = !value;
                self.damage.cursor(&self.cursor);
            }
            Mode::ReverseVideo => self.set_reverse_video(value),
            Mode::AlternateScreen => self.select_buffer(if value {
                BufferSelector::Alternate
            } else {
                BufferSelector::Primary
            }),
        }
    }

    fn home_cursor(&mut self) {
        self.cursor.x = 0;
        self.cursor.y = if self.modes.origin { self.margin_top } else { 0 };
        self.damage.cursor(&self.cursor);
    }

    // DECSCNM flips the reverse bit on every existing cell, not just
    // future ones.
    fn set_reverse_video(&mut self, value: bool) {
        if self.modes.reverse_video == value {
            return;
        }
        self.modes.reverse_video = value;
        for buffer in [&mut self.primary, &mut self.alternate] {
            for line in &mut buffer.grid {
                line.flip_reverse();
            }
        }
        self.damage.screen();
    }

    // Buffer contents are untouched by the switch; each buffer keeps its
    // own savepoint stack.
    fn select_buffer(&mut self, target: BufferSelector) {
        if self.active == target {
            return;
        }
        debug!(?target, "switching screen buffer");
        self.active = target;
        self.damage.screen();
        self.damage.cursor(&self.cursor);
    }

    /// DECSTBM with 1-based bounds. A band narrower than two rows is
    /// rejected and the previous margins stay in place; on success the
    /// cursor is homed.
    pub fn set_margins(&mut self, top: usize, bottom: usize) {
        let top = top.saturating_sub(1).min(self.lines - 1);
        let bottom = bottom.saturating_sub(1).min(self.lines - 1);
        if bottom <= top {
            warn!(top, bottom, "rejecting degenerate scroll margins");
            return;
        }
        self.margin_top = top;
        self.margin_bottom = bottom;
        self.home_cursor();
    }

    /// HTS: set a tab stop at the cursor column.
    pub fn set_tab_stop(&mut self) {
        let x = self.cursor.x.min(self.columns - 1);
        self.tabstops[x] = true;
    }

    /// TBC. `how`: 0 clears the stop at the cursor, 3 clears them all.
    pub fn clear_tab_stop(&mut self, how: u16) {
        match how {
            0 => {
                let x = self.cursor.x.min(self.columns - 1);
                self.tabstops[x] = false;
            }
            3 => self.tabstops.iter_mut().for_each(|stop| *stop = false),
            _ => warn!(how, "ignoring clear_tab_stop with unknown parameter"),
        }
    }

    // ---------- attributes, charsets, savepoints ----------

    /// SGR. See [`Cursor::select_graphic_rendition`].
    pub fn select_graphic_rendition(&mut self, params: &[u16]) {
        self.cursor.select_graphic_rendition(params);
    }

    /// `ESC (` / `ESC )` designation.
    pub fn designate_charset(&mut self, slot: CharsetSlot, designator: char) {
        let charset = Charset::from_designator(designator);
        match slot {
            CharsetSlot::G0 => self.g0_charset = charset,
            CharsetSlot::G1 => self.g1_charset = charset,
        }
    }

    /// SI / SO.
    pub fn set_active_charset(&mut self, slot: CharsetSlot) {
        self.active_charset = slot;
    }

    pub fn set_utf8_mode(&mut self, enabled: bool) {
        self.use_utf8 = enabled;
    }

    fn active_translation(&self) -> Charset {
        match self.active_charset {
            CharsetSlot::G0 => self.g0_charset,
            CharsetSlot::G1 => self.g1_charset,
        }
    }

    /// DECSCUSR-style presentation change.
    pub fn set_cursor_shape(&mut self, shape: CursorShape, blink: Option<bool>) {
        self.cursor.shape = shape;
        self.cursor.blink = blink;
        self.damage.cursor(&self.cursor);
    }

    pub fn set_cursor_color(&mut self, color: Option<Color>) {
        self.cursor.color = color;
        self.damage.cursor(&self.cursor);
    }

    /// DECSC. Push cursor and charset state onto the active buffer's
    /// savepoint stack.
    pub fn save_cursor(&mut self) {
        let savepoint = Savepoint {
            cursor: self.cursor,
            g0_charset: self.g0_charset,
            g1_charset: self.g1_charset,
            active_charset: self.active_charset,
            use_utf8: self.use_utf8,
            origin: self.modes.origin,
            autowrap: self.modes.autowrap,
        };
        self.active_buffer_mut().savepoints.push(savepoint);
    }

    /// DECRC. Pop the matching savepoint; with nothing saved, fall back
    /// to resetting origin mode and homing the cursor.
    pub fn restore_cursor(&mut self) {
        match self.active_buffer_mut().savepoints.pop() {
            Some(savepoint) => {
                self.cursor = savepoint.cursor;
                self.cursor.x = self.cursor.x.min(self.columns - 1);
                self.cursor.y = self.cursor.y.min(self.lines - 1);
                self.g0_charset = savepoint.g0_charset;
                self.g1_charset = savepoint.g1_charset;
                self.active_charset = savepoint.active_charset;
                self.use_utf8 = savepoint.use_utf8;
                self.modes.origin = savepoint.origin;
                self.modes.autowrap = savepoint.autowrap;
            }
            None => {
                self.modes.origin = false;
                self.cursor.x = 0;
                self.cursor.y = 0;
            }
        }
        self.damage.cursor(&self.cursor);
    }

    // ---------- lifecycle ----------

    /// RIS-style reset: grids blanked, cursor, modes, margins, tab stops
    /// and charsets back to their initial state, savepoints dropped.
    /// History is retained; it only ever shrinks by capacity eviction.
    pub fn reset(&mut self) {
        debug!("resetting screen state");
        let (lines, columns) = (self.lines, self.columns);
        self.primary = BufferState::new(lines, columns);
        self.alternate = BufferState::new(lines, columns);
        self.active = BufferSelector::Primary;
        self.cursor = Cursor::default();
        self.margin_top = 0;
        self.margin_bottom = lines - 1;
        self.modes = Modes::default();
        self.tabstops = default_tabstops(columns);
        self.g0_charset = Charset::default();
        self.g1_charset = Charset::default();
        self.active_charset = CharsetSlot::G0;
        self.use_utf8 = true;
        self.damage.screen();
        self.damage.cursor(&self.cursor);
    }

    /// Resize with reflow.
    ///
    /// History and both grids are re-wrapped to the new width
    /// independently. Primary rows displaced off the top move into
    /// history (respecting its capacity); alternate overflow is
    /// discarded. The cursor is clamped into the new bounds, a best
    /// effort rather than an exact logical-position guarantee. Zero
    /// dimensions are rejected and the previous geometry retained.
    pub fn resize(&mut self, new_lines: usize, new_columns: usize) {
        if new_lines == 0 || new_columns == 0 {
            warn!(new_lines, new_columns, "rejecting resize to zero dimensions");
            return;
        }
        if new_lines == self.lines && new_columns == self.columns {
            return;
        }
        debug!(
            old_lines = self.lines,
            old_columns = self.columns,
            new_lines,
            new_columns,
            "resizing screen"
        );

        let old_history = self.history.take_lines();
        self.history.replace_lines(rewrap(old_history, new_columns));

        let mut grew = 0;
        let primary_rows = std::mem::take(&mut self.primary.grid);
        let mut rows = rewrap(primary_rows, new_columns);
        trim_trailing_blank_rows(&mut rows, new_columns);
        if rows.len() > new_lines {
            let overflow = rows.len() - new_lines;
            for line in rows.drain(..overflow) {
                if self.history.push(line) {
                    grew += 1;
                }
            }
        }
        rows.resize_with(new_lines, || Line::new(new_columns));
        self.primary.grid = rows;

        let alternate_rows = std::mem::take(&mut self.alternate.grid);
        let mut rows = rewrap(alternate_rows, new_columns);
        trim_trailing_blank_rows(&mut rows, new_columns);
        if rows.len() > new_lines {
            let overflow = rows.len() - new_lines;
            rows.drain(..overflow);
        }
        rows.resize_with(new_lines, || Line::new(new_columns));
        self.alternate.grid = rows;

        self.lines = new_lines;
        self.columns = new_columns;
        self.margin_top = 0;
        self.margin_bottom = new_lines - 1;
        self.tabstops = default_tabstops(new_columns);
        self.cursor.x = self.cursor.x.min(new_columns - 1);
        self.cursor.y = self.cursor.y.min(new_lines - 1);

        self.damage.history(grew);
        self.damage.screen();
        self.damage.cursor(&self.cursor);
    }

    // ---------- internals ----------

    fn active_buffer_ref(&self) -> &BufferState {
        match self.active {
            BufferSelector::Primary => &self.primary,
            BufferSelector::Alternate => &self.alternate,
        }
    }

    fn active_buffer_mut(&mut self) -> &mut BufferState {
        match self.active {
            BufferSelector::Primary => &mut self.primary,
            BufferSelector::Alternate => &mut self.alternate,
        }
    }

    fn line_mut(&mut self, y: usize) -> &mut Line {
        &mut self.active_buffer_mut().grid[y]
    }

    fn scroll_up_band(&mut self, n: usize, allow_history: bool) {
        let top = self.margin_top;
        let bottom = self.margin_bottom;
        let n = n.min(bottom - top + 1);
        let columns = self.columns;
        let feed = allow_history && top == 0 && self.active == BufferSelector::Primary;
        let mut grew = 0;
        for _ in 0..n {
            let evicted = {
                let grid = &mut self.active_buffer_mut().grid;
                let evicted = grid.remove(top);
                grid.insert(bottom, Line::new(columns));
                evicted
            };
            if feed && self.history.push(evicted) {
                grew += 1;
            }
        }
        self.damage.history(grew);
        self.damage.lines(top, bottom);
    }

    fn scroll_down_band(&mut self, n: usize) {
        let top = self.margin_top;
        let bottom = self.margin_bottom;
        let n = n.min(bottom - top + 1);
        let columns = self.columns;
        let grid = &mut self.active_buffer_mut().grid;
        for _ in 0..n {
            grid.remove(bottom);
            grid.insert(top, Line::new(columns));
        }
        self.damage.lines(top, bottom);
    }
}

// Trailing all-blank rows are unused space, not content: dropping them
// before the pad/truncate step keeps real rows from being displaced
// into history by empty ones. Rows that only differ in attributes
// (e.g. erased with a colored background) are kept.
fn trim_trailing_blank_rows(rows: &mut Vec<Line>, columns: usize) {
    let blank = Line::new(columns);
    while rows.last().map_or(false, |line| *line == blank) {
        rows.pop();
    }
}

fn default_tabstops(columns: usize) -> Vec<bool> {
    (0..columns)
        .map(|col| col != 0 && col % TAB_INTERVAL == 0)
        .collect()
}
