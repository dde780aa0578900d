//! VTE Screen - terminal screen state core
//!
//! This crate models the authoritative "what is on screen" state of a
//! terminal emulator: a grid of styled cells, a cursor, scrolling
//! margins, an alternate screen and a bounded, reflowing scrollback.
//! It consumes decoded text plus ECMA-48/VT100-style control operations
//! from an external escape-sequence parser and records damage events
//! for an external renderer; it performs no I/O and no rendering of its
//! own, and is independent of any UI backend.
//!
//! The screen is single-writer: all operations must be dispatched
//! serially, and readers synchronize externally.

pub mod cell;
pub mod charset;
pub mod color;
pub mod config;
pub mod constants;
pub mod cursor;
pub mod damage;
pub mod error;
pub mod history;
pub mod line;
mod reflow;
pub mod screen;

// Re-export main types
pub use cell::{Cell, CellAttrs, Decoration};
pub use charset::{Charset, CharsetSlot};
pub use color::Color;
pub use config::ScreenConfig;
pub use cursor::{Cursor, CursorShape};
pub use damage::DamageEvent;
pub use error::{ScreenError, ScreenResult};
pub use history::History;
pub use line::Line;
pub use screen::{BufferSelector, MemoryInfo, Mode, Screen};
