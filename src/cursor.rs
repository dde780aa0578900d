// src/cursor.rs
use crate::cell::{Cell, CellAttrs, Decoration};
use crate::color::Color;

/// Cursor shape requested via DECSCUSR-style controls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorShape {
    #[default]
    Block,
    Beam,
    Underline,
    Hidden,
}

/// The "pen": a position plus the attributes stamped onto newly written
/// cells, and the presentation the renderer should draw the cursor with.
///
/// Owned exclusively by [`Screen`](crate::Screen); savepoints and damage
/// records carry copies.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
    pub hidden: bool,
    pub attrs: CellAttrs,
    pub shape: CursorShape,
    pub blink: Option<bool>,
    pub color: Option<Color>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a pen from an existing cell, for fills that need to reuse
    /// the attributes already present at a position.
    pub fn from_cell(cell: &Cell) -> Self {
        Self {
            attrs: cell.attrs,
            ..Self::default()
        }
    }

    /// SGR 0: back to the freshly-constructed attribute state.
    pub fn reset_attrs(&mut self) {
        self.attrs = CellAttrs::default();
    }

    /// Apply a flat SGR parameter list left to right.
    ///
    /// Compound color sequences (38/48/58 with `5;N` or `2;R;G;B` tails)
    /// consume exactly their own parameters; a malformed tail skips only
    /// the introducer and parsing continues behind it. Unknown parameters
    /// are ignored.
    pub fn select_graphic_rendition(&mut self, params: &[u16]) {
        if params.is_empty() {
            self.reset_attrs();
            return;
        }
        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => self.reset_attrs(),
                1 => self.attrs.bold = true,
                3 => self.attrs.italic = true,
                4 => self.attrs.decoration = Decoration::Straight,
                7 => self.attrs.reverse = true,
                9 => self.attrs.strikethrough = true,
                21 => self.attrs.decoration = Decoration::Double,
                22 => self.attrs.bold = false,
                23 => self.attrs.italic = false,
                24 => self.attrs.decoration = Decoration::None,
                27 => self.attrs.reverse = false,
                29 => self.attrs.strikethrough = false,
                30..=37 => self.attrs.fg = Color::Named((params[i] - 30) as u8),
                38 => {
                    if let Some((color, used)) = extended_color(&params[i + 1..]) {
                        self.attrs.fg = color;
                        i += used;
                    }
                }
                39 => self.attrs.fg = Color::Unset,
                40..=47 => self.attrs.bg = Color::Named((params[i] - 40) as u8),
                48 => {
                    if let Some((color, used)) = extended_color(&params[i + 1..]) {
                        self.attrs.bg = color;
                        i += used;
                    }
                }
                49 => self.attrs.bg = Color::Unset,
                58 => {
                    if let Some((color, used)) = extended_color(&params[i + 1..]) {
                        self.attrs.decoration_fg = color;
                        i += used;
                    }
                }
                59 => self.attrs.decoration_fg = Color::Unset,
                90..=97 => self.attrs.fg = Color::Named((params[i] - 90 + 8) as u8),
                100..=107 => self.attrs.bg = Color::Named((params[i] - 100 + 8) as u8),
                _ => {}
            }
            i += 1;
        }
    }
}

/// Parse the tail of a 38/48/58 sequence. Returns the color and the
/// number of parameters consumed, or None when the tail is malformed.
fn extended_color(rest: &[u16]) -> Option<(Color, usize)> {
    match rest.first()? {
        5 => {
            let index = *rest.get(1)?;
            Some((Color::Indexed(index.min(255) as u8), 2))
        }
        2 => {
            let r = *rest.get(1)?;
            let g = *rest.get(2)?;
            let b = *rest.get(3)?;
            Some((
                Color::Rgb(r.min(255) as u8, g.min(255) as u8, b.min(255) as u8),
                4,
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sgr_reset_is_idempotent() {
        let mut cursor = Cursor::new();
        cursor.select_graphic_rendition(&[1, 3, 7, 9, 4, 31, 48, 5, 200, 58, 2, 1, 2, 3]);
        assert_ne!(cursor.attrs, CellAttrs::default());

        cursor.select_graphic_rendition(&[0]);
        assert_eq!(cursor.attrs, Cursor::new().attrs);
    }

    #[test]
    fn test_sgr_empty_params_reset() {
        let mut cursor = Cursor::new();
        cursor.select_graphic_rendition(&[1, 33]);
        cursor.select_graphic_rendition(&[]);
        assert_eq!(cursor.attrs, CellAttrs::default());
    }

    #[test]
    fn test_sgr_named_colors() {
        let mut cursor = Cursor::new();
        cursor.select_graphic_rendition(&[31, 42]);
        assert_eq!(cursor.attrs.fg, Color::Named(1));
        assert_eq!(cursor.attrs.bg, Color::Named(2));

        cursor.select_graphic_rendition(&[94, 105]);
        assert_eq!(cursor.attrs.fg, Color::Named(12));
        assert_eq!(cursor.attrs.bg, Color::Named(13));

        cursor.select_graphic_rendition(&[39, 49]);
        assert_eq!(cursor.attrs.fg, Color::Unset);
        assert_eq!(cursor.attrs.bg, Color::Unset);
    }

    #[test]
    fn test_sgr_indexed_and_rgb() {
        let mut cursor = Cursor::new();
        cursor.select_graphic_rendition(&[38, 5, 123, 48, 2, 10, 20, 30]);
        assert_eq!(cursor.attrs.fg, Color::Indexed(123));
        assert_eq!(cursor.attrs.bg, Color::Rgb(10, 20, 30));
    }

    #[test]
    fn test_sgr_decoration_color() {
        let mut cursor = Cursor::new();
        cursor.select_graphic_rendition(&[4, 58, 5, 9]);
        assert_eq!(cursor.attrs.decoration, Decoration::Straight);
        assert_eq!(cursor.attrs.decoration_fg, Color::Indexed(9));

        cursor.select_graphic_rendition(&[59, 24]);
        assert_eq!(cursor.attrs.decoration_fg, Color::Unset);
        assert_eq!(cursor.attrs.decoration, Decoration::None);
    }

    #[test]
    fn test_sgr_malformed_extended_color_is_skipped() {
        let mut cursor = Cursor::new();
        // truncated 38;5: the introducer is dropped, the bold that
        // follows must still apply
        cursor.select_graphic_rendition(&[38, 5]);
        assert_eq!(cursor.attrs.fg, Color::Unset);

        cursor.select_graphic_rendition(&[38, 99, 1]);
        assert_eq!(cursor.attrs.fg, Color::Unset);
        assert!(cursor.attrs.bold);
    }

    #[test]
    fn test_sgr_bold_off_and_friends() {
        let mut cursor = Cursor::new();
        cursor.select_graphic_rendition(&[1, 3, 7, 9]);
        cursor.select_graphic_rendition(&[22, 23, 27, 29]);
        assert_eq!(cursor.attrs, CellAttrs::default());
    }

    #[test]
    fn test_from_cell_copies_attrs() {
        let mut cell = Cell::default();
        cell.attrs.fg = Color::Indexed(42);
        let cursor = Cursor::from_cell(&cell);
        assert_eq!(cursor.attrs.fg, Color::Indexed(42));
        assert_eq!(cursor.x, 0);
    }
}
