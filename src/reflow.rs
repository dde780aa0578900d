// src/reflow.rs
//! Re-wraps a sequence of rows to a new column width.
//!
//! Rows whose `continued` flag is set are merged with their successors
//! into logical lines before re-segmenting, so resize preserves soft
//! wrap boundaries instead of the accidental physical layout.

use crate::cell::Cell;
use crate::line::Line;

// One drawable unit of a logical line: a base cell plus any combining
// marks riding on it. Wide characters keep their two-cell footprint via
// `cell.width`.
struct Unit {
    cell: Cell,
    combining: Option<String>,
}

/// Re-segment `rows` into rows of `new_columns` cells.
///
/// A wide character never straddles a row boundary: when only one cell
/// remains on a row the whole pair moves to the next one. A wide
/// character that cannot fit at any position (`new_columns < 2`) is
/// dropped. Blank rows survive as blank rows.
pub(crate) fn rewrap(rows: Vec<Line>, new_columns: usize) -> Vec<Line> {
    debug_assert!(new_columns > 0);
    let mut out = Vec::with_capacity(rows.len());
    let mut logical: Vec<Unit> = Vec::new();
    let mut pending = false;

    for row in rows {
        let continued = row.continued;
        collect_units(&row, continued, &mut logical);
        pending = true;
        if !continued {
            emit_logical(&logical, new_columns, &mut out);
            logical.clear();
            pending = false;
        }
    }
    if pending {
        emit_logical(&logical, new_columns, &mut out);
    }
    out
}

fn collect_units(row: &Line, take_all: bool, out: &mut Vec<Unit>) {
    // trailing blanks only count when the row continues into the next:
    // there they are real interior spacing of the logical line
    let end = if take_all {
        row.columns()
    } else {
        row.occupied_len()
    };
    let mut col = 0;
    while col < end {
        let cell = *row.cell(col);
        if cell.width == 0 {
            col += 1;
            continue;
        }
        out.push(Unit {
            cell,
            combining: row.combining_at(col).map(str::to_string),
        });
        col += cell.width.max(1) as usize;
    }
}

fn emit_logical(units: &[Unit], new_columns: usize, out: &mut Vec<Line>) {
    let mut line = Line::new(new_columns);
    let mut col = 0;
    for unit in units {
        let width = unit.cell.width.max(1) as usize;
        if width > new_columns {
            continue;
        }
        if col + width > new_columns {
            line.continued = true;
            out.push(std::mem::replace(&mut line, Line::new(new_columns)));
            col = 0;
        }
        line.put_cell(col, unit.cell);
        if width == 2 {
            line.put_cell(
                col + 1,
                Cell {
                    ch: '\0',
                    width: 0,
                    attrs: unit.cell.attrs,
                },
            );
        }
        if let Some(marks) = &unit.combining {
            line.put_combining(col, marks.clone());
        }
        col += width;
    }
    out.push(line);
}
