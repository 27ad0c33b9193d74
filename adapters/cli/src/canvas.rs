//! Text canvas that mirrors cell lifecycles as characters.

use forest_core::{CellCoord, CellRenderer, GridSize};

const TREE: char = 'T';
const DYING: char = '&';
const EMPTY: char = ' ';

/// Row-major character grid updated through the renderer hooks.
#[derive(Debug, Default)]
pub(crate) struct Canvas {
    grid: GridSize,
    glyphs: Vec<char>,
}

impl Canvas {
    fn set(&mut self, cell: CellCoord, glyph: char) {
        let Some(slot) = self
            .grid
            .index(cell)
            .and_then(|index| self.glyphs.get_mut(index))
        else {
            return;
        };
        *slot = glyph;
    }

    /// Renders the canvas as newline separated rows.
    pub(crate) fn render(&self) -> String {
        let columns = self.grid.columns() as usize;
        if columns == 0 {
            return String::new();
        }
        let mut text = String::with_capacity(self.glyphs.len() + self.grid.rows() as usize);
        for (row, glyphs) in self.glyphs.chunks(columns).enumerate() {
            if row > 0 {
                text.push('\n');
            }
            text.extend(glyphs);
        }
        text
    }
}

impl CellRenderer for Canvas {
    fn render_grow(&mut self, cell: CellCoord) {
        self.set(cell, TREE);
    }

    fn render_kill_start(&mut self, cell: CellCoord) {
        self.set(cell, DYING);
    }

    fn render_vanish(&mut self, cell: CellCoord) {
        self.set(cell, EMPTY);
    }

    fn render_reset(&mut self, grid: GridSize) {
        self.grid = grid;
        self.glyphs = vec![EMPTY; grid.cell_count().unwrap_or(0)];
    }
}
