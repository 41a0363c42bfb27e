//! Sparse worksheet grid.
//!
//! A worksheet is a dense, growable `row → column` table of slots. Rows and
//! columns are created lazily as items are placed, and every newly exposed
//! slot is filled with `Slot::Empty`, so any in-range lookup is well defined.

use crate::error::GraphError;
use crate::item::ItemId;

/// One grid position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Slot {
    /// Padding: nothing lives here.
    #[default]
    Empty,
    Item(ItemId),
}

impl Slot {
    pub fn item(&self) -> Option<ItemId> {
        match self {
            Slot::Empty => None,
            Slot::Item(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Worksheet {
    pub name: String,
    rows: Vec<Vec<Slot>>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Place an item, growing the grid as needed. Returns false, leaving the
    /// grid untouched apart from growth, if the slot is already taken.
    pub fn place(&mut self, row: usize, col: usize, id: ItemId) -> bool {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, Slot::Empty);
        }
        match cells[col] {
            Slot::Empty => {
                cells[col] = Slot::Item(id);
                true
            }
            Slot::Item(_) => false,
        }
    }

    /// True if `(row, col)` already holds an item.
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .is_some_and(|s| matches!(s, Slot::Item(_)))
    }

    /// Pad every row to the widest row.
    pub fn pad_rows(&mut self) {
        let width = self.width();
        for row in &mut self.rows {
            row.resize(width, Slot::Empty);
        }
    }

    /// Slot at `(row, col)`.
    pub fn slot(&self, row: usize, col: usize) -> Result<Slot, GraphError> {
        let cells = self.rows.get(row).ok_or_else(|| GraphError::InvalidRow {
            worksheet: self.name.clone(),
            row,
        })?;
        cells.get(col).copied().ok_or_else(|| GraphError::InvalidColumn {
            worksheet: self.name.clone(),
            row,
            col,
        })
    }

    /// Widest row, in columns.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<Slot>] {
        &self.rows
    }

    /// Items on this worksheet in row-major order.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.rows.iter().flatten().filter_map(Slot::item)
    }
}
