//! Data dependency graph for one question.
//!
//! Owns every cell item in a single arena and projects the three-dimensional
//! `(worksheet, row, column)` space onto per-worksheet grids.
//!
//! # Edge Direction
//!
//! ```text
//! I → O  means  "O depends on I"  (I is an input feeding output O)
//! ```
//!
//! Each input stores its dependents together with the `noerr` override value,
//! and each output stores the inputs feeding it.
//!
//! # Invariants
//!
//! 1. **Bidirectional consistency:** if O is a dependent of I then I is a
//!    dependency of O, and vice versa.
//! 2. **Frozen shape:** items, edges and grid placement never change after
//!    construction; only each item's display state does.
//! 3. **Outputs first:** every output exists before any input is built, since
//!    inputs resolve their dependents through grid lookups.
//! 4. **Padded grids:** after construction every row of a worksheet has the
//!    same width, so in-range lookups never fail.

use rustc_hash::FxHashMap;

use crate::cell_id::SpreadsheetCoordinate;
use crate::error::GraphError;
use crate::events::{CellChange, ChangeChannel, EventKind, Subscription};
use crate::item::{CellItem, Dependent, InputItem, Item, ItemId, ItemKind, OutputItem};
use crate::model::{InputRecord, OutputRecord, QuestionInfo};
use crate::sheet::{Slot, Worksheet};

/// Dense projection of the graph, padded to the graph-wide width and height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridView {
    pub width: usize,
    pub height: usize,
    pub worksheets: Vec<WorksheetView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetView {
    pub name: String,
    /// `height` rows of `width` slots each.
    pub rows: Vec<Vec<Option<ItemId>>>,
}

#[derive(Debug, Default)]
pub struct DepGraph {
    items: Vec<CellItem>,
    /// Worksheets in first-seen order.
    sheets: Vec<Worksheet>,
    sheet_index: FxHashMap<String, usize>,
    outputs: Vec<ItemId>,
    /// Rankable (non-context) inputs.
    inputs: Vec<ItemId>,
    context_inputs: Vec<ItemId>,
    /// Sees every change of every item.
    any_changed: ChangeChannel,
}

impl DepGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a question: outputs, then inputs, then padding.
    pub fn from_question(question: &QuestionInfo) -> Result<Self, GraphError> {
        let mut graph = Self::new();

        // Outputs first; inputs look them up.
        for record in &question.outputs {
            graph.add_output(record)?;
        }
        for record in &question.errors {
            graph.add_input(record)?;
        }
        graph.finish();

        log::debug!(
            "built dependency graph: {} outputs, {} rankable inputs, {} context inputs, {} worksheets ({}x{})",
            graph.outputs.len(),
            graph.inputs.len(),
            graph.context_inputs.len(),
            graph.sheets.len(),
            graph.width(),
            graph.height(),
        );
        Ok(graph)
    }

    /// Instantiate and index an output.
    pub(crate) fn add_output(&mut self, record: &OutputRecord) -> Result<ItemId, GraphError> {
        let coord = record.coordinate();
        ensure_in_bounds(&coord)?;
        self.ensure_free(&coord)?;

        let id = self.next_id();
        self.items.push(CellItem::Output(OutputItem::new(id, record)));
        self.add_item(&coord, id);
        self.outputs.push(id);
        Ok(id)
    }

    /// Instantiate and index an input, wiring it to the outputs it lists.
    ///
    /// All dependents are resolved before anything is mutated, so a failure
    /// leaves the graph as it was.
    pub(crate) fn add_input(&mut self, record: &InputRecord) -> Result<ItemId, GraphError> {
        let coord = record.coordinate();
        ensure_in_bounds(&coord)?;
        self.ensure_free(&coord)?;

        let mut dependents = Vec::with_capacity(record.outputs.len());
        for dep in &record.outputs {
            let dep_coord = dep.coordinate();
            ensure_in_bounds(&dep_coord)?;
            let output = self.item_id(&dep_coord).map_err(|_| GraphError::DanglingDependency {
                input: coord.clone(),
                dependent: dep_coord.clone(),
            })?;
            if self.item(output).kind() != ItemKind::Output {
                return Err(GraphError::DependentNotOutput {
                    input: coord,
                    dependent: dep_coord,
                });
            }
            dependents.push(Dependent {
                noerr: dep.noerr.clone(),
                output,
            });
        }

        let id = self.next_id();
        for dep in &dependents {
            if let Some(output) = self.items[dep.output.index()].as_output_mut() {
                output.add_dependency(id);
            }
        }

        let input = InputItem::new(id, record, dependents);
        if input.is_context() {
            self.context_inputs.push(id);
        } else {
            self.inputs.push(id);
        }
        self.items.push(CellItem::Input(input));
        self.add_item(&coord, id);
        Ok(id)
    }

    /// Pad every worksheet to uniform row width. Called once construction is done.
    pub(crate) fn finish(&mut self) {
        for sheet in &mut self.sheets {
            sheet.pad_rows();
        }
    }

    fn next_id(&self) -> ItemId {
        ItemId::from_raw(self.items.len() as u32)
    }

    fn ensure_free(&self, coord: &SpreadsheetCoordinate) -> Result<(), GraphError> {
        let taken = self
            .sheet_index
            .get(&coord.worksheet)
            .is_some_and(|&idx| self.sheets[idx].is_occupied(coord.row(), coord.col()));
        if taken {
            Err(GraphError::DuplicateCell(coord.clone()))
        } else {
            Ok(())
        }
    }

    /// Insert into the sparse grid, creating the worksheet on first use.
    fn add_item(&mut self, coord: &SpreadsheetCoordinate, id: ItemId) {
        let idx = match self.sheet_index.get(&coord.worksheet) {
            Some(&idx) => idx,
            None => {
                self.sheets.push(Worksheet::new(coord.worksheet.clone()));
                let idx = self.sheets.len() - 1;
                self.sheet_index.insert(coord.worksheet.clone(), idx);
                idx
            }
        };
        self.sheets[idx].place(coord.row(), coord.col(), id);
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn worksheet(&self, name: &str) -> Result<&Worksheet, GraphError> {
        self.sheet_index
            .get(name)
            .map(|&idx| &self.sheets[idx])
            .ok_or_else(|| GraphError::UnknownWorksheet(name.to_string()))
    }

    pub fn worksheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn worksheet_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    /// Slot contents at a raw grid position. `Ok(None)` is padding.
    ///
    /// Anything inside the graph-wide `width × height` is in range for every
    /// worksheet, even one whose own extent is smaller.
    pub fn slot(&self, worksheet: &str, row: usize, col: usize) -> Result<Option<ItemId>, GraphError> {
        let sheet = self.worksheet(worksheet)?;
        if row < self.height() && col < self.width() {
            return Ok(sheet.slot(row, col).ok().and_then(|s| s.item()));
        }
        Ok(sheet.slot(row, col)?.item())
    }

    /// Id of the item at `coord`. Padding counts as a lookup error.
    pub fn item_id(&self, coord: &SpreadsheetCoordinate) -> Result<ItemId, GraphError> {
        match self.worksheet(&coord.worksheet)?.slot(coord.row(), coord.col())? {
            Slot::Item(id) => Ok(id),
            Slot::Empty => Err(GraphError::EmptyCell(coord.clone())),
        }
    }

    pub fn get_item(&self, coord: &SpreadsheetCoordinate) -> Result<&CellItem, GraphError> {
        Ok(self.item(self.item_id(coord)?))
    }

    /// Item by id. Ids are only valid for the graph that issued them.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by another graph and lies past this arena.
    /// Use [`DepGraph::try_item`] for ids of unknown origin.
    pub fn item(&self, id: ItemId) -> &CellItem {
        &self.items[id.index()]
    }

    /// Item by id, or `None` if this graph never issued it.
    pub fn try_item(&self, id: ItemId) -> Option<&CellItem> {
        self.items.get(id.index())
    }

    pub fn items(&self) -> &[CellItem] {
        &self.items
    }

    /// Rankable inputs, in construction order.
    pub fn inputs(&self) -> &[ItemId] {
        &self.inputs
    }

    /// Inputs excluded from ranking. Still placed in the grid.
    pub fn context_inputs(&self) -> &[ItemId] {
        &self.context_inputs
    }

    /// All outputs, in construction order.
    pub fn outputs(&self) -> &[ItemId] {
        &self.outputs
    }

    pub fn is_rankable(&self, id: ItemId) -> bool {
        self.inputs.contains(&id)
    }

    /// Outputs fed by `input` with their overrides. Empty for outputs.
    pub fn dependents_of(&self, input: ItemId) -> &[Dependent] {
        self.item(input).as_input().map(InputItem::dependents).unwrap_or(&[])
    }

    /// Inputs feeding `output`. Empty for inputs.
    pub fn dependencies_of(&self, output: ItemId) -> &[ItemId] {
        self.item(output).as_output().map(OutputItem::dependencies).unwrap_or(&[])
    }

    /// Widest worksheet, in columns.
    pub fn width(&self) -> usize {
        self.sheets.iter().map(Worksheet::width).max().unwrap_or(0)
    }

    /// Tallest worksheet, in rows.
    pub fn height(&self) -> usize {
        self.sheets.iter().map(Worksheet::height).max().unwrap_or(0)
    }

    /// Every worksheet at the graph-wide dimensions, so all tabs render alike.
    pub fn get_data(&self) -> GridView {
        let (width, height) = (self.width(), self.height());
        let worksheets = self
            .sheets
            .iter()
            .map(|sheet| {
                let rows = (0..height)
                    .map(|row| {
                        (0..width)
                            .map(|col| sheet.slot(row, col).ok().and_then(|s| s.item()))
                            .collect()
                    })
                    .collect();
                WorksheetView {
                    name: sheet.name.clone(),
                    rows,
                }
            })
            .collect();

        GridView {
            width,
            height,
            worksheets,
        }
    }

    // =========================================================================
    // Display state
    // =========================================================================

    /// Set an input's error flag. Returns true if it changed.
    pub fn change_input_value(&mut self, input: ItemId, to_error: bool) -> bool {
        let change = self.items[input.index()]
            .as_input_mut()
            .and_then(|i| i.change_value(to_error));
        self.forward(change)
    }

    pub fn display_original(&mut self, output: ItemId) -> bool {
        let change = self.items[output.index()]
            .as_output_mut()
            .and_then(OutputItem::display_original);
        self.forward(change)
    }

    pub fn display_error(&mut self, output: ItemId) -> bool {
        let change = self.items[output.index()]
            .as_output_mut()
            .and_then(OutputItem::display_error);
        self.forward(change)
    }

    pub fn display_custom_value(&mut self, output: ItemId, value: &str) -> bool {
        let change = self.items[output.index()]
            .as_output_mut()
            .and_then(|o| o.display_custom_value(value));
        self.forward(change)
    }

    fn forward(&mut self, change: Option<CellChange>) -> bool {
        match change {
            Some(change) => {
                self.any_changed.publish(EventKind::Changed, &change);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub fn on_item_changed<F>(&mut self, item: ItemId, listener: F) -> Subscription
    where
        F: FnMut(&CellChange) + 'static,
    {
        self.items[item.index()].channel_mut().on_changed(listener)
    }

    pub fn unsubscribe_item(&mut self, item: ItemId, sub: Subscription) -> bool {
        self.items[item.index()].unsubscribe(sub)
    }

    /// Listen to every item in the graph.
    pub fn on_any_changed<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&CellChange) + 'static,
    {
        self.any_changed.on_changed(listener)
    }

    pub fn unsubscribe_any(&mut self, sub: Subscription) -> bool {
        self.any_changed.unsubscribe(sub)
    }

    // =========================================================================
    // Test Helpers
    // =========================================================================

    /// Verify graph invariants. Panics with descriptive message if violated.
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        // Invariant 1: inputs → outputs
        for item in &self.items {
            if let Some(input) = item.as_input() {
                for dep in input.dependents() {
                    assert!(
                        self.dependencies_of(dep.output).contains(&input.id()),
                        "Missing back-edge: {} should list {} as a dependency",
                        self.item(dep.output).coordinate(),
                        input.coordinate()
                    );
                }
            }
        }

        // Invariant 1: outputs → inputs
        for item in &self.items {
            if let Some(output) = item.as_output() {
                for &input in output.dependencies() {
                    assert!(
                        self.dependents_of(input).iter().any(|d| d.output == output.id()),
                        "Missing edge: {} should list {} as a dependent",
                        self.item(input).coordinate(),
                        output.coordinate()
                    );
                }
            }
        }

        // Every item sits at its own coordinate.
        for item in &self.items {
            assert_eq!(
                self.item_id(item.coordinate()).ok(),
                Some(item.id()),
                "Item {} is not indexed at its coordinate",
                item.coordinate()
            );
        }

        // Invariant 4: padded rows
        for sheet in &self.sheets {
            let width = sheet.width();
            assert!(
                sheet.rows().iter().all(|r| r.len() == width),
                "Worksheet {} has ragged rows",
                sheet.name
            );
        }
    }
}

/// Reject padding slots and anything past the largest worksheet before the
/// grid grows to hold it.
fn ensure_in_bounds(coord: &SpreadsheetCoordinate) -> Result<(), GraphError> {
    if coord.is_in_bounds() {
        Ok(())
    } else {
        Err(GraphError::InvalidCoordinate(coord.clone()))
    }
}
