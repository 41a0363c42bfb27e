//! Cell items: the observable value holders of the dependency graph.
//!
//! Items live in the graph's arena and refer to each other by `ItemId`.
//! Every mutator reports whether the visible state actually changed; only
//! real changes reach listeners.

use serde::{Deserialize, Serialize};

use crate::cell_id::SpreadsheetCoordinate;
use crate::events::{CellChange, ChangeChannel, EventKind, Subscription};
use crate::model::{CellStyle, InputRecord, OutputRecord};

/// Stable index of an item in its graph's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Output,
    Input,
}

/// Which of its values an output is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStatus {
    #[default]
    Original,
    Error,
    Custom,
}

/// Capabilities shared by both item variants.
pub trait Item {
    fn id(&self) -> ItemId;
    fn kind(&self) -> ItemKind;
    fn coordinate(&self) -> &SpreadsheetCoordinate;
    /// Value currently displayed.
    fn value(&self) -> &str;
    fn is_erroneous(&self) -> bool;
    fn channel_mut(&mut self) -> &mut ChangeChannel;

    fn snapshot(&self) -> CellChange {
        CellChange {
            item: self.id(),
            coordinate: self.coordinate().clone(),
            kind: self.kind(),
            value: self.value().to_string(),
            erroneous: self.is_erroneous(),
        }
    }

    fn on_changed<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&CellChange) + 'static,
        Self: Sized,
    {
        self.channel_mut().on_changed(listener)
    }

    /// Publish a `Changed` event carrying the current snapshot.
    fn fire_changed(&mut self) -> CellChange {
        let change = self.snapshot();
        self.channel_mut().publish(EventKind::Changed, &change);
        change
    }
}

// ============================================================================
// Outputs
// ============================================================================

/// A formula-result cell.
#[derive(Debug)]
pub struct OutputItem {
    id: ItemId,
    coordinate: SpreadsheetCoordinate,
    orig: String,
    err: String,
    formula: String,
    status: OutputStatus,
    /// Only meaningful while `status == Custom`.
    custom: String,
    /// Inputs that feed this output. Append-only, filled during construction.
    dependencies: Vec<ItemId>,
    channel: ChangeChannel,
}

impl OutputItem {
    pub fn new(id: ItemId, record: &OutputRecord) -> Self {
        Self {
            id,
            coordinate: record.coordinate(),
            orig: record.orig.clone(),
            err: record.err.clone(),
            formula: record.formula.clone(),
            status: OutputStatus::Original,
            custom: String::new(),
            dependencies: Vec::new(),
            channel: ChangeChannel::new(),
        }
    }

    /// Record an input that feeds this output. Not deduplicated.
    pub fn add_dependency(&mut self, input: ItemId) {
        self.dependencies.push(input);
    }

    pub fn dependencies(&self) -> &[ItemId] {
        &self.dependencies
    }

    pub fn status(&self) -> OutputStatus {
        self.status
    }

    pub fn original(&self) -> &str {
        &self.orig
    }

    pub fn error(&self) -> &str {
        &self.err
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn display_original(&mut self) -> Option<CellChange> {
        self.set_status(OutputStatus::Original, None)
    }

    pub fn display_error(&mut self) -> Option<CellChange> {
        self.set_status(OutputStatus::Error, None)
    }

    /// Show an arbitrary value. Repeating the same value is not a change.
    pub fn display_custom_value(&mut self, value: impl Into<String>) -> Option<CellChange> {
        self.set_status(OutputStatus::Custom, Some(value.into()))
    }

    fn set_status(&mut self, status: OutputStatus, custom: Option<String>) -> Option<CellChange> {
        let custom = custom.unwrap_or_default();
        if self.status == status && self.custom == custom {
            return None;
        }
        self.status = status;
        self.custom = custom;
        Some(self.fire_changed())
    }
}

impl Item for OutputItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Output
    }

    fn coordinate(&self) -> &SpreadsheetCoordinate {
        &self.coordinate
    }

    fn value(&self) -> &str {
        match self.status {
            OutputStatus::Original => &self.orig,
            OutputStatus::Error => &self.err,
            OutputStatus::Custom => &self.custom,
        }
    }

    /// Only the plain error state counts; a custom override does not.
    fn is_erroneous(&self) -> bool {
        self.status == OutputStatus::Error
    }

    fn channel_mut(&mut self) -> &mut ChangeChannel {
        &mut self.channel
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// An output fed by an input, with the value it shows when only that input's
/// error is suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependent {
    pub noerr: String,
    pub output: ItemId,
}

/// A cell flagged as a candidate source of error.
#[derive(Debug)]
pub struct InputItem {
    id: ItemId,
    coordinate: SpreadsheetCoordinate,
    orig: String,
    err: String,
    style: Option<CellStyle>,
    dependents: Vec<Dependent>,
    show_error: bool,
    channel: ChangeChannel,
}

impl InputItem {
    /// Build an input whose dependents were already resolved by the graph.
    pub fn new(id: ItemId, record: &InputRecord, dependents: Vec<Dependent>) -> Self {
        Self {
            id,
            coordinate: record.coordinate(),
            orig: record.orig.clone(),
            err: record.err.clone(),
            style: record.style.clone(),
            dependents,
            show_error: false,
            channel: ChangeChannel::new(),
        }
    }

    /// Toggle between the error and original value. Does not touch dependents.
    pub fn change_value(&mut self, to_error: bool) -> Option<CellChange> {
        if self.show_error == to_error {
            return None;
        }
        self.show_error = to_error;
        Some(self.fire_changed())
    }

    pub fn dependents(&self) -> &[Dependent] {
        &self.dependents
    }

    /// Not a ranking candidate: no distinct error value, or affects nothing.
    pub fn is_context(&self) -> bool {
        self.orig == self.err || self.dependents.is_empty()
    }

    pub fn original(&self) -> &str {
        &self.orig
    }

    pub fn error(&self) -> &str {
        &self.err
    }

    pub fn style(&self) -> Option<&CellStyle> {
        self.style.as_ref()
    }
}

impl Item for InputItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Input
    }

    fn coordinate(&self) -> &SpreadsheetCoordinate {
        &self.coordinate
    }

    fn value(&self) -> &str {
        if self.show_error {
            &self.err
        } else {
            &self.orig
        }
    }

    fn is_erroneous(&self) -> bool {
        self.show_error
    }

    fn channel_mut(&mut self) -> &mut ChangeChannel {
        &mut self.channel
    }
}

// ============================================================================
// Either variant
// ============================================================================

#[derive(Debug)]
pub enum CellItem {
    Output(OutputItem),
    Input(InputItem),
}

impl CellItem {
    pub fn as_output(&self) -> Option<&OutputItem> {
        match self {
            CellItem::Output(o) => Some(o),
            CellItem::Input(_) => None,
        }
    }

    pub fn as_output_mut(&mut self) -> Option<&mut OutputItem> {
        match self {
            CellItem::Output(o) => Some(o),
            CellItem::Input(_) => None,
        }
    }

    pub fn as_input(&self) -> Option<&InputItem> {
        match self {
            CellItem::Input(i) => Some(i),
            CellItem::Output(_) => None,
        }
    }

    pub fn as_input_mut(&mut self) -> Option<&mut InputItem> {
        match self {
            CellItem::Input(i) => Some(i),
            CellItem::Output(_) => None,
        }
    }

    /// Presentational style. Outputs never carry one.
    pub fn style(&self) -> Option<&CellStyle> {
        self.as_input().and_then(InputItem::style)
    }

    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        self.channel_mut().unsubscribe(sub)
    }
}

impl Item for CellItem {
    fn id(&self) -> ItemId {
        match self {
            CellItem::Output(o) => o.id(),
            CellItem::Input(i) => i.id(),
        }
    }

    fn kind(&self) -> ItemKind {
        match self {
            CellItem::Output(_) => ItemKind::Output,
            CellItem::Input(_) => ItemKind::Input,
        }
    }

    fn coordinate(&self) -> &SpreadsheetCoordinate {
        match self {
            CellItem::Output(o) => o.coordinate(),
            CellItem::Input(i) => i.coordinate(),
        }
    }

    fn value(&self) -> &str {
        match self {
            CellItem::Output(o) => o.value(),
            CellItem::Input(i) => i.value(),
        }
    }

    fn is_erroneous(&self) -> bool {
        match self {
            CellItem::Output(o) => o.is_erroneous(),
            CellItem::Input(i) => i.is_erroneous(),
        }
    }

    fn channel_mut(&mut self) -> &mut ChangeChannel {
        match self {
            CellItem::Output(o) => o.channel_mut(),
            CellItem::Input(i) => i.channel_mut(),
        }
    }
}
