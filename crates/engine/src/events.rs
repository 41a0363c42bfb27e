//! Change notifications for cell items.
//!
//! Every item owns a `ChangeChannel`; the dependency graph owns one more that
//! sees every item change, so a consumer can subscribe once for a whole
//! question. Dispatch is synchronous and in registration order. A panicking
//! listener aborts the rest of the dispatch.

use crate::cell_id::SpreadsheetCoordinate;
use crate::item::{ItemId, ItemKind};

/// The closed set of events an item can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Visible value or error flag changed.
    Changed,
}

impl EventKind {
    /// Look up an event by its wire name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "changed" => Some(Self::Changed),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Changed => "changed",
        }
    }
}

/// Snapshot of an item taken right after it changed.
#[derive(Debug, Clone, PartialEq)]
pub struct CellChange {
    pub item: ItemId,
    pub coordinate: SpreadsheetCoordinate,
    pub kind: ItemKind,
    /// Value now displayed.
    pub value: String,
    /// Erroneous flag after the change.
    pub erroneous: bool,
}

/// Callback type for receiving item changes.
pub type Listener = Box<dyn FnMut(&CellChange)>;

/// Handle returned by `subscribe`; pass it to `unsubscribe` to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

/// Per-object observer registry.
#[derive(Default)]
pub struct ChangeChannel {
    next_id: u64,
    listeners: Vec<(Subscription, Listener)>,
}

impl ChangeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> Subscription
    where
        F: FnMut(&CellChange) + 'static,
    {
        let sub = Subscription {
            kind,
            id: self.next_id,
        };
        self.next_id += 1;
        self.listeners.push((sub, Box::new(listener)));
        sub
    }

    /// Register a listener by event name. An unknown name registers nothing.
    pub fn subscribe_named<F>(&mut self, name: &str, listener: F) -> Option<Subscription>
    where
        F: FnMut(&CellChange) + 'static,
    {
        let kind = EventKind::from_name(name)?;
        Some(self.subscribe(kind, listener))
    }

    /// Shorthand for `subscribe(EventKind::Changed, ..)`.
    pub fn on_changed<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&CellChange) + 'static,
    {
        self.subscribe(EventKind::Changed, listener)
    }

    /// Detach a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(s, _)| *s != sub);
        self.listeners.len() != before
    }

    /// Invoke every listener registered for `kind`, in registration order.
    pub fn publish(&mut self, kind: EventKind, change: &CellChange) {
        for (sub, listener) in self.listeners.iter_mut() {
            if sub.kind == kind {
                listener(change);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for ChangeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeChannel")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Simple event collector for testing.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<CellChange>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: CellChange) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[CellChange] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Changes emitted by one item, oldest first.
    pub fn for_item(&self, item: ItemId) -> Vec<&CellChange> {
        self.events.iter().filter(|e| e.item == item).collect()
    }

    /// Last value reported for an item, if it changed at all.
    pub fn last_value(&self, item: ItemId) -> Option<&str> {
        self.events
            .iter()
            .rev()
            .find(|e| e.item == item)
            .map(|e| e.value.as_str())
    }
}
