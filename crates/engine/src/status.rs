//! Spreadsheet-wide display status.
//!
//! One `StatusController` per question decides which value every input and
//! output shows:
//!
//! | status               | rankable inputs        | outputs                                   |
//! |----------------------|------------------------|-------------------------------------------|
//! | `AllErrors`          | error                  | error                                     |
//! | `NoErrors`           | original               | original                                  |
//! | `AllButOneError(i)`  | `i` original, rest err | dependents of `i` show its `noerr`, rest error |
//!
//! Transitions are validated before anything is mutated. Entering
//! `AllButOneError` from anything other than `AllErrors` (or the same
//! isolated input) first runs a full `AllErrors` pass, which is also what
//! resets a previously isolated input.
//!
//! Listeners cannot reach the graph while it dispatches, so a listener that
//! wants to react with another transition queues it through a
//! [`StatusRequests`] handle. The queue is drained after the transition that
//! triggered it, up to `max_chained` follow-ups.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dep_graph::DepGraph;
use crate::error::StatusError;
use crate::item::{Item, ItemId};

/// Default bound on follow-up transitions queued by listeners.
pub const DEFAULT_MAX_CHAINED_TRANSITIONS: usize = 16;

/// Status without its parameter; what a caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusMode {
    AllErrors,
    NoErrors,
    AllButOneError,
}

impl StatusMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusMode::AllErrors => "all-errors",
            StatusMode::NoErrors => "no-errors",
            StatusMode::AllButOneError => "all-but-one-error",
        }
    }
}

impl fmt::Display for StatusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusMode {
    type Err = StatusError;

    /// Accepts kebab-case (`all-errors`) and the constant style (`ALL_ERRORS`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "all-errors" => Ok(StatusMode::AllErrors),
            "no-errors" => Ok(StatusMode::NoErrors),
            "all-but-one-error" => Ok(StatusMode::AllButOneError),
            _ => Err(StatusError::UnknownStatus(s.to_string())),
        }
    }
}

/// The active display status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GlobalStatus {
    #[default]
    AllErrors,
    NoErrors,
    /// Every error shown except the chosen input's.
    AllButOneError(ItemId),
}

impl GlobalStatus {
    pub fn mode(&self) -> StatusMode {
        match self {
            GlobalStatus::AllErrors => StatusMode::AllErrors,
            GlobalStatus::NoErrors => StatusMode::NoErrors,
            GlobalStatus::AllButOneError(_) => StatusMode::AllButOneError,
        }
    }

    /// The suppressed input, in isolate mode.
    pub fn isolated(&self) -> Option<ItemId> {
        match self {
            GlobalStatus::AllButOneError(id) => Some(*id),
            _ => None,
        }
    }
}

/// Queue of transitions requested from inside listeners.
///
/// Cheap to clone; every clone feeds the same controller.
#[derive(Debug, Clone, Default)]
pub struct StatusRequests {
    queue: Rc<RefCell<VecDeque<(StatusMode, Option<ItemId>)>>>,
}

impl StatusRequests {
    /// Ask for a transition once the current one has finished.
    pub fn request(&self, mode: StatusMode, item: Option<ItemId>) {
        self.queue.borrow_mut().push_back((mode, item));
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    fn pop(&self) -> Option<(StatusMode, Option<ItemId>)> {
        self.queue.borrow_mut().pop_front()
    }

    fn clear(&self) {
        self.queue.borrow_mut().clear();
    }
}

#[derive(Debug)]
pub struct StatusController {
    status: GlobalStatus,
    requests: StatusRequests,
    max_chained: usize,
}

impl Default for StatusController {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusController {
    pub fn new() -> Self {
        Self::with_max_chained(DEFAULT_MAX_CHAINED_TRANSITIONS)
    }

    pub fn with_max_chained(max_chained: usize) -> Self {
        Self {
            status: GlobalStatus::AllErrors,
            requests: StatusRequests::default(),
            max_chained,
        }
    }

    pub fn status(&self) -> GlobalStatus {
        self.status
    }

    /// Handle for listeners that want to trigger follow-up transitions.
    pub fn requests(&self) -> StatusRequests {
        self.requests.clone()
    }

    /// Bring a freshly built graph in line with the initial `AllErrors` status.
    pub fn initialize(&mut self, graph: &mut DepGraph) {
        self.apply(graph, GlobalStatus::AllErrors);
    }

    /// Switch display status. `item` is required for `AllButOneError` and
    /// ignored otherwise.
    pub fn change_status(
        &mut self,
        graph: &mut DepGraph,
        mode: StatusMode,
        item: Option<ItemId>,
    ) -> Result<(), StatusError> {
        let target = Self::validate(graph, mode, item)?;
        self.apply(graph, target);
        self.process_requests(graph)
    }

    /// Like [`change_status`](Self::change_status) with the mode given by name.
    pub fn change_status_named(
        &mut self,
        graph: &mut DepGraph,
        mode: &str,
        item: Option<ItemId>,
    ) -> Result<(), StatusError> {
        let mode: StatusMode = mode.parse()?;
        self.change_status(graph, mode, item)
    }

    /// Run transitions queued by listeners until the queue is empty.
    pub fn process_requests(&mut self, graph: &mut DepGraph) -> Result<(), StatusError> {
        let mut chained = 0;
        while let Some((mode, item)) = self.requests.pop() {
            if chained == self.max_chained {
                self.requests.clear();
                log::warn!(
                    "dropping queued status transitions after {} follow-ups; status stays {:?}",
                    self.max_chained,
                    self.status
                );
                return Err(StatusError::TransitionLoop {
                    limit: self.max_chained,
                });
            }
            chained += 1;

            let target = match Self::validate(graph, mode, item) {
                Ok(target) => target,
                Err(e) => {
                    self.requests.clear();
                    return Err(e);
                }
            };
            self.apply(graph, target);
        }
        Ok(())
    }

    fn validate(
        graph: &DepGraph,
        mode: StatusMode,
        item: Option<ItemId>,
    ) -> Result<GlobalStatus, StatusError> {
        match mode {
            StatusMode::AllErrors => Ok(GlobalStatus::AllErrors),
            StatusMode::NoErrors => Ok(GlobalStatus::NoErrors),
            StatusMode::AllButOneError => {
                let id = item.ok_or(StatusError::MissingItem)?;
                let chosen = graph
                    .try_item(id)
                    .ok_or(StatusError::UnknownItem(id.raw()))?;
                if !graph.is_rankable(id) {
                    return Err(StatusError::NotRankable(chosen.coordinate().clone()));
                }
                Ok(GlobalStatus::AllButOneError(id))
            }
        }
    }

    fn apply(&mut self, graph: &mut DepGraph, target: GlobalStatus) {
        log::debug!("status {:?} -> {:?}", self.status, target);

        match target {
            GlobalStatus::AllErrors => {
                for id in graph.inputs().to_vec() {
                    graph.change_input_value(id, true);
                }
                for id in graph.outputs().to_vec() {
                    graph.display_error(id);
                }
            }
            GlobalStatus::NoErrors => {
                for id in graph.inputs().to_vec() {
                    graph.change_input_value(id, false);
                }
                for id in graph.outputs().to_vec() {
                    graph.display_original(id);
                }
            }
            GlobalStatus::AllButOneError(chosen) => {
                // Re-isolating the same input leaves everything in place.
                if self.status != GlobalStatus::AllErrors && self.status != target {
                    self.apply(graph, GlobalStatus::AllErrors);
                }
                graph.change_input_value(chosen, false);
                for dep in graph.dependents_of(chosen).to_vec() {
                    graph.display_custom_value(dep.output, &dep.noerr);
                }
            }
        }

        self.status = target;
    }
}
