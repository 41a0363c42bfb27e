//! One rendered question: its dependency graph plus the display status that
//! drives it.

use crate::cell_id::SpreadsheetCoordinate;
use crate::dep_graph::{DepGraph, GridView};
use crate::error::{GraphError, RankingError, StatusError};
use crate::events::{CellChange, Subscription};
use crate::item::{CellItem, Item, ItemId};
use crate::model::QuestionInfo;
use crate::ranking::{self, RankingResult, RankingSubmission};
use crate::status::{GlobalStatus, StatusController, StatusMode, StatusRequests};

#[derive(Debug)]
pub struct Question {
    graph: DepGraph,
    controller: StatusController,
}

impl Question {
    /// Build the graph and show every error.
    pub fn new(info: &QuestionInfo) -> Result<Self, GraphError> {
        Self::with_controller(info, StatusController::new())
    }

    /// Like [`new`](Self::new) with a custom bound on chained transitions.
    pub fn with_max_chained(info: &QuestionInfo, max_chained: usize) -> Result<Self, GraphError> {
        Self::with_controller(info, StatusController::with_max_chained(max_chained))
    }

    fn with_controller(info: &QuestionInfo, mut controller: StatusController) -> Result<Self, GraphError> {
        let mut graph = DepGraph::from_question(info)?;
        controller.initialize(&mut graph);
        Ok(Self { graph, controller })
    }

    pub fn graph(&self) -> &DepGraph {
        &self.graph
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Rankable inputs.
    pub fn inputs(&self) -> &[ItemId] {
        self.graph.inputs()
    }

    pub fn outputs(&self) -> &[ItemId] {
        self.graph.outputs()
    }

    pub fn get_data(&self) -> GridView {
        self.graph.get_data()
    }

    pub fn width(&self) -> usize {
        self.graph.width()
    }

    pub fn height(&self) -> usize {
        self.graph.height()
    }

    pub fn get_item(&self, coord: &SpreadsheetCoordinate) -> Result<&CellItem, GraphError> {
        self.graph.get_item(coord)
    }

    /// Item by id. Panics on an id issued by another question; see
    /// [`Question::try_item`].
    pub fn item(&self, id: ItemId) -> &CellItem {
        self.graph.item(id)
    }

    pub fn try_item(&self, id: ItemId) -> Option<&CellItem> {
        self.graph.try_item(id)
    }

    /// Worksheet names in tab order, each flagged if any of its cells is
    /// currently showing an error.
    pub fn erroneous_worksheets(&self) -> Vec<(&str, bool)> {
        self.graph
            .worksheets()
            .iter()
            .map(|sheet| {
                let erroneous = sheet.items().any(|id| self.graph.item(id).is_erroneous());
                (sheet.name.as_str(), erroneous)
            })
            .collect()
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub fn status(&self) -> GlobalStatus {
        self.controller.status()
    }

    pub fn change_status(&mut self, mode: StatusMode, item: Option<ItemId>) -> Result<(), StatusError> {
        self.controller.change_status(&mut self.graph, mode, item)
    }

    /// Isolate the input at `coord`.
    pub fn isolate(&mut self, coord: &SpreadsheetCoordinate) -> Result<(), StatusError> {
        let id = self
            .graph
            .item_id(coord)
            .map_err(|_| StatusError::NotRankable(coord.clone()))?;
        self.change_status(StatusMode::AllButOneError, Some(id))
    }

    /// Handle for listeners that want to queue a follow-up transition.
    pub fn status_requests(&self) -> StatusRequests {
        self.controller.requests()
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub fn on_item_changed<F>(&mut self, item: ItemId, listener: F) -> Subscription
    where
        F: FnMut(&CellChange) + 'static,
    {
        self.graph.on_item_changed(item, listener)
    }

    pub fn on_any_changed<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&CellChange) + 'static,
    {
        self.graph.on_any_changed(listener)
    }

    pub fn unsubscribe_item(&mut self, item: ItemId, sub: Subscription) -> bool {
        self.graph.unsubscribe_item(item, sub)
    }

    pub fn unsubscribe_any(&mut self, sub: Subscription) -> bool {
        self.graph.unsubscribe_any(sub)
    }

    // =========================================================================
    // Ranking
    // =========================================================================

    pub fn reconcile_ranking(&self, submission: &RankingSubmission) -> Result<RankingResult, RankingError> {
        ranking::reconcile(&self.graph, submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUESTION: &str = r#"{
        "errors": [
            { "x": 1, "y": 1, "worksheet": "inputs", "orig": "12.343", "err": "123.43",
              "outputs": [ { "x": 2, "y": 2, "worksheet": "results", "noerr": "62.11" } ] },
            { "x": 1, "y": 2, "worksheet": "inputs", "orig": "10.0", "err": "1.0",
              "outputs": [ { "x": 2, "y": 2, "worksheet": "results", "noerr": "0.0" } ] },
            { "x": 1, "y": 1, "worksheet": "notes", "orig": "n/a", "err": "n/a" }
        ],
        "outputs": [
            { "x": 2, "y": 2, "worksheet": "results", "orig": "0.0", "err": "100", "formula": "=inputs!A1*5" }
        ]
    }"#;

    fn question() -> Question {
        Question::new(&QuestionInfo::from_json(QUESTION).unwrap()).unwrap()
    }

    #[test]
    fn test_new_question_shows_all_errors() {
        let q = question();
        assert_eq!(q.status(), GlobalStatus::AllErrors);
        assert_eq!(q.inputs().len(), 2);
        assert_eq!(q.outputs().len(), 1);
        assert_eq!((q.width(), q.height()), (3, 3));

        let out = q.get_item(&SpreadsheetCoordinate::new("results", 2, 2)).unwrap();
        assert_eq!(out.value(), "100");
        assert!(out.is_erroneous());
    }

    #[test]
    fn test_huge_coordinate_is_rejected_not_panicking() {
        let json = r#"{ "errors": [],
            "outputs": [ { "x": 18446744073709551615, "y": 1, "worksheet": "s", "orig": "1", "err": "2" } ] }"#;
        let info = QuestionInfo::from_json(json).unwrap();
        assert!(matches!(Question::new(&info), Err(GraphError::InvalidCoordinate(_))));
    }

    #[test]
    fn test_padding_coordinate_is_rejected() {
        let json = r#"{ "errors": [ { "x": 0, "y": 0, "worksheet": "s", "orig": "1", "err": "2" } ],
            "outputs": [] }"#;
        let info = QuestionInfo::from_json(json).unwrap();
        assert_eq!(
            Question::new(&info).unwrap_err(),
            GraphError::InvalidCoordinate(SpreadsheetCoordinate::new("s", 0, 0))
        );
    }

    #[test]
    fn test_try_item_on_foreign_id() {
        let q = question();
        let out = q.outputs()[0];
        assert!(q.try_item(out).is_some());
        assert!(q.try_item(ItemId::from_raw(42)).is_none());
    }

    #[test]
    fn test_erroneous_worksheets_follow_status() {
        let mut q = question();
        assert_eq!(
            q.erroneous_worksheets(),
            vec![("results", true), ("inputs", true), ("notes", false)]
        );

        q.change_status(StatusMode::NoErrors, None).unwrap();
        assert!(q.erroneous_worksheets().iter().all(|(_, e)| !e));

        // Isolating leaves the other input in error and the output overridden.
        q.isolate(&SpreadsheetCoordinate::new("inputs", 1, 1)).unwrap();
        assert_eq!(
            q.erroneous_worksheets(),
            vec![("results", false), ("inputs", true), ("notes", false)]
        );
    }

    #[test]
    fn test_isolate_rejects_non_inputs() {
        let mut q = question();
        let notes = SpreadsheetCoordinate::new("notes", 1, 1);
        assert_eq!(q.isolate(&notes), Err(StatusError::NotRankable(notes.clone())));

        let padding = SpreadsheetCoordinate::new("inputs", 2, 2);
        assert_eq!(q.isolate(&padding), Err(StatusError::NotRankable(padding.clone())));
        assert_eq!(q.status(), GlobalStatus::AllErrors);
    }

    #[test]
    fn test_reconcile_through_question() {
        let q = question();
        let submission = RankingSubmission {
            ranked: vec![SpreadsheetCoordinate::new("inputs", 1, 2)],
            unimportant: vec![SpreadsheetCoordinate::new("inputs", 1, 1)],
        };
        assert!(q.reconcile_ranking(&submission).is_ok());
    }
}
