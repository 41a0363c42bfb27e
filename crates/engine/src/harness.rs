//! Test harness for question display status with event tracking.
//!
//! This module provides `QuestionHarness`, a wrapper around `Question` that:
//! - Records every change published on the graph-wide channel
//! - Counts events per status transition
//! - Resolves `sheet!A1` references to item ids
//!
//! Use this harness to test display invariants without a renderer.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cell_id::SpreadsheetCoordinate;
use crate::error::StatusError;
use crate::events::EventCollector;
use crate::item::{Item, ItemId};
use crate::model::QuestionInfo;
use crate::question::Question;
use crate::status::StatusMode;

/// Result of one status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// Changes published during the transition.
    pub changes: usize,
    pub error: Option<StatusError>,
}

/// Test harness wrapping Question with event tracking.
pub struct QuestionHarness {
    question: Question,
    events: Rc<RefCell<EventCollector>>,
}

impl QuestionHarness {
    /// Build a question from JSON and start recording after the initial status.
    pub fn from_json(json: &str) -> Self {
        let info = QuestionInfo::from_json(json).expect("fixture parses");
        Self::with_question(Question::new(&info).expect("fixture builds"))
    }

    pub fn with_question(mut question: Question) -> Self {
        let events = Rc::new(RefCell::new(EventCollector::new()));
        let sink = events.clone();
        question.on_any_changed(move |c| sink.borrow_mut().push(c.clone()));
        Self { question, events }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn question_mut(&mut self) -> &mut Question {
        &mut self.question
    }

    /// Get collected events.
    pub fn events(&self) -> std::cell::Ref<'_, EventCollector> {
        self.events.borrow()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    /// Item id for a `sheet!A1` reference. Panics if nothing lives there.
    pub fn id(&self, reference: &str) -> ItemId {
        let coord: SpreadsheetCoordinate = reference.parse().expect("valid reference");
        self.question
            .graph()
            .item_id(&coord)
            .unwrap_or_else(|e| panic!("no item at {reference}: {e}"))
    }

    /// Displayed value at a `sheet!A1` reference.
    pub fn value(&self, reference: &str) -> String {
        self.question.item(self.id(reference)).value().to_string()
    }

    pub fn is_erroneous(&self, reference: &str) -> bool {
        self.question.item(self.id(reference)).is_erroneous()
    }

    /// Apply a transition, counting the changes it published.
    pub fn change_status(&mut self, mode: StatusMode, item: Option<&str>) -> TransitionResult {
        let item = item.map(|r| self.id(r));
        let before = self.events.borrow().len();
        let error = self.question.change_status(mode, item).err();
        TransitionResult {
            changes: self.events.borrow().len() - before,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::GlobalStatus;

    const QUESTION: &str = r#"{
        "errors": [
            { "x": 1, "y": 1, "worksheet": "sheet1", "orig": "12.343", "err": "123.43",
              "outputs": [ { "x": 6, "y": 7, "worksheet": "sheet1", "noerr": "62.11" } ] },
            { "x": 1, "y": 2, "worksheet": "sheet1", "orig": "10.0", "err": "1.0",
              "outputs": [ { "x": 6, "y": 7, "worksheet": "sheet1", "noerr": "0.0" } ] }
        ],
        "outputs": [
            { "x": 6, "y": 7, "worksheet": "sheet1", "orig": "0.0", "err": "100" }
        ]
    }"#;

    #[test]
    fn test_repeating_a_status_publishes_nothing() {
        let mut h = QuestionHarness::from_json(QUESTION);

        let result = h.change_status(StatusMode::AllErrors, None);
        assert_eq!(result, TransitionResult { changes: 0, error: None });

        let result = h.change_status(StatusMode::NoErrors, None);
        assert_eq!(result.changes, 3);
        let result = h.change_status(StatusMode::NoErrors, None);
        assert_eq!(result.changes, 0);
    }

    #[test]
    fn test_isolate_scenario() {
        let mut h = QuestionHarness::from_json(QUESTION);

        let result = h.change_status(StatusMode::AllButOneError, Some("sheet1!A1"));
        assert!(result.error.is_none());
        // A1 back to original, F7 to its override.
        assert_eq!(result.changes, 2);

        assert_eq!(h.value("sheet1!A1"), "12.343");
        assert_eq!(h.value("sheet1!A2"), "1.0");
        assert_eq!(h.value("sheet1!F7"), "62.11");
        assert!(!h.is_erroneous("sheet1!F7"));

        let f7 = h.id("sheet1!F7");
        assert_eq!(h.events().last_value(f7), Some("62.11"));
    }

    #[test]
    fn test_switching_isolated_input() {
        let mut h = QuestionHarness::from_json(QUESTION);
        h.change_status(StatusMode::AllButOneError, Some("sheet1!A1"));
        h.clear_events();

        h.change_status(StatusMode::AllButOneError, Some("sheet1!A2"));
        assert_eq!(h.question().status(), GlobalStatus::AllButOneError(h.id("sheet1!A2")));

        let f7 = h.id("sheet1!F7");
        // Reset to the error value, then B's override.
        let values: Vec<_> = h.events().for_item(f7).iter().map(|c| c.value.clone()).collect();
        assert_eq!(values, ["100", "0.0"]);
    }

    #[test]
    fn test_rejected_transition_publishes_nothing() {
        let mut h = QuestionHarness::from_json(QUESTION);
        let result = h.change_status(StatusMode::AllButOneError, Some("sheet1!F7"));
        assert_eq!(result.changes, 0);
        assert!(matches!(result.error, Some(StatusError::NotRankable(_))));
    }
}
