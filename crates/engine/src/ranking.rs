//! Ranking read-back.
//!
//! A worker sorts the rankable inputs into a ranked list and an "unimportant"
//! bucket. Before the result is handed on, it is reconciled by coordinate
//! against the question's rankable inputs.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::cell_id::SpreadsheetCoordinate;
use crate::dep_graph::DepGraph;
use crate::error::{ModelError, RankingError};
use crate::item::Item;

/// What a worker submitted, most important first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingSubmission {
    #[serde(default)]
    pub ranked: Vec<SpreadsheetCoordinate>,
    #[serde(default)]
    pub unimportant: Vec<SpreadsheetCoordinate>,
}

impl RankingSubmission {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Accepted ranking. Bucket order is preserved as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingResult {
    pub ranked: Vec<SpreadsheetCoordinate>,
    pub unimportant: Vec<SpreadsheetCoordinate>,
}

impl RankingResult {
    pub fn len(&self) -> usize {
        self.ranked.len() + self.unimportant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Check that every rankable input appears exactly once across both buckets
/// and that nothing else does. All problems are reported together.
pub fn reconcile(graph: &DepGraph, submission: &RankingSubmission) -> Result<RankingResult, RankingError> {
    let rankable: FxHashSet<&SpreadsheetCoordinate> = graph
        .inputs()
        .iter()
        .map(|&id| graph.item(id).coordinate())
        .collect();

    let mut error = RankingError::default();
    let mut seen: FxHashSet<&SpreadsheetCoordinate> = FxHashSet::default();

    for coord in submission.ranked.iter().chain(&submission.unimportant) {
        if !rankable.contains(coord) {
            if !error.unknown.contains(coord) {
                error.unknown.push(coord.clone());
            }
        } else if !seen.insert(coord) && !error.duplicated.contains(coord) {
            error.duplicated.push(coord.clone());
        }
    }

    for &id in graph.inputs() {
        let coord = graph.item(id).coordinate();
        if !seen.contains(coord) {
            error.missing.push(coord.clone());
        }
    }

    if !error.is_empty() {
        log::debug!("rejected ranking: {error}");
        return Err(error);
    }

    Ok(RankingResult {
        ranked: submission.ranked.clone(),
        unimportant: submission.unimportant.clone(),
    })
}
