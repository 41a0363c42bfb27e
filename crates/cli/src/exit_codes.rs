//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Domain    | Description                                   |
//! |------|-----------|-----------------------------------------------|
//! | 0    | Universal | Success                                       |
//! | 1    | Universal | General error (unspecified)                   |
//! | 2    | Universal | CLI usage error (bad args, missing file)      |
//! | 3    | rank      | Ranking does not cover every rankable input   |
//! | 4    | question  | Question or ranking file is not valid JSON    |
//! | 5    | question  | Question data does not form a valid graph     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing files, cells that cannot be isolated.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Question data (3-5)
// =============================================================================

/// Submitted ranking is incomplete, lists unknown cells, or repeats a cell.
pub const EXIT_RANKING_INCOMPLETE: u8 = 3;

/// Question or ranking JSON could not be parsed.
pub const EXIT_PARSE: u8 = 4;

/// Dangling dependency, duplicate cell or dependent that is not an output.
pub const EXIT_GRAPH: u8 = 5;

// =============================================================================
// Error mapping
// =============================================================================

use checkcell_engine::error::{GraphError, ModelError, StatusError};

pub fn model_exit_code(err: &ModelError) -> u8 {
    match err {
        ModelError::Parse(_) => EXIT_PARSE,
        ModelError::Io(_) => EXIT_USAGE,
    }
}

pub fn graph_exit_code(err: &GraphError) -> u8 {
    match err {
        GraphError::DependentNotOutput { .. }
        | GraphError::DanglingDependency { .. }
        | GraphError::DuplicateCell(_)
        | GraphError::InvalidCoordinate(_) => EXIT_GRAPH,
        // Lookups only fail on user-supplied references.
        GraphError::UnknownWorksheet(_)
        | GraphError::InvalidRow { .. }
        | GraphError::InvalidColumn { .. }
        | GraphError::EmptyCell(_) => EXIT_USAGE,
    }
}

pub fn status_exit_code(err: &StatusError) -> u8 {
    match err {
        StatusError::TransitionLoop { .. } => EXIT_ERROR,
        StatusError::UnknownStatus(_)
        | StatusError::MissingItem
        | StatusError::UnknownItem(_)
        | StatusError::NotRankable(_) => EXIT_USAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkcell_engine::cell_id::SpreadsheetCoordinate;

    #[test]
    fn construction_errors_map_to_graph_code() {
        let c = SpreadsheetCoordinate::new("sheet1", 1, 1);
        assert_eq!(graph_exit_code(&GraphError::DuplicateCell(c.clone())), EXIT_GRAPH);
        assert_eq!(
            graph_exit_code(&GraphError::InvalidCoordinate(SpreadsheetCoordinate::new("sheet1", 0, 1))),
            EXIT_GRAPH
        );
        assert_eq!(graph_exit_code(&GraphError::EmptyCell(c)), EXIT_USAGE);
    }

    #[test]
    fn codes_are_distinct() {
        let codes = [EXIT_SUCCESS, EXIT_ERROR, EXIT_USAGE, EXIT_RANKING_INCOMPLETE, EXIT_PARSE, EXIT_GRAPH];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
