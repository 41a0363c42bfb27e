use std::fmt;

use crate::cell_id::SpreadsheetCoordinate;

/// Question data could not be read.
#[derive(Debug)]
pub enum ModelError {
    /// JSON parse / deserialization error.
    Parse(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "question parse error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Graph construction and lookup failures.
///
/// Construction errors abandon the whole graph; lookup errors leave it intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// No item has ever been placed on this worksheet.
    UnknownWorksheet(String),
    /// Row lies outside the worksheet.
    InvalidRow { worksheet: String, row: usize },
    /// Column lies outside the row.
    InvalidColumn { worksheet: String, row: usize, col: usize },
    /// Slot exists but only as padding.
    EmptyCell(SpreadsheetCoordinate),
    /// An input lists a dependent that resolves to another input.
    DependentNotOutput {
        input: SpreadsheetCoordinate,
        dependent: SpreadsheetCoordinate,
    },
    /// An input lists a dependent that was never declared as an output.
    DanglingDependency {
        input: SpreadsheetCoordinate,
        dependent: SpreadsheetCoordinate,
    },
    /// Two records share one cell.
    DuplicateCell(SpreadsheetCoordinate),
    /// A record or dependent lies outside `A1:XFD1048576`.
    InvalidCoordinate(SpreadsheetCoordinate),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownWorksheet(ws) => write!(f, "invalid worksheet: {ws}"),
            Self::InvalidRow { worksheet, row } => write!(f, "invalid row: {worksheet}, {row}"),
            Self::InvalidColumn { worksheet, row, col } => {
                write!(f, "invalid column: {worksheet}, {row}, {col}")
            }
            Self::EmptyCell(coord) => write!(f, "invalid coordinate: {coord} is empty"),
            Self::DependentNotOutput { input, dependent } => {
                write!(f, "input {input}: dependent {dependent} is not an output")
            }
            Self::DanglingDependency { input, dependent } => {
                write!(f, "input {input}: dependent {dependent} was never declared as an output")
            }
            Self::DuplicateCell(coord) => write!(f, "cell {coord} is declared more than once"),
            Self::InvalidCoordinate(coord) => write!(
                f,
                "cell {}!(x={}, y={}) is outside A1:XFD1048576",
                coord.worksheet, coord.x, coord.y
            ),
        }
    }
}

impl std::error::Error for GraphError {}

/// Rejected display-status transitions. State is unchanged when one of these
/// is returned, except `TransitionLoop` which stops after the last complete
/// transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// Status name is not one of the known modes.
    UnknownStatus(String),
    /// Isolate mode was requested without choosing an input.
    MissingItem,
    /// The chosen id was not issued by this graph.
    UnknownItem(u32),
    /// The chosen item is not a rankable input of this graph.
    NotRankable(SpreadsheetCoordinate),
    /// Chained follow-up transitions exceeded the configured bound.
    TransitionLoop { limit: usize },
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStatus(s) => write!(f, "invalid status: {s}"),
            Self::MissingItem => write!(f, "all-but-one-error status requires an input"),
            Self::UnknownItem(raw) => write!(f, "item #{raw} does not belong to this question"),
            Self::NotRankable(coord) => write!(f, "{coord} is not a rankable input"),
            Self::TransitionLoop { limit } => {
                write!(f, "status transitions kept re-triggering; stopped after {limit} follow-ups")
            }
        }
    }
}

impl std::error::Error for StatusError {}

/// A submitted ranking does not account for every rankable input exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RankingError {
    /// Rankable inputs placed in neither bucket.
    pub missing: Vec<SpreadsheetCoordinate>,
    /// Entries that are not rankable inputs of the question.
    pub unknown: Vec<SpreadsheetCoordinate>,
    /// Entries that appear more than once across both buckets.
    pub duplicated: Vec<SpreadsheetCoordinate>,
}

impl RankingError {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unknown.is_empty() && self.duplicated.is_empty()
    }
}

impl fmt::Display for RankingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(cells: &[SpreadsheetCoordinate]) -> String {
            cells.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ")
        }

        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("unranked: {}", join(&self.missing)));
        }
        if !self.unknown.is_empty() {
            parts.push(format!("not rankable: {}", join(&self.unknown)));
        }
        if !self.duplicated.is_empty() {
            parts.push(format!("listed twice: {}", join(&self.duplicated)));
        }
        write!(f, "incomplete ranking ({})", parts.join("; "))
    }
}

impl std::error::Error for RankingError {}
