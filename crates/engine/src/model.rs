//! Question data contract.
//!
//! Mirrors the JSON blob produced by the question loader. Records are
//! read-only inputs to graph construction; nothing here is mutated after
//! deserialization.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::cell_id::SpreadsheetCoordinate;
use crate::error::ModelError;

/// One question: the flagged inputs and the outputs they feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionInfo {
    pub errors: Vec<InputRecord>,
    pub outputs: Vec<OutputRecord>,
}

impl QuestionInfo {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A formula-result cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub x: usize,
    pub y: usize,
    pub worksheet: String,
    pub orig: String,
    pub err: String,
    /// Display-only source formula. Older question files omit it.
    #[serde(default)]
    pub formula: String,
}

impl OutputRecord {
    pub fn coordinate(&self) -> SpreadsheetCoordinate {
        SpreadsheetCoordinate::new(self.worksheet.clone(), self.x, self.y)
    }
}

/// A cell flagged as a candidate source of error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    pub x: usize,
    pub y: usize,
    pub worksheet: String,
    pub orig: String,
    pub err: String,
    /// Outputs this input affects.
    #[serde(default)]
    pub outputs: Vec<DependentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
}

impl InputRecord {
    pub fn coordinate(&self) -> SpreadsheetCoordinate {
        SpreadsheetCoordinate::new(self.worksheet.clone(), self.x, self.y)
    }
}

/// An output affected by an input, with the value that output shows when
/// only this input's error is suppressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependentRecord {
    pub x: usize,
    pub y: usize,
    pub worksheet: String,
    pub noerr: String,
}

impl DependentRecord {
    pub fn coordinate(&self) -> SpreadsheetCoordinate {
        SpreadsheetCoordinate::new(self.worksheet.clone(), self.x, self.y)
    }
}

/// Presentational metadata for context cells. Passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    #[serde(rename = "font-face")]
    pub font_face: String,
    #[serde(rename = "font-size")]
    pub font_size: f64,
}
