//! Cell identity for the dependency graph.
//!
//! A `SpreadsheetCoordinate` uniquely identifies a cell across all worksheets
//! of a question.
//!
//! # Axis convention
//!
//! `x` is the 1-based column and `y` the 1-based row. The grid stores raw
//! indices, so row 0 and column 0 of every worksheet are padding slots that
//! never hold an item.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Largest column a worksheet can hold (`XFD`).
pub const MAX_COLUMN: usize = 16_384;

/// Largest row a worksheet can hold.
pub const MAX_ROW: usize = 1_048_576;

/// Unique identifier for a cell in a question.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpreadsheetCoordinate {
    /// Column index (1-based)
    pub x: usize,
    /// Row index (1-based)
    pub y: usize,
    /// Free-text worksheet name
    pub worksheet: String,
}

impl SpreadsheetCoordinate {
    /// Create a new coordinate.
    #[inline]
    pub fn new(worksheet: impl Into<String>, x: usize, y: usize) -> Self {
        Self {
            x,
            y,
            worksheet: worksheet.into(),
        }
    }

    /// Row index into the worksheet grid.
    #[inline]
    pub fn row(&self) -> usize {
        self.y
    }

    /// Column index into a worksheet row.
    #[inline]
    pub fn col(&self) -> usize {
        self.x
    }

    /// True if the cell lies inside `A1:XFD1048576`. Column 0 and row 0 are
    /// padding and never valid.
    #[inline]
    pub fn is_in_bounds(&self) -> bool {
        (1..=MAX_COLUMN).contains(&self.x) && (1..=MAX_ROW).contains(&self.y)
    }

    /// A1-style label without the worksheet, e.g. `F7`.
    pub fn a1(&self) -> String {
        format!("{}{}", column_label(self.x), self.y)
    }
}

impl PartialOrd for SpreadsheetCoordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SpreadsheetCoordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.worksheet
            .cmp(&other.worksheet)
            .then(self.y.cmp(&other.y))
            .then(self.x.cmp(&other.x))
    }
}

impl fmt::Display for SpreadsheetCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}{}", self.worksheet, column_label(self.x), self.y)
    }
}

/// Error returned when a `sheet!A1` reference cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateParseError(pub String);

impl fmt::Display for CoordinateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid cell reference: {}", self.0)
    }
}

impl std::error::Error for CoordinateParseError {}

impl FromStr for SpreadsheetCoordinate {
    type Err = CoordinateParseError;

    /// Parse `worksheet!A1`. The worksheet part may itself contain `!`;
    /// the last one separates it from the cell.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CoordinateParseError(s.to_string());

        let (worksheet, cell) = s.rsplit_once('!').ok_or_else(err)?;
        if worksheet.is_empty() {
            return Err(err());
        }

        let split = cell
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(err)?;
        let (letters, digits) = cell.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(err());
        }

        let mut col = 0usize;
        for b in letters.to_ascii_uppercase().bytes() {
            let digit = (b - b'A') as usize + 1;
            col = col
                .checked_mul(26)
                .and_then(|c| c.checked_add(digit))
                .ok_or_else(err)?;
        }

        let row: usize = digits.parse().map_err(|_| err())?;
        if row == 0 {
            return Err(err());
        }

        Ok(Self::new(worksheet, col, row))
    }
}

/// Convert 0-based column index to Excel-style letter(s).
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Excel-style label for a 1-based column. Column 0 is padding and has no label.
pub fn column_label(x: usize) -> String {
    match x {
        0 => String::new(),
        x => col_to_letters(x - 1),
    }
}
