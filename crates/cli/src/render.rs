//! Text and JSON views of a question.
//!
//! Text output draws each worksheet as a fixed-width table with Excel column
//! letters and row numbers. Cells showing an error value are suffixed with
//! `*`, outputs showing an isolated override with `~`. JSON output carries
//! the same information, one object per occupied cell.

use serde::Serialize;

use checkcell_engine::cell_id::{column_label, SpreadsheetCoordinate};
use checkcell_engine::dep_graph::WorksheetView;
use checkcell_engine::error::GraphError;
use checkcell_engine::item::{CellItem, Item, ItemKind, OutputStatus};
use checkcell_engine::question::Question;
use checkcell_engine::status::StatusMode;

use crate::util::{fit, Align};

pub const ERROR_MARK: char = '*';
pub const OVERRIDE_MARK: char = '~';

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Only this worksheet.
    pub sheet: Option<String>,
    /// Outputs show their formula instead of a value.
    pub show_formulas: bool,
    pub show_context_inputs: bool,
    /// Cell width in display columns.
    pub column_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sheet: None,
            show_formulas: false,
            show_context_inputs: true,
            column_width: 12,
        }
    }
}

// ============================================================================
// JSON reports
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GridReport {
    pub status: StatusMode,
    /// Isolated input, in isolate mode.
    pub isolated: Option<String>,
    pub width: usize,
    pub height: usize,
    pub worksheets: Vec<SheetReport>,
}

#[derive(Debug, Serialize)]
pub struct SheetReport {
    pub name: String,
    /// Any cell on this worksheet is showing an error.
    pub erroneous: bool,
    pub cells: Vec<CellReport>,
}

#[derive(Debug, Serialize)]
pub struct CellReport {
    #[serde(rename = "ref")]
    pub reference: String,
    pub x: usize,
    pub y: usize,
    pub kind: ItemKind,
    pub value: String,
    pub erroneous: bool,
    pub rankable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OutputStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InputReport {
    #[serde(rename = "ref")]
    pub reference: String,
    pub orig: String,
    pub err: String,
    pub showing_error: bool,
    pub dependents: Vec<DependentReport>,
}

#[derive(Debug, Serialize)]
pub struct DependentReport {
    #[serde(rename = "ref")]
    pub reference: String,
    pub noerr: String,
}

/// Worksheets selected by `--sheet`, in tab order.
fn selected_sheets<'a>(
    question: &Question,
    views: &'a [WorksheetView],
    sheet: Option<&str>,
) -> Result<Vec<&'a WorksheetView>, GraphError> {
    match sheet {
        None => Ok(views.iter().collect()),
        Some(name) => {
            question.graph().worksheet(name)?;
            Ok(views.iter().filter(|v| v.name == name).collect())
        }
    }
}

fn is_hidden(question: &Question, item: &CellItem, opts: &RenderOptions) -> bool {
    !opts.show_context_inputs
        && item.kind() == ItemKind::Input
        && !question.graph().is_rankable(item.id())
}

fn isolated_reference(question: &Question) -> Option<String> {
    question
        .status()
        .isolated()
        .map(|id| question.item(id).coordinate().to_string())
}

pub fn grid_report(question: &Question, opts: &RenderOptions) -> Result<GridReport, GraphError> {
    let view = question.get_data();
    let flags = question.erroneous_worksheets();

    let mut worksheets = Vec::new();
    for sheet in selected_sheets(question, &view.worksheets, opts.sheet.as_deref())? {
        let erroneous = flags
            .iter()
            .any(|&(name, flagged)| name == sheet.name && flagged);

        let cells = sheet
            .rows
            .iter()
            .flatten()
            .filter_map(|slot| slot.map(|id| question.item(id)))
            .filter(|item| !is_hidden(question, item, opts))
            .map(|item| {
                let coord = item.coordinate();
                let output = item.as_output();
                CellReport {
                    reference: coord.to_string(),
                    x: coord.x,
                    y: coord.y,
                    kind: item.kind(),
                    value: item.value().to_string(),
                    erroneous: item.is_erroneous(),
                    rankable: question.graph().is_rankable(item.id()),
                    status: output.map(|o| o.status()),
                    formula: output
                        .map(|o| o.formula())
                        .filter(|f| !f.is_empty())
                        .map(str::to_string),
                }
            })
            .collect();

        worksheets.push(SheetReport {
            name: sheet.name.clone(),
            erroneous,
            cells,
        });
    }

    Ok(GridReport {
        status: question.status().mode(),
        isolated: isolated_reference(question),
        width: view.width,
        height: view.height,
        worksheets,
    })
}

pub fn input_reports(question: &Question) -> Vec<InputReport> {
    question
        .inputs()
        .iter()
        .filter_map(|&id| question.item(id).as_input())
        .map(|input| InputReport {
            reference: input.coordinate().to_string(),
            orig: input.original().to_string(),
            err: input.error().to_string(),
            showing_error: input.is_erroneous(),
            dependents: input
                .dependents()
                .iter()
                .map(|dep| DependentReport {
                    reference: question.item(dep.output).coordinate().to_string(),
                    noerr: dep.noerr.clone(),
                })
                .collect(),
        })
        .collect()
}

// ============================================================================
// Text
// ============================================================================

fn cell_text(item: &CellItem, opts: &RenderOptions) -> String {
    if let Some(output) = item.as_output() {
        if opts.show_formulas && !output.formula().is_empty() {
            return output.formula().to_string();
        }
        return match output.status() {
            OutputStatus::Error => format!("{}{ERROR_MARK}", item.value()),
            OutputStatus::Custom => format!("{}{OVERRIDE_MARK}", item.value()),
            OutputStatus::Original => item.value().to_string(),
        };
    }
    if item.is_erroneous() {
        format!("{}{ERROR_MARK}", item.value())
    } else {
        item.value().to_string()
    }
}

pub fn status_line(question: &Question) -> String {
    match isolated_reference(question) {
        Some(reference) => format!("status: {} ({reference})", question.status().mode()),
        None => format!("status: {}", question.status().mode()),
    }
}

/// Render the selected worksheets as text tables.
pub fn render_text(question: &Question, opts: &RenderOptions) -> Result<String, GraphError> {
    let view = question.get_data();
    let flags = question.erroneous_worksheets();
    let cw = opts.column_width.max(1);
    // Row 0 and column 0 are padding; number rows from 1.
    let gutter = view.height.saturating_sub(1).to_string().len().max(3);

    let mut out = String::new();
    out.push_str(&status_line(question));
    out.push('\n');

    for sheet in selected_sheets(question, &view.worksheets, opts.sheet.as_deref())? {
        let flagged = flags.iter().any(|&(name, f)| name == sheet.name && f);
        out.push('\n');
        out.push_str(&format!("[{}]", sheet.name));
        if flagged {
            out.push_str(&format!(" {ERROR_MARK}"));
        }
        out.push('\n');

        let mut header = " ".repeat(gutter);
        for col in 1..view.width {
            header.push(' ');
            header.push_str(&fit(&column_label(col), cw, Align::Left));
        }
        out.push_str(header.trim_end());
        out.push('\n');

        for (row, slots) in sheet.rows.iter().enumerate().skip(1) {
            let mut line = fit(&row.to_string(), gutter, Align::Right);
            for slot in slots.iter().skip(1) {
                let text = slot
                    .map(|id| question.item(id))
                    .filter(|item| !is_hidden(question, item, opts))
                    .map(|item| cell_text(item, opts))
                    .unwrap_or_default();
                line.push(' ');
                line.push_str(&fit(&text, cw, Align::Left));
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str(&format!("{ERROR_MARK} error value shown   {OVERRIDE_MARK} value with one error suppressed\n"));
    Ok(out)
}

/// Rankable inputs with their dependents, one block per input.
pub fn render_inputs(question: &Question) -> String {
    let mut out = String::new();
    for report in input_reports(question) {
        out.push_str(&format!("{}  {} -> {}\n", report.reference, report.orig, report.err));
        for dep in &report.dependents {
            out.push_str(&format!("    {}  {}\n", dep.reference, dep.noerr));
        }
    }
    out
}

/// Parse a `sheet!A1` reference given on the command line.
pub fn parse_reference(reference: &str) -> Result<SpreadsheetCoordinate, String> {
    reference.parse().map_err(|e| format!("{e}"))
}
