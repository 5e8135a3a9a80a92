//! Tabular document export (PDF and Excel).
//!
//! Handlers load rows into an [`ExportTable`]; the renderers here turn it into
//! the bytes of a downloadable file.

pub mod excel;
pub mod pdf;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("PDF rendering failed: {0}")]
    Pdf(String),
    #[error("Excel rendering failed: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),
    #[error("unknown export {kind} '{value}'")]
    Unknown { kind: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Number(number) => write!(f, "{:.2}", number),
        }
    }
}

/// A titled grid of cells, one header per column.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub title: String,
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ExportTable {
    pub fn new(title: impl Into<String>, sheet_name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            sheet_name: sheet_name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Students,
    Courses,
    Payments,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Students => "students",
            ExportKind::Courses => "courses",
            ExportKind::Payments => "payments",
        }
    }
}

impl FromStr for ExportKind {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "students" => Ok(ExportKind::Students),
            "courses" => Ok(ExportKind::Courses),
            "payments" => Ok(ExportKind::Payments),
            other => Err(ExportError::Unknown {
                kind: "entity",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Excel,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xlsx",
        }
    }

    pub fn render(&self, table: &ExportTable) -> Result<Vec<u8>, ExportError> {
        match self {
            ExportFormat::Pdf => pdf::render(table),
            ExportFormat::Excel => excel::render(table),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(ExportFormat::Pdf),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            other => Err(ExportError::Unknown {
                kind: "format",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_table() -> ExportTable {
    let mut table = ExportTable::new("Test University - Payments", "Payments", &["Student", "Amount", "Method"]);
    table.push_row(vec![Cell::text("CSE-2024-0001"), Cell::Number(500.0), Cell::text("cash")]);
    table.push_row(vec![Cell::text("CSE-2024-0002"), Cell::Number(125.5), Cell::text("bankTransfer")]);
    table
}
