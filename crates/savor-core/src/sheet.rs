//! Row extraction for uploaded spreadsheet files
//!
//! Turns raw file bytes into a uniform grid of [`Cell`] values so the
//! classifier and parser never care which format the upload arrived in.
//! CSV is read with the `csv` crate; XLSX/XLS via `calamine` (first
//! worksheet only - multi-sheet reconciliation is out of scope).

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use tracing::debug;

use crate::cell::Cell;
use crate::error::{Error, Result};

/// Supported upload formats, derived from the declared filename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    /// Detect the format from a filename extension.
    ///
    /// Returns None for anything other than `.csv`, `.xlsx`, `.xls`.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".csv") {
            Some(Self::Csv)
        } else if lower.ends_with(".xlsx") {
            Some(Self::Xlsx)
        } else if lower.ends_with(".xls") {
            Some(Self::Xls)
        } else {
            None
        }
    }
}

/// Read the rows of an uploaded file into cell grids.
///
/// The filename only supplies the format hint; the bytes are the source
/// of truth. Returns an error when the bytes are not readable as the
/// declared format.
pub fn read_rows(filename: &str, bytes: &[u8]) -> Result<Vec<Vec<Cell>>> {
    let format = FileFormat::from_filename(filename)
        .ok_or_else(|| Error::UnsupportedFormat(filename.to_string()))?;

    let rows = match format {
        FileFormat::Csv => read_csv_rows(bytes)?,
        FileFormat::Xlsx | FileFormat::Xls => read_workbook_rows(bytes)?,
    };

    debug!("Extracted {} rows from {}", rows.len(), filename);
    Ok(rows)
}

/// Read CSV bytes as a headerless grid; header detection happens later
fn read_csv_rows(bytes: &[u8]) -> Result<Vec<Vec<Cell>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Read the first worksheet of an XLSX/XLS workbook
fn read_workbook_rows(bytes: &[u8]) -> Result<Vec<Vec<Cell>>> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Parse("Workbook contains no worksheets".into()))??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect())
}

/// Map a calamine cell onto our normalized cell shape.
///
/// Native date cells are truncated to the calendar date; time-of-day and
/// timezone are intentionally discarded.
fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Cell::Date(naive.date()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(FileFormat::from_filename("sales.csv"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_filename("SALES.XLSX"), Some(FileFormat::Xlsx));
        assert_eq!(FileFormat::from_filename("labor.xls"), Some(FileFormat::Xls));
        assert_eq!(FileFormat::from_filename("report.pdf"), None);
        assert_eq!(FileFormat::from_filename("noextension"), None);
    }

    #[test]
    fn test_read_csv_rows() {
        let csv = "Date,Category,Net Sales\n2024-11-01,Food,500\n2024-11-02,,300\n";
        let rows = read_rows("report.csv", csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][1], Cell::Text("Category".to_string()));
        assert_eq!(rows[1][2], Cell::Text("500".to_string()));
        // Blank fields come through as Empty, not empty strings
        assert_eq!(rows[2][1], Cell::Empty);
    }

    #[test]
    fn test_read_csv_ragged_rows() {
        let csv = "a,b,c\nonly-one\n";
        let rows = read_rows("x.csv", csv.as_bytes()).unwrap();
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1].len(), 1);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = read_rows("report.pdf", b"whatever").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_convert_cell() {
        assert_eq!(convert_cell(&Data::Empty), Cell::Empty);
        assert_eq!(convert_cell(&Data::Int(42)), Cell::Number(42.0));
        assert_eq!(
            convert_cell(&Data::String("Food".into())),
            Cell::Text("Food".to_string())
        );

        // Excel serial 45597 is 2024-11-01
        let dt = calamine::ExcelDateTime::new(
            45597.0,
            calamine::ExcelDateTimeType::DateTime,
            false,
        );
        assert_eq!(
            convert_cell(&Data::DateTime(dt)),
            Cell::Date(NaiveDate::from_ymd_opt(2024, 11, 1).unwrap())
        );
    }
}
