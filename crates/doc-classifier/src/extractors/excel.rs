//! Spreadsheet extraction with calamine

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader};
use serde_json::json;

use super::text::{calculate_confidence, clean_text, detect_language};
use crate::error::ExtractionError;
use crate::types::{ExtractedContent, Metadata, Table};

const FORMAT: &str = "Excel";

/// Extractor for .xls and .xlsx workbooks
#[derive(Debug, Clone, Default)]
pub struct ExcelExtractor;

impl ExcelExtractor {
    pub const MIME_TYPES: &'static [&'static str] = &[super::mime::XLS, super::mime::XLSX];

    pub fn extract_content(&self, path: &Path) -> Result<ExtractedContent, ExtractionError> {
        let data = std::fs::read(path).map_err(|e| ExtractionError::read(path, e))?;
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(data))
            .map_err(|e| ExtractionError::parse(FORMAT, e.to_string()))?;

        let sheet_names = workbook.sheet_names().to_vec();
        let mut lines: Vec<String> = Vec::new();
        let mut tables: Vec<Table> = Vec::new();
        let mut headers: Vec<String> = Vec::new();
        let mut total_rows = 0u64;
        let mut total_columns = 0u64;

        for name in &sheet_names {
            let range = workbook
                .worksheet_range(name)
                .map_err(|e| ExtractionError::parse(FORMAT, format!("sheet '{}': {}", name, e)))?;

            if let Some((last_row, last_col)) = range.end() {
                total_rows += u64::from(last_row) + 1;
                total_columns += u64::from(last_col) + 1;
            }

            let rows: Vec<Vec<String>> = range
                .rows()
                .map(|row| row.iter().map(cell_to_string).collect())
                .collect();

            if let Some(first) = rows.first() {
                let header = first
                    .iter()
                    .filter(|c| !c.is_empty())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" | ");
                headers.push(header);
            }

            lines.push(format!("Sheet: {}", name));
            lines.extend(rows.iter().flatten().filter(|c| !c.is_empty()).cloned());

            tables.extend(detect_tables(&rows));
        }

        let mut metadata = Metadata::new();
        metadata.insert("sheet_count".to_string(), json!(sheet_names.len()));
        metadata.insert("table_count".to_string(), json!(tables.len()));
        metadata.insert("total_rows".to_string(), json!(total_rows));
        metadata.insert("total_columns".to_string(), json!(total_columns));

        let raw_text = lines.join("\n");
        let text = clean_text(&raw_text);
        tracing::debug!(
            sheets = sheet_names.len(),
            tables = tables.len(),
            rows = total_rows,
            "Workbook extracted"
        );

        Ok(ExtractedContent::new(text.clone())
            .with_metadata(metadata)
            .with_tables(tables)
            .with_headers(headers)
            .with_language(detect_language(&text))
            .with_confidence(calculate_confidence(&raw_text)))
    }

    pub fn validate_file(&self, path: &Path) -> bool {
        match std::fs::read(path) {
            Ok(data) => calamine::open_workbook_auto_from_rs(Cursor::new(data)).is_ok(),
            Err(_) => false,
        }
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        _ => String::new(),
    }
}

/// Maximal runs of non-blank rows, kept when at least 2 rows long
pub fn detect_tables(rows: &[Vec<String>]) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut current: Table = Vec::new();

    for row in rows {
        if row.iter().any(|c| !c.trim().is_empty()) {
            current.push(row.clone());
        } else if !current.is_empty() {
            flush(&mut tables, &mut current);
        }
    }
    flush(&mut tables, &mut current);
    tables
}

fn flush(tables: &mut Vec<Table>, current: &mut Table) {
    let table = std::mem::take(current);
    if table.len() >= 2 {
        tables.push(table);
    }
}
