//! Tesseract / pdftoppm command-line wrappers and TSV token handling

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::OcrConfig;
use crate::error::ExtractionError;
use crate::types::Table;

/// One recognized word from tesseract's TSV output
#[derive(Debug, Clone, PartialEq)]
pub struct OcrToken {
    pub block_num: u32,
    pub par_num: u32,
    pub line_num: u32,
    pub word_num: u32,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    /// -1 for structural rows without a recognized word
    pub conf: f64,
    pub text: String,
}

/// Text and per-token data for one image
#[derive(Debug, Clone, Default)]
pub struct OcrOutput {
    pub text: String,
    pub tokens: Vec<OcrToken>,
}

impl OcrOutput {
    /// Average of non-negative token confidences (0-100), 0.0 when none
    pub fn average_confidence(&self) -> f64 {
        let confs: Vec<f64> = self
            .tokens
            .iter()
            .map(|t| t.conf)
            .filter(|c| *c >= 0.0)
            .collect();
        if confs.is_empty() {
            return 0.0;
        }
        confs.iter().sum::<f64>() / confs.len() as f64
    }
}

/// Runs the external OCR tools
#[derive(Debug, Clone)]
pub struct OcrEngine {
    config: OcrConfig,
}

impl OcrEngine {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Recognize an image, producing plain text and TSV token data in one run
    pub fn recognize(&self, image: &Path, work_dir: &Path) -> Result<OcrOutput, ExtractionError> {
        let out_base = work_dir.join("ocr");
        let output = Command::new(&self.config.tesseract_cmd)
            .arg(image)
            .arg(&out_base)
            .args(["-l", self.config.language.as_str(), "txt", "tsv"])
            .output()
            .map_err(|e| ExtractionError::ocr(format!("failed to run {}: {}", self.config.tesseract_cmd, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::ocr(format!("tesseract error: {}", stderr.trim())));
        }

        let text = std::fs::read_to_string(out_base.with_extension("txt"))
            .map_err(|e| ExtractionError::ocr(format!("missing tesseract text output: {}", e)))?;
        let tsv = std::fs::read_to_string(out_base.with_extension("tsv"))
            .map_err(|e| ExtractionError::ocr(format!("missing tesseract TSV output: {}", e)))?;

        Ok(OcrOutput {
            text,
            tokens: parse_tsv(&tsv)?,
        })
    }

    /// Recognize an image, returning only its text
    pub fn recognize_text(&self, image: &Path) -> Result<String, ExtractionError> {
        let output = Command::new(&self.config.tesseract_cmd)
            .arg(image)
            .arg("stdout")
            .args(["-l", self.config.language.as_str()])
            .output()
            .map_err(|e| ExtractionError::ocr(format!("failed to run {}: {}", self.config.tesseract_cmd, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::ocr(format!("tesseract error: {}", stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Render every PDF page to a PNG inside `work_dir`, in page order
    pub fn render_pdf_pages(&self, pdf: &Path, work_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        let output = Command::new(&self.config.pdftoppm_cmd)
            .arg("-png")
            .arg("-r")
            .arg(self.config.render_dpi.to_string())
            .arg(pdf)
            .arg(work_dir.join("page"))
            .output()
            .map_err(|e| ExtractionError::ocr(format!("failed to run {}: {}", self.config.pdftoppm_cmd, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::ocr(format!("pdftoppm error: {}", stderr.trim())));
        }

        let mut pages: Vec<PathBuf> = std::fs::read_dir(work_dir)
            .map_err(|e| ExtractionError::ocr(format!("failed to list rendered pages: {}", e)))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        // pdftoppm zero-pads page numbers, so lexical order is page order
        pages.sort();

        if pages.is_empty() {
            return Err(ExtractionError::ocr("pdftoppm produced no images"));
        }
        Ok(pages)
    }
}

/// Parse tesseract's TSV output
pub fn parse_tsv(tsv: &str) -> Result<Vec<OcrToken>, ExtractionError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(tsv.as_bytes());

    let mut tokens = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ExtractionError::ocr(format!("malformed TSV: {}", e)))?;
        if record.len() < 11 {
            continue;
        }
        let int = |i: usize| record.get(i).and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(0);

        tokens.push(OcrToken {
            block_num: int(2) as u32,
            par_num: int(3) as u32,
            line_num: int(4) as u32,
            word_num: int(5) as u32,
            left: int(6) as i32,
            top: int(7) as i32,
            width: int(8) as i32,
            height: int(9) as i32,
            conf: record
                .get(10)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(-1.0),
            text: record.get(11).unwrap_or("").to_string(),
        });
    }
    Ok(tokens)
}

/// Group recognized words into tables.
///
/// A row is one text line, split into cells wherever the horizontal gap
/// between words exceeds the line height. Rows are flushed when the line
/// or block changes; a block's rows become a table when the block ends
/// with at least 2 rows, at least 2 of them having more than one cell.
pub fn group_tables(tokens: &[OcrToken]) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut current_table: Table = Vec::new();
    let mut current_row = RowBuilder::default();
    let mut last_line: Option<(u32, u32, u32)> = None;

    for token in tokens.iter().filter(|t| !t.text.trim().is_empty()) {
        let line = (token.block_num, token.par_num, token.line_num);
        if let Some(prev) = last_line {
            if prev != line {
                if let Some(row) = current_row.finish() {
                    current_table.push(row);
                }
                if prev.0 != token.block_num {
                    flush_table(&mut tables, &mut current_table);
                }
            }
        }
        current_row.push(token);
        last_line = Some(line);
    }

    if let Some(row) = current_row.finish() {
        current_table.push(row);
    }
    flush_table(&mut tables, &mut current_table);
    tables
}

fn flush_table(tables: &mut Vec<Table>, current: &mut Table) {
    let table = std::mem::take(current);
    let multi_cell_rows = table.iter().filter(|row| row.len() > 1).count();
    if table.len() >= 2 && multi_cell_rows >= 2 {
        tables.push(table);
    }
}

#[derive(Default)]
struct RowBuilder {
    cells: Vec<String>,
    cell: String,
    right_edge: Option<i32>,
}

impl RowBuilder {
    fn push(&mut self, token: &OcrToken) {
        let word = token.text.trim();
        if let Some(right) = self.right_edge {
            let gap = token.left - right;
            if gap > token.height.max(1) {
                self.cells.push(std::mem::take(&mut self.cell));
            } else {
                self.cell.push(' ');
            }
        }
        self.cell.push_str(word);
        self.right_edge = Some(token.left + token.width);
    }

    fn finish(&mut self) -> Option<Vec<String>> {
        if self.right_edge.take().is_none() {
            return None;
        }
        self.cells.push(std::mem::take(&mut self.cell));
        Some(std::mem::take(&mut self.cells))
    }
}
