//! Layout-aware PDF content-stream parsing with lopdf
//!
//! Walks each page's text operators, tracking the text and graphics
//! matrices so every shown string gets a page position. Positioned runs
//! are then grouped into lines, header/footer bands and column grids.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::types::Table;

/// US Letter, used when no MediaBox is found in the page tree
const DEFAULT_MEDIA_BOX: MediaBox = MediaBox {
    llx: 0.0,
    lly: 0.0,
    urx: 612.0,
    ury: 792.0,
};

/// Approximate glyph advance as a fraction of the font size
const GLYPH_ADVANCE_EM: f32 = 0.5;

/// TJ adjustments (thousandths of an em) beyond this are treated as word spaces
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Page rectangle in default user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl MediaBox {
    pub fn height(&self) -> f32 {
        (self.ury - self.lly).abs()
    }
}

/// A string painted at a position on the page
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    /// Estimated horizontal extent
    pub width: f32,
    pub font_size: f32,
    pub text: String,
}

impl TextRun {
    fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Runs sharing a baseline, ordered left to right
#[derive(Debug, Clone)]
pub struct TextLine {
    pub y: f32,
    pub runs: Vec<TextRun>,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .map(|r| r.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Split the line into cells at gaps wider than the font size
    pub fn cells(&self) -> Vec<String> {
        let mut cells: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut prev: Option<&TextRun> = None;

        for run in &self.runs {
            let text = run.text.trim();
            if text.is_empty() {
                continue;
            }
            if let Some(p) = prev {
                let gap = run.x - p.right();
                if gap > p.font_size.max(run.font_size) {
                    cells.push(std::mem::take(&mut current));
                } else {
                    current.push(' ');
                }
            }
            current.push_str(text);
            prev = Some(run);
        }
        if prev.is_some() {
            cells.push(current);
        }
        cells
    }
}

/// Positioned text of one page
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub number: u32,
    pub media_box: MediaBox,
    pub runs: Vec<TextRun>,
}

impl PageLayout {
    /// Group runs into lines, top of the page first
    pub fn lines(&self) -> Vec<TextLine> {
        let mut runs: Vec<&TextRun> = self.runs.iter().collect();
        runs.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

        let mut lines: Vec<TextLine> = Vec::new();
        for run in runs {
            let tolerance = (run.font_size * 0.5).max(1.0);
            match lines.last_mut() {
                Some(line) if (line.y - run.y).abs() <= tolerance => line.runs.push(run.clone()),
                _ => lines.push(TextLine {
                    y: run.y,
                    runs: vec![run.clone()],
                }),
            }
        }
        for line in &mut lines {
            line.runs.sort_by(|a, b| a.x.total_cmp(&b.x));
        }
        lines
    }

    /// Reading-order text, one line per output line
    pub fn text(&self) -> String {
        self.lines()
            .iter()
            .map(TextLine::text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text of the lines inside the top band of the page
    pub fn header_text(&self, fraction: f64) -> String {
        let cutoff = self.media_box.lly + self.media_box.height() * (1.0 - fraction as f32);
        self.band_text(|y| y >= cutoff)
    }

    /// Text of the lines inside the bottom band of the page
    pub fn footer_text(&self, fraction: f64) -> String {
        let cutoff = self.media_box.lly + self.media_box.height() * fraction as f32;
        self.band_text(|y| y <= cutoff)
    }

    fn band_text(&self, in_band: impl Fn(f32) -> bool) -> String {
        self.lines()
            .iter()
            .filter(|l| in_band(l.y))
            .map(TextLine::text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Aligned column grids: consecutive lines with the same number of
    /// cells (at least 2), kept when at least 2 lines long
    pub fn tables(&self) -> Vec<Table> {
        let mut tables = Vec::new();
        let mut current: Table = Vec::new();

        for line in self.lines() {
            let cells = line.cells();
            let continues = cells.len() >= 2
                && current.first().map_or(true, |first| first.len() == cells.len());

            if !continues {
                flush_grid(&mut tables, &mut current);
            }
            if cells.len() >= 2 {
                current.push(cells);
            }
        }
        flush_grid(&mut tables, &mut current);
        tables
    }
}

fn flush_grid(tables: &mut Vec<Table>, current: &mut Table) {
    let grid = std::mem::take(current);
    if grid.len() >= 2 {
        tables.push(grid);
    }
}

/// Parse the positioned text of every page, in page order
pub fn parse_pages(doc: &Document) -> Vec<PageLayout> {
    doc.get_pages()
        .into_iter()
        .map(|(number, page_id)| {
            let media_box = media_box(doc, page_id);
            let runs = match doc.get_page_content(page_id) {
                Ok(data) => match Content::decode(&data) {
                    Ok(content) => interpret(&content),
                    Err(e) => {
                        tracing::debug!("Could not decode content of page {}: {}", number, e);
                        Vec::new()
                    }
                },
                Err(e) => {
                    tracing::debug!("Could not get content for page {}: {}", number, e);
                    Vec::new()
                }
            };
            PageLayout {
                number,
                media_box,
                runs,
            }
        })
        .collect()
}

/// Resolve the page's MediaBox, following `Parent` links for inheritance
pub fn media_box(doc: &Document, page_id: ObjectId) -> MediaBox {
    let mut current = Some(page_id);
    let mut depth = 0;

    while let Some(id) = current {
        depth += 1;
        if depth > 32 {
            break;
        }
        let Ok(dict) = doc.get_object(id).and_then(Object::as_dict) else {
            break;
        };
        if let Ok(obj) = dict.get(b"MediaBox") {
            if let Some(mb) = resolve(doc, obj).and_then(parse_rect) {
                return mb;
            }
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    DEFAULT_MEDIA_BOX
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj.as_reference() {
        Ok(id) => doc.get_object(id).ok(),
        Err(_) => Some(obj),
    }
}

fn parse_rect(obj: &Object) -> Option<MediaBox> {
    let values: Vec<f32> = obj.as_array().ok()?.iter().filter_map(number).collect();
    if values.len() != 4 {
        return None;
    }
    Some(MediaBox {
        llx: values[0].min(values[2]),
        lly: values[1].min(values[3]),
        urx: values[0].max(values[2]),
        ury: values[1].max(values[3]),
    })
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Decode a PDF string: UTF-16BE with BOM, otherwise single-byte Latin-1
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|b| *b as char).collect()
}

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn translation(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Text-object state of the content stream interpreter
struct TextState {
    ctm: Matrix,
    stack: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    font_size: f32,
    leading: f32,
    runs: Vec<TextRun>,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: IDENTITY,
            stack: Vec::new(),
            tm: IDENTITY,
            tlm: IDENTITY,
            font_size: 12.0,
            leading: 0.0,
            runs: Vec::new(),
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = multiply(&translation(tx, ty), &self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self.leading;
        self.move_line(0.0, -leading);
    }

    fn show(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        let trm = multiply(&self.tm, &self.ctm);
        let scale = (trm[2] * trm[2] + trm[3] * trm[3]).sqrt().max(f32::EPSILON);
        let size = self.font_size.abs() * scale;
        let advance = text.chars().count() as f32 * self.font_size.abs() * GLYPH_ADVANCE_EM;

        self.runs.push(TextRun {
            x: trm[4],
            y: trm[5],
            width: advance * (trm[0] * trm[0] + trm[1] * trm[1]).sqrt(),
            font_size: size,
            text,
        });
        self.tm = multiply(&translation(advance, 0.0), &self.tm);
    }
}

fn interpret(content: &Content) -> Vec<TextRun> {
    let mut state = TextState::new();

    for op in &content.operations {
        let nums: Vec<f32> = op.operands.iter().filter_map(number).collect();
        match op.operator.as_str() {
            "q" => state.stack.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.stack.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" if nums.len() == 6 => {
                let m = [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]];
                state.ctm = multiply(&m, &state.ctm);
            }
            "BT" => {
                state.tm = IDENTITY;
                state.tlm = IDENTITY;
            }
            "Tf" => {
                if let Some(size) = op.operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "TL" if !nums.is_empty() => state.leading = nums[0],
            "Td" if nums.len() == 2 => state.move_line(nums[0], nums[1]),
            "TD" if nums.len() == 2 => {
                state.leading = -nums[1];
                state.move_line(nums[0], nums[1]);
            }
            "Tm" if nums.len() == 6 => {
                state.tlm = [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]];
                state.tm = state.tlm;
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(text) = op.operands.first().and_then(string_operand) {
                    state.show(text);
                }
            }
            "'" => {
                state.next_line();
                if let Some(text) = op.operands.first().and_then(string_operand) {
                    state.show(text);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(text) = op.operands.get(2).and_then(string_operand) {
                    state.show(text);
                }
            }
            "TJ" => {
                if let Some(Ok(items)) = op.operands.first().map(Object::as_array) {
                    let mut text = String::new();
                    for item in items {
                        match item {
                            Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
                            other => {
                                if number(other).is_some_and(|n| n < -TJ_SPACE_THRESHOLD) {
                                    text.push(' ');
                                }
                            }
                        }
                    }
                    state.show(text);
                }
            }
            _ => {}
        }
    }

    state.runs
}

fn string_operand(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::StringFormat;

    fn text_op(x: f32, y: f32, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(text.as_bytes().to_vec(), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]
    }

    fn page(ops: Vec<Operation>) -> PageLayout {
        PageLayout {
            number: 1,
            media_box: DEFAULT_MEDIA_BOX,
            runs: interpret(&Content { operations: ops }),
        }
    }

    #[test]
    fn test_runs_are_positioned() {
        let layout = page(text_op(72.0, 700.0, "Hello"));
        assert_eq!(layout.runs.len(), 1);
        assert_eq!(layout.runs[0].x, 72.0);
        assert_eq!(layout.runs[0].y, 700.0);
        assert_eq!(layout.runs[0].text, "Hello");
    }

    #[test]
    fn test_lines_read_top_to_bottom() {
        let mut ops = text_op(72.0, 600.0, "second");
        ops.extend(text_op(72.0, 700.0, "first"));
        ops.extend(text_op(200.0, 700.0, "right"));
        assert_eq!(page(ops).text(), "first right\nsecond");
    }

    #[test]
    fn test_header_and_footer_bands() {
        let mut ops = text_op(72.0, 770.0, "ACME Bank");
        ops.extend(text_op(72.0, 400.0, "body"));
        ops.extend(text_op(72.0, 30.0, "Page 1 of 2"));
        let layout = page(ops);
        assert_eq!(layout.header_text(0.1), "ACME Bank");
        assert_eq!(layout.footer_text(0.1), "Page 1 of 2");
    }

    #[test]
    fn test_aligned_grid_becomes_table() {
        let mut ops = Vec::new();
        for (i, (a, b)) in [("Date", "Amount"), ("01/02", "100.00"), ("01/03", "25.50")]
            .iter()
            .enumerate()
        {
            let y = 600.0 - 14.0 * i as f32;
            ops.extend(text_op(72.0, y, a));
            ops.extend(text_op(300.0, y, b));
        }
        ops.extend(text_op(72.0, 500.0, "Thank you for banking with us"));

        let tables = page(ops).tables();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0][0], vec!["Date", "Amount"]);
        assert_eq!(tables[0].len(), 3);
    }

    #[test]
    fn test_tj_array_spacing() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 500.into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::String(b"Net".to_vec(), StringFormat::Literal),
                    Object::Integer(-300),
                    Object::String(b"Pay".to_vec(), StringFormat::Literal),
                ])],
            ),
            Operation::new("ET", vec![]),
        ];
        assert_eq!(page(ops).text(), "Net Pay");
    }

    #[test]
    fn test_decode_utf16_string() {
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42]), "AB");
        assert_eq!(decode_pdf_string(b"plain"), "plain");
    }
}
