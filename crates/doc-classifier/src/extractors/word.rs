//! Word extraction for .docx packages
//!
//! The body (paragraphs and tables) is read with `docx-rs`. Header and footer
//! parts are scanned directly from the package so every part is seen, whether
//! or not a section references it.

use std::io::{Cursor, Read};
use std::path::Path;

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, Run, RunChild, Table as DocxTable, TableCellContent,
    TableChild, TableRowChild,
};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::json;

use super::text::{calculate_confidence, clean_text, detect_language};
use crate::error::ExtractionError;
use crate::types::{ExtractedContent, Metadata, Table};

const FORMAT: &str = "Word";

const OLE_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];

/// Extractor for Word documents
#[derive(Debug, Clone, Default)]
pub struct WordExtractor;

impl WordExtractor {
    pub const MIME_TYPES: &'static [&'static str] = &[super::mime::DOC, super::mime::DOCX];

    pub fn extract_content(&self, path: &Path) -> Result<ExtractedContent, ExtractionError> {
        let data = std::fs::read(path).map_err(|e| ExtractionError::read(path, e))?;
        let body = read_body(&data)?;

        let mut archive = open_package(&data)?;
        let sections = scan_part(&read_part(&mut archive, "word/document.xml")?)?
            .sections
            .max(1);

        let mut headers = Vec::new();
        let mut footers = Vec::new();
        for name in part_names(archive.file_names(), "word/header") {
            headers.extend(scan_part(&read_part(&mut archive, &name)?)?.paragraphs);
        }
        for name in part_names(archive.file_names(), "word/footer") {
            footers.extend(scan_part(&read_part(&mut archive, &name)?)?.paragraphs);
        }

        let raw_text = body.paragraphs.join("\n");
        let word_count = raw_text.split_whitespace().count();

        let mut metadata = Metadata::new();
        metadata.insert("page_count".to_string(), json!(sections));
        metadata.insert("paragraph_count".to_string(), json!(body.paragraphs.len()));
        metadata.insert("table_count".to_string(), json!(body.tables.len()));
        metadata.insert("word_count".to_string(), json!(word_count));
        metadata.insert("has_headers".to_string(), json!(!headers.is_empty()));
        metadata.insert("has_footers".to_string(), json!(!footers.is_empty()));

        let text = clean_text(&raw_text);
        tracing::debug!(
            paragraphs = body.paragraphs.len(),
            tables = body.tables.len(),
            words = word_count,
            "Word document extracted"
        );

        Ok(ExtractedContent::new(text.clone())
            .with_metadata(metadata)
            .with_tables(body.tables)
            .with_headers(headers)
            .with_footers(footers)
            .with_language(detect_language(&text))
            .with_confidence(calculate_confidence(&raw_text)))
    }

    pub fn validate_file(&self, path: &Path) -> bool {
        match std::fs::read(path) {
            Ok(data) => docx_rs::read_docx(&data).is_ok(),
            Err(_) => false,
        }
    }
}

fn legacy_error() -> ExtractionError {
    ExtractionError::parse(FORMAT, "legacy binary .doc files are not supported, save as .docx")
}

/// Body paragraphs and top-level tables of the main document part
#[derive(Debug, Default)]
struct Body {
    /// Paragraphs outside tables, including empty ones
    paragraphs: Vec<String>,
    tables: Vec<Table>,
}

fn read_body(data: &[u8]) -> Result<Body, ExtractionError> {
    if data.starts_with(&OLE_MAGIC) {
        return Err(legacy_error());
    }
    let docx = docx_rs::read_docx(data)
        .map_err(|e| ExtractionError::parse(FORMAT, format!("not a valid document: {}", e)))?;

    let mut body = Body::default();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => body.paragraphs.push(paragraph_text(p)),
            DocumentChild::Table(t) => body.tables.push(table_rows(t)),
            _ => {}
        }
    }
    Ok(body)
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut out = String::new();
    push_children(&paragraph.children, &mut out);
    out
}

fn push_children(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(run, out),
            ParagraphChild::Hyperlink(link) => push_children(&link.children, out),
            _ => {}
        }
    }
}

fn push_run(run: &Run, out: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

/// Row-major cell text; nested tables are folded into their enclosing cell
fn table_rows(table: &DocxTable) -> Table {
    let mut rows = Vec::new();
    for child in &table.rows {
        if let TableChild::TableRow(row) = child {
            let mut cells = Vec::new();
            for cell in &row.cells {
                if let TableRowChild::TableCell(cell) = cell {
                    let mut lines = Vec::new();
                    cell_lines(&cell.children, &mut lines);
                    cells.push(lines.join("\n").trim().to_string());
                }
            }
            rows.push(cells);
        }
    }
    rows
}

fn cell_lines(children: &[TableCellContent], lines: &mut Vec<String>) {
    for content in children {
        match content {
            TableCellContent::Paragraph(p) => lines.push(paragraph_text(p)),
            TableCellContent::Table(nested) => {
                for row in table_rows(nested) {
                    lines.extend(row);
                }
            }
            _ => {}
        }
    }
}

fn open_package(data: &[u8]) -> Result<zip::ZipArchive<Cursor<&[u8]>>, ExtractionError> {
    if data.starts_with(&OLE_MAGIC) {
        return Err(legacy_error());
    }
    zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| ExtractionError::parse(FORMAT, format!("not a valid package: {}", e)))
}

fn read_part(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<String, ExtractionError> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| ExtractionError::parse(FORMAT, format!("missing part {}: {}", name, e)))?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| ExtractionError::parse(FORMAT, format!("unreadable part {}: {}", name, e)))?;
    Ok(xml)
}

/// Part names under `prefix` (`word/header1.xml`, ...) ordered by their number
fn part_names<'a>(names: impl Iterator<Item = &'a str>, prefix: &str) -> Vec<String> {
    let mut parts: Vec<(u32, String)> = names
        .filter_map(|name| {
            let index = name.strip_prefix(prefix)?.strip_suffix(".xml")?;
            let number = if index.is_empty() {
                0
            } else {
                index.parse().ok()?
            };
            Some((number, name.to_string()))
        })
        .collect();
    parts.sort();
    parts.into_iter().map(|(_, name)| name).collect()
}

/// Paragraph texts and section breaks found in one WordprocessingML part
#[derive(Debug, Default)]
struct PartScan {
    paragraphs: Vec<String>,
    sections: usize,
}

fn scan_part(xml: &str) -> Result<PartScan, ExtractionError> {
    let mut reader = Reader::from_str(xml);

    let mut scan = PartScan::default();
    let mut paragraph = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => paragraph.clear(),
                b"t" => in_text = true,
                b"sectPr" => scan.sections += 1,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" => scan.paragraphs.push(String::new()),
                b"tab" => paragraph.push('\t'),
                b"br" | b"cr" => paragraph.push('\n'),
                b"sectPr" => scan.sections += 1,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    let text = e
                        .unescape()
                        .map_err(|e| ExtractionError::parse(FORMAT, format!("bad text: {}", e)))?;
                    paragraph.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => scan.paragraphs.push(std::mem::take(&mut paragraph)),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::parse(
                    FORMAT,
                    format!("XML error at position {}: {}", reader.buffer_position(), e),
                ))
            }
            _ => {}
        }
    }

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Footer, Table as NewTable, TableCell, TableRow};

    fn para(text: &str) -> Paragraph {
        Paragraph::new().add_run(Run::new().add_text(text))
    }

    fn cell(text: &str) -> TableCell {
        TableCell::new().add_paragraph(para(text))
    }

    fn pack(docx: Docx) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_read_body() {
        let data = pack(
            Docx::new()
                .add_paragraph(para("Invoice Number: 42"))
                .add_paragraph(Paragraph::new())
                .add_table(NewTable::new(vec![
                    TableRow::new(vec![cell("Description"), cell("Amount")]),
                    TableRow::new(vec![cell("Consulting & advice"), cell("100.00")]),
                ]))
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Bill").add_tab().add_text("To"))),
        );

        let body = read_body(&data).unwrap();
        assert_eq!(body.paragraphs, vec!["Invoice Number: 42", "", "Bill\tTo"]);
        assert_eq!(
            body.tables,
            vec![vec![
                vec!["Description", "Amount"],
                vec!["Consulting & advice", "100.00"]
            ]]
        );
    }

    #[test]
    fn test_extract_reads_footer_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("letter.docx");
        let data = pack(
            Docx::new()
                .add_paragraph(para("Dear customer"))
                .footer(Footer::new().add_paragraph(para("www.acme.test"))),
        );
        std::fs::write(&path, data).unwrap();

        let content = WordExtractor.extract_content(&path).unwrap();
        assert_eq!(content.text, "Dear customer");
        assert_eq!(content.footers, Some(vec!["www.acme.test".to_string()]));
        assert_eq!(content.metadata["page_count"], json!(1));
        assert!(WordExtractor.validate_file(&path));
    }

    #[test]
    fn test_confidence_scores_raw_paragraph_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.docx");
        std::fs::write(&path, pack(Docx::new().add_paragraph(para("Memo")).add_paragraph(para("Body"))))
            .unwrap();

        let content = WordExtractor.extract_content(&path).unwrap();
        // "Memo\nBody": the paragraph break is not printable
        assert!((content.confidence - 8.0 / 9.0).abs() < 1e-12);
        assert_eq!(content.text, "Memo Body");
    }

    #[test]
    fn test_part_names_follow_part_number() {
        let names = [
            "word/header10.xml",
            "word/header2.xml",
            "word/footer1.xml",
            "word/header1.xml",
            "word/_rels/header1.xml.rels",
            "word/headerless.xml",
        ];
        assert_eq!(
            part_names(names.into_iter(), "word/header"),
            vec!["word/header1.xml", "word/header2.xml", "word/header10.xml"]
        );
    }

    #[test]
    fn test_scan_part_counts_sections() {
        let xml = r#"<w:document xmlns:w="w"><w:body>
            <w:p><w:pPr><w:sectPr/></w:pPr><w:r><w:t>One</w:t></w:r></w:p>
            <w:p/>
            <w:sectPr><w:pgSz/></w:sectPr>
        </w:body></w:document>"#;
        let scan = scan_part(xml).unwrap();
        assert_eq!(scan.sections, 2);
        assert_eq!(scan.paragraphs, vec!["One", ""]);
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = scan_part("<w:document><w:body><w:p></w:body>").unwrap_err();
        assert!(matches!(err, ExtractionError::Parse { format: "Word", .. }));
    }

    #[test]
    fn test_legacy_doc_is_rejected() {
        let mut data = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        data.extend(vec![0u8; 512]);
        let err = read_body(&data).unwrap_err();
        assert!(err.to_string().contains("legacy"));
    }
}
