//! Fixture builders shared by the integration tests

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use zip::write::SimpleFileOptions;

/// Single-page Letter PDF with one Courier text run per `(x, y, text)`
pub fn write_pdf(path: &Path, runs: &[(f32, f32, &str)]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = Vec::new();
    for &(x, y, text) in runs {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new("Td", vec![x.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// Bank statement with a letterhead and a page footer
pub fn bank_statement_pdf(dir: &Path) -> PathBuf {
    let path = dir.join("statement.pdf");
    write_pdf(
        &path,
        &[
            (72.0, 760.0, "ACME BANK - Statement date: 01/31/2024"),
            (72.0, 650.0, "Account Number: 1234567890"),
            (72.0, 630.0, "Statement Period: 01/01/2024 - 01/31/2024"),
            (72.0, 610.0, "Opening Balance 1200.00"),
            (72.0, 590.0, "Deposit 300.00"),
            (72.0, 570.0, "Withdrawal 150.00"),
            (72.0, 550.0, "Closing Balance 1350.00"),
            (72.0, 40.0, "Page 1 of 1"),
        ],
    );
    path
}

fn write_package(path: &Path, parts: &[(&str, String)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, body) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn docx_paragraph(text: &str) -> docx_rs::Paragraph {
    docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text(text))
}

/// .docx with body paragraphs, an optional table and an optional footer
pub fn write_docx(path: &Path, paragraphs: &[&str], table: &[&[&str]], footer: Option<&str>) {
    use docx_rs::{Docx, Footer, Table, TableCell, TableRow};

    let mut docx = Docx::new();
    for p in paragraphs {
        docx = docx.add_paragraph(docx_paragraph(p));
    }
    if !table.is_empty() {
        let rows = table
            .iter()
            .map(|row| {
                TableRow::new(
                    row.iter()
                        .map(|cell| TableCell::new().add_paragraph(docx_paragraph(cell)))
                        .collect(),
                )
            })
            .collect();
        docx = docx.add_table(Table::new(rows));
    }
    if let Some(footer) = footer {
        docx = docx.footer(Footer::new().add_paragraph(docx_paragraph(footer)));
    }

    let file = std::fs::File::create(path).unwrap();
    docx.build().pack(file).unwrap();
}

fn column_name(index: usize) -> String {
    let mut name = String::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        name.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    name
}

/// Minimal .xlsx with one sheet; numeric-looking cells are written as numbers
pub fn write_xlsx(path: &Path, sheet_name: &str, rows: &[&[&str]]) {
    const MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
    const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    let mut sheet_data = String::new();
    for (r, row) in rows.iter().enumerate() {
        sheet_data.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let reference = format!("{}{}", column_name(c), r + 1);
            if cell.parse::<f64>().is_ok() {
                sheet_data.push_str(&format!(r#"<c r="{reference}"><v>{cell}</v></c>"#));
            } else {
                sheet_data.push_str(&format!(
                    r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    escape(cell)
                ));
            }
        }
        sheet_data.push_str("</row>");
    }

    let parts = vec![
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#.to_string(),
        ),
        (
            "_rels/.rels",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
            ),
        ),
        (
            "xl/workbook.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="{MAIN}" xmlns:r="{REL}"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
                escape(sheet_name)
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL}/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#
            ),
        ),
        (
            "xl/worksheets/sheet1.xml",
            format!(r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="{MAIN}"><sheetData>{sheet_data}</sheetData></worksheet>"#),
        ),
    ];
    write_package(path, &parts);
}
