//! End-to-end classification over generated fixtures

mod common;

use std::sync::Arc;

use doc_classifier::extractors::PdfExtractor;
use doc_classifier::{
    ClassifierConfig, Document, DocumentClassifier, Error, ExtractorRegistry, InMemoryMetrics,
};
use serde_json::json;
use sha2::{Digest, Sha256};

fn classifier() -> DocumentClassifier {
    DocumentClassifier::new(ClassifierConfig::default())
}

#[test]
fn test_bank_statement_pdf_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::bank_statement_pdf(dir.path());

    let document = classifier().classify(&path, Some("financial"), true).unwrap();

    assert_eq!(document.document_type(), "bank_statement");
    assert_eq!(document.confidence_score(), 0.9);
    assert_eq!(document.classification_method(), Some("custom_rules"));
    assert_eq!(document.mime_type(), "application/pdf");
    assert_eq!(document.industry(), Some("financial"));

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(document.file_size(), bytes.len() as u64);
    assert_eq!(document.file_hash(), hex::encode(Sha256::digest(&bytes)));

    let text = document.extracted_text().unwrap();
    assert!(text.contains("Account Number"));

    let metadata = document.metadata();
    assert_eq!(metadata["page_count"], json!(1));
    assert_eq!(metadata["has_headers"], json!(true));
    assert_eq!(metadata["has_footers"], json!(true));
    assert_eq!(metadata["header_patterns"]["date_pattern"], json!(true));
    assert_eq!(metadata["footer_patterns"]["page_number"], json!(true));
}

#[test]
fn test_extracted_text_only_when_requested() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::bank_statement_pdf(dir.path());
    let document = classifier().classify(&path, None, false).unwrap();
    assert!(document.extracted_text().is_none());
    // No hint: every strategy runs, financial wins
    assert_eq!(document.document_type(), "bank_statement");
    assert_eq!(document.industry(), None);
}

#[test]
fn test_classification_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::bank_statement_pdf(dir.path());
    let classifier = classifier();

    let a = classifier.classify(&path, None, true).unwrap();
    let b = classifier.classify(&path, None, true).unwrap();
    assert_eq!(a.document_type(), b.document_type());
    assert_eq!(a.confidence_score(), b.confidence_score());
    assert_eq!(a.file_hash(), b.file_hash());
    assert_eq!(a.extracted_text(), b.extracted_text());
    assert_eq!(a.metadata(), b.metadata());
}

#[test]
fn test_document_record_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::bank_statement_pdf(dir.path());
    let document = classifier().classify(&path, Some("financial"), true).unwrap();

    let record = document.to_record().unwrap();
    assert_eq!(record["document_type"], json!("bank_statement"));
    assert!(record["processed_at"].is_string());

    let restored = Document::from_record(record).unwrap();
    assert_eq!(restored, document);
}

#[test]
fn test_docx_invoice() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invoice.docx");
    common::write_docx(
        &path,
        &["Invoice Number: INV-1001", "Bill To: Globex Corp", "Payment Terms: Net 30"],
        &[&["Description", "Amount"], &["Consulting", "1500.00"]],
        Some("www.acme.test"),
    );

    let document = classifier().classify(&path, Some("financial"), false).unwrap();
    assert_eq!(document.document_type(), "invoice");
    assert_eq!(document.confidence_score(), 0.9);
    assert_eq!(
        document.mime_type(),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );

    let metadata = document.metadata();
    assert_eq!(metadata["paragraph_count"], json!(3));
    assert_eq!(metadata["table_count"], json!(1));
    assert_eq!(metadata["table_patterns"]["financial_table"], json!(1));
    assert_eq!(metadata["footer_patterns"]["contact_info"], json!(true));
    assert_eq!(document.tables().unwrap()[0][0], vec!["Description", "Amount"]);
    assert_eq!(document.footers().unwrap(), ["www.acme.test"]);
}

#[test]
fn test_table_text_rescoring_in_word_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("summary.docx");
    common::write_docx(
        &path,
        &["Quarterly summary"],
        &[&["Name", "Salary"], &["gross pay", "net pay"]],
        None,
    );

    let document = classifier().classify(&path, Some("financial"), false).unwrap();
    assert_eq!(document.document_type(), "payroll");
    assert_eq!(document.classification_method(), Some("table_analysis"));
    assert!((document.confidence_score() - 3.0 / 8.0).abs() < 1e-12);
}

#[test]
fn test_xlsx_payroll_from_table_headers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("payroll.xlsx");
    common::write_xlsx(
        &path,
        "Payroll",
        &[
            &["Employee", "Hours", "Overtime", "Net Pay"],
            &["Ann", "40", "2", "900"],
            &["Bob", "38", "0", "850"],
        ],
    );

    let document = classifier().classify(&path, Some("financial"), true).unwrap();
    assert_eq!(document.document_type(), "payroll");
    assert_eq!(document.classification_method(), Some("custom_rules"));

    let metadata = document.metadata();
    assert_eq!(metadata["sheet_count"], json!(1));
    assert_eq!(metadata["total_rows"], json!(3));
    assert_eq!(metadata["total_columns"], json!(4));
    assert!(document.extracted_text().unwrap().starts_with("Sheet: Payroll"));
}

#[test]
fn test_unknown_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lorem.docx");
    common::write_docx(&path, &["lorem ipsum dolor"], &[], None);

    let document = classifier().classify(&path, None, false).unwrap();
    assert_eq!(document.document_type(), "unknown");
    assert_eq!(document.confidence_score(), 0.0);
    assert_eq!(document.classification_method(), Some("none"));
}

#[test]
fn test_unsupported_formats() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = classifier();

    let text = dir.path().join("notes.txt");
    std::fs::write(&text, "just some notes").unwrap();
    let err = classifier.classify(&text, None, false).unwrap_err();
    assert!(matches!(err, Error::Classification(_)));
    assert!(err.to_string().contains("text/plain"));

    let gif = dir.path().join("anim.gif");
    std::fs::write(&gif, b"GIF89a\x01\x00\x01\x00\x00\x00\x00;").unwrap();
    let err = classifier.classify(&gif, None, false).unwrap_err();
    assert!(err.to_string().contains("image/gif"));

    let registry = ExtractorRegistry::with_defaults(ClassifierConfig::default());
    assert!(matches!(
        registry.get_extractor(&gif),
        Err(Error::UnsupportedFormat(mime)) if mime == "image/gif"
    ));
}

#[test]
fn test_legacy_doc_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.doc");
    let mut data = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    data.extend(vec![0u8; 64]);
    data.extend("WordDocument".encode_utf16().flat_map(|u| u.to_le_bytes()));
    std::fs::write(&path, &data).unwrap();

    let err = classifier().classify(&path, None, false).unwrap_err();
    assert!(err.to_string().contains("legacy binary .doc"));
}

#[test]
fn test_metrics_are_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::bank_statement_pdf(dir.path());
    let metrics = Arc::new(InMemoryMetrics::new());
    let classifier = DocumentClassifier::with_metrics(ClassifierConfig::default(), metrics.clone());

    classifier.classify(&path, None, false).unwrap();
    classifier.classify(&path, Some("financial"), false).unwrap();
    classifier.classify(dir.path().join("missing.pdf"), None, false).unwrap_err();

    assert_eq!(metrics.processed_count("unknown", "bank_statement"), 1);
    assert_eq!(metrics.processed_count("financial", "bank_statement"), 1);
    assert_eq!(metrics.confidences("financial", "bank_statement"), vec![0.9]);
    assert_eq!(metrics.error_count(), 1);
}

#[test]
fn test_unknown_industry_does_not_extract() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::bank_statement_pdf(dir.path());
    let metrics = Arc::new(InMemoryMetrics::new());
    let classifier = DocumentClassifier::with_metrics(ClassifierConfig::default(), metrics.clone());

    let err = classifier.classify(&path, Some("retail"), false).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error classifying document: Unknown industry: retail"
    );
    assert_eq!(metrics.total_processed(), 0);
}

#[test]
fn test_pdf_confidence_reflects_control_characters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noisy.pdf");
    common::write_pdf(
        &path,
        &[
            (72.0, 700.0, "\u{1}\u{2}\u{3}\u{4}\u{5}\u{6}\u{7}\u{8}"),
            (72.0, 680.0, "Statement period"),
        ],
    );

    let content = PdfExtractor::new(&ClassifierConfig::default())
        .extract_content(&path)
        .unwrap();
    assert!(content.text.contains("Statement period"));
    assert!(content.text.chars().all(|c| !c.is_control()));
    assert!(content.confidence > 0.0 && content.confidence < 1.0);
}
