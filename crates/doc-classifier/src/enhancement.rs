//! Structural features derived from extracted content
//!
//! These are merged into the document metadata next to the extractor's own
//! facts; they describe what the content looks like, not what it is.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::{ExtractedContent, Metadata, Table};

const FINANCIAL_CELL_WORDS: &[&str] = &["amount", "total", "balance", "price"];
const HEADER_ROW_WORDS: &[&str] = &["total", "sum", "amount", "date", "description"];

/// Counts of recognizable table shapes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePatterns {
    /// Tables with a row mentioning money words and at least one numeric cell
    pub financial_table: usize,
    /// Single-column tables
    pub list_table: usize,
    /// Two-column label/value tables
    pub form_table: usize,
    /// Tables whose first row looks like a header
    pub header_row_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPatterns {
    pub page_number: bool,
    pub logo_reference: bool,
    pub letterhead: bool,
    pub date_pattern: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterPatterns {
    pub page_number: bool,
    pub copyright: bool,
    pub contact_info: bool,
    pub disclaimer: bool,
}

/// Enhancement features for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementFeatures {
    pub content_length: usize,
    pub has_tables: bool,
    pub has_headers: bool,
    pub has_footers: bool,
    /// Present only when tables exist
    pub table_count: Option<usize>,
    pub table_patterns: Option<TablePatterns>,
    /// Present when headers or footers exist
    pub header_patterns: Option<HeaderPatterns>,
    pub footer_patterns: Option<FooterPatterns>,
}

impl EnhancementFeatures {
    pub fn from_content(content: &ExtractedContent) -> Self {
        let headers = content.headers.as_deref().unwrap_or(&[]);
        let footers = content.footers.as_deref().unwrap_or(&[]);
        let has_margins = !headers.is_empty() || !footers.is_empty();

        Self {
            content_length: content.text.chars().count(),
            has_tables: content.has_tables(),
            has_headers: !headers.is_empty(),
            has_footers: !footers.is_empty(),
            table_count: content.tables.as_ref().map(Vec::len),
            table_patterns: content.tables.as_deref().map(analyze_tables),
            header_patterns: has_margins.then(|| analyze_headers(headers)),
            footer_patterns: has_margins.then(|| analyze_footers(footers)),
        }
    }

    /// Flatten into metadata entries, omitting absent features
    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("content_length".to_string(), json!(self.content_length));
        metadata.insert("has_tables".to_string(), json!(self.has_tables));
        metadata.insert("has_headers".to_string(), json!(self.has_headers));
        metadata.insert("has_footers".to_string(), json!(self.has_footers));
        if let Some(count) = self.table_count {
            metadata.insert("table_count".to_string(), json!(count));
        }
        if let Some(patterns) = self.table_patterns {
            metadata.insert("table_patterns".to_string(), json!(patterns));
        }
        if let Some(patterns) = self.header_patterns {
            metadata.insert("header_patterns".to_string(), json!(patterns));
        }
        if let Some(patterns) = self.footer_patterns {
            metadata.insert("footer_patterns".to_string(), json!(patterns));
        }
        metadata
    }
}

pub fn analyze_tables(tables: &[Table]) -> TablePatterns {
    TablePatterns {
        financial_table: tables.iter().filter(|t| is_financial_table(t)).count(),
        list_table: tables.iter().filter(|t| first_row(t).len() == 1).count(),
        form_table: tables
            .iter()
            .filter(|t| {
                first_row(t).len() == 2
                    && t.iter().all(|row| !row.first().is_some_and(|c| is_digits(c)))
            })
            .count(),
        header_row_count: tables
            .iter()
            .filter(|t| {
                first_row(t).iter().any(|cell| {
                    let cell = cell.to_lowercase();
                    HEADER_ROW_WORDS.iter().any(|w| cell.contains(w))
                })
            })
            .count(),
    }
}

fn first_row(table: &Table) -> &[String] {
    table.first().map(Vec::as_slice).unwrap_or(&[])
}

fn is_financial_table(table: &Table) -> bool {
    let mentions_money = table.iter().any(|row| {
        row.iter().any(|cell| {
            let cell = cell.to_lowercase();
            FINANCIAL_CELL_WORDS.iter().any(|w| cell.contains(w))
        })
    });
    let has_number = table
        .iter()
        .flatten()
        .any(|cell| is_digits(&cell.replace('.', "")));
    mentions_money && has_number
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric()).any(|t| t == word)
}

pub fn analyze_headers(headers: &[String]) -> HeaderPatterns {
    let text = headers.join(" ").to_lowercase();
    HeaderPatterns {
        page_number: text.contains("page") || has_word(&text, "of"),
        logo_reference: ["logo", "brand", "trademark"].iter().any(|w| text.contains(w)),
        letterhead: ["confidential", "draft", "final"].iter().any(|w| text.contains(w)),
        date_pattern: ["date:", "dated:", "as of"].iter().any(|w| text.contains(w)),
    }
}

pub fn analyze_footers(footers: &[String]) -> FooterPatterns {
    let text = footers.join(" ").to_lowercase();
    FooterPatterns {
        page_number: text.contains("page") || has_word(&text, "of"),
        copyright: ["copyright", "©", "all rights reserved"].iter().any(|w| text.contains(w)),
        contact_info: ["tel:", "phone:", "email:", "www.", "http"].iter().any(|w| text.contains(w)),
        disclaimer: ["confidential", "disclaimer", "privacy"].iter().any(|w| text.contains(w)),
    }
}
