//! Industry classification strategies
//!
//! A strategy owns a catalog of document types with keyword lists plus a
//! set of hand-written rules. Classification tries the rules first (fixed
//! priority order, confidence 0.9) and falls back to keyword overlap.
//! Strategies never return errors: an internal failure degrades to an
//! `unknown` result with method `error`.

pub mod financial;
pub mod healthcare;

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{ClassificationMethod, ClassificationResult, Table};

/// Confidence assigned when a custom rule fires
pub const CUSTOM_RULE_CONFIDENCE: f64 = 0.9;

/// Supported industries, in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    Financial,
    Healthcare,
}

impl Industry {
    pub const ALL: [Industry; 2] = [Industry::Financial, Industry::Healthcare];

    pub fn as_str(&self) -> &'static str {
        match self {
            Industry::Financial => "financial",
            Industry::Healthcare => "healthcare",
        }
    }
}

impl std::fmt::Display for Industry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Industry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "financial" => Ok(Industry::Financial),
            "healthcare" => Ok(Industry::Healthcare),
            other => Err(Error::classification(format!("Unknown industry: {}", other))),
        }
    }
}

/// Extra evidence available to the custom rules
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleContext<'a> {
    /// Tables detected by the extractor
    pub tables: &'a [Table],
}

impl<'a> RuleContext<'a> {
    pub fn with_tables(tables: &'a [Table]) -> Self {
        Self { tables }
    }
}

/// Summary of a strategy's catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyInfo {
    pub industry: String,
    pub supported_types: Vec<String>,
    pub keyword_count: usize,
}

/// Ordered keyword catalog: document type and its keywords
pub type KeywordCatalog = &'static [(&'static str, &'static [&'static str])];

/// A classification strategy for one industry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndustryStrategy {
    Financial,
    Healthcare,
}

impl IndustryStrategy {
    pub fn for_industry(industry: Industry) -> Self {
        match industry {
            Industry::Financial => IndustryStrategy::Financial,
            Industry::Healthcare => IndustryStrategy::Healthcare,
        }
    }

    pub fn industry(&self) -> Industry {
        match self {
            IndustryStrategy::Financial => Industry::Financial,
            IndustryStrategy::Healthcare => Industry::Healthcare,
        }
    }

    pub fn industry_name(&self) -> &'static str {
        self.industry().as_str()
    }

    /// Document types in catalog order
    pub fn document_types(&self) -> &'static [&'static str] {
        match self {
            IndustryStrategy::Financial => financial::DOCUMENT_TYPES,
            IndustryStrategy::Healthcare => healthcare::DOCUMENT_TYPES,
        }
    }

    pub fn keywords(&self) -> KeywordCatalog {
        match self {
            IndustryStrategy::Financial => financial::KEYWORDS,
            IndustryStrategy::Healthcare => healthcare::KEYWORDS,
        }
    }

    /// Classify `text`, trying custom rules before keyword overlap
    pub fn classify(&self, text: &str, context: &RuleContext<'_>) -> ClassificationResult {
        match self.custom_rules(text, context) {
            Ok(Some(document_type)) => ClassificationResult::matched(
                document_type,
                CUSTOM_RULE_CONFIDENCE,
                ClassificationMethod::CustomRules,
            ),
            Ok(None) => self.keyword_match(text),
            Err(e) => {
                tracing::error!("Classification error in {} strategy: {}", self.industry_name(), e);
                ClassificationResult::failed(e)
            }
        }
    }

    /// Hand-written rules; `Ok(None)` when none fires
    pub fn custom_rules(
        &self,
        text: &str,
        context: &RuleContext<'_>,
    ) -> Result<Option<&'static str>, String> {
        match self {
            IndustryStrategy::Financial => financial::custom_rules(text, context),
            IndustryStrategy::Healthcare => healthcare::custom_rules(text, context),
        }
    }

    /// Keyword overlap: per type, found keywords / total keywords.
    ///
    /// The highest score wins and ties keep the earlier catalog entry.
    /// A best score of zero yields `unknown`.
    pub fn keyword_match(&self, text: &str) -> ClassificationResult {
        let lowered = text.to_lowercase();
        let mut best: Option<(&'static str, f64)> = None;

        for &(document_type, keywords) in self.keywords() {
            let score = keyword_score(&lowered, keywords);
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((document_type, score));
            }
        }

        match best {
            Some((document_type, score)) => {
                ClassificationResult::matched(document_type, score, ClassificationMethod::KeywordMatching)
            }
            None => ClassificationResult::unknown(ClassificationMethod::KeywordMatching),
        }
    }

    pub fn validate_document_type(&self, document_type: &str) -> bool {
        self.document_types().contains(&document_type)
    }

    pub fn strategy_info(&self) -> StrategyInfo {
        StrategyInfo {
            industry: self.industry_name().to_string(),
            supported_types: self.document_types().iter().map(|t| t.to_string()).collect(),
            keyword_count: self.keywords().iter().map(|(_, kw)| kw.len()).sum(),
        }
    }
}

/// Fraction of `keywords` found as substrings of already-lowercased text
pub fn keyword_score(lowered: &str, keywords: &[&str]) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let found = keywords
        .iter()
        .filter(|k| lowered.contains(&k.to_lowercase()))
        .count();
    found as f64 / keywords.len() as f64
}

/// A lazily compiled, case-insensitive pattern group
pub(crate) type PatternGroup = Lazy<Result<RegexSet, regex::Error>>;

pub(crate) fn compile(patterns: &[&str]) -> Result<RegexSet, regex::Error> {
    RegexSetBuilder::new(patterns).case_insensitive(true).build()
}

/// True when any pattern of the group matches
pub(crate) fn any_match(group: &PatternGroup, name: &str, text: &str) -> Result<bool, String> {
    match Lazy::force(group) {
        Ok(set) => Ok(set.is_match(text)),
        Err(e) => Err(format!("invalid {} pattern: {}", name, e)),
    }
}

/// True when some table's first row shares at least `min` cells with `vocabulary`
pub(crate) fn header_overlap(tables: &[Table], vocabulary: &[&str], min: usize) -> bool {
    tables.iter().any(|table| {
        let Some(first) = table.first() else {
            return false;
        };
        let mut headers: Vec<String> = first.iter().map(|c| c.trim().to_lowercase()).collect();
        headers.sort();
        headers.dedup();
        headers
            .iter()
            .filter(|h| vocabulary.contains(&h.as_str()))
            .count()
            >= min
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_industry_from_str() {
        assert_eq!("financial".parse::<Industry>().unwrap(), Industry::Financial);
        assert_eq!("healthcare".parse::<Industry>().unwrap(), Industry::Healthcare);
        let err = "retail".parse::<Industry>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown industry: retail");
    }

    #[test]
    fn test_keyword_score_fraction() {
        let keywords = ["salary", "wages", "net pay", "gross pay"];
        assert_eq!(keyword_score("salary and wages", &keywords), 0.5);
        assert_eq!(keyword_score("nothing here", &keywords), 0.0);
        assert_eq!(keyword_score("anything", &[]), 0.0);
    }

    #[test]
    fn test_keyword_match_reports_k_over_n() {
        // 3 of the 8 payroll keywords
        let result = IndustryStrategy::Financial.keyword_match("Gross Pay, NET PAY and overtime wages");
        assert_eq!(result.document_type, "payroll");
        assert!((result.confidence_score - 3.0 / 8.0).abs() < 1e-12);
        assert_eq!(result.method, ClassificationMethod::KeywordMatching);
    }

    #[test]
    fn test_keyword_tie_keeps_catalog_order() {
        // "deductions" belongs to both tax_return and payroll; tax_return comes first
        let result = IndustryStrategy::Financial.keyword_match("itemized deductions");
        assert_eq!(result.document_type, "tax_return");
        assert_eq!(result.confidence_score, 1.0 / 8.0);
    }

    #[test]
    fn test_no_keywords_is_unknown() {
        let context = RuleContext::default();
        for industry in Industry::ALL {
            let result = IndustryStrategy::for_industry(industry).classify("zzz qqq", &context);
            assert!(result.is_unknown());
            assert_eq!(result.confidence_score, 0.0);
            assert_eq!(result.method, ClassificationMethod::KeywordMatching);
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        let text = "Patient discharge summary, hospital course uneventful";
        let a = IndustryStrategy::Healthcare.classify(text, &RuleContext::default());
        let b = IndustryStrategy::Healthcare.classify(text, &RuleContext::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_strategy_info() {
        let info = IndustryStrategy::Financial.strategy_info();
        assert_eq!(info.industry, "financial");
        assert_eq!(info.supported_types.len(), 7);
        assert_eq!(info.keyword_count, 56);

        let info = IndustryStrategy::Healthcare.strategy_info();
        assert_eq!(info.supported_types.len(), 8);
        assert_eq!(info.keyword_count, 96);
    }

    #[test]
    fn test_validate_document_type() {
        assert!(IndustryStrategy::Financial.validate_document_type("invoice"));
        assert!(!IndustryStrategy::Financial.validate_document_type("lab_report"));
        assert!(IndustryStrategy::Healthcare.validate_document_type("lab_report"));
    }

    #[test]
    fn test_catalog_matches_document_types() {
        for industry in Industry::ALL {
            let strategy = IndustryStrategy::for_industry(industry);
            let catalog: Vec<&str> = strategy.keywords().iter().map(|(t, _)| *t).collect();
            assert_eq!(catalog, strategy.document_types());
        }
    }

    #[test]
    fn test_header_overlap_normalizes_cells() {
        let tables = vec![vec![
            vec![" Assets ".to_string(), "LIABILITIES".to_string(), "Notes".to_string()],
            vec!["100".to_string(), "50".to_string(), "".to_string()],
        ]];
        assert!(header_overlap(&tables, &["assets", "liabilities"], 2));
        assert!(!header_overlap(&tables, &["assets", "equity"], 2));
        assert!(!header_overlap(&[], &["assets"], 1));
    }
}
