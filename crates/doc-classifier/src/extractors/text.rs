//! Text normalization and quality heuristics shared by the extractors

/// Normalize extracted text.
///
/// Strips control characters (code point < 32, except newline and tab),
/// then collapses every whitespace run into a single space and trims.
/// Applying it twice yields the same string as applying it once.
pub fn clean_text(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| (*c as u32) >= 32 || *c == '\n' || *c == '\t')
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fraction of printable characters in `text`, capped at 1.0; empty text is 0.0
pub fn calculate_confidence(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let printable = text.chars().filter(|c| is_printable(*c)).count();
    (printable as f64 / total as f64).min(1.0)
}

/// Ratio of alphanumeric characters to all characters (0.0 for empty text)
pub fn alphanumeric_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let alnum = text.chars().filter(|c| c.is_alphanumeric()).count();
    alnum as f64 / total as f64
}

/// True when a text layer is too poor to use and a stronger extraction tier is needed
pub fn needs_ocr(text: &str, threshold: f64) -> bool {
    text.trim().is_empty() || alphanumeric_ratio(text) < threshold
}

fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !c.is_control() && !c.is_whitespace()
}

/// Stop words per language, checked as whole lowercase tokens
const STOP_WORDS: &[(&str, &[&str])] = &[
    ("en", &["the", "and", "of", "to", "is", "in", "for", "with", "this", "that", "on", "are", "be", "by"]),
    ("es", &["el", "la", "de", "que", "y", "los", "las", "por", "con", "para", "una", "del", "es", "se"]),
    ("fr", &["le", "la", "les", "des", "et", "est", "une", "pour", "dans", "que", "du", "au", "sur", "pas"]),
    ("de", &["der", "die", "und", "das", "ist", "nicht", "mit", "den", "von", "zu", "ein", "eine", "auf", "für"]),
    ("it", &["il", "di", "che", "e", "la", "per", "non", "una", "sono", "del", "della", "con", "gli", "nel"]),
    ("pt", &["o", "de", "que", "e", "do", "da", "em", "um", "para", "com", "não", "uma", "os", "no"]),
];

/// Minimum number of word tokens before a language guess is attempted
const MIN_LANGUAGE_TOKENS: usize = 5;

/// Best-effort language detection by stop-word frequency.
///
/// Returns an ISO 639-1 code, or `None` for short or unrecognized text.
pub fn detect_language(text: &str) -> Option<String> {
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();

    if tokens.len() < MIN_LANGUAGE_TOKENS {
        return None;
    }

    let mut best: Option<(&str, usize)> = None;
    for (code, words) in STOP_WORDS {
        let hits = tokens.iter().filter(|t| words.contains(&t.as_str())).count();
        if hits == 0 {
            continue;
        }
        match best {
            Some((_, best_hits)) if best_hits >= hits => {}
            _ => best = Some((code, hits)),
        }
    }

    best.map(|(code, _)| code.to_string())
}
