//! Text-level authenticity heuristic.
//!
//! Confidence starts at 100 and each failed check subtracts a fixed
//! penalty. Checks look at layout, dates, completeness, placeholder text,
//! repetition, currency notation and scan noise. None of them reads the
//! claimant's form: this is about whether the document itself looks real.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::generic::find_dates;
use crate::models::document::{AuthenticityAssessment, StructuredFields};
use crate::pipeline::Findings;
use crate::pipeline_config::AuthenticityPenalties;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:lorem\s+ipsum|sample|specimen|placeholder|test\s+document|for\s+testing|dummy|john\s+doe|jane\s+doe|x{4,}|tbd)\b|\[insert|<insert",
    )
    .expect("Invalid placeholder regex pattern")
});

static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[$€£¥]|\b(?:USD|EUR|GBP|JPY|CAD)\b").expect("Invalid currency regex pattern")
});

/// Lines need this many letters before their case style counts.
const MIN_STYLED_LETTERS: usize = 12;
/// Words shorter than this are ignored by the repetition check.
const MIN_REPEATED_WORD_LEN: usize = 4;
/// Repetition needs at least this many words of text to judge.
const MIN_WORDS_FOR_REPETITION: usize = 20;
/// One word making up more than this share of all words is suspicious.
const MAX_WORD_SHARE: f64 = 0.15;
const MAX_SYMBOL_RATIO: f64 = 0.30;
const MAX_FRAGMENT_RATIO: f64 = 0.30;
/// Scan-noise ratios need at least this many tokens.
const MIN_TOKENS_FOR_SCAN_CHECK: usize = 10;

/// Why the layout looks inconsistent, if it does.
fn formatting_issue(text: &str, max_indent_levels: usize) -> Option<String> {
    let mut caps_lines = 0usize;
    let mut mixed_lines = 0usize;
    let mut indents = BTreeSet::new();

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let indent: usize = line
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(|c| if c == '\t' { 4 } else { 1 })
            .sum();
        indents.insert(indent);

        let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.len() < MIN_STYLED_LETTERS {
            continue;
        }
        if letters.iter().all(|c| !c.is_lowercase()) {
            caps_lines += 1;
        } else {
            mixed_lines += 1;
        }
    }

    // Headings in caps are normal; flag when neither style dominates
    let styled = caps_lines + mixed_lines;
    if caps_lines >= 2 && mixed_lines >= 2 && caps_lines.min(mixed_lines) * 3 >= styled {
        return Some(format!(
            "Inconsistent text formatting ({caps_lines} all-caps and {mixed_lines} mixed-case lines)"
        ));
    }
    if indents.len() > max_indent_levels {
        return Some(format!(
            "Inconsistent text formatting ({} distinct indentation levels)",
            indents.len()
        ));
    }
    None
}

/// `expires` is the document's own expiration date, which may lie ahead.
fn date_findings(
    text: &str,
    expires: Option<NaiveDate>,
    as_of: NaiveDate,
    cfg: &AuthenticityPenalties,
) -> Findings {
    let mut findings = Findings::new();
    let dates = find_dates(text);
    let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) else {
        return findings;
    };

    if let Some(future) = dates
        .iter()
        .filter(|d| **d > as_of && Some(**d) != expires)
        .max()
    {
        findings.flag(format!("Document contains a future date ({future})"), cfg.future_dates);
    }
    if max.year() - min.year() > cfg.wide_date_span_years {
        findings.flag(
            format!("Document dates span an implausible range ({} to {})", min, max),
            cfg.wide_date_span,
        );
    }
    let centuries: BTreeSet<i32> = dates.iter().map(|d| d.year().div_euclid(100)).collect();
    if centuries.len() > 1 {
        findings.flag("Document mixes dates from different centuries", cfg.mixed_eras);
    }
    findings
}

/// Most frequent longer word and its share, when it exceeds the limit.
fn dominant_word(text: &str) -> Option<(String, f64)> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    if words.len() < MIN_WORDS_FOR_REPETITION {
        return None;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for w in words
        .iter()
        .filter(|w| w.chars().count() >= MIN_REPEATED_WORD_LEN && w.chars().all(char::is_alphabetic))
    {
        *counts.entry(w.as_str()).or_default() += 1;
    }

    let (word, count) = counts.into_iter().max_by_key(|(_, c)| *c)?;
    let share = count as f64 / words.len() as f64;
    (share > MAX_WORD_SHARE).then(|| (word.to_string(), share))
}

fn currency_notations(text: &str) -> BTreeSet<&'static str> {
    CURRENCY_RE
        .find_iter(text)
        .map(|m| match m.as_str() {
            "$" | "USD" => "USD",
            "€" | "EUR" => "EUR",
            "£" | "GBP" => "GBP",
            "¥" | "JPY" => "JPY",
            _ => "CAD",
        })
        .collect()
}

/// (symbol ratio over non-space chars, single-letter token ratio)
fn scan_noise(text: &str) -> Option<(f64, f64)> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < MIN_TOKENS_FOR_SCAN_CHECK {
        return None;
    }
    let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    let symbols = visible.iter().filter(|c| !c.is_alphanumeric()).count();
    let fragments = tokens
        .iter()
        .filter(|t| {
            let mut chars = t.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic() && !matches!(c, 'a' | 'A' | 'I'))
        })
        .count();
    Some((
        symbols as f64 / visible.len().max(1) as f64,
        fragments as f64 / tokens.len() as f64,
    ))
}

/// Score how authentic the document text looks.
pub fn assess_authenticity(
    text: &str,
    fields: &StructuredFields,
    as_of: NaiveDate,
    cfg: &AuthenticityPenalties,
) -> AuthenticityAssessment {
    let mut findings = Findings::new();

    if let Some(issue) = formatting_issue(text, cfg.max_indentation_levels) {
        findings.flag(issue, cfg.inconsistent_formatting);
    }

    let expires = fields
        .as_policy()
        .and_then(|p| p.expiration_date.found().copied());
    findings.merge(date_findings(text, expires, as_of, cfg));

    let (present, expected) = fields.required_presence();
    if present * 2 < expected {
        findings.flag(
            format!("Missing required fields ({present} of {expected} present)"),
            cfg.missing_required_fields,
        );
    }

    if let Some(m) = PLACEHOLDER_RE.find(text) {
        findings.flag(
            format!("Placeholder or sample text present ('{}')", m.as_str().trim()),
            cfg.placeholder_text,
        );
    }

    if let Some((word, share)) = dominant_word(text) {
        findings.flag(
            format!("Excessive repetition of '{word}' ({:.0}% of words)", share * 100.0),
            cfg.excessive_repetition,
        );
    }

    let currencies = currency_notations(text);
    if currencies.len() > 1 {
        let list: Vec<&str> = currencies.into_iter().collect();
        findings.flag(
            format!("Mixed currency notations ({})", list.join(", ")),
            cfg.mixed_currency,
        );
    }

    if let Some((symbols, fragments)) = scan_noise(text) {
        if symbols > MAX_SYMBOL_RATIO {
            findings.flag("Poor scan quality: high ratio of stray symbols", cfg.poor_scan_symbols);
        }
        if fragments > MAX_FRAGMENT_RATIO {
            findings.flag(
                "Poor scan quality: many single-character fragments",
                cfg.poor_scan_fragments,
            );
        }
    }

    let confidence = (100.0 - findings.penalty).max(0.0);
    AuthenticityAssessment {
        is_authentic: confidence > cfg.authentic_above,
        confidence,
        flags: findings.indicators,
    }
}
