//! Rules evaluated directly over the claim form, independent of any
//! document or photo. Each rule contributes its own indicator.

use std::sync::LazyLock;

use chrono::{Datelike, Weekday};
use regex::Regex;

use crate::models::ClaimSubmission;
use crate::pipeline::Findings;
use crate::pipeline_config::BehaviorRules;

pub fn detect_high_amount(claim: &ClaimSubmission, rules: &BehaviorRules) -> Findings {
    let mut f = Findings::new();
    let amount = claim.amount();
    if amount > rules.high_amount_threshold {
        f.flag(
            format!(
                "High claim amount: ${amount:.2} exceeds ${:.2}",
                rules.high_amount_threshold
            ),
            rules.high_amount_penalty,
        );
    }
    f
}

pub fn detect_same_day_submission(claim: &ClaimSubmission, rules: &BehaviorRules) -> Findings {
    let mut f = Findings::new();
    if claim.incident_date == claim.submitted_on {
        f.flag(
            "Claim submitted on the same day as the incident",
            rules.same_day_penalty,
        );
    }
    f
}

pub fn detect_short_description(claim: &ClaimSubmission, rules: &BehaviorRules) -> Findings {
    let mut f = Findings::new();
    let chars = claim.description.trim().chars().count();
    if chars < rules.min_description_chars {
        f.flag(
            format!(
                "Brief incident description ({chars} characters, minimum {})",
                rules.min_description_chars
            ),
            rules.short_description_penalty,
        );
    }
    f
}

pub fn detect_weekend_incident(claim: &ClaimSubmission, rules: &BehaviorRules) -> Findings {
    let mut f = Findings::new();
    if matches!(claim.incident_date.weekday(), Weekday::Sat | Weekday::Sun) {
        f.flag(
            format!("Incident occurred on a weekend ({})", claim.incident_date.weekday()),
            rules.weekend_penalty,
        );
    }
    f
}

pub fn detect_round_amount(claim: &ClaimSubmission, rules: &BehaviorRules) -> Findings {
    let mut f = Findings::new();
    let amount = claim.amount();
    if rules.round_amount_modulus > 0.0 && amount > 0.0 && amount % rules.round_amount_modulus == 0.0
    {
        f.flag(
            format!("Round claim amount: ${amount:.0}"),
            rules.round_amount_penalty,
        );
    }
    f
}

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}']+").expect("Invalid word regex pattern"));

fn words(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Watch-list terms present in the description as whole words, in
/// watch-list order. Multi-word terms must appear as consecutive words.
pub fn matched_keywords<'a>(description: &str, rules: &'a BehaviorRules) -> Vec<&'a str> {
    let text = words(description);
    rules
        .keywords
        .iter()
        .map(String::as_str)
        .filter(|k| {
            let needle = words(k);
            !needle.is_empty() && text.windows(needle.len()).any(|w| w == needle.as_slice())
        })
        .collect()
}

pub fn detect_keywords(claim: &ClaimSubmission, rules: &BehaviorRules) -> Findings {
    let mut f = Findings::new();
    let matched = matched_keywords(&claim.description, rules);
    if matched.len() >= rules.keyword_min_matches.max(1) {
        f.flag(
            format!("Suspicious keywords in description: {}", matched.join(", ")),
            rules.keyword_penalty,
        );
    }
    f
}

/// Run every behavioral rule in a fixed order.
pub fn evaluate_behavior(claim: &ClaimSubmission, rules: &BehaviorRules) -> Findings {
    let mut findings = Findings::new();
    for detect in [
        detect_high_amount,
        detect_same_day_submission,
        detect_short_description,
        detect_weekend_incident,
        detect_round_amount,
        detect_keywords,
    ] {
        findings.merge(detect(claim, rules));
    }
    tracing::debug!(
        claim_id = %claim.claim_id,
        indicators = findings.indicators.len(),
        penalty = findings.penalty,
        "Behavioral rules evaluated"
    );
    findings
}
