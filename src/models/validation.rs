use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::CoverageKind;

/// Verdict for one compared text field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum FieldMatch {
    ExactMatch,
    /// Close enough to be an OCR or nickname variance. Warning only.
    ProbableMatch { similarity: f64 },
    Mismatch { similarity: f64 },
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum CoverageCheck {
    WithinLimit { kind: CoverageKind, limit: f64 },
    NearLimit { kind: CoverageKind, limit: f64 },
    Exceeds { kind: CoverageKind, limit: f64 },
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum PolicyWindowCheck {
    WithinWindow,
    BeforeEffective { effective: NaiveDate },
    AfterExpiration { expiration: NaiveDate },
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum AuthenticityCheck {
    Authentic,
    /// Authentic overall but with flagged elements. Warning only.
    Suspicious { flags: Vec<String> },
    Forgery { confidence: f64 },
}

/// OCR-extracted fields compared against the submitted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentValidationResult {
    pub policy_number: FieldMatch,
    pub claimant_name: FieldMatch,
    pub coverage: CoverageCheck,
    pub policy_window: PolicyWindowCheck,
    pub authenticity: AuthenticityCheck,
    /// 0 - 100
    pub score: f64,
    pub indicators: Vec<String>,
    /// Non-scoring notes for a human reviewer.
    pub warnings: Vec<String>,
    pub is_valid: bool,
}

impl DocumentValidationResult {
    /// True iff any comparison reached a definite negative verdict.
    pub fn has_invalidating_verdict(&self) -> bool {
        matches!(self.policy_number, FieldMatch::Mismatch { .. })
            || matches!(self.claimant_name, FieldMatch::Mismatch { .. })
            || matches!(self.coverage, CoverageCheck::Exceeds { .. })
            || matches!(
                self.policy_window,
                PolicyWindowCheck::BeforeEffective { .. } | PolicyWindowCheck::AfterExpiration { .. }
            )
            || matches!(self.authenticity, AuthenticityCheck::Forgery { .. })
    }
}
