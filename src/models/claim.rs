use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::ClaimType;

/// Claimant-entered form fields. Owned by the calling layer and read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSubmission {
    pub claim_id: String,
    pub policy_number: String,
    pub claimant_name: String,
    pub claimant_email: String,
    pub claim_type: ClaimType,
    pub incident_date: NaiveDate,
    /// Day the claim was filed. Supplied by the caller so scoring stays pure.
    pub submitted_on: NaiveDate,
    pub claim_amount: f64,
    pub description: String,
}

impl ClaimSubmission {
    /// Claim amount with negative input treated as zero.
    pub fn amount(&self) -> f64 {
        self.claim_amount.max(0.0)
    }

    /// Context handed to the image analyzer for this submission.
    pub fn image_context(&self) -> ClaimContext {
        ClaimContext {
            claim_type: Some(self.claim_type),
            incident_date: Some(self.incident_date),
            policy_id: Some(self.policy_number.clone()).filter(|p| !p.trim().is_empty()),
        }
    }
}

/// Optional claim context for image analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimContext {
    pub claim_type: Option<ClaimType>,
    pub incident_date: Option<NaiveDate>,
    /// Registry key for cross-claim duplicate detection.
    pub policy_id: Option<String>,
}

impl ClaimContext {
    /// Build a context from loosely-typed inputs. Unparsable values become `None`.
    pub fn from_parts(claim_type: &str, incident_date: &str, policy_id: &str) -> Self {
        Self {
            claim_type: claim_type.parse().ok(),
            incident_date: NaiveDate::parse_from_str(incident_date.trim(), "%Y-%m-%d").ok(),
            policy_id: Some(policy_id.trim().to_string()).filter(|p| !p.is_empty()),
        }
    }
}
