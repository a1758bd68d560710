use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{DecisionStatus, Recommendation, RiskLevel};
use crate::pipeline_config::WeightSet;

/// The weighted sub-scores behind a fused fraud score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Behavioral/text rules, 0 - 100.
    pub text_score: f64,
    /// Document validation, when a document was supplied.
    pub document_score: Option<f64>,
    /// Image aggregate, when image analysis ran.
    pub image_score: Option<f64>,
    pub weights: WeightSet,
}

/// Final fusion output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAnalysis {
    /// 0 - 100
    pub fraud_score: u8,
    /// Behavioral, then document-validation, then image indicators.
    pub indicators: Vec<String>,
    pub breakdown: ScoreBreakdown,
    pub risk_level: RiskLevel,
    pub recommendation: Recommendation,
}

/// Disposition for one submission. Terminal once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub status: DecisionStatus,
    pub explanation: String,
    /// 0 - 100
    pub confidence: u8,
    pub processed_at: DateTime<Utc>,
}
