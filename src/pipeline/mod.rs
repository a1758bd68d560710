pub mod intake;
pub mod forensics; // Image forensics + multi-image aggregation
pub mod extraction; // OCR / PDF text extraction
pub mod structuring; // Classification, field rules, authenticity
pub mod validation; // OCR-vs-form cross checks
pub mod scoring; // Behavioral rules, fusion, decision
pub mod processor; // One submission end to end

/// Accumulates fraud indicators with the penalty each one carries.
///
/// Every rule that fires pushes exactly one indicator, so each point of a
/// sub-score can be traced back to a named reason.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Findings {
    pub indicators: Vec<String>,
    pub penalty: f64,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&mut self, indicator: impl Into<String>, penalty: f64) {
        self.indicators.push(indicator.into());
        self.penalty += penalty;
    }

    pub fn merge(&mut self, other: Findings) {
        self.indicators.extend(other.indicators);
        self.penalty += other.penalty;
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Summed penalty clamped to the 0-100 score range.
    pub fn score(&self) -> f64 {
        clamp_score(self.penalty)
    }
}

pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}
