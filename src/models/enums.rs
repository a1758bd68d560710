use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $s)]
                $variant
            ),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ClaimType {
    Auto => "auto",
    Home => "home",
    Health => "health",
    Life => "life",
    Travel => "travel",
    Other => "other",
});

str_enum!(DocumentType {
    Policy => "policy",
    RepairEstimate => "repair_estimate",
    MedicalBill => "medical_bill",
    PoliceReport => "police_report",
    Unknown => "unknown",
});

str_enum!(ContentLabel {
    Outdoor => "outdoor",
    Vegetation => "vegetation",
    Vehicle => "vehicle",
    BuildingInterior => "building_interior",
    FireDamage => "fire_damage",
    WaterDamage => "water_damage",
    StructuralDamage => "structural_damage",
});

str_enum!(RiskLevel {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
});

str_enum!(DecisionStatus {
    Approved => "APPROVED",
    Pending => "PENDING",
    Flagged => "FLAGGED",
});

str_enum!(Recommendation {
    AutoApprove => "auto_approve",
    AdditionalVerification => "additional_verification",
    ManualReview => "manual_review",
});

str_enum!(CoverageKind {
    PerOccurrence => "per_occurrence",
    Comprehensive => "comprehensive",
    Collision => "collision",
    Dwelling => "dwelling",
    PersonalProperty => "personal_property",
    Liability => "liability",
    Total => "total",
});

impl ClaimType {
    /// Content labels a genuine damage photo for this claim type may show.
    /// Empty for types with no photographic expectation.
    pub fn expected_labels(&self) -> &'static [ContentLabel] {
        match self {
            Self::Auto => &[
                ContentLabel::Vehicle,
                ContentLabel::Outdoor,
                ContentLabel::StructuralDamage,
            ],
            Self::Home => &[
                ContentLabel::BuildingInterior,
                ContentLabel::FireDamage,
                ContentLabel::WaterDamage,
                ContentLabel::StructuralDamage,
            ],
            Self::Health | Self::Life | Self::Travel | Self::Other => &[],
        }
    }
}

impl CoverageKind {
    /// Limits consulted for a coverage-vs-claim comparison, most specific first.
    pub const SPECIFICITY_ORDER: [CoverageKind; 7] = [
        CoverageKind::PerOccurrence,
        CoverageKind::Comprehensive,
        CoverageKind::Collision,
        CoverageKind::Dwelling,
        CoverageKind::PersonalProperty,
        CoverageKind::Liability,
        CoverageKind::Total,
    ];

    pub fn is_peril_specific(&self) -> bool {
        !matches!(self, Self::Liability | Self::Total)
    }
}

impl RiskLevel {
    pub fn recommendation(&self) -> Recommendation {
        match self {
            Self::High => Recommendation::ManualReview,
            Self::Medium => Recommendation::AdditionalVerification,
            Self::Low => Recommendation::AutoApprove,
        }
    }
}
