//! Lightweight language detection for extracted text.
//!
//! Keyword frequency plus diacritic hints over English, French and Spanish.
//! English wins ties and short inputs.

/// Fewer trimmed bytes than this is not enough to judge.
const MIN_TEXT_LEN: usize = 20;

const ENGLISH_INDICATORS: &[&str] = &[
    "the ", "and ", "was ", "for ", "are ", "but ", "not ", "you ", "has ", "his ", "her ",
    "from ", "have ", "this ", "that ", "with ", "will ", "been ",
    // Insurance English
    "policy", "insured", "coverage", "deductible", "premium", "claim", "estimate", "vehicle",
    "damage", "officer", "report", "patient",
];

const FRENCH_INDICATORS: &[&str] = &[
    "le ", "la ", "les ", "une ", "des ", "du ", "et ", "est ", "au ", "aux ", "pour ", "sur ",
    "dans ", "avec ", "qui ", "pas ", "cette ",
    // Insurance French
    "assuré", "assurance", "contrat", "sinistre", "garantie", "franchise", "montant",
    "véhicule", "devis", "d'", "l'", "qu'",
];

const SPANISH_INDICATORS: &[&str] = &[
    "el ", "los ", "las ", "una ", "del ", "y ", "es ", "por ", "con ", "para ", "que ", "sin ",
    // Insurance Spanish
    "póliza", "asegurado", "seguro", "siniestro", "cobertura", "deducible", "vehículo",
    "presupuesto", "daños", "fecha",
];

/// Detect the primary language of extracted text.
/// Returns a Tesseract-compatible code: "eng", "fra" or "spa".
pub fn detect_language(text: &str) -> String {
    if text.trim().len() < MIN_TEXT_LEN {
        return "eng".to_string();
    }

    let lower = text.to_lowercase();

    let english = count_indicators(&lower, ENGLISH_INDICATORS);
    let french = count_indicators(&lower, FRENCH_INDICATORS) + count_chars(&lower, "èêëçàâîïôûù");
    let spanish = count_indicators(&lower, SPANISH_INDICATORS) + count_chars(&lower, "ñ¿¡");

    if english >= french && english >= spanish {
        "eng".to_string()
    } else if french >= spanish {
        "fra".to_string()
    } else {
        "spa".to_string()
    }
}

/// Language to report: a caller hint wins over detection.
pub fn resolve_language(hint: Option<&str>, text: &str) -> String {
    match hint.map(str::trim).filter(|h| !h.is_empty()) {
        Some(hint) => hint.to_lowercase(),
        None => detect_language(text),
    }
}

fn count_indicators(lower_text: &str, indicators: &[&str]) -> u32 {
    indicators
        .iter()
        .map(|indicator| lower_text.matches(indicator).count() as u32)
        .sum()
}

fn count_chars(lower_text: &str, set: &str) -> u32 {
    lower_text.chars().filter(|c| set.contains(*c)).count() as u32
}
