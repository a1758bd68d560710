use serde::{Deserialize, Serialize};

/// Outcome of reading one optional field.
///
/// Keeps "the source had no value" apart from "reading the source failed",
/// so callers cannot confuse a missing signal with a mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Extracted<T> {
    Found(T),
    NotFound,
    Error(String),
}

impl<T> Default for Extracted<T> {
    fn default() -> Self {
        Self::NotFound
    }
}

impl<T> Extracted<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            Self::Found(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Extracted<U> {
        match self {
            Self::Found(v) => Extracted::Found(f(v)),
            Self::NotFound => Extracted::NotFound,
            Self::Error(e) => Extracted::Error(e),
        }
    }
}

impl<T> From<Option<T>> for Extracted<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Found(v),
            None => Self::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_conversion() {
        assert_eq!(Extracted::from(Some(3)), Extracted::Found(3));
        assert_eq!(Extracted::<i32>::from(None), Extracted::NotFound);
    }

    #[test]
    fn found_accessor() {
        assert_eq!(Extracted::Found("x").found(), Some(&"x"));
        assert_eq!(Extracted::<&str>::Error("boom".into()).found(), None);
        assert!(!Extracted::<u8>::NotFound.is_found());
    }

    #[test]
    fn serializes_with_status_tag() {
        let json = serde_json::to_string(&Extracted::Found(42)).unwrap();
        assert_eq!(json, r#"{"status":"found","value":42}"#);
        let json = serde_json::to_string(&Extracted::<u32>::NotFound).unwrap();
        assert_eq!(json, r#"{"status":"not_found"}"#);
    }
}
