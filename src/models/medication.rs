use serde::{Deserialize, Serialize};

/// A medication entry after normalization by the external terminology
/// adapter. Identity within a patient's list is positional: the same drug
/// may legally appear more than once (e.g. two different-dose entries) and
/// each occurrence is scored independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMedication {
    /// The name exactly as the patient entered it.
    pub raw_name: String,
    /// Canonical name from the terminology adapter; may equal raw_name
    /// when no better match was found.
    pub normalized_name: String,
    /// Terminology identifier (e.g. an RxCUI). None means the name could
    /// not be resolved; the entry still participates in polypharmacy
    /// counting but contributes nothing to dose or interaction points.
    pub external_id: Option<String>,
    /// Adapter note about an imperfect parse or approximate match.
    pub parse_note: Option<String>,
    /// Numeric dose as parsed by the adapter, in dose_unit.
    pub dose_value: Option<f64>,
    /// Unit of dose_value ("mg", "mcg", "g"). An unrecognized unit is
    /// treated as an unparseable dose, never silently compared.
    pub dose_unit: Option<String>,
    /// Free-text frequency ("twice daily", "every 8 hours", "weekly").
    pub frequency: String,
}

impl NormalizedMedication {
    /// Label used for per-medication attribution lines. Prefers the
    /// normalized name, falls back to the raw name.
    pub fn display_label(&self) -> &str {
        if self.normalized_name.trim().is_empty() {
            &self.raw_name
        } else {
            &self.normalized_name
        }
    }

    /// Whether the terminology adapter resolved this entry to an identifier.
    pub fn is_resolved(&self) -> bool {
        self.external_id
            .as_deref()
            .map(|id| !id.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn med(normalized: &str, raw: &str) -> NormalizedMedication {
        NormalizedMedication {
            raw_name: raw.into(),
            normalized_name: normalized.into(),
            external_id: None,
            parse_note: None,
            dose_value: None,
            dose_unit: None,
            frequency: String::new(),
        }
    }

    #[test]
    fn display_label_prefers_normalized() {
        assert_eq!(med("warfarin", "Coumadin").display_label(), "warfarin");
        assert_eq!(med("", "Coumadin").display_label(), "Coumadin");
        assert_eq!(med("  ", "Coumadin").display_label(), "Coumadin");
    }

    #[test]
    fn resolved_requires_non_blank_id() {
        let mut m = med("warfarin", "warfarin");
        assert!(!m.is_resolved());
        m.external_id = Some("".into());
        assert!(!m.is_resolved());
        m.external_id = Some("11289".into());
        assert!(m.is_resolved());
    }
}
