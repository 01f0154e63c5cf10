use crate::models::enums::Confidence;
use crate::models::NormalizedMedication;

use super::helpers::dose_to_mg;

/// Whether an entry's dose reconciles to milligrams.
fn dose_parses(med: &NormalizedMedication) -> bool {
    med.dose_value
        .and_then(|v| dose_to_mg(v, med.dose_unit.as_deref()))
        .is_some()
}

/// Derive the confidence label from input completeness alone. This is a
/// separate pass over the request, computed after scoring, and never
/// reads any score: how risky and how sure are different questions.
///
/// An entry is complete when the terminology adapter resolved it to an
/// identifier and its dose reconciles. High requires every entry
/// complete; Low means nothing resolved, incomplete entries form a
/// strict majority, or the list is empty; Medium covers the rest.
pub fn derive_confidence(meds: &[NormalizedMedication]) -> Confidence {
    let total = meds.len();
    if total == 0 {
        return Confidence::Low;
    }

    let resolved = meds.iter().filter(|m| m.is_resolved()).count();
    if resolved == 0 {
        return Confidence::Low;
    }

    let incomplete = meds
        .iter()
        .filter(|m| !m.is_resolved() || !dose_parses(m))
        .count();

    if incomplete == 0 {
        Confidence::High
    } else if incomplete * 2 > total {
        Confidence::Low
    } else {
        Confidence::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn med(resolved: bool, dose: Option<(f64, &str)>) -> NormalizedMedication {
        NormalizedMedication {
            raw_name: "drug".into(),
            normalized_name: "drug".into(),
            external_id: resolved.then(|| "123".into()),
            parse_note: (!resolved).then(|| "no terminology match".into()),
            dose_value: dose.map(|(v, _)| v),
            dose_unit: dose.map(|(_, u)| u.into()),
            frequency: "daily".into(),
        }
    }

    #[test]
    fn empty_list_is_low() {
        assert_eq!(derive_confidence(&[]), Confidence::Low);
    }

    #[test]
    fn nothing_resolved_is_low() {
        let meds = vec![med(false, Some((10.0, "mg"))), med(false, Some((20.0, "mg")))];
        assert_eq!(derive_confidence(&meds), Confidence::Low);
    }

    #[test]
    fn all_complete_is_high() {
        let meds = vec![med(true, Some((10.0, "mg"))), med(true, Some((0.5, "g")))];
        assert_eq!(derive_confidence(&meds), Confidence::High);
    }

    #[test]
    fn one_of_two_incomplete_is_medium() {
        let meds = vec![med(true, Some((10.0, "mg"))), med(false, Some((20.0, "mg")))];
        assert_eq!(derive_confidence(&meds), Confidence::Medium);
    }

    #[test]
    fn majority_incomplete_is_low() {
        let meds = vec![
            med(true, Some((10.0, "mg"))),
            med(false, None),
            med(true, None),
        ];
        assert_eq!(derive_confidence(&meds), Confidence::Low);
    }

    #[test]
    fn missing_dose_blocks_high() {
        let meds = vec![med(true, Some((10.0, "mg"))), med(true, None)];
        assert_eq!(derive_confidence(&meds), Confidence::Medium);
    }

    #[test]
    fn unreconcilable_unit_blocks_high() {
        let meds = vec![med(true, Some((10.0, "ml"))), med(true, Some((5.0, "mg")))];
        assert_eq!(derive_confidence(&meds), Confidence::Medium);
    }

    #[test]
    fn single_unresolved_med_is_low() {
        let meds = vec![med(false, Some((10.0, "mg")))];
        assert_eq!(derive_confidence(&meds), Confidence::Low);
    }
}
