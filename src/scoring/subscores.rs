use std::collections::{BTreeMap, BTreeSet};

use crate::models::enums::{RiskClass, Severity};
use crate::models::{InteractionRecord, NormalizedMedication};

use super::helpers::{canonical, daily_frequency_multiplier, dose_to_mg, round2};
use super::policy::{DdiPolicy, DosePolicy, VulnerabilityPolicy};
use super::reference::DoseReference;
use super::types::ScoreItem;

/// Saturating normalization of raw points onto [0, 10].
fn saturate(raw: f64, ceiling: f64) -> f64 {
    round2(((raw / ceiling) * 10.0).min(10.0))
}

// ---------------------------------------------------------------------------
// DDI subscore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DdiOutcome {
    pub raw: f64,
    pub score: f64,
    pub items: Vec<ScoreItem>,
    /// Distinct pairs at major or contraindicated severity; drives the
    /// severe-interaction escalation floors.
    pub severe_pairs: usize,
}

/// Score pairwise interactions. Each unordered pair is counted exactly
/// once (the first record for a pair wins); item points are the severity
/// points multiplied by min(count_a, count_b) occurrences in the list, so
/// a pair involving a drug absent from the list contributes nothing and
/// is not listed. Invariant to the ordering of the medication list.
pub fn score_interactions(
    meds: &[NormalizedMedication],
    interactions: &[InteractionRecord],
    policy: &DdiPolicy,
) -> DdiOutcome {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for med in meds {
        let name = canonical(med.display_label());
        if !name.is_empty() {
            *counts.entry(name).or_insert(0) += 1;
        }
    }

    let mut raw = 0.0;
    let mut items = Vec::new();
    let mut severe_pairs = 0;
    let mut counted_pairs = 0;
    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();

    for record in interactions {
        let key = record.pair_key();
        if key.0 == key.1 || !seen.insert(key.clone()) {
            continue;
        }

        let count_a = counts.get(&key.0).copied().unwrap_or(0);
        let count_b = counts.get(&key.1).copied().unwrap_or(0);
        let multiplicity = count_a.min(count_b);
        if multiplicity == 0 {
            continue;
        }

        let points = round2(
            policy.severity_points.points_for(record.severity) * multiplicity as f64,
        );
        raw += points;
        counted_pairs += 1;
        if matches!(record.severity, Severity::Major | Severity::Contraindicated) {
            severe_pairs += 1;
        }

        items.push(ScoreItem::new(
            format!("{} + {}", record.drug_a.trim(), record.drug_b.trim()),
            points,
        ));
    }

    // Burden bonus so many individually mild pairs still register.
    let bonus = round2(
        (counted_pairs as f64 * policy.burden_per_pair
            + severe_pairs as f64 * policy.burden_per_severe)
            .min(policy.burden_cap),
    );
    if bonus > 0.0 {
        raw += bonus;
        items.push(ScoreItem::new(
            format!("Interaction burden ({counted_pairs} pairs)"),
            bonus,
        ));
    }

    DdiOutcome {
        raw,
        score: saturate(raw, policy.ceiling),
        items,
        severe_pairs,
    }
}

// ---------------------------------------------------------------------------
// Dose subscore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DoseOutcome {
    pub raw: f64,
    pub score: f64,
    pub modifiers: Vec<ScoreItem>,
    /// Any medication at or beyond the extreme overage ratio.
    pub extreme_dose_present: bool,
}

/// Compare each medication's daily dose against the reference limit.
/// Unparseable doses and drugs unknown to the table contribute zero
/// points; a reconciliation failure is surfaced as a zero-point flag
/// rather than silently miscompared. Contributions are recorded into
/// per_med at the entry's list position.
pub fn score_doses(
    meds: &[NormalizedMedication],
    reference: &DoseReference,
    policy: &DosePolicy,
    per_med: &mut [f64],
) -> DoseOutcome {
    let mut raw = 0.0;
    let mut modifiers = Vec::new();
    let mut extreme_dose_present = false;

    for (i, med) in meds.iter().enumerate() {
        let name = reference.canonical_name(med.display_label());
        if name.is_empty() {
            continue;
        }

        let dose_mg = med
            .dose_value
            .and_then(|v| dose_to_mg(v, med.dose_unit.as_deref()));
        let Some(dose_mg) = dose_mg else {
            if med.dose_value.is_some() {
                modifiers.push(ScoreItem::new(
                    format!("Unreconcilable dose unit: {name}"),
                    0.0,
                ));
            }
            continue;
        };

        let Some(limit_mg) = reference.daily_limit_mg(&name) else {
            modifiers.push(ScoreItem::new(format!("No dose reference: {name}"), 0.0));
            continue;
        };

        let daily_mg = dose_mg * daily_frequency_multiplier(&med.frequency);
        let ratio = daily_mg / limit_mg;
        if ratio <= 1.0 {
            continue;
        }

        let points = round2((policy.overage_slope * (ratio - 1.0)).min(policy.per_drug_cap));
        let label = if ratio >= policy.extreme_ratio {
            extreme_dose_present = true;
            format!("Extreme dose concern: {} ({} mg/day)", name, round2(daily_mg))
        } else {
            format!("Dose above daily limit: {} ({} mg/day)", name, round2(daily_mg))
        };

        raw += points;
        per_med[i] += points;
        modifiers.push(ScoreItem::new(label, points));
    }

    DoseOutcome {
        raw,
        score: saturate(raw, policy.ceiling),
        modifiers,
        extreme_dose_present,
    }
}

// ---------------------------------------------------------------------------
// Vulnerability subscore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct VulnerabilityOutcome {
    pub raw: f64,
    pub score: f64,
    pub modifiers: Vec<ScoreItem>,
    pub age_points: f64,
    /// Medications with a non-empty name; basis for polypharmacy and the
    /// medication-count floors.
    pub med_count: usize,
    pub high_risk_substance_present: bool,
    pub blood_thinner_present: bool,
}

/// Score patient vulnerability: age, polypharmacy, unresolved names,
/// risk-class memberships, and high-risk substances. Patient-level
/// points (age, polypharmacy) are shared equally across medications so
/// every vulnerability point is attributable to a list entry.
pub fn score_vulnerability(
    meds: &[NormalizedMedication],
    med_classes: &[Vec<RiskClass>],
    age: u32,
    policy: &VulnerabilityPolicy,
    per_med: &mut [f64],
) -> VulnerabilityOutcome {
    let mut raw = 0.0;
    let mut modifiers = Vec::new();

    let countable: Vec<usize> = meds
        .iter()
        .enumerate()
        .filter(|(_, m)| !canonical(m.display_label()).is_empty())
        .map(|(i, _)| i)
        .collect();
    let med_count = countable.len();

    let age_points = policy.age_points(age);

    if med_count == 0 {
        return VulnerabilityOutcome {
            raw: 0.0,
            score: 0.0,
            modifiers,
            age_points,
            med_count: 0,
            high_risk_substance_present: false,
            blood_thinner_present: false,
        };
    }

    if age_points > 0.0 {
        raw += age_points;
        modifiers.push(ScoreItem::new(format!("Age modifier ({age})"), age_points));
        let share = age_points / med_count as f64;
        for &i in &countable {
            per_med[i] += share;
        }
    }

    let unresolved: Vec<usize> = countable
        .iter()
        .copied()
        .filter(|&i| !meds[i].is_resolved())
        .collect();
    if !unresolved.is_empty() {
        let points = round2(
            (unresolved.len() as f64 * policy.unresolved_per_med).min(policy.unresolved_cap),
        );
        if points > 0.0 {
            raw += points;
            modifiers.push(ScoreItem::new(
                format!("Unresolved medication names ({})", unresolved.len()),
                points,
            ));
            let share = points / unresolved.len() as f64;
            for &i in &unresolved {
                per_med[i] += share;
            }
        }
    }

    let poly_points = round2(policy.polypharmacy.points_for(med_count));
    if poly_points > 0.0 {
        raw += poly_points;
        modifiers.push(ScoreItem::new(
            format!("Polypharmacy ({med_count} medicines)"),
            poly_points,
        ));
        let share = poly_points / med_count as f64;
        for &i in &countable {
            per_med[i] += share;
        }
    }

    let mut high_risk_substance_present = false;
    let mut blood_thinner_present = false;
    let mut sedative_meds: Vec<usize> = Vec::new();

    for &i in &countable {
        let name = canonical(meds[i].display_label());

        for (substance, points) in &policy.high_risk_substances {
            if name.contains(substance.as_str()) && *points > 0.0 {
                raw += *points;
                high_risk_substance_present = true;
                modifiers.push(ScoreItem::new(
                    format!("High-risk substance: {substance}"),
                    *points,
                ));
                per_med[i] += *points;
            }
        }

        let mut seen_classes: Vec<RiskClass> = Vec::new();
        for &class in &med_classes[i] {
            if seen_classes.contains(&class) {
                continue;
            }
            seen_classes.push(class);

            if class.is_blood_thinner() {
                blood_thinner_present = true;
            }
            if class == RiskClass::Sedative {
                sedative_meds.push(i);
            }

            let points = policy.class_points(class);
            if points > 0.0 {
                raw += points;
                modifiers.push(ScoreItem::new(
                    format!("Medicine class risk: {}", class.as_str()),
                    points,
                ));
                per_med[i] += points;
            }
        }
    }

    if age >= policy.elderly_sedative_min_age
        && !sedative_meds.is_empty()
        && policy.elderly_sedative_bonus > 0.0
    {
        let bonus = policy.elderly_sedative_bonus;
        raw += bonus;
        modifiers.push(ScoreItem::new(
            format!(
                "Age {}+ with sedative present",
                policy.elderly_sedative_min_age
            ),
            bonus,
        ));
        let share = bonus / sedative_meds.len() as f64;
        for &i in &sedative_meds {
            per_med[i] += share;
        }
    }

    VulnerabilityOutcome {
        raw,
        score: saturate(raw, policy.ceiling),
        modifiers,
        age_points,
        med_count,
        high_risk_substance_present,
        blood_thinner_present,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_med(name: &str, dose_value: Option<f64>, dose_unit: Option<&str>, frequency: &str) -> NormalizedMedication {
        NormalizedMedication {
            raw_name: name.into(),
            normalized_name: name.into(),
            external_id: Some(format!("id-{name}")),
            parse_note: None,
            dose_value,
            dose_unit: dose_unit.map(|u| u.into()),
            frequency: frequency.into(),
        }
    }

    fn interaction(a: &str, b: &str, severity: Severity) -> InteractionRecord {
        InteractionRecord {
            drug_a: a.into(),
            drug_b: b.into(),
            severity,
            description: format!("{a} with {b}"),
        }
    }

    // --- DDI ---

    /// T-01: A known major pair yields one item with major points plus the
    /// burden bonus.
    #[test]
    fn ddi_major_pair_scores() {
        let meds = vec![
            make_med("warfarin", Some(5.0), Some("mg"), "morning"),
            make_med("ibuprofen", Some(400.0), Some("mg"), "afternoon"),
        ];
        let interactions = vec![interaction("warfarin", "ibuprofen", Severity::Major)];
        let out = score_interactions(&meds, &interactions, &DdiPolicy::default());

        assert_eq!(out.items.len(), 2); // pair + burden
        assert_eq!(out.items[0].label, "warfarin + ibuprofen");
        assert_eq!(out.items[0].points, 7.0);
        assert_eq!(out.severe_pairs, 1);
        assert!(out.score > 0.0);
        assert!(out.score <= 10.0);
    }

    /// T-02: Medication list order does not change the DDI outcome.
    #[test]
    fn ddi_is_invariant_to_med_order() {
        let a = make_med("warfarin", None, None, "");
        let b = make_med("ibuprofen", None, None, "");
        let c = make_med("aspirin", None, None, "");
        let interactions = vec![
            interaction("warfarin", "ibuprofen", Severity::Major),
            interaction("warfarin", "aspirin", Severity::Moderate),
        ];
        let policy = DdiPolicy::default();

        let forward = score_interactions(&[a.clone(), b.clone(), c.clone()], &interactions, &policy);
        let reversed = score_interactions(&[c, b, a], &interactions, &policy);

        assert_eq!(forward.raw, reversed.raw);
        assert_eq!(forward.score, reversed.score);
        assert_eq!(forward.items, reversed.items);
    }

    /// T-03: Duplicate records for the same unordered pair count once.
    #[test]
    fn ddi_pair_counted_once() {
        let meds = vec![make_med("warfarin", None, None, ""), make_med("aspirin", None, None, "")];
        let interactions = vec![
            interaction("warfarin", "aspirin", Severity::Major),
            interaction("aspirin", "warfarin", Severity::Minor),
        ];
        let out = score_interactions(&meds, &interactions, &DdiPolicy::default());
        let pair_items: Vec<_> = out
            .items
            .iter()
            .filter(|i| i.label.contains('+'))
            .collect();
        assert_eq!(pair_items.len(), 1);
        assert_eq!(pair_items[0].points, 7.0, "first record wins");
    }

    /// T-04: A record naming a drug absent from the list is ignored.
    #[test]
    fn ddi_absent_drug_contributes_nothing() {
        let meds = vec![make_med("warfarin", None, None, "")];
        let interactions = vec![interaction("warfarin", "ibuprofen", Severity::Major)];
        let out = score_interactions(&meds, &interactions, &DdiPolicy::default());
        assert_eq!(out.raw, 0.0);
        assert_eq!(out.score, 0.0);
        assert!(out.items.is_empty());
    }

    /// T-05: A duplicated drug multiplies pair points by min occurrence count.
    #[test]
    fn ddi_multiplicity_uses_min_count() {
        let meds = vec![
            make_med("warfarin", Some(2.0), Some("mg"), "morning"),
            make_med("warfarin", Some(3.0), Some("mg"), "evening"),
            make_med("ibuprofen", None, None, ""),
        ];
        let interactions = vec![interaction("warfarin", "ibuprofen", Severity::Moderate)];
        let out = score_interactions(&meds, &interactions, &DdiPolicy::default());
        // min(2, 1) = 1 occurrence
        assert_eq!(out.items[0].points, 3.0);
    }

    /// T-06: Many pairs saturate the subscore at 10.
    #[test]
    fn ddi_saturates_at_ten() {
        let names = ["a", "b", "c", "d", "e"];
        let meds: Vec<_> = names.iter().map(|n| make_med(n, None, None, "")).collect();
        let mut interactions = Vec::new();
        for (x, a) in names.iter().enumerate() {
            for b in names.iter().skip(x + 1) {
                interactions.push(interaction(a, b, Severity::Major));
            }
        }
        let out = score_interactions(&meds, &interactions, &DdiPolicy::default());
        assert_eq!(out.score, 10.0);
    }

    // --- Dose ---

    /// T-07: Dose within the limit contributes nothing.
    #[test]
    fn dose_within_limit_no_points() {
        let meds = vec![make_med("ibuprofen", Some(400.0), Some("mg"), "three times daily")];
        let mut per_med = vec![0.0];
        let out = score_doses(&meds, &DoseReference::default(), &DosePolicy::default(), &mut per_med);
        assert_eq!(out.raw, 0.0);
        assert_eq!(out.score, 0.0);
        assert!(out.modifiers.is_empty());
        assert_eq!(per_med[0], 0.0);
    }

    /// T-08: Daily total above the limit earns overage points at the
    /// entry's position.
    #[test]
    fn dose_overage_scores_proportionally() {
        // warfarin limit 15 mg/day; 15 mg twice daily = 30 mg/day, ratio 2.0
        let meds = vec![make_med("warfarin", Some(15.0), Some("mg"), "twice daily")];
        let mut per_med = vec![0.0];
        let out = score_doses(&meds, &DoseReference::default(), &DosePolicy::default(), &mut per_med);
        assert_eq!(out.raw, 6.0); // slope 6.0 * (2.0 - 1.0)
        assert_eq!(per_med[0], 6.0);
        assert!(!out.extreme_dose_present);
        assert_eq!(out.modifiers.len(), 1);
        assert!(out.modifiers[0].label.starts_with("Dose above daily limit: warfarin"));
    }

    /// T-09: Ratio at or beyond the extreme threshold flags the result
    /// and caps per-drug points.
    #[test]
    fn dose_extreme_is_flagged_and_capped() {
        // escitalopram limit 20 mg/day; 10000 mg/day is ratio 500
        let meds = vec![make_med("escitalopram", Some(10000.0), Some("mg"), "morning")];
        let mut per_med = vec![0.0];
        let out = score_doses(&meds, &DoseReference::default(), &DosePolicy::default(), &mut per_med);
        assert!(out.extreme_dose_present);
        assert_eq!(out.raw, 10.0, "capped per drug");
        assert_eq!(out.score, 10.0);
        assert!(out.modifiers[0].label.starts_with("Extreme dose concern"));
    }

    /// T-10: Unknown drug with a parsed dose surfaces a zero-point flag.
    #[test]
    fn dose_unknown_reference_is_flagged_zero() {
        let meds = vec![make_med("obscurol", Some(500.0), Some("mg"), "twice daily")];
        let mut per_med = vec![0.0];
        let out = score_doses(&meds, &DoseReference::default(), &DosePolicy::default(), &mut per_med);
        assert_eq!(out.raw, 0.0);
        assert_eq!(out.modifiers.len(), 1);
        assert_eq!(out.modifiers[0].points, 0.0);
        assert!(out.modifiers[0].label.starts_with("No dose reference"));
    }

    /// T-11: A unit outside the mass family is never compared.
    #[test]
    fn dose_unreconcilable_unit_is_flagged_zero() {
        let meds = vec![make_med("warfarin", Some(10.0), Some("ml"), "daily")];
        let mut per_med = vec![0.0];
        let out = score_doses(&meds, &DoseReference::default(), &DosePolicy::default(), &mut per_med);
        assert_eq!(out.raw, 0.0);
        assert_eq!(out.modifiers.len(), 1);
        assert!(out.modifiers[0].label.starts_with("Unreconcilable dose unit"));
    }

    /// T-12: Microgram doses reconcile before comparison.
    #[test]
    fn dose_mcg_reconciles_to_mg() {
        // levothyroxine limit 0.3 mg/day; 600 mcg = 0.6 mg, ratio 2.0
        let meds = vec![make_med("levothyroxine", Some(600.0), Some("mcg"), "morning")];
        let mut per_med = vec![0.0];
        let out = score_doses(&meds, &DoseReference::default(), &DosePolicy::default(), &mut per_med);
        assert_eq!(out.raw, 6.0);
    }

    // --- Vulnerability ---

    fn no_classes(n: usize) -> Vec<Vec<RiskClass>> {
        vec![Vec::new(); n]
    }

    /// T-13: Young patient on one resolved medication scores zero.
    #[test]
    fn vulnerability_baseline_zero() {
        let meds = vec![make_med("amoxicillin", Some(500.0), Some("mg"), "three times daily")];
        let mut per_med = vec![0.0];
        let out = score_vulnerability(&meds, &no_classes(1), 30, &VulnerabilityPolicy::default(), &mut per_med);
        assert_eq!(out.raw, 0.0);
        assert_eq!(out.score, 0.0);
        assert_eq!(out.med_count, 1);
    }

    /// T-14: Age steps contribute and are attributed across entries.
    #[test]
    fn vulnerability_age_points_shared() {
        let meds = vec![
            make_med("lisinopril", Some(10.0), Some("mg"), "daily"),
            make_med("metformin", Some(500.0), Some("mg"), "twice daily"),
        ];
        let mut per_med = vec![0.0, 0.0];
        let out = score_vulnerability(&meds, &no_classes(2), 82, &VulnerabilityPolicy::default(), &mut per_med);
        assert_eq!(out.age_points, 2.0);
        assert!((per_med[0] - 1.25).abs() < 1e-9); // 1.0 age share + 0.25 polypharmacy share
        assert_eq!(per_med[0], per_med[1]);
    }

    /// T-15: Each distinct class of a drug counts once, duplicates ignored.
    #[test]
    fn vulnerability_class_points_deduplicated() {
        let meds = vec![make_med("aspirin", Some(81.0), Some("mg"), "daily")];
        let classes = vec![vec![
            RiskClass::Antiplatelet,
            RiskClass::Nsaid,
            RiskClass::Antiplatelet,
        ]];
        let mut per_med = vec![0.0];
        let out = score_vulnerability(&meds, &classes, 40, &VulnerabilityPolicy::default(), &mut per_med);
        // antiplatelet 1.6 + nsaid 1.0, counted once each
        assert!((out.raw - 2.6).abs() < 1e-9);
        assert!(out.blood_thinner_present);
    }

    /// T-16: Elderly sedative bonus applies at the configured age.
    #[test]
    fn vulnerability_elderly_sedative_bonus() {
        let meds = vec![make_med("zolpidem", Some(5.0), Some("mg"), "bedtime")];
        let classes = vec![vec![RiskClass::Sedative]];
        let policy = VulnerabilityPolicy::default();

        let mut per_young = vec![0.0];
        let young = score_vulnerability(&meds, &classes, 50, &policy, &mut per_young);
        let mut per_old = vec![0.0];
        let old = score_vulnerability(&meds, &classes, 70, &policy, &mut per_old);

        // 70 adds age step 1.0 plus the 1.5 sedative bonus over the 50-year-old.
        assert!((old.raw - young.raw - 2.5).abs() < 1e-9);
        assert!(old
            .modifiers
            .iter()
            .any(|m| m.label == "Age 65+ with sedative present"));
    }

    /// T-17: Unresolved entries earn points and count toward polypharmacy.
    #[test]
    fn vulnerability_unresolved_counts() {
        let mut unresolved = make_med("mystery tonic", None, None, "daily");
        unresolved.external_id = None;
        let meds = vec![unresolved, make_med("metformin", Some(500.0), Some("mg"), "daily")];
        let mut per_med = vec![0.0, 0.0];
        let out = score_vulnerability(&meds, &no_classes(2), 40, &VulnerabilityPolicy::default(), &mut per_med);
        assert_eq!(out.med_count, 2);
        assert!(out
            .modifiers
            .iter()
            .any(|m| m.label == "Unresolved medication names (1)"));
        assert!(per_med[0] > per_med[1]);
    }

    /// T-18: High-risk substances flag and score on name alone.
    #[test]
    fn vulnerability_high_risk_substance() {
        let meds = vec![make_med("fentanyl patch", None, None, "every 72 hours")];
        let mut per_med = vec![0.0];
        let out = score_vulnerability(&meds, &no_classes(1), 40, &VulnerabilityPolicy::default(), &mut per_med);
        assert!(out.high_risk_substance_present);
        assert!(out
            .modifiers
            .iter()
            .any(|m| m.label == "High-risk substance: fentanyl"));
    }

    /// T-19: Polypharmacy alone escalates a long list.
    #[test]
    fn vulnerability_polypharmacy_scaling() {
        let meds: Vec<_> = (0..9)
            .map(|i| make_med(&format!("drug{i}"), Some(10.0), Some("mg"), "daily"))
            .collect();
        let mut per_med = vec![0.0; 9];
        let out = score_vulnerability(&meds, &no_classes(9), 70, &VulnerabilityPolicy::default(), &mut per_med);
        // age 1.0 + polypharmacy(9) = 1.5 + 5*0.8 = 5.5 -> 6.5 raw
        assert!((out.raw - 6.5).abs() < 1e-9);
        assert_eq!(out.score, 6.5);
    }
}
