use std::collections::BTreeMap;
use std::time::Instant;

use crate::models::enums::RiskClass;
use crate::models::{InteractionRecord, NormalizedMedication, RiskClassMembership};

use super::confidence::derive_confidence;
use super::fall_risk::{self, FallRiskInput, FallRiskRule};
use super::helpers::{canonical, round2};
use super::policy::{PolicyError, ScoringPolicy};
use super::reference::DoseReference;
use super::subscores::{score_doses, score_interactions, score_vulnerability};
use super::types::{AnalysisResult, FallRiskAssessment, ScoreBreakdown, ScoreItem};

/// The medication risk scoring engine. Pure and stateless: `score` is a
/// deterministic function of its arguments, holds no locks, performs no
/// I/O, and retains nothing between calls, so one instance can serve
/// concurrent requests.
pub struct ScoringEngine {
    policy: ScoringPolicy,
    reference: DoseReference,
    fall_rules: Vec<FallRiskRule>,
}

impl ScoringEngine {
    /// Build an engine from a policy and reference table. Policy
    /// validation failures are fatal here, before any request is served.
    pub fn new(policy: ScoringPolicy, reference: DoseReference) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            policy,
            reference,
            fall_rules: fall_risk::default_rules(),
        })
    }

    /// Replace the fall-risk rule set.
    pub fn with_fall_risk_rules(mut self, rules: Vec<FallRiskRule>) -> Self {
        self.fall_rules = rules;
        self
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Score one analysis request. Total over its inputs: partial data
    /// degrades confidence, never fails, and an empty list degrades to a
    /// zero, low-confidence result.
    pub fn score(
        &self,
        meds: &[NormalizedMedication],
        interactions: &[InteractionRecord],
        risk_classes: &[RiskClassMembership],
        age: u32,
    ) -> AnalysisResult {
        let start = Instant::now();

        if meds.is_empty() {
            return AnalysisResult {
                risk_score: 0.0,
                urgency: self.policy.urgency.classify(0.0),
                fall_risk: FallRiskAssessment::none(),
                score_breakdown: ScoreBreakdown::empty(self.policy.max_raw()),
            };
        }

        let med_classes = self.collect_med_classes(meds, risk_classes);
        let mut per_med = vec![0.0; meds.len()];

        let ddi = score_interactions(meds, interactions, &self.policy.ddi);
        let dose = score_doses(meds, &self.reference, &self.policy.dose, &mut per_med);
        let vuln = score_vulnerability(
            meds,
            &med_classes,
            age,
            &self.policy.vulnerability,
            &mut per_med,
        );

        let weights = &self.policy.weights;
        let weighted_components = vec![
            ScoreItem::new(
                format!("DDI Risk x {:.2}", weights.ddi),
                round2(ddi.score * weights.ddi),
            ),
            ScoreItem::new(
                format!("Dose Safety x {:.2}", weights.dose),
                round2(dose.score * weights.dose),
            ),
            ScoreItem::new(
                format!("Patient Vulnerability x {:.2}", weights.vulnerability),
                round2(vuln.score * weights.vulnerability),
            ),
        ];
        let mut blended: f64 = weighted_components.iter().map(|c| c.points).sum();

        // Escalation floors: each raises, never lowers.
        let floors = &self.policy.floors;
        if vuln.high_risk_substance_present {
            blended = blended.max(floors.high_risk_substance);
        }
        if age >= floors.elderly_blood_thinner_min_age && vuln.blood_thinner_present {
            blended = blended.max(floors.elderly_blood_thinner);
        }
        if vuln.score >= floors.vulnerability_mid_trigger {
            blended = blended.max(floors.vulnerability_mid);
        }
        if vuln.score >= floors.vulnerability_high_trigger {
            blended = blended.max(floors.vulnerability_high);
        }
        if ddi.severe_pairs >= 1 {
            blended = blended.max(floors.severe_interaction);
        }
        if ddi.severe_pairs >= 2 {
            blended = blended.max(floors.multiple_severe_interactions);
        }
        if dose.extreme_dose_present {
            blended = blended.max(floors.extreme_dose);
        }
        for (count, floor) in &floors.med_count {
            if vuln.med_count >= *count {
                blended = blended.max(*floor);
            }
        }

        let risk_score = round2(blended.clamp(0.0, 10.0));
        let urgency = self.policy.urgency.classify(risk_score);
        let confidence = derive_confidence(meds);

        let fall_risk = fall_risk::assess(
            &self.fall_rules,
            &FallRiskInput {
                age,
                med_classes: &med_classes,
            },
        );

        // Attribution lines preserve the request's medication order.
        let per_med_impacts: Vec<ScoreItem> = meds
            .iter()
            .zip(&per_med)
            .map(|(med, points)| ScoreItem::new(med.display_label().to_string(), round2(*points)))
            .collect();
        let medication_points_total: f64 = per_med_impacts.iter().map(|i| i.points).sum();
        let interaction_points_total: f64 = ddi.items.iter().map(|i| i.points).sum();

        let mut medication_modifiers = vuln.modifiers;
        medication_modifiers.extend(dose.modifiers);

        let score_breakdown = ScoreBreakdown {
            interaction_items: ddi.items,
            interaction_points_total,
            age_points: vuln.age_points,
            medication_modifiers,
            per_med_impacts,
            medication_points_total,
            ddi_score: ddi.score,
            dose_score: dose.score,
            vulnerability_score: vuln.score,
            weighted_components,
            confidence,
            raw_total: interaction_points_total + medication_points_total,
            max_raw: self.policy.max_raw(),
            scaled_score: risk_score,
        };

        tracing::info!(
            med_count = meds.len(),
            ddi = ddi.score,
            dose = dose.score,
            vulnerability = vuln.score,
            risk_score,
            urgency = urgency.as_str(),
            confidence = confidence.as_str(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Risk analysis complete"
        );

        AnalysisResult {
            risk_score,
            urgency,
            fall_risk,
            score_breakdown,
        }
    }

    /// Align risk-class memberships with the medication list. First
    /// membership record per drug wins; drugs with no record get an empty
    /// class list (unknown, not safe).
    fn collect_med_classes(
        &self,
        meds: &[NormalizedMedication],
        risk_classes: &[RiskClassMembership],
    ) -> Vec<Vec<RiskClass>> {
        let mut by_drug: BTreeMap<String, &Vec<RiskClass>> = BTreeMap::new();
        for membership in risk_classes {
            by_drug
                .entry(canonical(&membership.drug))
                .or_insert(&membership.classes);
        }

        meds.iter()
            .map(|med| {
                by_drug
                    .get(&canonical(med.display_label()))
                    .map(|classes| (*classes).clone())
                    .unwrap_or_default()
            })
            .collect()
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::default(),
            reference: DoseReference::default(),
            fall_rules: fall_risk::default_rules(),
        }
    }
}
