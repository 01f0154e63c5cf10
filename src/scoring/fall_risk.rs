use crate::models::enums::RiskClass;

use super::types::FallRiskAssessment;

/// Inputs to the fall-risk heuristic: patient age and the risk classes
/// of each listed medication (aligned with the request list).
pub struct FallRiskInput<'a> {
    pub age: u32,
    pub med_classes: &'a [Vec<RiskClass>],
}

impl FallRiskInput<'_> {
    pub fn any_with(&self, class: RiskClass) -> bool {
        self.med_classes.iter().any(|c| c.contains(&class))
    }

    /// Number of medications holding at least one CNS-depressant class.
    pub fn cns_depressant_meds(&self) -> usize {
        self.med_classes
            .iter()
            .filter(|c| c.iter().any(|cl| cl.is_cns_depressant()))
            .count()
    }
}

/// One independent trigger rule: if the predicate matches, its reason is
/// included and the high-risk flag is set. Rules do not interact; adding
/// a rule never requires touching an existing one.
pub struct FallRiskRule {
    pub name: &'static str,
    pub reason: &'static str,
    pub triggers: fn(&FallRiskInput) -> bool,
}

/// The default rule set, evaluated in order.
pub fn default_rules() -> Vec<FallRiskRule> {
    vec![
        FallRiskRule {
            name: "sedative_present",
            reason: "Sedative medication present, which can increase drowsiness or balance problems.",
            triggers: |input| input.any_with(RiskClass::Sedative),
        },
        FallRiskRule {
            name: "opioid_present",
            reason: "Opioid medication present, which can cause drowsiness and unsteadiness.",
            triggers: |input| input.any_with(RiskClass::Opioid),
        },
        FallRiskRule {
            name: "elderly_antihypertensive",
            reason: "Age 75 or older with blood pressure medication, which can cause dizziness when standing.",
            triggers: |input| input.age >= 75 && input.any_with(RiskClass::Antihypertensive),
        },
        FallRiskRule {
            name: "elderly_diuretic",
            reason: "Age 65 or older with a diuretic, which can cause dehydration and dizziness.",
            triggers: |input| input.age >= 65 && input.any_with(RiskClass::Diuretic),
        },
        FallRiskRule {
            name: "multiple_cns_depressants",
            reason: "Two or more medicines that slow the nervous system are taken together.",
            triggers: |input| input.cns_depressant_meds() >= 2,
        },
    ]
}

/// Evaluate the rule list. Any single match sets the flag; reasons keep
/// rule order. Pure classification, no numeric score.
pub fn assess(rules: &[FallRiskRule], input: &FallRiskInput) -> FallRiskAssessment {
    let reasons: Vec<String> = rules
        .iter()
        .filter(|rule| (rule.triggers)(input))
        .map(|rule| rule.reason.to_string())
        .collect();

    FallRiskAssessment {
        is_high_risk: !reasons.is_empty(),
        reasons,
    }
}
