use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::enums::{RiskClass, Severity, Urgency};

// ---------------------------------------------------------------------------
// PolicyError
// ---------------------------------------------------------------------------

/// Configuration-validation failures. These are fatal at engine
/// construction and never silently corrected.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Subscore weights must each lie in [0, 1] and sum to 1.0 (got sum {sum})")]
    InvalidWeights { sum: f64 },

    #[error("Urgency thresholds must satisfy 0 < mid < high <= 10 (mid {mid}, high {high})")]
    UnorderedUrgencyThresholds { mid: f64, high: f64 },

    #[error("Severity points must be non-negative and monotonic across minor/moderate/major/contraindicated")]
    NonMonotonicSeverityPoints,

    #[error("Unknown-severity points must lie within [0, major]")]
    UnknownSeverityOutOfRange,

    #[error("Age steps must be strictly increasing in age and non-decreasing in points")]
    NonMonotonicAgeSteps,

    #[error("{which} normalization ceiling must be positive")]
    InvalidCeiling { which: &'static str },

    #[error("Negative points are not allowed in the {table} table")]
    NegativePoints { table: &'static str },

    #[error("Polypharmacy tier starts must satisfy 2 <= mid_start < high_start")]
    InvalidPolypharmacyTiers,

    #[error("Medication-count floors must be strictly increasing in count")]
    UnorderedMedCountFloors,
}

// ---------------------------------------------------------------------------
// DDI policy
// ---------------------------------------------------------------------------

/// Severity-to-points table for pairwise interactions; contraindicated
/// is the tier above major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityPoints {
    pub minor: f64,
    pub moderate: f64,
    pub major: f64,
    pub contraindicated: f64,
    pub unknown: f64,
}

impl SeverityPoints {
    pub fn points_for(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Minor => self.minor,
            Severity::Moderate => self.moderate,
            Severity::Major => self.major,
            Severity::Contraindicated => self.contraindicated,
            Severity::Unknown => self.unknown,
        }
    }
}

impl Default for SeverityPoints {
    fn default() -> Self {
        Self {
            minor: 1.0,
            moderate: 3.0,
            major: 7.0,
            contraindicated: 10.0,
            unknown: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdiPolicy {
    pub severity_points: SeverityPoints,
    /// Raw points at or above which the DDI subscore saturates at 10.
    pub ceiling: f64,
    /// Interaction-burden bonus: scales with pair count so many small
    /// interactions still register.
    pub burden_per_pair: f64,
    pub burden_per_severe: f64,
    pub burden_cap: f64,
}

impl Default for DdiPolicy {
    fn default() -> Self {
        Self {
            severity_points: SeverityPoints::default(),
            ceiling: 12.0,
            burden_per_pair: 0.6,
            burden_per_severe: 1.2,
            burden_cap: 8.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Dose policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DosePolicy {
    /// Points per unit of overage ratio beyond 1.0. A daily dose at twice
    /// the limit earns one slope of points.
    pub overage_slope: f64,
    /// Per-medication cap so one extreme outlier cannot saturate the
    /// whole subscore alone.
    pub per_drug_cap: f64,
    /// Overage ratio at or above which the extreme-dose escalation floor
    /// applies.
    pub extreme_ratio: f64,
    /// Raw points at or above which the dose subscore saturates at 10.
    pub ceiling: f64,
}

impl Default for DosePolicy {
    fn default() -> Self {
        Self {
            overage_slope: 6.0,
            per_drug_cap: 10.0,
            extreme_ratio: 3.0,
            ceiling: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Vulnerability policy
// ---------------------------------------------------------------------------

/// One step of the age point function: applies to ages >= min_age.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeStep {
    pub min_age: u32,
    pub points: f64,
}

/// Piecewise-linear polypharmacy curve. Points accrue per medication
/// beyond the first, at a steeper rate through the classic >= 5 signal
/// band, flattening again for very long lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolypharmacyPolicy {
    pub low_per_med: f64,
    /// First count of the middle tier.
    pub mid_start: usize,
    pub mid_per_med: f64,
    /// First count of the top tier.
    pub high_start: usize,
    pub high_per_med: f64,
}

impl PolypharmacyPolicy {
    pub fn points_for(&self, count: usize) -> f64 {
        if count <= 1 {
            return 0.0;
        }
        let n = count as f64;
        let low_end = (self.mid_start - 1) as f64;
        let mid_end = (self.high_start - 1) as f64;
        if count < self.mid_start {
            (n - 1.0) * self.low_per_med
        } else if count < self.high_start {
            (low_end - 1.0) * self.low_per_med + (n - low_end) * self.mid_per_med
        } else {
            (low_end - 1.0) * self.low_per_med
                + (mid_end - low_end) * self.mid_per_med
                + (n - mid_end) * self.high_per_med
        }
    }
}

impl Default for PolypharmacyPolicy {
    fn default() -> Self {
        Self {
            low_per_med: 0.5,
            mid_start: 5,
            mid_per_med: 0.8,
            high_start: 11,
            high_per_med: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilityPolicy {
    pub age_steps: Vec<AgeStep>,
    pub polypharmacy: PolypharmacyPolicy,
    /// Fixed points per risk-class membership. A drug holding several
    /// classes earns each class once.
    pub risk_class_points: Vec<(RiskClass, f64)>,
    /// Points per medication the terminology adapter failed to resolve.
    pub unresolved_per_med: f64,
    pub unresolved_cap: f64,
    /// Extra points when a sedative is present at or beyond this age.
    pub elderly_sedative_min_age: u32,
    pub elderly_sedative_bonus: f64,
    /// Substances scored on name alone, independent of class data.
    pub high_risk_substances: Vec<(String, f64)>,
    /// Raw points at or above which the subscore saturates at 10.
    pub ceiling: f64,
}

impl VulnerabilityPolicy {
    pub fn age_points(&self, age: u32) -> f64 {
        self.age_steps
            .iter()
            .rev()
            .find(|step| age >= step.min_age)
            .map(|step| step.points)
            .unwrap_or(0.0)
    }

    pub fn class_points(&self, class: RiskClass) -> f64 {
        self.risk_class_points
            .iter()
            .find(|(c, _)| *c == class)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }
}

impl Default for VulnerabilityPolicy {
    fn default() -> Self {
        Self {
            age_steps: vec![
                AgeStep { min_age: 65, points: 1.0 },
                AgeStep { min_age: 75, points: 2.0 },
                AgeStep { min_age: 85, points: 3.0 },
            ],
            polypharmacy: PolypharmacyPolicy::default(),
            risk_class_points: vec![
                (RiskClass::Anticoagulant, 2.5),
                (RiskClass::Opioid, 2.5),
                (RiskClass::Sedative, 2.0),
                (RiskClass::Antipsychotic, 1.8),
                (RiskClass::Insulin, 1.8),
                (RiskClass::Antiplatelet, 1.6),
                (RiskClass::Hypoglycemic, 1.2),
                (RiskClass::Nsaid, 1.0),
                (RiskClass::Antihypertensive, 0.8),
                (RiskClass::Diuretic, 0.8),
            ],
            unresolved_per_med: 0.8,
            unresolved_cap: 5.0,
            elderly_sedative_min_age: 65,
            elderly_sedative_bonus: 1.5,
            high_risk_substances: vec![
                ("cocaine".into(), 8.0),
                ("heroin".into(), 8.0),
                ("methamphetamine".into(), 8.0),
                ("fentanyl".into(), 6.0),
            ],
            ceiling: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Composite policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscoreWeights {
    pub ddi: f64,
    pub dose: f64,
    pub vulnerability: f64,
}

impl SubscoreWeights {
    pub fn sum(&self) -> f64 {
        self.ddi + self.dose + self.vulnerability
    }
}

impl Default for SubscoreWeights {
    fn default() -> Self {
        Self {
            ddi: 0.5,
            dose: 0.3,
            vulnerability: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrgencyThresholds {
    pub mid: f64,
    pub high: f64,
}

impl UrgencyThresholds {
    /// Deterministic, total mapping from risk score to urgency tier. The
    /// three ranges are contiguous and exhaustive over [0, 10].
    pub fn classify(&self, score: f64) -> Urgency {
        if score >= self.high {
            Urgency::RedUrgent
        } else if score >= self.mid {
            Urgency::YellowCallSoon
        } else {
            Urgency::GreenMonitor
        }
    }
}

impl Default for UrgencyThresholds {
    fn default() -> Self {
        Self { mid: 4.0, high: 7.5 }
    }
}

/// Hard safety floors applied after the weighted blend. Each raises the
/// composite to at least the given value when its trigger holds; none can
/// lower it, keeping the composite monotonic in every subscore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationFloors {
    pub high_risk_substance: f64,
    pub elderly_blood_thinner_min_age: u32,
    pub elderly_blood_thinner: f64,
    pub vulnerability_mid_trigger: f64,
    pub vulnerability_mid: f64,
    pub vulnerability_high_trigger: f64,
    pub vulnerability_high: f64,
    pub severe_interaction: f64,
    pub multiple_severe_interactions: f64,
    pub extreme_dose: f64,
    /// (medication count, floor) pairs, strictly increasing in count.
    pub med_count: Vec<(usize, f64)>,
}

impl Default for EscalationFloors {
    fn default() -> Self {
        Self {
            high_risk_substance: 7.5,
            elderly_blood_thinner_min_age: 75,
            elderly_blood_thinner: 4.2,
            vulnerability_mid_trigger: 6.0,
            vulnerability_mid: 4.0,
            vulnerability_high_trigger: 8.0,
            vulnerability_high: 6.0,
            severe_interaction: 7.0,
            multiple_severe_interactions: 8.5,
            extreme_dose: 8.8,
            med_count: vec![(10, 6.5), (20, 8.0), (50, 9.0)],
        }
    }
}

// ---------------------------------------------------------------------------
// ScoringPolicy
// ---------------------------------------------------------------------------

/// The complete tunable policy for one engine instance. Immutable after
/// construction; validated once, fatally, when the engine is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub ddi: DdiPolicy,
    pub dose: DosePolicy,
    pub vulnerability: VulnerabilityPolicy,
    pub weights: SubscoreWeights,
    pub urgency: UrgencyThresholds,
    pub floors: EscalationFloors,
}

impl ScoringPolicy {
    /// Theoretical raw-point ceiling across the three subscores; reported
    /// as max_raw in every breakdown.
    pub fn max_raw(&self) -> f64 {
        self.ddi.ceiling + self.dose.ceiling + self.vulnerability.ceiling
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        let sp = &self.ddi.severity_points;
        if sp.minor < 0.0
            || sp.minor > sp.moderate
            || sp.moderate > sp.major
            || sp.major > sp.contraindicated
        {
            return Err(PolicyError::NonMonotonicSeverityPoints);
        }
        if sp.unknown < 0.0 || sp.unknown > sp.major {
            return Err(PolicyError::UnknownSeverityOutOfRange);
        }
        if self.ddi.burden_per_pair < 0.0
            || self.ddi.burden_per_severe < 0.0
            || self.ddi.burden_cap < 0.0
        {
            return Err(PolicyError::NegativePoints { table: "interaction burden" });
        }

        if self.ddi.ceiling <= 0.0 {
            return Err(PolicyError::InvalidCeiling { which: "DDI" });
        }
        if self.dose.ceiling <= 0.0 {
            return Err(PolicyError::InvalidCeiling { which: "dose" });
        }
        if self.vulnerability.ceiling <= 0.0 {
            return Err(PolicyError::InvalidCeiling { which: "vulnerability" });
        }
        if self.dose.overage_slope < 0.0 || self.dose.per_drug_cap < 0.0 {
            return Err(PolicyError::NegativePoints { table: "dose overage" });
        }

        let steps = &self.vulnerability.age_steps;
        let ages_increase = steps.windows(2).all(|w| w[0].min_age < w[1].min_age);
        let points_monotone = steps.windows(2).all(|w| w[0].points <= w[1].points);
        if !ages_increase || !points_monotone || steps.iter().any(|s| s.points < 0.0) {
            return Err(PolicyError::NonMonotonicAgeSteps);
        }

        let poly = &self.vulnerability.polypharmacy;
        if poly.mid_start < 2 || poly.high_start <= poly.mid_start {
            return Err(PolicyError::InvalidPolypharmacyTiers);
        }
        if poly.low_per_med < 0.0 || poly.mid_per_med < 0.0 || poly.high_per_med < 0.0 {
            return Err(PolicyError::NegativePoints { table: "polypharmacy" });
        }
        if self.vulnerability.risk_class_points.iter().any(|(_, p)| *p < 0.0) {
            return Err(PolicyError::NegativePoints { table: "risk class" });
        }
        if self.vulnerability.high_risk_substances.iter().any(|(_, p)| *p < 0.0) {
            return Err(PolicyError::NegativePoints { table: "high-risk substance" });
        }
        if self.vulnerability.unresolved_per_med < 0.0
            || self.vulnerability.unresolved_cap < 0.0
            || self.vulnerability.elderly_sedative_bonus < 0.0
        {
            return Err(PolicyError::NegativePoints { table: "vulnerability modifier" });
        }

        let w = &self.weights;
        let in_range = |x: f64| (0.0..=1.0).contains(&x);
        if !in_range(w.ddi)
            || !in_range(w.dose)
            || !in_range(w.vulnerability)
            || (w.sum() - 1.0).abs() > 1e-6
        {
            return Err(PolicyError::InvalidWeights { sum: w.sum() });
        }

        let u = &self.urgency;
        if !(u.mid > 0.0 && u.high > u.mid && u.high <= 10.0) {
            return Err(PolicyError::UnorderedUrgencyThresholds { mid: u.mid, high: u.high });
        }

        let counts_increase = self
            .floors
            .med_count
            .windows(2)
            .all(|w| w[0].0 < w[1].0);
        if !counts_increase {
            return Err(PolicyError::UnorderedMedCountFloors);
        }

        Ok(())
    }
}
