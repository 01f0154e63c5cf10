use serde::{Deserialize, Serialize};

use crate::models::enums::{Confidence, Urgency};

// ---------------------------------------------------------------------------
// ScoreItem
// ---------------------------------------------------------------------------

/// One labeled line of a score breakdown. Every itemized list in the
/// breakdown (interaction pairs, modifiers, per-medication impacts,
/// weighted components) uses this shape so the narrative layer and the
/// report renderer can treat them uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreItem {
    pub label: String,
    pub points: f64,
}

impl ScoreItem {
    pub fn new(label: impl Into<String>, points: f64) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }
}

// ---------------------------------------------------------------------------
// ScoreBreakdown
// ---------------------------------------------------------------------------

/// Full itemized explanation of one analysis. Constructed fresh per
/// request, never mutated after return, never persisted.
///
/// Invariants upheld by the engine:
/// - every subscore and scaled_score lie in [0, 10];
/// - per_med_impacts preserves the input medication order, one entry per
///   entry in the request, and its points sum to medication_points_total;
/// - interaction_points_total equals the sum of interaction_items points;
/// - raw_total = interaction_points_total + medication_points_total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub interaction_items: Vec<ScoreItem>,
    pub interaction_points_total: f64,
    pub age_points: f64,
    pub medication_modifiers: Vec<ScoreItem>,
    pub per_med_impacts: Vec<ScoreItem>,
    pub medication_points_total: f64,
    pub ddi_score: f64,
    pub dose_score: f64,
    pub vulnerability_score: f64,
    pub weighted_components: Vec<ScoreItem>,
    pub confidence: Confidence,
    pub raw_total: f64,
    pub max_raw: f64,
    pub scaled_score: f64,
}

impl ScoreBreakdown {
    /// The all-zero breakdown returned for a request with no scoreable
    /// medications. Low confidence by definition.
    pub fn empty(max_raw: f64) -> Self {
        Self {
            interaction_items: Vec::new(),
            interaction_points_total: 0.0,
            age_points: 0.0,
            medication_modifiers: Vec::new(),
            per_med_impacts: Vec::new(),
            medication_points_total: 0.0,
            ddi_score: 0.0,
            dose_score: 0.0,
            vulnerability_score: 0.0,
            weighted_components: Vec::new(),
            confidence: Confidence::Low,
            raw_total: 0.0,
            max_raw,
            scaled_score: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// FallRiskAssessment
// ---------------------------------------------------------------------------

/// Outcome of the fall-risk heuristic: a flag plus one reason per
/// triggered rule. No numeric score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallRiskAssessment {
    pub is_high_risk: bool,
    pub reasons: Vec<String>,
}

impl FallRiskAssessment {
    pub fn none() -> Self {
        Self {
            is_high_risk: false,
            reasons: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisResult
// ---------------------------------------------------------------------------

/// Top-level output of one scoring request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub risk_score: f64,
    pub urgency: Urgency,
    pub fall_risk: FallRiskAssessment,
    pub score_breakdown: ScoreBreakdown,
}
