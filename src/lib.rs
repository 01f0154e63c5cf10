pub mod config;
pub mod models;
pub mod scoring;

pub use models::{
    Confidence, InteractionRecord, NormalizedMedication, RiskClass, RiskClassMembership,
    Severity, Urgency,
};
pub use scoring::{
    AnalysisResult, DoseReference, FallRiskAssessment, PolicyError, ScoreBreakdown, ScoreItem,
    ScoringEngine, ScoringPolicy,
};
