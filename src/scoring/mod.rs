pub mod confidence;
pub mod engine;
pub mod fall_risk;
pub mod helpers;
pub mod policy;
pub mod reference;
pub mod subscores;
pub mod types;

pub use engine::ScoringEngine;
pub use policy::{PolicyError, ScoringPolicy};
pub use reference::{DoseReference, ReferenceError};
pub use types::{AnalysisResult, FallRiskAssessment, ScoreBreakdown, ScoreItem};
