pub mod enums;
pub mod interaction;
pub mod medication;

pub use enums::{Confidence, InvalidEnumError, RiskClass, Severity, Urgency};
pub use interaction::{InteractionRecord, RiskClassMembership};
pub use medication::NormalizedMedication;
