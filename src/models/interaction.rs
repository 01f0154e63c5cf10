use serde::{Deserialize, Serialize};

use super::enums::{RiskClass, Severity};

/// A known pairwise interaction supplied by the interaction knowledge
/// lookup for one analysis request. Drug identities are normalized names;
/// the pair is unordered (a record for (a, b) covers (b, a) as well).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub drug_a: String,
    pub drug_b: String,
    pub severity: Severity,
    pub description: String,
}

impl InteractionRecord {
    /// Canonical unordered key for this pair, used to count each pair
    /// exactly once regardless of record or list order.
    pub fn pair_key(&self) -> (String, String) {
        let a = self.drug_a.trim().to_lowercase();
        let b = self.drug_b.trim().to_lowercase();
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// Risk-class memberships for one drug, supplied alongside the
/// interaction records. Absence of a membership record means "unknown",
/// which contributes nothing; it is never inferred as safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskClassMembership {
    pub drug: String,
    pub classes: Vec<RiskClass>,
}
