use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnumError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr + serde-as-string.
/// Serialization goes through as_str so the wire format matches the mapped
/// strings exactly (e.g. "GREEN_MONITOR", not the variant name).
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnumError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(Severity {
    Minor => "minor",
    Moderate => "moderate",
    Major => "major",
    Contraindicated => "contraindicated",
    Unknown => "unknown",
});

impl Severity {
    /// Classify a free-text severity label from an interaction source.
    /// Sources phrase severity inconsistently ("high", "major", "significant",
    /// "contraindicated drug combination"); anything unrecognized falls back
    /// to Unknown rather than being dropped.
    pub fn classify(label: &str) -> Self {
        let l = label.trim().to_lowercase();
        if l.is_empty() {
            return Self::Unknown;
        }
        if l.contains("contra") {
            return Self::Contraindicated;
        }
        if l.contains("major") || l.contains("high") || l.contains("severe") {
            return Self::Major;
        }
        if l.contains("moderate") || l.contains("significant") {
            return Self::Moderate;
        }
        if l.contains("minor") || l.contains("low") || l.contains("mild") {
            return Self::Minor;
        }
        Self::Unknown
    }
}

str_enum!(RiskClass {
    Anticoagulant => "anticoagulant",
    Antiplatelet => "antiplatelet",
    Sedative => "sedative",
    Opioid => "opioid",
    Antipsychotic => "antipsychotic",
    Insulin => "insulin",
    Hypoglycemic => "hypoglycemic",
    Nsaid => "nsaid",
    Antihypertensive => "antihypertensive",
    Diuretic => "diuretic",
});

impl RiskClass {
    /// Classes that depress the central nervous system; used by the
    /// fall-risk heuristic.
    pub fn is_cns_depressant(&self) -> bool {
        matches!(self, Self::Sedative | Self::Opioid | Self::Antipsychotic)
    }

    /// Classes that impair clotting; used by the elderly-blood-thinner
    /// escalation floor.
    pub fn is_blood_thinner(&self) -> bool {
        matches!(self, Self::Anticoagulant | Self::Antiplatelet)
    }
}

str_enum!(Urgency {
    GreenMonitor => "GREEN_MONITOR",
    YellowCallSoon => "YELLOW_CALL_SOON",
    RedUrgent => "RED_URGENT",
});

str_enum!(Confidence {
    High => "high",
    Medium => "medium",
    Low => "low",
});
