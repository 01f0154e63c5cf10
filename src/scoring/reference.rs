use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::helpers::dose_to_mg;

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Reference data load failed ({0}): {1}")]
    Load(String, String),

    #[error("Reference data parse failed ({0}): {1}")]
    Parse(String, String),

    #[error("Unreconcilable dose unit '{unit}' for '{drug}' in limit table")]
    BadLimitUnit { drug: String, unit: String },
}

/// One row of an external dose-limit file: a conservative maximum safe
/// daily dose for a drug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseLimitEntry {
    pub name: String,
    pub max_daily_dose: f64,
    pub unit: String,
}

/// Brand-to-generic medication mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationAlias {
    pub brand_name: String,
    pub generic_name: String,
}

/// Engine-owned reference data: the dose limit table plus brand aliases.
/// This is configuration, not a network dependency; the default table
/// ships with the crate and external JSON files can replace it.
///
/// BTreeMaps keep substring lookups deterministic.
#[derive(Debug)]
pub struct DoseReference {
    limits_mg_per_day: BTreeMap<String, f64>,
    aliases: BTreeMap<String, String>,
}

impl DoseReference {
    /// Load reference data from external JSON files in place of the
    /// built-in table. Limit units are reconciled to mg at load time; an
    /// unknown unit fails the load rather than miscomparing later.
    pub fn from_json_files(limits_path: &Path, aliases_path: &Path) -> Result<Self, ReferenceError> {
        let limits_json = std::fs::read_to_string(limits_path)
            .map_err(|e| ReferenceError::Load(limits_path.display().to_string(), e.to_string()))?;
        let entries: Vec<DoseLimitEntry> = serde_json::from_str(&limits_json)
            .map_err(|e| ReferenceError::Parse(limits_path.display().to_string(), e.to_string()))?;

        let aliases_json = std::fs::read_to_string(aliases_path)
            .map_err(|e| ReferenceError::Load(aliases_path.display().to_string(), e.to_string()))?;
        let alias_entries: Vec<MedicationAlias> = serde_json::from_str(&aliases_json)
            .map_err(|e| ReferenceError::Parse(aliases_path.display().to_string(), e.to_string()))?;

        let mut limits_mg_per_day = BTreeMap::new();
        for entry in entries {
            let mg = dose_to_mg(entry.max_daily_dose, Some(&entry.unit)).ok_or_else(|| {
                ReferenceError::BadLimitUnit {
                    drug: entry.name.clone(),
                    unit: entry.unit.clone(),
                }
            })?;
            limits_mg_per_day.insert(entry.name.trim().to_lowercase(), mg);
        }

        let aliases = alias_entries
            .into_iter()
            .map(|a| {
                (
                    a.brand_name.trim().to_lowercase(),
                    a.generic_name.trim().to_lowercase(),
                )
            })
            .collect();

        Ok(Self {
            limits_mg_per_day,
            aliases,
        })
    }

    /// Resolve a medication name to its canonical lowercase form, mapping
    /// brand names (or names containing one) to the generic.
    pub fn canonical_name(&self, name: &str) -> String {
        let n = name.trim().to_lowercase();
        for (brand, generic) in &self.aliases {
            if n.contains(brand.as_str()) {
                return generic.clone();
            }
        }
        n
    }

    /// Conservative maximum safe daily dose in mg, if the drug is known.
    /// Substring-tolerant so "aspirin low-dose" still finds aspirin.
    pub fn daily_limit_mg(&self, canonical: &str) -> Option<f64> {
        if let Some(limit) = self.limits_mg_per_day.get(canonical) {
            return Some(*limit);
        }
        self.limits_mg_per_day
            .iter()
            .find(|(drug, _)| canonical.contains(drug.as_str()))
            .map(|(_, limit)| *limit)
    }
}

impl Default for DoseReference {
    fn default() -> Self {
        Self {
            limits_mg_per_day: DEFAULT_DAILY_LIMITS_MG
                .iter()
                .map(|(name, mg)| (name.to_string(), *mg))
                .collect(),
            aliases: DEFAULT_ALIASES
                .iter()
                .map(|(brand, generic)| (brand.to_string(), generic.to_string()))
                .collect(),
        }
    }
}

/// Conservative maximum daily dose references (mg/day) for common
/// medicines. Deliberately conservative: the table drives a risk flag,
/// not a prescribing decision.
const DEFAULT_DAILY_LIMITS_MG: &[(&str, f64)] = &[
    ("acetaminophen", 4000.0),
    ("ibuprofen", 3200.0),
    ("naproxen", 1000.0),
    ("aspirin", 4000.0),
    ("diclofenac", 150.0),
    ("meloxicam", 15.0),
    ("celecoxib", 400.0),
    ("prednisone", 80.0),
    ("methylprednisolone", 48.0),
    ("dexamethasone", 10.0),
    ("warfarin", 15.0),
    ("apixaban", 20.0),
    ("rivaroxaban", 20.0),
    ("dabigatran", 300.0),
    ("edoxaban", 60.0),
    ("enoxaparin", 200.0),
    ("clopidogrel", 75.0),
    ("prasugrel", 10.0),
    ("ticagrelor", 180.0),
    ("lisinopril", 80.0),
    ("losartan", 100.0),
    ("valsartan", 320.0),
    ("olmesartan", 40.0),
    ("amlodipine", 10.0),
    ("nifedipine", 120.0),
    ("diltiazem", 480.0),
    ("verapamil", 480.0),
    ("metoprolol", 400.0),
    ("atenolol", 100.0),
    ("carvedilol", 100.0),
    ("propranolol", 320.0),
    ("hydrochlorothiazide", 50.0),
    ("furosemide", 600.0),
    ("spironolactone", 200.0),
    ("chlorthalidone", 100.0),
    ("atorvastatin", 80.0),
    ("rosuvastatin", 40.0),
    ("simvastatin", 40.0),
    ("pravastatin", 80.0),
    ("ezetimibe", 10.0),
    ("metformin", 2550.0),
    ("glipizide", 40.0),
    ("glyburide", 20.0),
    ("glimepiride", 8.0),
    ("empagliflozin", 25.0),
    ("dapagliflozin", 10.0),
    ("canagliflozin", 300.0),
    ("sitagliptin", 100.0),
    ("linagliptin", 5.0),
    ("levothyroxine", 0.3),
    ("omeprazole", 40.0),
    ("esomeprazole", 40.0),
    ("pantoprazole", 80.0),
    ("famotidine", 40.0),
    ("ondansetron", 24.0),
    ("metoclopramide", 40.0),
    ("loperamide", 16.0),
    ("sertraline", 200.0),
    ("fluoxetine", 80.0),
    ("escitalopram", 20.0),
    ("citalopram", 40.0),
    ("paroxetine", 60.0),
    ("venlafaxine", 375.0),
    ("duloxetine", 120.0),
    ("bupropion", 450.0),
    ("mirtazapine", 45.0),
    ("trazodone", 400.0),
    ("quetiapine", 800.0),
    ("olanzapine", 20.0),
    ("risperidone", 16.0),
    ("haloperidol", 20.0),
    ("clozapine", 900.0),
    ("aripiprazole", 30.0),
    ("alprazolam", 10.0),
    ("diazepam", 40.0),
    ("lorazepam", 10.0),
    ("clonazepam", 20.0),
    ("zolpidem", 10.0),
    ("temazepam", 30.0),
    ("eszopiclone", 3.0),
    ("gabapentin", 3600.0),
    ("pregabalin", 600.0),
    ("carbamazepine", 1600.0),
    ("lamotrigine", 500.0),
    ("valproate", 3000.0),
    ("levetiracetam", 3000.0),
    ("topiramate", 400.0),
    ("phenytoin", 600.0),
    ("baclofen", 80.0),
    ("cyclobenzaprine", 30.0),
    ("tizanidine", 36.0),
    ("hydroxyzine", 400.0),
    ("diphenhydramine", 300.0),
    ("cetirizine", 10.0),
    ("loratadine", 10.0),
    ("fexofenadine", 180.0),
    ("montelukast", 10.0),
    ("morphine", 200.0),
    ("oxycodone", 160.0),
    ("hydrocodone", 120.0),
    ("codeine", 360.0),
    ("tramadol", 400.0),
    ("methadone", 120.0),
    ("buprenorphine", 32.0),
    ("amoxicillin", 3000.0),
    ("azithromycin", 500.0),
    ("doxycycline", 200.0),
    ("ciprofloxacin", 1500.0),
    ("levofloxacin", 750.0),
    ("cephalexin", 4000.0),
    ("nitrofurantoin", 400.0),
    ("acyclovir", 4000.0),
    ("valacyclovir", 3000.0),
    ("oseltamivir", 150.0),
    ("allopurinol", 800.0),
    ("colchicine", 1.8),
    ("tamsulosin", 0.8),
    ("finasteride", 5.0),
    ("sildenafil", 100.0),
    ("tadalafil", 20.0),
    ("donepezil", 10.0),
    ("memantine", 20.0),
    ("sumatriptan", 200.0),
];

/// Common brand names mapped to generics, for dose-limit lookup when the
/// normalizer passes through a brand name.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("valium", "diazepam"),
    ("xanax", "alprazolam"),
    ("ativan", "lorazepam"),
    ("klonopin", "clonazepam"),
    ("coumadin", "warfarin"),
    ("advil", "ibuprofen"),
    ("motrin", "ibuprofen"),
    ("tylenol", "acetaminophen"),
    ("norvasc", "amlodipine"),
    ("lipitor", "atorvastatin"),
    ("zocor", "simvastatin"),
    ("crestor", "rosuvastatin"),
    ("glucophage", "metformin"),
    ("zoloft", "sertraline"),
    ("prozac", "fluoxetine"),
    ("lexapro", "escitalopram"),
    ("celexa", "citalopram"),
    ("wellbutrin", "bupropion"),
    ("seroquel", "quetiapine"),
    ("abilify", "aripiprazole"),
    ("neurontin", "gabapentin"),
    ("lyrica", "pregabalin"),
    ("prilosec", "omeprazole"),
    ("nexium", "esomeprazole"),
    ("pepcid", "famotidine"),
    ("lasix", "furosemide"),
    ("zestril", "lisinopril"),
    ("cozaar", "losartan"),
    ("diovan", "valsartan"),
    ("eliquis", "apixaban"),
    ("xarelto", "rivaroxaban"),
    ("plavix", "clopidogrel"),
    ("brilinta", "ticagrelor"),
    ("baby aspirin", "aspirin"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_name_resolves_brands() {
        let reference = DoseReference::default();
        assert_eq!(reference.canonical_name("Coumadin"), "warfarin");
        assert_eq!(reference.canonical_name("ADVIL"), "ibuprofen");
        assert_eq!(reference.canonical_name("baby aspirin 81mg"), "aspirin");
        assert_eq!(reference.canonical_name("metformin"), "metformin");
    }

    #[test]
    fn canonical_name_passes_through_unknown() {
        let reference = DoseReference::default();
        assert_eq!(reference.canonical_name(" Obscurol "), "obscurol");
    }

    #[test]
    fn daily_limit_known_drug() {
        let reference = DoseReference::default();
        assert_eq!(reference.daily_limit_mg("warfarin"), Some(15.0));
        assert_eq!(reference.daily_limit_mg("ibuprofen"), Some(3200.0));
        assert_eq!(reference.daily_limit_mg("levothyroxine"), Some(0.3));
    }

    #[test]
    fn daily_limit_substring_tolerant() {
        let reference = DoseReference::default();
        assert_eq!(reference.daily_limit_mg("aspirin low-dose"), Some(4000.0));
    }

    #[test]
    fn daily_limit_unknown_drug() {
        let reference = DoseReference::default();
        assert_eq!(reference.daily_limit_mg("obscurol"), None);
    }

    #[test]
    fn json_load_reconciles_units() {
        let dir = std::env::temp_dir().join("medrisk_ref_test");
        std::fs::create_dir_all(&dir).unwrap();
        let limits = dir.join("limits.json");
        let aliases = dir.join("aliases.json");
        std::fs::write(
            &limits,
            r#"[{"name": "Levothyroxine", "max_daily_dose": 300.0, "unit": "mcg"}]"#,
        )
        .unwrap();
        std::fs::write(
            &aliases,
            r#"[{"brand_name": "Synthroid", "generic_name": "levothyroxine"}]"#,
        )
        .unwrap();

        let reference = DoseReference::from_json_files(&limits, &aliases).unwrap();
        assert_eq!(reference.daily_limit_mg("levothyroxine"), Some(0.3));
        assert_eq!(reference.canonical_name("Synthroid"), "levothyroxine");
    }

    #[test]
    fn json_load_rejects_unknown_unit() {
        let dir = std::env::temp_dir().join("medrisk_ref_unit_test");
        std::fs::create_dir_all(&dir).unwrap();
        let limits = dir.join("limits.json");
        let aliases = dir.join("aliases.json");
        std::fs::write(
            &limits,
            r#"[{"name": "insulin", "max_daily_dose": 100.0, "unit": "units"}]"#,
        )
        .unwrap();
        std::fs::write(&aliases, "[]").unwrap();

        let err = DoseReference::from_json_files(&limits, &aliases).unwrap_err();
        assert!(matches!(err, ReferenceError::BadLimitUnit { .. }));
    }
}
