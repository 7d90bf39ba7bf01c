use serde::{Deserialize, Deserializer, Serialize};

use super::enums::{ArrayField, SingleField};

/// One claim's worth of billing codes.
///
/// Used twice per review session: the AI baseline and the clinician's
/// working copy. `sdx` and `cpt` hold unique codes; their order carries
/// no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub admit_dx: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pdx: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sdx: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cpt: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub modifier: String,
}

impl CodeSet {
    pub fn single(&self, field: SingleField) -> &str {
        match field {
            SingleField::AdmitDx => &self.admit_dx,
            SingleField::Pdx => &self.pdx,
            SingleField::Modifier => &self.modifier,
        }
    }

    pub fn single_mut(&mut self, field: SingleField) -> &mut String {
        match field {
            SingleField::AdmitDx => &mut self.admit_dx,
            SingleField::Pdx => &mut self.pdx,
            SingleField::Modifier => &mut self.modifier,
        }
    }

    pub fn array(&self, field: ArrayField) -> &[String] {
        match field {
            ArrayField::Sdx => &self.sdx,
            ArrayField::Cpt => &self.cpt,
        }
    }

    pub fn array_mut(&mut self, field: ArrayField) -> &mut Vec<String> {
        match field {
            ArrayField::Sdx => &mut self.sdx,
            ArrayField::Cpt => &mut self.cpt,
        }
    }

    /// Drop repeated codes in the array fields, keeping first occurrences.
    pub fn dedup_arrays(&mut self) {
        for field in [ArrayField::Sdx, ArrayField::Cpt] {
            let codes = self.array_mut(field);
            let mut seen = std::collections::HashSet::new();
            codes.retain(|c| seen.insert(c.clone()));
        }
    }
}

impl CodeSet {
    /// Copy with every code normalized and array repeats dropped.
    pub fn normalized(&self) -> Self {
        let mut codes = Self {
            admit_dx: normalize_code(&self.admit_dx),
            pdx: normalize_code(&self.pdx),
            sdx: normalize_list(&self.sdx),
            cpt: normalize_list(&self.cpt),
            modifier: normalize_code(&self.modifier),
        };
        codes.dedup_arrays();
        codes
    }
}

fn normalize_list(codes: &[String]) -> Vec<String> {
    codes
        .iter()
        .map(|c| normalize_code(c))
        .filter(|c| !c.is_empty())
        .collect()
}

/// Narrative summaries produced by the extraction service, one per report.
/// Their inner shape belongs to the service and is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiSummary {
    #[serde(default)]
    pub hp: Option<serde_json::Value>,
    #[serde(default)]
    pub op: Option<serde_json::Value>,
}

/// Canonical form of a user-entered code: trimmed and upper-cased.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_code("  e11.9 "), "E11.9");
        assert_eq!(normalize_code("\t"), "");
    }

    #[test]
    fn deserializes_nulls_and_missing_fields_as_empty() {
        let json = r#"{"admit_dx": null, "pdx": "I21.4", "sdx": null}"#;
        let codes: CodeSet = serde_json::from_str(json).unwrap();
        assert_eq!(codes.admit_dx, "");
        assert_eq!(codes.pdx, "I21.4");
        assert!(codes.sdx.is_empty());
        assert!(codes.cpt.is_empty());
        assert_eq!(codes.modifier, "");
    }

    #[test]
    fn field_accessors_address_the_right_slot() {
        let mut codes = CodeSet::default();
        *codes.single_mut(SingleField::Pdx) = "K35.80".into();
        codes.array_mut(ArrayField::Cpt).push("44970".into());
        assert_eq!(codes.single(SingleField::Pdx), "K35.80");
        assert_eq!(codes.array(ArrayField::Cpt), ["44970".to_string()]);
        assert!(codes.array(ArrayField::Sdx).is_empty());
    }

    #[test]
    fn normalized_cleans_every_field() {
        let raw = CodeSet {
            admit_dx: " r07.9".into(),
            pdx: "i21.4 ".into(),
            sdx: vec!["e11.9".into(), "E11.9".into(), " ".into()],
            cpt: vec![" 93458".into()],
            modifier: "lt".into(),
        };
        let codes = raw.normalized();
        assert_eq!(codes.admit_dx, "R07.9");
        assert_eq!(codes.pdx, "I21.4");
        assert_eq!(codes.sdx, vec!["E11.9".to_string()]);
        assert_eq!(codes.cpt, vec!["93458".to_string()]);
        assert_eq!(codes.modifier, "LT");
    }

    #[test]
    fn ai_summary_tolerates_missing_reports() {
        let summary: AiSummary = serde_json::from_str(r#"{"hp": {"chief_complaint": "chest pain"}}"#).unwrap();
        assert_eq!(summary.hp.unwrap()["chief_complaint"], "chest pain");
        assert!(summary.op.is_none());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut codes = CodeSet {
            sdx: vec!["R10.9".into(), "K21.9".into(), "R10.9".into()],
            ..Default::default()
        };
        codes.dedup_arrays();
        assert_eq!(codes.sdx, vec!["R10.9".to_string(), "K21.9".to_string()]);
    }
}
