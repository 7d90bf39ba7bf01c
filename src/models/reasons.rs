//! Fixed taxonomy of justifications a clinician must pick for every edit.

use serde::Serialize;

use super::enums::ReasonCategory;

/// A selectable justification for one kind of edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditReason {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub category: ReasonCategory,
}

const fn reason(
    id: &'static str,
    label: &'static str,
    description: &'static str,
    category: ReasonCategory,
) -> EditReason {
    EditReason {
        id,
        label,
        description,
        category,
    }
}

pub const REMOVAL_REASONS: [EditReason; 10] = [
    reason("not_documented", "Not documented in chart", "Code not supported by documentation", ReasonCategory::Removal),
    reason("incorrect_code", "Incorrect code selected", "Wrong ICD/CPT code for the condition", ReasonCategory::Removal),
    reason("more_specific", "More specific code available", "A more specific code should be used", ReasonCategory::Removal),
    reason("not_billable", "Not billable", "Code is not billable for this encounter", ReasonCategory::Removal),
    reason("duplicate", "Duplicate code", "Code already captured elsewhere", ReasonCategory::Removal),
    reason("sequencing_error", "Sequencing error", "Code is in wrong position/order", ReasonCategory::Removal),
    reason("laterality_issue", "Laterality issue", "Wrong side specified or missing laterality", ReasonCategory::Removal),
    reason("timing_issue", "Timing/POA issue", "Present on admission status incorrect", ReasonCategory::Removal),
    reason("bundled", "Bundled with another code", "Code is included in another procedure", ReasonCategory::Removal),
    reason("other", "Other reason", "Specify in remarks", ReasonCategory::Removal),
];

pub const ADDITION_REASONS: [EditReason; 9] = [
    reason("missed_diagnosis", "Missed diagnosis", "Documented but not captured by AI", ReasonCategory::Addition),
    reason("missed_procedure", "Missed procedure", "Procedure performed but not captured", ReasonCategory::Addition),
    reason("complication", "Complication/comorbidity", "Additional condition affecting care", ReasonCategory::Addition),
    reason("chronic_condition", "Chronic condition", "Ongoing condition requiring coding", ReasonCategory::Addition),
    reason("secondary_diagnosis", "Secondary diagnosis", "Additional relevant diagnosis", ReasonCategory::Addition),
    reason("hcc_capture", "HCC capture", "Risk adjustment code needed", ReasonCategory::Addition),
    reason("specificity_required", "Specificity required", "More detail needed for accurate coding", ReasonCategory::Addition),
    reason("modifier_needed", "Modifier needed", "Procedure requires modifier", ReasonCategory::Addition),
    reason("other", "Other reason", "Specify in remarks", ReasonCategory::Addition),
];

pub const CHANGE_REASONS: [EditReason; 7] = [
    reason("incorrect_principal", "Incorrect principal diagnosis", "PDX does not match reason for admission", ReasonCategory::Change),
    reason("specificity", "Needs more specificity", "Code requires additional detail", ReasonCategory::Change),
    reason("clinical_update", "Clinical update", "Diagnosis changed after further evaluation", ReasonCategory::Change),
    reason("documentation_review", "Documentation review", "Found better supporting documentation", ReasonCategory::Change),
    reason("coding_guidelines", "Coding guidelines", "Following official coding guidelines", ReasonCategory::Change),
    reason("query_response", "Query response", "Based on physician query response", ReasonCategory::Change),
    reason("other", "Other reason", "Specify in remarks", ReasonCategory::Change),
];

/// All reasons offered for one kind of edit.
pub fn reasons_for(category: ReasonCategory) -> &'static [EditReason] {
    match category {
        ReasonCategory::Removal => &REMOVAL_REASONS,
        ReasonCategory::Addition => &ADDITION_REASONS,
        ReasonCategory::Change => &CHANGE_REASONS,
    }
}

/// Look up a reason id within a category. Ids are only unique per category.
pub fn find_reason(category: ReasonCategory, id: &str) -> Option<&'static EditReason> {
    reasons_for(category).iter().find(|r| r.id == id)
}

/// Case-insensitive filter over label and description, as typed into the picker.
pub fn search_reasons(category: ReasonCategory, query: &str) -> Vec<&'static EditReason> {
    let needle = query.to_lowercase();
    reasons_for(category)
        .iter()
        .filter(|r| {
            r.label.to_lowercase().contains(&needle)
                || r.description.to_lowercase().contains(&needle)
        })
        .collect()
}
