use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{ArrayField, SingleField};

/// A committed change to a single-value field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleCorrection {
    pub old_value: String,
    pub new_value: String,
    pub reason: String,
}

/// Reasons keyed by code for one array field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayCorrections {
    pub additions: BTreeMap<String, String>,
    pub removals: BTreeMap<String, String>,
}

impl ArrayCorrections {
    pub fn len(&self) -> usize {
        self.additions.len() + self.removals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reason audit trail of a review session, in the shape the submission
/// service stores as `edit_reasons`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub admit_dx: Option<SingleCorrection>,
    pub pdx: Option<SingleCorrection>,
    pub modifier: Option<SingleCorrection>,
    pub sdx: ArrayCorrections,
    pub cpt: ArrayCorrections,
}

impl CorrectionRecord {
    pub fn single(&self, field: SingleField) -> Option<&SingleCorrection> {
        match field {
            SingleField::AdmitDx => self.admit_dx.as_ref(),
            SingleField::Pdx => self.pdx.as_ref(),
            SingleField::Modifier => self.modifier.as_ref(),
        }
    }

    pub fn single_mut(&mut self, field: SingleField) -> &mut Option<SingleCorrection> {
        match field {
            SingleField::AdmitDx => &mut self.admit_dx,
            SingleField::Pdx => &mut self.pdx,
            SingleField::Modifier => &mut self.modifier,
        }
    }

    pub fn array(&self, field: ArrayField) -> &ArrayCorrections {
        match field {
            ArrayField::Sdx => &self.sdx,
            ArrayField::Cpt => &self.cpt,
        }
    }

    pub fn array_mut(&mut self, field: ArrayField) -> &mut ArrayCorrections {
        match field {
            ArrayField::Sdx => &mut self.sdx,
            ArrayField::Cpt => &mut self.cpt,
        }
    }

    /// Single-field entries plus every addition and removal.
    pub fn change_count(&self) -> usize {
        [&self.admit_dx, &self.pdx, &self.modifier]
            .iter()
            .filter(|c| c.is_some())
            .count()
            + self.sdx.len()
            + self.cpt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }
}
