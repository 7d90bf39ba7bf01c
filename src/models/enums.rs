use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ReportType {
    Hp => "hp",
    Op => "op",
});

str_enum!(MimeClass {
    Pdf => "pdf",
    Image => "image",
});

str_enum!(ContentClass {
    Pdf => "pdf",
    Image => "image",
    Text => "text",
});

str_enum!(ReasonCategory {
    Removal => "removal",
    Addition => "addition",
    Change => "change",
});

str_enum!(FieldMode {
    Viewing => "viewing",
    Editing => "editing",
});

str_enum!(CodeField {
    AdmitDx => "admit_dx",
    Pdx => "pdx",
    Sdx => "sdx",
    Cpt => "cpt",
    Modifier => "modifier",
});

str_enum!(SingleField {
    AdmitDx => "admit_dx",
    Pdx => "pdx",
    Modifier => "modifier",
});

str_enum!(ArrayField {
    Sdx => "sdx",
    Cpt => "cpt",
});

impl ReportType {
    pub const ALL: [ReportType; 2] = [ReportType::Hp, ReportType::Op];

    /// Human-readable report name.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Hp => "History & Physical",
            Self::Op => "Operative Report",
        }
    }

    /// Upper-case tag shown in progress messages ("HP", "OP").
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Hp => "HP",
            Self::Op => "OP",
        }
    }
}

impl MimeClass {
    /// Classify a MIME type; anything other than PDF or `image/*` is rejected.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime == "application/pdf" {
            Some(Self::Pdf)
        } else if mime.starts_with("image/") {
            Some(Self::Image)
        } else {
            None
        }
    }

    /// Classify by file name when the picker did not report a MIME type.
    pub fn from_file_name(name: &str) -> Option<Self> {
        mime_guess::from_path(name)
            .iter()
            .find_map(|m| Self::from_mime(m.essence_str()))
    }

    pub fn content_class(&self) -> ContentClass {
        match self {
            Self::Pdf => ContentClass::Pdf,
            Self::Image => ContentClass::Image,
        }
    }
}

impl CodeField {
    pub const ALL: [CodeField; 5] = [
        CodeField::AdmitDx,
        CodeField::Pdx,
        CodeField::Sdx,
        CodeField::Cpt,
        CodeField::Modifier,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::AdmitDx => "Admit DX",
            Self::Pdx => "PDX",
            Self::Sdx => "SDX",
            Self::Cpt => "CPT",
            Self::Modifier => "Modifier",
        }
    }

    /// The array field behind this field, if it holds a code list.
    pub fn as_array(&self) -> Option<ArrayField> {
        match self {
            Self::Sdx => Some(ArrayField::Sdx),
            Self::Cpt => Some(ArrayField::Cpt),
            _ => None,
        }
    }
}

impl From<SingleField> for CodeField {
    fn from(field: SingleField) -> Self {
        match field {
            SingleField::AdmitDx => CodeField::AdmitDx,
            SingleField::Pdx => CodeField::Pdx,
            SingleField::Modifier => CodeField::Modifier,
        }
    }
}

impl From<ArrayField> for CodeField {
    fn from(field: ArrayField) -> Self {
        match field {
            ArrayField::Sdx => CodeField::Sdx,
            ArrayField::Cpt => CodeField::Cpt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn report_type_round_trips_through_str() {
        for rt in ReportType::ALL {
            assert_eq!(ReportType::from_str(rt.as_str()).unwrap(), rt);
        }
    }

    #[test]
    fn unknown_enum_value_is_an_error() {
        let err = CodeField::from_str("drg").unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidEnum {
                field: "CodeField".into(),
                value: "drg".into(),
            }
        );
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&CodeField::AdmitDx).unwrap(), "\"admit_dx\"");
        let parsed: ReportType = serde_json::from_str("\"op\"").unwrap();
        assert_eq!(parsed, ReportType::Op);
    }

    #[test]
    fn mime_classification() {
        assert_eq!(MimeClass::from_mime("application/pdf"), Some(MimeClass::Pdf));
        assert_eq!(MimeClass::from_mime("image/png"), Some(MimeClass::Image));
        assert_eq!(MimeClass::from_mime("text/plain"), None);
    }

    #[test]
    fn mime_guess_from_file_name() {
        assert_eq!(MimeClass::from_file_name("scan.PDF"), Some(MimeClass::Pdf));
        assert_eq!(MimeClass::from_file_name("page1.jpeg"), Some(MimeClass::Image));
        assert_eq!(MimeClass::from_file_name("notes.docx"), None);
    }

    #[test]
    fn code_field_array_mapping() {
        assert_eq!(CodeField::Sdx.as_array(), Some(ArrayField::Sdx));
        assert_eq!(CodeField::Pdx.as_array(), None);
        assert_eq!(CodeField::from(ArrayField::Cpt), CodeField::Cpt);
        assert_eq!(CodeField::from(SingleField::Modifier), CodeField::Modifier);
    }
}
