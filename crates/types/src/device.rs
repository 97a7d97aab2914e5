//! Device family selection for catalog queries

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device family an item is looked up for. Selects the catalog entity
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    Phone,
    Pad,
}

impl DeviceFamily {
    /// Catalog `entity` query parameter for this family.
    #[must_use]
    pub fn entity(self) -> &'static str {
        match self {
            Self::Phone => "software",
            Self::Pad => "iPadSoftware",
        }
    }
}

impl Default for DeviceFamily {
    fn default() -> Self {
        Self::Phone
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phone => write!(f, "phone"),
            Self::Pad => write!(f, "pad"),
        }
    }
}

impl clap::ValueEnum for DeviceFamily {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Phone, Self::Pad]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Phone => clap::builder::PossibleValue::new("phone"),
            Self::Pad => clap::builder::PossibleValue::new("pad"),
        })
    }
}
