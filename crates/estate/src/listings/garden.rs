use serde::Serialize;

use super::domain::{GardenOrientation, Property};

pub const DEFAULT_GARDEN_AREA: u32 = 10;
pub const DEFAULT_GARDEN_ORIENTATION: GardenOrientation = GardenOrientation::North;

/// Advisory surfaced to the editing form; never blocks the edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormWarning {
    pub title: String,
    pub message: String,
}

/// Field values a form should show after the garden flag is toggled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GardenAssist {
    pub garden: bool,
    pub garden_area: Option<u32>,
    pub garden_orientation: Option<GardenOrientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<FormWarning>,
}

pub fn garden_assist(garden: bool) -> GardenAssist {
    if garden {
        GardenAssist {
            garden,
            garden_area: Some(DEFAULT_GARDEN_AREA),
            garden_orientation: Some(DEFAULT_GARDEN_ORIENTATION),
            warning: Some(FormWarning {
                title: "Warning".to_string(),
                message: format!(
                    "This option will enable Garden Area (default: {}) & orientation (default: {})",
                    DEFAULT_GARDEN_AREA,
                    DEFAULT_GARDEN_ORIENTATION.label()
                ),
            }),
        }
    } else {
        GardenAssist {
            garden,
            garden_area: None,
            garden_orientation: None,
            warning: None,
        }
    }
}

impl Property {
    /// Toggle the garden flag on an in-progress edit, pre-filling or clearing the garden fields.
    pub fn toggle_garden(&mut self, garden: bool) -> Option<FormWarning> {
        let assist = garden_assist(garden);
        self.garden = assist.garden;
        self.garden_area = assist.garden_area.unwrap_or(0);
        self.garden_orientation = assist.garden_orientation;
        assist.warning
    }
}
