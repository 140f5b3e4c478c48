use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_colour: String,
    pub stroke_colour: String,
    pub stroke_width: f32,
    pub face_outline_colour: String,
    pub face_outline_width: f32,
    pub label_outline_colour: String,
    pub label_outline_width: f32,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "DejaVu Sans, Helvetica, Arial, sans-serif".to_string(),
            font_colour: "#FFFFFF".to_string(),
            stroke_colour: "#000000".to_string(),
            stroke_width: 1.0,
            face_outline_colour: "#FF0000".to_string(),
            face_outline_width: 2.0,
            label_outline_colour: "#00FF00".to_string(),
            label_outline_width: 1.0,
        }
    }

    /// Dark text without a halo, for bright snow or beach shots.
    pub fn ink() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, sans-serif".to_string(),
            font_colour: "#1C2430".to_string(),
            stroke_colour: "#FFFFFF".to_string(),
            stroke_width: 0.0,
            face_outline_colour: "#C7D2E5".to_string(),
            face_outline_width: 2.0,
            label_outline_colour: "#7A8AA6".to_string(),
            label_outline_width: 1.0,
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "classic" | "default" => Some(Self::classic()),
            "ink" => Some(Self::ink()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
