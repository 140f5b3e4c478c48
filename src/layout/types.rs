use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ir::{CropWindow, PhotoDimension};

/// Axis-aligned pixel box. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f64 {
        self.x as f64 + self.w as f64 / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y as f64 + self.h as f64 / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub name: String,
    pub rect: Rect,
}

/// Where a label sits relative to the face it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Below,
    Above,
    Left,
    Right,
}

impl Position {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "below" | "bottom" => Some(Self::Below),
            "above" | "top" => Some(Self::Above),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// Text alignment implied by anchoring on this side of the face.
    pub fn natural_alignment(self) -> Alignment {
        match self {
            Self::Below | Self::Above => Alignment::Center,
            Self::Left => Alignment::Right,
            Self::Right => Alignment::Left,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Below => "below",
            Self::Above => "above",
            Self::Left => "left",
            Self::Right => "right",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "center" | "centre" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        };
        f.write_str(name)
    }
}

/// The knobs the optimizer is allowed to turn on a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LabelFormat {
    pub position: Position,
    pub rows: usize,
}

/// One knob tried while resolving a clash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentKind {
    Position,
    NumRows,
    /// Restores both the default position and the default row count.
    RevertToDefaultPosition,
}

impl ExperimentKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "position" => Some(Self::Position),
            "num_rows" | "rows" => Some(Self::NumRows),
            "revert_to_default_position" | "revert" => Some(Self::RevertToDefaultPosition),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    /// Index of the named person in `Layout::persons`.
    pub person: usize,
    pub text: String,
    /// `text` balanced over `format.rows`, trailing empty rows removed.
    pub lines: Vec<String>,
    pub format: LabelFormat,
    pub alignment: Alignment,
    pub font_size: u32,
    pub rect: Rect,
    pub clashing: bool,
}

impl Label {
    pub fn position(&self) -> Position {
        self.format.position
    }

    pub fn rows(&self) -> usize {
        self.format.rows
    }
}

/// Outcome of laying out one photo.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    /// The drawn frame, already cropped.
    pub dimension: PhotoDimension,
    /// Where the drawn frame sits in the oriented source photo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropWindow>,
    pub persons: Vec<Person>,
    pub labels: Vec<Label>,
    pub font_size: u32,
    pub passes: usize,
}

impl Layout {
    pub fn unresolved(&self) -> usize {
        self.labels.iter().filter(|label| label.clashing).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges() {
        let rect = Rect::new(400, 280, 200, 240);
        assert_eq!(rect.right(), 600);
        assert_eq!(rect.bottom(), 520);
        assert_eq!(rect.center_x(), 500.0);
        assert_eq!(rect.center_y(), 400.0);
    }

    #[test]
    fn position_parse_accepts_aliases_and_rejects_unknown() {
        assert_eq!(Position::parse("Below"), Some(Position::Below));
        assert_eq!(Position::parse(" top "), Some(Position::Above));
        assert_eq!(Position::parse("diagonal"), None);
    }

    #[test]
    fn alignment_follows_anchor_side() {
        assert_eq!(Position::Below.natural_alignment(), Alignment::Center);
        assert_eq!(Position::Above.natural_alignment(), Alignment::Center);
        assert_eq!(Position::Left.natural_alignment(), Alignment::Right);
        assert_eq!(Position::Right.natural_alignment(), Alignment::Left);
    }

    #[test]
    fn alignment_parse_accepts_british_spelling() {
        assert_eq!(Alignment::parse("centre"), Some(Alignment::Center));
        assert_eq!(Alignment::parse("justify"), None);
    }
}
