use serde::{Deserialize, Serialize};

/// Rotation class of the stored image relative to its display orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "OrientationValue")]
pub enum Orientation {
    #[default]
    #[serde(rename = "0")]
    Deg0,
    #[serde(rename = "90")]
    Deg90,
    #[serde(rename = "180")]
    Deg180,
    #[serde(rename = "270")]
    Deg270,
}

impl Orientation {
    /// Map an EXIF `Orientation` code to a rotation class. Mirrored codes
    /// (2, 4, 5, 7) have no rotation class and come back as `None`.
    pub fn from_exif(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Deg0),
            3 => Some(Self::Deg180),
            6 => Some(Self::Deg90),
            8 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

/// Sidecars write the rotation either as `90` or as `"90"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum OrientationValue {
    Degrees(u32),
    Text(String),
}

impl TryFrom<OrientationValue> for Orientation {
    type Error = String;

    fn try_from(value: OrientationValue) -> Result<Self, Self::Error> {
        let degrees = match value {
            OrientationValue::Degrees(degrees) => degrees,
            OrientationValue::Text(text) => text
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid orientation {text:?}"))?,
        };
        Self::from_degrees(degrees)
            .ok_or_else(|| format!("orientation must be 0, 90, 180 or 270, got {degrees}"))
    }
}

/// Crop rectangle as normalized edge positions within the uncropped frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Crop {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub angle: f64,
}

impl Default for Crop {
    fn default() -> Self {
        Self {
            top: 0.0,
            left: 0.0,
            bottom: 1.0,
            right: 1.0,
            angle: 0.0,
        }
    }
}

impl Crop {
    pub fn is_full_frame(&self) -> bool {
        self.top <= 0.0 && self.left <= 0.0 && self.bottom >= 1.0 && self.right >= 1.0
    }

    pub(crate) fn extent(&self) -> (f64, f64) {
        (
            (self.right - self.left).max(f64::EPSILON),
            (self.bottom - self.top).max(f64::EPSILON),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoDimension {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub crop: Crop,
}

impl PhotoDimension {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            orientation: Orientation::Deg0,
            crop: Crop::default(),
        }
    }

    /// Pixel rectangle kept by the crop, `None` for a full frame.
    pub fn crop_window(&self) -> Option<CropWindow> {
        if self.crop.is_full_frame() {
            return None;
        }
        let (extent_w, extent_h) = self.crop.extent();
        let x = (self.width as f64 * self.crop.left.clamp(0.0, 1.0)).round() as u32;
        let y = (self.height as f64 * self.crop.top.clamp(0.0, 1.0)).round() as u32;
        let width = ((self.width as f64 * extent_w).round() as u32)
            .clamp(1, self.width.saturating_sub(x).max(1));
        let height = ((self.height as f64 * extent_h).round() as u32)
            .clamp(1, self.height.saturating_sub(y).max(1));
        Some(CropWindow {
            x,
            y,
            width,
            height,
            source_width: self.width,
            source_height: self.height,
        })
    }

    /// The frame that ends up drawn: the crop window, or the whole photo.
    pub fn drawn_frame(&self) -> PhotoDimension {
        match self.crop_window() {
            Some(window) => PhotoDimension {
                width: window.width,
                height: window.height,
                orientation: self.orientation,
                crop: Crop::default(),
            },
            None => *self,
        }
    }
}

/// Crop in pixels of the display-oriented photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub source_width: u32,
    pub source_height: u32,
}

/// Face region in normalized (0..1) coordinates, centred on `x`/`y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceRegion {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub trotation: f64,
    #[serde(default)]
    pub name: Option<String>,
}

impl FaceRegion {
    pub fn new(x: f64, y: f64, w: f64, h: f64, name: Option<&str>) -> Self {
        Self {
            x,
            y,
            w,
            h,
            rotation: 0.0,
            trotation: 0.0,
            name: name.map(str::to_string),
        }
    }
}

/// What the metadata service knows about one photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMetadata {
    pub dimension: PhotoDimension,
    #[serde(default)]
    pub regions: Option<Vec<FaceRegion>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exif_orientation_codes_map_to_rotation_classes() {
        assert_eq!(Orientation::from_exif(1), Some(Orientation::Deg0));
        assert_eq!(Orientation::from_exif(6), Some(Orientation::Deg90));
        assert_eq!(Orientation::from_exif(3), Some(Orientation::Deg180));
        assert_eq!(Orientation::from_exif(8), Some(Orientation::Deg270));
        assert_eq!(Orientation::from_exif(2), None);
    }

    #[test]
    fn metadata_parses_without_regions() {
        let json = r#"{"dimension":{"width":640,"height":480}}"#;
        let meta: PhotoMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.dimension.width, 640);
        assert_eq!(meta.dimension.orientation, Orientation::Deg0);
        assert!(meta.dimension.crop.is_full_frame());
        assert!(meta.regions.is_none());
    }

    #[test]
    fn metadata_parses_orientation_and_regions() {
        let json = r#"{
            "dimension": {"width": 1000, "height": 800, "orientation": "90"},
            "regions": [{"x": 0.5, "y": 0.5, "w": 0.2, "h": 0.3, "name": "Ada"}]
        }"#;
        let meta: PhotoMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.dimension.orientation, Orientation::Deg90);
        let regions = meta.regions.unwrap();
        assert_eq!(regions[0].name.as_deref(), Some("Ada"));
        assert_eq!(regions[0].trotation, 0.0);
    }

    #[test]
    fn orientation_accepts_numbers_and_strings() {
        let number: PhotoDimension =
            serde_json::from_str(r#"{"width": 10, "height": 20, "orientation": 90}"#).unwrap();
        assert_eq!(number.orientation, Orientation::Deg90);
        let text: PhotoDimension =
            serde_json::from_str(r#"{"width": 10, "height": 20, "orientation": "180"}"#).unwrap();
        assert_eq!(text.orientation, Orientation::Deg180);
        let odd = r#"{"width": 1, "height": 1, "orientation": 45}"#;
        assert!(serde_json::from_str::<PhotoDimension>(odd).is_err());
        assert_eq!(serde_json::to_string(&Orientation::Deg270).unwrap(), "\"270\"");
    }

    #[test]
    fn crop_window_is_measured_in_source_pixels() {
        let dim = PhotoDimension {
            crop: Crop {
                left: 0.25,
                right: 0.75,
                top: 0.1,
                bottom: 0.6,
                angle: 0.0,
            },
            ..PhotoDimension::new(1000, 800)
        };
        let window = dim.crop_window().unwrap();
        assert_eq!((window.x, window.y, window.width, window.height), (250, 80, 500, 400));
        let frame = dim.drawn_frame();
        assert_eq!((frame.width, frame.height), (500, 400));
        assert!(frame.crop.is_full_frame());
        assert!(PhotoDimension::new(1000, 800).crop_window().is_none());
    }
}
