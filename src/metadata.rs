//! Metadata service adapters: where photo dimensions and face regions come from.

use crate::error::MetadataError;
use crate::ir::{Crop, FaceRegion, Orientation, PhotoDimension, PhotoMetadata};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// One blocking lookup per photo.
pub trait MetadataSource {
    fn read(&self, image: &Path) -> Result<PhotoMetadata, MetadataError>;
}

/// Reads MWG face regions and Camera Raw crop settings through ExifTool.
#[derive(Debug, Clone)]
pub struct ExifToolSource {
    binary: PathBuf,
}

impl ExifToolSource {
    /// Locate `exiftool` on the PATH.
    pub fn new() -> Result<Self, MetadataError> {
        let binary = which::which("exiftool").map_err(|_| MetadataError::ExifToolNotFound)?;
        Ok(Self { binary })
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl MetadataSource for ExifToolSource {
    fn read(&self, image: &Path) -> Result<PhotoMetadata, MetadataError> {
        if !image.exists() {
            return Err(MetadataError::FileNotFound(image.to_path_buf()));
        }
        debug!(image = %image.display(), "reading regions with exiftool");

        let output = Command::new(&self.binary)
            .args([
                "-json",
                "-struct",
                "-n",
                "-ImageWidth",
                "-ImageHeight",
                "-Orientation",
                "-RegionInfo",
                "-HasCrop",
                "-CropLeft",
                "-CropTop",
                "-CropRight",
                "-CropBottom",
                "-CropAngle",
            ])
            .arg(image)
            .output()
            .map_err(|err| MetadataError::ExifToolFailed {
                message: format!("failed to execute exiftool: {err}"),
                stderr: None,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(MetadataError::ExifToolFailed {
                message: format!("exiftool exited with {}", output.status),
                stderr: Some(stderr),
            });
        }

        parse_exiftool_json(&String::from_utf8_lossy(&output.stdout), image)
    }
}

/// Reads `PhotoMetadata` JSON, either from a fixed file or from
/// `<image>.json` beside each photo.
#[derive(Debug, Clone, Default)]
pub struct SidecarSource {
    path: Option<PathBuf>,
}

impl SidecarSource {
    pub fn beside_image() -> Self {
        Self { path: None }
    }

    pub fn fixed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn sidecar_path(&self, image: &Path) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => {
                let mut name = image.as_os_str().to_owned();
                name.push(".json");
                PathBuf::from(name)
            }
        }
    }
}

impl MetadataSource for SidecarSource {
    fn read(&self, image: &Path) -> Result<PhotoMetadata, MetadataError> {
        let path = self.sidecar_path(image);
        if !path.exists() {
            return Err(MetadataError::FileNotFound(path));
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExifToolRecord {
    image_width: Option<u32>,
    image_height: Option<u32>,
    orientation: Option<u32>,
    region_info: Option<RegionInfo>,
    has_crop: Option<serde_json::Value>,
    crop_left: Option<f64>,
    crop_top: Option<f64>,
    crop_right: Option<f64>,
    crop_bottom: Option<f64>,
    crop_angle: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RegionInfo {
    region_list: Option<Vec<RegionEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RegionEntry {
    area: Option<RegionArea>,
    name: Option<String>,
    #[serde(rename = "Type")]
    kind: Option<String>,
    rotation: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RegionArea {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    unit: Option<String>,
}

/// Turn `exiftool -json -struct -n` output into photo metadata. Width and
/// height are reported in display orientation.
pub fn parse_exiftool_json(json: &str, image: &Path) -> Result<PhotoMetadata, MetadataError> {
    let records: Vec<ExifToolRecord> = serde_json::from_str(json)?;
    let record = records
        .into_iter()
        .next()
        .ok_or_else(|| MetadataError::MissingDimensions(image.to_path_buf()))?;

    let (Some(width), Some(height)) = (record.image_width, record.image_height) else {
        return Err(MetadataError::MissingDimensions(image.to_path_buf()));
    };

    let orientation = match record.orientation {
        None => Orientation::Deg0,
        Some(code) => Orientation::from_exif(code).unwrap_or_else(|| {
            warn!(code, image = %image.display(), "mirrored orientation treated as upright");
            Orientation::Deg0
        }),
    };
    let (width, height) = match orientation {
        Orientation::Deg90 | Orientation::Deg270 => (height, width),
        Orientation::Deg0 | Orientation::Deg180 => (width, height),
    };

    let crop = if is_truthy(record.has_crop.as_ref()) {
        Crop {
            top: record.crop_top.unwrap_or(0.0),
            left: record.crop_left.unwrap_or(0.0),
            bottom: record.crop_bottom.unwrap_or(1.0),
            right: record.crop_right.unwrap_or(1.0),
            angle: record.crop_angle.unwrap_or(0.0),
        }
    } else {
        Crop::default()
    };

    let regions = record
        .region_info
        .and_then(|info| info.region_list)
        .map(|list| {
            list.into_iter()
                .filter_map(|entry| face_region(entry, image))
                .collect::<Vec<_>>()
        });

    Ok(PhotoMetadata {
        dimension: PhotoDimension {
            width,
            height,
            orientation,
            crop,
        },
        regions,
    })
}

fn face_region(entry: RegionEntry, image: &Path) -> Option<FaceRegion> {
    if let Some(kind) = entry.kind.as_deref()
        && !kind.eq_ignore_ascii_case("face")
    {
        return None;
    }
    let area = entry.area?;
    if let Some(unit) = area.unit.as_deref()
        && !unit.eq_ignore_ascii_case("normalized")
    {
        warn!(unit, image = %image.display(), "skipping region with non-normalized area");
        return None;
    }
    Some(FaceRegion {
        x: area.x,
        y: area.y,
        w: area.w,
        h: area.h,
        // MWG rotation is in radians.
        rotation: entry.rotation.map(f64::to_degrees).unwrap_or(0.0),
        trotation: 0.0,
        name: entry.name,
    })
}

fn is_truthy(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(flag)) => *flag,
        Some(serde_json::Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(serde_json::Value::String(text)) => {
            matches!(text.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
        }
        _ => false,
    }
}
