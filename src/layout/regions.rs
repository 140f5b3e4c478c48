use super::{Person, Rect};
use crate::ir::{FaceRegion, Orientation, PhotoDimension};
use tracing::{debug, warn};

/// Normalized centre and size of a region, in display orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct UnitBox {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

/// Convert the metadata service's regions into pixel-space persons.
/// A missing or empty region list is not an error, just nobody to label.
/// Pixels are those of the drawn frame, which is the crop window when the
/// photo carries a crop.
pub fn normalize_regions(
    regions: Option<&[FaceRegion]>,
    dimension: &PhotoDimension,
    unknown_name: &str,
) -> Vec<Person> {
    let regions = match regions {
        Some(regions) if !regions.is_empty() => regions,
        _ => {
            warn!(
                width = dimension.width,
                height = dimension.height,
                "photo has no face regions"
            );
            return Vec::new();
        }
    };
    if dimension.crop.angle.abs() > f64::EPSILON {
        debug!(angle = dimension.crop.angle, "crop angle is not applied to regions");
    }
    regions
        .iter()
        .map(|region| normalize_region(region, dimension, unknown_name))
        .collect()
}

pub fn normalize_region(
    region: &FaceRegion,
    dimension: &PhotoDimension,
    unknown_name: &str,
) -> Person {
    let unit = reorient(
        UnitBox {
            x: region.x,
            y: region.y,
            w: region.w,
            h: region.h,
        },
        dimension.orientation,
    );
    let unit = if dimension.crop.is_full_frame() {
        unit
    } else {
        let (crop_w, crop_h) = dimension.crop.extent();
        UnitBox {
            x: (unit.x - dimension.crop.left) / crop_w,
            y: (unit.y - dimension.crop.top) / crop_h,
            w: unit.w / crop_w,
            h: unit.h / crop_h,
        }
    };

    let frame = dimension.drawn_frame();
    let width = frame.width as f64;
    let height = frame.height as f64;
    let (mut w_px, mut h_px) = (width * unit.w, height * unit.h);
    let angle = region.rotation + region.trotation;
    if angle.abs() > f64::EPSILON {
        let (sin, cos) = angle.to_radians().sin_cos();
        let (rotated_w, rotated_h) = (
            (w_px * cos).abs() + (h_px * sin).abs(),
            (w_px * sin).abs() + (h_px * cos).abs(),
        );
        w_px = rotated_w;
        h_px = rotated_h;
    }

    let w = w_px.round() as i32;
    let h = h_px.round() as i32;
    let x = (width * unit.x - w as f64 / 2.0).round() as i32;
    let y = (height * unit.y - h as f64 / 2.0).round() as i32;

    let name = region
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(unknown_name)
        .to_string();

    Person {
        name,
        rect: Rect::new(x, y, w, h),
    }
}

fn reorient(unit: UnitBox, orientation: Orientation) -> UnitBox {
    match orientation {
        Orientation::Deg0 => unit,
        Orientation::Deg90 => UnitBox {
            x: 1.0 - unit.y,
            y: unit.x,
            w: unit.h,
            h: unit.w,
        },
        Orientation::Deg180 => UnitBox {
            x: 1.0 - unit.x,
            y: 1.0 - unit.y,
            ..unit
        },
        Orientation::Deg270 => UnitBox {
            x: unit.y,
            y: 1.0 - unit.x,
            w: unit.h,
            h: unit.w,
        },
    }
}
