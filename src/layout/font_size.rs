use super::Person;
use crate::config::{Config, PhotoConfig};
use crate::ir::PhotoDimension;
use crate::text_metrics::{TextMeasure, TextStyle};
use tracing::{debug, warn};

/// Mean of the faces' average side length, `None` without faces.
pub fn average_region_size(persons: &[Person]) -> Option<f64> {
    if persons.is_empty() {
        return None;
    }
    let total: f64 = persons
        .iter()
        .map(|person| (person.rect.w + person.rect.h) as f64)
        .sum();
    Some(total / (2 * persons.len()) as f64)
}

/// Width the size-test text should reach. Small faces get labels wider than
/// the face, large faces narrower ones.
pub fn target_label_width(average_size: f64, photo_width: u32, photo: &PhotoConfig) -> f64 {
    let ratio = photo_width as f64 / average_size;
    if ratio > photo.image_width_to_region_ratio_small {
        average_size * photo.label_width_to_region_ratio_small
    } else if ratio < photo.image_width_to_region_ratio_large {
        average_size * photo.label_width_to_region_ratio_large
    } else {
        average_size
    }
}

/// Pick the font size shared by every label of the photo.
///
/// Steps from the configured size towards the target width and stops at the
/// first size that crosses it. A failed measurement ends the search on the
/// last size that measured successfully.
pub fn select_font_size<M: TextMeasure + ?Sized>(
    persons: &[Person],
    dimension: &PhotoDimension,
    config: &Config,
    measurer: &M,
) -> u32 {
    let label = &config.label;
    let min = label.min_font_size.max(1);
    let max = label.max_font_size.max(min);
    let step = label.font_size_step.max(1);
    let start = label.font_size.clamp(min, max);

    let Some(average) = average_region_size(persons).filter(|avg| *avg > 0.0) else {
        return label.font_size;
    };
    let target = target_label_width(average, dimension.width, &config.photo);

    let width_at = |size: u32| {
        let style = TextStyle {
            font_family: config.theme.font_family.clone(),
            font_size: size,
            stroke_width: config.theme.stroke_width,
        };
        measurer
            .measure(&label.size_test_text, &style)
            .map(|measured| measured.width as f64)
    };

    let mut size = start;
    let initial = match width_at(size) {
        Ok(width) => width,
        Err(err) => {
            warn!(error = %err, size, "font size search could not measure, keeping size");
            return size;
        }
    };

    if initial < target {
        while size < max {
            let next = (size + step).min(max);
            match width_at(next) {
                Ok(width) => {
                    size = next;
                    if width >= target {
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, size, "font size search aborted");
                    break;
                }
            }
        }
    } else if initial > target {
        while size > min {
            let next = size.saturating_sub(step).max(min);
            match width_at(next) {
                Ok(width) => {
                    size = next;
                    if width <= target {
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, size, "font size search aborted");
                    break;
                }
            }
        }
    }

    debug!(average, target, size, "selected font size");
    size
}
