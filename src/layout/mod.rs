pub mod experiments;
mod font_size;
pub mod geometry;
pub(crate) mod label_placement;
mod regions;
mod text;
pub(crate) mod types;
pub use types::*;

pub use experiments::{Experiment, SearchOutcome, Tweak, optimize, plan_experiments};
pub use font_size::{average_region_size, select_font_size, target_label_width};
pub use geometry::{keep_within_image, rects_clash};
pub use label_placement::{anchor_rect, build_label, build_labels, detect_clashes};
pub use regions::{normalize_region, normalize_regions};
pub use text::{balance_lines, visible_lines};

use crate::config::Config;
use crate::error::LayoutError;
use crate::ir::{PhotoDimension, PhotoMetadata};
use crate::text_metrics::{TextMeasure, TextStyle};
use tracing::debug;

/// Everything a layout step needs to know about the photo being processed.
/// Owned by the caller and scoped to one photo.
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    pub dimension: &'a PhotoDimension,
    pub config: &'a Config,
    pub font_size: u32,
}

impl LayoutContext<'_> {
    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            font_family: self.config.theme.font_family.clone(),
            font_size: self.font_size,
            stroke_width: self.config.theme.stroke_width,
        }
    }
}

/// Lay out name labels for one photo: normalise regions, size the font,
/// build default labels, then resolve clashes.
pub fn compute_layout<M: TextMeasure + ?Sized>(
    metadata: &PhotoMetadata,
    config: &Config,
    measurer: &M,
) -> Result<Layout, LayoutError> {
    let source = metadata.dimension;
    if source.width == 0 || source.height == 0 {
        return Err(LayoutError::EmptyPhoto(source.width, source.height));
    }

    let persons = normalize_regions(
        metadata.regions.as_deref(),
        &source,
        &config.label.unknown_name,
    );
    // Labels are placed in the frame that gets drawn.
    let dimension = source.drawn_frame();
    let crop = source.crop_window();
    let font_size = select_font_size(&persons, &dimension, config, measurer);
    let ctx = LayoutContext {
        dimension: &dimension,
        config,
        font_size,
    };

    let mut labels = build_labels(&persons, &ctx, measurer)?;
    let passes = optimize(&mut labels, &persons, &ctx, measurer)?;
    debug!(
        persons = persons.len(),
        font_size,
        passes,
        "layout computed"
    );

    Ok(Layout {
        dimension,
        crop,
        persons,
        labels,
        font_size,
        passes,
    })
}
