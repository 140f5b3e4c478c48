// Label construction and clash detection. Pure geometry over pixel boxes;
// the only side channel is the injected text measurer.

use super::geometry::{keep_within_image, rects_clash};
use super::text::visible_lines;
use super::{Label, LabelFormat, LayoutContext, Person, Position, Rect};
use crate::error::MeasureError;
use crate::text_metrics::TextMeasure;

/// Build the initial label for every person in the configured default format.
pub fn build_labels<M: TextMeasure + ?Sized>(
    persons: &[Person],
    ctx: &LayoutContext<'_>,
    measurer: &M,
) -> Result<Vec<Label>, MeasureError> {
    let format = ctx.config.label.default_format();
    persons
        .iter()
        .enumerate()
        .map(|(idx, person)| build_label(idx, person, format, ctx, measurer))
        .collect()
}

/// Derive a label for `person` in `format`: wrap, measure, anchor, clamp.
/// The clash flag starts cleared; only `detect_clashes` sets it.
pub fn build_label<M: TextMeasure + ?Sized>(
    person_idx: usize,
    person: &Person,
    format: LabelFormat,
    ctx: &LayoutContext<'_>,
    measurer: &M,
) -> Result<Label, MeasureError> {
    let rows = format.rows.max(1);
    let lines = visible_lines(&person.name, rows);
    let size = measurer.measure(&lines.join("\n"), &ctx.text_style())?;
    let anchored = anchor_rect(
        &person.rect,
        format.position,
        size.width as i32,
        size.height as i32,
    );
    let rect = keep_within_image(anchored, ctx.dimension, ctx.config.photo.margin);

    let alignment = if ctx.config.label.align_with_position {
        format.position.natural_alignment()
    } else {
        ctx.config.label.default_alignment
    };

    Ok(Label {
        person: person_idx,
        text: person.name.clone(),
        lines,
        format: LabelFormat { rows, ..format },
        alignment,
        font_size: ctx.font_size,
        rect,
        clashing: false,
    })
}

/// Place a `w`x`h` box against the given side of `face`, centred along it.
pub fn anchor_rect(face: &Rect, position: Position, w: i32, h: i32) -> Rect {
    let centred_x = (face.center_x() - w as f64 / 2.0).round() as i32;
    let centred_y = (face.center_y() - h as f64 / 2.0).round() as i32;
    match position {
        Position::Below => Rect::new(centred_x, face.bottom(), w, h),
        Position::Above => Rect::new(centred_x, face.top() - h, w, h),
        Position::Left => Rect::new(face.left() - w, centred_y, w, h),
        Position::Right => Rect::new(face.right(), centred_y, w, h),
    }
}

/// Whether `rect`, standing in for label `idx`, overlaps any other label or
/// any face. The label's own stale entry in `labels` is skipped.
pub fn clashes_with_scene(idx: usize, rect: &Rect, labels: &[Label], persons: &[Person]) -> bool {
    let with_label = labels
        .iter()
        .enumerate()
        .any(|(other, label)| other != idx && rects_clash(rect, &label.rect));
    with_label || persons.iter().any(|person| rects_clash(rect, &person.rect))
}

/// Recompute every label's clash flag. Returns how many labels clash.
pub fn detect_clashes(labels: &mut [Label], persons: &[Person]) -> usize {
    let flags: Vec<bool> = labels
        .iter()
        .enumerate()
        .map(|(idx, label)| clashes_with_scene(idx, &label.rect, labels, persons))
        .collect();
    for (label, flag) in labels.iter_mut().zip(&flags) {
        label.clashing = *flag;
    }
    flags.iter().filter(|flag| **flag).count()
}
