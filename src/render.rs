use crate::config::Config;
use crate::layout::{Alignment, Label, Layout};
use anyhow::Result;
use std::path::Path;

/// Text baseline as a share of the row height.
const BASELINE: f32 = 0.8;

/// Draw a layout as an SVG overlay the size of the drawn frame. `image_href`,
/// when given, is placed underneath as the photo itself, shifted so that only
/// the crop window shows.
pub fn render_svg(layout: &Layout, config: &Config, image_href: Option<&str>) -> String {
    let theme = &config.theme;
    let render = &config.render;
    let width = layout.dimension.width.max(1);
    let height = layout.dimension.height.max(1);
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));

    if let Some(href) = image_href {
        let (x, y, image_w, image_h) = match layout.crop {
            Some(window) => (
                -(window.x as i64),
                -(window.y as i64),
                window.source_width,
                window.source_height,
            ),
            None => (0, 0, width, height),
        };
        svg.push_str(&format!(
            "<image x=\"{x}\" y=\"{y}\" width=\"{image_w}\" height=\"{image_h}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>",
            escape_xml(href)
        ));
    }

    if render.obfuscate_percent > 0 {
        let opacity = f32::from(render.obfuscate_percent.min(100)) / 100.0;
        svg.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" fill=\"#000000\" fill-opacity=\"{opacity:.2}\"/>"
        ));
    }

    if render.draw_face_outlines {
        for person in &layout.persons {
            svg.push_str(&format!(
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
                person.rect.x,
                person.rect.y,
                person.rect.w,
                person.rect.h,
                theme.face_outline_colour,
                theme.face_outline_width
            ));
        }
    }

    if render.draw_label_boxes {
        for label in &layout.labels {
            svg.push_str(&format!(
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
                label.rect.x,
                label.rect.y,
                label.rect.w,
                label.rect.h,
                theme.label_outline_colour,
                theme.label_outline_width
            ));
        }
    }

    if render.draw_label_text {
        for label in &layout.labels {
            svg.push_str(&label_svg(label, config));
        }
    }

    svg.push_str("</svg>");
    svg
}

fn label_svg(label: &Label, config: &Config) -> String {
    let theme = &config.theme;
    let rows = label.lines.len().max(1) as f32;
    let row_height = label.rect.h as f32 / rows;
    let (anchor, x) = match label.alignment {
        Alignment::Left => ("start", label.rect.left() as f32),
        Alignment::Center => ("middle", label.rect.center_x() as f32),
        Alignment::Right => ("end", label.rect.right() as f32),
    };
    let start_y = label.rect.top() as f32 + row_height * BASELINE;

    let stroke = if theme.stroke_width > 0.0 {
        format!(
            " stroke=\"{}\" stroke-width=\"{}\" paint-order=\"stroke\"",
            theme.stroke_colour, theme.stroke_width
        )
    } else {
        String::new()
    };

    let mut text = format!(
        "<text x=\"{x:.2}\" y=\"{start_y:.2}\" text-anchor=\"{anchor}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\"{stroke}>",
        escape_xml(&theme.font_family),
        label.font_size,
        theme.font_colour
    );
    for (idx, line) in label.lines.iter().enumerate() {
        let dy = if idx == 0 { 0.0 } else { row_height };
        text.push_str(&format!(
            "<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}</tspan>",
            escape_xml(line)
        ));
    }
    text.push_str("</text>");
    text
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

/// Rasterise an SVG preview. Relative image references resolve against
/// `resources_dir`.
#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, resources_dir: Option<&Path>) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.resources_dir = resources_dir.map(Path::to_path_buf);
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CropWindow, PhotoDimension};
    use crate::layout::{LabelFormat, Person, Position, Rect};

    fn layout_with(alignment: Alignment, lines: &[&str]) -> Layout {
        Layout {
            dimension: PhotoDimension::new(1000, 800),
            crop: None,
            persons: vec![Person {
                name: "Ada & Co".to_string(),
                rect: Rect::new(400, 280, 200, 240),
            }],
            labels: vec![Label {
                person: 0,
                text: lines.join(" "),
                lines: lines.iter().map(|line| line.to_string()).collect(),
                format: LabelFormat {
                    position: Position::Below,
                    rows: lines.len(),
                },
                alignment,
                font_size: 20,
                rect: Rect::new(440, 520, 120, 20 * lines.len() as i32),
                clashing: false,
            }],
            font_size: 20,
            passes: 0,
        }
    }

    #[test]
    fn render_svg_basic() {
        let svg = render_svg(
            &layout_with(Alignment::Center, &["Ada Lovelace"]),
            &Config::default(),
            None,
        );
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("width=\"1000\" height=\"800\""));
        assert!(svg.contains("text-anchor=\"middle\""));
        assert!(svg.contains("x=\"500.00\""));
        assert!(svg.contains(">Ada Lovelace</tspan>"));
        assert!(!svg.contains("<image"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn anchor_follows_alignment() {
        let config = Config::default();
        let left = render_svg(&layout_with(Alignment::Left, &["A"]), &config, None);
        assert!(left.contains("text-anchor=\"start\""));
        assert!(left.contains("x=\"440.00\""));
        let right = render_svg(&layout_with(Alignment::Right, &["A"]), &config, None);
        assert!(right.contains("text-anchor=\"end\""));
        assert!(right.contains("x=\"560.00\""));
    }

    #[test]
    fn rows_become_tspans() {
        let svg = render_svg(
            &layout_with(Alignment::Center, &["Ada", "Lovelace"]),
            &Config::default(),
            None,
        );
        assert_eq!(svg.matches("<tspan").count(), 2);
        assert!(svg.contains("dy=\"20.00\">Lovelace"));
    }

    #[test]
    fn optional_layers_follow_render_switches() {
        let mut config = Config::default();
        config.render.draw_face_outlines = true;
        config.render.draw_label_boxes = true;
        config.render.draw_label_text = false;
        let svg = render_svg(
            &layout_with(Alignment::Center, &["Ada"]),
            &config,
            Some("photo \"1\".jpg"),
        );
        assert!(svg.contains("stroke=\"#FF0000\""));
        assert!(svg.contains("stroke=\"#00FF00\""));
        assert!(!svg.contains("<text"));
        assert!(svg.contains("xlink:href=\"photo &quot;1&quot;.jpg\""));
    }

    #[test]
    fn cropped_preview_shifts_the_photo() {
        let mut layout = layout_with(Alignment::Center, &["Ada"]);
        layout.dimension = PhotoDimension::new(500, 800);
        layout.crop = Some(CropWindow {
            x: 250,
            y: 0,
            width: 500,
            height: 800,
            source_width: 1000,
            source_height: 800,
        });
        let svg = render_svg(&layout, &Config::default(), Some("in.jpg"));
        assert!(svg.contains("viewBox=\"0 0 500 800\""));
        assert!(svg.contains("<image x=\"-250\" y=\"0\" width=\"1000\" height=\"800\""));
    }

    #[test]
    fn escape_xml_covers_markup() {
        assert_eq!(escape_xml("<a & 'b'>"), "&lt;a &amp; &apos;b&apos;&gt;");
    }
}
