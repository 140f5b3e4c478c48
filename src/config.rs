use crate::layout::{Alignment, ExperimentKind, Position};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Starting point for the per-photo font size search, in points.
    pub font_size: u32,
    pub font_size_step: u32,
    pub min_font_size: u32,
    pub max_font_size: u32,
    /// Text measured by the font size search.
    pub size_test_text: String,
    pub default_position: Position,
    pub default_alignment: Alignment,
    pub default_rows: usize,
    /// When false every label uses `default_alignment` instead of the
    /// alignment implied by its position.
    pub align_with_position: bool,
    pub experiments: Vec<ExperimentKind>,
    pub position_candidates: Vec<Position>,
    pub row_candidates: Vec<usize>,
    /// Placeholder for regions without a name.
    pub unknown_name: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            font_size: 20,
            font_size_step: 2,
            min_font_size: 6,
            max_font_size: 200,
            size_test_text: "Firstname Lastname".to_string(),
            default_position: Position::Below,
            default_alignment: Alignment::Center,
            default_rows: 1,
            align_with_position: true,
            experiments: vec![
                ExperimentKind::NumRows,
                ExperimentKind::Position,
                ExperimentKind::RevertToDefaultPosition,
            ],
            position_candidates: vec![
                Position::Below,
                Position::Above,
                Position::Right,
                Position::Left,
            ],
            row_candidates: vec![1, 2, 3],
            unknown_name: "Unknown".to_string(),
        }
    }
}

impl LabelConfig {
    pub fn default_format(&self) -> crate::layout::LabelFormat {
        crate::layout::LabelFormat {
            position: self.default_position,
            rows: self.default_rows.max(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoConfig {
    /// Labels are kept this many pixels away from every image edge.
    pub margin: i32,
    /// Photo width / face size above which faces count as small.
    pub image_width_to_region_ratio_small: f64,
    /// Photo width / face size below which faces count as large.
    pub image_width_to_region_ratio_large: f64,
    pub label_width_to_region_ratio_small: f64,
    pub label_width_to_region_ratio_large: f64,
    /// Global optimizer sweeps; odd sweeps run in reverse person order.
    pub optimizer_passes: usize,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            margin: 5,
            image_width_to_region_ratio_small: 20.0,
            image_width_to_region_ratio_large: 4.0,
            label_width_to_region_ratio_small: 2.5,
            label_width_to_region_ratio_large: 0.6,
            optimizer_passes: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub draw_label_text: bool,
    pub draw_face_outlines: bool,
    pub draw_label_boxes: bool,
    /// Darken the photo by this percentage before drawing; 0 leaves it alone.
    pub obfuscate_percent: u8,
    pub magick_binary: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            draw_label_text: true,
            draw_face_outlines: false,
            draw_label_boxes: false,
            obfuscate_percent: 0,
            magick_binary: "magick".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub label: LabelConfig,
    pub photo: PhotoConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeFile {
    font_family: Option<String>,
    font_colour: Option<String>,
    stroke_colour: Option<String>,
    stroke_width: Option<f32>,
    face_outline_colour: Option<String>,
    face_outline_width: Option<f32>,
    label_outline_colour: Option<String>,
    label_outline_width: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelConfigFile {
    font_size: Option<u32>,
    font_size_step: Option<u32>,
    min_font_size: Option<u32>,
    max_font_size: Option<u32>,
    size_test_text: Option<String>,
    default_position: Option<String>,
    default_alignment: Option<String>,
    default_rows: Option<usize>,
    align_with_position: Option<bool>,
    experiments: Option<Vec<String>>,
    position_candidates: Option<Vec<String>>,
    row_candidates: Option<Vec<usize>>,
    unknown_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhotoConfigFile {
    margin: Option<i32>,
    image_width_to_region_ratio_small: Option<f64>,
    image_width_to_region_ratio_large: Option<f64>,
    label_width_to_region_ratio_small: Option<f64>,
    label_width_to_region_ratio_large: Option<f64>,
    optimizer_passes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    draw_label_text: Option<bool>,
    draw_face_outlines: Option<bool>,
    draw_label_boxes: Option<bool>,
    obfuscate_percent: Option<u8>,
    magick_binary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeFile>,
    label: Option<LabelConfigFile>,
    photo: Option<PhotoConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse a config document and merge it over the defaults. Strict JSON is
/// tried first; JSON5 covers hand-edited files with comments.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents)
            .map_err(|_| anyhow::anyhow!("invalid config file: {json_err}"))?,
    };
    Ok(merge_config(Config::default(), parsed))
}

fn merge_config(mut config: Config, parsed: ConfigFile) -> Config {
    if let Some(name) = parsed.theme.as_deref() {
        match Theme::by_name(name) {
            Some(theme) => config.theme = theme,
            None => warn!(theme = name, "unknown theme, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        let theme = &mut config.theme;
        if let Some(v) = vars.font_family {
            theme.font_family = v;
        }
        if let Some(v) = vars.font_colour {
            theme.font_colour = v;
        }
        if let Some(v) = vars.stroke_colour {
            theme.stroke_colour = v;
        }
        if let Some(v) = vars.stroke_width {
            theme.stroke_width = v.max(0.0);
        }
        if let Some(v) = vars.face_outline_colour {
            theme.face_outline_colour = v;
        }
        if let Some(v) = vars.face_outline_width {
            theme.face_outline_width = v.max(0.0);
        }
        if let Some(v) = vars.label_outline_colour {
            theme.label_outline_colour = v;
        }
        if let Some(v) = vars.label_outline_width {
            theme.label_outline_width = v.max(0.0);
        }
    }

    if let Some(file) = parsed.label {
        merge_label_config(&mut config.label, file);
    }

    if let Some(file) = parsed.photo {
        let photo = &mut config.photo;
        if let Some(v) = file.margin {
            photo.margin = v.max(0);
        }
        if let Some(v) = file.image_width_to_region_ratio_small {
            photo.image_width_to_region_ratio_small = v;
        }
        if let Some(v) = file.image_width_to_region_ratio_large {
            photo.image_width_to_region_ratio_large = v;
        }
        if let Some(v) = file.label_width_to_region_ratio_small {
            photo.label_width_to_region_ratio_small = v;
        }
        if let Some(v) = file.label_width_to_region_ratio_large {
            photo.label_width_to_region_ratio_large = v;
        }
        if let Some(v) = file.optimizer_passes {
            photo.optimizer_passes = v;
        }
    }

    if let Some(file) = parsed.render {
        let render = &mut config.render;
        if let Some(v) = file.draw_label_text {
            render.draw_label_text = v;
        }
        if let Some(v) = file.draw_face_outlines {
            render.draw_face_outlines = v;
        }
        if let Some(v) = file.draw_label_boxes {
            render.draw_label_boxes = v;
        }
        if let Some(v) = file.obfuscate_percent {
            render.obfuscate_percent = v.min(100);
        }
        if let Some(v) = file.magick_binary {
            render.magick_binary = v;
        }
    }

    config
}

fn merge_label_config(label: &mut LabelConfig, file: LabelConfigFile) {
    if let Some(v) = file.font_size {
        label.font_size = v.max(1);
    }
    if let Some(v) = file.font_size_step {
        label.font_size_step = v.max(1);
    }
    if let Some(v) = file.min_font_size {
        label.min_font_size = v.max(1);
    }
    if let Some(v) = file.max_font_size {
        label.max_font_size = v;
    }
    if label.max_font_size < label.min_font_size {
        warn!(
            min = label.min_font_size,
            max = label.max_font_size,
            "max font size below min font size, raising it"
        );
        label.max_font_size = label.min_font_size;
    }
    if let Some(v) = file.size_test_text {
        label.size_test_text = v;
    }
    if let Some(v) = file.default_position {
        label.default_position = parse_position(&v).unwrap_or(label.default_position);
    }
    if let Some(v) = file.default_alignment {
        label.default_alignment = match Alignment::parse(&v) {
            Some(alignment) => alignment,
            None => {
                warn!(alignment = v.as_str(), "unknown alignment, using center");
                Alignment::Center
            }
        };
    }
    if let Some(v) = file.default_rows {
        label.default_rows = v.max(1);
    }
    if let Some(v) = file.align_with_position {
        label.align_with_position = v;
    }
    if let Some(names) = file.experiments {
        label.experiments = names
            .iter()
            .filter_map(|name| {
                let kind = ExperimentKind::parse(name);
                if kind.is_none() {
                    warn!(experiment = name.as_str(), "unknown experiment, skipping");
                }
                kind
            })
            .collect();
    }
    if let Some(names) = file.position_candidates {
        label.position_candidates = names.iter().filter_map(|name| parse_position(name)).collect();
    }
    if let Some(rows) = file.row_candidates {
        label.row_candidates = rows.into_iter().filter(|rows| *rows > 0).collect();
    }
    if let Some(v) = file.unknown_name {
        label.unknown_name = v;
    }
}

fn parse_position(value: &str) -> Option<Position> {
    let position = Position::parse(value);
    if position.is_none() {
        warn!(position = value, "unknown label position, ignoring");
    }
    position
}
