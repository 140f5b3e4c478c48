//! ImageMagick boundary: the draw sequence for one photo, its command-line
//! form, and the engine that runs it and answers text measurements.

use crate::config::Config;
use crate::error::{MeasureError, RenderError};
use crate::layout::{Alignment, Layout, Rect};
use crate::text_metrics::{TextMeasure, TextSize, TextStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

static SIZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\s+(\d+)\s*$").unwrap());

/// One directive for the rendering engine, applied in order over the
/// previous state of the image.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    LoadImage {
        path: PathBuf,
    },
    /// Keep only this window of the auto-oriented image.
    Crop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    Obfuscate {
        percent: u8,
    },
    FaceOutline {
        rect: Rect,
        colour: String,
        width: f32,
    },
    LabelOutline {
        rect: Rect,
        colour: String,
        width: f32,
    },
    Text {
        lines: Vec<String>,
        rect: Rect,
        alignment: Alignment,
        font_family: String,
        font_size: u32,
        font_colour: String,
        stroke_colour: String,
        stroke_width: f32,
    },
    WriteImage {
        path: PathBuf,
    },
}

/// Emit the draw sequence for a computed layout.
pub fn emit_commands(
    layout: &Layout,
    config: &Config,
    input: &Path,
    output: &Path,
) -> Vec<DrawCommand> {
    let theme = &config.theme;
    let render = &config.render;
    let mut commands = vec![DrawCommand::LoadImage {
        path: input.to_path_buf(),
    }];
    if let Some(window) = layout.crop {
        commands.push(DrawCommand::Crop {
            x: window.x,
            y: window.y,
            width: window.width,
            height: window.height,
        });
    }

    if render.obfuscate_percent > 0 {
        commands.push(DrawCommand::Obfuscate {
            percent: render.obfuscate_percent.min(100),
        });
    }
    if render.draw_face_outlines {
        commands.extend(layout.persons.iter().map(|person| DrawCommand::FaceOutline {
            rect: person.rect,
            colour: theme.face_outline_colour.clone(),
            width: theme.face_outline_width,
        }));
    }
    if render.draw_label_boxes {
        commands.extend(layout.labels.iter().map(|label| DrawCommand::LabelOutline {
            rect: label.rect,
            colour: theme.label_outline_colour.clone(),
            width: theme.label_outline_width,
        }));
    }
    if render.draw_label_text {
        commands.extend(layout.labels.iter().map(|label| DrawCommand::Text {
            lines: label.lines.clone(),
            rect: label.rect,
            alignment: label.alignment,
            font_family: theme.font_family.clone(),
            font_size: label.font_size,
            font_colour: theme.font_colour.clone(),
            stroke_colour: theme.stroke_colour.clone(),
            stroke_width: theme.stroke_width,
        }));
    }

    commands.push(DrawCommand::WriteImage {
        path: output.to_path_buf(),
    });
    commands
}

/// Serialise a draw sequence to `magick` arguments (without the binary).
pub fn magick_args(commands: &[DrawCommand]) -> Vec<String> {
    let mut args = Vec::new();
    for command in commands {
        match command {
            DrawCommand::LoadImage { path } => {
                args.push(path.to_string_lossy().into_owned());
                args.push("-auto-orient".to_string());
            }
            DrawCommand::Crop {
                x,
                y,
                width,
                height,
            } => {
                args.extend([
                    "-crop".to_string(),
                    format!("{width}x{height}+{x}+{y}"),
                    "+repage".to_string(),
                ]);
            }
            DrawCommand::Obfuscate { percent } => {
                args.extend([
                    "-fill".to_string(),
                    "black".to_string(),
                    "-colorize".to_string(),
                    format!("{percent}%"),
                ]);
            }
            DrawCommand::FaceOutline {
                rect,
                colour,
                width,
            }
            | DrawCommand::LabelOutline {
                rect,
                colour,
                width,
            } => {
                args.extend([
                    "-fill".to_string(),
                    "none".to_string(),
                    "-stroke".to_string(),
                    colour.clone(),
                    "-strokewidth".to_string(),
                    format_number(*width),
                    "-draw".to_string(),
                    format!(
                        "rectangle {},{} {},{}",
                        rect.left(),
                        rect.top(),
                        rect.right(),
                        rect.bottom()
                    ),
                ]);
            }
            DrawCommand::Text {
                lines,
                rect,
                alignment,
                font_family,
                font_size,
                font_colour,
                stroke_colour,
                stroke_width,
            } => {
                args.extend([
                    "(".to_string(),
                    "-size".to_string(),
                    format!("{}x{}", rect.w.max(1), rect.h.max(1)),
                    "-background".to_string(),
                    "none".to_string(),
                    "-font".to_string(),
                    primary_family(font_family).to_string(),
                    "-pointsize".to_string(),
                    font_size.to_string(),
                    "-fill".to_string(),
                    font_colour.clone(),
                ]);
                if *stroke_width > 0.0 {
                    args.extend([
                        "-stroke".to_string(),
                        stroke_colour.clone(),
                        "-strokewidth".to_string(),
                        format_number(*stroke_width),
                    ]);
                } else {
                    args.extend(["-stroke".to_string(), "none".to_string()]);
                }
                args.extend([
                    "-gravity".to_string(),
                    gravity(*alignment).to_string(),
                    format!("label:{}", escape_label(&lines.join("\n"))),
                    ")".to_string(),
                    "+gravity".to_string(),
                    "-geometry".to_string(),
                    format!("{:+}{:+}", rect.x, rect.y),
                    "-composite".to_string(),
                ]);
            }
            DrawCommand::WriteImage { path } => {
                args.push(path.to_string_lossy().into_owned());
            }
        }
    }
    args
}

fn gravity(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "West",
        Alignment::Center => "Center",
        Alignment::Right => "East",
    }
}

/// ImageMagick takes a single font name; use the first entry of a CSS-like
/// family list.
fn primary_family(family: &str) -> &str {
    family
        .split(',')
        .map(|name| name.trim().trim_matches(|c| c == '"' || c == '\''))
        .find(|name| !name.is_empty())
        .unwrap_or("sans-serif")
}

fn format_number(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}

/// Escape text for a `label:` argument: percent escapes and backslashes are
/// doubled, and a leading `@` would otherwise read a file.
pub fn escape_label(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for (idx, ch) in text.chars().enumerate() {
        match ch {
            '%' => escaped.push_str("%%"),
            '\\' => escaped.push_str("\\\\"),
            '@' if idx == 0 => escaped.push_str("\\@"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Parse the `"%w %h"` answer of a measurement query.
pub fn parse_measure_output(output: &str) -> Result<TextSize, MeasureError> {
    let caps = SIZE_RE
        .captures(output)
        .ok_or_else(|| MeasureError::Unparsable(output.to_string()))?;
    let parse = |idx: usize| {
        caps[idx]
            .parse::<u32>()
            .map_err(|_| MeasureError::Unparsable(output.to_string()))
    };
    Ok(TextSize {
        width: parse(1)?,
        height: parse(2)?,
    })
}

/// Runs `magick` for draw sequences and measurement queries.
#[derive(Debug, Clone)]
pub struct MagickEngine {
    binary: PathBuf,
}

impl MagickEngine {
    /// Resolve `binary` (a name on the PATH or a path) to an executable.
    pub fn locate(binary: &str) -> Result<Self, RenderError> {
        let binary = which::which(binary).map_err(|_| RenderError::MagickNotFound)?;
        debug!(binary = %binary.display(), "using ImageMagick");
        Ok(Self { binary })
    }

    /// Use `binary` as given, without checking that it exists.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The full command line for a draw sequence, quoted for a POSIX shell.
    pub fn command_line(&self, commands: &[DrawCommand]) -> String {
        std::iter::once(self.binary.to_string_lossy().into_owned())
            .chain(magick_args(commands))
            .map(|arg| shell_quote(&arg))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Apply a draw sequence; the final `WriteImage` produces the output file.
    pub fn execute(&self, commands: &[DrawCommand]) -> Result<(), RenderError> {
        let args = magick_args(commands);
        debug!(args = args.len(), "running ImageMagick");
        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => RenderError::MagickNotFound,
                _ => RenderError::Io(err),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(RenderError::magick_failed(
                format!("magick exited with {}", output.status),
                Some(stderr),
                output.status.code(),
            ));
        }
        Ok(())
    }
}

impl TextMeasure for MagickEngine {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextSize, MeasureError> {
        let output = Command::new(&self.binary)
            .args([
                "-font".to_string(),
                primary_family(&style.font_family).to_string(),
                "-pointsize".to_string(),
                style.font_size.to_string(),
                "-strokewidth".to_string(),
                format_number(style.stroke_width),
                format!("label:{}", escape_label(text)),
                "-format".to_string(),
                "%w %h".to_string(),
                "info:".to_string(),
            ])
            .output()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => {
                    MeasureError::EngineNotFound(self.binary.display().to_string())
                }
                _ => MeasureError::Io(err),
            })?;

        if !output.status.success() {
            return Err(MeasureError::CommandFailed {
                message: format!("magick exited with {}", output.status),
                stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            });
        }
        parse_measure_output(&String::from_utf8_lossy(&output.stdout))
    }
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:+,=%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
