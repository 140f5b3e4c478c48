//! Per-photo pipeline: metadata, layout, draw sequence, output.

use crate::config::Config;
use crate::engine::{DrawCommand, MagickEngine, emit_commands};
use crate::error::AnnotateError;
use crate::layout::{Layout, compute_layout};
use crate::layout_dump::write_layout_dump;
use crate::metadata::MetadataSource;
use crate::render::{render_svg, write_output_svg};
use crate::text_metrics::{CachedMeasure, TextMeasure};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Labels burnt into a copy of the photo by ImageMagick.
    Image,
    /// SVG overlay preview.
    Svg,
    /// Rasterised overlay preview.
    Png,
}

impl OutputKind {
    pub fn extension<'a>(&self, input: &'a Path) -> &'a str {
        match self {
            Self::Image => input
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("jpg"),
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

/// One photo to annotate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub dump_layout: Option<PathBuf>,
}

/// Collaborators and switches shared by every photo of a run.
pub struct Pipeline<'a, S: ?Sized, M: ?Sized> {
    pub source: &'a S,
    pub measurer: &'a M,
    pub engine: &'a MagickEngine,
    pub config: &'a Config,
    pub output: OutputKind,
    /// Build everything but leave the engine untouched; the command line is
    /// returned in the report instead.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct PhotoReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub persons: usize,
    pub labels: usize,
    pub unresolved: usize,
    pub font_size: u32,
    pub layout: Layout,
    pub commands: Vec<DrawCommand>,
    pub command_line: Option<String>,
}

#[derive(Debug)]
pub struct PhotoOutcome {
    pub input: PathBuf,
    pub result: Result<PhotoReport, AnnotateError>,
}

impl PhotoOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Annotate a single photo.
pub fn annotate_photo<S, M>(
    pipeline: &Pipeline<'_, S, M>,
    job: &PhotoJob,
) -> Result<PhotoReport, AnnotateError>
where
    S: MetadataSource + ?Sized,
    M: TextMeasure + ?Sized,
{
    let metadata = pipeline.source.read(&job.input)?;

    let measurer = CachedMeasure::new(pipeline.measurer);
    let layout = compute_layout(&metadata, pipeline.config, &measurer)?;
    info!(
        photo = %job.input.display(),
        persons = layout.persons.len(),
        font_size = layout.font_size,
        unresolved = layout.unresolved(),
        measurements = measurer.cached_entries(),
        "layout ready"
    );

    if let Some(path) = &job.dump_layout {
        write_layout_dump(path, &layout).map_err(AnnotateError::Output)?;
    }

    let commands = emit_commands(&layout, pipeline.config, &job.input, &job.output);
    let mut command_line = None;
    match pipeline.output {
        OutputKind::Image if pipeline.dry_run => {
            command_line = Some(pipeline.engine.command_line(&commands));
        }
        OutputKind::Image => pipeline.engine.execute(&commands)?,
        OutputKind::Svg | OutputKind::Png if pipeline.dry_run => {}
        OutputKind::Svg => {
            let svg = render_svg(&layout, pipeline.config, Some(&image_href(&job.input)));
            write_output_svg(&svg, Some(&job.output)).map_err(AnnotateError::Output)?;
        }
        OutputKind::Png => {
            let svg = render_svg(&layout, pipeline.config, Some(&image_href(&job.input)));
            write_png(&svg, &job.output, job.input.parent()).map_err(AnnotateError::Output)?;
        }
    }

    Ok(PhotoReport {
        input: job.input.clone(),
        output: job.output.clone(),
        persons: layout.persons.len(),
        labels: layout.labels.len(),
        unresolved: layout.unresolved(),
        font_size: layout.font_size,
        layout,
        commands,
        command_line,
    })
}

/// Annotate photos one after another. A failing photo is logged and
/// reported in its outcome; the rest still run.
pub fn annotate_batch<S, M>(pipeline: &Pipeline<'_, S, M>, jobs: &[PhotoJob]) -> Vec<PhotoOutcome>
where
    S: MetadataSource + ?Sized,
    M: TextMeasure + ?Sized,
{
    jobs.iter()
        .map(|job| {
            let result = annotate_photo(pipeline, job);
            if let Err(err) = &result {
                error!(photo = %job.input.display(), error = %err, "photo failed");
            }
            PhotoOutcome {
                input: job.input.clone(),
                result,
            }
        })
        .collect()
}

/// Where the annotated copy of `input` goes. `output` is a file for a single
/// photo, or a directory when it already is one or several photos are run.
pub fn output_path_for(
    input: &Path,
    output: Option<&Path>,
    kind: OutputKind,
    many: bool,
) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("photo");
    let name = format!("{stem}.labelled.{}", kind.extension(input));
    match output {
        Some(path) if many || path.is_dir() => path.join(name),
        Some(path) => path.to_path_buf(),
        None => input.with_file_name(name),
    }
}

fn image_href(input: &Path) -> String {
    std::fs::canonicalize(input)
        .unwrap_or_else(|_| input.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, resources_dir: Option<&Path>) -> anyhow::Result<()> {
    crate::render::write_output_png(svg, output, resources_dir)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _resources_dir: Option<&Path>) -> anyhow::Result<()> {
    anyhow::bail!("PNG output requires the `png` feature")
}
