use crate::annotate::{OutputKind, PhotoJob, Pipeline, annotate_batch, output_path_for};
use crate::config::{Config, load_config};
use crate::engine::MagickEngine;
use crate::metadata::{ExifToolSource, MetadataSource, SidecarSource};
use crate::text_metrics::{FontMeasurer, TextMeasure};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "facelabel",
    version,
    about = "Write people's names next to their tagged faces"
)]
pub struct Args {
    /// Photos to label
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Output file for a single photo, or a directory
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Read regions from this JSON file instead of ExifTool (single photo)
    #[arg(short = 'm', long = "metadata", conflicts_with = "sidecar")]
    pub metadata: Option<PathBuf>,

    /// Read regions from `<image>.json` next to every photo
    #[arg(long = "sidecar")]
    pub sidecar: bool,

    /// How label text is measured
    #[arg(long = "measure", value_enum, default_value = "magick")]
    pub measure: MeasureBackend,

    /// Output format
    #[arg(short = 'e', long = "format", value_enum, default_value = "image")]
    pub format: OutputFormat,

    /// Do not draw the names
    #[arg(long = "no-text")]
    pub no_text: bool,

    /// Outline the faces
    #[arg(long = "face-outlines")]
    pub face_outlines: bool,

    /// Outline the label boxes
    #[arg(long = "label-boxes")]
    pub label_boxes: bool,

    /// Darken the photo by this percentage
    #[arg(long = "obfuscate", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub obfuscate: Option<u8>,

    /// Write the computed layout as JSON (a directory for several photos)
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Print the ImageMagick command instead of running it
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum MeasureBackend {
    Magick,
    Font,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Image,
    Svg,
    Png,
}

impl From<OutputFormat> for OutputKind {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Image => OutputKind::Image,
            OutputFormat::Svg => OutputKind::Svg,
            OutputFormat::Png => OutputKind::Png,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    apply_render_flags(&mut config, &args);

    if args.metadata.is_some() && args.images.len() > 1 {
        anyhow::bail!("--metadata describes a single photo; use --sidecar for several");
    }

    let source: Box<dyn MetadataSource> = match (&args.metadata, args.sidecar) {
        (Some(path), _) => Box::new(SidecarSource::fixed(path)),
        (None, true) => Box::new(SidecarSource::beside_image()),
        (None, false) => Box::new(ExifToolSource::new().context("cannot read face regions")?),
    };

    let kind = OutputKind::from(args.format);
    let engine = resolve_engine(&config, kind, args.measure, args.dry_run)?;
    let measurer: Box<dyn TextMeasure> = match args.measure {
        MeasureBackend::Magick => Box::new(engine.clone()),
        MeasureBackend::Font => Box::new(FontMeasurer::new()),
    };

    let jobs = build_jobs(&args, kind);
    let pipeline = Pipeline {
        source: source.as_ref(),
        measurer: measurer.as_ref(),
        engine: &engine,
        config: &config,
        output: kind,
        dry_run: args.dry_run,
    };

    let outcomes = annotate_batch(&pipeline, &jobs);
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => {
                if let Some(line) = &report.command_line {
                    println!("{line}");
                } else if !args.dry_run {
                    eprintln!(
                        "{} -> {} ({} labels, {} overlapping, {} pt)",
                        report.input.display(),
                        report.output.display(),
                        report.labels,
                        report.unresolved,
                        report.font_size
                    );
                }
            }
            Err(err) => {
                failed += 1;
                eprintln!("{}: {err}", outcome.input.display());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} photos failed", outcomes.len());
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "facelabel=debug" } else { "facelabel=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn apply_render_flags(config: &mut Config, args: &Args) {
    if args.no_text {
        config.render.draw_label_text = false;
    }
    if args.face_outlines {
        config.render.draw_face_outlines = true;
    }
    if args.label_boxes {
        config.render.draw_label_boxes = true;
    }
    if let Some(percent) = args.obfuscate {
        config.render.obfuscate_percent = percent;
    }
}

/// The ImageMagick binary is only required when something will run it.
fn resolve_engine(
    config: &Config,
    kind: OutputKind,
    measure: MeasureBackend,
    dry_run: bool,
) -> Result<MagickEngine> {
    let needed = matches!(measure, MeasureBackend::Magick)
        || (kind == OutputKind::Image && !dry_run);
    if needed {
        MagickEngine::locate(&config.render.magick_binary)
            .with_context(|| format!("cannot run `{}`", config.render.magick_binary))
    } else {
        Ok(MagickEngine::with_binary(&config.render.magick_binary))
    }
}

fn build_jobs(args: &Args, kind: OutputKind) -> Vec<PhotoJob> {
    let many = args.images.len() > 1;
    args.images
        .iter()
        .map(|input| PhotoJob {
            input: input.clone(),
            output: output_path_for(input, args.output.as_deref(), kind, many),
            dump_layout: args
                .dump_layout
                .as_deref()
                .map(|path| dump_path_for(input, path, many)),
        })
        .collect()
}

fn dump_path_for(input: &Path, dump: &Path, many: bool) -> PathBuf {
    if many || dump.is_dir() {
        let stem = input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("photo");
        dump.join(format!("{stem}.layout.json"))
    } else {
        dump.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_render_config() {
        let args = Args::parse_from([
            "facelabel",
            "--no-text",
            "--face-outlines",
            "--obfuscate",
            "30",
            "a.jpg",
        ]);
        let mut config = Config::default();
        apply_render_flags(&mut config, &args);
        assert!(!config.render.draw_label_text);
        assert!(config.render.draw_face_outlines);
        assert!(!config.render.draw_label_boxes);
        assert_eq!(config.render.obfuscate_percent, 30);
    }

    #[test]
    fn obfuscate_is_a_percentage() {
        assert!(Args::try_parse_from(["facelabel", "--obfuscate", "150", "a.jpg"]).is_err());
    }

    #[test]
    fn metadata_and_sidecar_are_exclusive() {
        assert!(
            Args::try_parse_from(["facelabel", "-m", "meta.json", "--sidecar", "a.jpg"]).is_err()
        );
    }

    #[test]
    fn batch_jobs_write_into_the_output_directory() {
        let args = Args::parse_from([
            "facelabel",
            "-o",
            "/out",
            "--format",
            "svg",
            "--dump-layout",
            "/dumps",
            "/p/a.jpg",
            "/p/b.jpg",
        ]);
        let jobs = build_jobs(&args, OutputKind::from(args.format));
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].output, PathBuf::from("/out/b.labelled.svg"));
        assert_eq!(
            jobs[0].dump_layout.as_deref(),
            Some(Path::new("/dumps/a.layout.json"))
        );
    }
}
