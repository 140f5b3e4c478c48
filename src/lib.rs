pub mod annotate;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod metadata;
pub mod render;
pub mod text_metrics;
pub mod theme;

pub use annotate::{PhotoJob, PhotoOutcome, PhotoReport, annotate_batch, annotate_photo};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use error::{AnnotateError, LayoutError, MeasureError, MetadataError, RenderError};
pub use ir::{FaceRegion, PhotoDimension, PhotoMetadata};
pub use layout::{Layout, compute_layout};
pub use text_metrics::{CachedMeasure, FontMeasurer, TextMeasure, TextSize, TextStyle};
pub use theme::Theme;
