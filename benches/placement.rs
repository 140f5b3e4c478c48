use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use facelabel::config::Config;
use facelabel::engine::{emit_commands, magick_args};
use facelabel::error::MeasureError;
use facelabel::ir::{FaceRegion, PhotoDimension, PhotoMetadata};
use facelabel::layout::compute_layout;
use facelabel::render::render_svg;
use facelabel::text_metrics::{CachedMeasure, TextMeasure, TextSize, TextStyle};
use std::hint::black_box;
use std::path::Path;

struct Stub;

impl TextMeasure for Stub {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextSize, MeasureError> {
        let rows: Vec<&str> = text.split('\n').collect();
        let longest = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        Ok(TextSize {
            width: longest as u32 * style.font_size / 2,
            height: rows.len() as u32 * style.font_size,
        })
    }
}

const NAMES: [&str; 6] = [
    "Ada Lovelace",
    "Grace Brewster Murray Hopper",
    "Alan Turing",
    "Katherine Johnson",
    "Edsger W Dijkstra",
    "Barbara Liskov",
];

/// A group photo with `rows` x `cols` faces packed shoulder to shoulder.
fn crowded_photo(rows: usize, cols: usize) -> PhotoMetadata {
    let mut regions = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let x = (col as f64 + 0.5) / cols as f64;
            let y = (row as f64 + 0.5) / rows as f64;
            let name = NAMES[(row * cols + col) % NAMES.len()];
            regions.push(FaceRegion::new(
                x,
                y,
                0.7 / cols as f64,
                0.6 / rows as f64,
                Some(name),
            ));
        }
    }
    PhotoMetadata {
        dimension: PhotoDimension::new(4000, 3000),
        regions: Some(regions),
    }
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = Config::default();
    let cases = [
        ("2x4", crowded_photo(2, 4)),
        ("3x8", crowded_photo(3, 8)),
        ("5x10", crowded_photo(5, 10)),
    ];

    for (name, photo) in &cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), photo, |b, data| {
            b.iter(|| {
                let layout = compute_layout(black_box(data), &config, &Stub).unwrap();
                black_box(layout.unresolved());
            });
        });
    }
    group.finish();
}

fn bench_cached_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_cached_measure");
    let config = Config::default();
    let photo = crowded_photo(3, 8);
    group.bench_with_input(BenchmarkId::from_parameter("3x8"), &photo, |b, data| {
        b.iter(|| {
            let measurer = CachedMeasure::new(Stub);
            let layout = compute_layout(black_box(data), &config, &measurer).unwrap();
            black_box(layout.labels.len());
        });
    });
    group.finish();
}

fn bench_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("output");
    let config = Config::default();
    let layout = compute_layout(&crowded_photo(3, 8), &config, &Stub).unwrap();

    group.bench_with_input(BenchmarkId::from_parameter("magick_args"), &layout, |b, data| {
        b.iter(|| {
            let commands = emit_commands(data, &config, Path::new("in.jpg"), Path::new("out.jpg"));
            black_box(magick_args(&commands));
        });
    });
    group.bench_with_input(BenchmarkId::from_parameter("svg"), &layout, |b, data| {
        b.iter(|| black_box(render_svg(data, &config, None)));
    });
    group.finish();
}

criterion_group!(benches, bench_layout, bench_cached_layout, bench_output);
criterion_main!(benches);
