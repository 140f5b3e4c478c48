use crate::error::MeasureError;
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use std::cell::RefCell;
use std::collections::HashMap;
use ttf_parser::{Face, GlyphId};

/// Average advance of a glyph the font cannot provide, as a fraction of the
/// font size.
const FALLBACK_ADVANCE: f32 = 0.5625;
const FALLBACK_LINE_HEIGHT: f32 = 1.25;

/// Font settings a measurement depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    /// Points; the rendering engine draws at 72 dpi so this is also pixels.
    pub font_size: u32,
    pub stroke_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSize {
    pub width: u32,
    pub height: u32,
}

/// Answers "how big is this text when rendered". `text` may hold several
/// rows separated by `\n`.
pub trait TextMeasure {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextSize, MeasureError>;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextSize, MeasureError> {
        (**self).measure(text, style)
    }
}

/// Memoises another measurer. The optimizer re-derives the same label
/// formats many times, and each miss may be a process round trip.
pub struct CachedMeasure<M> {
    inner: M,
    cache: RefCell<HashMap<(String, String, u32, u32), TextSize>>,
}

impl<M: TextMeasure> CachedMeasure<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn into_inner(self) -> M {
        self.inner
    }
}

impl<M: TextMeasure> TextMeasure for CachedMeasure<M> {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextSize, MeasureError> {
        let key = (
            text.to_string(),
            style.font_family.clone(),
            style.font_size,
            style.stroke_width.to_bits(),
        );
        if let Some(size) = self.cache.borrow().get(&key) {
            return Ok(*size);
        }
        // Failures are not cached so a transient engine hiccup can recover.
        let size = self.inner.measure(text, style)?;
        self.cache.borrow_mut().insert(key, size);
        Ok(size)
    }
}

/// In-process measurer over the system font database.
pub struct FontMeasurer {
    state: RefCell<FontState>,
}

struct FontState {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<FontFace>>,
}

impl FontMeasurer {
    pub fn new() -> Self {
        Self::with_database(Database::new(), false)
    }

    /// Use a prepared database; system fonts are only loaded on demand when
    /// `loaded` is false.
    pub fn with_database(db: Database, loaded: bool) -> Self {
        Self {
            state: RefCell::new(FontState {
                db,
                loaded_system_fonts: loaded,
                faces: HashMap::new(),
            }),
        }
    }
}

impl Default for FontMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for FontMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> Result<TextSize, MeasureError> {
        let font_size = style.font_size as f32;
        let mut state = self.state.borrow_mut();
        let key = normalize_family_key(&style.font_family);
        if !state.faces.contains_key(&key) {
            let face = state.load_face(&style.font_family);
            state.faces.insert(key.clone(), face);
        }
        let face = state.faces.get_mut(&key).and_then(|face| face.as_mut());

        let rows: Vec<&str> = text.split('\n').collect();
        let (width, line_height) = match face {
            Some(face) => {
                let width = rows
                    .iter()
                    .map(|row| face.measure_width(row, font_size))
                    .fold(0.0, f32::max);
                (width, face.line_height(font_size))
            }
            None => {
                let width = rows
                    .iter()
                    .map(|row| row.chars().count() as f32 * font_size * FALLBACK_ADVANCE)
                    .fold(0.0, f32::max);
                (width, font_size * FALLBACK_LINE_HEIGHT)
            }
        };
        // The outline spreads by the stroke width on every side.
        let stroke = style.stroke_width.max(0.0) * 2.0;
        Ok(TextSize {
            width: (width + stroke).ceil() as u32,
            height: (rows.len() as f32 * line_height + stroke).ceil() as u32,
        })
    }
}

impl FontState {
    fn load_face(&mut self, font_family: &str) -> Option<FontFace> {
        #[derive(Clone, Copy)]
        enum FamilyToken {
            Generic(Family<'static>),
            Name(usize),
        }

        let mut names: Vec<String> = Vec::new();
        let mut order: Vec<FamilyToken> = Vec::new();
        for part in font_family.split(',') {
            let raw = part.trim().trim_matches('"').trim_matches('\'');
            if raw.is_empty() {
                continue;
            }
            match raw.to_ascii_lowercase().as_str() {
                "serif" => order.push(FamilyToken::Generic(Family::Serif)),
                "sans-serif" | "system-ui" | "-apple-system" => {
                    order.push(FamilyToken::Generic(Family::SansSerif))
                }
                "monospace" => order.push(FamilyToken::Generic(Family::Monospace)),
                "cursive" => order.push(FamilyToken::Generic(Family::Cursive)),
                "fantasy" => order.push(FamilyToken::Generic(Family::Fantasy)),
                _ => {
                    order.push(FamilyToken::Name(names.len()));
                    names.push(raw.to_string());
                }
            }
        }
        if order.is_empty() {
            order.push(FamilyToken::Generic(Family::SansSerif));
        }

        let families: Vec<Family<'_>> = order
            .into_iter()
            .map(|token| match token {
                FamilyToken::Generic(family) => family,
                FamilyToken::Name(idx) => Family::Name(names[idx].as_str()),
            })
            .collect();

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
            .flatten()
    }
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    line_units: f32,
    advances: HashMap<char, Option<u16>>,
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let units_per_em = face.units_per_em().max(1) as f32;
        let line_units =
            face.ascender() as f32 - face.descender() as f32 + face.line_gap() as f32;
        Some(Self {
            units_per_em,
            line_units: line_units.max(units_per_em),
            data,
            index,
            advances: HashMap::new(),
        })
    }

    fn line_height(&self, font_size: f32) -> f32 {
        self.line_units * font_size / self.units_per_em
    }

    fn measure_width(&mut self, text: &str, font_size: f32) -> f32 {
        let scale = font_size / self.units_per_em;
        let fallback = font_size * FALLBACK_ADVANCE;
        let Ok(face) = Face::parse(&self.data, self.index) else {
            return text.chars().count() as f32 * fallback;
        };
        let mut width = 0.0f32;
        for ch in text.chars() {
            let advance = *self.advances.entry(ch).or_insert_with(|| {
                face.glyph_index(ch)
                    .and_then(|glyph: GlyphId| face.glyph_hor_advance(glyph))
            });
            match advance {
                Some(advance) if advance > 0 => width += advance as f32 * scale,
                _ => width += fallback,
            }
        }
        width.max(0.0)
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}
