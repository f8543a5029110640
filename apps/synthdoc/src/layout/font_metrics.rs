//! Static font-metric tables and a metric-only glyph renderer.
//!
//! Character advances are in em units (relative to font size). This is an
//! approximation of real glyph outlines, good enough to decide how many characters
//! fit in a box when no raster backend is wired in.
//! The sans table covers ASCII 0x20..=0x7E; index = (char as usize) - 32. The other
//! proportional families are scaled copies of it.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::errors::SynthError;
use crate::render::{FontProvider, FontSpec, GlyphRenderer, PaperGenerator, Positioned, Rect};

// ────────────────────────────────────────────────────────────────────────────
// Font family enum
// ────────────────────────────────────────────────────────────────────────────

/// Font families known to the metric renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    /// Humanist sans-serif; the base table.
    Sans,
    /// Old-style serif. Approx. 85% of Sans.
    Serif,
    /// Condensed display sans. Approx. 68% of Sans.
    Condensed,
    /// Fixed pitch: every narrow glyph is 0.5em, every wide glyph 1.0em.
    Mono,
}

// ────────────────────────────────────────────────────────────────────────────
// Metric table
// ────────────────────────────────────────────────────────────────────────────

/// Advance widths for the sans family at 1em.
///
/// Slot layout:
/// ```text
/// [0]=sp  [1..15]=!"#$%&'()*+,-./  [16..25]=0-9  [26..32]=:;<=>?@
/// [33..58]=A-Z  [59..64]=[\]^_`  [65..90]=a-z  [91..94]={|}~
/// ```
#[rustfmt::skip]
static SANS_WIDTHS: [f64; 95] = [
    // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
    0.25, 0.30, 0.38, 0.56, 0.56, 0.89, 0.67, 0.22, 0.33, 0.33, 0.39, 0.59, 0.28, 0.33, 0.28, 0.31,
    // 0-9
    0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56,
    // :     ;     <     =     >     ?     @
    0.28, 0.28, 0.59, 0.59, 0.59, 0.50, 1.02,
    // A-M
    0.67, 0.61, 0.61, 0.67, 0.56, 0.50, 0.67, 0.67, 0.25, 0.39, 0.61, 0.53, 0.78,
    // N-Z
    0.67, 0.72, 0.56, 0.72, 0.61, 0.50, 0.56, 0.67, 0.67, 0.89, 0.61, 0.61, 0.56,
    // [     \     ]     ^     _     `
    0.28, 0.31, 0.28, 0.47, 0.56, 0.34,
    // a-m
    0.56, 0.56, 0.50, 0.56, 0.56, 0.31, 0.56, 0.56, 0.22, 0.22, 0.53, 0.22, 0.83,
    // n-z
    0.56, 0.56, 0.56, 0.56, 0.33, 0.44, 0.39, 0.56, 0.50, 0.72, 0.50, 0.50, 0.44,
    // {     |     }     ~
    0.33, 0.26, 0.33, 0.59,
];

/// Fallback advance for narrow non-ASCII characters (Latin-1, Cyrillic, ...).
const SANS_AVERAGE_WIDTH: f64 = 0.52;
/// Full-width advance for CJK ideographs, kana and Hangul.
const WIDE_WIDTH: f64 = 1.0;
const MONO_WIDTH: f64 = 0.5;

impl FontFamily {
    fn scale(&self) -> f64 {
        match self {
            FontFamily::Sans | FontFamily::Mono => 1.0,
            FontFamily::Serif => 0.85,
            FontFamily::Condensed => 0.68,
        }
    }

    /// Advance width of `ch` in em units.
    pub fn advance_em(&self, ch: char) -> f64 {
        if is_wide(ch) {
            return WIDE_WIDTH;
        }
        if *self == FontFamily::Mono {
            return MONO_WIDTH;
        }
        let code = ch as usize;
        let base = if (32..=126).contains(&code) {
            SANS_WIDTHS[code - 32]
        } else {
            SANS_AVERAGE_WIDTH
        };
        base * self.scale()
    }
}

/// East Asian wide characters occupy a full em regardless of family.
fn is_wide(ch: char) -> bool {
    matches!(
        ch as u32,
        0x1100..=0x115F
            | 0x2E80..=0x303E
            | 0x3041..=0x33FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA000..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x20000..=0x3FFFD
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Metric renderer
// ────────────────────────────────────────────────────────────────────────────

/// A glyph with no pixels: just the character and its box.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricGlyph {
    pub ch: char,
    pub bbox: Rect,
}

impl Positioned for MetricGlyph {
    fn bbox(&self) -> Rect {
        self.bbox
    }

    fn set_bbox(&mut self, bbox: Rect) {
        self.bbox = bbox;
    }
}

/// A merged line of metric glyphs. Moving the layer moves its glyphs with it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    pub text: String,
    pub bbox: Rect,
    pub glyphs: Vec<MetricGlyph>,
}

impl Positioned for TextLayer {
    fn bbox(&self) -> Rect {
        self.bbox
    }

    fn set_bbox(&mut self, bbox: Rect) {
        let sx = if self.bbox.w > 0.0 { bbox.w / self.bbox.w } else { 1.0 };
        let sy = if self.bbox.h > 0.0 { bbox.h / self.bbox.h } else { 1.0 };
        for glyph in &mut self.glyphs {
            let g = glyph.bbox;
            glyph.bbox = Rect::new(
                bbox.x + (g.x - self.bbox.x) * sx,
                bbox.y + (g.y - self.bbox.y) * sy,
                g.w * sx,
                g.h * sy,
            );
        }
        self.bbox = bbox;
    }
}

/// Glyph renderer backed by the static metric tables. Glyph height equals the font size.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricGlyphRenderer;

impl GlyphRenderer for MetricGlyphRenderer {
    type Glyph = MetricGlyph;
    type Layer = TextLayer;

    fn render(&self, ch: char, font: &FontSpec) -> MetricGlyph {
        let w = font.family.advance_em(ch) * font.size;
        MetricGlyph {
            ch,
            bbox: Rect::new(0.0, 0.0, w, font.size),
        }
    }

    fn merge(&self, glyphs: Vec<MetricGlyph>) -> TextLayer {
        let bbox = glyphs
            .iter()
            .map(|g| g.bbox)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_default();
        TextLayer {
            text: glyphs.iter().map(|g| g.ch).collect(),
            bbox,
            glyphs,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font pool
// ────────────────────────────────────────────────────────────────────────────

/// Samples one family uniformly per call. The size is a placeholder; the fitter
/// overrides it with the box height.
#[derive(Debug, Clone)]
pub struct FontPool {
    families: Vec<FontFamily>,
}

impl FontPool {
    pub fn new(families: Vec<FontFamily>) -> Result<Self, SynthError> {
        if families.is_empty() {
            return Err(SynthError::InvalidConfig(
                "font pool needs at least one family".to_string(),
            ));
        }
        Ok(Self { families })
    }
}

impl FontProvider for FontPool {
    fn sample(&mut self, rng: &mut dyn RngCore) -> FontSpec {
        let family = self.families[rng.random_range(0..self.families.len())];
        FontSpec { family, size: 1.0 }
    }
}

/// Paper with no texture: an empty layer covering the whole page.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankPaper;

impl PaperGenerator<TextLayer> for BlankPaper {
    fn generate(&mut self, (width, height): (u32, u32), _rng: &mut dyn RngCore) -> TextLayer {
        TextLayer {
            text: String::new(),
            bbox: Rect::new(0.0, 0.0, f64::from(width), f64::from(height)),
            glyphs: Vec::new(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
