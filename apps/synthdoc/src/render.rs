//! Geometry and the seams to the external rendering pipeline.
//!
//! Rasterisation, colour and geometric effects live outside this crate. The traits
//! here are the only surface the layout code depends on; `layout::font_metrics`
//! provides a metric-only implementation for callers without a raster backend.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::FontFamily;

// ────────────────────────────────────────────────────────────────────────────
// Geometry
// ────────────────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle in page pixels. `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// Horizontal alignment of a text line inside its placement box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Right,
    #[default]
    Center,
}

/// A set of placement boxes filled from a single record, in reading order.
pub type LayoutGroup = Vec<(Rect, Alignment)>;

/// Font selection handed to the glyph renderer. `size` is in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: FontFamily,
    pub size: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Positionable artifacts
// ────────────────────────────────────────────────────────────────────────────

/// Anything with a movable bounding box: glyphs and merged text layers.
pub trait Positioned {
    fn bbox(&self) -> Rect;
    fn set_bbox(&mut self, bbox: Rect);

    fn set_center(&mut self, (cx, cy): (f64, f64)) {
        let b = self.bbox();
        self.set_bbox(Rect::new(cx - b.w / 2.0, cy - b.h / 2.0, b.w, b.h));
    }

    fn set_left(&mut self, left: f64) {
        let b = self.bbox();
        self.set_bbox(Rect::new(left, b.y, b.w, b.h));
    }

    fn set_right(&mut self, right: f64) {
        let b = self.bbox();
        self.set_bbox(Rect::new(right - b.w, b.y, b.w, b.h));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Collaborator traits
// ────────────────────────────────────────────────────────────────────────────

/// Picks a font for one layout group.
pub trait FontProvider {
    fn sample(&mut self, rng: &mut dyn RngCore) -> FontSpec;
}

/// Splits the text area into groups of placement boxes.
pub trait LayoutGenerator {
    fn generate(&mut self, bbox: Rect, rng: &mut dyn RngCore) -> Vec<LayoutGroup>;
}

/// Renders single characters and merges positioned glyphs into one layer.
pub trait GlyphRenderer {
    type Glyph: Positioned;
    type Layer: Positioned;

    /// Renders `ch` at its natural size with the top-left corner at the origin.
    fn render(&self, ch: char, font: &FontSpec) -> Self::Glyph;

    /// Merges glyphs (already positioned relative to the line origin) into one layer.
    fn merge(&self, glyphs: Vec<Self::Glyph>) -> Self::Layer;
}

/// An in-place appearance change over a batch of layers (colour, noise, warp, ...).
pub trait LayerEffect<L> {
    fn apply(&mut self, layers: &mut [L], rng: &mut dyn RngCore);
}

/// Effect that leaves layers untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEffect;

impl<L> LayerEffect<L> for NoEffect {
    fn apply(&mut self, _layers: &mut [L], _rng: &mut dyn RngCore) {}
}

/// Produces the background page layer for a document of the given pixel size.
pub trait PaperGenerator<L> {
    fn generate(&mut self, size: (u32, u32), rng: &mut dyn RngCore) -> L;
}
