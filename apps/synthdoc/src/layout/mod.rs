// Text layout: metric glyph renderer, row-stack layout, greedy line fitter, and the
// per-page content driver.
// Everything here is synchronous; a driver owns its corpus reader and must not be shared.

pub mod driver;
pub mod fitter;
pub mod font_metrics;
pub mod rows;

// Re-export the public API consumed by the document generator and callers.
pub use driver::{ContentOutput, LayoutDriver};
pub use fitter::{FitOutcome, FittedLine, LineFitter, RejectReason, TextStream};
pub use font_metrics::{
    BlankPaper, FontFamily, FontPool, MetricGlyph, MetricGlyphRenderer, TextLayer,
};
pub use rows::RowStack;
