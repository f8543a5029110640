//! Greedy single-line fitter.
//!
//! Places characters left to right at a height equal to the box height until the
//! next glyph would overflow the box width or the text runs out. There is no
//! wrapping and no hyphenation; a character that does not fit is left in the
//! stream for the next box.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::TextBoxConfig;
use crate::render::{FontSpec, GlyphRenderer, Positioned, Rect};
use crate::sampling::uniform;

// ────────────────────────────────────────────────────────────────────────────
// Text stream
// ────────────────────────────────────────────────────────────────────────────

/// In-memory character stream with an explicit end-of-input flag.
///
/// The stream is finished once every character has been consumed or a line
/// terminator (`\r`/`\n`) has been reached. Text after a terminator is never placed
/// but still counts as `remaining`.
#[derive(Debug, Clone)]
pub struct TextStream {
    chars: Vec<char>,
    pos: usize,
    terminated: bool,
}

impl TextStream {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            terminated: false,
        }
    }

    pub fn peek(&self) -> Option<char> {
        if self.terminated {
            return None;
        }
        self.chars.get(self.pos).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.terminated || self.pos >= self.chars.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Characters never consumed, including any cut off by a terminator.
    pub fn remaining(&self) -> usize {
        self.chars.len().saturating_sub(self.pos)
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn terminate(&mut self) {
        self.pos += 1;
        self.terminated = true;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Outcome types
// ────────────────────────────────────────────────────────────────────────────

/// One fitted line: the merged layer (top-left at the origin) and the consumed text.
#[derive(Debug, Clone)]
pub struct FittedLine<L> {
    pub layer: L,
    /// Consumed characters, untrimmed, in placement order.
    pub text: String,
}

/// Why a box produced no line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Not even the first glyph fit (or there was no text left).
    NothingPlaced,
    /// Only whitespace fit. The whitespace stays consumed so the next box moves on.
    BlankText,
}

#[derive(Debug, Clone)]
pub enum FitOutcome<L> {
    /// The text ran out inside this box. This is the only standalone acceptance.
    Complete(FittedLine<L>),
    /// The box filled up before the text ended.
    Partial(FittedLine<L>),
    Rejected(RejectReason),
}

impl<L> FitOutcome<L> {
    pub fn into_line(self) -> Option<FittedLine<L>> {
        match self {
            FitOutcome::Complete(line) | FitOutcome::Partial(line) => Some(line),
            FitOutcome::Rejected(_) => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fitter
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LineFitter {
    fill: [f64; 2],
}

impl LineFitter {
    pub fn new(config: &TextBoxConfig) -> Self {
        Self { fill: config.fill }
    }

    /// Fits as many characters from `stream` as the box allows.
    ///
    /// The usable width is `box_width * fill`, clamped to `[box_height, box_width]`.
    /// Glyphs are rendered at `floor(box_height)` and scaled so their height equals
    /// the box height.
    pub fn fit<R>(
        &self,
        (box_width, box_height): (f64, f64),
        stream: &mut TextStream,
        font: &FontSpec,
        renderer: &R,
        rng: &mut dyn RngCore,
    ) -> FitOutcome<R::Layer>
    where
        R: GlyphRenderer + ?Sized,
    {
        let fill = uniform(rng, self.fill[0], self.fill[1]);
        let width = (box_width * fill).max(box_height).min(box_width);
        let font = FontSpec {
            size: box_height.floor(),
            ..font.clone()
        };
        if font.size < 1.0 {
            return FitOutcome::Rejected(RejectReason::NothingPlaced);
        }

        let mut glyphs = Vec::new();
        let mut text = String::new();
        let mut left = 0.0_f64;

        while let Some(ch) = stream.peek() {
            if ch == '\r' || ch == '\n' {
                stream.terminate();
                break;
            }

            let mut glyph = renderer.render(ch, &font);
            let natural = glyph.bbox();
            let scale = if natural.h > 0.0 {
                box_height / natural.h
            } else {
                1.0
            };
            let bbox = Rect::new(left, 0.0, natural.w * scale, natural.h * scale);
            if bbox.right() > width {
                break;
            }

            glyph.set_bbox(bbox);
            glyphs.push(glyph);
            text.push(ch);
            stream.bump();
            left = bbox.right();
        }

        if glyphs.is_empty() {
            return FitOutcome::Rejected(RejectReason::NothingPlaced);
        }
        if text.trim().is_empty() {
            return FitOutcome::Rejected(RejectReason::BlankText);
        }

        let line = FittedLine {
            layer: renderer.merge(glyphs),
            text,
        };
        if stream.is_finished() {
            FitOutcome::Complete(line)
        } else {
            FitOutcome::Partial(line)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::{FontFamily, MetricGlyphRenderer, TextLayer};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // Mono at height 10 → every narrow glyph is exactly 5px wide.
    fn mono() -> FontSpec {
        FontSpec {
            family: FontFamily::Mono,
            size: 1.0,
        }
    }

    fn fit(size: (f64, f64), stream: &mut TextStream) -> FitOutcome<TextLayer> {
        let fitter = LineFitter::new(&TextBoxConfig::default());
        let mut rng = StdRng::seed_from_u64(0);
        fitter.fit(size, stream, &mono(), &MetricGlyphRenderer, &mut rng)
    }

    // ── TextStream ──────────────────────────────────────────────────────────

    #[test]
    fn test_empty_stream_is_finished() {
        let stream = TextStream::new("");
        assert!(stream.is_finished());
        assert_eq!(stream.peek(), None);
    }

    #[test]
    fn test_terminate_hides_rest_of_text() {
        let mut stream = TextStream::new("a\nb");
        stream.bump();
        stream.terminate();
        assert!(stream.is_finished());
        assert_eq!(stream.peek(), None);
        assert_eq!(stream.remaining(), 1);
    }

    // ── fit ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_exact_fit_is_complete() {
        let mut stream = TextStream::new("AB");
        let FitOutcome::Complete(line) = fit((10.0, 10.0), &mut stream) else {
            panic!("expected Complete");
        };
        assert_eq!(line.text, "AB");
        assert_eq!(line.layer.bbox, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(stream.is_finished());
    }

    #[test]
    fn test_overflow_leaves_character_unconsumed() {
        let mut stream = TextStream::new("ABC");
        let outcome = fit((12.0, 10.0), &mut stream);
        let FitOutcome::Partial(line) = outcome else {
            panic!("expected Partial");
        };
        assert_eq!(line.text, "AB");
        assert_eq!(stream.position(), 2);
        assert_eq!(stream.peek(), Some('C'));
    }

    #[test]
    fn test_glyphs_are_contiguous_left_to_right() {
        let mut stream = TextStream::new("abcd");
        let line = fit((40.0, 10.0), &mut stream).into_line().unwrap();
        let xs: Vec<f64> = line.layer.glyphs.iter().map(|g| g.bbox.x).collect();
        assert_eq!(xs, vec![0.0, 5.0, 10.0, 15.0]);
        for pair in line.layer.glyphs.windows(2) {
            assert_eq!(pair[0].bbox.right(), pair[1].bbox.x);
        }
    }

    #[test]
    fn test_box_too_narrow_for_one_glyph_is_rejected() {
        // A wide glyph at height 9.5 is 9.5px across; the box is only 9px wide.
        let mut stream = TextStream::new("漢");
        assert!(matches!(
            fit((9.0, 9.5), &mut stream),
            FitOutcome::Rejected(RejectReason::NothingPlaced)
        ));
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn test_box_shorter_than_one_pixel_is_rejected() {
        let mut stream = TextStream::new("W");
        assert!(matches!(
            fit((4.0, 0.5), &mut stream),
            FitOutcome::Rejected(RejectReason::NothingPlaced)
        ));
    }

    #[test]
    fn test_blank_text_is_rejected_and_consumed() {
        let mut stream = TextStream::new("   x");
        let outcome = fit((15.0, 10.0), &mut stream);
        assert!(matches!(
            outcome,
            FitOutcome::Rejected(RejectReason::BlankText)
        ));
        assert_eq!(stream.position(), 3);
        assert_eq!(stream.peek(), Some('x'));
    }

    #[test]
    fn test_terminator_ends_input_without_rejecting() {
        let mut stream = TextStream::new("AB\nCD");
        let outcome = fit((100.0, 10.0), &mut stream);
        let FitOutcome::Complete(line) = outcome else {
            panic!("expected Complete");
        };
        assert_eq!(line.text, "AB");
        assert!(stream.is_finished());
        assert_eq!(stream.remaining(), 2, "CD was cut off, not consumed");
    }

    #[test]
    fn test_glyph_scaled_to_box_height() {
        // floor(10.5) = 10px font, scaled by 10.5 / 10.
        let mut stream = TextStream::new("A");
        let line = fit((100.0, 10.5), &mut stream).into_line().unwrap();
        let bbox = line.layer.glyphs[0].bbox;
        assert!((bbox.h - 10.5).abs() < 1e-9);
        assert!((bbox.w - 5.25).abs() < 1e-9);
    }

    #[test]
    fn test_fill_narrows_usable_width() {
        let fitter = LineFitter::new(&TextBoxConfig { fill: [0.5, 0.5] });
        let mut rng = StdRng::seed_from_u64(0);
        let mut stream = TextStream::new("ABCDEFGH");
        let line = fitter
            .fit((40.0, 10.0), &mut stream, &mono(), &MetricGlyphRenderer, &mut rng)
            .into_line()
            .unwrap();
        assert_eq!(line.text, "ABCD");
    }

    #[test]
    fn test_fill_never_narrower_than_box_height() {
        let fitter = LineFitter::new(&TextBoxConfig { fill: [0.1, 0.1] });
        let mut rng = StdRng::seed_from_u64(0);
        let mut stream = TextStream::new("ABCDEFGH");
        let line = fitter
            .fit((100.0, 10.0), &mut stream, &mono(), &MetricGlyphRenderer, &mut rng)
            .into_line()
            .unwrap();
        // 100 * 0.1 = 10 = height → two 5px glyphs.
        assert_eq!(line.text, "AB");
    }
}
