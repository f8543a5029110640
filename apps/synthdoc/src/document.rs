//! Whole-document assembly: page size, text content, paper and document-wide effects.

use rand::{Rng, RngCore};

use crate::config::DocumentConfig;
use crate::errors::Result;
use crate::layout::driver::{ContentOutput, LayoutDriver};
use crate::render::{GlyphRenderer, LayerEffect, NoEffect, PaperGenerator};
use crate::sampling::uniform;

/// Minimum page width as a fraction of the canvas' short side.
const MIN_WIDTH_RATIO: f64 = 0.7;

/// A generated document: the paper layer plus the accepted text content.
#[derive(Debug, Clone)]
pub struct Document<L> {
    pub size: (u32, u32),
    pub paper: L,
    pub content: ContentOutput<L>,
}

/// Samples the page size for a canvas of `(width, height)` pixels.
///
/// With probability `fullscreen` the page is the canvas. Otherwise the short side is
/// drawn from `short_size` (capped by the canvas), the long side from `aspect_ratio`,
/// and the page width is kept at or above `MIN_WIDTH_RATIO` of the canvas' short side.
pub fn sample_page_size(
    config: &DocumentConfig,
    (width, height): (u32, u32),
    rng: &mut dyn RngCore,
) -> (u32, u32) {
    if rng.random::<f64>() < config.fullscreen {
        return (width, height);
    }

    let landscape = rng.random::<f64>() < config.landscape;
    let max_size = f64::from(if landscape { width } else { height });
    let min_side = width.min(height);
    if min_side == 0 {
        return (width, height);
    }
    let dynamic_min_width = (f64::from(min_side) * MIN_WIDTH_RATIO) as u32;

    let lo = min_side.min(config.short_size[0]);
    let hi = min_side.min(config.short_size[1]);
    let mut short = if lo >= hi {
        lo
    } else {
        rng.random_range(lo..=hi)
    };

    let s = f64::from(short);
    let aspect = uniform(
        rng,
        (max_size / s)
            .min(config.aspect_ratio[0])
            .max(f64::from(dynamic_min_width) / s),
        (max_size / s).min(config.aspect_ratio[1]),
    );
    let mut long = (s * aspect) as u32;

    if landscape {
        long = long.max(dynamic_min_width);
    } else {
        short = short.max(dynamic_min_width);
    }

    if landscape {
        (long, short)
    } else {
        (short, long)
    }
}

pub struct DocumentGenerator<R: GlyphRenderer> {
    config: DocumentConfig,
    content: LayoutDriver<R>,
    paper: Box<dyn PaperGenerator<R::Layer>>,
    effect: Box<dyn LayerEffect<R::Layer>>,
}

impl<R> DocumentGenerator<R>
where
    R: GlyphRenderer,
    R::Layer: 'static,
{
    pub fn new(
        config: DocumentConfig,
        content: LayoutDriver<R>,
        paper: Box<dyn PaperGenerator<R::Layer>>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            content,
            paper,
            effect: Box::new(NoEffect),
        })
    }

    /// Effect applied to all text layers and the paper together (warp, noise, ...).
    pub fn with_effect(mut self, effect: Box<dyn LayerEffect<R::Layer>>) -> Self {
        self.effect = effect;
        self
    }

    pub fn generate(
        &mut self,
        canvas: (u32, u32),
        rng: &mut dyn RngCore,
    ) -> Result<Document<R::Layer>> {
        let size = sample_page_size(&self.config, canvas, rng);
        let mut content = self
            .content
            .generate((f64::from(size.0), f64::from(size.1)), rng)?;
        let paper = self.paper.generate(size, rng);

        // The paper goes last so it can be split off again after the shared effect.
        let mut layers = std::mem::take(&mut content.layers);
        layers.push(paper);
        self.effect.apply(&mut layers, rng);
        let paper = layers.swap_remove(layers.len() - 1);
        content.layers = layers;

        Ok(Document {
            size,
            paper,
            content,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ContentConfig};
    use crate::layout::font_metrics::{
        BlankPaper, FontFamily, FontPool, MetricGlyphRenderer, TextLayer,
    };
    use crate::layout::rows::RowStack;
    use crate::render::{Alignment, LayoutGenerator, LayoutGroup, Positioned, Rect};
    use crate::test_support::init_tracing;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config(fullscreen: f64, landscape: f64) -> DocumentConfig {
        DocumentConfig {
            fullscreen,
            landscape,
            ..DocumentConfig::default()
        }
    }

    // ── sample_page_size ────────────────────────────────────────────────────

    #[test]
    fn test_fullscreen_returns_canvas() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..10 {
            assert_eq!(sample_page_size(&config(1.0, 0.5), (800, 600), &mut rng), (800, 600));
        }
    }

    #[test]
    fn test_landscape_page_is_wider_than_min_width() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let (w, h) = sample_page_size(&config(0.0, 1.0), (1200, 900), &mut rng);
            assert!(w >= 630, "width {w} below 70% of short side");
            assert!(h <= 900);
            assert!(w <= 1200);
        }
    }

    #[test]
    fn test_portrait_page_respects_min_width() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            let (w, h) = sample_page_size(&config(0.0, 0.0), (1000, 1400), &mut rng);
            assert!(w >= 700, "width {w} below 70% of short side");
            assert!(h <= 1400, "height {h} exceeds canvas");
        }
    }

    #[test]
    fn test_small_canvas_caps_short_side() {
        let mut rng = StdRng::seed_from_u64(3);
        let (w, h) = sample_page_size(&config(0.0, 0.0), (300, 300), &mut rng);
        assert!(w <= 300);
        assert!(h >= 210);
    }

    #[test]
    fn test_zero_canvas_is_returned_unchanged() {
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(sample_page_size(&config(0.0, 0.5), (0, 500), &mut rng), (0, 500));
    }

    // ── DocumentGenerator ───────────────────────────────────────────────────

    struct OneBoxLayout;

    impl LayoutGenerator for OneBoxLayout {
        fn generate(&mut self, bbox: Rect, _rng: &mut dyn RngCore) -> Vec<LayoutGroup> {
            vec![vec![(Rect::new(bbox.x, bbox.y, bbox.w, 10.0), Alignment::Left)]]
        }
    }

    /// Shifts every layer right by one pixel.
    struct Nudge;

    impl LayerEffect<TextLayer> for Nudge {
        fn apply(&mut self, layers: &mut [TextLayer], _rng: &mut dyn RngCore) {
            for layer in layers {
                let b = layer.bbox();
                layer.set_left(b.x + 1.0);
            }
        }
    }

    #[test]
    fn test_generate_applies_effect_to_text_and_paper() {
        init_tracing();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"text_in_img":"Hi","text_in_output":"hi"}}"#).unwrap();
        file.flush().unwrap();

        let mut content_config = ContentConfig {
            margin: [0.0, 0.0],
            ..ContentConfig::default()
        };
        content_config.text.path = file.path().to_path_buf();
        content_config.text.block_size = 32;

        let driver = LayoutDriver::from_config(
            &content_config,
            Box::new(FontPool::new(vec![FontFamily::Mono]).unwrap()),
            Box::new(OneBoxLayout),
            MetricGlyphRenderer,
        )
        .unwrap();
        let mut generator = DocumentGenerator::new(
            DocumentConfig {
                fullscreen: 1.0,
                content: content_config,
                ..DocumentConfig::default()
            },
            driver,
            Box::new(BlankPaper),
        )
        .unwrap()
        .with_effect(Box::new(Nudge));
        let mut rng = StdRng::seed_from_u64(5);

        let doc = generator.generate((640, 480), &mut rng).unwrap();
        assert_eq!(doc.size, (640, 480));
        assert_eq!(doc.paper.bbox, Rect::new(1.0, 0.0, 640.0, 480.0));
        assert_eq!(doc.content.texts_in_output, vec!["hi".to_string()]);
        assert_eq!(doc.content.layers.len(), 1);
        assert_eq!(doc.content.layers[0].text, "Hi");
        assert_eq!(doc.content.layers[0].bbox.x, 1.0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"text_in_img":"a","text_in_output":"b"}}"#).unwrap();
        let mut content_config = ContentConfig::default();
        content_config.text.path = file.path().to_path_buf();
        let driver = LayoutDriver::from_config(
            &content_config,
            Box::new(FontPool::new(vec![FontFamily::Sans]).unwrap()),
            Box::new(OneBoxLayout),
            MetricGlyphRenderer,
        )
        .unwrap();

        let result = DocumentGenerator::new(
            DocumentConfig {
                fullscreen: 2.0,
                ..DocumentConfig::default()
            },
            driver,
            Box::new(BlankPaper),
        );
        assert!(result.is_err());
    }

    fn word_corpus() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for word in ["alpha", "beta gamma", "delta", "epsilon zeta eta"] {
            writeln!(file, r#"{{"text_in_img":"{word}","text_in_output":"{word}"}}"#).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn row_stack_generator(config: &Config) -> DocumentGenerator<MetricGlyphRenderer> {
        let content = &config.document.content;
        let driver = LayoutDriver::from_config(
            content,
            Box::new(FontPool::new(vec![FontFamily::Sans, FontFamily::Serif]).unwrap()),
            Box::new(RowStack::new(content.layout.clone())),
            MetricGlyphRenderer,
        )
        .unwrap();
        DocumentGenerator::new(config.document.clone(), driver, Box::new(BlankPaper)).unwrap()
    }

    fn word_config(file: &NamedTempFile, seed: Option<u64>) -> Config {
        let mut config = Config {
            seed,
            ..Config::default()
        };
        config.document.content.text.path = file.path().to_path_buf();
        config.document.content.text.block_size = 16;
        config
    }

    #[test]
    fn test_row_stack_pages_keep_lines_on_page() {
        let file = word_corpus();
        let mut generator = row_stack_generator(&word_config(&file, None));
        let mut rng = StdRng::seed_from_u64(6);

        for _ in 0..5 {
            let doc = generator.generate((1024, 768), &mut rng).unwrap();
            let (w, h) = (f64::from(doc.size.0), f64::from(doc.size.1));
            assert_eq!(doc.content.texts_in_img, doc.content.texts_in_output);
            for layer in &doc.content.layers {
                assert!(layer.bbox.x >= 0.0 && layer.bbox.right() <= w + 1e-9);
                assert!(layer.bbox.y >= 0.0 && layer.bbox.bottom() <= h + 1e-9);
            }
        }
    }

    #[test]
    fn test_same_seed_generates_same_documents() {
        let file = word_corpus();
        let config = word_config(&file, Some(2024));

        let run = || {
            let mut generator = row_stack_generator(&config);
            let mut rng = config.rng();
            (0..3)
                .map(|_| {
                    let doc = generator.generate((1024, 768), &mut rng).unwrap();
                    let boxes: Vec<Rect> = doc.content.layers.iter().map(|l| l.bbox).collect();
                    (doc.size, doc.content.texts_in_img, boxes)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
