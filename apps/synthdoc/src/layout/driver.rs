//! Content generation pass: margins → layout groups → one record per group → fitted lines.
//!
//! # Acceptance
//! A group is kept only when its boxes together consume the whole `text_in_img`
//! of its record. Text cut off by an embedded line terminator counts as left over. Otherwise every layer fitted for that group is dropped, and the
//! record's strings never reach the output lists. A pass runs once; when nothing is
//! accepted the caller gets empty lists (and a warning in the log).

use rand::RngCore;
use tracing::{debug, trace, warn};

use crate::config::ContentConfig;
use crate::errors::Result;
use crate::layout::fitter::{FitOutcome, LineFitter, TextStream};
use crate::reader::BlockCachedTextReader;
use crate::record::{parse_line, Record};
use crate::render::{
    Alignment, FontProvider, FontSpec, GlyphRenderer, LayerEffect, LayoutGenerator, NoEffect,
    Positioned, Rect,
};
use crate::sampling::uniform;

/// Output of one pass. `texts_in_img[i]` and `texts_in_output[i]` belong to the same
/// accepted group; `layers` holds every line of every accepted group, in order.
#[derive(Debug, Clone)]
pub struct ContentOutput<L> {
    pub layers: Vec<L>,
    pub texts_in_img: Vec<String>,
    pub texts_in_output: Vec<String>,
}

impl<L> Default for ContentOutput<L> {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            texts_in_img: Vec::new(),
            texts_in_output: Vec::new(),
        }
    }
}

impl<L> ContentOutput<L> {
    pub fn accepted_groups(&self) -> usize {
        self.texts_in_img.len()
    }
}

/// Why a whole group was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupRejection {
    /// The boxes filled up with text still left over.
    TextRemaining { remaining: usize },
    /// No box produced a line.
    NothingFitted,
}

pub struct LayoutDriver<R: GlyphRenderer> {
    margin: [f64; 2],
    reader: BlockCachedTextReader,
    fitter: LineFitter,
    font: Box<dyn FontProvider>,
    layout: Box<dyn LayoutGenerator>,
    renderer: R,
    textbox_effect: Box<dyn LayerEffect<R::Layer>>,
    content_effect: Box<dyn LayerEffect<R::Layer>>,
}

impl<R> LayoutDriver<R>
where
    R: GlyphRenderer,
    R::Layer: 'static,
{
    pub fn new(
        config: &ContentConfig,
        reader: BlockCachedTextReader,
        font: Box<dyn FontProvider>,
        layout: Box<dyn LayoutGenerator>,
        renderer: R,
    ) -> Self {
        Self {
            margin: config.margin,
            reader,
            fitter: LineFitter::new(&config.textbox),
            font,
            layout,
            renderer,
            textbox_effect: Box::new(NoEffect),
            content_effect: Box::new(NoEffect),
        }
    }

    /// Validates `config` and opens the corpus it names.
    pub fn from_config(
        config: &ContentConfig,
        font: Box<dyn FontProvider>,
        layout: Box<dyn LayoutGenerator>,
        renderer: R,
    ) -> Result<Self> {
        config.validate()?;
        let reader = BlockCachedTextReader::from_config(&config.text)?;
        Ok(Self::new(config, reader, font, layout, renderer))
    }

    /// Effect applied to each accepted line on its own.
    pub fn with_textbox_effect(mut self, effect: Box<dyn LayerEffect<R::Layer>>) -> Self {
        self.textbox_effect = effect;
        self
    }

    /// Effect applied once to all accepted lines together at the end of a pass.
    pub fn with_content_effect(mut self, effect: Box<dyn LayerEffect<R::Layer>>) -> Self {
        self.content_effect = effect;
        self
    }

    pub fn reader(&self) -> &BlockCachedTextReader {
        &self.reader
    }

    /// Runs one pass over a page of `size` pixels.
    ///
    /// Malformed corpus lines are propagated as `SynthError::MalformedRecord`.
    pub fn generate(
        &mut self,
        size: (f64, f64),
        rng: &mut dyn RngCore,
    ) -> Result<ContentOutput<R::Layer>> {
        let bbox = layout_bbox(size, self.margin, rng);
        let groups = self.layout.generate(bbox, rng);
        let mut output = ContentOutput::default();

        for (index, group) in groups.iter().enumerate() {
            let font = self.font.sample(rng);
            self.reader.seek_random_line_start(rng)?;
            let record = parse_line(&mut self.reader)?;

            match self.fit_group(group, &record, &font, rng) {
                Ok(mut layers) => {
                    debug!(
                        group = index,
                        boxes = group.len(),
                        lines = layers.len(),
                        chars = record.text_in_img.chars().count(),
                        "group accepted"
                    );
                    for layer in &mut layers {
                        self.textbox_effect
                            .apply(std::slice::from_mut(layer), rng);
                    }
                    output.layers.extend(layers);
                    output.texts_in_img.push(record.text_in_img);
                    output.texts_in_output.push(record.text_in_output);
                }
                Err(reason) => {
                    debug!(group = index, boxes = group.len(), ?reason, "group rejected");
                }
            }
        }

        if output.layers.is_empty() {
            warn!(groups = groups.len(), "no layout group accepted a record");
        }

        self.content_effect.apply(&mut output.layers, rng);
        Ok(output)
    }

    /// Fits `record.text_in_img` across the group's boxes in order.
    fn fit_group(
        &self,
        group: &[(Rect, Alignment)],
        record: &Record,
        font: &FontSpec,
        rng: &mut dyn RngCore,
    ) -> std::result::Result<Vec<R::Layer>, GroupRejection> {
        let mut stream = TextStream::new(&record.text_in_img);
        let mut layers = Vec::new();

        for &(bbox, align) in group {
            if stream.is_finished() {
                break;
            }
            match self
                .fitter
                .fit((bbox.w, bbox.h), &mut stream, font, &self.renderer, rng)
            {
                FitOutcome::Complete(line) | FitOutcome::Partial(line) => {
                    let mut layer = line.layer;
                    place(&mut layer, bbox, align);
                    layers.push(layer);
                }
                FitOutcome::Rejected(reason) => {
                    trace!(?reason, w = bbox.w, h = bbox.h, "box skipped");
                }
            }
        }

        let remaining = stream.remaining();
        if remaining > 0 {
            return Err(GroupRejection::TextRemaining { remaining });
        }
        if layers.is_empty() {
            return Err(GroupRejection::NothingFitted);
        }
        Ok(layers)
    }
}

/// Text area inside a uniformly drawn margin on each side.
fn layout_bbox((width, height): (f64, f64), margin: [f64; 2], rng: &mut dyn RngCore) -> Rect {
    let left = width * uniform(rng, margin[0], margin[1]);
    let top = height * uniform(rng, margin[0], margin[1]);
    Rect::new(
        left,
        top,
        (width - left * 2.0).max(0.0),
        (height - top * 2.0).max(0.0),
    )
}

/// Centres the layer in its box, then snaps it to the aligned edge.
fn place<L: Positioned>(layer: &mut L, bbox: Rect, align: Alignment) {
    layer.set_center(bbox.center());
    match align {
        Alignment::Left => layer.set_left(bbox.x),
        Alignment::Right => layer.set_right(bbox.right()),
        Alignment::Center => {}
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
