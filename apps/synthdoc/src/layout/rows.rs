//! Row-stack layout: fills the text area top to bottom with full-width rows and
//! groups consecutive rows so one record can flow across several lines.

use rand::{Rng, RngCore};

use crate::config::RowStackConfig;
use crate::render::{Alignment, LayoutGenerator, LayoutGroup, Rect};
use crate::sampling::uniform;

const ALIGNMENTS: [Alignment; 3] = [Alignment::Left, Alignment::Center, Alignment::Right];

/// Built-in layout generator for callers that do not bring their own.
///
/// Each group draws a line height, a row count and an alignment. Rows within a group
/// are `line_height * line_spacing` apart (top to top); groups are separated by one
/// extra line height. The last group may be shorter than drawn if the area runs out.
#[derive(Debug, Clone)]
pub struct RowStack {
    config: RowStackConfig,
}

impl RowStack {
    pub fn new(config: RowStackConfig) -> Self {
        Self { config }
    }
}

impl LayoutGenerator for RowStack {
    fn generate(&mut self, bbox: Rect, rng: &mut dyn RngCore) -> Vec<LayoutGroup> {
        let [h_lo, h_hi] = self.config.line_height;
        let [r_lo, r_hi] = self.config.rows_per_group;
        let mut groups = Vec::new();
        let mut top = bbox.y;

        loop {
            let line_height = uniform(rng, h_lo, h_hi);
            let rows = rng.random_range(r_lo..=r_hi.max(r_lo));
            let align = ALIGNMENTS[rng.random_range(0..ALIGNMENTS.len())];

            let mut group = Vec::with_capacity(rows);
            for _ in 0..rows {
                if line_height <= 0.0 || top + line_height > bbox.bottom() {
                    break;
                }
                group.push((Rect::new(bbox.x, top, bbox.w, line_height), align));
                top += line_height * self.config.line_spacing;
            }

            if group.is_empty() {
                break;
            }
            let filled = group.len() == rows;
            groups.push(group);
            if !filled {
                break;
            }
            top += line_height;
        }

        groups
    }
}
