//! Line breaking and glyph placement
//!
//! `TextLayout` walks a processed node list, breaks it into lines within
//! the layout width and reports every glyph position to a sink. Measuring
//! is the same walk without a sink.

use super::justify::justify_line;
use super::nodes::{NodeId, TextNodeKind, TextNodeList};
use super::options::{Alignment, RenderOptions, Size};
use crate::atlas::GlyphTable;

/// Receives (x, y, character) for every glyph placed; y is the top of the line
pub type GlyphSink<'s> = &'s mut dyn FnMut(f32, f32, char);

/// Tokenized and measured text, reusable across layout passes
#[derive(Debug, Clone)]
pub struct ProcessedText {
    pub nodes: TextNodeList,
    /// Layout bounds; a height of zero or less is unbounded
    pub max_size: Size,
    pub alignment: Alignment,
}

/// Layout of text in one font with one set of options
pub struct TextLayout<'a> {
    table: &'a GlyphTable,
    options: &'a RenderOptions,
}

impl<'a> TextLayout<'a> {
    pub fn new(table: &'a GlyphTable, options: &'a RenderOptions) -> Self {
        Self { table, options }
    }

    fn monospaced(&self) -> bool {
        self.table.is_monospacing_active(self.options)
    }

    pub fn line_spacing(&self) -> f32 {
        self.table.line_spacing(self.options)
    }

    fn space_width(&self) -> f32 {
        (self.table.mean_glyph_width * self.options.word_spacing).ceil()
    }

    /// Advance after `chars[index]`, kerned against the next character or
    /// the first character of `next_word`
    fn advance(&self, index: usize, chars: &[char], next_word: Option<&str>) -> Option<f32> {
        let glyph = self.table.glyph(chars[index])?;
        if self.monospaced() {
            return Some(self.table.monospace_width(self.options));
        }
        Some(
            (glyph.rect.width as f32
                + self.table.mean_glyph_width * self.options.character_spacing
                + self.table.kerning_correction(index, chars, next_word) as f32)
                .ceil(),
        )
    }

    /// Tokenize, measure and crumble `text` for layout within `max_size`
    ///
    /// Words at least as wide as the layout (or every word when word wrap
    /// is off) are split down to single characters.
    pub fn process_text(&self, text: &str, max_size: Size, alignment: Alignment) -> ProcessedText {
        let mut nodes = TextNodeList::new(text);
        nodes.measure(self.table, self.options);

        let to_crumble: Vec<NodeId> = nodes
            .ids()
            .into_iter()
            .filter(|&id| {
                let node = nodes.node(id);
                node.is_word() && (!self.options.word_wrap || node.length >= max_size.width)
            })
            .collect();
        for id in to_crumble {
            nodes.crumble(id, 1);
        }
        nodes.measure(self.table, self.options);

        ProcessedText {
            nodes,
            max_size,
            alignment,
        }
    }

    /// Unjustified length of the line starting at `start`
    pub fn line_length(&self, list: &TextNodeList, start: NodeId, max_length: f32) -> f32 {
        let mut consumed = false;
        let mut length = 0.0;
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            let node = list.node(id);
            if node.kind == TextNodeKind::LineBreak {
                break;
            }
            if list.skip_trailing_space(id, length, max_length) && consumed {
                break;
            }
            if length + node.length <= max_length || !consumed {
                consumed = true;
                length += node.length;
            } else {
                break;
            }
            cursor = list.next(id);
        }
        length
    }

    /// Horizontal start of the line beginning at `start`; justifies it
    /// when aligning to both edges
    fn align_line(&self, list: &mut TextNodeList, start: NodeId, alignment: Alignment, max_width: f32) -> f32 {
        match alignment {
            Alignment::Left => 0.0,
            Alignment::Right => -(self.line_length(list, start, max_width) - max_width).ceil(),
            Alignment::Centre => -(0.5 * self.line_length(list, start, max_width)).ceil(),
            Alignment::Justify => {
                justify_line(list, start, max_width, self.options);
                0.0
            }
        }
    }

    /// Place the glyphs of one word, spreading its length tweak over the
    /// character gaps
    fn render_word(&self, list: &TextNodeList, id: NodeId, mut x: f32, y: f32, sink: GlyphSink<'_>) {
        let node = list.node(id);
        if !node.is_word() {
            return;
        }
        let chars: Vec<char> = node.text.chars().collect();
        let next_word = list
            .next(id)
            .map(|n| list.node(n))
            .filter(|n| n.is_word())
            .map(|n| n.text.as_str());

        let mut gaps = chars.len() as i32 - 1;
        if list.is_crumbled_word(id) {
            gaps += 1;
        }
        let tweak = node.length_tweak as i32;
        let (per_gap, mut left_over) = if gaps != 0 {
            let per = tweak / gaps;
            (per, tweak - per * gaps)
        } else {
            (0, 0)
        };

        for i in 0..chars.len() {
            let Some(advance) = self.advance(i, &chars, next_word) else {
                continue;
            };
            sink(x, y, chars[i]);
            x += advance + per_gap as f32;
            if left_over > 0 {
                x += 1.0;
                left_over -= 1;
            } else if left_over < 0 {
                x -= 1.0;
                left_over += 1;
            }
        }
    }

    /// Lay out `processed`, sending glyph positions to `sink` if given
    ///
    /// Returns the widest line and the total height.
    pub fn layout(&self, processed: &mut ProcessedText, mut sink: Option<GlyphSink<'_>>) -> Size {
        let max_width = processed.max_size.width;
        let max_height = processed.max_size.height;
        let alignment = processed.alignment;
        let line_spacing = self.line_spacing();
        let list = &mut processed.nodes;
        list.reset_tweaks();

        let mut max_measured = 0.0f32;
        let mut x_offset = 0.0f32;
        let mut y_offset = 0.0f32;
        if let Some(head) = list.head() {
            x_offset = self.align_line(list, head, alignment, max_width);
        }

        let mut consumed = false;
        let mut length = 0.0f32;
        let mut cursor = list.head();
        while let Some(id) = cursor {
            let mut new_line = false;
            // Node that starts the next line
            let mut resume = list.next(id);

            if list.node(id).kind == TextNodeKind::LineBreak {
                new_line = true;
            } else if self.options.word_wrap && list.skip_trailing_space(id, length, max_width) && consumed {
                new_line = true;
            } else if length + list.node(id).modified_length() <= max_width || !consumed {
                consumed = true;
                if let Some(sink) = sink.as_deref_mut() {
                    self.render_word(list, id, x_offset + length, y_offset, sink);
                }
                length += list.node(id).modified_length();
                max_measured = max_measured.max(length);
            } else if self.options.word_wrap {
                new_line = true;
                resume = Some(id);
            }

            if new_line {
                if max_height > 0.0 && y_offset + line_spacing >= max_height {
                    break;
                }
                y_offset += line_spacing;
                x_offset = 0.0;
                length = 0.0;
                consumed = false;
                if let Some(next) = resume {
                    x_offset = self.align_line(list, next, alignment, max_width);
                }
            }
            cursor = resume;
        }

        Size::new(max_measured, y_offset + line_spacing)
    }

    /// Length of the first line of `chars`
    fn next_line_length(&self, chars: &[char]) -> f32 {
        let mut x = 0.0;
        for (i, &c) in chars.iter().enumerate() {
            if c == '\r' || c == '\n' {
                break;
            }
            if self.monospaced() {
                x += self.table.monospace_width(self.options);
            } else if c == ' ' {
                x += self.space_width();
            } else if let Some(advance) = self.advance(i, chars, None) {
                x += advance;
            }
        }
        x
    }

    fn unbounded_line_start(&self, chars: &[char], alignment: Alignment) -> f32 {
        match alignment {
            Alignment::Right => -self.next_line_length(chars),
            Alignment::Centre => -((0.5 * self.next_line_length(chars)) as i32 as f32),
            Alignment::Left | Alignment::Justify => 0.0,
        }
    }

    /// Lay out `text` without a width bound; only explicit line breaks
    /// start new lines
    pub fn layout_unbounded(&self, text: &str, alignment: Alignment, mut sink: Option<GlyphSink<'_>>) -> Size {
        let chars: Vec<char> = text.replace("\r\n", "\r").chars().collect();
        let line_spacing = self.line_spacing();

        let mut x_offset = self.unbounded_line_start(&chars, alignment);
        let mut y_offset = 0.0f32;
        let mut max_y = 0.0f32;
        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;

        for (i, &c) in chars.iter().enumerate() {
            if c == '\r' || c == '\n' {
                y_offset += line_spacing;
                max_y += line_spacing;
                x_offset = self.unbounded_line_start(&chars[i + 1..], alignment);
                continue;
            }

            min_x = min_x.min(x_offset);
            let glyph = self.table.glyph(c);
            if c != ' ' && glyph.is_some() {
                if let Some(sink) = sink.as_deref_mut() {
                    sink(x_offset, y_offset, c);
                }
            }

            if self.monospaced() {
                x_offset += self.table.monospace_width(self.options);
            } else if c == ' ' {
                x_offset += self.space_width();
            } else if let (Some(glyph), Some(advance)) = (glyph, self.advance(i, &chars, None)) {
                x_offset += advance;
                max_y = max_y.max((glyph.rect.height + glyph.y_offset) as f32);
            }
            max_x = max_x.max(x_offset);
        }

        let width = if min_x == f32::MAX { 0.0 } else { max_x - min_x };
        Size::new(width, max_y)
    }
}
