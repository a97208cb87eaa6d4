//! Text node list
//!
//! Text is split into words, spaces and line breaks held in a doubly
//! linked list. Nodes live in an arena and link by index, so splitting a
//! word in place never invalidates other node ids. Replaced nodes stay in
//! the arena unlinked.

use crate::atlas::GlyphTable;
use crate::layout::options::RenderOptions;

/// Index of a node in its list's arena
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextNodeKind {
    Word,
    Space,
    LineBreak,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub kind: TextNodeKind,
    /// Empty unless the node is a word
    pub text: String,
    /// Measured advance in pixels; zero until measured
    pub length: f32,
    pub height: f32,
    /// Justification adjustment, reset on every layout pass
    pub length_tweak: f32,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

impl TextNode {
    fn new(kind: TextNodeKind, text: String) -> Self {
        Self {
            kind,
            text,
            length: 0.0,
            height: 0.0,
            length_tweak: 0.0,
            prev: None,
            next: None,
        }
    }

    /// Length including the justification tweak
    pub fn modified_length(&self) -> f32 {
        self.length + self.length_tweak
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_word(&self) -> bool {
        self.kind == TextNodeKind::Word
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextNodeList {
    nodes: Vec<TextNode>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
}

impl TextNodeList {
    /// Tokenize `text`; `\r\n` counts as one line break and runs of
    /// separators are kept as individual nodes
    pub fn new(text: &str) -> Self {
        let text = text.replace("\r\n", "\r");
        let mut list = Self::default();
        let mut word = String::new();

        for c in text.chars() {
            let kind = match c {
                '\r' | '\n' => TextNodeKind::LineBreak,
                ' ' => TextNodeKind::Space,
                _ => {
                    word.push(c);
                    continue;
                }
            };
            if !word.is_empty() {
                list.push(TextNode::new(TextNodeKind::Word, std::mem::take(&mut word)));
            }
            list.push(TextNode::new(kind, String::new()));
        }
        if !word.is_empty() {
            list.push(TextNode::new(TextNodeKind::Word, word));
        }
        list
    }

    fn alloc(&mut self, node: TextNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn push(&mut self, node: TextNode) {
        let id = self.alloc(node);
        self.nodes[id].prev = self.tail;
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    pub fn node(&self, id: NodeId) -> &TextNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TextNode {
        &mut self.nodes[id]
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].next
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].prev
    }

    /// Linked node ids from head to tail
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut cursor = self.head;
        while let Some(id) = cursor {
            ids.push(id);
            cursor = self.nodes[id].next;
        }
        ids
    }

    /// Linked nodes from head to tail
    pub fn iter(&self) -> impl Iterator<Item = &TextNode> + '_ {
        std::iter::successors(self.head, move |&id| self.nodes[id].next).map(move |id| &self.nodes[id])
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Word directly followed by another word: the two are fragments of
    /// one crumbled word and share a character gap
    pub fn is_crumbled_word(&self, id: NodeId) -> bool {
        self.nodes[id].is_word() && self.next(id).is_some_and(|n| self.nodes[n].is_word())
    }

    /// Space whose following word would overflow `bound`
    pub fn skip_trailing_space(&self, id: NodeId, length_so_far: f32, bound: f32) -> bool {
        let node = &self.nodes[id];
        if node.kind != TextNodeKind::Space {
            return false;
        }
        match self.next(id).map(|n| &self.nodes[n]) {
            Some(next) if next.is_word() => {
                node.modified_length() + next.modified_length() + length_so_far > bound
            }
            _ => false,
        }
    }

    /// Zero every length tweak
    pub fn reset_tweaks(&mut self) {
        for node in self.nodes.iter_mut() {
            node.length_tweak = 0.0;
        }
    }

    /// Measure every node whose length is still zero
    pub fn measure(&mut self, table: &GlyphTable, options: &RenderOptions) {
        let monospaced = table.is_monospacing_active(options);
        let mono_width = table.monospace_width(options);
        let mean = table.mean_glyph_width;

        for id in self.ids() {
            if self.nodes[id].length != 0.0 {
                continue;
            }
            match self.nodes[id].kind {
                TextNodeKind::Space => {
                    self.nodes[id].length = if monospaced {
                        mono_width
                    } else {
                        (mean * options.word_spacing).ceil()
                    };
                }
                TextNodeKind::Word => {
                    let next_word = self
                        .next(id)
                        .map(|n| &self.nodes[n])
                        .filter(|n| n.is_word())
                        .map(|n| n.text.as_str());
                    let chars: Vec<char> = self.nodes[id].text.chars().collect();
                    let mut length = 0.0f32;
                    let mut height = 0.0f32;
                    for (i, c) in chars.iter().enumerate() {
                        let Some(glyph) = table.glyph(*c) else {
                            continue;
                        };
                        length += if monospaced {
                            mono_width
                        } else {
                            (glyph.rect.width as f32
                                + mean * options.character_spacing
                                + table.kerning_correction(i, &chars, next_word) as f32)
                                .ceil()
                        };
                        height = height.max((glyph.y_offset + glyph.rect.height) as f32);
                    }
                    let node = &mut self.nodes[id];
                    node.length = length;
                    node.height = height;
                }
                TextNodeKind::LineBreak => {}
            }
        }
    }

    /// Split a word at its character midpoint; returns the left half
    fn split(&mut self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id];
        if !node.is_word() {
            return None;
        }
        let chars: Vec<char> = node.text.chars().collect();
        let mid = chars.len() / 2;
        let (prev, next) = (node.prev, node.next);

        let left = self.alloc(TextNode::new(TextNodeKind::Word, chars[..mid].iter().collect()));
        let right = self.alloc(TextNode::new(TextNodeKind::Word, chars[mid..].iter().collect()));
        self.nodes[left].next = Some(right);
        self.nodes[right].prev = Some(left);

        self.nodes[left].prev = prev;
        match prev {
            Some(p) => self.nodes[p].next = Some(left),
            None => self.head = Some(left),
        }
        self.nodes[right].next = next;
        match next {
            Some(n) => self.nodes[n].prev = Some(right),
            None => self.tail = Some(right),
        }

        let old = &mut self.nodes[id];
        old.prev = None;
        old.next = None;
        Some(left)
    }

    /// Bisect a word recursively until every fragment has at most
    /// `base_count` characters
    pub fn crumble(&mut self, id: NodeId, base_count: usize) {
        if self.nodes[id].char_count() <= base_count.max(1) {
            return;
        }
        let Some(left) = self.split(id) else {
            return;
        };
        let right = self.nodes[left].next;
        self.crumble(left, base_count);
        if let Some(right) = right {
            self.crumble(right, base_count);
        }
    }
}
